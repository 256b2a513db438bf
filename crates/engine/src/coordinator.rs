//! Dependent selection: the connection choice scopes the variable catalog.
//!
//! The coordinator owns both selectors and one request sequence per catalog.
//! State transitions are synchronous and return the lookups they need; the
//! caller runs those lookups and hands each [`LookupResponse`] back to
//! [`SelectionCoordinator::apply`]. Only the latest request per catalog is
//! applied, so a slow response can never overwrite a newer one.

use std::time::{Duration, Instant};

use inview_api::LookupError;
use inview_types::{Connection, LookupQuery, QuerySnapshot, Resource, Variable};
use inview_util::config::{CatalogMerge, EditorConfig, VariableRetention};
use inview_util::redact_sensitive;
use tracing::{debug, warn};

use crate::assembly::Selection;
use crate::selector::{MultiSelector, SelectorValue, SingleSelector};
use crate::sequence::{RequestSequence, RequestToken};

/// Behaviour knobs, normally taken from [`EditorConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorOptions {
    pub debounce: Duration,
    pub lookup_page_size: u32,
    pub allow_custom_connection: bool,
    pub allow_custom_variable: bool,
    pub variable_retention: VariableRetention,
    pub variable_catalog_merge: CatalogMerge,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self::from(&EditorConfig::default())
    }
}

impl From<&EditorConfig> for CoordinatorOptions {
    fn from(config: &EditorConfig) -> Self {
        Self {
            debounce: config.debounce(),
            lookup_page_size: config.lookup_page_size,
            allow_custom_connection: config.allow_custom_connection,
            allow_custom_variable: config.allow_custom_variable,
            variable_retention: config.variable_retention,
            variable_catalog_merge: config.variable_catalog_merge,
        }
    }
}

/// Why a lookup was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchReason {
    Initial,
    /// The connection scope of the variable catalog changed.
    ScopeChanged,
    /// Debounced search text changed.
    Search,
}

/// A lookup the caller must execute.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupRequest {
    pub resource: Resource,
    pub token: RequestToken,
    pub query: LookupQuery,
    pub reason: FetchReason,
}

/// The settled result of a [`LookupRequest`].
#[derive(Debug)]
pub enum LookupResponse {
    Connections {
        request: LookupRequest,
        result: Result<Vec<Connection>, LookupError>,
    },
    Variables {
        request: LookupRequest,
        result: Result<Vec<Variable>, LookupError>,
    },
}

impl LookupResponse {
    pub fn request(&self) -> &LookupRequest {
        match self {
            LookupResponse::Connections { request, .. } | LookupResponse::Variables { request, .. } => request,
        }
    }
}

/// A non-fatal lookup failure to surface to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub resource: Resource,
    pub message: String,
}

/// What [`SelectionCoordinator::apply`] did with a response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied {
        resource: Resource,
        item_count: usize,
        /// The selection was pruned as part of applying the catalog.
        selection_changed: bool,
    },
    /// A newer request for the same catalog superseded this one; nothing changed.
    Stale { resource: Resource, token: RequestToken },
    /// The lookup failed; the previous catalog is kept.
    Failed { resource: Resource, notice: Notice },
}

/// Result of a synchronous state transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    pub requests: Vec<LookupRequest>,
    pub selection_changed: bool,
}

impl Transition {
    fn unchanged() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
pub struct SelectionCoordinator {
    options: CoordinatorOptions,
    connection: SingleSelector<Connection>,
    variables: MultiSelector<Variable>,
    connection_requests: RequestSequence,
    variable_requests: RequestSequence,
    connection_search: String,
    variable_search: String,
    mounted: bool,
    notices: Vec<Notice>,
}

impl SelectionCoordinator {
    pub fn new(options: CoordinatorOptions) -> Self {
        Self {
            connection: SingleSelector::new(options.allow_custom_connection, options.debounce),
            variables: MultiSelector::new(options.allow_custom_variable, options.debounce),
            connection_requests: RequestSequence::new(),
            variable_requests: RequestSequence::new(),
            connection_search: String::new(),
            variable_search: String::new(),
            mounted: false,
            notices: Vec::new(),
            options,
        }
    }

    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    pub fn connection(&self) -> &SingleSelector<Connection> {
        &self.connection
    }

    pub fn variables(&self) -> &MultiSelector<Variable> {
        &self.variables
    }

    /// Seed the selection from a previously emitted query.
    pub fn restore(&mut self, snapshot: &QuerySnapshot) {
        let connection = match (snapshot.connection_id, snapshot.connection_text.trim()) {
            (Some(id), text) => Some(SelectorValue::Entity(Connection::new(id, text))),
            (None, "") => None,
            (None, text) => Some(SelectorValue::Custom(text.to_string())),
        };
        self.connection.set_value(connection);

        let variables = snapshot
            .variable_ids
            .iter()
            .enumerate()
            .map(|(index, id)| {
                let name = snapshot.variable_names.get(index).cloned().unwrap_or_else(|| id.to_string());
                Variable::new(*id, name)
            })
            .collect();
        self.variables.set_value(variables);
    }

    /// Start both catalog lookups for the current scope.
    pub fn mount(&mut self) -> Vec<LookupRequest> {
        self.mounted = true;
        vec![
            self.issue_connections(FetchReason::Initial),
            self.issue_variables(FetchReason::Initial),
        ]
    }

    /// Cancel pending debounces; responses still in flight will be stale.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.connection.unmount();
        self.variables.unmount();
        self.connection_requests.invalidate();
        self.variable_requests.invalidate();
    }

    /// Connection id that scopes the variable catalog. Custom text has no id.
    pub fn scope(&self) -> Option<i64> {
        self.connection.value().and_then(SelectorValue::id)
    }

    pub fn select_connection(&mut self, value: &str) -> Transition {
        let before = self.connection.value().cloned();
        self.connection.commit(value);
        self.after_connection_change(before)
    }

    pub fn create_connection(&mut self, raw: &str) -> Transition {
        let before = self.connection.value().cloned();
        if self.connection.create(raw).is_none() {
            return Transition::unchanged();
        }
        self.after_connection_change(before)
    }

    pub fn clear_connection(&mut self) -> Transition {
        let before = self.connection.value().cloned();
        self.connection.clear();
        self.after_connection_change(before)
    }

    fn after_connection_change(&mut self, before: Option<SelectorValue<Connection>>) -> Transition {
        let after = self.connection.value();
        if before.as_ref() == after {
            return Transition::unchanged();
        }
        let scope_changed = before.as_ref().and_then(SelectorValue::id) != self.scope();
        let mut requests = Vec::new();
        if scope_changed && self.mounted {
            requests.push(self.issue_variables(FetchReason::ScopeChanged));
        }
        Transition {
            requests,
            selection_changed: true,
        }
    }

    pub fn select_variables(&mut self, values: &[String]) -> Transition {
        let before = self.variables.selected_ids();
        self.variables.commit(values);
        self.after_variable_change(before)
    }

    pub fn toggle_variable(&mut self, value: &str) -> Transition {
        let before = self.variables.selected_ids();
        self.variables.toggle(value);
        self.after_variable_change(before)
    }

    pub fn remove_variable(&mut self, id: i64) -> Transition {
        let before = self.variables.selected_ids();
        self.variables.remove(id);
        self.after_variable_change(before)
    }

    pub fn create_variable(&mut self, raw: &str) -> Transition {
        let before = self.variables.selected_ids();
        self.variables.create(raw);
        self.after_variable_change(before)
    }

    pub fn clear_variables(&mut self) -> Transition {
        let before = self.variables.selected_ids();
        self.variables.clear();
        self.after_variable_change(before)
    }

    fn after_variable_change(&self, before: Vec<i64>) -> Transition {
        Transition {
            requests: Vec::new(),
            selection_changed: before != self.variables.selected_ids(),
        }
    }

    pub fn type_connection_search(&mut self, text: impl Into<String>, now: Instant) {
        self.connection.type_text(text, now);
    }

    pub fn type_variable_search(&mut self, text: impl Into<String>, now: Instant) {
        self.variables.type_text(text, now);
    }

    /// Fire whichever search debounces have gone quiet. Each field is independent.
    pub fn tick(&mut self, now: Instant) -> Vec<LookupRequest> {
        let mut requests = Vec::new();
        if let Some(text) = self.connection.poll_text_change(now) {
            self.connection_search = text;
            if self.mounted {
                requests.push(self.issue_connections(FetchReason::Search));
            }
        }
        if let Some(text) = self.variables.poll_text_change(now) {
            self.variable_search = text;
            if self.mounted {
                requests.push(self.issue_variables(FetchReason::Search));
            }
        }
        requests
    }

    /// Whether either search field is still inside its quiet period.
    pub fn has_pending_search(&self) -> bool {
        self.connection.has_pending_text() || self.variables.has_pending_text()
    }

    /// Query for the connection catalog at the current search text.
    pub fn connection_query(&self) -> LookupQuery {
        let unfiltered = self.connection_search.is_empty();
        LookupQuery {
            connection_id: None,
            skip_connection_filter: unfiltered,
            search_text: self.connection_search.clone(),
            page_index: 0,
            page_size: self.options.lookup_page_size,
            skip_pagination: unfiltered,
        }
    }

    /// Query for the variable catalog in the current scope and search text.
    ///
    /// Without a connection id the lookup is unfiltered rather than scoped to id 0.
    pub fn variable_query(&self) -> LookupQuery {
        let scope = self.scope();
        LookupQuery {
            connection_id: scope,
            skip_connection_filter: scope.is_none(),
            search_text: self.variable_search.clone(),
            page_index: 0,
            page_size: self.options.lookup_page_size,
            skip_pagination: self.variable_search.is_empty(),
        }
    }

    fn issue_connections(&mut self, reason: FetchReason) -> LookupRequest {
        let token = self.connection_requests.issue();
        self.connection.set_loading(true);
        let query = self.connection_query();
        debug!(resource = %Resource::Connections, token = token.value(), ?reason, search = %query.search_text, "issuing lookup");
        LookupRequest {
            resource: Resource::Connections,
            token,
            query,
            reason,
        }
    }

    fn issue_variables(&mut self, reason: FetchReason) -> LookupRequest {
        let token = self.variable_requests.issue();
        self.variables.set_loading(true);
        let query = self.variable_query();
        debug!(
            resource = %Resource::Variables,
            token = token.value(),
            ?reason,
            connection_id = ?query.connection_id,
            search = %query.search_text,
            "issuing lookup"
        );
        LookupRequest {
            resource: Resource::Variables,
            token,
            query,
            reason,
        }
    }

    /// Apply a settled lookup. Superseded responses are dropped untouched.
    pub fn apply(&mut self, response: LookupResponse) -> ApplyOutcome {
        match response {
            LookupResponse::Connections { request, result } => {
                if !self.connection_requests.complete(request.token) {
                    return stale(&request);
                }
                match result {
                    Ok(items) => {
                        let item_count = items.len();
                        self.connection.set_catalog(items);
                        ApplyOutcome::Applied {
                            resource: Resource::Connections,
                            item_count,
                            selection_changed: false,
                        }
                    }
                    Err(error) => {
                        self.connection.set_loading(false);
                        self.fail(&error)
                    }
                }
            }
            LookupResponse::Variables { request, result } => {
                if !self.variable_requests.complete(request.token) {
                    return stale(&request);
                }
                match result {
                    Ok(items) => {
                        let item_count = items.len();
                        let accumulate = self.options.variable_catalog_merge == CatalogMerge::AccumulateOnSearch
                            && request.reason == FetchReason::Search
                            && !request.query.search_text.is_empty();
                        if accumulate {
                            self.variables.merge_catalog(items);
                        } else {
                            self.variables.set_catalog(items);
                        }
                        // Only a complete scoped catalog can prove a selected variable is gone.
                        let whole_scope = request.query.search_text.is_empty() && request.query.skip_pagination;
                        let selection_changed = request.reason == FetchReason::ScopeChanged
                            && whole_scope
                            && self.options.variable_retention == VariableRetention::DropMissing
                            && self.variables.retain_selected_in_catalog();
                        ApplyOutcome::Applied {
                            resource: Resource::Variables,
                            item_count,
                            selection_changed,
                        }
                    }
                    Err(error) => {
                        self.variables.set_loading(false);
                        self.fail(&error)
                    }
                }
            }
        }
    }

    fn fail(&mut self, error: &LookupError) -> ApplyOutcome {
        let resource = error.resource();
        let message = redact_sensitive(&error.to_string());
        warn!(resource = %resource, error = %message, "lookup failed; keeping previous catalog");
        let notice = Notice { resource, message };
        self.notices.push(notice.clone());
        ApplyOutcome::Failed { resource, notice }
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Current selection as consumed by query assembly.
    pub fn selection(&self) -> Selection {
        Selection {
            connection_id: self.scope(),
            connection_text: self
                .connection
                .value()
                .map(|value| value.text().to_string())
                .unwrap_or_default(),
            variables: self.variables.selected(),
        }
    }
}

fn stale(request: &LookupRequest) -> ApplyOutcome {
    debug!(resource = %request.resource, token = request.token.value(), "dropping stale lookup response");
    ApplyOutcome::Stale {
        resource: request.resource,
        token: request.token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mounted() -> (SelectionCoordinator, Vec<LookupRequest>) {
        let mut coordinator = SelectionCoordinator::new(CoordinatorOptions::default());
        let requests = coordinator.mount();
        (coordinator, requests)
    }

    fn connections(request: LookupRequest, items: Vec<Connection>) -> LookupResponse {
        LookupResponse::Connections { request, result: Ok(items) }
    }

    fn variables(request: LookupRequest, items: Vec<Variable>) -> LookupResponse {
        LookupResponse::Variables { request, result: Ok(items) }
    }

    #[test]
    fn mount_requests_both_catalogs_unfiltered() {
        let (_, requests) = mounted();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].resource, Resource::Connections);
        let variable_query = &requests[1].query;
        assert_eq!(variable_query.connection_id, None);
        assert!(variable_query.skip_connection_filter);
        assert!(variable_query.skip_pagination);
    }

    #[test]
    fn choosing_a_connection_scopes_variables() {
        let (mut coordinator, requests) = mounted();
        let mut requests = requests.into_iter();
        let connection_request = requests.next().expect("connection request");
        coordinator.apply(connections(connection_request, vec![Connection::new(7, "PLC-7")]));

        let transition = coordinator.select_connection("7");
        assert!(transition.selection_changed);
        let query = &transition.requests[0].query;
        assert_eq!(query.connection_id, Some(7));
        assert!(!query.skip_connection_filter);
        assert_eq!(transition.requests[0].reason, FetchReason::ScopeChanged);
    }

    #[test]
    fn clearing_the_connection_unfilters_variables() {
        let (mut coordinator, requests) = mounted();
        coordinator.apply(connections(requests[0].clone(), vec![Connection::new(7, "PLC-7")]));
        coordinator.select_connection("7");

        let transition = coordinator.clear_connection();
        let query = &transition.requests[0].query;
        assert_eq!(query.connection_id, None);
        assert!(query.skip_connection_filter);
    }

    #[test]
    fn reselecting_same_connection_is_a_no_op() {
        let (mut coordinator, requests) = mounted();
        coordinator.apply(connections(requests[0].clone(), vec![Connection::new(7, "PLC-7")]));
        coordinator.select_connection("7");
        assert_eq!(coordinator.select_connection("7"), Transition::unchanged());
    }

    #[test]
    fn stale_variable_response_is_dropped() {
        let (mut coordinator, requests) = mounted();
        let initial = requests[1].clone();
        coordinator.apply(connections(requests[0].clone(), vec![Connection::new(7, "PLC-7")]));
        let scoped = coordinator.select_connection("7").requests.remove(0);

        let outcome = coordinator.apply(variables(scoped, vec![Variable::new(1, "Pressure")]));
        assert!(matches!(outcome, ApplyOutcome::Applied { item_count: 1, .. }));
        let outcome = coordinator.apply(variables(initial, vec![Variable::new(9, "Other")]));
        assert!(matches!(outcome, ApplyOutcome::Stale { resource: Resource::Variables, .. }));
        assert_eq!(coordinator.variables().catalog(), &[Variable::new(1, "Pressure")]);
    }

    #[test]
    fn failed_lookup_keeps_catalog_and_records_notice() {
        let (mut coordinator, requests) = mounted();
        coordinator.apply(connections(requests[0].clone(), vec![Connection::new(1, "PLC-A")]));
        coordinator.type_connection_search("x", Instant::now());
        let request = coordinator
            .tick(Instant::now() + Duration::from_secs(1))
            .into_iter()
            .next()
            .expect("search request");

        let error = LookupError::Status {
            resource: Resource::Connections,
            status: 500,
            body: "boom".into(),
        };
        let outcome = coordinator.apply(LookupResponse::Connections { request, result: Err(error) });
        assert!(matches!(outcome, ApplyOutcome::Failed { resource: Resource::Connections, .. }));
        assert_eq!(coordinator.connection().catalog(), &[Connection::new(1, "PLC-A")]);
        assert!(!coordinator.connection().is_loading());
        let notices = coordinator.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].message.contains("HTTP 500"));
        assert!(coordinator.notices().is_empty());
    }

    #[test]
    fn drop_missing_prunes_selection_on_scope_change() {
        let options = CoordinatorOptions {
            variable_retention: VariableRetention::DropMissing,
            ..CoordinatorOptions::default()
        };
        let mut coordinator = SelectionCoordinator::new(options);
        let requests = coordinator.mount();
        coordinator.apply(connections(requests[0].clone(), vec![Connection::new(7, "PLC-7")]));
        coordinator.apply(variables(
            requests[1].clone(),
            vec![Variable::new(1, "Pressure"), Variable::new(2, "Flow")],
        ));
        coordinator.select_variables(&["1".to_string(), "2".to_string()]);

        let scoped = coordinator.select_connection("7").requests.remove(0);
        let outcome = coordinator.apply(variables(scoped, vec![Variable::new(2, "Flow")]));
        assert!(matches!(outcome, ApplyOutcome::Applied { selection_changed: true, .. }));
        assert_eq!(coordinator.variables().selected_ids(), vec![2]);
    }

    #[test]
    fn drop_missing_keeps_selection_when_scope_refetch_is_filtered() {
        let options = CoordinatorOptions {
            variable_retention: VariableRetention::DropMissing,
            ..CoordinatorOptions::default()
        };
        let mut coordinator = SelectionCoordinator::new(options);
        let requests = coordinator.mount();
        coordinator.apply(connections(requests[0].clone(), vec![Connection::new(7, "PLC-7")]));
        coordinator.apply(variables(
            requests[1].clone(),
            vec![Variable::new(1, "Pressure"), Variable::new(2, "Flow")],
        ));
        coordinator.select_variables(&["1".to_string(), "2".to_string()]);

        let start = Instant::now();
        coordinator.type_variable_search("flow", start);
        let search = coordinator.tick(start + Duration::from_secs(1)).remove(0);
        coordinator.apply(variables(search, vec![Variable::new(2, "Flow")]));

        let scoped = coordinator.select_connection("7").requests.remove(0);
        assert_eq!(scoped.query.search_text, "flow");
        assert!(!scoped.query.skip_pagination);
        let outcome = coordinator.apply(variables(scoped, vec![Variable::new(2, "Flow")]));
        assert!(matches!(outcome, ApplyOutcome::Applied { selection_changed: false, .. }));
        assert_eq!(coordinator.variables().selected_ids(), vec![1, 2]);
    }

    #[test]
    fn search_debounces_fire_independently() {
        let (mut coordinator, _) = mounted();
        let debounce = coordinator.options().debounce;
        let start = Instant::now();
        coordinator.type_connection_search("plc", start);
        coordinator.type_variable_search("pre", start + Duration::from_millis(200));

        let first = coordinator.tick(start + debounce);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].resource, Resource::Connections);
        assert_eq!(first[0].query.search_text, "plc");
        assert!(coordinator.has_pending_search());

        let second = coordinator.tick(start + debounce + Duration::from_millis(200));
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].resource, Resource::Variables);
        assert_eq!(second[0].query.search_text, "pre");
        assert!(!coordinator.has_pending_search());
    }

    #[test]
    fn custom_connection_keeps_variables_unscoped() {
        let (mut coordinator, _) = mounted();
        let transition = coordinator.create_connection("plc-x");
        assert!(transition.selection_changed);
        assert!(transition.requests.is_empty());
        let selection = coordinator.selection();
        assert_eq!(selection.connection_id, None);
        assert_eq!(selection.connection_text, "plc-x");
    }

    #[test]
    fn unmount_makes_in_flight_responses_stale() {
        let (mut coordinator, requests) = mounted();
        coordinator.type_variable_search("pre", Instant::now());
        coordinator.unmount();
        assert!(!coordinator.has_pending_search());
        let outcome = coordinator.apply(connections(requests[0].clone(), vec![Connection::new(1, "PLC-A")]));
        assert!(matches!(outcome, ApplyOutcome::Stale { .. }));
        assert!(coordinator.tick(Instant::now() + Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn restore_rebuilds_selection_from_snapshot() {
        let mut coordinator = SelectionCoordinator::new(CoordinatorOptions::default());
        coordinator.restore(&QuerySnapshot {
            connection_id: Some(7),
            connection_text: "PLC-7".into(),
            variable_ids: vec![1, 2],
            variable_names: vec!["Pressure".into()],
            ..QuerySnapshot::default()
        });
        let selection = coordinator.selection();
        assert_eq!(selection.connection_id, Some(7));
        assert_eq!(selection.variables, vec![Variable::new(1, "Pressure"), Variable::new(2, "2")]);
        let requests = coordinator.mount();
        assert_eq!(requests[1].query.connection_id, Some(7));
    }
}
