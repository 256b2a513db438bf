//! The query editor facade.
//!
//! [`QueryEditor`] ties the selection coordinator to the form fields and
//! reports every change of the assembled query to a [`QuerySink`]. Committed
//! selection, mode and paging changes are followed by a run signal when the
//! query is runnable; free-text fields only report the change.

use std::time::Instant;

use inview_types::{HostQuery, QueryMode, QuerySnapshot};
use inview_util::config::EditorConfig;
use tracing::debug;

use crate::assembly::{QueryForm, assemble};
use crate::coordinator::{ApplyOutcome, CoordinatorOptions, LookupRequest, LookupResponse, Notice, SelectionCoordinator, Transition};

/// Receiver of editor output, normally the host runtime.
pub trait QuerySink {
    /// The assembled query changed.
    fn on_change(&mut self, query: &HostQuery);

    /// The host should execute the current query.
    fn on_run(&mut self);
}

#[derive(Debug)]
pub struct QueryEditor<S> {
    coordinator: SelectionCoordinator,
    form: QueryForm,
    sink: S,
    last_emitted: Option<QuerySnapshot>,
}

impl<S: QuerySink> QueryEditor<S> {
    pub fn new(config: &EditorConfig, sink: S) -> Self {
        Self {
            coordinator: SelectionCoordinator::new(CoordinatorOptions::from(config)),
            form: QueryForm::with_page_size(config.page_size),
            sink,
            last_emitted: None,
        }
    }

    /// Open the editor on a previously emitted query. The restored state counts as already emitted.
    pub fn with_initial(config: &EditorConfig, initial: &HostQuery, sink: S) -> Self {
        let snapshot = initial.to_snapshot();
        let mut editor = Self::new(config, sink);
        editor.coordinator.restore(&snapshot);
        editor.form = QueryForm::from_snapshot(&snapshot);
        editor.last_emitted = Some(editor.snapshot());
        editor
    }

    pub fn coordinator(&self) -> &SelectionCoordinator {
        &self.coordinator
    }

    pub fn form(&self) -> &QueryForm {
        &self.form
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn snapshot(&self) -> QuerySnapshot {
        assemble(&self.coordinator.selection(), &self.form)
    }

    /// Wire object for the current state.
    pub fn host_query(&self) -> HostQuery {
        HostQuery::from_snapshot(
            &self.snapshot(),
            self.coordinator.connection().catalog(),
            &self.coordinator.variables().selected(),
        )
    }

    pub fn mount(&mut self) -> Vec<LookupRequest> {
        self.coordinator.mount()
    }

    pub fn unmount(&mut self) {
        self.coordinator.unmount();
    }

    pub fn select_connection(&mut self, value: &str) -> Vec<LookupRequest> {
        let transition = self.coordinator.select_connection(value);
        self.after_selection(transition)
    }

    pub fn create_connection(&mut self, raw: &str) -> Vec<LookupRequest> {
        let transition = self.coordinator.create_connection(raw);
        self.after_selection(transition)
    }

    pub fn clear_connection(&mut self) -> Vec<LookupRequest> {
        let transition = self.coordinator.clear_connection();
        self.after_selection(transition)
    }

    pub fn select_variables(&mut self, values: &[String]) {
        let transition = self.coordinator.select_variables(values);
        self.after_selection(transition);
    }

    pub fn toggle_variable(&mut self, value: &str) {
        let transition = self.coordinator.toggle_variable(value);
        self.after_selection(transition);
    }

    pub fn remove_variable(&mut self, id: i64) {
        let transition = self.coordinator.remove_variable(id);
        self.after_selection(transition);
    }

    pub fn create_variable(&mut self, raw: &str) {
        let transition = self.coordinator.create_variable(raw);
        self.after_selection(transition);
    }

    pub fn clear_variables(&mut self) {
        let transition = self.coordinator.clear_variables();
        self.after_selection(transition);
    }

    fn after_selection(&mut self, transition: Transition) -> Vec<LookupRequest> {
        if transition.selection_changed {
            self.publish(true);
        }
        transition.requests
    }

    pub fn type_connection_search(&mut self, text: impl Into<String>, now: Instant) {
        self.coordinator.type_connection_search(text, now);
    }

    pub fn type_variable_search(&mut self, text: impl Into<String>, now: Instant) {
        self.coordinator.type_variable_search(text, now);
    }

    pub fn tick(&mut self, now: Instant) -> Vec<LookupRequest> {
        self.coordinator.tick(now)
    }

    pub fn apply(&mut self, response: LookupResponse) -> ApplyOutcome {
        let outcome = self.coordinator.apply(response);
        if let ApplyOutcome::Applied { selection_changed: true, .. } = outcome {
            self.publish(true);
        }
        outcome
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.coordinator.take_notices()
    }

    pub fn set_mode(&mut self, mode: QueryMode) {
        self.form.mode = mode;
        self.publish(true);
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.form.prefix = prefix.into();
        self.publish(false);
    }

    pub fn set_tag_list(&mut self, tag_list: impl Into<String>) {
        self.form.tag_list = tag_list.into();
        self.publish(false);
    }

    /// Zero is rejected and reported as `false`.
    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        if !self.form.set_page_size(page_size) {
            return false;
        }
        self.publish(true);
        true
    }

    pub fn set_page_index(&mut self, page_index: i64) {
        self.form.set_page_index(page_index);
        self.publish(true);
    }

    pub fn next_page(&mut self) {
        self.form.next_page();
        self.publish(true);
    }

    pub fn previous_page(&mut self) {
        self.form.previous_page();
        self.publish(true);
    }

    /// Ask the host to run the current query. Returns whether it was runnable.
    pub fn run_query(&mut self) -> bool {
        let runnable = self.snapshot().is_runnable();
        if runnable {
            self.sink.on_run();
        }
        runnable
    }

    /// Emit the snapshot when it differs from the last emission.
    fn publish(&mut self, run: bool) -> bool {
        let snapshot = self.snapshot();
        if self.last_emitted.as_ref() == Some(&snapshot) {
            return false;
        }
        let query = HostQuery::from_snapshot(
            &snapshot,
            self.coordinator.connection().catalog(),
            &self.coordinator.variables().selected(),
        );
        debug!(query_text = %query.query_text, mode = %snapshot.mode, run, "query changed");
        self.sink.on_change(&query);
        if run && snapshot.is_runnable() {
            self.sink.on_run();
        }
        self.last_emitted = Some(snapshot);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inview_types::Variable;

    #[derive(Debug, Default)]
    struct Recorder {
        changes: Vec<HostQuery>,
        runs: usize,
    }

    impl QuerySink for Recorder {
        fn on_change(&mut self, query: &HostQuery) {
            self.changes.push(query.clone());
        }

        fn on_run(&mut self) {
            self.runs += 1;
        }
    }

    fn editor() -> QueryEditor<Recorder> {
        QueryEditor::new(&EditorConfig::default(), Recorder::default())
    }

    #[test]
    fn free_text_fields_change_without_running() {
        let mut editor = editor();
        editor.set_prefix("area1/");
        editor.set_tag_list("a,b");
        assert_eq!(editor.sink().changes.len(), 2);
        assert_eq!(editor.sink().runs, 0);
        assert_eq!(editor.sink().changes[1].opc_tags, "a,b");
    }

    #[test]
    fn unchanged_snapshot_is_not_emitted_again() {
        let mut editor = editor();
        editor.set_prefix("x");
        editor.set_prefix("x");
        assert_eq!(editor.sink().changes.len(), 1);
    }

    #[test]
    fn live_query_without_variables_never_runs() {
        let mut editor = editor();
        editor.next_page();
        assert_eq!(editor.sink().changes.len(), 1);
        assert_eq!(editor.sink().runs, 0);
        assert!(!editor.run_query());

        editor.set_mode(QueryMode::Alarm);
        assert_eq!(editor.sink().runs, 1);
        assert!(editor.sink().changes[1].is_alarm);
    }

    #[test]
    fn variable_selection_changes_then_runs() {
        let mut editor = editor();
        editor.create_variable("12");
        let last = editor.sink().changes.last().expect("emitted query");
        assert_eq!(last.query_text, "12");
        assert_eq!(last.variables, vec![Variable::new(12, "12")]);
        assert_eq!(editor.sink().runs, 1);
    }

    #[test]
    fn page_size_change_emits_reset_index() {
        let mut editor = editor();
        editor.set_page_index(3);
        assert!(editor.set_page_size(20));
        let last = editor.sink().changes.last().expect("emitted query");
        assert_eq!((last.page_index, last.page_size), (0, 20));
        assert!(!editor.set_page_size(0));
    }

    #[test]
    fn initial_query_is_restored_without_emitting() {
        let initial = HostQuery {
            query_text: "5".into(),
            connection_id: Some(2),
            connection_text: "PLC-B".into(),
            variable_ids: vec![5],
            variable_names: vec!["Level".into()],
            is_event: true,
            page_size: 25,
            page_index: 2,
            ..HostQuery::default()
        };
        let editor = QueryEditor::with_initial(&EditorConfig::default(), &initial, Recorder::default());
        assert!(editor.sink().changes.is_empty());
        let snapshot = editor.snapshot();
        assert_eq!(snapshot.mode, QueryMode::Event);
        assert_eq!(snapshot.variable_ids, vec![5]);
        assert_eq!((snapshot.page_index, snapshot.page_size), (2, 25));
        assert_eq!(editor.host_query().connection_id, Some(2));
    }
}
