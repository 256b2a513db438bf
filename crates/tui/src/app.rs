//! Application state and input handling for the query editor TUI.
//!
//! `App` wraps the engine's `QueryEditor` together with the widget state the
//! terminal needs (text inputs, option cursors, the status line). Input is
//! handled synchronously; anything effectful is returned as an [`Effect`] and
//! carried out by the command layer.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use inview_engine::{ApplyOutcome, LookupRequest, LookupResponse, QueryEditor, QuerySink};
use inview_types::{HostQuery, QueryMode};
use inview_util::config::EditorConfig;
use tracing::debug;

use crate::ui::components::text_input::TextInputState;

/// Editor fields in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Connection,
    Variables,
    Mode,
    Prefix,
    Tags,
    Paging,
}

impl Field {
    pub const ORDER: [Field; 6] = [
        Field::Connection,
        Field::Variables,
        Field::Mode,
        Field::Prefix,
        Field::Tags,
        Field::Paging,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|field| *field == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn previous(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn title(self) -> &'static str {
        match self {
            Field::Connection => "Connection",
            Field::Variables => "Variables",
            Field::Mode => "Mode",
            Field::Prefix => "Prefix",
            Field::Tags => "OPC tags",
            Field::Paging => "Paging",
        }
    }
}

/// Stands in for the host: keeps the latest emitted query and counts run requests.
#[derive(Debug, Default)]
pub struct QueryPreview {
    pub latest: Option<HostQuery>,
    pub changes: usize,
    pub runs: usize,
}

impl QuerySink for QueryPreview {
    fn on_change(&mut self, query: &HostQuery) {
        self.latest = Some(query.clone());
        self.changes += 1;
    }

    fn on_run(&mut self) {
        self.runs += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub severity: Severity,
}

#[derive(Debug)]
pub enum Msg {
    Key(KeyEvent),
    Tick,
    LookupSettled(LookupResponse),
    /// A lookup task ended without producing a response.
    LookupAborted(String),
    /// Outcome of a command that has no response of its own.
    CommandReport(StatusLine),
}

/// Side effects requested by a state update.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchLookups(Vec<LookupRequest>),
    CopyQueryRequested,
}

#[derive(Debug)]
pub struct App {
    pub editor: QueryEditor<QueryPreview>,
    pub focus: Field,
    pub connection_input: TextInputState,
    pub variable_input: TextInputState,
    pub prefix_input: TextInputState,
    pub tags_input: TextInputState,
    pub page_size_input: TextInputState,
    /// Highlighted row in the visible connection options.
    pub connection_cursor: usize,
    pub variable_cursor: usize,
    pub status: Option<StatusLine>,
    pub endpoint: String,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: &EditorConfig, initial: Option<&HostQuery>, endpoint: String) -> Self {
        let editor = match initial {
            Some(query) => QueryEditor::with_initial(config, query, QueryPreview::default()),
            None => QueryEditor::new(config, QueryPreview::default()),
        };
        let form = editor.form();
        let prefix_input = TextInputState::with_text(form.prefix.clone());
        let tags_input = TextInputState::with_text(form.tag_list.clone());
        let page_size_input = TextInputState::with_text(form.page_size().to_string());
        Self {
            editor,
            focus: Field::default(),
            connection_input: TextInputState::new(),
            variable_input: TextInputState::new(),
            prefix_input,
            tags_input,
            page_size_input,
            connection_cursor: 0,
            variable_cursor: 0,
            status: None,
            endpoint,
            should_quit: false,
        }
    }

    /// Mount the editor and request the initial catalogs.
    pub fn start(&mut self) -> Vec<Effect> {
        fetch(self.editor.mount())
    }

    pub fn stop(&mut self) {
        self.editor.unmount();
    }

    /// The query object the host would currently receive.
    pub fn host_query(&self) -> HostQuery {
        self.editor.host_query()
    }

    pub fn is_loading(&self) -> bool {
        let coordinator = self.editor.coordinator();
        coordinator.connection().is_loading() || coordinator.variables().is_loading() || coordinator.has_pending_search()
    }

    pub fn update(&mut self, msg: Msg, now: Instant) -> Vec<Effect> {
        match msg {
            Msg::Key(key) => self.handle_key(key, now),
            Msg::Tick => fetch(self.editor.tick(now)),
            Msg::LookupSettled(response) => {
                self.apply_lookup(response);
                Vec::new()
            }
            Msg::LookupAborted(reason) => {
                self.set_status(Severity::Error, format!("Lookup task failed: {reason}"));
                Vec::new()
            }
            Msg::CommandReport(status) => {
                self.status = Some(status);
                Vec::new()
            }
        }
    }

    fn apply_lookup(&mut self, response: LookupResponse) {
        match self.editor.apply(response) {
            ApplyOutcome::Applied { .. } => self.clamp_cursors(),
            ApplyOutcome::Stale { resource, token } => {
                debug!(resource = %resource, token = token.value(), "ignored superseded lookup");
            }
            ApplyOutcome::Failed { .. } => {
                if let Some(notice) = self.editor.take_notices().pop() {
                    self.set_status(Severity::Error, notice.message);
                }
            }
        }
    }

    fn clamp_cursors(&mut self) {
        let coordinator = self.editor.coordinator();
        let connections = coordinator.connection().visible_options().len();
        let variables = coordinator.variables().visible_options().len();
        self.connection_cursor = self.connection_cursor.min(connections.saturating_sub(1));
        self.variable_cursor = self.variable_cursor.min(variables.saturating_sub(1));
    }

    fn set_status(&mut self, severity: Severity, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            severity,
        });
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => {
                    self.should_quit = true;
                    return Vec::new();
                }
                KeyCode::Char('r') => {
                    self.run_query();
                    return Vec::new();
                }
                KeyCode::Char('y') => return vec![Effect::CopyQueryRequested],
                _ => {}
            }
        }
        match key.code {
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return Vec::new();
            }
            KeyCode::BackTab => {
                self.focus = self.focus.previous();
                return Vec::new();
            }
            _ => {}
        }
        match self.focus {
            Field::Connection => self.handle_connection_key(key, now),
            Field::Variables => self.handle_variable_key(key, now),
            Field::Mode => {
                self.handle_mode_key(key);
                Vec::new()
            }
            Field::Prefix => {
                if self.prefix_input.handle_key(&key) {
                    self.editor.set_prefix(self.prefix_input.input());
                }
                Vec::new()
            }
            Field::Tags => {
                if self.tags_input.handle_key(&key) {
                    self.editor.set_tag_list(self.tags_input.input());
                }
                Vec::new()
            }
            Field::Paging => {
                self.handle_paging_key(key);
                Vec::new()
            }
        }
    }

    fn run_query(&mut self) {
        if self.editor.run_query() {
            self.set_status(Severity::Info, "Run requested");
        } else {
            self.set_status(Severity::Warning, "Nothing to run: live queries need at least one variable");
        }
    }

    fn handle_connection_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        match key.code {
            KeyCode::Up => {
                self.connection_cursor = self.connection_cursor.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Down => {
                let count = self.editor.coordinator().connection().visible_options().len();
                if self.connection_cursor + 1 < count {
                    self.connection_cursor += 1;
                }
                Vec::new()
            }
            KeyCode::Delete => fetch(self.editor.clear_connection()),
            KeyCode::Enter => {
                let visible = self.editor.coordinator().connection().visible_options();
                let requests = match visible.get(self.connection_cursor) {
                    Some(option) => self.editor.select_connection(&option.value),
                    None if !self.connection_input.is_empty() => {
                        let raw = self.connection_input.input().to_string();
                        if self.editor.coordinator().connection().allows_custom_value() {
                            self.editor.create_connection(&raw)
                        } else {
                            self.set_status(Severity::Warning, format!("No connection matches \"{raw}\""));
                            return Vec::new();
                        }
                    }
                    None => return Vec::new(),
                };
                if !self.connection_input.is_empty() {
                    self.connection_input.clear();
                    self.editor.type_connection_search("", now);
                }
                self.connection_cursor = 0;
                fetch(requests)
            }
            _ => {
                if self.connection_input.handle_key(&key) {
                    self.editor.type_connection_search(self.connection_input.input(), now);
                    self.connection_cursor = 0;
                }
                Vec::new()
            }
        }
    }

    fn handle_variable_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        match key.code {
            KeyCode::Up => self.variable_cursor = self.variable_cursor.saturating_sub(1),
            KeyCode::Down => {
                let count = self.editor.coordinator().variables().visible_options().len();
                if self.variable_cursor + 1 < count {
                    self.variable_cursor += 1;
                }
            }
            KeyCode::Delete => self.editor.clear_variables(),
            KeyCode::Backspace if self.variable_input.is_empty() => {
                if let Some(last) = self.editor.coordinator().variables().selected_ids().last().copied() {
                    self.editor.remove_variable(last);
                }
            }
            KeyCode::Enter => {
                let visible = self.editor.coordinator().variables().visible_options();
                match visible.get(self.variable_cursor) {
                    Some(option) => self.editor.toggle_variable(&option.value),
                    None if !self.variable_input.is_empty() => {
                        let raw = self.variable_input.input().to_string();
                        let before = self.editor.coordinator().variables().selected_ids();
                        self.editor.create_variable(&raw);
                        if before == self.editor.coordinator().variables().selected_ids() {
                            self.set_status(Severity::Warning, format!("\"{raw}\" is not a variable id"));
                        }
                    }
                    None => {}
                }
            }
            _ => {
                if self.variable_input.handle_key(&key) {
                    self.editor.type_variable_search(self.variable_input.input(), now);
                    self.variable_cursor = 0;
                }
            }
        }
        Vec::new()
    }

    fn handle_mode_key(&mut self, key: KeyEvent) {
        let mode = self.editor.form().mode;
        let next = match key.code {
            KeyCode::Left | KeyCode::Up => mode.previous(),
            KeyCode::Right | KeyCode::Down | KeyCode::Char(' ') => mode.next(),
            KeyCode::Char('l') => QueryMode::Live,
            KeyCode::Char('a') => QueryMode::Alarm,
            KeyCode::Char('e') => QueryMode::Event,
            _ => return,
        };
        self.editor.set_mode(next);
    }

    fn handle_paging_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::PageUp => self.editor.previous_page(),
            KeyCode::Right | KeyCode::PageDown => self.editor.next_page(),
            KeyCode::Home => self.editor.set_page_index(0),
            KeyCode::Enter => self.apply_page_size(),
            KeyCode::Char(c) if !c.is_ascii_digit() && !key.modifiers.contains(KeyModifiers::CONTROL) => {}
            _ => {
                self.page_size_input.handle_key(&key);
            }
        }
    }

    fn apply_page_size(&mut self) {
        let raw = self.page_size_input.input().trim().to_string();
        match raw.parse::<u32>() {
            Ok(size) if self.editor.set_page_size(size) => {
                self.set_status(Severity::Info, format!("Page size set to {size}"));
            }
            _ => {
                self.page_size_input.set_input(self.editor.form().page_size().to_string());
                self.set_status(Severity::Warning, "Page size must be a positive number");
            }
        }
    }
}

fn fetch(requests: Vec<LookupRequest>) -> Vec<Effect> {
    if requests.is_empty() { Vec::new() } else { vec![Effect::FetchLookups(requests)] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inview_types::{Connection, Resource, Variable};
    use std::time::Duration;

    fn key(code: KeyCode) -> Msg {
        Msg::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Msg {
        Msg::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn requests(effects: Vec<Effect>) -> Vec<LookupRequest> {
        effects
            .into_iter()
            .flat_map(|effect| match effect {
                Effect::FetchLookups(requests) => requests,
                Effect::CopyQueryRequested => Vec::new(),
            })
            .collect()
    }

    fn started() -> (App, Instant) {
        let mut app = App::new(&EditorConfig::default(), None, "http://localhost".into());
        let now = Instant::now();
        for request in requests(app.start()) {
            let response = match request.resource {
                Resource::Connections => LookupResponse::Connections {
                    request,
                    result: Ok(vec![Connection::new(1, "PLC-A"), Connection::new(2, "PLC-B")]),
                },
                Resource::Variables => LookupResponse::Variables {
                    request,
                    result: Ok(vec![Variable::new(10, "Pressure"), Variable::new(11, "Flow")]),
                },
            };
            app.update(Msg::LookupSettled(response), now);
        }
        (app, now)
    }

    #[test]
    fn typing_a_search_fetches_after_the_debounce() {
        let (mut app, now) = started();
        for c in "plc".chars() {
            assert!(app.update(key(KeyCode::Char(c)), now).is_empty());
        }
        assert!(app.update(Msg::Tick, now + Duration::from_millis(100)).is_empty());
        let issued = requests(app.update(Msg::Tick, now + Duration::from_secs(1)));
        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].resource, Resource::Connections);
        assert_eq!(issued[0].query.search_text, "plc");
    }

    #[test]
    fn selecting_a_connection_scopes_variable_lookup() {
        let (mut app, now) = started();
        app.update(key(KeyCode::Down), now);
        let issued = requests(app.update(key(KeyCode::Enter), now));
        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].query.connection_id, Some(2));
        assert_eq!(app.host_query().connection_text, "PLC-B");
    }

    #[test]
    fn toggling_a_variable_runs_the_query() {
        let (mut app, now) = started();
        app.update(key(KeyCode::Tab), now);
        app.update(key(KeyCode::Enter), now);
        assert_eq!(app.host_query().query_text, "10");
        assert_eq!(app.editor.sink().runs, 1);

        app.update(key(KeyCode::Backspace), now);
        assert!(app.host_query().variable_ids.is_empty());
    }

    #[test]
    fn zero_page_size_is_refused() {
        let (mut app, now) = started();
        app.focus = Field::Paging;
        app.update(ctrl('u'), now);
        app.update(key(KeyCode::Char('0')), now);
        app.update(key(KeyCode::Enter), now);
        assert_eq!(app.editor.form().page_size(), 10);
        assert_eq!(app.page_size_input.input(), "10");
        assert_eq!(app.status.as_ref().map(|status| status.severity), Some(Severity::Warning));
    }

    #[test]
    fn run_without_variables_warns() {
        let (mut app, now) = started();
        app.update(ctrl('r'), now);
        assert_eq!(app.editor.sink().runs, 0);
        assert_eq!(app.status.as_ref().map(|status| status.severity), Some(Severity::Warning));
        assert_eq!(app.update(ctrl('y'), now), vec![Effect::CopyQueryRequested]);
    }

    #[test]
    fn mode_keys_cycle_modes() {
        let (mut app, now) = started();
        app.focus = Field::Mode;
        app.update(key(KeyCode::Right), now);
        assert!(app.host_query().is_alarm);
        app.update(key(KeyCode::Char('e')), now);
        assert!(app.host_query().is_event);
    }
}
