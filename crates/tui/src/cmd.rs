//! # Command Execution Layer
//!
//! Translates application [`Effect`]s into imperative [`Cmd`]s and executes
//! them. This is the boundary where the pure editor state meets side effects:
//! - Writing the current query object to the system clipboard
//! - Running catalog lookups against the configured source
//!
//! Lookups are spawned on the tokio runtime and handed back as join handles;
//! the runtime polls them and feeds each response back into the app.

use std::sync::Arc;

use inview_api::CatalogSource;
use inview_engine::{LookupRequest, LookupResponse, execute_lookup};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::app::{App, Effect, Severity, StatusLine};

/// Side-effectful commands executed outside of state updates.
#[derive(Debug)]
pub enum Cmd {
    /// Write text into the system clipboard.
    ClipboardSet(String),
    /// Run one catalog lookup.
    Lookup(LookupRequest),
}

/// Commands that finished immediately and lookups still running.
#[derive(Debug, Default)]
pub struct CommandBatch {
    pub reports: Vec<StatusLine>,
    pub pending: Vec<JoinHandle<LookupResponse>>,
}

/// Convert effects into commands.
pub fn from_effects(app: &App, effects: Vec<Effect>) -> Vec<Cmd> {
    let mut commands = Vec::new();
    for effect in effects {
        match effect {
            Effect::FetchLookups(requests) => commands.extend(requests.into_iter().map(Cmd::Lookup)),
            Effect::CopyQueryRequested => match serde_json::to_string_pretty(&app.host_query()) {
                Ok(json) => commands.push(Cmd::ClipboardSet(json)),
                Err(error) => warn!(error = %error, "failed to serialize query for the clipboard"),
            },
        }
    }
    commands
}

/// Execute commands. Lookups are spawned; everything else completes in place.
pub fn run_cmds(source: &Arc<dyn CatalogSource>, commands: Vec<Cmd>) -> CommandBatch {
    let mut batch = CommandBatch::default();
    for command in commands {
        match command {
            Cmd::ClipboardSet(text) => batch.reports.push(execute_clipboard_set(text)),
            Cmd::Lookup(request) => batch.pending.push(spawn_lookup(Arc::clone(source), request)),
        }
    }
    batch
}

fn spawn_lookup(source: Arc<dyn CatalogSource>, request: LookupRequest) -> JoinHandle<LookupResponse> {
    tokio::spawn(async move { execute_lookup(source.as_ref(), request).await })
}

fn execute_clipboard_set(text: String) -> StatusLine {
    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
        Ok(()) => StatusLine {
            text: "Copied query object to clipboard".into(),
            severity: Severity::Info,
        },
        Err(error) => {
            warn!(error = %error, "clipboard write failed");
            StatusLine {
                text: format!("Clipboard error: {error}"),
                severity: Severity::Error,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use inview_api::LookupError;
    use inview_types::{Connection, LookupQuery, Variable};
    use inview_util::config::EditorConfig;

    struct StaticSource;

    #[async_trait]
    impl CatalogSource for StaticSource {
        async fn connections(&self, _query: &LookupQuery) -> Result<Vec<Connection>, LookupError> {
            Ok(vec![Connection::new(1, "PLC-A")])
        }

        async fn variables(&self, query: &LookupQuery) -> Result<Vec<Variable>, LookupError> {
            Ok(vec![Variable::new(query.connection_id.unwrap_or_default(), "scoped")])
        }
    }

    #[test]
    fn copy_effect_becomes_clipboard_command_with_query_json() {
        let app = App::new(&EditorConfig::default(), None, "http://localhost".into());
        let commands = from_effects(&app, vec![Effect::CopyQueryRequested]);
        match commands.as_slice() {
            [Cmd::ClipboardSet(json)] => assert!(json.contains("\"queryText\"")),
            other => panic!("unexpected commands: {other:?}"),
        }
    }

    #[tokio::test]
    async fn lookups_are_spawned_and_answered() {
        let mut app = App::new(&EditorConfig::default(), None, "http://localhost".into());
        let effects = app.start();
        let commands = from_effects(&app, effects);
        assert_eq!(commands.len(), 2);

        let source: Arc<dyn CatalogSource> = Arc::new(StaticSource);
        let batch = run_cmds(&source, commands);
        assert!(batch.reports.is_empty());
        for handle in batch.pending {
            let response = handle.await.expect("lookup task");
            app.update(crate::app::Msg::LookupSettled(response), std::time::Instant::now());
        }
        assert_eq!(app.editor.coordinator().connection().catalog(), &[Connection::new(1, "PLC-A")]);
        assert_eq!(app.editor.coordinator().variables().catalog(), &[Variable::new(0, "scoped")]);
    }
}
