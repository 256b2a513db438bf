//! # InView Query Editor TUI
//!
//! A terminal front end for the query editor engine. It renders the
//! connection and variable selectors, the mode, prefix, tag and paging
//! fields, and a live preview of the query object the editor emits.
//!
//! ## Architecture
//!
//! The TUI follows a functional core, imperative shell layout:
//! - `app` owns all editor state and turns input into `Effect`s.
//! - `cmd` turns effects into commands (clipboard writes, catalog lookups).
//! - `ui::runtime` owns the terminal and the event loop.

mod app;
mod cmd;
mod ui;

use std::sync::Arc;

use anyhow::Result;
use inview_api::CatalogSource;
use inview_types::HostQuery;
use inview_util::config::EditorConfig;

/// Runs the query editor until the user quits.
///
/// `initial` seeds the editor with a previously emitted query. The query in
/// effect when the editor closes is returned so the caller can hand it to the
/// host.
///
/// # Errors
///
/// Fails when the terminal cannot be put into (or restored from) raw mode.
pub async fn run(config: EditorConfig, source: Arc<dyn CatalogSource>, initial: Option<HostQuery>, endpoint: String) -> Result<HostQuery> {
    ui::runtime::run_app(config, source, initial, endpoint).await
}
