//! Runtime: event loop and terminal lifecycle for the query editor.
//!
//! Responsibilities
//! - Own the terminal lifecycle (enter/leave alternate screen, raw mode).
//! - Forward terminal input from a dedicated thread over a channel.
//! - Tick every 100 ms so search debounces fire on time, and poll spawned
//!   lookups through a `FuturesUnordered` of join handles.
//! - Execute the `Effect`s returned by `App::update` via the command layer.
//! - Render only when something visible changed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::{StreamExt, stream::FuturesUnordered};
use inview_api::CatalogSource;
use inview_engine::LookupResponse;
use inview_types::HostQuery;
use inview_util::config::EditorConfig;
use ratatui::{Terminal, prelude::*};
use tokio::task::JoinHandle;
use tokio::{
    signal,
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::app::{App, Effect, Msg};
use crate::cmd;
use crate::ui::{theme, view};

const THROBBER: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// Spawn a dedicated input thread that blocks on terminal input and forwards
/// `crossterm` events over a Tokio channel.
fn spawn_input_thread() -> mpsc::Receiver<Event> {
    let (sender, receiver) = mpsc::channel(256);
    std::thread::spawn(move || {
        loop {
            match event::read() {
                Ok(event) => {
                    if sender.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    warn!(error = %error, "failed to read terminal event");
                    break;
                }
            }
        }
    });
    receiver
}

/// Put the terminal into raw mode and enter the alternate screen.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = std::io::stdout();
    let terminal = execute!(stdout, EnterAlternateScreen)
        .context("enter alternate screen")
        .and_then(|()| Terminal::new(CrosstermBackend::new(stdout)).context("create terminal"));
    if terminal.is_err()
        && let Err(error) = disable_raw_mode()
    {
        warn!(error = %error, "failed to leave raw mode after terminal setup failed");
    }
    terminal
}

/// Restore terminal settings and leave the alternate screen.
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn render(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, app: &App, theme: &dyn theme::Theme, frame_index: usize) -> Result<()> {
    let throbber = THROBBER[frame_index % THROBBER.len()];
    terminal.draw(|frame| view::draw(frame, app, theme, throbber))?;
    Ok(())
}

/// Turn effects into commands and start them. Immediate reports go straight back into the app.
fn process_effects(
    app: &mut App,
    source: &Arc<dyn CatalogSource>,
    effects: Vec<Effect>,
    pending: &mut FuturesUnordered<JoinHandle<LookupResponse>>,
) {
    if effects.is_empty() {
        return;
    }
    let commands = cmd::from_effects(app, effects);
    let batch = cmd::run_cmds(source, commands);
    pending.extend(batch.pending);
    for report in batch.reports {
        app.update(Msg::CommandReport(report), Instant::now());
    }
}

/// Entry point: sets up the terminal, runs the event loop and restores the
/// terminal on exit, even when the loop fails.
pub async fn run_app(config: EditorConfig, source: Arc<dyn CatalogSource>, initial: Option<HostQuery>, endpoint: String) -> Result<HostQuery> {
    let mut app = App::new(&config, initial.as_ref(), endpoint);
    let theme = theme::load();
    let mut input_receiver = spawn_input_thread();
    let mut terminal = setup_terminal()?;

    let result = event_loop(&mut terminal, &mut app, theme.as_ref(), &source, &mut input_receiver).await;

    app.stop();
    cleanup_terminal(&mut terminal)?;
    result?;

    let query = app.host_query();
    info!(query_text = %query.query_text, runs = app.editor.sink().runs, "editor closed");
    Ok(query)
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    theme: &dyn theme::Theme,
    source: &Arc<dyn CatalogSource>,
    input_receiver: &mut mpsc::Receiver<Event>,
) -> Result<()> {
    let mut pending: FuturesUnordered<JoinHandle<LookupResponse>> = FuturesUnordered::new();
    let effects = app.start();
    process_effects(app, source, effects, &mut pending);

    let mut ticker = time::interval(Duration::from_millis(100));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut frame_index = 0usize;

    render(terminal, app, theme, frame_index)?;

    loop {
        let mut needs_render = false;
        tokio::select! {
            maybe_event = input_receiver.recv() => {
                let Some(event) = maybe_event else {
                    // Input channel closed; shut down cleanly.
                    break;
                };
                match event {
                    Event::Key(key) if key.kind != KeyEventKind::Release => {
                        let effects = app.update(Msg::Key(key), Instant::now());
                        process_effects(app, source, effects, &mut pending);
                    }
                    Event::Resize(..) => {}
                    _ => continue,
                }
                needs_render = true;
            }

            _ = ticker.tick() => {
                let effects = app.update(Msg::Tick, Instant::now());
                needs_render = !effects.is_empty() || app.is_loading();
                process_effects(app, source, effects, &mut pending);
                if app.is_loading() {
                    frame_index = frame_index.wrapping_add(1);
                }
            }

            Some(joined) = pending.next(), if !pending.is_empty() => {
                let msg = match joined {
                    Ok(response) => Msg::LookupSettled(response),
                    Err(error) => {
                        warn!(error = %error, "lookup task did not complete");
                        Msg::LookupAborted(error.to_string())
                    }
                };
                let effects = app.update(msg, Instant::now());
                process_effects(app, source, effects, &mut pending);
                needs_render = true;
            }

            _ = signal::ctrl_c() => { break; }
        }

        if app.should_quit {
            break;
        }
        if needs_render {
            render(terminal, app, theme, frame_index)?;
        }
    }
    Ok(())
}
