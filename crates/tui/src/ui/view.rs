//! Frame layout and rendering.
//!
//! ```text
//! ┌ header ────────────────────────────────────────────┐
//! │ Connection            │ Variables                  │
//! ├ Mode ┬ Prefix ┬ OPC tags ┬ Paging ─────────────────┤
//! │ query object preview                               │
//! └ status / key hints ────────────────────────────────┘
//! ```

use inview_engine::OptionsStatus;
use inview_types::{CatalogEntity, QueryMode, SelectionOption};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::{App, Field, Severity};
use crate::ui::components::json_preview::highlight_lines;
use crate::ui::components::text_input::TextInputState;
use crate::ui::theme::{Theme, block};

pub fn draw(frame: &mut Frame, app: &App, theme: &dyn Theme, throbber: &str) {
    frame.render_widget(
        ratatui::widgets::Block::default().style(Style::default().bg(theme.roles().background)),
        frame.area(),
    );
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Percentage(40),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, rows[0], app, theme, throbber);

    let selectors = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);
    draw_connection(frame, selectors[0], app, theme);
    draw_variables(frame, selectors[1], app, theme);

    let form = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(26),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Min(24),
        ])
        .split(rows[2]);
    draw_mode(frame, form[0], app, theme);
    draw_text_field(frame, form[1], app, theme, Field::Prefix, &app.prefix_input);
    draw_text_field(frame, form[2], app, theme, Field::Tags, &app.tags_input);
    draw_paging(frame, form[3], app, theme);

    draw_preview(frame, rows[3], app, theme);
    draw_footer(frame, rows[4], app, theme);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App, theme: &dyn Theme, throbber: &str) {
    let mut spans = vec![
        Span::styled(" InView query editor ", theme.accent_emphasis_style()),
        Span::styled(app.endpoint.as_str(), theme.text_muted_style()),
    ];
    if app.is_loading() {
        spans.push(Span::styled(format!("  {throbber} loading"), theme.status_info()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Input line followed by the option list, or a Loading/Empty placeholder.
#[allow(clippy::too_many_arguments)]
fn draw_selector<E: CatalogEntity>(
    frame: &mut Frame,
    area: Rect,
    theme: &dyn Theme,
    title: &str,
    focused: bool,
    input: &TextInputState,
    header: Line<'_>,
    options: Vec<(SelectionOption<E>, bool)>,
    status: OptionsStatus,
    cursor: usize,
) {
    let outer = block(theme, title, focused);
    let inner = outer.inner(area);
    frame.render_widget(outer, area);
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let prompt = Line::from(vec![
        Span::styled("search › ", theme.text_muted_style()),
        Span::styled(input.input(), theme.text_primary_style()),
    ]);
    frame.render_widget(Paragraph::new(prompt), parts[0]);
    if focused {
        let x = parts[0].x + 9 + input.cursor_column();
        frame.set_cursor_position(Position::new(x.min(parts[0].right().saturating_sub(1)), parts[0].y));
    }
    frame.render_widget(Paragraph::new(header), parts[1]);

    let placeholder = match status {
        OptionsStatus::Loading => Some("Loading…"),
        OptionsStatus::Empty => Some("No options"),
        OptionsStatus::Ready => None,
    };
    if let Some(text) = placeholder {
        frame.render_widget(Paragraph::new(Span::styled(text, theme.text_muted_style())), parts[2]);
        return;
    }

    let items: Vec<ListItem> = options
        .into_iter()
        .map(|(option, selected)| {
            let marker = if selected { "● " } else { "  " };
            let mut spans = vec![
                Span::styled(marker, theme.status_success()),
                Span::styled(option.label, theme.text_primary_style()),
                Span::styled(format!("  #{}", option.value), theme.text_muted_style()),
            ];
            if option.source.is_none() {
                spans.push(Span::styled("  custom", theme.status_warning()));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    let mut state = ListState::default();
    if focused {
        state.select(Some(cursor));
    }
    let list = List::new(items).highlight_style(theme.selection_style().add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(list, parts[2], &mut state);
}

fn draw_connection(frame: &mut Frame, area: Rect, app: &App, theme: &dyn Theme) {
    let selector = app.editor.coordinator().connection();
    let selected = selector.selected_option();
    let header = match &selected {
        Some(option) => Line::from(vec![
            Span::styled("selected: ", theme.text_muted_style()),
            Span::styled(option.label.clone(), theme.accent_emphasis_style()),
        ]),
        None => Line::from(Span::styled("no connection: variables are unfiltered", theme.text_muted_style())),
    };
    let selected_value = selected.map(|option| option.value);
    let options = selector
        .visible_options()
        .into_iter()
        .map(|option| {
            let is_selected = selected_value.as_deref() == Some(option.value.as_str());
            (option, is_selected)
        })
        .collect();
    draw_selector(
        frame,
        area,
        theme,
        Field::Connection.title(),
        app.focus == Field::Connection,
        &app.connection_input,
        header,
        options,
        selector.status(),
        app.connection_cursor,
    );
}

fn draw_variables(frame: &mut Frame, area: Rect, app: &App, theme: &dyn Theme) {
    let selector = app.editor.coordinator().variables();
    let names = selector.selected_names();
    let header = if names.is_empty() {
        Line::from(Span::styled("nothing selected", theme.text_muted_style()))
    } else {
        Line::from(vec![
            Span::styled(format!("{} selected: ", names.len()), theme.text_muted_style()),
            Span::styled(names.join(", "), theme.accent_emphasis_style()),
        ])
    };
    let options = selector
        .visible_options()
        .into_iter()
        .map(|option| {
            let is_selected = option.source.as_ref().is_some_and(|variable| selector.is_selected(variable.id));
            (option, is_selected)
        })
        .collect();
    draw_selector(
        frame,
        area,
        theme,
        Field::Variables.title(),
        app.focus == Field::Variables,
        &app.variable_input,
        header,
        options,
        selector.status(),
        app.variable_cursor,
    );
}

fn draw_mode(frame: &mut Frame, area: Rect, app: &App, theme: &dyn Theme) {
    let current = app.editor.form().mode;
    let spans: Vec<Span> = QueryMode::ALL
        .iter()
        .flat_map(|mode| {
            let style = if *mode == current {
                theme.selection_style().add_modifier(Modifier::BOLD)
            } else {
                theme.text_muted_style()
            };
            [Span::styled(format!(" {mode} "), style), Span::raw(" ")]
        })
        .collect();
    let outer = block(theme, Field::Mode.title(), app.focus == Field::Mode);
    frame.render_widget(Paragraph::new(Line::from(spans)).block(outer), area);
}

fn draw_text_field(frame: &mut Frame, area: Rect, app: &App, theme: &dyn Theme, field: Field, input: &TextInputState) {
    let focused = app.focus == field;
    let outer = block(theme, field.title(), focused);
    let inner = outer.inner(area);
    frame.render_widget(Paragraph::new(input.input()).style(theme.text_primary_style()).block(outer), area);
    if focused {
        let x = inner.x + input.cursor_column();
        frame.set_cursor_position(Position::new(x.min(inner.right().saturating_sub(1)), inner.y));
    }
}

fn draw_paging(frame: &mut Frame, area: Rect, app: &App, theme: &dyn Theme) {
    let focused = app.focus == Field::Paging;
    let form = app.editor.form();
    let line = Line::from(vec![
        Span::styled("‹ ", theme.text_muted_style()),
        Span::styled(page_label(form.page_index()), theme.text_primary_style()),
        Span::styled(" ›  size ", theme.text_muted_style()),
        Span::styled(app.page_size_input.input(), theme.accent_emphasis_style()),
    ]);
    let outer = block(theme, Field::Paging.title(), focused);
    frame.render_widget(Paragraph::new(line).block(outer), area);
}

/// One-based page label; a restored index may already sit at `u32::MAX`.
fn page_label(page_index: u32) -> String {
    format!("page {}", page_index.saturating_add(1))
}

fn draw_preview(frame: &mut Frame, area: Rect, app: &App, theme: &dyn Theme) {
    let query = app.host_query();
    let title = if query.is_runnable() {
        "Query object"
    } else {
        "Query object (not runnable)"
    };
    let pretty = serde_json::to_string_pretty(&query).unwrap_or_else(|error| format!("unserializable query: {error}"));
    let lines = highlight_lines(&pretty, theme);
    let paragraph = Paragraph::new(lines)
        .block(block(theme, title, false))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App, theme: &dyn Theme) {
    let line = match &app.status {
        Some(status) => {
            let style = match status.severity {
                Severity::Info => theme.status_info(),
                Severity::Warning => theme.status_warning(),
                Severity::Error => theme.status_error(),
            };
            Line::from(Span::styled(format!(" {}", status.text), style))
        }
        None => Line::from(Span::styled(
            " Tab next field · ↑↓ choose · Enter select · Del clear · Ctrl+R run · Ctrl+Y copy · Ctrl+Q quit",
            theme.text_muted_style(),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_label_is_one_based_and_saturates() {
        assert_eq!(page_label(0), "page 1");
        assert_eq!(page_label(u32::MAX), format!("page {}", u32::MAX));
    }
}
