//! Syntax highlighting for the pretty-printed query object.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::ui::theme::Theme;

/// Highlight an already pretty-printed JSON document line by line.
pub fn highlight_lines<'a>(pretty_json: &'a str, theme: &dyn Theme) -> Vec<Line<'a>> {
    pretty_json.lines().map(|line| Line::from(highlight_line(line, theme))).collect()
}

fn highlight_line<'a>(line: &'a str, theme: &dyn Theme) -> Vec<Span<'a>> {
    let roles = theme.roles();
    let mut spans = Vec::new();
    let mut index = 0usize;
    while let Some(character) = line[index..].chars().next() {
        let rest = &line[index..];
        let length = match character {
            '"' => {
                let length = string_token_length(rest);
                let is_key = rest[length..].trim_start().starts_with(':');
                let style = if is_key {
                    Style::default().fg(roles.json_key)
                } else {
                    Style::default().fg(roles.json_string)
                };
                spans.push(Span::styled(&rest[..length], style));
                length
            }
            '-' | '0'..='9' => {
                let length = number_length(rest);
                spans.push(Span::styled(&rest[..length], Style::default().fg(roles.json_number)));
                length
            }
            _ if keyword(rest, "true") || keyword(rest, "false") => {
                let length = if keyword(rest, "true") { 4 } else { 5 };
                spans.push(Span::styled(
                    &rest[..length],
                    Style::default().fg(roles.accent_secondary).add_modifier(Modifier::BOLD),
                ));
                length
            }
            _ if keyword(rest, "null") => {
                spans.push(Span::styled(&rest[..4], theme.text_muted_style()));
                4
            }
            _ => {
                let length = character.len_utf8();
                spans.push(Span::styled(&rest[..length], theme.text_muted_style()));
                length
            }
        };
        index += length;
    }
    spans
}

/// Byte length of the string token at the start of `input`, quotes included.
fn string_token_length(input: &str) -> usize {
    let mut escaped = false;
    for (offset, byte) in input.bytes().enumerate().skip(1) {
        match byte {
            _ if escaped => escaped = false,
            b'\\' => escaped = true,
            b'"' => return offset + 1,
            _ => {}
        }
    }
    input.len()
}

fn number_length(input: &str) -> usize {
    input
        .find(|character: char| !(character.is_ascii_digit() || matches!(character, '-' | '+' | '.' | 'e' | 'E')))
        .unwrap_or(input.len())
        .max(1)
}

fn keyword(input: &str, word: &str) -> bool {
    input
        .strip_prefix(word)
        .is_some_and(|rest| rest.chars().next().is_none_or(|next| !next.is_ascii_alphanumeric()))
}
