use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, ConfirmAction, EditTarget, Mode};
use crate::util::unicode;

const NAVIGATE_HINTS: &str = "a add  e edit  \u{2423} toggle  Tab filter  [ ] lists  q quit";
const EDIT_HINTS: &str = "Enter save  Esc cancel";
const CONFIRM_HINTS: &str = "y/n";

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let (mut spans, hint) = match app.mode {
        Mode::Navigate => (message_spans(app), app.show_key_hints.then_some(NAVIGATE_HINTS)),
        Mode::Edit => (edit_spans(app), Some(EDIT_HINTS)),
        Mode::Confirm => (confirm_spans(app), Some(CONFIRM_HINTS)),
    };

    // Right-aligned hint, only if it fits
    if let Some(hint) = hint {
        let content_width: usize = spans.iter().map(|s| unicode::display_width(&s.content)).sum();
        let hint_width = unicode::display_width(hint);
        if content_width + hint_width < width {
            spans.push(Span::styled(
                " ".repeat(width - content_width - hint_width),
                Style::default().bg(bg),
            ));
            spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
        }
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

fn message_spans(app: &App) -> Vec<Span<'static>> {
    let Some(message) = &app.status_message else {
        return Vec::new();
    };
    let fg = if app.status_is_error {
        app.theme.red
    } else {
        app.theme.text_bright
    };
    vec![Span::styled(
        message.clone(),
        Style::default().fg(fg).bg(app.theme.background),
    )]
}

/// Prompt, text before the cursor, the cursor cell, and the rest
fn edit_spans(app: &App) -> Vec<Span<'static>> {
    let bg = app.theme.background;
    let Some(edit) = &app.edit else {
        return Vec::new();
    };
    let prompt = match edit.target {
        EditTarget::Item { is_new: true, .. } => "new: ",
        EditTarget::Item { is_new: false, .. } => "title: ",
        EditTarget::DatabaseName => "new list: ",
    };

    let buffer = &edit.input.buffer;
    let cursor = edit.input.cursor.min(buffer.len());
    let cursor_end = unicode::next_grapheme_boundary(buffer, cursor).unwrap_or(cursor);
    let under_cursor = if cursor_end > cursor {
        buffer[cursor..cursor_end].to_string()
    } else {
        " ".to_string()
    };

    let text_style = Style::default().fg(app.theme.text_bright).bg(bg);
    let mut spans = vec![
        Span::styled(prompt, Style::default().fg(app.theme.purple).bg(bg)),
        Span::styled(buffer[..cursor].to_string(), text_style),
        Span::styled(
            under_cursor,
            text_style.add_modifier(Modifier::REVERSED),
        ),
        Span::styled(buffer[cursor_end..].to_string(), text_style),
    ];

    // Validation errors stay visible while the prompt is open
    if app.status_is_error
        && let Some(message) = &app.status_message
    {
        spans.push(Span::styled(
            format!("  {}", message),
            Style::default().fg(app.theme.red).bg(bg),
        ));
    }
    spans
}

fn confirm_spans(app: &App) -> Vec<Span<'static>> {
    let question = match app.confirm {
        Some(ConfirmAction::DeleteDatabase) => format!(
            "delete list \"{}\"? its contents go to the recovery log",
            app.session.current_database()
        ),
        Some(ConfirmAction::Checkout) => "mark every checked item as not needed?".to_string(),
        None => String::new(),
    };
    vec![Span::styled(
        question,
        Style::default()
            .fg(app.theme.highlight)
            .bg(app.theme.background),
    )]
}
