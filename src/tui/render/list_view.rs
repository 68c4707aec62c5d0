use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::checklist::FilterMode;
use crate::model::item::Status;
use crate::ops::session::Row;
use crate::tui::app::{App, EditTarget};
use crate::util::unicode;

/// Render the items of the current view, one per line
pub fn render_list_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    let height = area.height as usize;
    let width = area.width as usize;
    let rows = app.session.rows();

    if rows.is_empty() {
        let hint = match app.session.filter() {
            FilterMode::All => "  nothing here, press a to add an item",
            FilterMode::NeededOnly => "  nothing needed, press Tab to see everything",
        };
        let empty = Paragraph::new(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)))
            .style(Style::default().bg(bg));
        frame.render_widget(empty, area);
        return;
    }

    adjust_scroll(app, height);

    let editing = match &app.edit {
        Some(edit) => match edit.target {
            EditTarget::Item { index, .. } => Some(index),
            EditTarget::DatabaseName => None,
        },
        None => None,
    };

    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .take(height)
        .map(|(row, item)| {
            let selected = row == app.cursor && editing.is_none();
            render_row(app, item, selected, editing == Some(item.index), width)
        })
        .collect();

    let paragraph = Paragraph::new(lines).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

/// Keep the cursor row inside the visible window
fn adjust_scroll(app: &mut App, height: usize) {
    if height == 0 {
        return;
    }
    if app.cursor < app.scroll_offset {
        app.scroll_offset = app.cursor;
    } else if app.cursor >= app.scroll_offset + height {
        app.scroll_offset = app.cursor + 1 - height;
    }
}

fn render_row<'a>(app: &App, item: &Row, selected: bool, editing: bool, width: usize) -> Line<'a> {
    let theme = &app.theme;
    let bg = if selected || editing {
        theme.selection_bg
    } else {
        theme.background
    };
    let marker = if selected || editing { "\u{258E}" } else { " " };

    let mut title_style = Style::default().fg(theme.status_color(item.status)).bg(bg);
    if item.status == Status::Checked {
        title_style = title_style.add_modifier(Modifier::CROSSED_OUT);
    }
    if selected {
        title_style = title_style.add_modifier(Modifier::BOLD);
    }

    // marker + space + 3-cell glyph + space
    let prefix_width = 6;
    let title = if editing {
        "(editing)".to_string()
    } else {
        unicode::truncate_to_width(&item.title, width.saturating_sub(prefix_width))
    };
    let used = prefix_width + unicode::display_width(&title);

    let mut spans = vec![
        Span::styled(marker, Style::default().fg(theme.selection_border).bg(bg)),
        Span::styled(" ", Style::default().bg(bg)),
        Span::styled(
            item.status.glyph(),
            Style::default().fg(theme.status_color(item.status)).bg(bg),
        ),
        Span::styled(" ", Style::default().bg(bg)),
        Span::styled(title, title_style),
    ];
    if (selected || editing) && used < width {
        spans.push(Span::styled(" ".repeat(width - used), Style::default().bg(bg)));
    }
    Line::from(spans)
}
