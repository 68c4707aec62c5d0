use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::checklist::FilterMode;
use crate::tui::app::App;
use crate::util::unicode;

/// Render the database tabs with the filter indicator on the separator below
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // tabs
            Constraint::Length(1), // separator
        ])
        .split(area);

    let sep_cols = render_tabs(frame, app, chunks[0]);
    render_separator(frame, app, chunks[1], &sep_cols);
}

/// Render one tab per database and return the column of each divider
fn render_tabs(frame: &mut Frame, app: &App, area: Rect) -> Vec<usize> {
    let bg = app.theme.background;
    let mut spans: Vec<Span> = Vec::new();
    let mut sep_cols = Vec::new();
    let sep = Span::styled("\u{2502}", Style::default().fg(app.theme.dim).bg(bg));

    spans.push(Span::styled(" ", Style::default().bg(bg)));
    spans.push(Span::styled("\u{2713}", Style::default().fg(app.theme.purple).bg(bg)));
    spans.push(Span::styled(" ", Style::default().bg(bg)));

    let current = app.session.current_database();
    for name in app.session.databases() {
        spans.push(Span::styled(format!(" {} ", name), tab_style(app, name == current)));
        sep_cols.push(spans_width(&spans));
        spans.push(sep.clone());
    }

    let tabs = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(tabs, area);
    sep_cols
}

fn render_separator(frame: &mut Frame, app: &App, area: Rect, sep_cols: &[usize]) {
    let width = area.width as usize;
    let bg = app.theme.background;

    // Filter indicator on the right: "all needed", current one highlighted
    let filter = app.session.filter();
    let mut indicator: Vec<Span> = Vec::new();
    for (i, mode) in [FilterMode::All, FilterMode::NeededOnly].into_iter().enumerate() {
        if i > 0 {
            indicator.push(Span::styled(" ", Style::default().bg(bg)));
        }
        let style = if mode == filter {
            Style::default()
                .fg(app.theme.highlight)
                .bg(bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.dim).bg(bg)
        };
        indicator.push(Span::styled(mode.label(), style));
    }

    // +2: one space before the indicator, one at the right edge
    let line_end = width.saturating_sub(spans_width(&indicator) + 2);
    let line: String = (0..line_end)
        .map(|col| {
            if sep_cols.contains(&col) {
                '\u{2534}'
            } else {
                '\u{2500}'
            }
        })
        .collect();

    let mut spans = vec![
        Span::styled(line, Style::default().fg(app.theme.dim).bg(bg)),
        Span::styled(" ", Style::default().bg(bg)),
    ];
    spans.extend(indicator);

    let sep_widget = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(sep_widget, area);
}

/// Style for a tab: highlighted if current, normal otherwise
fn tab_style(app: &App, is_current: bool) -> Style {
    if is_current {
        Style::default()
            .fg(app.theme.text_bright)
            .bg(app.theme.selection_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.text).bg(app.theme.background)
    }
}

fn spans_width(spans: &[Span]) -> usize {
    spans.iter().map(|s| unicode::display_width(&s.content)).sum()
}
