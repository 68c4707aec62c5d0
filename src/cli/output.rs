use serde::Serialize;

use crate::model::checklist::FilterMode;
use crate::ops::session::Row;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct RowJson {
    /// 1-based, as accepted by `toggle` and `title`
    pub row: usize,
    #[serde(flatten)]
    pub item: Row,
}

#[derive(Serialize)]
pub struct ListJson {
    pub database: String,
    pub filter: &'static str,
    pub needs_attention: bool,
    pub items: Vec<RowJson>,
}

#[derive(Serialize)]
pub struct DatabaseJson {
    pub name: String,
    pub current: bool,
}

#[derive(Serialize)]
pub struct ChangeJson {
    pub database: String,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Row>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn rows_to_json(rows: Vec<Row>) -> Vec<RowJson> {
    rows.into_iter()
        .enumerate()
        .map(|(i, item)| RowJson { row: i + 1, item })
        .collect()
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Format a single row as `  3  [ ] milk`
pub fn format_row(number: usize, row: &Row, number_width: usize) -> String {
    format!(
        "{:>width$}  {} {}",
        number,
        row.status.glyph(),
        row.title,
        width = number_width
    )
}

/// Format a list header: `== groceries (needed) ==`
pub fn format_list_header(database: &str, filter: FilterMode) -> String {
    format!("== {} ({}) ==", database, filter.label())
}

/// Format a full listing, header first
pub fn format_listing(database: &str, filter: FilterMode, rows: &[Row]) -> Vec<String> {
    let mut lines = vec![format_list_header(database, filter), String::new()];
    if rows.is_empty() {
        lines.push("(empty)".to_string());
        return lines;
    }
    let width = rows.len().to_string().len();
    for (i, row) in rows.iter().enumerate() {
        lines.push(format_row(i + 1, row, width));
    }
    lines
}

/// Format the database listing, `*` marking the current one
pub fn format_database_list(names: &[String], current: &str) -> Vec<String> {
    names
        .iter()
        .map(|n| {
            let marker = if n == current { '*' } else { ' ' };
            format!("{} {}", marker, n)
        })
        .collect()
}
