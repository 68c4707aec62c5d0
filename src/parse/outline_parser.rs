use std::sync::LazyLock;

use regex::Regex;

use crate::model::item::Status;

static ALL_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\s*ALL\s*$").expect("valid regex"));
static NEEDED_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*\s*NEEDED\s*$").expect("valid regex"));
static CHECK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-\s*\[(.)\]\s*(.*?)\s*$").expect("valid regex"));

/// A malformed outline file
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct FormatError {
    /// 1-based line number (the line after the last one at end of input)
    pub line: usize,
    pub message: String,
}

impl FormatError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        FormatError {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    AwaitingAll,
    ReadingNotNeeded,
    ReadingNeeded,
}

/// Parse an outline list from its source text.
///
/// ```text
/// * ALL
///   - [ ] salt
/// ** NEEDED
///    - [ ] milk
///    - [X] bread
/// ```
///
/// Items come back in file order. Lines under `* ALL` are `NotNeeded`
/// whatever their mark; under `** NEEDED` an `X` (either case) is `Checked`
/// and anything else is `Needed`.
pub fn parse_outline(source: &str) -> Result<Vec<(Status, String)>, FormatError> {
    let mut section = Section::AwaitingAll;
    let mut items = Vec::new();
    let mut line_count = 0;

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        line_count = line_no;
        let line = raw.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        match section {
            Section::AwaitingAll => {
                if !ALL_HEADER.is_match(line) {
                    return Err(FormatError::new(
                        line_no,
                        format!("expected `* ALL` header, got {:?}", line),
                    ));
                }
                section = Section::ReadingNotNeeded;
            }
            Section::ReadingNotNeeded => {
                if NEEDED_HEADER.is_match(line) {
                    section = Section::ReadingNeeded;
                    continue;
                }
                let (_, title) = parse_check_line(line, line_no)?;
                items.push((Status::NotNeeded, title));
            }
            Section::ReadingNeeded => {
                let (mark, title) = parse_check_line(line, line_no)?;
                let status = if mark.eq_ignore_ascii_case(&'x') {
                    Status::Checked
                } else {
                    Status::Needed
                };
                items.push((status, title));
            }
        }
    }

    match section {
        Section::AwaitingAll => Err(FormatError::new(
            line_count + 1,
            "missing `* ALL` header",
        )),
        Section::ReadingNotNeeded => Err(FormatError::new(
            line_count + 1,
            "missing `** NEEDED` header",
        )),
        Section::ReadingNeeded => Ok(items),
    }
}

/// Parse `- [<mark>] <title>` into its mark and trimmed title
fn parse_check_line(line: &str, line_no: usize) -> Result<(char, String), FormatError> {
    let caps = CHECK_LINE
        .captures(line)
        .ok_or_else(|| FormatError::new(line_no, format!("expected check line, got {:?}", line)))?;
    let mark = caps[1].chars().next().unwrap_or(' ');
    Ok((mark, caps[2].to_string()))
}
