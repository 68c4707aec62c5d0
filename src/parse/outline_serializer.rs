use crate::model::item::{ChecklistItem, Status, single_line};

pub const ALL_HEADER: &str = "* ALL";
pub const NEEDED_HEADER: &str = "** NEEDED";

/// Serialize items to the outline format.
///
/// `NotNeeded` items go under `* ALL` with two spaces of indent, `Needed`
/// and `Checked` items under `** NEEDED` with three. Relative order within
/// each section is preserved; pass sorted items for canonical output.
/// `Fresh` items are never written, and a title is always written on one
/// line.
pub fn serialize_outline(items: &[ChecklistItem]) -> String {
    let mut out = String::new();

    out.push_str(ALL_HEADER);
    out.push('\n');
    for item in items.iter().filter(|i| i.status == Status::NotNeeded) {
        out.push_str(&format!("  - [ ] {}\n", single_line(&item.title)));
    }

    out.push_str(NEEDED_HEADER);
    out.push('\n');
    for item in items.iter().filter(|i| i.status.is_needed()) {
        out.push_str(&format!(
            "   - [{}] {}\n",
            item.status.checkbox_char(),
            single_line(&item.title)
        ));
    }

    out
}
