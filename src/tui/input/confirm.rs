use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, ConfirmAction, Mode};

pub(super) fn handle_confirm(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        // Confirm: y
        (KeyModifiers::NONE, KeyCode::Char('y')) => {
            let action = app.confirm.take();
            app.mode = Mode::Navigate;
            match action {
                Some(ConfirmAction::DeleteDatabase) => confirm_delete_database(app),
                Some(ConfirmAction::Checkout) => confirm_checkout(app),
                None => {}
            }
        }
        // Cancel: n or Esc
        (KeyModifiers::NONE, KeyCode::Char('n')) | (_, KeyCode::Esc) => {
            app.confirm = None;
            app.mode = Mode::Navigate;
        }
        _ => {}
    }
}

fn confirm_delete_database(app: &mut App) {
    let result = app.session.delete_current_database();
    app.reset_cursor();
    match result {
        Ok((deleted, None)) => app.set_status(format!("deleted \"{}\"", deleted)),
        Ok((deleted, Some(backup))) => app.set_error(format!(
            "deleted \"{}\"; next list could not be parsed, moved to {}",
            deleted,
            backup.display()
        )),
        Err(e) => app.report(e),
    }
}

fn confirm_checkout(app: &mut App) {
    if app.session.checkout(Instant::now()) {
        app.set_status("checked out");
    } else {
        app.set_status("nothing to check out");
    }
    app.clamp_cursor();
}
