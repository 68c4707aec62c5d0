use crate::cli::commands::{DbAction, DbCmd, DbDeleteArgs, DbNameArgs};
use crate::cli::output::{DatabaseJson, format_database_list};
use crate::io::database::DatabaseRegistry;
use crate::io::preferences::PreferenceStore;

use super::{Context, HandlerResult, warn_set_aside};

pub fn cmd_db(args: DbCmd, ctx: &Context) -> HandlerResult {
    match args.action {
        None | Some(DbAction::List) => cmd_db_list(ctx),
        Some(DbAction::Select(a)) => cmd_db_select(a, ctx),
        Some(DbAction::Create(a)) => cmd_db_create(a, ctx),
        Some(DbAction::Delete(a)) => cmd_db_delete(a, ctx),
    }
}

/// Listing never loads a list, so it works even when the current one is broken
fn cmd_db_list(ctx: &Context) -> HandlerResult {
    let prefs = PreferenceStore::load(&ctx.paths.preferences_file);
    let registry = DatabaseRegistry::open(
        &ctx.paths.storage_dir,
        &ctx.config.storage.extension,
        prefs.current_database(),
    )?;

    if ctx.json {
        let items: Vec<DatabaseJson> = registry
            .list_databases()
            .iter()
            .map(|n| DatabaseJson {
                name: n.clone(),
                current: n == registry.current(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    for line in format_database_list(registry.list_databases(), registry.current()) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_db_select(args: DbNameArgs, ctx: &Context) -> HandlerResult {
    let mut session = ctx.open_session_recovering()?;
    session.select_database(&args.name)?;
    println!("selected: {}", session.current_database());
    Ok(())
}

fn cmd_db_create(args: DbNameArgs, ctx: &Context) -> HandlerResult {
    let mut session = ctx.open_session_recovering()?;
    session.create_database(&args.name)?;
    session.write_current()?;
    println!("created: {}", session.current_database());
    Ok(())
}

fn cmd_db_delete(args: DbDeleteArgs, ctx: &Context) -> HandlerResult {
    let mut session = ctx.open_session_recovering()?;
    if !args.yes {
        return Err(format!(
            "refusing to delete '{}' without --yes",
            session.current_database()
        )
        .into());
    }

    let (deleted, backup) = session.delete_current_database()?;
    if let Some(backup) = backup {
        warn_set_aside(session.current_database(), &backup);
    }
    println!("deleted: {}", deleted);
    println!("selected: {}", session.current_database());
    Ok(())
}
