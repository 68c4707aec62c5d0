use chrono::{DateTime, Utc};

use crate::cli::commands::{RecoveryAction, RecoveryCmd, RecoveryPruneArgs};
use crate::io::recovery::{prune_recovery, read_recovery_entries, recovery_log_path};

use super::{Context, HandlerResult};

/// Entries shown when `--limit` is not given
const DEFAULT_LIMIT: usize = 10;

pub fn cmd_recovery(args: RecoveryCmd, ctx: &Context) -> HandlerResult {
    match args.action {
        Some(RecoveryAction::Prune(a)) => cmd_recovery_prune(a, ctx),
        Some(RecoveryAction::Path) => {
            println!("{}", recovery_log_path(&ctx.paths.storage_dir).display());
            Ok(())
        }
        None => cmd_recovery_list(args.limit.unwrap_or(DEFAULT_LIMIT), ctx),
    }
}

fn cmd_recovery_list(limit: usize, ctx: &Context) -> HandlerResult {
    let entries = read_recovery_entries(&ctx.paths.storage_dir, Some(limit));

    if ctx.json {
        let items: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No recovery entries.");
        return Ok(());
    }
    for entry in &entries {
        print!("{}", entry.to_markdown());
    }
    Ok(())
}

fn cmd_recovery_prune(args: RecoveryPruneArgs, ctx: &Context) -> HandlerResult {
    let before = if args.all {
        Some(Utc::now() + chrono::Duration::seconds(1))
    } else {
        args.before
            .as_deref()
            .map(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| format!("invalid timestamp '{}': {}", s, e))
            })
            .transpose()?
    };

    let removed = prune_recovery(&ctx.paths.storage_dir, before)?;
    println!(
        "pruned {} entr{}",
        removed,
        if removed == 1 { "y" } else { "ies" }
    );
    Ok(())
}
