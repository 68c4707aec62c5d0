mod db;
mod recovery;

use std::path::Path;
use std::time::Instant;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::{self, AppPaths};
use crate::model::checklist::FilterMode;
use crate::model::config::AppConfig;
use crate::model::item::{Status, single_line};
use crate::ops::session::{Row, Session};

type HandlerResult = Result<(), Box<dyn std::error::Error>>;

/// Configuration and resolved paths shared by every command
pub struct Context {
    pub config: AppConfig,
    pub paths: AppPaths,
    pub json: bool,
}

impl Context {
    /// Build the context from the global flags
    pub fn from_cli(cli: &Cli) -> Result<Self, config_io::ConfigError> {
        let (config, paths) = config_io::load_app_config(
            cli.config.as_deref().map(Path::new),
            cli.data_dir.as_deref().map(Path::new),
        )?;
        Ok(Context {
            config,
            paths,
            json: cli.json,
        })
    }

    /// Open the current list, failing on a malformed file
    fn open_session(&self) -> Result<Session, Box<dyn std::error::Error>> {
        Ok(Session::open(
            &self.config,
            &self.paths.storage_dir,
            &self.paths.preferences_file,
        )?)
    }

    /// Open the current list, setting a malformed file aside with a warning
    fn open_session_recovering(&self) -> Result<Session, Box<dyn std::error::Error>> {
        let (session, backup) = Session::open_recovering(
            &self.config,
            &self.paths.storage_dir,
            &self.paths.preferences_file,
        )?;
        if let Some(backup) = backup {
            warn_set_aside(session.current_database(), &backup);
        }
        Ok(session)
    }
}

fn warn_set_aside(database: &str, backup: &Path) {
    eprintln!(
        "warning: list '{}' could not be parsed; moved to {}",
        database,
        backup.display()
    );
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> HandlerResult {
    let ctx = Context::from_cli(&cli)?;

    match cli.command {
        None => Err("no command given (run `i4c` without arguments for the TUI)".into()),
        Some(cmd) => match cmd {
            // Read commands
            Commands::List(args) => cmd_list(args, &ctx),

            // Write commands
            Commands::Add(args) => cmd_add(args, &ctx),
            Commands::Toggle(args) => cmd_toggle(args, &ctx),
            Commands::Title(args) => cmd_title(args, &ctx),
            Commands::Checkout => cmd_checkout(&ctx),

            // Databases and maintenance
            Commands::Db(args) => db::cmd_db(args, &ctx),
            Commands::Recovery(args) => recovery::cmd_recovery(args, &ctx),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl FilterArgs {
    /// The explicitly requested filter, if any
    fn mode(self) -> Option<FilterMode> {
        if self.all {
            Some(FilterMode::All)
        } else if self.needed {
            Some(FilterMode::NeededOnly)
        } else {
            None
        }
    }
}

fn apply_filter(session: &mut Session, filter: FilterArgs) {
    if let Some(mode) = filter.mode() {
        session.select_filter(mode);
    }
}

/// Convert a 1-based row argument to a view row
fn zero_based(row: usize) -> Result<usize, Box<dyn std::error::Error>> {
    row.checked_sub(1)
        .ok_or_else(|| "rows are numbered from 1".into())
}

fn print_change(ctx: &Context, session: &Session, changed: bool, message: &str) -> HandlerResult {
    if ctx.json {
        let out = ChangeJson {
            database: session.current_database().to_string(),
            changed,
            item: None,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", message);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Item commands
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, ctx: &Context) -> HandlerResult {
    let mut session = ctx.open_session()?;
    apply_filter(&mut session, args.filter);
    let rows = session.rows();

    if ctx.json {
        let out = ListJson {
            database: session.current_database().to_string(),
            filter: session.filter().label(),
            needs_attention: session.needs_attention(),
            items: rows_to_json(rows),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for line in format_listing(session.current_database(), session.filter(), &rows) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_add(args: AddArgs, ctx: &Context) -> HandlerResult {
    let title = single_line(&args.title.join(" "));
    if title.is_empty() {
        return Err("title is empty".into());
    }

    let mut session = ctx.open_session()?;
    let index = session.new_item();
    session.edit_item_title(index, &title, Instant::now())?;
    session.flush()?;

    let item = session.checklist().get(index).cloned();
    if ctx.json {
        let out = ChangeJson {
            database: session.current_database().to_string(),
            changed: true,
            item: item.map(|i| Row {
                index,
                status: i.status,
                title: i.title,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("added: {}", title);
    }
    Ok(())
}

fn cmd_toggle(args: ToggleArgs, ctx: &Context) -> HandlerResult {
    let row = zero_based(args.row)?;
    let mut session = ctx.open_session()?;
    apply_filter(&mut session, args.filter);

    let title = session
        .rows()
        .get(row)
        .map(|r| r.title.clone())
        .ok_or_else(|| format!("no item at row {}", args.row))?;
    let status = session.toggle_item(row, Instant::now())?;
    session.flush()?;

    if ctx.json {
        let out = ChangeJson {
            database: session.current_database().to_string(),
            changed: true,
            item: Some(Row {
                index: 0,
                status,
                title,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{} {}", status.glyph(), title);
    }
    Ok(())
}

fn cmd_title(args: TitleArgs, ctx: &Context) -> HandlerResult {
    let row = zero_based(args.row)?;
    let text = single_line(&args.text.join(" "));
    let mut session = ctx.open_session()?;
    apply_filter(&mut session, args.filter);

    let old = session
        .rows()
        .get(row)
        .map(|r| r.title.clone())
        .ok_or_else(|| format!("no item at row {}", args.row))?;
    session.edit_title(row, &text, Instant::now())?;
    let changed = session.flush()?;

    let message = if text.is_empty() {
        format!("removed: {}", old)
    } else if changed {
        format!("renamed: {} -> {}", old, text)
    } else {
        format!("unchanged: {}", old)
    };
    print_change(ctx, &session, changed, &message)
}

fn cmd_checkout(ctx: &Context) -> HandlerResult {
    let mut session = ctx.open_session()?;
    let checked = session
        .checklist()
        .items()
        .iter()
        .filter(|i| i.status == Status::Checked)
        .count();
    let changed = session.checkout(Instant::now());
    session.flush()?;

    let message = if changed {
        format!("checked out {} item{}", checked, if checked == 1 { "" } else { "s" })
    } else {
        "nothing to check out".to_string()
    };
    print_change(ctx, &session, changed, &message)
}
