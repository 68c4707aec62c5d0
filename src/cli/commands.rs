use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "i4c", about = concat!("[x] i4check v", env!("CARGO_PKG_VERSION"), " - checklists in plain text"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different storage directory for lists
    #[arg(short = 'D', long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    /// Read configuration from this file instead of the default
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the current list
    List(ListArgs),
    /// Add a new needed item
    Add(AddArgs),
    /// Toggle the item in a row
    Toggle(ToggleArgs),
    /// Change the title of the item in a row (empty text removes it)
    Title(TitleArgs),
    /// Mark every checked item as not needed
    Checkout,
    /// Manage databases (named lists)
    Db(DbCmd),
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
}

// ---------------------------------------------------------------------------
// Item args
// ---------------------------------------------------------------------------

/// Which view rows are numbered against (default: needed-only if the list
/// needs attention, otherwise all)
#[derive(Args, Clone, Copy)]
#[group(multiple = false)]
pub struct FilterArgs {
    /// Number rows against every item
    #[arg(long)]
    pub all: bool,
    /// Number rows against needed and checked items only
    #[arg(long)]
    pub needed: bool,
}

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args)]
pub struct AddArgs {
    /// Item title
    #[arg(required = true, num_args = 1..)]
    pub title: Vec<String>,
}

#[derive(Args)]
pub struct ToggleArgs {
    /// Row number as shown by `i4c list` (1-based)
    pub row: usize,
    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args)]
pub struct TitleArgs {
    /// Row number as shown by `i4c list` (1-based)
    pub row: usize,
    /// New title
    #[arg(num_args = 0..)]
    pub text: Vec<String>,
    #[command(flatten)]
    pub filter: FilterArgs,
}

// ---------------------------------------------------------------------------
// Databases
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct DbCmd {
    #[command(subcommand)]
    pub action: Option<DbAction>,
}

#[derive(Subcommand)]
pub enum DbAction {
    /// List databases, marking the current one
    List,
    /// Make a database current; a new name gets its file on first save
    Select(DbNameArgs),
    /// Create a new empty database and make it current
    Create(DbNameArgs),
    /// Delete the current database
    Delete(DbDeleteArgs),
}

#[derive(Args)]
pub struct DbNameArgs {
    /// Database name (letters, digits, `-` and `_`)
    pub name: String,
}

#[derive(Args)]
pub struct DbDeleteArgs {
    /// Confirm the deletion
    #[arg(long)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove old entries
    Prune(RecoveryPruneArgs),
    /// Print the absolute path to the recovery log
    Path,
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove entries older than this timestamp (default: 30 days ago)
    #[arg(long)]
    pub before: Option<String>,
    /// Remove all entries
    #[arg(long, conflicts_with = "before")]
    pub all: bool,
}
