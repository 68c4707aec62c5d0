use clap::Parser;
use i4check::cli::commands::Cli;
use i4check::cli::handlers::{self, Context};

fn main() {
    let cli = Cli::parse();

    if cli.command.is_none() {
        // No subcommand → launch TUI
        let result = Context::from_cli(&cli)
            .map_err(Box::<dyn std::error::Error>::from)
            .and_then(|ctx| i4check::tui::run(&ctx.config, &ctx.paths));
        if let Err(e) = result {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
