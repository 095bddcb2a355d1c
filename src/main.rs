mod cli;

use crate::cli::app::{App, Cli};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        std::env::var("RELCTX_LOG").unwrap_or_else(|_| "info".to_string())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app = App::from_cli(&cli)?;
    app.run(&cli.command, &mut std::io::stdout().lock())
}
