use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use provider_index::cli::CliApp;
use provider_index::cli_types::Cli;
use provider_index::ui;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = CliApp::new(cli).and_then(|app| app.run());
    if let Err(e) = result {
        ui::print_error(&format!("{:#}", e));
        process::exit(1);
    }
}
