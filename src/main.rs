//! Bicolor LED controller CLI
//!
//! A command-line interface for the FPGA LED controller on a serial port.

use clap::Parser;
use tracing_subscriber::EnvFilter;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "lightctl=info,lightctl_panel=info,lightctl_transport=warn",
        1 => "lightctl=debug,lightctl_panel=debug,lightctl_transport=debug",
        _ => "lightctl=trace,lightctl_panel=trace,lightctl_transport=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = commands::Settings::from_cli(&cli);

    match cli.command {
        Some(Commands::List) => commands::utility::list(&settings)?,
        Some(Commands::Pack { panel, json }) => commands::utility::pack(&panel, json)?,
        Some(Commands::Mode { mode }) => commands::panel::mode(&settings, &mode)?,
        Some(Commands::Show { panel }) => commands::panel::show(&settings, &panel)?,
        Some(Commands::Shell) | None => commands::panel::shell(&settings)?,
    }

    Ok(())
}
