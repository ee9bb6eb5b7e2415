//! Controller command handlers.

use std::io;
use std::sync::Arc;

use anyhow::Context;
use lightctl::{render_panel, Shell};
use lightctl_panel::{format_panel, parse_panel, Mode};
use tracing::{info, warn};

use super::{open_controller, CommandResult, Settings};

/// Select a mode and leave the device in it
pub fn mode(settings: &Settings, mode: &str) -> CommandResult {
    let mode: Mode = mode.parse().map_err(anyhow::Error::msg)?;
    let port = settings.require_port()?;

    let controller = open_controller(settings);
    controller
        .connect(port)
        .with_context(|| format!("Failed to connect to {port}"))?;
    controller.set_mode(mode)?;
    controller.release()?;

    println!("Mode set to {mode} on {port}");
    Ok(())
}

/// Push a full panel and leave it displayed
pub fn show(settings: &Settings, panel: &str) -> CommandResult {
    let colors = parse_panel(panel)?;
    let port = settings.require_port()?;

    let controller = open_controller(settings);
    controller
        .connect(port)
        .with_context(|| format!("Failed to connect to {port}"))?;
    controller.set_all(&colors)?;
    controller.release()?;

    println!("{}  {}", format_panel(&colors), render_panel(&colors));
    Ok(())
}

/// Run the interactive shell.
/// Ctrl-C disconnects cleanly (device back to switching mode) before exiting.
pub fn shell(settings: &Settings) -> CommandResult {
    let controller = Arc::new(open_controller(settings));

    let on_interrupt = Arc::clone(&controller);
    ctrlc::set_handler(move || {
        if on_interrupt.is_connected() {
            info!("Interrupted, disconnecting");
            if let Err(e) = on_interrupt.disconnect() {
                warn!("Disconnect failed: {}", e);
            }
        }
        std::process::exit(130);
    })
    .context("Failed to install Ctrl-C handler")?;

    if settings.simulate {
        println!("Using simulated controller on {}", super::SIMULATED_PORT);
    }
    println!("Type 'help' for commands.");

    let stdin = io::stdin();
    let mut shell = Shell::new(&controller, settings.port.clone());
    shell.run(stdin.lock(), io::stdout())?;
    Ok(())
}
