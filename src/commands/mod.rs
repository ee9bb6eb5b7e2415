//! Command handlers for the CLI application.
//!
//! - `panel`: commands that talk to the controller (mode, show, shell)
//! - `utility`: port listing and offline frame packing

pub mod panel;
pub mod utility;

use std::time::Duration;

use anyhow::Context;
use lightctl_panel::PanelController;
use lightctl_transport::{
    LinkConfig, LinkConnector, Monitored, SerialConnector, SimulatedConnector,
};

use crate::cli::Cli;

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Port name used when simulating and none is given
pub const SIMULATED_PORT: &str = "sim0";

/// Connection settings resolved from CLI flags and environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: Option<String>,
    pub monitor: bool,
    pub simulate: bool,
    pub link: LinkConfig,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Self {
        let port = match (&cli.port, cli.simulate) {
            (Some(port), _) => Some(port.clone()),
            (None, true) => Some(SIMULATED_PORT.to_string()),
            (None, false) => None,
        };
        Self {
            port,
            monitor: cli.monitor,
            simulate: cli.simulate,
            link: LinkConfig::default()
                .with_baud_rate(cli.baud)
                .with_timeout(Duration::from_millis(cli.timeout_ms)),
        }
    }

    /// Port to open, required for device commands
    pub fn require_port(&self) -> anyhow::Result<&str> {
        self.port
            .as_deref()
            .context("No port given: use --port <PORT>, LIGHTCTL_PORT or --simulate")
    }
}

/// Build a controller for the configured backend.
/// If monitoring is enabled every opened link is wrapped for printing.
pub fn open_controller(settings: &Settings) -> PanelController {
    if settings.simulate {
        with_monitor(SimulatedConnector::default(), settings.monitor)
    } else {
        with_monitor(SerialConnector::new(settings.link), settings.monitor)
    }
}

fn with_monitor<C: LinkConnector + 'static>(connector: C, monitor: bool) -> PanelController {
    if monitor {
        PanelController::new(Monitored::new(connector))
    } else {
        PanelController::new(connector)
    }
}
