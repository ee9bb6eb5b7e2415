// CLI definitions using clap

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lightctl")]
#[command(author, version, about = "Bicolor LED controller host tool")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Serial port of the controller (e.g. /dev/ttyUSB0, COM3)
    #[arg(long, short, global = true, env = "LIGHTCTL_PORT")]
    pub port: Option<String>,

    /// Print every byte sent and received
    #[arg(long, global = true)]
    pub monitor: bool,

    /// Talk to an in-process simulated controller instead of a serial port
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Line speed override (bench testing only)
    #[arg(long, global = true, default_value_t = lightctl_transport::protocol::timing::BAUD_RATE)]
    pub baud: u32,

    /// Per-byte read/write timeout override in milliseconds
    #[arg(long = "timeout-ms", global = true, default_value_t = lightctl_transport::protocol::timing::IO_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List serial ports
    #[command(visible_aliases = ["ls", "ports"])]
    List,

    /// Print the wire frame for a panel without touching a device
    Pack {
        /// 12 colors: '.' off, 'R' red, 'G' green (e.g. R.G.........)
        panel: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Select a built-in mode and leave the device running it
    #[command(visible_alias = "m")]
    Mode {
        /// random, pattern, individual or switching
        mode: String,
    },

    /// Show a panel of colors and leave it displayed
    #[command(visible_alias = "set")]
    Show {
        /// 12 colors: '.' off, 'R' red, 'G' green (e.g. R.G.........)
        panel: String,
    },

    /// Interactive shell (default)
    #[command(visible_alias = "sh")]
    Shell,
}
