//! Device operating modes

use std::fmt;
use std::str::FromStr;

use lightctl_transport::{cmd, Link, ProtocolEncoder, TransportError};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Device-level operating mode, selected by a single command byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Built-in random pattern
    Random,
    /// Built-in sequential pattern
    Pattern,
    /// Host-driven LED colors
    Individual,
    /// Idle default, entered on disconnect
    Switching,
}

impl Mode {
    /// All modes
    pub const ALL: &'static [Mode] = &[
        Mode::Random,
        Mode::Pattern,
        Mode::Individual,
        Mode::Switching,
    ];

    /// Command byte selecting this mode
    pub fn code(&self) -> u8 {
        match self {
            Mode::Random => cmd::MODE_RANDOM,
            Mode::Pattern => cmd::MODE_PATTERN,
            Mode::Individual => cmd::MODE_INDIVIDUAL,
            Mode::Switching => cmd::MODE_SWITCHING,
        }
    }

    /// Get mode from its command byte
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.code() == code)
    }

    /// Get the display name for this mode
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Random => "random",
            Mode::Pattern => "pattern",
            Mode::Individual => "individual",
            Mode::Switching => "switching",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" | "rand" | "r" => Ok(Mode::Random),
            "pattern" | "pat" | "s" => Ok(Mode::Pattern),
            "individual" | "ind" | "i" => Ok(Mode::Individual),
            "switching" | "switch" | "idle" | "f" => Ok(Mode::Switching),
            _ => Err(format!(
                "Unknown mode: {s} (expected random, pattern, individual or switching)"
            )),
        }
    }
}

/// Mode selection on top of the command protocol.
///
/// Holds no state: the device is the only authority on its current mode.
pub trait ModeControl {
    fn set_mode(&mut self, mode: Mode) -> Result<(), TransportError>;
}

impl<L: Link> ModeControl for ProtocolEncoder<L> {
    fn set_mode(&mut self, mode: Mode) -> Result<(), TransportError> {
        info!("Selecting {} mode", mode);
        self.send_command(mode.code())
    }
}
