//! Transport error types

use thiserror::Error;

/// Errors that can occur during link and protocol operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Cannot open port {port}: {reason}")]
    PortOpen { port: String, reason: String },

    #[error("Communication timeout")]
    Timeout,

    #[error("Protocol mismatch: sent 0x{expected:02X}, echoed 0x{actual:02X}")]
    ProtocolMismatch { expected: u8, actual: u8 },

    #[error("Link closed")]
    Disconnected,

    #[error("Channel {index} value {value} exceeds the 3-bit range")]
    ChannelOutOfRange { index: usize, value: u8 },

    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransportError {
    /// True when the byte stream can no longer be trusted to be in step
    /// with the device. The only recovery is closing the link.
    ///
    /// Only failures raised before any byte goes out are exempt.
    pub fn is_desync(&self) -> bool {
        !matches!(
            self,
            Self::PortOpen { .. } | Self::ChannelOutOfRange { .. } | Self::InvalidLength { .. }
        )
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => Self::Timeout,
            std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::UnexpectedEof => {
                Self::Disconnected
            }
            _ => Self::Io(e),
        }
    }
}

impl From<serialport::Error> for TransportError {
    fn from(e: serialport::Error) -> Self {
        match e.kind() {
            serialport::ErrorKind::Io(kind) => Self::from(std::io::Error::new(kind, e.description)),
            serialport::ErrorKind::NoDevice => Self::Disconnected,
            _ => Self::Internal(e.to_string()),
        }
    }
}
