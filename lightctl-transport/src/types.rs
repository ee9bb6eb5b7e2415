//! Common types for the transport layer

use std::time::Duration;

use crate::protocol::timing;

/// Link backend identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Physical serial port
    Serial,
    /// In-process controller model
    Simulated,
}

/// Identification of an open link
#[derive(Debug, Clone)]
pub struct LinkInfo {
    /// Port name or identifier
    pub port_name: String,
    /// Backend type
    pub kind: LinkKind,
    /// Line speed in use
    pub baud_rate: u32,
}

/// Serial line parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    pub baud_rate: u32,
    /// Bound on every single-byte read and write
    pub timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: timing::BAUD_RATE,
            timeout: Duration::from_millis(timing::IO_TIMEOUT_MS),
        }
    }
}

impl LinkConfig {
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A serial port found during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub port_name: String,
    /// Short description of the port type (USB ids, PCI, ...)
    pub description: String,
}
