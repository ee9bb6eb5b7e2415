//! MonitorLink middleware for watching link traffic
//!
//! Wraps any [`Link`] and prints every byte passing through it.
//!
//! # Example
//!
//! ```ignore
//! use lightctl_transport::{MonitorLink, SerialLink, LinkConfig};
//!
//! let link = SerialLink::open("/dev/ttyUSB0", &LinkConfig::default())?;
//! let monitored = MonitorLink::wrap(link);
//! ```

use crossterm::style::Stylize;

use crate::error::TransportError;
use crate::protocol::cmd;
use crate::types::{LinkInfo, PortInfo};
use crate::{Link, LinkConnector};

/// Link middleware that prints all traffic
pub struct MonitorLink<L: Link> {
    inner: L,
    /// Next written byte is frame payload, not a command
    payload_next: bool,
}

impl<L: Link> MonitorLink<L> {
    pub fn wrap(inner: L) -> Self {
        Self {
            inner,
            payload_next: false,
        }
    }

    pub fn into_inner(self) -> L {
        self.inner
    }

    fn describe_tx(&mut self, byte: u8) -> String {
        let desc = if self.payload_next {
            self.payload_next = false;
            format!("payload {byte:08b}")
        } else {
            self.payload_next = byte == cmd::PREPARE;
            cmd::name(byte).to_string()
        };
        format!("0x{byte:02X} {desc}")
    }
}

impl<L: Link> Link for MonitorLink<L> {
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        let line = self.describe_tx(byte);
        println!("{} {}", "TX".green(), line);
        self.inner.write_byte(byte)
    }

    fn read_byte(&mut self) -> Result<u8, TransportError> {
        match self.inner.read_byte() {
            Ok(byte) => {
                println!("{} 0x{:02X}", "RX".cyan(), byte);
                Ok(byte)
            }
            Err(e) => {
                println!("{} {}", "RX".red(), e);
                Err(e)
            }
        }
    }

    fn close(&mut self) -> Result<(), TransportError> {
        println!("{} {}", "--".dark_grey(), "close".dark_grey());
        self.inner.close()
    }

    fn info(&self) -> &LinkInfo {
        self.inner.info()
    }
}

/// Connector wrapper that monitors every link it opens
pub struct Monitored<C: LinkConnector> {
    inner: C,
}

impl<C: LinkConnector> Monitored<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C: LinkConnector> LinkConnector for Monitored<C> {
    fn open(&self, port_name: &str) -> Result<Box<dyn Link>, TransportError> {
        let link = self.inner.open(port_name)?;
        println!("{} {}", "--".dark_grey(), format!("open {port_name}").dark_grey());
        Ok(Box::new(MonitorLink::wrap(link)))
    }

    fn list_ports(&self) -> Result<Vec<PortInfo>, TransportError> {
        self.inner.list_ports()
    }
}
