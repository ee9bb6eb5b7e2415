//! Transport layer for the bicolor LED controller
//!
//! Provides the byte-level [`Link`] to the controller and the echo-verified
//! command protocol on top of it:
//!
//! - [`SerialLink`] (physical serial port)
//! - [`SimulatedLink`] (in-process model of the controller firmware)
//! - [`MonitorLink`] (prints all traffic of a wrapped link)
//!
//! ```text
//! [SerialLink / SimulatedLink]   ← implements Link (timed byte I/O)
//!              |
//!       [ProtocolEncoder]        ← echo verification, frame transfer
//!              |
//!       [PanelController]
//! ```

pub mod encoder;
pub mod error;
pub mod monitor;
pub mod protocol;
pub mod serial;
pub mod simulated;
pub mod types;

pub use encoder::ProtocolEncoder;
pub use error::TransportError;
pub use monitor::{Monitored, MonitorLink};
pub use protocol::{
    cmd, pack_leds, unpack_leds, ChannelValues, Frame, PackLayout, CHANNEL_COUNT, CHANNEL_MAX,
    FRAME_SIZE, LED_COUNT, LED_LAYOUT,
};
pub use serial::{list_serial_ports, SerialConnector, SerialLink};
pub use simulated::{SimulatedConnector, SimulatedDevice, SimulatedLink};
pub use types::{LinkConfig, LinkInfo, LinkKind, PortInfo};

/// The core link trait - all backends implement this
///
/// Every call blocks until the byte is transferred or the link's timeout
/// expires. No retries happen at this layer.
pub trait Link: Send {
    /// Write one byte
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError>;

    /// Read one byte, failing with [`TransportError::Timeout`] if none arrives
    fn read_byte(&mut self) -> Result<u8, TransportError>;

    /// Release the device. Further I/O fails with `Disconnected`.
    fn close(&mut self) -> Result<(), TransportError>;

    /// Get link information
    fn info(&self) -> &LinkInfo;
}

impl<L: Link + ?Sized> Link for Box<L> {
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        (**self).write_byte(byte)
    }

    fn read_byte(&mut self) -> Result<u8, TransportError> {
        (**self).read_byte()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }

    fn info(&self) -> &LinkInfo {
        (**self).info()
    }
}

/// Opens links by port name
///
/// Injected into the connection manager so it never reaches for a global
/// port.
pub trait LinkConnector: Send + Sync {
    /// Open the named port
    fn open(&self, port_name: &str) -> Result<Box<dyn Link>, TransportError>;

    /// List ports this connector can open
    fn list_ports(&self) -> Result<Vec<PortInfo>, TransportError>;
}

/// Type alias for a boxed connector
pub type BoxedConnector = Box<dyn LinkConnector>;
