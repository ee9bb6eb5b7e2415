//! Serial port link implementation

use std::io::{Read, Write};

use serialport::{FlowControl, SerialPort, SerialPortType};
use tracing::debug;

use crate::error::TransportError;
use crate::types::{LinkConfig, LinkInfo, LinkKind, PortInfo};
use crate::{Link, LinkConnector};

/// Link over a physical serial port
pub struct SerialLink {
    /// `None` once closed
    port: Option<Box<dyn SerialPort>>,
    info: LinkInfo,
}

impl SerialLink {
    /// Open `port_name` with the given line parameters
    pub fn open(port_name: &str, config: &LinkConfig) -> Result<Self, TransportError> {
        let port = serialport::new(port_name, config.baud_rate)
            .timeout(config.timeout)
            .flow_control(FlowControl::None)
            .open()
            .map_err(|e| TransportError::PortOpen {
                port: port_name.to_string(),
                reason: e.to_string(),
            })?;

        debug!(
            "Opened {} at {} baud, timeout {:?}",
            port_name, config.baud_rate, config.timeout
        );

        Ok(Self {
            port: Some(port),
            info: LinkInfo {
                port_name: port_name.to_string(),
                kind: LinkKind::Serial,
                baud_rate: config.baud_rate,
            },
        })
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::Disconnected)
    }
}

impl Link for SerialLink {
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        let port = self.port()?;
        port.write_all(&[byte])?;
        port.flush()?;
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, TransportError> {
        let mut buf = [0u8; 1];
        self.port()?.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn close(&mut self) -> Result<(), TransportError> {
        // Dropping the handle releases the device
        match self.port.take() {
            Some(_) => {
                debug!("Closed {}", self.info.port_name);
                Ok(())
            }
            None => Err(TransportError::Disconnected),
        }
    }

    fn info(&self) -> &LinkInfo {
        &self.info
    }
}

/// Enumerate serial ports present on the system
pub fn list_serial_ports() -> Result<Vec<PortInfo>, TransportError> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| PortInfo {
            description: describe_port_type(&p.port_type),
            port_name: p.port_name,
        })
        .collect())
}

fn describe_port_type(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let mut desc = format!("USB {:04x}:{:04x}", usb.vid, usb.pid);
            if let Some(ref product) = usb.product {
                desc.push(' ');
                desc.push_str(product);
            }
            desc
        }
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => "Unknown".to_string(),
    }
}

/// Connector producing [`SerialLink`]s
#[derive(Debug, Clone, Default)]
pub struct SerialConnector {
    config: LinkConfig,
}

impl SerialConnector {
    pub fn new(config: LinkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }
}

impl LinkConnector for SerialConnector {
    fn open(&self, port_name: &str) -> Result<Box<dyn Link>, TransportError> {
        Ok(Box::new(SerialLink::open(port_name, &self.config)?))
    }

    fn list_ports(&self) -> Result<Vec<PortInfo>, TransportError> {
        list_serial_ports()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_port() {
        let result = SerialLink::open("/dev/lightctl-does-not-exist", &LinkConfig::default());
        assert!(matches!(result, Err(TransportError::PortOpen { .. })));
    }

    #[test]
    fn test_describe_port_types() {
        assert_eq!(describe_port_type(&SerialPortType::PciPort), "PCI");
        assert_eq!(describe_port_type(&SerialPortType::Unknown), "Unknown");
    }
}
