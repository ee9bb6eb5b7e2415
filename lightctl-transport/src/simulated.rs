//! In-process model of the controller firmware
//!
//! Before the reset the microcontroller answers commands itself: `z` is
//! acknowledged with `z` and switches it into passthrough, anything else
//! gets `?`. In passthrough every byte reaches the FPGA, which echoes it,
//! shifts payload bytes into its frame register after `p`, latches the
//! register on `u` and switches display mode on a mode code.
//!
//! Faults can be injected to exercise the host's failure paths.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::TransportError;
use crate::protocol::{cmd, Frame, FRAME_SIZE};
use crate::types::{LinkInfo, LinkKind, PortInfo};
use crate::{Link, LinkConnector};

#[derive(Debug, Default)]
struct DeviceState {
    passthrough: bool,
    awaiting_payload: bool,
    shift_register: VecDeque<u8>,
    committed: Option<Frame>,
    mode: Option<u8>,
    written: Vec<u8>,
    pending: VecDeque<u8>,
    open_links: usize,
    corrupt_echo_at: Option<usize>,
    silent_after: Option<usize>,
    unplug_at: Option<usize>,
    fail_open: bool,
}

impl DeviceState {
    fn receive(&mut self, byte: u8) {
        let index = self.written.len();
        self.written.push(byte);

        let reply = if self.passthrough {
            self.fpga_receive(byte)
        } else if byte == cmd::RESET {
            self.passthrough = true;
            cmd::RESET
        } else {
            b'?'
        };

        if self.silent_after.is_some_and(|n| index >= n) {
            trace!("sim: byte {} dropped", index);
            return;
        }
        let reply = if self.corrupt_echo_at == Some(index) {
            !reply
        } else {
            reply
        };
        self.pending.push_back(reply);
    }

    fn fpga_receive(&mut self, byte: u8) -> u8 {
        if self.awaiting_payload {
            self.awaiting_payload = false;
            if self.shift_register.len() == FRAME_SIZE {
                self.shift_register.pop_front();
            }
            self.shift_register.push_back(byte);
            return byte;
        }

        match byte {
            cmd::PREPARE => self.awaiting_payload = true,
            cmd::UPDATE => {
                if self.shift_register.len() == FRAME_SIZE {
                    let mut frame = [0u8; FRAME_SIZE];
                    for (slot, b) in frame.iter_mut().zip(self.shift_register.drain(..)) {
                        *slot = b;
                    }
                    self.committed = Some(frame);
                }
            }
            cmd::MODE_RANDOM | cmd::MODE_PATTERN | cmd::MODE_INDIVIDUAL | cmd::MODE_SWITCHING => {
                self.mode = Some(byte)
            }
            _ => {}
        }
        byte
    }
}

/// Handle to a simulated controller, shared by all links opened on it
#[derive(Debug, Clone, Default)]
pub struct SimulatedDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a link to this device
    pub fn link(&self, port_name: &str) -> SimulatedLink {
        self.state.lock().open_links += 1;
        SimulatedLink {
            state: Arc::clone(&self.state),
            open: true,
            info: LinkInfo {
                port_name: port_name.to_string(),
                kind: LinkKind::Simulated,
                baud_rate: crate::protocol::timing::BAUD_RATE,
            },
        }
    }

    /// All bytes the host has written, in order
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().written.clone()
    }

    /// Frame latched by the last `UPDATE`
    pub fn committed_frame(&self) -> Option<Frame> {
        self.state.lock().committed
    }

    /// Last mode code received
    pub fn mode(&self) -> Option<u8> {
        self.state.lock().mode
    }

    /// Whether any link to this device is open
    pub fn is_open(&self) -> bool {
        self.state.lock().open_links > 0
    }

    /// Invert the reply to the write at `index` (0-based over all writes)
    pub fn corrupt_echo_at(&self, index: usize) {
        self.state.lock().corrupt_echo_at = Some(index);
    }

    /// Stop replying from the write at `index` onwards
    pub fn go_silent_after(&self, index: usize) {
        self.state.lock().silent_after = Some(index);
    }

    /// Fail the write at `index` and every later one as if the cable
    /// were pulled
    pub fn unplug_at(&self, index: usize) {
        self.state.lock().unplug_at = Some(index);
    }

    /// Make the next opens fail as if the port were busy
    pub fn fail_open(&self, fail: bool) {
        self.state.lock().fail_open = fail;
    }

    /// Clear injected faults
    pub fn clear_faults(&self) {
        let mut state = self.state.lock();
        state.corrupt_echo_at = None;
        state.silent_after = None;
        state.unplug_at = None;
        state.fail_open = false;
    }
}

/// Link to a [`SimulatedDevice`]
pub struct SimulatedLink {
    state: Arc<Mutex<DeviceState>>,
    open: bool,
    info: LinkInfo,
}

impl Link for SimulatedLink {
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Disconnected);
        }
        let mut state = self.state.lock();
        if state.unplug_at.is_some_and(|n| state.written.len() >= n) {
            return Err(TransportError::Disconnected);
        }
        state.receive(byte);
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, TransportError> {
        if !self.open {
            return Err(TransportError::Disconnected);
        }
        self.state
            .lock()
            .pending
            .pop_front()
            .ok_or(TransportError::Timeout)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Disconnected);
        }
        self.open = false;
        let mut state = self.state.lock();
        state.open_links -= 1;
        // Unread replies die with the port buffer
        state.pending.clear();
        Ok(())
    }

    fn info(&self) -> &LinkInfo {
        &self.info
    }
}

impl Drop for SimulatedLink {
    fn drop(&mut self) {
        if self.open {
            self.state.lock().open_links -= 1;
        }
    }
}

/// Connector opening links to one [`SimulatedDevice`] under any port name
#[derive(Debug, Clone, Default)]
pub struct SimulatedConnector {
    device: SimulatedDevice,
}

impl SimulatedConnector {
    pub fn new(device: SimulatedDevice) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &SimulatedDevice {
        &self.device
    }
}

impl LinkConnector for SimulatedConnector {
    fn open(&self, port_name: &str) -> Result<Box<dyn Link>, TransportError> {
        if self.device.state.lock().fail_open {
            return Err(TransportError::PortOpen {
                port: port_name.to_string(),
                reason: "Device or resource busy".into(),
            });
        }
        Ok(Box::new(self.device.link(port_name)))
    }

    fn list_ports(&self) -> Result<Vec<PortInfo>, TransportError> {
        Ok(vec![PortInfo {
            port_name: "sim0".into(),
            description: "Simulated controller".into(),
        }])
    }
}
