//! Echo-verified command protocol
//!
//! Every byte the host sends is read back and compared before the next one
//! goes out. A frame transfer is nine `PREPARE`/payload exchanges followed
//! by one `UPDATE` exchange:
//!
//! ```text
//! host:   p   b0  p   b1  ...  p   b8  u
//! device: p   b0  p   b1  ...  p   b8  u
//! ```

use tracing::{debug, trace};

use crate::error::TransportError;
use crate::protocol::{cmd, pack_leds, ChannelValues, Frame};
use crate::types::LinkInfo;
use crate::Link;

/// Protocol encoder owning a [`Link`]
pub struct ProtocolEncoder<L: Link> {
    link: L,
}

impl<L: Link> ProtocolEncoder<L> {
    pub fn new(link: L) -> Self {
        Self { link }
    }

    /// Get link information
    pub fn info(&self) -> &LinkInfo {
        self.link.info()
    }

    /// Get the underlying link
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Release the encoder, returning the link
    pub fn into_inner(self) -> L {
        self.link
    }

    /// Write one byte and require the device to echo it back
    fn exchange(&mut self, byte: u8) -> Result<(), TransportError> {
        self.link.write_byte(byte)?;
        let echo = self.link.read_byte()?;
        trace!("0x{:02X} -> 0x{:02X}", byte, echo);
        if echo != byte {
            debug!(
                "Echo mismatch: sent 0x{:02X} ({}), got 0x{:02X}",
                byte,
                cmd::name(byte),
                echo
            );
            return Err(TransportError::ProtocolMismatch {
                expected: byte,
                actual: echo,
            });
        }
        Ok(())
    }

    /// Send a single-byte command and verify its echo
    pub fn send_command(&mut self, code: u8) -> Result<(), TransportError> {
        debug!("Sending command '{}' ({})", code as char, cmd::name(code));
        self.exchange(code)
    }

    /// Send the connect-time reset. The reply is returned but not checked.
    pub fn reset(&mut self) -> Result<u8, TransportError> {
        self.link.write_byte(cmd::RESET)?;
        let reply = self.link.read_byte()?;
        debug!("Reset acknowledged with 0x{:02X}", reply);
        Ok(reply)
    }

    /// Transfer a packed frame byte by byte, then commit it.
    ///
    /// Aborts on the first failed exchange; `UPDATE` is only sent after all
    /// payload bytes were echoed correctly.
    pub fn send_led_frame(&mut self, frame: &Frame) -> Result<(), TransportError> {
        debug!("Sending LED frame {:02X?}", frame);
        for &byte in frame {
            self.exchange(cmd::PREPARE)?;
            self.exchange(byte)?;
        }
        self.send_command(cmd::UPDATE)
    }

    /// Pack channel intensities and send them as one frame
    pub fn send_leds(&mut self, values: &ChannelValues) -> Result<(), TransportError> {
        let frame = pack_leds(values)?;
        self.send_led_frame(&frame)
    }

    /// Close the link without further handshakes
    pub fn close(mut self) -> Result<L, TransportError> {
        self.link.close()?;
        Ok(self.link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{unpack_leds, CHANNEL_COUNT};
    use crate::simulated::SimulatedDevice;

    fn encoder(device: &SimulatedDevice) -> ProtocolEncoder<crate::SimulatedLink> {
        let mut encoder = ProtocolEncoder::new(device.link("sim0"));
        encoder.reset().unwrap();
        encoder
    }

    #[test]
    fn test_send_command_echo() {
        let device = SimulatedDevice::new();
        let mut enc = encoder(&device);
        enc.send_command(cmd::MODE_RANDOM).unwrap();
        assert_eq!(device.mode(), Some(cmd::MODE_RANDOM));
    }

    #[test]
    fn test_send_command_mismatch() {
        let device = SimulatedDevice::new();
        let mut enc = encoder(&device);
        // Byte 0 was the reset, so the next write is index 1
        device.corrupt_echo_at(1);
        match enc.send_command(cmd::MODE_PATTERN) {
            Err(TransportError::ProtocolMismatch { expected, actual }) => {
                assert_eq!(expected, b's');
                assert_eq!(actual, !b's');
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_reset_reply_not_checked() {
        let device = SimulatedDevice::new();
        device.corrupt_echo_at(0);
        let mut enc = ProtocolEncoder::new(device.link("sim0"));
        assert_eq!(enc.reset().unwrap(), !b'z');
    }

    #[test]
    fn test_frame_wire_sequence() {
        let device = SimulatedDevice::new();
        let mut enc = encoder(&device);
        let frame: Frame = [1, 2, 3, 4, 5, 6, 7, 8, 9];
        enc.send_led_frame(&frame).unwrap();

        let written = device.written();
        let mut expected = vec![cmd::RESET];
        for b in frame {
            expected.push(cmd::PREPARE);
            expected.push(b);
        }
        expected.push(cmd::UPDATE);
        assert_eq!(written, expected);
        assert_eq!(device.committed_frame(), Some(frame));
    }

    #[test]
    fn test_payload_byte_equal_to_command_code() {
        // Payload bytes that look like commands are still plain data
        let device = SimulatedDevice::new();
        let mut enc = encoder(&device);
        let frame: Frame = [b'p', b'u', b'z', b'f', 0, 0, 0, 0, b'i'];
        enc.send_led_frame(&frame).unwrap();
        assert_eq!(device.committed_frame(), Some(frame));
        assert_eq!(device.mode(), None);
    }

    #[test]
    fn test_frame_mismatch_aborts_before_commit() {
        let device = SimulatedDevice::new();
        let mut enc = encoder(&device);
        // reset, then p b0 p b1 p <b2 corrupted>
        device.corrupt_echo_at(6);
        let frame: Frame = [0x11; 9];
        assert!(matches!(
            enc.send_led_frame(&frame),
            Err(TransportError::ProtocolMismatch { .. })
        ));
        let written = device.written();
        assert_eq!(written.len(), 7);
        assert!(!written[1..].contains(&cmd::UPDATE));
        assert_eq!(device.committed_frame(), None);
    }

    #[test]
    fn test_frame_timeout_aborts() {
        let device = SimulatedDevice::new();
        let mut enc = encoder(&device);
        device.go_silent_after(4);
        assert!(matches!(
            enc.send_led_frame(&[0; 9]),
            Err(TransportError::Timeout)
        ));
        assert_eq!(device.written().len(), 5);
        assert_eq!(device.committed_frame(), None);
    }

    #[test]
    fn test_send_leds_packs() {
        let device = SimulatedDevice::new();
        let mut enc = encoder(&device);
        let mut values = [0u8; CHANNEL_COUNT];
        values[0] = 7;
        values[23] = 7;
        enc.send_leds(&values).unwrap();
        let committed = device.committed_frame().unwrap();
        assert_eq!(committed[0], 0xE0);
        assert_eq!(committed[8], 0x07);
        assert_eq!(unpack_leds(&committed), values);
    }

    #[test]
    fn test_close_rejects_further_io() {
        let device = SimulatedDevice::new();
        let enc = encoder(&device);
        let mut link = enc.close().unwrap();
        assert!(matches!(
            link.write_byte(b'p'),
            Err(TransportError::Disconnected)
        ));
        assert!(!device.is_open());
    }
}
