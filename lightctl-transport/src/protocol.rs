//! Protocol constants and the LED channel bit-packing for the controller link

use crate::error::TransportError;

/// Single-byte command vocabulary
pub mod cmd {
    /// Select Random mode
    pub const MODE_RANDOM: u8 = b'r';
    /// Select Pattern mode
    pub const MODE_PATTERN: u8 = b's';
    /// Select Individual mode (host-driven LED colors)
    pub const MODE_INDIVIDUAL: u8 = b'i';
    /// Select Switching mode, the idle default.
    /// Must not collide with the transfer codes below.
    pub const MODE_SWITCHING: u8 = b'f';

    /// Prepare to receive one payload byte
    pub const PREPARE: u8 = b'p';
    /// Commit the transferred frame to the display
    pub const UPDATE: u8 = b'u';
    /// Reset sent once at connect; the reply is read but not checked
    pub const RESET: u8 = b'z';
    /// Reserved by the firmware, never emitted by the host
    pub const RESERVED: u8 = b'w';

    /// Get human-readable name for command byte
    pub fn name(cmd: u8) -> &'static str {
        match cmd {
            MODE_RANDOM => "MODE_RANDOM",
            MODE_PATTERN => "MODE_PATTERN",
            MODE_INDIVIDUAL => "MODE_INDIVIDUAL",
            MODE_SWITCHING => "MODE_SWITCHING",
            PREPARE => "PREPARE",
            UPDATE => "UPDATE",
            RESET => "RESET",
            RESERVED => "RESERVED",
            _ => "UNKNOWN",
        }
    }
}

/// Serial line parameters
pub mod timing {
    /// Line speed expected by the controller
    pub const BAUD_RATE: u32 = 38400;
    /// Read and write timeout for every byte (ms)
    pub const IO_TIMEOUT_MS: u64 = 500;
}

/// Number of bicolor LEDs on the panel
pub const LED_COUNT: usize = 12;
/// Intensity channels per LED (red, green)
pub const CHANNELS_PER_LED: usize = 2;
/// Total intensity channels
pub const CHANNEL_COUNT: usize = LED_COUNT * CHANNELS_PER_LED;
/// Width of one intensity value
pub const BITS_PER_CHANNEL: usize = 3;
/// Largest intensity a channel accepts
pub const CHANNEL_MAX: u8 = 7;
/// Channels folded into one accumulator
pub const CHANNELS_PER_GROUP: usize = 8;
/// Packed frame size on the wire
pub const FRAME_SIZE: usize = LED_LAYOUT.frame_len();

/// Intensity values, index 0 is the lowest channel
pub type ChannelValues = [u8; CHANNEL_COUNT];

/// Packed LED frame as transmitted
pub type Frame = [u8; FRAME_SIZE];

/// Shape of a packed channel frame.
///
/// Channels are split into groups of `group_channels`. Each group is folded
/// into an accumulator, highest channel first, and emitted big-endian.
/// Groups are emitted starting with the one holding the highest channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackLayout {
    pub channels: usize,
    pub bits: usize,
    pub group_channels: usize,
}

/// The controller's 24 x 3-bit layout
pub const LED_LAYOUT: PackLayout = PackLayout {
    channels: CHANNEL_COUNT,
    bits: BITS_PER_CHANNEL,
    group_channels: CHANNELS_PER_GROUP,
};

const _: () = assert!(LED_LAYOUT.is_valid());

impl PackLayout {
    /// Groups must tile the channels and fill whole bytes of a u64
    pub const fn is_valid(&self) -> bool {
        self.bits > 0
            && self.bits <= 8
            && self.group_channels > 0
            && self.channels % self.group_channels == 0
            && (self.bits * self.group_channels) % 8 == 0
            && self.bits * self.group_channels <= 64
    }

    pub const fn group_count(&self) -> usize {
        self.channels / self.group_channels
    }

    pub const fn group_bytes(&self) -> usize {
        self.bits * self.group_channels / 8
    }

    pub const fn frame_len(&self) -> usize {
        self.group_count() * self.group_bytes()
    }

    pub const fn max_value(&self) -> u8 {
        ((1u16 << self.bits as u32) - 1) as u8
    }

    /// Check every value fits in `bits`
    pub fn validate(&self, values: &[u8]) -> Result<(), TransportError> {
        if values.len() != self.channels {
            return Err(TransportError::InvalidLength {
                expected: self.channels,
                actual: values.len(),
            });
        }
        match values.iter().position(|&v| v > self.max_value()) {
            Some(index) => Err(TransportError::ChannelOutOfRange {
                index,
                value: values[index],
            }),
            None => Ok(()),
        }
    }

    /// Pack `values` into `out`
    pub fn pack_into(&self, values: &[u8], out: &mut [u8]) -> Result<(), TransportError> {
        self.validate(values)?;
        if out.len() != self.frame_len() {
            return Err(TransportError::InvalidLength {
                expected: self.frame_len(),
                actual: out.len(),
            });
        }

        let group_bytes = self.group_bytes();
        for group in 0..self.group_count() {
            let top = self.channels - group * self.group_channels;
            let acc = values[top - self.group_channels..top]
                .iter()
                .rev()
                .fold(0u64, |acc, &v| (acc << self.bits) | u64::from(v));

            let be = acc.to_be_bytes();
            out[group * group_bytes..(group + 1) * group_bytes]
                .copy_from_slice(&be[be.len() - group_bytes..]);
        }
        Ok(())
    }

    /// Inverse of [`PackLayout::pack_into`]
    pub fn unpack_into(&self, frame: &[u8], out: &mut [u8]) -> Result<(), TransportError> {
        if frame.len() != self.frame_len() {
            return Err(TransportError::InvalidLength {
                expected: self.frame_len(),
                actual: frame.len(),
            });
        }
        if out.len() != self.channels {
            return Err(TransportError::InvalidLength {
                expected: self.channels,
                actual: out.len(),
            });
        }
        self.unpack_groups(frame, out);
        Ok(())
    }

    /// Lengths must already match the layout
    fn unpack_groups(&self, frame: &[u8], out: &mut [u8]) {
        let group_bytes = self.group_bytes();
        let mask = u64::from(self.max_value());
        for group in 0..self.group_count() {
            let mut be = [0u8; 8];
            be[8 - group_bytes..]
                .copy_from_slice(&frame[group * group_bytes..(group + 1) * group_bytes]);
            let mut acc = u64::from_be_bytes(be);

            let base = self.channels - (group + 1) * self.group_channels;
            for slot in &mut out[base..base + self.group_channels] {
                *slot = (acc & mask) as u8;
                acc >>= self.bits;
            }
        }
    }
}

/// Pack the 24 channel intensities into the 9-byte wire frame
pub fn pack_leds(values: &ChannelValues) -> Result<Frame, TransportError> {
    let mut frame = [0u8; FRAME_SIZE];
    LED_LAYOUT.pack_into(values, &mut frame)?;
    Ok(frame)
}

/// Recover the 24 channel intensities from a wire frame
pub fn unpack_leds(frame: &Frame) -> ChannelValues {
    let mut values = [0u8; CHANNEL_COUNT];
    LED_LAYOUT.unpack_groups(frame, &mut values);
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_unpack_inverts_pack(values in prop::array::uniform24(0u8..=CHANNEL_MAX)) {
            let frame = pack_leds(&values).unwrap();
            prop_assert_eq!(unpack_leds(&frame), values);
        }

        #[test]
        fn prop_pack_rejects_wide_values(
            mut values in prop::array::uniform24(0u8..=CHANNEL_MAX),
            index in 0usize..CHANNEL_COUNT,
            wide in (CHANNEL_MAX + 1)..=u8::MAX,
        ) {
            values[index] = wide;
            match pack_leds(&values) {
                Err(TransportError::ChannelOutOfRange { index: i, value }) => {
                    prop_assert_eq!(i, index);
                    prop_assert_eq!(value, wide);
                }
                other => prop_assert!(false, "unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn test_layout_dimensions() {
        assert_eq!(LED_LAYOUT.group_count(), 3);
        assert_eq!(LED_LAYOUT.group_bytes(), 3);
        assert_eq!(FRAME_SIZE, 9);
        assert_eq!(LED_LAYOUT.max_value(), CHANNEL_MAX);
    }

    #[test]
    fn test_pack_all_off() {
        assert_eq!(pack_leds(&[0; CHANNEL_COUNT]).unwrap(), [0x00; 9]);
    }

    #[test]
    fn test_pack_highest_channel() {
        let mut values = [0u8; CHANNEL_COUNT];
        values[23] = 7;
        let frame = pack_leds(&values).unwrap();
        assert_eq!(frame[0], 0xE0);
        assert!(frame[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pack_lowest_channel() {
        let mut values = [0u8; CHANNEL_COUNT];
        values[0] = 7;
        let frame = pack_leds(&values).unwrap();
        assert_eq!(frame[8], 0x07);
        assert!(frame[..8].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pack_group_boundaries() {
        // Lowest channel of group 0 and highest channel of group 1
        let mut values = [0u8; CHANNEL_COUNT];
        values[16] = 5;
        values[15] = 3;
        let frame = pack_leds(&values).unwrap();
        assert_eq!(&frame[0..3], &[0x00, 0x00, 0x05]);
        assert_eq!(&frame[3..6], &[0x60, 0x00, 0x00]);
        assert_eq!(&frame[6..9], &[0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_pack_all_full() {
        assert_eq!(pack_leds(&[7; CHANNEL_COUNT]).unwrap(), [0xFF; 9]);
    }

    #[test]
    fn test_pack_rejects_out_of_range() {
        let mut values = [0u8; CHANNEL_COUNT];
        values[4] = 8;
        match pack_leds(&values) {
            Err(TransportError::ChannelOutOfRange { index, value }) => {
                assert_eq!(index, 4);
                assert_eq!(value, 8);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_other_layout() {
        // 4-bit values, two per byte
        let layout = PackLayout {
            channels: 4,
            bits: 4,
            group_channels: 2,
        };
        assert!(layout.is_valid());
        let mut out = [0u8; 2];
        layout.pack_into(&[0x1, 0x2, 0x3, 0x4], &mut out).unwrap();
        assert_eq!(out, [0x43, 0x21]);

        let mut back = [0u8; 4];
        layout.unpack_into(&out, &mut back).unwrap();
        assert_eq!(back, [0x1, 0x2, 0x3, 0x4]);
    }

    #[test]
    fn test_wrong_length() {
        let mut out = [0u8; FRAME_SIZE];
        assert!(matches!(
            LED_LAYOUT.pack_into(&[0u8; 23], &mut out),
            Err(TransportError::InvalidLength {
                expected: 24,
                actual: 23
            })
        ));
    }

    #[test]
    fn test_command_names() {
        assert_eq!(cmd::name(b'p'), "PREPARE");
        assert_eq!(cmd::name(b'f'), "MODE_SWITCHING");
        assert_eq!(cmd::name(0x00), "UNKNOWN");
    }
}
