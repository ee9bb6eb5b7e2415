//! Per-LED display colors and their channel intensities

use std::fmt;
use std::str::FromStr;

use lightctl_transport::protocol::{CHANNELS_PER_LED, CHANNEL_MAX};
use lightctl_transport::{ChannelValues, CHANNEL_COUNT, LED_COUNT};
use serde::{Deserialize, Serialize};

use crate::error::PanelError;

/// Display color of one bicolor LED
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LedColor {
    #[default]
    Off = 0,
    Red = 1,
    Green = 2,
}

/// Colors of the whole panel, index 0 first
pub type PanelColors = [LedColor; LED_COUNT];

/// Panel with every LED off
pub const ALL_OFF: PanelColors = [LedColor::Off; LED_COUNT];

impl LedColor {
    /// Next color in the Off -> Red -> Green -> Off cycle
    pub fn cycle(self) -> Self {
        match self {
            LedColor::Off => LedColor::Red,
            LedColor::Red => LedColor::Green,
            LedColor::Green => LedColor::Off,
        }
    }

    /// (red, green) intensities for this color
    pub fn to_channels(self) -> (u8, u8) {
        match self {
            LedColor::Off => (0, 0),
            LedColor::Red => (CHANNEL_MAX, 0),
            LedColor::Green => (0, CHANNEL_MAX),
        }
    }

    /// Single-character form used in panel strings
    pub fn to_char(self) -> char {
        match self {
            LedColor::Off => '.',
            LedColor::Red => 'R',
            LedColor::Green => 'G',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '.' | '0' | 'o' | 'O' => Some(LedColor::Off),
            'R' | 'r' => Some(LedColor::Red),
            'G' | 'g' => Some(LedColor::Green),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LedColor::Off => "off",
            LedColor::Red => "red",
            LedColor::Green => "green",
        }
    }
}

impl TryFrom<u8> for LedColor {
    type Error = PanelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LedColor::Off),
            1 => Ok(LedColor::Red),
            2 => Ok(LedColor::Green),
            _ => Err(PanelError::InvalidState(format!(
                "LED color {value} is not off, red or green"
            ))),
        }
    }
}

impl fmt::Display for LedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LedColor {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "white" | "none" => Ok(LedColor::Off),
            "red" => Ok(LedColor::Red),
            "green" => Ok(LedColor::Green),
            other => {
                let mut chars = other.chars();
                match (chars.next().and_then(LedColor::from_char), chars.next()) {
                    (Some(color), None) => Ok(color),
                    _ => Err(PanelError::InvalidParameter(format!(
                        "Unknown color: {s} (expected off, red or green)"
                    ))),
                }
            }
        }
    }
}

/// Expand panel colors into the 24 channel intensities (LED i -> 2i, 2i+1)
pub fn colors_to_channels(colors: &PanelColors) -> ChannelValues {
    let mut values = [0u8; CHANNEL_COUNT];
    for (pair, color) in values.chunks_exact_mut(CHANNELS_PER_LED).zip(colors) {
        let (red, green) = color.to_channels();
        pair[0] = red;
        pair[1] = green;
    }
    values
}

/// Parse a 12-character panel string such as `R.G.........`
pub fn parse_panel(s: &str) -> Result<PanelColors, PanelError> {
    let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
    if chars.len() != LED_COUNT {
        return Err(PanelError::InvalidParameter(format!(
            "Panel needs {LED_COUNT} colors, got {}",
            chars.len()
        )));
    }

    let mut colors = ALL_OFF;
    for (i, (slot, c)) in colors.iter_mut().zip(chars).enumerate() {
        *slot = LedColor::from_char(c).ok_or_else(|| {
            PanelError::InvalidParameter(format!("LED {i}: unknown color '{c}'"))
        })?;
    }
    Ok(colors)
}

/// Inverse of [`parse_panel`]
pub fn format_panel(colors: &PanelColors) -> String {
    colors.iter().map(|c| c.to_char()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_is_closed() {
        assert_eq!(LedColor::Off.cycle(), LedColor::Red);
        assert_eq!(LedColor::Red.cycle(), LedColor::Green);
        assert_eq!(LedColor::Green.cycle(), LedColor::Off);
        for c in [LedColor::Off, LedColor::Red, LedColor::Green] {
            assert_eq!(c.cycle().cycle().cycle(), c);
        }
    }

    #[test]
    fn test_channel_table() {
        assert_eq!(LedColor::Off.to_channels(), (0, 0));
        assert_eq!(LedColor::Red.to_channels(), (7, 0));
        assert_eq!(LedColor::Green.to_channels(), (0, 7));
    }

    #[test]
    fn test_raw_color_out_of_set() {
        assert_eq!(LedColor::try_from(2).unwrap(), LedColor::Green);
        assert!(matches!(
            LedColor::try_from(3),
            Err(PanelError::InvalidState(_))
        ));
    }

    #[test]
    fn test_colors_to_channels() {
        let mut colors = ALL_OFF;
        colors[0] = LedColor::Red;
        colors[11] = LedColor::Green;
        let values = colors_to_channels(&colors);
        assert_eq!(values[0], 7);
        assert_eq!(values[1], 0);
        assert_eq!(values[22], 0);
        assert_eq!(values[23], 7);
        assert_eq!(values.iter().filter(|&&v| v != 0).count(), 2);
    }

    #[test]
    fn test_panel_string() {
        let colors = parse_panel("R.G. .... ...g").unwrap();
        assert_eq!(colors[0], LedColor::Red);
        assert_eq!(colors[2], LedColor::Green);
        assert_eq!(colors[11], LedColor::Green);
        assert_eq!(format_panel(&colors), "R.G........G");

        assert!(parse_panel("R.G").is_err());
        assert!(parse_panel("R.G........X").is_err());
    }

    #[test]
    fn test_color_names() {
        assert_eq!("Red".parse::<LedColor>().unwrap(), LedColor::Red);
        assert_eq!("g".parse::<LedColor>().unwrap(), LedColor::Green);
        assert_eq!("off".parse::<LedColor>().unwrap(), LedColor::Off);
        assert!("blue".parse::<LedColor>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&[LedColor::Off, LedColor::Red]).unwrap();
        assert_eq!(json, r#"["off","red"]"#);
        let back: LedColor = serde_json::from_str(r#""green""#).unwrap();
        assert_eq!(back, LedColor::Green);
    }
}
