//! Utility command handlers.

use lightctl_panel::{colors_to_channels, format_panel, parse_panel};
use lightctl_transport::pack_leds;
use serde::Serialize;

use super::{open_controller, CommandResult, Settings};

/// List serial ports
pub fn list(settings: &Settings) -> CommandResult {
    let controller = open_controller(settings);
    let ports = controller.list_ports()?;

    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }
    println!("Serial ports:");
    for port in ports {
        println!("  {:<20} {}", port.port_name, port.description);
    }
    Ok(())
}

#[derive(Serialize)]
struct PackedPanel {
    panel: String,
    channels: Vec<u8>,
    frame: Vec<u8>,
    hex: String,
}

/// Print the packed frame for a panel string
pub fn pack(panel: &str, json: bool) -> CommandResult {
    let colors = parse_panel(panel)?;
    let channels = colors_to_channels(&colors);
    let frame = pack_leds(&channels)?;

    let packed = PackedPanel {
        panel: format_panel(&colors),
        channels: channels.to_vec(),
        hex: frame
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" "),
        frame: frame.to_vec(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&packed)?);
    } else {
        println!("Panel:    {}", packed.panel);
        println!("Channels: {:?}", packed.channels);
        println!("Frame:    {}", packed.hex);
    }
    Ok(())
}
