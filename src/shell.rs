//! Interactive line shell driving a [`PanelController`]
//!
//! Stands in for a graphical front end: each line is one operator intent.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crossterm::style::Stylize;
use lightctl_panel::{
    format_panel, parse_panel, LedColor, Mode, PanelColors, PanelController, PanelError,
};
use thiserror::Error;

const HELP: &str = "\
Commands:
  connect [port]      open the port, reset, select individual mode
  disconnect          select switching mode and close the port
  led <n> [color]     set LED n (0-11) to off/red/green, or cycle it
  all <panel>         set all 12 LEDs, e.g. R.G.........
  mode <mode>         random, pattern, individual or switching
  status              show connection and LED colors
  ports               list serial ports
  help                this text
  quit                disconnect and leave";

/// Errors from parsing or running a shell line
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Unknown command: {0} (try 'help')")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("No port given and no default port configured")]
    NoPort,

    #[error(transparent)]
    Panel(#[from] PanelError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// One parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Connect(Option<String>),
    Disconnect,
    Led {
        index: usize,
        color: Option<LedColor>,
    },
    All(PanelColors),
    Mode(Mode),
    Status,
    Ports,
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = ShellError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(ShellError::Usage("help"));
        };
        let args: Vec<&str> = words.collect();

        let cmd = match (verb.to_lowercase().as_str(), args.as_slice()) {
            ("connect" | "c", []) => Self::Connect(None),
            ("connect" | "c", [port]) => Self::Connect(Some(port.to_string())),
            ("connect" | "c", _) => return Err(ShellError::Usage("connect [port]")),
            ("disconnect" | "d", []) => Self::Disconnect,
            ("led" | "l", [index, rest @ ..]) if rest.len() <= 1 => {
                let index = index
                    .parse()
                    .map_err(|_| ShellError::Usage("led <n> [color]"))?;
                let color = rest.first().map(|c| c.parse()).transpose()?;
                Self::Led { index, color }
            }
            ("led" | "l", _) => return Err(ShellError::Usage("led <n> [color]")),
            ("all" | "a", [_, ..]) => Self::All(parse_panel(&args.concat())?),
            ("all" | "a", []) => return Err(ShellError::Usage("all <panel>")),
            ("mode" | "m", [mode]) => Self::Mode(
                mode.parse()
                    .map_err(|_| ShellError::Usage("mode <random|pattern|individual|switching>"))?,
            ),
            ("mode" | "m", _) => {
                return Err(ShellError::Usage(
                    "mode <random|pattern|individual|switching>",
                ))
            }
            ("status" | "s", []) => Self::Status,
            ("ports", []) => Self::Ports,
            ("help" | "?", _) => Self::Help,
            ("quit" | "exit" | "q", _) => Self::Quit,
            _ => return Err(ShellError::UnknownCommand(line.trim().to_string())),
        };
        Ok(cmd)
    }
}

/// Whether the shell keeps reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Colored swatches for a panel, one per LED
pub fn render_panel(colors: &PanelColors) -> String {
    colors
        .iter()
        .map(|c| match c {
            LedColor::Off => "○".dark_grey().to_string(),
            LedColor::Red => "●".red().to_string(),
            LedColor::Green => "●".green().to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shell bound to a controller
pub struct Shell<'a> {
    controller: &'a PanelController,
    default_port: Option<String>,
}

impl<'a> Shell<'a> {
    pub fn new(controller: &'a PanelController, default_port: Option<String>) -> Self {
        Self {
            controller,
            default_port,
        }
    }

    /// Run one command, writing feedback to `out`
    pub fn execute(&mut self, cmd: ShellCommand, out: &mut impl Write) -> Result<Flow, ShellError> {
        match cmd {
            ShellCommand::Connect(port) => {
                let port = port
                    .or_else(|| self.default_port.clone())
                    .ok_or(ShellError::NoPort)?;
                self.controller.connect(&port)?;
                writeln!(out, "Connected to {port}")?;
                self.default_port = Some(port);
            }
            ShellCommand::Disconnect => {
                self.controller.disconnect()?;
                writeln!(out, "Disconnected")?;
            }
            ShellCommand::Led { index, color } => {
                let shown = self.controller.set_led_color(index, color)?;
                writeln!(out, "LED {index}: {shown}")?;
            }
            ShellCommand::All(colors) => {
                self.controller.set_all(&colors)?;
                writeln!(out, "Panel: {}", format_panel(&colors))?;
            }
            ShellCommand::Mode(mode) => {
                self.controller.set_mode(mode)?;
                writeln!(out, "Mode: {mode}")?;
            }
            ShellCommand::Status => {
                let colors = self.controller.current_colors();
                match self.controller.port_name() {
                    Some(port) => writeln!(out, "Connected: {port}")?,
                    None => writeln!(out, "Disconnected")?,
                }
                writeln!(out, "Panel: {}", format_panel(&colors))?;
                writeln!(out, "       {}", render_panel(&colors))?;
            }
            ShellCommand::Ports => {
                let ports = self.controller.list_ports()?;
                if ports.is_empty() {
                    writeln!(out, "No serial ports found")?;
                }
                for port in ports {
                    writeln!(out, "  {:<20} {}", port.port_name, port.description)?;
                }
            }
            ShellCommand::Help => writeln!(out, "{HELP}")?,
            ShellCommand::Quit => {
                if self.controller.is_connected() {
                    self.controller.disconnect()?;
                    writeln!(out, "Disconnected")?;
                }
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Read and run lines until `quit` or end of input.
    ///
    /// Command failures are reported and the loop continues; a desynchronized
    /// link has already been closed by the controller at that point.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        let mut lines = input.lines();
        loop {
            write!(output, "lightctl> ")?;
            output.flush()?;

            let Some(line) = lines.next().transpose()? else {
                writeln!(output)?;
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let result = line
                .parse::<ShellCommand>()
                .and_then(|cmd| self.execute(cmd, &mut output));
            match result {
                Ok(Flow::Quit) => return Ok(()),
                Ok(Flow::Continue) => {}
                Err(e) => {
                    writeln!(output, "error: {e}")?;
                    if !self.controller.is_connected() && is_link_error(&e) {
                        writeln!(output, "Link closed, use 'connect' to start again")?;
                    }
                }
            }
        }

        // End of input behaves like quit
        if self.controller.is_connected() {
            if let Err(e) = self.controller.disconnect() {
                writeln!(output, "error: {e}")?;
            }
        }
        Ok(())
    }
}

fn is_link_error(e: &ShellError) -> bool {
    matches!(e, ShellError::Panel(PanelError::Transport(t)) if t.is_desync())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightctl_panel::LED_COUNT;

    #[test]
    fn test_parse_led() {
        assert_eq!(
            "led 3 red".parse::<ShellCommand>().unwrap(),
            ShellCommand::Led {
                index: 3,
                color: Some(LedColor::Red)
            }
        );
        assert_eq!(
            "l 11".parse::<ShellCommand>().unwrap(),
            ShellCommand::Led {
                index: 11,
                color: None
            }
        );
        assert!(matches!(
            "led x".parse::<ShellCommand>(),
            Err(ShellError::Usage(_))
        ));
        assert!(matches!(
            "led 1 blue".parse::<ShellCommand>(),
            Err(ShellError::Panel(PanelError::InvalidParameter(_)))
        ));
    }

    #[test]
    fn test_parse_all_with_spaces() {
        let cmd: ShellCommand = "all RRRR .... GGGG".parse().unwrap();
        match cmd {
            ShellCommand::All(colors) => {
                assert_eq!(format_panel(&colors), "RRRR....GGGG");
                assert_eq!(colors.len(), LED_COUNT);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(
            "connect /dev/ttyUSB0".parse::<ShellCommand>().unwrap(),
            ShellCommand::Connect(Some("/dev/ttyUSB0".into()))
        );
        assert_eq!(
            "mode idle".parse::<ShellCommand>().unwrap(),
            ShellCommand::Mode(Mode::Switching)
        );
        assert_eq!("QUIT".parse::<ShellCommand>().unwrap(), ShellCommand::Quit);
        assert!(matches!(
            "blink".parse::<ShellCommand>(),
            Err(ShellError::UnknownCommand(_))
        ));
    }
}
