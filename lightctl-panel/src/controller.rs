//! Connection manager and host-facing command API
//!
//! `PanelController` owns the single link to the controller. All protocol
//! operations run under one lock, so a frame transfer can never interleave
//! with a mode change or another frame.

use std::mem;

use lightctl_transport::{
    BoxedConnector, Link, LinkConnector, PortInfo, ProtocolEncoder, TransportError, LED_COUNT,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::color::{colors_to_channels, LedColor, PanelColors, ALL_OFF};
use crate::error::PanelError;
use crate::mode::{Mode, ModeControl};

type Encoder = ProtocolEncoder<Box<dyn Link>>;

/// An open connection
struct Session {
    port_name: String,
    encoder: Encoder,
}

enum LinkState {
    Disconnected,
    Connected(Session),
}

struct ControllerState {
    link: LinkState,
    colors: PanelColors,
}

/// Push the full panel state as one frame
fn apply_led_state(encoder: &mut Encoder, colors: &PanelColors) -> Result<(), TransportError> {
    encoder.send_leds(&colors_to_channels(colors))
}

/// Host-facing interface to the LED controller
pub struct PanelController {
    connector: BoxedConnector,
    state: Mutex<ControllerState>,
}

impl PanelController {
    /// Create a controller that opens links through `connector`
    pub fn new(connector: impl LinkConnector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            state: Mutex::new(ControllerState {
                link: LinkState::Disconnected,
                colors: ALL_OFF,
            }),
        }
    }

    /// List ports the connector can open
    pub fn list_ports(&self) -> Result<Vec<PortInfo>, PanelError> {
        Ok(self.connector.list_ports()?)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state.lock().link, LinkState::Connected(_))
    }

    /// Name of the open port, if any
    pub fn port_name(&self) -> Option<String> {
        match &self.state.lock().link {
            LinkState::Connected(session) => Some(session.port_name.clone()),
            LinkState::Disconnected => None,
        }
    }

    /// Open the port, reset the controller and select Individual mode.
    ///
    /// On any failure the link is closed again and the controller stays
    /// disconnected.
    pub fn connect(&self, port_name: &str) -> Result<(), PanelError> {
        let mut state = self.state.lock();
        if let LinkState::Connected(session) = &state.link {
            return Err(PanelError::AlreadyConnected(session.port_name.clone()));
        }

        let mut encoder = ProtocolEncoder::new(self.connector.open(port_name)?);
        let handshake = encoder
            .reset()
            .and_then(|_| encoder.set_mode(Mode::Individual));

        if let Err(e) = handshake {
            warn!("Connect to {} failed: {}", port_name, e);
            if let Err(close_err) = encoder.close() {
                debug!("Close after failed connect: {}", close_err);
            }
            return Err(e.into());
        }

        info!("Connected to {}", port_name);
        state.colors = ALL_OFF;
        state.link = LinkState::Connected(Session {
            port_name: port_name.to_string(),
            encoder,
        });
        Ok(())
    }

    /// Select Switching mode, then close the link.
    ///
    /// The link is closed even when the mode change fails; that failure is
    /// still reported.
    pub fn disconnect(&self) -> Result<(), PanelError> {
        let mut state = self.state.lock();
        let Session {
            port_name,
            mut encoder,
        } = match mem::replace(&mut state.link, LinkState::Disconnected) {
            LinkState::Connected(session) => session,
            LinkState::Disconnected => return Err(PanelError::NotConnected),
        };

        let mode_result = encoder.set_mode(Mode::Switching);
        if let Err(ref e) = mode_result {
            warn!("Could not switch {} to idle before closing: {}", port_name, e);
        }
        let close_result = encoder.close();
        info!("Disconnected from {}", port_name);

        mode_result?;
        close_result?;
        Ok(())
    }

    /// Close the link without the Switching handshake, leaving the device
    /// in whatever mode and frame it currently shows
    pub fn release(&self) -> Result<(), PanelError> {
        let mut state = self.state.lock();
        match mem::replace(&mut state.link, LinkState::Disconnected) {
            LinkState::Connected(session) => {
                session.encoder.close()?;
                info!("Released {}", session.port_name);
                Ok(())
            }
            LinkState::Disconnected => Err(PanelError::NotConnected),
        }
    }

    /// Select a device mode while connected
    pub fn set_mode(&self, mode: Mode) -> Result<(), PanelError> {
        let mut state = self.state.lock();
        Self::run(&mut state, |encoder| encoder.set_mode(mode))
    }

    /// Set one LED and push the whole panel.
    ///
    /// With `color` of `None` the LED advances to the next color in its
    /// cycle. Returns the color now shown. If the transfer fails the previous
    /// color is kept.
    pub fn set_led_color(
        &self,
        index: usize,
        color: Option<LedColor>,
    ) -> Result<LedColor, PanelError> {
        if index >= LED_COUNT {
            return Err(PanelError::InvalidParameter(format!(
                "LED index {index} out of range 0-{}",
                LED_COUNT - 1
            )));
        }

        let mut state = self.state.lock();
        if !matches!(state.link, LinkState::Connected(_)) {
            return Err(PanelError::NotConnected);
        }

        let previous = state.colors[index];
        let next = color.unwrap_or_else(|| previous.cycle());
        let mut colors = state.colors;
        colors[index] = next;

        Self::run(&mut state, |encoder| apply_led_state(encoder, &colors))?;
        state.colors = colors;
        debug!("LED {} {} -> {}", index, previous, next);
        Ok(next)
    }

    /// Replace every LED color and push the panel
    pub fn set_all(&self, colors: &PanelColors) -> Result<(), PanelError> {
        let mut state = self.state.lock();
        Self::run(&mut state, |encoder| apply_led_state(encoder, colors))?;
        state.colors = *colors;
        Ok(())
    }

    /// Colors last confirmed by the device
    pub fn current_colors(&self) -> PanelColors {
        self.state.lock().colors
    }

    /// Run a protocol operation on the open link.
    ///
    /// Any link failure (timeout, echo mismatch, lost device) leaves the
    /// byte stream in an unknown position, so the link is closed without
    /// further handshakes.
    fn run<T>(
        state: &mut ControllerState,
        op: impl FnOnce(&mut Encoder) -> Result<T, TransportError>,
    ) -> Result<T, PanelError> {
        let session = match &mut state.link {
            LinkState::Connected(session) => session,
            LinkState::Disconnected => return Err(PanelError::NotConnected),
        };

        match op(&mut session.encoder) {
            Ok(value) => Ok(value),
            Err(e) => {
                if e.is_desync() {
                    if let LinkState::Connected(session) =
                        mem::replace(&mut state.link, LinkState::Disconnected)
                    {
                        warn!(
                            "Link to {} out of sync ({}), closing; reconnect required",
                            session.port_name, e
                        );
                        if let Err(close_err) = session.encoder.close() {
                            debug!("Forced close failed: {}", close_err);
                        }
                    }
                }
                Err(e.into())
            }
        }
    }
}

impl Drop for PanelController {
    fn drop(&mut self) {
        if self.is_connected() {
            if let Err(e) = self.disconnect() {
                warn!("Disconnect on drop failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightctl_transport::{cmd, SimulatedConnector, SimulatedDevice};

    fn controller() -> (PanelController, SimulatedDevice) {
        let device = SimulatedDevice::new();
        let controller = PanelController::new(SimulatedConnector::new(device.clone()));
        (controller, device)
    }

    #[test]
    fn test_connect_sequence() {
        let (ctl, device) = controller();
        ctl.connect("sim0").unwrap();
        assert!(ctl.is_connected());
        assert_eq!(ctl.port_name().as_deref(), Some("sim0"));
        assert_eq!(device.written(), vec![cmd::RESET, cmd::MODE_INDIVIDUAL]);
        assert_eq!(device.mode(), Some(cmd::MODE_INDIVIDUAL));
    }

    #[test]
    fn test_connect_twice() {
        let (ctl, _device) = controller();
        ctl.connect("sim0").unwrap();
        assert!(matches!(
            ctl.connect("sim0"),
            Err(PanelError::AlreadyConnected(_))
        ));
    }

    #[test]
    fn test_connect_failure_closes_link() {
        let (ctl, device) = controller();
        // Reset reply arrives, the Individual echo does not
        device.corrupt_echo_at(1);
        assert!(matches!(
            ctl.connect("sim0"),
            Err(PanelError::Transport(TransportError::ProtocolMismatch { .. }))
        ));
        assert!(!ctl.is_connected());
        assert!(!device.is_open());
    }

    #[test]
    fn test_connect_port_busy() {
        let (ctl, device) = controller();
        device.fail_open(true);
        assert!(matches!(
            ctl.connect("sim0"),
            Err(PanelError::Transport(TransportError::PortOpen { .. }))
        ));
        assert!(!ctl.is_connected());
    }

    #[test]
    fn test_disconnect_requires_connection() {
        let (ctl, _device) = controller();
        assert!(matches!(ctl.disconnect(), Err(PanelError::NotConnected)));
    }

    #[test]
    fn test_set_led_cycles() {
        let (ctl, _device) = controller();
        ctl.connect("sim0").unwrap();
        assert_eq!(ctl.set_led_color(3, None).unwrap(), LedColor::Red);
        assert_eq!(ctl.set_led_color(3, None).unwrap(), LedColor::Green);
        assert_eq!(ctl.set_led_color(3, None).unwrap(), LedColor::Off);
    }

    #[test]
    fn test_set_led_bad_index() {
        let (ctl, _device) = controller();
        ctl.connect("sim0").unwrap();
        assert!(matches!(
            ctl.set_led_color(12, Some(LedColor::Red)),
            Err(PanelError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_set_led_requires_connection() {
        let (ctl, _device) = controller();
        assert!(matches!(
            ctl.set_led_color(0, Some(LedColor::Red)),
            Err(PanelError::NotConnected)
        ));
        assert_eq!(ctl.current_colors(), ALL_OFF);
    }

    #[test]
    fn test_failed_frame_keeps_previous_color_and_drops_link() {
        let (ctl, device) = controller();
        ctl.connect("sim0").unwrap();
        device.go_silent_after(2);
        assert!(matches!(
            ctl.set_led_color(0, Some(LedColor::Green)),
            Err(PanelError::Transport(TransportError::Timeout))
        ));
        assert_eq!(ctl.current_colors()[0], LedColor::Off);
        assert!(!ctl.is_connected());
        assert!(!device.is_open());
    }

    #[test]
    fn test_release_keeps_device_mode() {
        let (ctl, device) = controller();
        ctl.connect("sim0").unwrap();
        ctl.set_mode(Mode::Random).unwrap();
        ctl.release().unwrap();
        assert_eq!(device.mode(), Some(cmd::MODE_RANDOM));
        assert!(!device.is_open());
        assert!(matches!(ctl.release(), Err(PanelError::NotConnected)));
    }

    #[test]
    fn test_unplug_mid_frame_drops_link() {
        let (ctl, device) = controller();
        ctl.connect("sim0").unwrap();
        // z i p b0 p b1 | third PREPARE fails
        device.unplug_at(6);
        assert!(matches!(
            ctl.set_led_color(0, Some(LedColor::Red)),
            Err(PanelError::Transport(TransportError::Disconnected))
        ));
        assert!(!ctl.is_connected());
        assert!(!device.is_open());
        assert_eq!(ctl.current_colors()[0], LedColor::Off);
    }

    #[test]
    fn test_invalid_index_keeps_link() {
        let (ctl, _device) = controller();
        ctl.connect("sim0").unwrap();
        assert!(ctl.set_led_color(99, None).is_err());
        assert!(ctl.is_connected());
    }

    #[test]
    fn test_drop_disconnects() {
        let device = SimulatedDevice::new();
        {
            let ctl = PanelController::new(SimulatedConnector::new(device.clone()));
            ctl.connect("sim0").unwrap();
        }
        assert_eq!(device.mode(), Some(cmd::MODE_SWITCHING));
        assert!(!device.is_open());
    }
}
