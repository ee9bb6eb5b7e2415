//! High-level interface for the bicolor LED controller
//!
//! This crate provides the operator-facing API (connect, set LED colors,
//! select modes) on top of the echo-verified transport in
//! `lightctl-transport`.

pub mod color;
pub mod controller;
pub mod error;
pub mod mode;

pub use color::{
    colors_to_channels, format_panel, parse_panel, LedColor, PanelColors, ALL_OFF,
};
pub use controller::PanelController;
pub use error::PanelError;
pub use mode::{Mode, ModeControl};

pub use lightctl_transport::LED_COUNT;
