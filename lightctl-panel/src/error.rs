//! Panel interface error types

use lightctl_transport::TransportError;
use thiserror::Error;

/// Errors from panel operations
#[derive(Error, Debug)]
pub enum PanelError {
    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A value outside the defined state set reached the color model
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Operation needs an open link
    #[error("Not connected")]
    NotConnected,

    /// Connect called while a link is already open
    #[error("Already connected to {0}")]
    AlreadyConnected(String),
}
