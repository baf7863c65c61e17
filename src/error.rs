//! Custom error types for Razer Blade devices.
//!
//! Transport-level failures are kept apart from driver-level errors so a
//! caller can tell a flaky USB exchange from a request the driver refused.

use thiserror::Error;

/// Failures of a single request/response exchange with the embedded controller.
#[derive(Error, Debug)]
pub enum TransportError {
    /// HID communication error.
    #[error("HID communication error: {0}")]
    Hid(#[from] hidapi::HidError),

    /// Timeout waiting for the controller to leave the busy state.
    #[error("Timeout waiting for device response")]
    Timeout,

    /// The device returned fewer bytes than a full report.
    #[error("Short read: got {actual} bytes, expected {expected}")]
    ShortRead { expected: usize, actual: usize },

    /// The response does not belong to the request that was sent.
    #[error(
        "Response mismatch: sent {sent_class:#04x}/{sent_id:#04x}, got {got_class:#04x}/{got_id:#04x}"
    )]
    ResponseMismatch {
        sent_class: u8,
        sent_id: u8,
        got_class: u8,
        got_id: u8,
    },

    /// The firmware answered with a failure status.
    #[error("Command {class:#04x}/{id:#04x} rejected by firmware (status {status:#04x})")]
    Rejected { class: u8, id: u8, status: u8 },
}

/// Main error type for Razer laptop operations.
#[derive(Error, Debug)]
pub enum BladeError {
    /// A request/response exchange failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Response length does not match the fixed report size.
    #[error("Malformed response: {actual} bytes, expected {expected}")]
    MalformedResponse { expected: usize, actual: usize },

    /// Lighting row index outside the keyboard matrix.
    #[error("Row {index} out of range (matrix has {len} rows)")]
    IndexOutOfRange { index: usize, len: usize },

    /// No supported laptop found during enumeration.
    #[error("No supported Razer laptop found. Check USB permissions (udev rules).")]
    DeviceNotFound,

    /// HID API could not be initialised or a device could not be opened.
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    /// Device reported a value the driver does not know.
    #[error("Unknown {what} value {value:#04x}")]
    UnknownValue { what: &'static str, value: u8 },

    /// Feature not available on this model.
    #[error("{0} is not supported on this model")]
    Unsupported(&'static str),

    /// Generic invalid input error.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration file could not be read or written.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for Razer laptop operations.
pub type Result<T> = std::result::Result<T, BladeError>;
