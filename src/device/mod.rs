//! Device abstraction layer for Razer Blade laptops.
//!
//! Provides the per-model capability table and the power/fan state machine.

pub mod capabilities;
pub mod laptop;
pub mod state;

pub use capabilities::{CapabilityProfile, capabilities_for};
pub use laptop::{BatteryHealth, BladeLaptop};
pub use state::{DeviceState, PowerMode};
