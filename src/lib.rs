//! Razer Rust Devices Library
//!
//! A Rust driver for the embedded controller of Razer Blade laptops.
//!
//! # Features
//!
//! - Switch power modes (Balanced, Gaming, Creator, Custom)
//! - Set manual fan speeds within per-model safety limits
//! - Control CPU/GPU boost levels in Custom mode
//! - Drive the per-key keyboard matrix, effects and logo LED
//! - Battery health optimizer on supported models
//!
//! # Example
//!
//! ```no_run
//! use razer_rust_devices::device::{BladeLaptop, PowerMode};
//! use razer_rust_devices::lighting::{KeyboardLighting, Rgb};
//! use razer_rust_devices::transport::HidTiming;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Open the first supported laptop
//!     let laptop = BladeLaptop::open(None, HidTiming::default())?;
//!     println!("Connected: {}", laptop.capabilities().name);
//!
//!     // Gaming mode with a fixed fan speed
//!     laptop.set_power_mode(PowerMode::Gaming)?;
//!     laptop.set_fan_rpm(4500)?;
//!
//!     // Paint the keyboard red
//!     let mut lighting = KeyboardLighting::new();
//!     lighting.matrix_mut().fill(Rgb::new(255, 0, 0));
//!     lighting.flush(laptop.session())?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod lighting;
pub mod protocol;
pub mod transport;
pub mod utils;

// Re-exports for convenience
pub use device::{BladeLaptop, PowerMode};
pub use error::{BladeError, Result};
pub use lighting::KeyboardLighting;
