//! Keyboard backlight and logo lighting.

pub mod driver;
pub mod matrix;

pub use driver::{EffectColors, KeyboardLighting, LogoState, StandardEffect};
pub use matrix::{ColorMatrix, Rgb};
