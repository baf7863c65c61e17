//! Parsing utilities for CLI arguments and configuration values.
//!
//! This module provides reusable parsing functions for common input formats
//! used throughout the application.

use crate::device::PowerMode;
use crate::error::{BladeError, Result};
use crate::lighting::{EffectColors, LogoState, Rgb, StandardEffect};
use crate::protocol::KEYS_PER_ROW;

// =============================================================================
// Color Parsing
// =============================================================================

/// Parse a hex color string into RGB components.
///
/// Accepts formats: `#RRGGBB` or `RRGGBB`
///
/// # Example
/// ```
/// use razer_rust_devices::utils::parsing::parse_hex_color;
///
/// let color = parse_hex_color("#FF5500").unwrap();
/// assert_eq!((color.r, color.g, color.b), (255, 85, 0));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Rgb> {
    let digits = hex.trim_start_matches('#');
    let invalid = || BladeError::InvalidInput(format!("Invalid color hex: {}", hex));

    if digits.len() != 6 || !digits.is_ascii() {
        return Err(invalid());
    }

    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
    Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
}

/// Parse the colours of one keyboard row.
///
/// A single colour paints the whole row, otherwise exactly one colour per
/// key is required.
pub fn parse_row_colors<S: AsRef<str>>(colors: &[S]) -> Result<[Rgb; KEYS_PER_ROW]> {
    let parsed = colors
        .iter()
        .map(|c| parse_hex_color(c.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    match parsed.as_slice() {
        [single] => Ok([*single; KEYS_PER_ROW]),
        keys if keys.len() == KEYS_PER_ROW => {
            let mut row = [Rgb::BLACK; KEYS_PER_ROW];
            row.copy_from_slice(keys);
            Ok(row)
        }
        keys => Err(BladeError::InvalidInput(format!(
            "Expected 1 or {} colors, got {}",
            KEYS_PER_ROW,
            keys.len()
        ))),
    }
}

// =============================================================================
// Mode Parsing
// =============================================================================

/// Parse a power mode by name or controller value.
///
/// # Example
/// ```
/// use razer_rust_devices::device::PowerMode;
/// use razer_rust_devices::utils::parsing::parse_power_mode;
///
/// assert_eq!(parse_power_mode("gaming").unwrap(), PowerMode::Gaming);
/// assert_eq!(parse_power_mode("4").unwrap(), PowerMode::Custom);
/// ```
pub fn parse_power_mode(name: &str) -> Result<PowerMode> {
    match name.to_lowercase().as_str() {
        "balanced" | "0" => Ok(PowerMode::Balanced),
        "gaming" | "1" => Ok(PowerMode::Gaming),
        "creator" | "2" => Ok(PowerMode::Creator),
        "custom" | "4" => Ok(PowerMode::Custom),
        _ => Err(BladeError::InvalidInput(format!(
            "Unknown power mode '{}'. Use: balanced, gaming, creator or custom",
            name
        ))),
    }
}

pub fn parse_logo_state(name: &str) -> Result<LogoState> {
    match name.to_lowercase().as_str() {
        "off" | "0" => Ok(LogoState::Off),
        "on" | "static" | "1" => Ok(LogoState::Static),
        "breathing" | "2" => Ok(LogoState::Breathing),
        _ => Err(BladeError::InvalidInput(format!(
            "Unknown logo state '{}'. Use: off, static or breathing",
            name
        ))),
    }
}

/// Parse a product id written as `0x0253` or `0253`.
pub fn parse_product_id(value: &str) -> Result<u16> {
    let digits = value.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16)
        .map_err(|_| BladeError::InvalidInput(format!("Invalid product id: {}", value)))
}

// =============================================================================
// Effect Parsing
// =============================================================================

const EFFECT_NAMES: &str = "off, wave, reactive, breathing, spectrum, static, starlight";

/// Build a keyboard effect from its name and numeric parameters.
///
/// Breathing and starlight take a colour type first: `1` single colour,
/// `2` two colours, `3` random. Starlight follows it with a speed.
pub fn parse_effect(name: &str, params: &[u8]) -> Result<StandardEffect> {
    let name = name.to_lowercase();
    let wrong_params = |expected: &str| {
        BladeError::InvalidInput(format!(
            "Effect '{}' requires parameters: {}, got {:?}",
            name, expected, params
        ))
    };

    let effect = match (name.as_str(), params) {
        ("off", []) => StandardEffect::Off,
        ("spectrum", []) => StandardEffect::Spectrum,
        ("wave", [direction]) => StandardEffect::Wave {
            direction: *direction,
        },
        ("reactive", [speed, r, g, b]) => StandardEffect::Reactive {
            speed: *speed,
            color: Rgb::new(*r, *g, *b),
        },
        ("static", [r, g, b]) => StandardEffect::Static(Rgb::new(*r, *g, *b)),
        ("breathing", [kind, colors @ ..]) => StandardEffect::Breathing(
            effect_colors(*kind, colors).ok_or_else(|| wrong_params("<type> [r g b] [r g b]"))?,
        ),
        ("starlight", [kind, speed, colors @ ..]) => StandardEffect::Starlight {
            speed: *speed,
            colors: effect_colors(*kind, colors)
                .ok_or_else(|| wrong_params("<type> <speed> [r g b] [r g b]"))?,
        },
        ("off" | "spectrum", _) => return Err(wrong_params("none")),
        ("wave", _) => return Err(wrong_params("<direction>")),
        ("reactive", _) => return Err(wrong_params("<speed> <r> <g> <b>")),
        ("static", _) => return Err(wrong_params("<r> <g> <b>")),
        ("breathing", _) => return Err(wrong_params("<type> [r g b] [r g b]")),
        ("starlight", _) => return Err(wrong_params("<type> <speed> [r g b] [r g b]")),
        _ => {
            return Err(BladeError::InvalidInput(format!(
                "Unknown effect '{}'. Use: {}",
                name, EFFECT_NAMES
            )));
        }
    };

    Ok(effect)
}

fn effect_colors(kind: u8, colors: &[u8]) -> Option<EffectColors> {
    match (kind, colors) {
        (1, [r, g, b]) => Some(EffectColors::Single(Rgb::new(*r, *g, *b))),
        (2, [r1, g1, b1, r2, g2, b2]) => Some(EffectColors::Dual(
            Rgb::new(*r1, *g1, *b1),
            Rgb::new(*r2, *g2, *b2),
        )),
        (3, []) => Some(EffectColors::Random),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================
