//! Keyboard and logo lighting driver.
//!
//! Commands go through the same [`Session`] as power and fan control, so a
//! frame upload never interleaves with an EC sequence.

use tracing::{debug, info};

use super::matrix::{ColorMatrix, Rgb};
use crate::error::Result;
use crate::protocol::{self, KEYS_PER_ROW, MATRIX_ROWS};
use crate::transport::{Session, Transport};

// =============================================================================
// Effects
// =============================================================================

const EFFECT_OFF: u8 = 0x00;
const EFFECT_WAVE: u8 = 0x01;
const EFFECT_REACTIVE: u8 = 0x02;
const EFFECT_BREATHING: u8 = 0x03;
const EFFECT_SPECTRUM: u8 = 0x04;
const EFFECT_STATIC: u8 = 0x06;
const EFFECT_STARLIGHT: u8 = 0x19;

/// Colour choice of the breathing and starlight effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectColors {
    Single(Rgb),
    Dual(Rgb, Rgb),
    Random,
}

impl EffectColors {
    fn params(&self) -> Vec<u8> {
        match self {
            EffectColors::Single(c) => vec![0x01, c.r, c.g, c.b],
            EffectColors::Dual(a, b) => vec![0x02, a.r, a.g, a.b, b.r, b.g, b.b],
            EffectColors::Random => vec![0x03],
        }
    }
}

/// Built-in keyboard effects run by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardEffect {
    Off,
    /// Direction 1 or 2.
    Wave { direction: u8 },
    Reactive { speed: u8, color: Rgb },
    Breathing(EffectColors),
    Spectrum,
    Static(Rgb),
    Starlight { speed: u8, colors: EffectColors },
}

impl StandardEffect {
    /// Effect id and argument bytes.
    pub fn encode(&self) -> (u8, Vec<u8>) {
        match self {
            StandardEffect::Off => (EFFECT_OFF, Vec::new()),
            StandardEffect::Wave { direction } => (EFFECT_WAVE, vec![*direction]),
            StandardEffect::Reactive { speed, color } => {
                (EFFECT_REACTIVE, vec![*speed, color.r, color.g, color.b])
            }
            StandardEffect::Breathing(colors) => (EFFECT_BREATHING, colors.params()),
            StandardEffect::Spectrum => (EFFECT_SPECTRUM, Vec::new()),
            StandardEffect::Static(color) => (EFFECT_STATIC, vec![color.r, color.g, color.b]),
            StandardEffect::Starlight { speed, colors } => {
                let mut params = colors.params();
                params.insert(1, *speed);
                (EFFECT_STARLIGHT, params)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StandardEffect::Off => "off",
            StandardEffect::Wave { .. } => "wave",
            StandardEffect::Reactive { .. } => "reactive",
            StandardEffect::Breathing(_) => "breathing",
            StandardEffect::Spectrum => "spectrum",
            StandardEffect::Static(_) => "static",
            StandardEffect::Starlight { .. } => "starlight",
        }
    }
}

/// Logo LED mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoState {
    Off,
    Static,
    Breathing,
}

// =============================================================================
// KeyboardLighting
// =============================================================================

/// Per-key colour driver for one keyboard.
///
/// Owns its colour buffer. Rows are edited locally and sent with
/// [`KeyboardLighting::flush`].
#[derive(Debug, Clone, Default)]
pub struct KeyboardLighting {
    matrix: ColorMatrix,
}

impl KeyboardLighting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matrix(&self) -> &ColorMatrix {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut ColorMatrix {
        &mut self.matrix
    }

    /// Replace one row of the buffer.
    pub fn set_row(&mut self, row: usize, colors: [Rgb; KEYS_PER_ROW]) -> Result<()> {
        self.matrix.set_row(row, colors)
    }

    /// Upload every row and display the frame.
    ///
    /// Sends one packet per row followed by the display command, all under
    /// one session lock.
    pub fn flush<T: Transport, S>(&self, session: &Session<T, S>) -> Result<()> {
        let mut guard = session.lock();

        for row in 0..MATRIX_ROWS {
            let bytes = self.matrix.row_bytes(row)?;
            guard.transact(&protocol::set_matrix_row(row as u8, &bytes))?;
        }
        guard.transact(&protocol::display_custom_frame())?;

        debug!("Keyboard frame flushed");
        Ok(())
    }

    pub fn set_brightness<T: Transport, S>(
        &self,
        session: &Session<T, S>,
        level: u8,
    ) -> Result<()> {
        session.transact(&protocol::set_brightness(level))?;
        info!("Keyboard brightness set to {}", level);
        Ok(())
    }

    pub fn get_brightness<T: Transport, S>(&self, session: &Session<T, S>) -> Result<u8> {
        Ok(session.transact(&protocol::get_brightness())?.args[2])
    }

    /// Switch the logo LED.
    ///
    /// A lit state first selects the effect, then powers the LED.
    pub fn set_logo_state<T: Transport, S>(
        &self,
        session: &Session<T, S>,
        state: LogoState,
    ) -> Result<()> {
        let mut guard = session.lock();

        match state {
            LogoState::Off => {
                guard.transact(&protocol::set_logo_power(false))?;
            }
            LogoState::Static | LogoState::Breathing => {
                guard.transact(&protocol::set_logo_effect(state == LogoState::Breathing))?;
                guard.transact(&protocol::set_logo_power(true))?;
            }
        }

        info!("Logo set to {:?}", state);
        Ok(())
    }

    /// Whether the logo LED is lit.
    pub fn get_logo_state<T: Transport, S>(&self, session: &Session<T, S>) -> Result<bool> {
        Ok(session.transact(&protocol::get_logo_power())?.args[2] != 0)
    }

    /// Run a built-in effect. Replaces any displayed custom frame.
    pub fn set_effect<T: Transport, S>(
        &self,
        session: &Session<T, S>,
        effect: StandardEffect,
    ) -> Result<()> {
        let (id, params) = effect.encode();
        session.transact(&protocol::set_standard_effect(id, &params))?;
        info!("Keyboard effect set to {}", effect.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BladeError;
    use crate::protocol::{
        CLASS_LIGHTING, CMD_SET_EFFECT, CMD_SET_LED_EFFECT, CMD_SET_LED_STATE, CMD_SET_MATRIX_ROW,
        EFFECT_CUSTOM_FRAME,
    };
    use crate::transport::mock::MockTransport;

    #[test]
    fn test_flush_sends_each_row_then_frame() {
        let (transport, handle) = MockTransport::new();
        let session = Session::new(transport, ());

        let mut lighting = KeyboardLighting::new();
        lighting.matrix_mut().fill(Rgb::new(0x10, 0x20, 0x30));
        lighting
            .set_row(4, [Rgb::new(0xff, 0, 0); KEYS_PER_ROW])
            .unwrap();
        lighting.flush(&session).unwrap();

        let requests = handle.requests();
        assert_eq!(requests.len(), MATRIX_ROWS + 1);
        for (row, packet) in requests[..MATRIX_ROWS].iter().enumerate() {
            assert_eq!(packet.command_class, CLASS_LIGHTING);
            assert_eq!(packet.command_id, CMD_SET_MATRIX_ROW);
            assert_eq!(packet.data_size, 0x34);
            assert_eq!(&packet.args[..4], &[0xff, row as u8, 0x00, 0x0f]);
        }

        let frame = &requests[MATRIX_ROWS];
        assert_eq!(frame.command_id, CMD_SET_EFFECT);
        assert_eq!(&frame.args[..2], &[EFFECT_CUSTOM_FRAME, 0x00]);

        let shared = handle.lock();
        let ec = &shared.ec;
        assert_eq!(&ec.rows[0].1[..3], &[0x10, 0x20, 0x30]);
        assert_eq!(ec.rows[4].0, 4);
        assert_eq!(&ec.rows[4].1[42..], &[0xff, 0, 0]);
    }

    #[test]
    fn test_set_row_out_of_range_sends_nothing() {
        let (transport, handle) = MockTransport::new();
        let session = Session::new(transport, ());
        let mut lighting = KeyboardLighting::new();

        let result = lighting.set_row(5, [Rgb::BLACK; KEYS_PER_ROW]);
        assert!(matches!(result, Err(BladeError::IndexOutOfRange { index: 5, .. })));
        assert!(handle.requests().is_empty());

        lighting.flush(&session).unwrap();
        assert_eq!(handle.requests().len(), MATRIX_ROWS + 1);
    }

    #[test]
    fn test_brightness() {
        let (transport, handle) = MockTransport::new();
        let session = Session::new(transport, ());
        let lighting = KeyboardLighting::new();

        lighting.set_brightness(&session, 128).unwrap();
        assert_eq!(handle.lock().ec.brightness, 128);
        assert_eq!(lighting.get_brightness(&session).unwrap(), 128);
        assert_eq!(handle.requests().len(), 2);
    }

    #[test]
    fn test_logo_state() {
        let (transport, handle) = MockTransport::new();
        let session = Session::new(transport, ());
        let lighting = KeyboardLighting::new();

        lighting.set_logo_state(&session, LogoState::Breathing).unwrap();
        let requests = handle.requests();
        assert_eq!(requests[0].command_id, CMD_SET_LED_EFFECT);
        assert_eq!(requests[0].args[2], 0x02);
        assert_eq!(requests[1].command_id, CMD_SET_LED_STATE);
        assert!(lighting.get_logo_state(&session).unwrap());

        handle.clear();
        lighting.set_logo_state(&session, LogoState::Off).unwrap();
        assert_eq!(handle.requests().len(), 1);
        assert!(!lighting.get_logo_state(&session).unwrap());
    }

    #[test]
    fn test_effect_encoding() {
        let red = Rgb::new(0xff, 0, 0);
        let blue = Rgb::new(0, 0, 0xff);

        assert_eq!(StandardEffect::Off.encode(), (0x00, vec![]));
        assert_eq!(StandardEffect::Wave { direction: 2 }.encode(), (0x01, vec![2]));
        assert_eq!(
            StandardEffect::Breathing(EffectColors::Dual(red, blue)).encode(),
            (0x03, vec![2, 0xff, 0, 0, 0, 0, 0xff])
        );
        assert_eq!(
            StandardEffect::Starlight {
                speed: 2,
                colors: EffectColors::Single(blue)
            }
            .encode(),
            (0x19, vec![1, 2, 0, 0, 0xff])
        );
        assert_eq!(
            StandardEffect::Starlight {
                speed: 1,
                colors: EffectColors::Random
            }
            .encode(),
            (0x19, vec![3, 1])
        );
    }

    #[test]
    fn test_set_effect_packet() {
        let (transport, handle) = MockTransport::new();
        let session = Session::new(transport, ());
        let lighting = KeyboardLighting::new();

        lighting
            .set_effect(&session, StandardEffect::Static(Rgb::new(1, 2, 3)))
            .unwrap();

        let packet = &handle.requests()[0];
        assert_eq!(packet.command_id, CMD_SET_EFFECT);
        assert_eq!(packet.data_size, 80);
        assert_eq!(&packet.args[..4], &[0x06, 1, 2, 3]);
    }
}
