//! Command definitions and builders for Razer Blade embedded controllers.
//!
//! Opcodes follow the vendor protocol used by Synapse and the openrazer
//! family of drivers.

use super::packet::Packet;

// =============================================================================
// Constants
// =============================================================================

/// Razer Vendor ID.
pub const RAZER_VID: u16 = 0x1532;

/// HID interface carrying the control endpoint.
pub const CONTROL_INTERFACE: i32 = 0;

/// Keyboard rows addressable by the matrix commands.
pub const MATRIX_ROWS: usize = 5;

/// Keys per matrix row.
pub const KEYS_PER_ROW: usize = 15;

/// Packed RGB bytes per matrix row.
pub const MATRIX_ROW_BYTES: usize = KEYS_PER_ROW * 3;

// =============================================================================
// Command Classes and IDs
// =============================================================================

/// Lighting and keyboard matrix.
pub const CLASS_LIGHTING: u8 = 0x03;
/// Battery management.
pub const CLASS_BATTERY: u8 = 0x07;
/// Fan, power mode and boost (embedded controller).
pub const CLASS_EC: u8 = 0x0d;

pub const CMD_SET_FAN_RPM: u8 = 0x01;
pub const CMD_SET_POWER_MODE: u8 = 0x02;
pub const CMD_SET_BOOST: u8 = 0x07;
pub const CMD_GET_POWER_MODE: u8 = 0x82;
pub const CMD_GET_BOOST: u8 = 0x87;

pub const CMD_SET_LED_STATE: u8 = 0x00;
pub const CMD_SET_LED_EFFECT: u8 = 0x02;
pub const CMD_SET_BRIGHTNESS: u8 = 0x03;
pub const CMD_SET_EFFECT: u8 = 0x0a;
pub const CMD_SET_MATRIX_ROW: u8 = 0x0b;
pub const CMD_GET_LED_STATE: u8 = 0x82;
pub const CMD_GET_BRIGHTNESS: u8 = 0x83;

pub const CMD_SET_BATTERY_HEALTH: u8 = 0x12;
pub const CMD_GET_BATTERY_HEALTH: u8 = 0x92;

// LED storage and ids
const VARSTORE: u8 = 0x01;
const NOSTORE: u8 = 0x00;
const LOGO_LED: u8 = 0x04;
const BACKLIGHT_LED: u8 = 0x05;

/// Effect id that displays the uploaded matrix frame.
pub const EFFECT_CUSTOM_FRAME: u8 = 0x05;

// =============================================================================
// Selectors
// =============================================================================

/// Fan zone selector (args[1] of power and fan commands).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanZone {
    /// First fan, also the zone power-mode reads are taken from.
    Primary,
    Secondary,
}

impl FanZone {
    pub const fn id(&self) -> u8 {
        match self {
            FanZone::Primary => 0x01,
            FanZone::Secondary => 0x02,
        }
    }
}

/// Boost cluster selector (args[1] of boost commands).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostCluster {
    Cpu,
    Gpu,
}

impl BoostCluster {
    pub const fn id(&self) -> u8 {
        match self {
            BoostCluster::Cpu => 0x01,
            BoostCluster::Gpu => 0x02,
        }
    }
}

impl std::fmt::Display for BoostCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoostCluster::Cpu => write!(f, "CPU"),
            BoostCluster::Gpu => write!(f, "GPU"),
        }
    }
}

// =============================================================================
// Command Builders
// =============================================================================

/// Read the power mode of a zone. The mode comes back in args[2].
pub fn get_power_mode(zone: FanZone) -> Packet {
    Packet::build_request(CLASS_EC, CMD_GET_POWER_MODE, 0x04).with_args(&[
        0x00,
        zone.id(),
        0x00,
        0x00,
    ])
}

/// Write the power mode of a zone.
///
/// `manual_fan` tells the controller a fixed fan speed follows.
pub fn set_power_mode(zone: FanZone, mode: u8, manual_fan: bool) -> Packet {
    Packet::build_request(CLASS_EC, CMD_SET_POWER_MODE, 0x04).with_args(&[
        0x00,
        zone.id(),
        mode,
        u8::from(manual_fan),
    ])
}

/// Write a fixed fan speed, in units of 100 RPM.
pub fn set_fan_rpm(zone: FanZone, units: u8) -> Packet {
    Packet::build_request(CLASS_EC, CMD_SET_FAN_RPM, 0x03)
        .with_args(&[0x00, zone.id(), units])
}

/// Read a boost level. The level comes back in args[2].
pub fn get_boost(cluster: BoostCluster) -> Packet {
    Packet::build_request(CLASS_EC, CMD_GET_BOOST, 0x03)
        .with_args(&[0x00, cluster.id(), 0x00])
}

pub fn set_boost(cluster: BoostCluster, level: u8) -> Packet {
    Packet::build_request(CLASS_EC, CMD_SET_BOOST, 0x03)
        .with_args(&[0x00, cluster.id(), level])
}

/// Upload one keyboard row.
///
/// Layout: `[0xff, row, start_col, end_col, 0, 0, 0, rgb...]`.
pub fn set_matrix_row(row: u8, colors: &[u8; MATRIX_ROW_BYTES]) -> Packet {
    let mut packet = Packet::build_request(CLASS_LIGHTING, CMD_SET_MATRIX_ROW, 0x34)
        .with_args(&[0xff, row, 0x00, 0x0f]);
    packet.args[7..7 + MATRIX_ROW_BYTES].copy_from_slice(colors);
    packet
}

/// Display the uploaded matrix frame.
pub fn display_custom_frame() -> Packet {
    Packet::build_request(CLASS_LIGHTING, CMD_SET_EFFECT, 0x02)
        .with_args(&[EFFECT_CUSTOM_FRAME, NOSTORE])
}

/// Start one of the built-in keyboard effects.
pub fn set_standard_effect(effect: u8, params: &[u8]) -> Packet {
    let mut packet =
        Packet::build_request(CLASS_LIGHTING, CMD_SET_EFFECT, 80).with_args(&[effect]);
    let len = params.len().min(packet.args.len() - 1);
    packet.args[1..1 + len].copy_from_slice(&params[..len]);
    packet
}

pub fn set_brightness(level: u8) -> Packet {
    Packet::build_request(CLASS_LIGHTING, CMD_SET_BRIGHTNESS, 0x03)
        .with_args(&[VARSTORE, BACKLIGHT_LED, level])
}

/// Read keyboard brightness. The level comes back in args[2].
pub fn get_brightness() -> Packet {
    Packet::build_request(CLASS_LIGHTING, CMD_GET_BRIGHTNESS, 0x03)
        .with_args(&[VARSTORE, BACKLIGHT_LED, 0x00])
}

/// Select the logo effect: static or breathing.
pub fn set_logo_effect(breathing: bool) -> Packet {
    let effect = if breathing { 0x02 } else { 0x00 };
    Packet::build_request(CLASS_LIGHTING, CMD_SET_LED_EFFECT, 0x03)
        .with_args(&[VARSTORE, LOGO_LED, effect])
}

pub fn set_logo_power(on: bool) -> Packet {
    Packet::build_request(CLASS_LIGHTING, CMD_SET_LED_STATE, 0x03)
        .with_args(&[VARSTORE, LOGO_LED, u8::from(on)])
}

/// Read logo power. On/off comes back in args[2].
pub fn get_logo_power() -> Packet {
    Packet::build_request(CLASS_LIGHTING, CMD_GET_LED_STATE, 0x03)
        .with_args(&[VARSTORE, LOGO_LED, 0x00])
}

/// Read the battery health optimizer byte. It comes back in args[0].
pub fn get_battery_health() -> Packet {
    Packet::build_request(CLASS_BATTERY, CMD_GET_BATTERY_HEALTH, 0x01)
}

pub fn set_battery_health(raw: u8) -> Packet {
    Packet::build_request(CLASS_BATTERY, CMD_SET_BATTERY_HEALTH, 0x01).with_args(&[raw])
}

/// Command id the firmware answers a request with.
///
/// Battery health writes come back tagged as reads.
pub const fn response_id(command_class: u8, command_id: u8) -> u8 {
    match (command_class, command_id) {
        (CLASS_BATTERY, CMD_SET_BATTERY_HEALTH) => CMD_GET_BATTERY_HEALTH,
        _ => command_id,
    }
}

/// Decode the battery health byte: top bit is on/off, the rest the threshold.
pub fn decode_battery_health(raw: u8) -> (bool, u8) {
    (raw & 0x80 != 0, raw & 0x7f)
}

pub fn encode_battery_health(enabled: bool, threshold: u8) -> u8 {
    let threshold = threshold & 0x7f;
    if enabled { threshold | 0x80 } else { threshold }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_ids() {
        assert_eq!(FanZone::Primary.id(), 0x01);
        assert_eq!(FanZone::Secondary.id(), 0x02);
        assert_eq!(BoostCluster::Cpu.id(), 0x01);
        assert_eq!(BoostCluster::Gpu.id(), 0x02);
    }

    #[test]
    fn test_set_power_mode_cmd() {
        let packet = set_power_mode(FanZone::Primary, 0x01, true);
        assert_eq!(packet.command_class, 0x0d);
        assert_eq!(packet.command_id, 0x02);
        assert_eq!(packet.data_size, 0x04);
        assert_eq!(packet.payload(), &[0x00, 0x01, 0x01, 0x01]);
        assert!(packet.args[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_fan_and_boost_cmds() {
        let fan = set_fan_rpm(FanZone::Secondary, 45);
        assert_eq!((fan.command_class, fan.command_id), (0x0d, 0x01));
        assert_eq!(fan.payload(), &[0x00, 0x02, 45]);

        let boost = get_boost(BoostCluster::Gpu);
        assert_eq!((boost.command_class, boost.command_id), (0x0d, 0x87));
        assert_eq!(boost.payload(), &[0x00, 0x02, 0x00]);
    }

    #[test]
    fn test_matrix_row_cmd() {
        let mut colors = [0u8; MATRIX_ROW_BYTES];
        colors[0] = 0xAA;
        colors[MATRIX_ROW_BYTES - 1] = 0xBB;

        let packet = set_matrix_row(3, &colors);
        assert_eq!(packet.command_class, 0x03);
        assert_eq!(packet.command_id, 0x0b);
        assert_eq!(packet.data_size, 0x34);
        assert_eq!(&packet.args[..4], &[0xff, 0x03, 0x00, 0x0f]);
        assert_eq!(&packet.args[4..7], &[0, 0, 0]);
        assert_eq!(packet.args[7], 0xAA);
        assert_eq!(packet.args[7 + MATRIX_ROW_BYTES - 1], 0xBB);
        assert!(packet.args[7 + MATRIX_ROW_BYTES..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_standard_effect_params() {
        let packet = set_standard_effect(0x06, &[0x01, 0xff, 0x00, 0x00]);
        assert_eq!(packet.data_size, 80);
        assert_eq!(&packet.args[..5], &[0x06, 0x01, 0xff, 0x00, 0x00]);

        // Oversized params are truncated to the argument buffer
        let long = [0x11u8; 100];
        let packet = set_standard_effect(0x01, &long);
        assert_eq!(packet.args[0], 0x01);
        assert!(packet.args[1..].iter().all(|&b| b == 0x11));
    }

    #[test]
    fn test_response_id() {
        assert_eq!(
            response_id(CLASS_BATTERY, CMD_SET_BATTERY_HEALTH),
            CMD_GET_BATTERY_HEALTH
        );
        assert_eq!(
            response_id(CLASS_BATTERY, CMD_GET_BATTERY_HEALTH),
            CMD_GET_BATTERY_HEALTH
        );
        assert_eq!(response_id(CLASS_EC, CMD_SET_BOOST), CMD_SET_BOOST);
        // Same id in another class is not remapped
        assert_eq!(response_id(CLASS_EC, 0x12), 0x12);
    }

    #[test]
    fn test_battery_health_byte() {
        assert_eq!(encode_battery_health(true, 80), 0xD0);
        assert_eq!(encode_battery_health(false, 80), 0x50);
        assert_eq!(decode_battery_health(0xD0), (true, 80));
        assert_eq!(decode_battery_health(0x3C), (false, 60));
    }
}
