//! Mutable per-device control state.

use crate::error::BladeError;

// =============================================================================
// PowerMode
// =============================================================================

/// Thermal/power profile of the laptop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerMode {
    #[default]
    Balanced,
    Gaming,
    /// Higher GPU power budget, only on some models.
    Creator,
    /// Manual boost levels; disables manual fan control.
    Custom,
}

impl PowerMode {
    /// Value sent to the controller.
    pub const fn value(&self) -> u8 {
        match self {
            PowerMode::Balanced => 0,
            PowerMode::Gaming => 1,
            PowerMode::Creator => 2,
            PowerMode::Custom => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PowerMode::Balanced => "Balanced",
            PowerMode::Gaming => "Gaming",
            PowerMode::Creator => "Creator",
            PowerMode::Custom => "Custom",
        }
    }
}

impl TryFrom<u8> for PowerMode {
    type Error = BladeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PowerMode::Balanced),
            1 => Ok(PowerMode::Gaming),
            2 => Ok(PowerMode::Creator),
            4 => Ok(PowerMode::Custom),
            _ => Err(BladeError::UnknownValue {
                what: "power mode",
                value,
            }),
        }
    }
}

impl std::fmt::Display for PowerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// DeviceState
// =============================================================================

/// What the driver last asked the controller for.
///
/// Lives inside the device session and is only changed with the session
/// lock held. If a sequence fails halfway the values may no longer match
/// the hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    product_id: u16,
    pub power_mode: PowerMode,
    /// Manual fan target in RPM, 0 when automatic or not known.
    pub fan_rpm: u16,
    /// Fans under manual control.
    pub manual_fan: bool,
    pub cpu_boost: u8,
    pub gpu_boost: u8,
}

impl DeviceState {
    pub fn new(product_id: u16) -> Self {
        Self {
            product_id,
            power_mode: PowerMode::Balanced,
            fan_rpm: 0,
            manual_fan: false,
            cpu_boost: 0,
            gpu_boost: 0,
        }
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    /// Return the fans to automatic control.
    pub fn clear_fan(&mut self) {
        self.fan_rpm = 0;
        self.manual_fan = false;
    }
}
