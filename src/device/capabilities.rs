//! Per-model capability and safety limits.
//!
//! The controller accepts fan speeds well above what the hardware tolerates,
//! so every model carries the upper bound observed with Synapse. Unknown
//! models fall back to the most conservative profile.

// =============================================================================
// Limits
// =============================================================================

/// Lowest manual fan speed accepted on any model.
pub const ABSOLUTE_MIN_FAN_RPM: u16 = 3500;

/// Max fan speed for models without a dedicated entry.
pub const MAX_FAN_RPM_DEFAULT: u16 = 5000;

/// Max fan speed for the 2018 Blade 15.
pub const MAX_FAN_RPM_2018_BLADE: u16 = 5300;

/// Max fan speed for the 2019+ Blade 15 / Pro / Stealth chassis.
pub const MAX_FAN_RPM_2019_BLADE: u16 = 5400;

// =============================================================================
// Product IDs
// =============================================================================

pub const BLADE_2018_ADV: u16 = 0x0233;
pub const BLADE_2018_BASE: u16 = 0x023B;
pub const BLADE_2018_MERC: u16 = 0x0240;
pub const BLADE_PRO_2019: u16 = 0x0234;
pub const BLADE_2019_STEALTH: u16 = 0x0239;
pub const BLADE_2019_ADV: u16 = 0x023A;
pub const BLADE_2019_MERC: u16 = 0x0245;
pub const BLADE_2019_BASE: u16 = 0x0246;
pub const BLADE_2020_ADV: u16 = 0x0253;
pub const BLADE_2020_BASE: u16 = 0x0255;

// =============================================================================
// Capability Profile
// =============================================================================

/// Safety limits and feature flags for one laptop model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityProfile {
    pub name: &'static str,
    pub max_fan_rpm: u16,
    pub min_fan_rpm: u16,
    pub creator_mode_allowed: bool,
    pub boost_mode_allowed: bool,
    /// Battery health optimizer (charge limit).
    pub battery_health_allowed: bool,
}

impl CapabilityProfile {
    /// Profile used for product ids missing from the table.
    pub const CONSERVATIVE: Self = Self {
        name: "Unknown Razer laptop",
        max_fan_rpm: MAX_FAN_RPM_DEFAULT,
        min_fan_rpm: ABSOLUTE_MIN_FAN_RPM,
        creator_mode_allowed: false,
        boost_mode_allowed: false,
        battery_health_allowed: false,
    };

    const fn model(
        name: &'static str,
        max_fan_rpm: u16,
        creator_mode_allowed: bool,
        boost_mode_allowed: bool,
        battery_health_allowed: bool,
    ) -> Self {
        Self {
            name,
            max_fan_rpm,
            min_fan_rpm: ABSOLUTE_MIN_FAN_RPM,
            creator_mode_allowed,
            boost_mode_allowed,
            battery_health_allowed,
        }
    }

    /// Clamp a requested RPM into this model's range.
    ///
    /// Returns the value in controller units (RPM / 100). Out-of-range
    /// requests are pinned to the nearest bound, never rejected.
    pub fn clamp_fan_rpm(&self, rpm: u16) -> u8 {
        let min = self.min_fan_rpm.max(ABSOLUTE_MIN_FAN_RPM);
        (rpm.clamp(min, self.max_fan_rpm.max(min)) / 100) as u8
    }
}

impl Default for CapabilityProfile {
    fn default() -> Self {
        Self::CONSERVATIVE
    }
}

/// Static capability table keyed by product id.
static CAPABILITY_TABLE: &[(u16, CapabilityProfile)] = &[
    (
        BLADE_2018_ADV,
        CapabilityProfile::model(
            "Blade 15 Advanced (2018)",
            MAX_FAN_RPM_2018_BLADE,
            false,
            false,
            false,
        ),
    ),
    (
        BLADE_2018_BASE,
        CapabilityProfile::model(
            "Blade 15 Base (2018)",
            MAX_FAN_RPM_2018_BLADE,
            false,
            false,
            false,
        ),
    ),
    (
        BLADE_2018_MERC,
        CapabilityProfile::model(
            "Blade 15 Mercury (2018)",
            MAX_FAN_RPM_DEFAULT,
            false,
            false,
            false,
        ),
    ),
    (
        BLADE_PRO_2019,
        CapabilityProfile::model(
            "Blade Pro 17 (2019)",
            MAX_FAN_RPM_2019_BLADE,
            false,
            false,
            false,
        ),
    ),
    (
        BLADE_2019_STEALTH,
        CapabilityProfile::model(
            "Blade Stealth (2019)",
            MAX_FAN_RPM_2019_BLADE,
            false,
            false,
            false,
        ),
    ),
    (
        BLADE_2019_ADV,
        CapabilityProfile::model(
            "Blade 15 Advanced (2019)",
            MAX_FAN_RPM_2019_BLADE,
            true,
            false,
            false,
        ),
    ),
    (
        BLADE_2019_MERC,
        CapabilityProfile::model(
            "Blade 15 Mercury (2019)",
            MAX_FAN_RPM_2019_BLADE,
            true,
            false,
            false,
        ),
    ),
    (
        BLADE_2019_BASE,
        CapabilityProfile::model("Blade 15 Base (2019)", MAX_FAN_RPM_DEFAULT, false, false, false),
    ),
    (
        BLADE_2020_ADV,
        CapabilityProfile::model(
            "Blade 15 Advanced (2020)",
            MAX_FAN_RPM_2019_BLADE,
            true,
            true,
            true,
        ),
    ),
    (
        BLADE_2020_BASE,
        CapabilityProfile::model("Blade 15 Base (2020)", MAX_FAN_RPM_DEFAULT, false, false, true),
    ),
];

/// Look up the capability profile of a product id.
///
/// Total: unknown ids get [`CapabilityProfile::CONSERVATIVE`].
pub fn capabilities_for(product_id: u16) -> CapabilityProfile {
    CAPABILITY_TABLE
        .iter()
        .find(|(pid, _)| *pid == product_id)
        .map(|(_, profile)| *profile)
        .unwrap_or(CapabilityProfile::CONSERVATIVE)
}

/// Product ids with a table entry.
pub fn supported_product_ids() -> impl Iterator<Item = u16> {
    CAPABILITY_TABLE.iter().map(|(pid, _)| *pid)
}

/// Whether a product id has a table entry.
pub fn is_supported(product_id: u16) -> bool {
    CAPABILITY_TABLE.iter().any(|(pid, _)| *pid == product_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_pid_is_conservative() {
        let profile = capabilities_for(0xBEEF);
        assert_eq!(profile, CapabilityProfile::CONSERVATIVE);
        assert!(!profile.creator_mode_allowed);
        assert!(!profile.boost_mode_allowed);
        assert!(!is_supported(0xBEEF));

        // Conservative default has the lowest max RPM in the table
        for pid in supported_product_ids() {
            assert!(capabilities_for(pid).max_fan_rpm >= profile.max_fan_rpm);
        }
    }

    #[test]
    fn test_known_models() {
        let blade_2018 = capabilities_for(BLADE_2018_ADV);
        assert_eq!(blade_2018.max_fan_rpm, MAX_FAN_RPM_2018_BLADE);
        assert!(!blade_2018.creator_mode_allowed);

        let blade_2019 = capabilities_for(BLADE_2019_ADV);
        assert!(blade_2019.creator_mode_allowed);
        assert!(!blade_2019.boost_mode_allowed);

        let blade_2020 = capabilities_for(BLADE_2020_ADV);
        assert!(blade_2020.creator_mode_allowed);
        assert!(blade_2020.boost_mode_allowed);
    }

    #[test]
    fn test_clamp_fan_rpm() {
        let profile = capabilities_for(BLADE_2018_ADV);

        // Within range: truncated to hundreds
        assert_eq!(profile.clamp_fan_rpm(4250), 42);
        // Above max pinned to max
        assert_eq!(profile.clamp_fan_rpm(9000), (MAX_FAN_RPM_2018_BLADE / 100) as u8);
        // Below min pinned to min
        assert_eq!(profile.clamp_fan_rpm(100), (ABSOLUTE_MIN_FAN_RPM / 100) as u8);
        assert_eq!(profile.clamp_fan_rpm(1), 35);
    }

    #[test]
    fn test_clamp_stays_in_bounds_for_every_model() {
        let profiles = supported_product_ids()
            .map(capabilities_for)
            .chain(std::iter::once(CapabilityProfile::CONSERVATIVE));

        for profile in profiles {
            let lo = (ABSOLUTE_MIN_FAN_RPM / 100) as u8;
            let hi = (profile.max_fan_rpm / 100) as u8;
            for rpm in (0..=10_000u16).step_by(50) {
                let units = profile.clamp_fan_rpm(rpm);
                assert!(units >= lo && units <= hi, "{} -> {}", rpm, units);
                if rpm > profile.max_fan_rpm {
                    assert_eq!(units, hi);
                }
                if rpm < ABSOLUTE_MIN_FAN_RPM {
                    assert_eq!(units, lo);
                }
            }
        }
    }
}
