//! Razer Blade laptop control.
//!
//! High-level interface for power mode, fan speed, boost and battery
//! settings. Every operation holds the device session for its whole
//! command sequence, so concurrent callers never interleave packets.

use tracing::{debug, info, warn};

use super::capabilities::{CapabilityProfile, capabilities_for};
use super::state::{DeviceState, PowerMode};
use crate::error::{BladeError, Result};
use crate::protocol::{self, BoostCluster, FanZone};
use crate::transport::{HidTiming, HidTransport, Session, SessionGuard, Transport};

// =============================================================================
// Constants
// =============================================================================

/// Highest boost level the controller knows.
pub const MAX_BOOST_LEVEL: u8 = 3;

/// Charge limit range of the battery health optimizer, in percent.
pub const BATTERY_THRESHOLD_MIN: u8 = 50;
pub const BATTERY_THRESHOLD_MAX: u8 = 80;

// =============================================================================
// BatteryHealth
// =============================================================================

/// Battery health optimizer setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryHealth {
    pub enabled: bool,
    /// Charge limit in percent.
    pub threshold: u8,
}

impl std::fmt::Display for BatteryHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.enabled {
            write!(f, "On (limit {}%)", self.threshold)
        } else {
            write!(f, "Off")
        }
    }
}

// =============================================================================
// BladeLaptop
// =============================================================================

/// Razer Blade laptop handle.
///
/// # Example
///
/// ```no_run
/// use razer_rust_devices::device::{BladeLaptop, PowerMode};
/// use razer_rust_devices::transport::HidTiming;
///
/// let laptop = BladeLaptop::open(None, HidTiming::default())?;
/// println!("{}", laptop.capabilities().name);
///
/// laptop.set_power_mode(PowerMode::Gaming)?;
/// laptop.set_fan_rpm(4200)?;
/// # Ok::<(), razer_rust_devices::error::BladeError>(())
/// ```
pub struct BladeLaptop<T: Transport> {
    session: Session<T, DeviceState>,
    capabilities: CapabilityProfile,
}

impl BladeLaptop<HidTransport> {
    /// Open a laptop over HID.
    ///
    /// # Errors
    /// Returns `DeviceNotFound` if no supported laptop is connected.
    pub fn open(product_id: Option<u16>, timing: HidTiming) -> Result<Self> {
        let (transport, product_id) = HidTransport::open(product_id, timing)?;
        Ok(Self::attach(transport, product_id))
    }
}

impl<T: Transport> BladeLaptop<T> {
    /// Bind a transport to a product id.
    ///
    /// The capability profile is fixed here for the life of the handle.
    pub fn attach(transport: T, product_id: u16) -> Self {
        let capabilities = capabilities_for(product_id);
        debug!("Attached {} ({:#06x})", capabilities.name, product_id);

        Self {
            session: Session::new(transport, DeviceState::new(product_id)),
            capabilities,
        }
    }

    pub fn product_id(&self) -> u16 {
        self.session.lock().state().product_id()
    }

    pub fn capabilities(&self) -> &CapabilityProfile {
        &self.capabilities
    }

    /// Session shared with other drivers of the same device.
    pub fn session(&self) -> &Session<T, DeviceState> {
        &self.session
    }

    /// Snapshot of the stored control state.
    pub fn state(&self) -> DeviceState {
        self.session.lock().state().clone()
    }

    // =========================================================================
    // Fan
    // =========================================================================

    /// Set a fixed fan speed, or `0` to return to automatic control.
    ///
    /// Does nothing while in Custom mode, which owns the fans. Speeds are
    /// pinned into the model's safe range.
    ///
    /// # Returns
    /// The stored target in RPM.
    pub fn set_fan_rpm(&self, rpm: u16) -> Result<u16> {
        let mut guard = self.session.lock();
        let mode = guard.state().power_mode;

        if mode.value() >= PowerMode::Custom.value() {
            debug!("Fan control ignored in {} mode", mode);
            return Ok(guard.state().fan_rpm);
        }

        if rpm == 0 {
            guard.state_mut().clear_fan();
            for zone in [FanZone::Primary, FanZone::Secondary] {
                guard.transact(&protocol::set_power_mode(zone, mode.value(), false))?;
            }
            info!("Fan control set to automatic");
            return Ok(0);
        }

        let units = self.capabilities.clamp_fan_rpm(rpm);
        let applied = u16::from(units) * 100;
        if applied / 100 != rpm / 100 {
            debug!("Fan speed {} RPM pinned to {} RPM", rpm, applied);
        }
        guard.state_mut().fan_rpm = applied;
        guard.state_mut().manual_fan = true;

        for zone in [FanZone::Primary, FanZone::Secondary] {
            guard.transact(&protocol::get_power_mode(zone))?;
            guard.transact(&protocol::set_power_mode(zone, mode.value(), true))?;
            guard.transact(&protocol::set_fan_rpm(zone, units))?;
        }

        info!("Fan speed set to {} RPM", applied);
        Ok(applied)
    }

    /// Stored fan target in RPM, `0` when automatic.
    pub fn get_fan_rpm(&self) -> u16 {
        self.session.lock().state().fan_rpm
    }

    // =========================================================================
    // Power Mode
    // =========================================================================

    /// Switch the power mode.
    ///
    /// Creator mode falls back to Gaming on models without it. Entering
    /// Custom mode pushes the stored boost levels and drops manual fan
    /// control.
    ///
    /// # Returns
    /// The mode actually applied.
    pub fn set_power_mode(&self, mode: PowerMode) -> Result<PowerMode> {
        let mode = if mode == PowerMode::Creator && !self.capabilities.creator_mode_allowed {
            warn!("Creator mode not available on {}, using Gaming", self.capabilities.name);
            PowerMode::Gaming
        } else {
            mode
        };

        let mut guard = self.session.lock();
        guard.state_mut().power_mode = mode;

        if mode == PowerMode::Custom {
            guard.state_mut().clear_fan();
            apply_custom_mode(&mut guard)?;
        } else {
            let manual_fan = guard.state().manual_fan;
            guard.transact(&protocol::set_power_mode(FanZone::Primary, mode.value(), manual_fan))?;
        }

        info!("Power mode set to {}", mode);
        Ok(mode)
    }

    /// Read the power mode from the controller.
    ///
    /// The stored state is left untouched.
    pub fn get_power_mode(&self) -> Result<PowerMode> {
        let mut guard = self.session.lock();
        read_power_mode(&mut guard)
    }

    /// Read the power mode and adopt it as the stored mode.
    ///
    /// Useful right after attaching, since the stored state starts out as
    /// Balanced whatever the firmware is running.
    pub fn refresh_power_mode(&self) -> Result<PowerMode> {
        let mut guard = self.session.lock();
        let mode = read_power_mode(&mut guard)?;
        guard.state_mut().power_mode = mode;
        Ok(mode)
    }

    /// Load power mode, manual fan flag and boost levels from the controller.
    ///
    /// A handle starts from defaults, so short-lived callers run this once
    /// after opening. The firmware does not report the fan speed, so a
    /// manual fan leaves the stored target at 0.
    pub fn sync_state(&self) -> Result<DeviceState> {
        let mut guard = self.session.lock();

        let response = guard.transact(&protocol::get_power_mode(FanZone::Primary))?;
        let mode = PowerMode::try_from(response.args[2])?;
        let manual_fan = response.args[3] != 0 && mode != PowerMode::Custom;
        let cpu_boost = guard.transact(&protocol::get_boost(BoostCluster::Cpu))?.args[2];
        let gpu_boost = guard.transact(&protocol::get_boost(BoostCluster::Gpu))?.args[2];

        let state = guard.state_mut();
        state.power_mode = mode;
        if !manual_fan {
            state.clear_fan();
        }
        state.manual_fan = manual_fan;
        state.cpu_boost = cpu_boost.min(MAX_BOOST_LEVEL);
        state.gpu_boost = gpu_boost.min(MAX_BOOST_LEVEL);

        debug!("Synced state: {:?}", state);
        Ok(state.clone())
    }

    // =========================================================================
    // Boost
    // =========================================================================

    pub fn set_cpu_boost_mode(&self, level: u8) -> Result<u8> {
        self.set_boost(BoostCluster::Cpu, level)
    }

    pub fn set_gpu_boost_mode(&self, level: u8) -> Result<u8> {
        self.set_boost(BoostCluster::Gpu, level)
    }

    pub fn get_cpu_boost_mode(&self) -> Result<u8> {
        self.get_boost(BoostCluster::Cpu)
    }

    pub fn get_gpu_boost_mode(&self) -> Result<u8> {
        self.get_boost(BoostCluster::Gpu)
    }

    /// Store a boost level and write it if the laptop is in Custom mode.
    ///
    /// Outside Custom mode the level is applied by the next switch to
    /// Custom. Level 3 falls back to 2 on models without boost.
    fn set_boost(&self, cluster: BoostCluster, level: u8) -> Result<u8> {
        if level > MAX_BOOST_LEVEL {
            return Err(BladeError::InvalidInput(format!(
                "{} boost level must be 0-{}, got {}",
                cluster, MAX_BOOST_LEVEL, level
            )));
        }

        let level = if level == MAX_BOOST_LEVEL && !self.capabilities.boost_mode_allowed {
            warn!("Boost not available on {}, using level 2", self.capabilities.name);
            2
        } else {
            level
        };

        let mut guard = self.session.lock();
        match cluster {
            BoostCluster::Cpu => guard.state_mut().cpu_boost = level,
            BoostCluster::Gpu => guard.state_mut().gpu_boost = level,
        }

        let mode = guard.transact(&protocol::get_power_mode(FanZone::Primary))?.args[2];
        if mode == PowerMode::Custom.value() {
            guard.transact(&protocol::get_boost(cluster))?;
            guard.transact(&protocol::set_boost(cluster, level))?;
            info!("{} boost set to {}", cluster, level);
        } else {
            debug!("{} boost {} stored until Custom mode", cluster, level);
        }

        Ok(level)
    }

    /// Boost level reported by the controller, `0` outside Custom mode.
    fn get_boost(&self, cluster: BoostCluster) -> Result<u8> {
        let mut guard = self.session.lock();

        let mode = guard.transact(&protocol::get_power_mode(FanZone::Primary))?.args[2];
        if mode != PowerMode::Custom.value() {
            return Ok(0);
        }

        Ok(guard.transact(&protocol::get_boost(cluster))?.args[2])
    }

    // =========================================================================
    // Battery
    // =========================================================================

    pub fn get_battery_health(&self) -> Result<BatteryHealth> {
        self.require_battery_health()?;

        let response = self.session.transact(&protocol::get_battery_health())?;
        let (enabled, threshold) = protocol::decode_battery_health(response.args[0]);
        Ok(BatteryHealth { enabled, threshold })
    }

    /// Turn the charge limiter on or off.
    ///
    /// # Errors
    /// - `Unsupported` on models without the optimizer.
    /// - `InvalidInput` when `threshold` is outside 50-80%.
    pub fn set_battery_health(&self, enabled: bool, threshold: u8) -> Result<()> {
        self.require_battery_health()?;

        if !(BATTERY_THRESHOLD_MIN..=BATTERY_THRESHOLD_MAX).contains(&threshold) {
            return Err(BladeError::InvalidInput(format!(
                "Battery threshold must be {}-{}%, got {}",
                BATTERY_THRESHOLD_MIN, BATTERY_THRESHOLD_MAX, threshold
            )));
        }

        let raw = protocol::encode_battery_health(enabled, threshold);
        self.session.transact(&protocol::set_battery_health(raw))?;

        info!("Battery health optimizer: {}", BatteryHealth { enabled, threshold });
        Ok(())
    }

    fn require_battery_health(&self) -> Result<()> {
        if self.capabilities.battery_health_allowed {
            Ok(())
        } else {
            Err(BladeError::Unsupported("Battery health optimizer"))
        }
    }
}

impl<T: Transport> std::fmt::Debug for BladeLaptop<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BladeLaptop")
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Sequences
// =============================================================================

fn read_power_mode<T: Transport>(
    guard: &mut SessionGuard<'_, T, DeviceState>,
) -> Result<PowerMode> {
    let response = guard.transact(&protocol::get_power_mode(FanZone::Primary))?;
    PowerMode::try_from(response.args[2])
}

/// Read-before-write sequence that enters Custom mode.
///
/// The controller only takes boost levels after it has been asked for the
/// current value, and only keeps Custom mode once both zones are set.
fn apply_custom_mode<T: Transport>(guard: &mut SessionGuard<'_, T, DeviceState>) -> Result<()> {
    let custom = PowerMode::Custom.value();
    let (cpu_boost, gpu_boost) = (guard.state().cpu_boost, guard.state().gpu_boost);

    guard.transact(&protocol::get_power_mode(FanZone::Primary))?;
    guard.transact(&protocol::set_power_mode(FanZone::Primary, custom, false))?;

    for (cluster, level) in [(BoostCluster::Cpu, cpu_boost), (BoostCluster::Gpu, gpu_boost)] {
        guard.transact(&protocol::get_boost(cluster))?;
        guard.transact(&protocol::set_boost(cluster, level))?;
    }

    guard.transact(&protocol::get_power_mode(FanZone::Secondary))?;
    guard.transact(&protocol::set_power_mode(FanZone::Secondary, custom, false))?;

    Ok(())
}
