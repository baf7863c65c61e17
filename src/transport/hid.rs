//! HID transport over feature reports.
//!
//! Laptops expose the controller on interface 0 of the Razer vendor id. A
//! request is one `SET_REPORT`, the answer one `GET_REPORT` of the same size.

use std::thread;
use std::time::{Duration, Instant};

use hidapi::{HidApi, HidDevice, HidError};
use tracing::{debug, info, trace};

use super::Transport;
use crate::device::capabilities::{self, capabilities_for};
use crate::error::{BladeError, Result, TransportError};
use crate::protocol::{CONTROL_INTERFACE, RAZER_VID, REPORT_LENGTH, Status};

// =============================================================================
// Timing
// =============================================================================

/// Delays applied around each exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HidTiming {
    /// Pause between sending a request and reading the answer.
    pub response_delay: Duration,
    /// Pause between reads while the controller reports busy.
    pub busy_poll: Duration,
    /// Give up once the controller stays busy this long.
    pub timeout: Duration,
}

impl Default for HidTiming {
    fn default() -> Self {
        Self {
            response_delay: Duration::from_micros(1000),
            busy_poll: Duration::from_micros(1000),
            timeout: Duration::from_millis(500),
        }
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// A laptop control interface found during enumeration.
#[derive(Debug, Clone)]
pub struct DeviceEntry {
    pub path: String,
    pub product_id: u16,
    pub name: &'static str,
    pub serial: Option<String>,
}

/// List control interfaces of laptops in the capability table.
pub fn list_devices() -> Result<Vec<DeviceEntry>> {
    let api = HidApi::new()?;

    let devices = api
        .device_list()
        .filter(|info| {
            info.vendor_id() == RAZER_VID
                && info.interface_number() == CONTROL_INTERFACE
                && capabilities::is_supported(info.product_id())
        })
        .map(|info| DeviceEntry {
            path: info.path().to_string_lossy().into_owned(),
            product_id: info.product_id(),
            name: capabilities_for(info.product_id()).name,
            serial: info.serial_number().map(String::from),
        })
        .collect();

    Ok(devices)
}

// =============================================================================
// HidTransport
// =============================================================================

/// Feature-report transport for one laptop.
pub struct HidTransport {
    device: HidDevice,
    timing: HidTiming,
}

impl HidTransport {
    pub fn new(device: HidDevice, timing: HidTiming) -> Self {
        Self { device, timing }
    }

    /// Open a laptop control interface.
    ///
    /// With `product_id` set, that exact product is opened whether or not it
    /// has a table entry. Without it, the first supported laptop is used.
    ///
    /// # Returns
    /// The transport and the product id it was opened for.
    ///
    /// # Errors
    /// Returns `DeviceNotFound` if no matching interface is connected.
    pub fn open(product_id: Option<u16>, timing: HidTiming) -> Result<(Self, u16)> {
        let api = HidApi::new()?;

        for info in api.device_list() {
            if info.vendor_id() != RAZER_VID || info.interface_number() != CONTROL_INTERFACE {
                continue;
            }

            let matches = match product_id {
                Some(pid) => info.product_id() == pid,
                None => capabilities::is_supported(info.product_id()),
            };

            if matches {
                let device = info.open_device(&api)?;
                info!(
                    "Opened {} ({:04x}:{:04x})",
                    capabilities_for(info.product_id()).name,
                    RAZER_VID,
                    info.product_id()
                );
                return Ok((Self::new(device, timing), info.product_id()));
            }
        }

        Err(BladeError::DeviceNotFound)
    }
}

impl Transport for HidTransport {
    fn exchange(
        &mut self,
        request: &[u8; REPORT_LENGTH],
    ) -> std::result::Result<Vec<u8>, TransportError> {
        self.device.send_feature_report(request)?;
        thread::sleep(self.timing.response_delay);

        let device = &self.device;
        poll_response(&self.timing, |buf| device.get_feature_report(buf))
    }
}

/// Read reports until the controller is no longer busy.
///
/// # Errors
/// - `ShortRead` when a read returns less than one full report.
/// - `Timeout` once the controller has stayed busy for `timing.timeout`.
fn poll_response<F>(
    timing: &HidTiming,
    mut read: F,
) -> std::result::Result<Vec<u8>, TransportError>
where
    F: FnMut(&mut [u8]) -> std::result::Result<usize, HidError>,
{
    let started = Instant::now();
    loop {
        let mut buf = [0u8; REPORT_LENGTH];
        let len = read(&mut buf)?;

        if len != REPORT_LENGTH {
            debug!("Invalid report length: {}", len);
            return Err(TransportError::ShortRead {
                expected: REPORT_LENGTH,
                actual: len,
            });
        }

        if Status::from_byte(buf[1]) != Status::Busy {
            return Ok(buf.to_vec());
        }

        if started.elapsed() >= timing.timeout {
            return Err(TransportError::Timeout);
        }

        trace!("Controller busy, polling again");
        thread::sleep(timing.busy_poll);
    }
}

impl std::fmt::Debug for HidTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidTransport")
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_timing() -> HidTiming {
        HidTiming {
            response_delay: Duration::ZERO,
            busy_poll: Duration::from_micros(100),
            timeout: Duration::from_millis(20),
        }
    }

    fn report(status: Status) -> [u8; REPORT_LENGTH] {
        let mut buf = [0u8; REPORT_LENGTH];
        buf[1] = status.to_byte();
        buf[7] = 0x0d;
        buf
    }

    #[test]
    fn test_poll_waits_out_busy() {
        let mut replies = vec![
            report(Status::Busy),
            report(Status::Busy),
            report(Status::Successful),
        ]
        .into_iter();
        let mut reads = 0;

        let bytes = poll_response(&fast_timing(), |buf| {
            reads += 1;
            let reply = replies.next().unwrap_or(report(Status::Failure));
            buf.copy_from_slice(&reply);
            Ok(REPORT_LENGTH)
        })
        .unwrap();

        assert_eq!(reads, 3);
        assert_eq!(bytes.len(), REPORT_LENGTH);
        assert_eq!(Status::from_byte(bytes[1]), Status::Successful);
    }

    #[test]
    fn test_poll_times_out_while_busy() {
        let mut reads = 0;

        let result = poll_response(&fast_timing(), |buf| {
            reads += 1;
            buf.copy_from_slice(&report(Status::Busy));
            Ok(REPORT_LENGTH)
        });

        assert!(matches!(result, Err(TransportError::Timeout)));
        assert!(reads > 1);
    }

    #[test]
    fn test_poll_rejects_short_read() {
        let result = poll_response(&fast_timing(), |buf| {
            buf[..64].copy_from_slice(&report(Status::Successful)[..64]);
            Ok(64)
        });

        assert!(matches!(
            result,
            Err(TransportError::ShortRead {
                expected: REPORT_LENGTH,
                actual: 64
            })
        ));
    }

    #[test]
    fn test_poll_returns_failure_status_unchanged() {
        // Only Busy is retried; other statuses are left to the session
        let bytes = poll_response(&fast_timing(), |buf| {
            buf.copy_from_slice(&report(Status::NotSupported));
            Ok(REPORT_LENGTH)
        })
        .unwrap();
        assert_eq!(Status::from_byte(bytes[1]), Status::NotSupported);
    }
}
