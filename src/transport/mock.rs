//! In-memory controller used by unit tests.
//!
//! `MockTransport` answers like a laptop EC: it remembers what was written
//! and reports it back on reads. Every request is recorded with the thread
//! that sent it.

use std::sync::Arc;
use std::thread::ThreadId;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use super::Transport;
use crate::error::TransportError;
use crate::protocol::{Packet, REPORT_LENGTH, Status, commands};

/// Values the fake controller holds.
#[derive(Debug, Default)]
pub struct MockEc {
    pub power_mode: u8,
    pub manual_fan: [bool; 2],
    pub fan_units: [u8; 2],
    pub boost: [u8; 2],
    pub brightness: u8,
    pub logo_on: bool,
    pub battery_health: u8,
    pub rows: Vec<(u8, Vec<u8>)>,
}

#[derive(Debug, Clone)]
pub struct Logged {
    pub thread: ThreadId,
    pub packet: Packet,
}

#[derive(Debug, Default)]
pub struct MockShared {
    pub ec: MockEc,
    pub log: Vec<Logged>,
    /// Fail the request with this index (0-based) with a timeout.
    pub fail_at: Option<usize>,
    pub truncate_responses: bool,
    pub reply_status: Option<Status>,
    pub reply_command_id: Option<u8>,
    /// Sleep inside every exchange.
    pub latency: Option<Duration>,
}

#[derive(Clone)]
pub struct MockHandle(Arc<Mutex<MockShared>>);

impl MockHandle {
    pub fn lock(&self) -> MutexGuard<'_, MockShared> {
        self.0.lock()
    }

    pub fn requests(&self) -> Vec<Packet> {
        self.0.lock().log.iter().map(|l| l.packet.clone()).collect()
    }

    pub fn log(&self) -> Vec<Logged> {
        self.0.lock().log.clone()
    }

    pub fn clear(&self) {
        self.0.lock().log.clear();
    }
}

pub struct MockTransport {
    shared: Arc<Mutex<MockShared>>,
}

impl MockTransport {
    pub fn new() -> (Self, MockHandle) {
        let shared = Arc::new(Mutex::new(MockShared::default()));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            MockHandle(shared),
        )
    }
}

impl Transport for MockTransport {
    fn exchange(&mut self, request: &[u8; REPORT_LENGTH]) -> Result<Vec<u8>, TransportError> {
        let latency = self.shared.lock().latency;
        if let Some(latency) = latency {
            std::thread::sleep(latency);
        }

        let mut shared = self.shared.lock();
        let packet = Packet::parse_response(request).map_err(|_| TransportError::ShortRead {
            expected: REPORT_LENGTH,
            actual: request.len(),
        })?;

        let index = shared.log.len();
        shared.log.push(Logged {
            thread: std::thread::current().id(),
            packet: packet.clone(),
        });

        if shared.fail_at == Some(index) {
            shared.fail_at = None;
            return Err(TransportError::Timeout);
        }

        let mut response = packet;
        apply(&mut shared.ec, &mut response);
        response.status = shared.reply_status.unwrap_or(Status::Successful);
        if let Some(id) = shared.reply_command_id {
            response.command_id = id;
        }

        let bytes = response.serialize();
        if shared.truncate_responses {
            return Ok(bytes[..64].to_vec());
        }
        Ok(bytes.to_vec())
    }
}

fn apply(ec: &mut MockEc, packet: &mut Packet) {
    let selector = packet.args[1].saturating_sub(1).min(1) as usize;

    match (packet.command_class, packet.command_id) {
        (commands::CLASS_EC, commands::CMD_GET_POWER_MODE) => {
            packet.args[2] = ec.power_mode;
            packet.args[3] = u8::from(ec.manual_fan[selector]);
        }
        (commands::CLASS_EC, commands::CMD_SET_POWER_MODE) => {
            ec.power_mode = packet.args[2];
            ec.manual_fan[selector] = packet.args[3] != 0;
        }
        (commands::CLASS_EC, commands::CMD_SET_FAN_RPM) => {
            ec.fan_units[selector] = packet.args[2];
        }
        (commands::CLASS_EC, commands::CMD_GET_BOOST) => {
            packet.args[2] = ec.boost[selector];
        }
        (commands::CLASS_EC, commands::CMD_SET_BOOST) => {
            ec.boost[selector] = packet.args[2];
        }
        (commands::CLASS_LIGHTING, commands::CMD_SET_BRIGHTNESS) => {
            ec.brightness = packet.args[2];
        }
        (commands::CLASS_LIGHTING, commands::CMD_GET_BRIGHTNESS) => {
            packet.args[2] = ec.brightness;
        }
        (commands::CLASS_LIGHTING, commands::CMD_SET_LED_STATE) => {
            ec.logo_on = packet.args[2] != 0;
        }
        (commands::CLASS_LIGHTING, commands::CMD_GET_LED_STATE) => {
            packet.args[2] = u8::from(ec.logo_on);
        }
        (commands::CLASS_LIGHTING, commands::CMD_SET_MATRIX_ROW) => {
            ec.rows.push((
                packet.args[1],
                packet.args[7..7 + commands::MATRIX_ROW_BYTES].to_vec(),
            ));
        }
        (commands::CLASS_BATTERY, commands::CMD_SET_BATTERY_HEALTH) => {
            ec.battery_health = packet.args[0];
            packet.command_id = commands::CMD_GET_BATTERY_HEALTH;
        }
        (commands::CLASS_BATTERY, commands::CMD_GET_BATTERY_HEALTH) => {
            packet.args[0] = ec.battery_health;
        }
        _ => {}
    }
}
