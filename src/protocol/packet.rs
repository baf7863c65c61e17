//! Fixed-layout command packet for the Razer embedded controller.
//!
//! Every request and response is a 91-byte HID feature report:
//!
//! ```text
//! [0]      report id (always 0x00)
//! [1]      status
//! [2]      transaction id
//! [3..5]   remaining packets (big-endian)
//! [5]      protocol type
//! [6]      data size
//! [7]      command class
//! [8]      command id
//! [9..89]  arguments
//! [89]     checksum
//! [90]     reserved
//! ```

use byteorder::{BigEndian, ByteOrder};

use crate::error::{BladeError, Result};

// =============================================================================
// Constants
// =============================================================================

/// Length of a full feature report, report id included.
pub const REPORT_LENGTH: usize = 91;

/// Length of the argument buffer.
pub const ARGS_LENGTH: usize = 80;

/// Transaction id used by laptop controllers.
pub const TRANSACTION_ID: u8 = 0x1F;

const REPORT_ID: u8 = 0x00;

const OFFSET_STATUS: usize = 1;
const OFFSET_TRANSACTION_ID: usize = 2;
const OFFSET_REMAINING: usize = 3;
const OFFSET_PROTOCOL: usize = 5;
const OFFSET_DATA_SIZE: usize = 6;
const OFFSET_CLASS: usize = 7;
const OFFSET_ID: usize = 8;
const OFFSET_ARGS: usize = 9;
const OFFSET_CHECKSUM: usize = OFFSET_ARGS + ARGS_LENGTH;

// =============================================================================
// Status
// =============================================================================

/// Command status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Fresh request from the host.
    New,
    /// Controller still processing the request.
    Busy,
    Successful,
    Failure,
    Timeout,
    NotSupported,
    /// Any byte the firmware documents nowhere.
    Unknown(u8),
}

impl Status {
    pub const fn from_byte(value: u8) -> Self {
        match value {
            0x00 => Status::New,
            0x01 => Status::Busy,
            0x02 => Status::Successful,
            0x03 => Status::Failure,
            0x04 => Status::Timeout,
            0x05 => Status::NotSupported,
            other => Status::Unknown(other),
        }
    }

    pub const fn to_byte(self) -> u8 {
        match self {
            Status::New => 0x00,
            Status::Busy => 0x01,
            Status::Successful => 0x02,
            Status::Failure => 0x03,
            Status::Timeout => 0x04,
            Status::NotSupported => 0x05,
            Status::Unknown(other) => other,
        }
    }
}

// =============================================================================
// Packet
// =============================================================================

/// A single controller command or response.
///
/// The checksum is not stored: it is derived from the other fields every time
/// the packet is serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub status: Status,
    pub transaction_id: u8,
    pub remaining_packets: u16,
    pub protocol_type: u8,
    pub data_size: u8,
    pub command_class: u8,
    pub command_id: u8,
    pub args: [u8; ARGS_LENGTH],
}

impl Packet {
    /// Build a zeroed request with the header fields set.
    ///
    /// Arguments must be filled in by the caller before sending.
    pub fn build_request(command_class: u8, command_id: u8, data_size: u8) -> Self {
        Self {
            status: Status::New,
            transaction_id: TRANSACTION_ID,
            remaining_packets: 0,
            protocol_type: 0,
            data_size,
            command_class,
            command_id,
            args: [0u8; ARGS_LENGTH],
        }
    }

    /// Copy `args` into the start of the argument buffer.
    ///
    /// Bytes past `ARGS_LENGTH` are dropped.
    pub fn with_args(mut self, args: &[u8]) -> Self {
        let len = args.len().min(ARGS_LENGTH);
        self.args[..len].copy_from_slice(&args[..len]);
        self
    }

    /// XOR checksum over remaining-packets through the last argument byte.
    pub fn checksum(&self) -> u8 {
        let buf = self.encode_body();
        buf[OFFSET_REMAINING..OFFSET_CHECKSUM]
            .iter()
            .fold(0u8, |crc, b| crc ^ b)
    }

    /// Serialize into a full feature report, checksum applied.
    pub fn serialize(&self) -> [u8; REPORT_LENGTH] {
        let mut buf = self.encode_body();
        buf[OFFSET_CHECKSUM] = self.checksum();
        buf
    }

    /// Parse a feature report read back from the device.
    ///
    /// # Errors
    /// Returns `MalformedResponse` if `bytes` is not exactly one report long.
    pub fn parse_response(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != REPORT_LENGTH {
            return Err(BladeError::MalformedResponse {
                expected: REPORT_LENGTH,
                actual: bytes.len(),
            });
        }

        let mut args = [0u8; ARGS_LENGTH];
        args.copy_from_slice(&bytes[OFFSET_ARGS..OFFSET_CHECKSUM]);

        Ok(Self {
            status: Status::from_byte(bytes[OFFSET_STATUS]),
            transaction_id: bytes[OFFSET_TRANSACTION_ID],
            remaining_packets: BigEndian::read_u16(&bytes[OFFSET_REMAINING..OFFSET_PROTOCOL]),
            protocol_type: bytes[OFFSET_PROTOCOL],
            data_size: bytes[OFFSET_DATA_SIZE],
            command_class: bytes[OFFSET_CLASS],
            command_id: bytes[OFFSET_ID],
            args,
        })
    }

    /// Arguments covered by `data_size`, for logging.
    pub fn payload(&self) -> &[u8] {
        &self.args[..(self.data_size as usize).min(ARGS_LENGTH)]
    }

    fn encode_body(&self) -> [u8; REPORT_LENGTH] {
        let mut buf = [0u8; REPORT_LENGTH];
        buf[0] = REPORT_ID;
        buf[OFFSET_STATUS] = self.status.to_byte();
        buf[OFFSET_TRANSACTION_ID] = self.transaction_id;
        BigEndian::write_u16(
            &mut buf[OFFSET_REMAINING..OFFSET_PROTOCOL],
            self.remaining_packets,
        );
        buf[OFFSET_PROTOCOL] = self.protocol_type;
        buf[OFFSET_DATA_SIZE] = self.data_size;
        buf[OFFSET_CLASS] = self.command_class;
        buf[OFFSET_ID] = self.command_id;
        buf[OFFSET_ARGS..OFFSET_CHECKSUM].copy_from_slice(&self.args);
        buf
    }
}
