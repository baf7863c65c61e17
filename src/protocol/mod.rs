//! HID protocol implementation for Razer Blade embedded controllers.
//!
//! This module contains the fixed-layout packet codec and the command
//! builders for fan, power, boost, lighting and battery commands.

pub mod commands;
pub mod packet;

pub use commands::*;
pub use packet::{ARGS_LENGTH, Packet, REPORT_LENGTH, Status, TRANSACTION_ID};
