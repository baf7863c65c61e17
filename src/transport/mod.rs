//! Transport session for the embedded controller.
//!
//! The controller sits behind a single HID control endpoint that cannot
//! handle interleaved requests. A [`Session`] owns the transport together
//! with whatever per-device state must change in step with it, both behind
//! one lock.
//!
//! ```text
//! [BladeLaptop / KeyboardLighting]   <- multi-step sequences
//!               |
//!           [Session]                <- lock, codec, response checks
//!               |
//!      [HidTransport / mock]         <- raw report exchange
//! ```

pub mod hid;
#[cfg(test)]
pub(crate) mod mock;

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::protocol::{self, Packet, REPORT_LENGTH, Status};

pub use hid::{DeviceEntry, HidTiming, HidTransport};

/// Raw request/response exchange with the controller.
///
/// Implementations send one serialized report and return the bytes of the
/// report read back. They never retry a request.
pub trait Transport: Send {
    fn exchange(
        &mut self,
        request: &[u8; REPORT_LENGTH],
    ) -> std::result::Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn exchange(
        &mut self,
        request: &[u8; REPORT_LENGTH],
    ) -> std::result::Result<Vec<u8>, TransportError> {
        (**self).exchange(request)
    }
}

struct Channel<T, S> {
    transport: T,
    state: S,
}

/// Serialized access to one device.
///
/// At most one request is in flight at any time. Callers that need several
/// exchanges to happen back to back take a [`SessionGuard`] with
/// [`Session::lock`] and keep it for the whole sequence.
pub struct Session<T, S = ()> {
    channel: Mutex<Channel<T, S>>,
}

impl<T: Transport, S> Session<T, S> {
    pub fn new(transport: T, state: S) -> Self {
        Self {
            channel: Mutex::new(Channel { transport, state }),
        }
    }

    /// Acquire the device lock. Released when the guard drops.
    pub fn lock(&self) -> SessionGuard<'_, T, S> {
        SessionGuard {
            channel: self.channel.lock(),
        }
    }

    /// Run a single exchange under the lock.
    pub fn transact(&self, request: &Packet) -> Result<Packet> {
        self.lock().transact(request)
    }

    /// Tear down the session, returning the transport and state.
    pub fn into_inner(self) -> (T, S) {
        let channel = self.channel.into_inner();
        (channel.transport, channel.state)
    }
}

/// Scoped ownership of a [`Session`].
pub struct SessionGuard<'a, T, S> {
    channel: MutexGuard<'a, Channel<T, S>>,
}

impl<T: Transport, S> SessionGuard<'_, T, S> {
    /// Send `request` and return the validated response.
    ///
    /// # Errors
    /// - `Transport` when the exchange fails, the response answers a different
    ///   command, or the firmware reports a failure status.
    /// - `MalformedResponse` when the response is not one full report.
    pub fn transact(&mut self, request: &Packet) -> Result<Packet> {
        debug!(
            "-> {:#04x}/{:#04x} {:02X?}",
            request.command_class,
            request.command_id,
            request.payload()
        );

        let bytes = self.channel.transport.exchange(&request.serialize())?;
        let response = Packet::parse_response(&bytes)?;

        let expected_id = protocol::response_id(request.command_class, request.command_id);
        if response.command_class != request.command_class || response.command_id != expected_id
        {
            warn!(
                "Response doesn't match request: {:#04x}/{:#04x}",
                response.command_class, response.command_id
            );
            return Err(TransportError::ResponseMismatch {
                sent_class: request.command_class,
                sent_id: request.command_id,
                got_class: response.command_class,
                got_id: response.command_id,
            }
            .into());
        }

        if response.status != Status::Successful {
            warn!("Command rejected with status {:?}", response.status);
            return Err(TransportError::Rejected {
                class: request.command_class,
                id: request.command_id,
                status: response.status.to_byte(),
            }
            .into());
        }

        debug!("<- {:02X?}", response.payload());
        Ok(response)
    }

    pub fn state(&self) -> &S {
        &self.channel.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.channel.state
    }
}
