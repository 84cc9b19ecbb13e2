mod connection;
mod ring_buffer;
mod set;

use core::fmt;

use atat::atat_derive::AtatLen;
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub use self::connection::Connection;
pub use self::ring_buffer::{Error as RingBufferError, RingBuffer};
pub use self::set::{OwnerToken, Set as SocketSet};

/// Number of connections the modem can multiplex at once.
pub const MUX_COUNT: usize = 5;

/// Capacity of every connection's receive buffer.
pub const RX_BUFFER_SIZE: usize = 128;

/// A handle, identifying a connection by the id the modem assigned to it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, AtatLen,
)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocketHandle(pub u8);

impl SocketHandle {
    /// Validate a mux id parsed from the modem.
    pub fn new(mux: i32) -> Result<Self, Error> {
        if (0..MUX_COUNT as i32).contains(&mux) {
            Ok(SocketHandle(mux as u8))
        } else {
            Err(Error::MuxOutOfRange(mux))
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SocketHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Protocol variant of a connection.
///
/// The kind selects the command vocabulary used to open, send and close, and
/// which data notification is routed to the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketKind {
    /// Byte stream socket in the modem's IP stack, payloads travel as hex text
    Raw,
    /// CoAP client instance, payloads travel as the caller's characters
    Coap,
}

/// Receive side state of one registered connection.
///
/// Written by the notification dispatcher, read by the [`Connection`] that
/// owns the registry slot.
#[derive(Debug)]
pub struct Socket {
    kind: SocketKind,
    owner: OwnerToken,
    connected: bool,
    data_pending: bool,
    available_hint: usize,
    dropped: usize,
    error: Option<Error>,
    rx_buffer: RingBuffer<u8, RX_BUFFER_SIZE>,
}

impl Socket {
    pub(crate) fn new(kind: SocketKind, owner: OwnerToken) -> Self {
        Self {
            kind,
            owner,
            connected: true,
            data_pending: false,
            available_hint: 0,
            dropped: 0,
            error: None,
            rx_buffer: RingBuffer::new(),
        }
    }

    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    pub fn owner(&self) -> OwnerToken {
        self.owner
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Set by data notifications, cleared once the receive buffer is drained.
    pub fn data_pending(&self) -> bool {
        self.data_pending
    }

    /// Byte count last announced or delivered by a notification.
    pub fn available_hint(&self) -> usize {
        self.available_hint
    }

    /// Total bytes discarded because the receive buffer was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Number of bytes waiting in the receive buffer.
    pub fn recv_queue(&self) -> usize {
        self.rx_buffer.len()
    }

    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    /// Dequeue buffered bytes into `data`, returning how many were copied.
    pub fn recv_slice(&mut self, data: &mut [u8]) -> usize {
        let size = self.rx_buffer.dequeue_slice(data);
        if self.rx_buffer.is_empty() {
            self.data_pending = false;
        }
        size
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Store one payload byte. Returns `false` if it had to be dropped.
    pub(crate) fn accept(&mut self, byte: u8) -> bool {
        self.rx_buffer.enqueue_one(byte).is_ok()
    }

    /// Account for a fully drained payload notification. An empty payload
    /// leaves the pending state untouched.
    pub(crate) fn payload_done(&mut self, appended: usize, dropped: usize) {
        if appended > 0 {
            self.available_hint = appended;
            self.data_pending = true;
        }
        if dropped > 0 {
            self.dropped += dropped;
            self.error = Some(Error::Overflow { dropped });
        }
    }

    pub(crate) fn data_announced(&mut self, length: Option<usize>) {
        if let Some(length) = length {
            self.available_hint = length;
        }
        self.data_pending = true;
    }

    pub(crate) fn closed_by_peer(&mut self) {
        self.connected = false;
        self.error = Some(Error::PeerClosed);
    }

    pub(crate) fn failed(&mut self, code: i32) {
        self.connected = false;
        self.error = Some(Error::SocketError(code));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_range_is_checked() {
        assert_eq!(SocketHandle::new(0), Ok(SocketHandle(0)));
        assert_eq!(SocketHandle::new(4), Ok(SocketHandle(4)));
        assert_eq!(SocketHandle::new(5), Err(Error::MuxOutOfRange(5)));
        assert_eq!(SocketHandle::new(-1), Err(Error::MuxOutOfRange(-1)));
    }

    #[test]
    fn overflowing_payload_is_counted() {
        let mut set = SocketSet::new();
        let owner = set.next_owner();
        set.register(SocketHandle(0), SocketKind::Raw, owner).unwrap();
        let socket = set.get_mut(SocketHandle(0)).unwrap();

        let mut appended = 0;
        let mut dropped = 0;
        for b in 0..(RX_BUFFER_SIZE + 3) {
            if socket.accept(b as u8) {
                appended += 1;
            } else {
                dropped += 1;
            }
        }
        socket.payload_done(appended, dropped);

        assert_eq!(socket.recv_queue(), RX_BUFFER_SIZE);
        assert_eq!(socket.available_hint(), RX_BUFFER_SIZE);
        assert_eq!(socket.dropped(), 3);
        assert_eq!(socket.take_error(), Some(Error::Overflow { dropped: 3 }));
        assert_eq!(socket.take_error(), None);
    }

    #[test]
    fn empty_payload_raises_nothing() {
        let mut socket = Socket::new(SocketKind::Raw, OwnerToken::first());
        socket.payload_done(0, 0);

        assert!(!socket.data_pending());
        assert_eq!(socket.available_hint(), 0);
        assert_eq!(socket.take_error(), None);
    }

    #[test]
    fn draining_clears_pending_flag() {
        let mut socket = Socket::new(SocketKind::Coap, OwnerToken::first());
        for b in b"hello" {
            assert!(socket.accept(*b));
        }
        socket.payload_done(5, 0);
        assert!(socket.data_pending());

        let mut buf = [0u8; 3];
        assert_eq!(socket.recv_slice(&mut buf), 3);
        assert!(socket.data_pending());
        assert_eq!(socket.recv_slice(&mut buf), 2);
        assert_eq!(&buf[..2], b"lo");
        assert!(!socket.data_pending());
    }
}
