use core::cell::{BorrowError, BorrowMutError};

use crate::network::State;
use crate::registration::SimStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// No terminator matched before the deadline
    Timeout,
    /// The modem answered with `ERROR`
    CommandRejected,
    /// The single transport owner is already in use
    Busy,
    /// The serial collaborator reported an I/O error
    Transport,

    // Dispatcher observed conditions
    Overflow { dropped: usize },
    PeerClosed,
    SocketError(i32),
    MuxOutOfRange(i32),

    // Connection errors
    NotConnected,
    InvalidPayload,

    // Lifecycle errors
    Sim(SimStatus),
    StateTimeout(State),
}

impl From<BorrowMutError> for Error {
    fn from(_: BorrowMutError) -> Self {
        Error::Busy
    }
}

impl From<BorrowError> for Error {
    fn from(_: BorrowError) -> Self {
        Error::Busy
    }
}

impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Error::Timeout | Error::StateTimeout(_) => embedded_io::ErrorKind::TimedOut,
            Error::PeerClosed => embedded_io::ErrorKind::ConnectionReset,
            Error::NotConnected => embedded_io::ErrorKind::NotConnected,
            Error::InvalidPayload => embedded_io::ErrorKind::InvalidData,
            Error::Overflow { .. } => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}
