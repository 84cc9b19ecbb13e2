//! Byte level access to the serial collaborator, bounded by the clock.

use embassy_time::{Duration, Instant};
use embedded_io::{Read, ReadReady, Write};
use heapless::Vec;

use crate::error::Error;
use crate::traits::Clock;

/// Sole reader and writer of the transport.
pub(crate) struct AtPort<T, C> {
    transport: T,
    clock: C,
}

impl<T, C> AtPort<T, C>
where
    T: Read + Write + ReadReady,
    C: Clock,
{
    pub(crate) fn new(transport: T, clock: C) -> Self {
        Self { transport, clock }
    }

    pub(crate) fn release(self) -> (T, C) {
        (self.transport, self.clock)
    }

    pub(crate) fn now(&mut self) -> Instant {
        self.clock.now()
    }

    pub(crate) fn delay(&mut self, duration: Duration) {
        self.clock.delay(duration)
    }

    pub(crate) fn idle(&mut self) {
        self.clock.idle()
    }

    /// Write a complete command line and wait until it has left the host.
    pub(crate) fn write_all(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.transport.write_all(bytes).map_err(|_| Error::Transport)?;
        self.transport.flush().map_err(|_| Error::Transport)
    }

    /// Read one byte if the transport has one ready, without blocking.
    pub(crate) fn poll_byte(&mut self) -> Option<u8> {
        match self.transport.read_ready() {
            Ok(true) => {}
            Ok(false) => return None,
            Err(_) => {
                warn!("Transport readiness check failed");
                return None;
            }
        }

        let mut byte = [0u8; 1];
        match self.transport.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            Ok(_) => None,
            Err(_) => {
                warn!("Transport read failed");
                None
            }
        }
    }

    /// Read one byte, waiting at most `timeout` for it to arrive.
    pub(crate) fn read_byte(&mut self, timeout: Duration) -> Option<u8> {
        let deadline = self.now() + timeout;
        loop {
            if let Some(b) = self.poll_byte() {
                return Some(b);
            }
            if self.now() >= deadline {
                return None;
            }
            self.idle();
        }
    }

    /// Read up to, and consuming, `delim`. Each byte is bounded by `timeout`.
    ///
    /// Bytes beyond the capacity of `out` are consumed but not stored. Returns
    /// `false` if the transport went silent before the delimiter arrived.
    pub(crate) fn read_until<const N: usize>(
        &mut self,
        delim: u8,
        timeout: Duration,
        out: &mut Vec<u8, N>,
    ) -> bool {
        while let Some(b) = self.read_byte(timeout) {
            if b == delim {
                return true;
            }
            out.push(b).ok();
        }
        false
    }

    /// Consume bytes up to and including `delim`.
    pub(crate) fn skip_until(&mut self, delim: u8, timeout: Duration) -> bool {
        while let Some(b) = self.read_byte(timeout) {
            if b == delim {
                return true;
            }
        }
        false
    }
}

/// Parse a decimal integer out of a reply field.
pub(crate) fn parse_int(field: &[u8]) -> Option<i32> {
    let s = core::str::from_utf8(field).ok()?;
    s.trim_matches(|c: char| c.is_ascii_whitespace() || c == '"')
        .parse()
        .ok()
}
