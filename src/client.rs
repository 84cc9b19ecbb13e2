use core::cell::RefCell;
use core::marker::PhantomData;

use atat::serde_at;
use atat::AtatCmd;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Instant};
use embedded_io::{Read, ReadReady, Write};
use heapless::Vec;
use serde::de::DeserializeOwned;

use crate::command::AT;
use crate::config::CellularConfig;
use crate::error::Error;
use crate::fmt::LossyStr;
use crate::matcher::{Expect, ResponseBuffer, ERROR};
use crate::port::AtPort;
use crate::socket::SocketSet;
use crate::traits::Clock;
use crate::urc_handler::{self, Urc};

/// Room for the longest command line, a full hex encoded send chunk.
const CMD_BUFFER_SIZE: usize = 1152;

/// Longest information line decoded by [`GsmClient::send_query`].
const RESPONSE_LINE_SIZE: usize = 128;

/// Bound for the trailing `OK` after a reply has been parsed.
const TRAILER_TIMEOUT: Duration = Duration::from_millis(100);

/// Wait bound declared by a command definition.
pub(crate) fn timeout_of<A: AtatCmd>() -> Duration {
    Duration::from_millis(A::MAX_TIMEOUT_MS.into())
}

/// Command channel and sole owner of the serial transport.
///
/// Every operation, including those of the [`Connection`]s borrowing this
/// client, goes through the same transport. A second operation started while
/// one is in flight fails with [`Error::Busy`] instead of interleaving on the
/// wire.
///
/// [`Connection`]: crate::socket::Connection
pub struct GsmClient<T, C, CFG> {
    port: RefCell<AtPort<T, C>>,
    sockets: Mutex<NoopRawMutex, RefCell<SocketSet>>,
    _config: PhantomData<CFG>,
}

impl<T, C, CFG> GsmClient<T, C, CFG>
where
    T: Read + Write + ReadReady,
    C: Clock,
    CFG: CellularConfig,
{
    pub fn new(transport: T, clock: C) -> Self {
        Self {
            port: RefCell::new(AtPort::new(transport, clock)),
            sockets: Mutex::new(RefCell::new(SocketSet::new())),
            _config: PhantomData,
        }
    }

    /// Give back the transport and clock.
    pub fn release(self) -> (T, C) {
        self.port.into_inner().release()
    }

    /// Run `f` with exclusive access to the connection registry.
    pub fn with_sockets<R>(&self, f: impl FnOnce(&mut SocketSet) -> R) -> Result<R, Error> {
        self.sockets.lock(|sockets| {
            let mut sockets = sockets.try_borrow_mut()?;
            Ok(f(&mut sockets))
        })
    }

    pub fn now(&self) -> Result<Instant, Error> {
        Ok(self.port.try_borrow_mut()?.now())
    }

    pub fn delay(&self, duration: Duration) -> Result<(), Error> {
        self.port.try_borrow_mut()?.delay(duration);
        Ok(())
    }

    /// Write `cmd` without waiting for a reply.
    pub fn send_cmd<A: AtatCmd>(&self, cmd: &A) -> Result<(), Error> {
        let mut buf = [0u8; CMD_BUFFER_SIZE];
        let len = cmd.write(&mut buf);
        debug!("Sending command: {:?}", LossyStr(&buf[..len]));
        self.port.try_borrow_mut()?.write_all(&buf[..len])
    }

    /// Send `cmd` and wait for `OK`, bounded by the command's own timeout.
    pub fn send_at<A: AtatCmd>(&self, cmd: &A) -> Result<(), Error> {
        self.send_at_with_timeout(cmd, timeout_of::<A>())
    }

    pub fn send_at_with_timeout<A: AtatCmd>(
        &self,
        cmd: &A,
        timeout: Duration,
    ) -> Result<(), Error> {
        self.send_at_expect(cmd, timeout, &Expect::default())?;
        Ok(())
    }

    /// Send `cmd` and wait until the reply ends with one of `expect`.
    ///
    /// Returns the 1-based index of the matched pattern. A matched `ERROR`
    /// pattern is reported as [`Error::CommandRejected`].
    pub fn send_at_expect<A: AtatCmd>(
        &self,
        cmd: &A,
        timeout: Duration,
        expect: &Expect,
    ) -> Result<usize, Error> {
        let mut buf = [0u8; CMD_BUFFER_SIZE];
        let len = cmd.write(&mut buf);
        let line = &buf[..len];

        debug!("Sending command: {:?}", LossyStr(line));
        self.port.try_borrow_mut()?.write_all(line)?;

        match self.wait_response(timeout, expect, &mut ResponseBuffer::new()) {
            Ok(index) if expect.pattern(index) == Some(ERROR) => {
                error!("Command rejected: {:?}", LossyStr(line));
                Err(Error::CommandRejected)
            }
            Ok(index) => Ok(index),
            Err(e) => {
                error!("Command {:?} failed: {:?}", LossyStr(line), e);
                Err(e)
            }
        }
    }

    /// The response matcher.
    ///
    /// Consumes the transport byte by byte until `data` ends with one of the
    /// `expect` patterns, returning its 1-based index. Notifications spotted
    /// on the way are handed to the dispatcher and cleared from `data`; they
    /// never end the wait. `0x00` filler bytes are skipped.
    pub fn wait_response(
        &self,
        timeout: Duration,
        expect: &Expect,
        data: &mut ResponseBuffer,
    ) -> Result<usize, Error> {
        let mut port = self.port.try_borrow_mut()?;
        let deadline = port.now() + timeout;

        loop {
            match port.poll_byte() {
                Some(0) => {}
                Some(byte) => {
                    data.push(byte);
                    if let Some(urc) = Urc::detect(data.as_bytes()) {
                        debug!("Notification: {:?}", urc);
                        self.sockets.lock(|sockets| -> Result<(), Error> {
                            let mut sockets = sockets.try_borrow_mut()?;
                            urc_handler::dispatch(
                                urc,
                                data.as_bytes(),
                                &mut port,
                                &mut sockets,
                                CFG::STREAM_TIMEOUT,
                            );
                            Ok(())
                        })?;
                        data.clear();
                    } else if let Some(index) = expect.matches(data.as_bytes()) {
                        return Ok(index);
                    }
                }
                None => port.idle(),
            }

            if port.now() >= deadline {
                break;
            }
        }

        let leftover = data.trimmed();
        if !leftover.is_empty() {
            warn!("Unhandled response: {:?}", LossyStr(leftover));
        }
        data.clear();
        Err(Error::Timeout)
    }

    /// Drain pending notifications while no command is outstanding.
    ///
    /// Must be called periodically, otherwise data and close notifications
    /// for idle connections stay unread.
    pub fn maintain(&self) -> Result<(), Error> {
        match self.wait_response(
            CFG::MAINTAIN_TIMEOUT,
            &Expect::nothing(),
            &mut ResponseBuffer::new(),
        ) {
            Ok(_) | Err(Error::Timeout) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Read a reply field up to, and consuming, `delim`.
    pub fn read_field<const N: usize>(&self, delim: u8) -> Result<Vec<u8, N>, Error> {
        let mut field = Vec::new();
        if self
            .port
            .try_borrow_mut()?
            .read_until(delim, CFG::STREAM_TIMEOUT, &mut field)
        {
            Ok(field)
        } else {
            Err(Error::Timeout)
        }
    }

    /// Send a query and decode its information line.
    ///
    /// Waits for `prefix`, decodes the rest of that line into the command's
    /// response type with `serde_at`, then consumes the final result code.
    pub fn send_query<A>(
        &self,
        cmd: &A,
        timeout: Duration,
        prefix: &[u8],
    ) -> Result<A::Response, Error>
    where
        A: AtatCmd,
        A::Response: DeserializeOwned,
    {
        self.send_at_expect(cmd, timeout, &Expect::reply(prefix))?;
        let line: Vec<u8, RESPONSE_LINE_SIZE> = self.read_field(b'\n')?;
        self.finish_reply();

        serde_at::from_slice(&line).map_err(|_| {
            warn!("Malformed reply: {:?}", LossyStr(&line));
            Error::InvalidPayload
        })
    }

    /// Consume the final result code of a reply whose body was already read.
    pub(crate) fn finish_reply(&self) {
        self.wait_response(
            TRAILER_TIMEOUT,
            &Expect::default(),
            &mut ResponseBuffer::new(),
        )
        .ok();
    }

    /// Repeat `AT` until the modem answers `OK` or `timeout` elapses.
    pub fn test_at(&self, timeout: Duration) -> Result<(), Error> {
        let deadline = self.now()? + timeout;
        loop {
            self.send_cmd(&AT)?;
            match self.wait_response(
                Duration::from_millis(200),
                &Expect::default(),
                &mut ResponseBuffer::new(),
            ) {
                Ok(1) => return Ok(()),
                Ok(_) | Err(Error::Timeout) => {}
                Err(e) => return Err(e),
            }

            if self.now()? >= deadline {
                return Err(Error::Timeout);
            }
            self.delay(Duration::from_millis(100))?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::network_service::GetSignalQuality;
    use crate::socket::{SocketHandle, SocketKind};
    use crate::test_helpers::client;

    const SECOND: Duration = Duration::from_millis(1000);

    #[test]
    fn ok_reply_matches_first_pattern() {
        let (client, serial, clock) = client();
        serial.once("AT\r\n", "\r\nOK\r\n");

        assert_eq!(client.send_at_expect(&AT, SECOND, &Expect::default()), Ok(1));
        assert!(clock.elapsed() < SECOND);
        assert_eq!(serial.written(), "AT\r\n");
    }

    #[test]
    fn error_reply_is_rejection() {
        let (client, serial, _) = client();
        serial.once("AT\r\n", "\r\nERROR\r\n");

        assert_eq!(client.send_at(&AT), Err(Error::CommandRejected));
    }

    #[test]
    fn custom_pattern_leaves_body_unread() {
        let (client, serial, _) = client();
        serial.once("AT\r\n", "\r\n+CSOC: 0\r\nOK\r\n");

        assert_eq!(
            client.send_at_expect(&AT, SECOND, &Expect::reply(b"+CSOC: ")),
            Ok(1)
        );
        let field: Vec<u8, 8> = client.read_field(b'\n').unwrap();
        assert_eq!(&field[..], b"0\r");
        client.finish_reply();
        assert_eq!(serial.rx_remaining(), 0);
    }

    #[test]
    fn query_decodes_line_after_notification() {
        let (client, serial, _) = client();
        serial.once("AT+CSQ", "\r\n+CSOERR: 3,4\r\n+CSQ: 17,0\r\n\r\nOK\r\n");

        let report = client.send_query(&GetSignalQuality, SECOND, b"+CSQ:");
        let report = report.unwrap();
        assert_eq!((report.rssi, report.ber), (17, 0));
        assert_eq!(serial.rx_remaining(), 0);
    }

    #[test]
    fn malformed_query_reply_is_invalid_payload() {
        let (client, serial, _) = client();
        serial.once("AT+CSQ", "\r\n+CSQ: low,0\r\n\r\nOK\r\n");

        assert!(matches!(
            client.send_query(&GetSignalQuality, SECOND, b"+CSQ:"),
            Err(Error::InvalidPayload)
        ));
        assert_eq!(serial.rx_remaining(), 0);
    }

    #[test]
    fn null_bytes_are_ignored() {
        let (client, serial, _) = client();
        serial.push_rx(b"\0\r\nO\0K\0\r\n");

        let mut data = ResponseBuffer::new();
        assert_eq!(
            client.wait_response(SECOND, &Expect::default(), &mut data),
            Ok(1)
        );
        assert_eq!(data.as_bytes(), b"\r\nOK\r\n");
    }

    #[test]
    fn timeout_discards_leftover() {
        let (client, serial, clock) = client();
        serial.push_rx(b"\r\nGARBAGE\r\n");

        let mut data = ResponseBuffer::new();
        let timeout = Duration::from_millis(50);
        assert_eq!(
            client.wait_response(timeout, &Expect::default(), &mut data),
            Err(Error::Timeout)
        );
        assert!(data.is_empty());
        assert!(clock.elapsed() >= timeout);
    }

    #[test]
    fn notifications_do_not_end_the_wait() {
        let (client, serial, _) = client();
        client
            .with_sockets(|s| {
                let owner = s.next_owner();
                s.register(SocketHandle(1), SocketKind::Raw, owner)
            })
            .unwrap()
            .unwrap();
        serial.once("AT\r\n", "\r\n+CSONMI: 1,2,4142\r\n\r\nOK\r\n");

        assert_eq!(client.send_at_expect(&AT, SECOND, &Expect::default()), Ok(1));

        client
            .with_sockets(|s| {
                let socket = s.get_mut(SocketHandle(1)).unwrap();
                let mut buf = [0u8; 4];
                assert_eq!(socket.recv_slice(&mut buf), 2);
                assert_eq!(&buf[..2], b"AB");
            })
            .unwrap();
    }

    #[test]
    fn notification_only_wait_times_out() {
        let (client, serial, _) = client();
        serial.push_rx(b"\r\n+CSOERR: 3,4\r\n");

        assert_eq!(
            client.wait_response(
                Duration::from_millis(50),
                &Expect::nothing(),
                &mut ResponseBuffer::new()
            ),
            Err(Error::Timeout)
        );
        assert_eq!(serial.rx_remaining(), 0);
    }

    #[test]
    fn maintain_processes_idle_notifications() {
        let (client, serial, _) = client();
        client
            .with_sockets(|s| {
                let owner = s.next_owner();
                s.register(SocketHandle(1), SocketKind::Raw, owner)
            })
            .unwrap()
            .unwrap();
        serial.push_rx(b"\r\n+CSOERR: 1,4\r\n");

        assert_eq!(client.maintain(), Ok(()));

        client
            .with_sockets(|s| {
                let socket = s.get_mut(SocketHandle(1)).unwrap();
                assert!(!socket.is_connected());
                assert_eq!(socket.take_error(), Some(Error::SocketError(4)));
            })
            .unwrap();
    }

    #[test]
    fn reentrant_use_is_busy() {
        let (client, serial, _) = client();
        assert_eq!(
            client.with_sockets(|_| client.with_sockets(|_| ())),
            Ok(Err(Error::Busy))
        );

        serial.push_rx(b"\r\n+CSOERR: 1,4\r\n");
        assert_eq!(client.with_sockets(|_| client.maintain()), Ok(Err(Error::Busy)));
    }

    #[test]
    fn test_at_retries_until_ok() {
        let (client, serial, _) = client();
        serial.once("AT\r\n", "\r\nERROR\r\n");
        serial.on("AT\r\n", "\r\nOK\r\n");

        assert_eq!(client.test_at(SECOND), Ok(()));
        assert_eq!(serial.written(), "AT\r\nAT\r\n");
    }

    #[test]
    fn test_at_gives_up() {
        let (client, _, clock) = client();
        let timeout = Duration::from_millis(500);

        assert_eq!(client.test_at(timeout), Err(Error::Timeout));
        assert!(clock.elapsed() >= timeout);
    }
}
