use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embassy_time::{Duration, Instant};
use embedded_io::{ErrorType, Read, ReadReady, Write};

use crate::config::CellularConfig;
use crate::traits::Clock;

struct Reply {
    trigger: Vec<u8>,
    response: Vec<u8>,
    once: bool,
}

#[derive(Default)]
struct Inner {
    rx: VecDeque<u8>,
    written: Vec<u8>,
    replies: Vec<Reply>,
}

/// Scripted serial port.
///
/// Clones share state, so a test keeps one handle while the client owns the
/// other. A reply is queued whenever a written chunk contains its trigger.
/// One-shot replies are consumed in the order they were added and win over
/// persistent ones.
#[derive(Clone, Default)]
pub struct MockSerial {
    inner: Rc<RefCell<Inner>>,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes the modem sends without being asked.
    pub fn push_rx(&self, bytes: &[u8]) {
        self.inner.borrow_mut().rx.extend(bytes.iter().copied());
    }

    /// Answer every command containing `trigger` with `response`.
    pub fn on(&self, trigger: &str, response: &str) -> &Self {
        self.add_reply(trigger, response, false)
    }

    /// Answer the next command containing `trigger` with `response`.
    pub fn once(&self, trigger: &str, response: &str) -> &Self {
        self.add_reply(trigger, response, true)
    }

    fn add_reply(&self, trigger: &str, response: &str, once: bool) -> &Self {
        self.inner.borrow_mut().replies.push(Reply {
            trigger: trigger.as_bytes().to_vec(),
            response: response.as_bytes().to_vec(),
            once,
        });
        self
    }

    pub fn written(&self) -> std::string::String {
        std::string::String::from_utf8_lossy(&self.inner.borrow().written).into_owned()
    }

    pub fn clear_written(&self) {
        self.inner.borrow_mut().written.clear();
    }

    pub fn rx_remaining(&self) -> usize {
        self.inner.borrow().rx.len()
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

impl ErrorType for MockSerial {
    type Error = Infallible;
}

impl Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut inner = self.inner.borrow_mut();
        let mut n = 0;
        while n < buf.len() {
            match inner.rx.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.inner.borrow().rx.is_empty())
    }
}

impl Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut inner = self.inner.borrow_mut();
        inner.written.extend_from_slice(buf);

        let position = inner
            .replies
            .iter()
            .position(|r| r.once && contains(buf, &r.trigger))
            .or_else(|| {
                inner
                    .replies
                    .iter()
                    .position(|r| !r.once && contains(buf, &r.trigger))
            });

        if let Some(i) = position {
            let response = if inner.replies[i].once {
                inner.replies.remove(i).response
            } else {
                inner.replies[i].response.clone()
            };
            inner.rx.extend(response);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Deterministic clock. Idling advances time by one millisecond, delays by
/// the requested duration.
#[derive(Clone, Default)]
pub struct MockClock {
    ms: Rc<Cell<u64>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.ms.get())
    }
}

impl Clock for MockClock {
    fn now(&mut self) -> Instant {
        Instant::from_millis(self.ms.get())
    }

    fn delay(&mut self, duration: Duration) {
        self.ms.set(self.ms.get() + duration.as_millis());
    }

    fn idle(&mut self) {
        self.ms.set(self.ms.get() + 1);
    }
}

/// Short timeouts, so failing lifecycle gates give up quickly.
pub struct TestConfig;

impl CellularConfig for TestConfig {
    const STREAM_TIMEOUT: Duration = Duration::from_millis(20);
    const MAINTAIN_TIMEOUT: Duration = Duration::from_millis(5);
    const SIM_TIMEOUT: Duration = Duration::from_millis(200);
    const SIM_POLL_INTERVAL: Duration = Duration::from_millis(50);
    const REGISTRATION_TIMEOUT: Duration = Duration::from_millis(500);
    const ATTACH_TIMEOUT: Duration = Duration::from_millis(500);
    const ACTIVATION_TIMEOUT: Duration = Duration::from_millis(500);
    const ACTIVATION_COMMAND_TIMEOUT: Duration = Duration::from_millis(200);
    const POLL_INTERVAL: Duration = Duration::from_millis(50);
    const RADIO_SETTLE_TIME: Duration = Duration::from_millis(10);
    const RESET_SETTLE_TIME: Duration = Duration::from_millis(30);
}

pub type TestClient = crate::client::GsmClient<MockSerial, MockClock, TestConfig>;

/// Client wired to a fresh mock transport and clock.
pub fn client() -> (TestClient, MockSerial, MockClock) {
    let serial = MockSerial::new();
    let clock = MockClock::new();
    let client = TestClient::new(serial.clone(), clock.clone());
    (client, serial, clock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_serial_replies_to_triggers() {
        let mut serial = MockSerial::new();
        serial.once("AT+CSQ", "\r\n+CSQ: 20,0\r\n");
        serial.on("AT+CSQ", "\r\nOK\r\n");

        serial.write_all(b"AT+CSQ\r\n").unwrap();
        let mut buf = [0u8; 32];
        let n = serial.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"\r\n+CSQ: 20,0\r\n");

        serial.write_all(b"AT+CSQ\r\n").unwrap();
        let n = serial.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"\r\nOK\r\n");
        assert!(!serial.read_ready().unwrap());
        assert_eq!(serial.written(), "AT+CSQ\r\nAT+CSQ\r\n");
    }

    #[test]
    fn mock_clock_advances_on_idle_and_delay() {
        let mut clock = MockClock::new();
        let start = clock.now();
        clock.idle();
        clock.delay(Duration::from_millis(9));
        assert_eq!(clock.now() - start, Duration::from_millis(10));
        assert_eq!(clock.elapsed(), Duration::from_millis(10));
    }
}
