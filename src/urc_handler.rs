//! Recognition and dispatch of unsolicited notifications.
//!
//! Notifications are spotted on the tail of the response accumulator. Their
//! structured payload is then read straight from the transport and routed to
//! the socket registered under the announced mux id. Every registry access is
//! guarded: a notification for an unknown mux is drained and logged, never
//! dereferenced.

use embassy_time::Duration;
use embedded_io::{Read, ReadReady, Write};

use crate::fmt::LossyStr;
use crate::hex;
use crate::port::{parse_int, AtPort};
use crate::socket::{SocketKind, SocketSet};
use crate::traits::Clock;

const CLOSED: &[u8] = b"CLOSED\r\n";

/// Notifications the modem may interleave with command replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Urc {
    /// `+CIPRXGET: <mode>[,<mux>]`
    ReceiveReady,
    /// `+RECEIVE: <mux>,<length>`
    Receive,
    /// `[<mux>,] CLOSED`
    Closed,
    /// `+CSONMI: <mux>,<length>,<hex data>`
    SocketData,
    /// `+CSOERR: <mux>,<code>`
    SocketError,
    /// `SEND: <mux>,<length>`
    SendReport,
    /// `+CCOAPNMI: <mux>,<length>,<data>`
    CoapData,
}

/// Prefix, notification, and whether the prefix has to start a line.
const PREFIXES: [(&[u8], Urc, bool); 6] = [
    (b"+CIPRXGET:", Urc::ReceiveReady, true),
    (b"+RECEIVE:", Urc::Receive, true),
    (b"+CSONMI:", Urc::SocketData, true),
    (b"+CSOERR:", Urc::SocketError, false),
    (b"SEND:", Urc::SendReport, true),
    (b"+CCOAPNMI:", Urc::CoapData, false),
];

impl Urc {
    /// Check whether the accumulated text ends with a notification prefix.
    pub fn detect(data: &[u8]) -> Option<Urc> {
        for (prefix, urc, line_start) in PREFIXES {
            if data.ends_with(prefix) {
                let start = data.len() - prefix.len();
                if !line_start || start == 0 || data[start - 1] == b'\n' {
                    return Some(urc);
                }
            }
        }

        if data.ends_with(CLOSED) {
            return Some(Urc::Closed);
        }

        None
    }
}

/// Consume the payload of `urc` from the transport and apply it to `sockets`.
///
/// `data` is the accumulated text that ended with the notification prefix.
pub(crate) fn dispatch<T, C>(
    urc: Urc,
    data: &[u8],
    port: &mut AtPort<T, C>,
    sockets: &mut SocketSet,
    stream_timeout: Duration,
) where
    T: Read + Write + ReadReady,
    C: Clock,
{
    match urc {
        Urc::ReceiveReady => {
            let (mode, end) = read_field(port, stream_timeout);
            if mode != Some(1) || end != Some(b',') {
                if end == Some(b',') {
                    port.skip_until(b'\n', stream_timeout);
                }
                debug!("+CIPRXGET mode {:?} ignored", mode);
                return;
            }
            let mux = read_last_field(port, stream_timeout);
            debug!("[{:?}] Data ready", mux);
            match route(sockets, mux, None) {
                Some(socket) => socket.data_announced(None),
                None => warn!("+CIPRXGET for unknown mux {:?}", mux),
            }
        }
        Urc::Receive => {
            let (mux, end) = read_field(port, stream_timeout);
            let length = if end == Some(b',') {
                read_last_field(port, stream_timeout)
            } else {
                None
            };
            debug!("[{:?}] Received {:?} bytes", mux, length);
            match route(sockets, mux, None) {
                Some(socket) => socket.data_announced(length.map(|l| l.max(0) as usize)),
                None => warn!("+RECEIVE for unknown mux {:?}", mux),
            }
        }
        Urc::Closed => {
            let mux = closed_mux(data);
            debug!("[{:?}] Closed by peer", mux);
            match route(sockets, mux, None) {
                Some(socket) => socket.closed_by_peer(),
                None => warn!("CLOSED for unknown mux in {:?}", LossyStr(data)),
            }
        }
        Urc::SocketError => {
            let (mux, end) = read_field(port, stream_timeout);
            let code = if end == Some(b',') {
                read_last_field(port, stream_timeout)
            } else {
                None
            };
            debug!("[{:?}] Socket error {:?}", mux, code);
            match route(sockets, mux, None) {
                Some(socket) => socket.failed(code.unwrap_or(-1)),
                None => warn!("+CSOERR for unknown mux {:?}", mux),
            }
        }
        Urc::SendReport => {
            let (mux, end) = read_field(port, stream_timeout);
            let length = if end == Some(b',') {
                read_last_field(port, stream_timeout)
            } else {
                None
            };
            debug!("[{:?}] Sent {:?} bytes", mux, length);
        }
        Urc::SocketData => drain_payload(port, sockets, SocketKind::Raw, stream_timeout),
        Urc::CoapData => drain_payload(port, sockets, SocketKind::Coap, stream_timeout),
    }
}

fn route(
    sockets: &mut SocketSet,
    mux: Option<i32>,
    kind: Option<SocketKind>,
) -> Option<&mut crate::socket::Socket> {
    sockets.route(mux?, kind).ok()
}

/// Read a field ending in `,` or `\n`. Returns the parsed value and the byte
/// that ended the field, `None` if the transport went silent.
fn read_field<T, C>(port: &mut AtPort<T, C>, timeout: Duration) -> (Option<i32>, Option<u8>)
where
    T: Read + Write + ReadReady,
    C: Clock,
{
    let mut field: heapless::Vec<u8, 16> = heapless::Vec::new();
    while let Some(b) = port.read_byte(timeout) {
        if b == b',' || b == b'\n' {
            return (parse_int(&field), Some(b));
        }
        field.push(b).ok();
    }
    (parse_int(&field), None)
}

/// Read the final field of a notification line, consuming the line end.
fn read_last_field<T, C>(port: &mut AtPort<T, C>, timeout: Duration) -> Option<i32>
where
    T: Read + Write + ReadReady,
    C: Clock,
{
    let (value, end) = read_field(port, timeout);
    if end == Some(b',') {
        port.skip_until(b'\n', timeout);
    }
    value
}

/// Move a data notification's payload into the addressed socket.
///
/// Reading stops at the line end or once the announced amount has been
/// consumed, each byte bounded by twice the stream timeout. Bytes that do
/// not fit the receive buffer are still read and counted as dropped, so the
/// stream stays aligned.
fn drain_payload<T, C>(
    port: &mut AtPort<T, C>,
    sockets: &mut SocketSet,
    kind: SocketKind,
    stream_timeout: Duration,
) where
    T: Read + Write + ReadReady,
    C: Clock,
{
    let (mux, end) = read_field(port, stream_timeout);
    let (length, end) = if end == Some(b',') {
        read_field(port, stream_timeout)
    } else {
        (None, end)
    };
    let length = length.unwrap_or(0).max(0) as usize;

    let mut socket = route(sockets, mux, Some(kind));
    if socket.is_none() {
        warn!("{:?} payload for unknown mux {:?}, discarding", kind, mux);
    }

    let mut appended = 0;
    let mut dropped = 0;
    let mut line_done = end != Some(b',');
    if !line_done {
        let byte_timeout = stream_timeout * 2;
        let wanted = match kind {
            SocketKind::Raw => length,
            SocketKind::Coap => length * 2,
        };
        let mut produced = 0;
        let mut high = None;

        while produced < wanted {
            let Some(c) = port.read_byte(byte_timeout) else {
                break;
            };
            match c {
                b'"' | b' ' | b'\r' => continue,
                b'\n' => {
                    line_done = true;
                    break;
                }
                _ => {}
            }

            let byte = match kind {
                SocketKind::Coap => c,
                SocketKind::Raw => match high.take() {
                    None => {
                        high = Some(c);
                        continue;
                    }
                    Some(h) => match hex::decode_pair(h, c) {
                        Ok(b) => b,
                        Err(_) => {
                            warn!("Invalid hex digits {:?} in payload", LossyStr(&[h, c]));
                            continue;
                        }
                    },
                },
            };

            produced += 1;
            if let Some(s) = socket.as_mut() {
                if s.accept(byte) {
                    appended += 1;
                } else {
                    dropped += 1;
                }
            }
        }

        if produced < wanted && !line_done {
            warn!("Fewer payload bytes than announced: {} vs {}", produced, wanted);
        }
    }

    if !line_done {
        port.skip_until(b'\n', stream_timeout);
    }

    if let Some(s) = socket {
        if dropped > 0 {
            warn!(
                "[{:?}] Receive buffer overflow, {} bytes dropped",
                mux,
                dropped
            );
        }
        s.payload_done(appended, dropped);
    }
    debug!("[{:?}] Got {} bytes", mux, appended);
}

/// Resolve the mux of a `CLOSED` notification from the text preceding it.
///
/// `<mux>, CLOSED` on one line takes the id from that line, a bare `CLOSED`
/// line takes it from the line before, e.g. `5,1\r\nCLOSED\r\n`.
fn closed_mux(data: &[u8]) -> Option<i32> {
    let body = data.strip_suffix(CLOSED)?;
    let line_start = body.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);

    if let Some(mux) = last_int_before_comma(&body[line_start..]) {
        return Some(mux);
    }

    let previous = &body[..line_start.saturating_sub(1)];
    let previous = previous.strip_suffix(b"\r").unwrap_or(previous);
    let previous_start = previous
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1);
    last_int_before_comma(&previous[previous_start..])
}

/// The last integer field on `line` that is followed by a comma.
fn last_int_before_comma(line: &[u8]) -> Option<i32> {
    let fields = line.split(|&b| b == b',').count();
    line.split(|&b| b == b',')
        .take(fields.saturating_sub(1))
        .filter_map(parse_int)
        .last()
}
