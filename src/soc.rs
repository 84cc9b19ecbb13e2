//! Socket and CoAP client commands, as used by [`Connection`].
//!
//! Raw sockets live in the modem's IP stack and carry payloads as hex text.
//! CoAP clients carry the caller's characters unchanged. Both share the mux
//! id space of the [`SocketSet`](crate::socket::SocketSet).
//!
//! [`Connection`]: crate::socket::Connection

use embassy_time::Duration;
use embedded_io::{Read, ReadReady, Write};

use crate::client::{timeout_of, GsmClient};
use crate::command::coap::{CreateCoapClient, DeleteCoapClient, SendCoapData};
use crate::command::ip_transport_layer::{
    types::{SocketDomain, SocketProtocol, SocketStatus, SocketType},
    CloseSocket, ConnectSocket, CreateSocket, GetSocketStatus, SendSocketData,
};
use crate::config::CellularConfig;
use crate::error::Error;
use crate::hex::encode_hex;
use crate::socket::{SocketHandle, SocketKind};
use crate::traits::Clock;

/// Payload bytes per `+CSOSEND`. Hex encoding doubles them on the wire.
pub const MAX_SEND_CHUNK: usize = 512;

/// Longest payload a single `+CCOAPSEND` accepts.
pub const MAX_COAP_PAYLOAD: usize = 1024;

impl<T, C, CFG> GsmClient<T, C, CFG>
where
    T: Read + Write + ReadReady,
    C: Clock,
    CFG: CellularConfig,
{
    /// Allocate a TCP socket and connect it to `host:port`.
    ///
    /// The modem picks the mux id. If connecting fails, the allocated socket
    /// is closed again.
    pub fn open_socket(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<SocketHandle, Error> {
        let reply = self.send_query(
            &CreateSocket {
                domain: SocketDomain::IPv4,
                socket_type: SocketType::Stream,
                protocol: SocketProtocol::Ip,
            },
            timeout_of::<CreateSocket>(),
            b"+CSOC:",
        )?;
        let socket = SocketHandle::new(i32::from(reply.socket))?;

        if let Err(e) = self.send_at_with_timeout(
            &ConnectSocket {
                socket,
                remote_port: port,
                remote_host: host,
            },
            timeout,
        ) {
            warn!("[{}] Connect failed, releasing socket", socket);
            self.send_at(&CloseSocket { socket }).ok();
            return Err(e);
        }

        debug!("[{}] Socket connected", socket);
        Ok(socket)
    }

    /// Create a CoAP client for `host:port` on the configured context.
    pub fn open_coap(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<SocketHandle, Error> {
        let reply = self.send_query(
            &CreateCoapClient {
                remote_host: host,
                remote_port: port,
                cid: CFG::CONTEXT_ID,
            },
            timeout,
            b"+CCOAPNEW:",
        )?;
        let socket = SocketHandle::new(i32::from(reply.socket))?;
        debug!("[{}] CoAP client created", socket);
        Ok(socket)
    }

    pub fn close_socket(&self, kind: SocketKind, socket: SocketHandle) -> Result<(), Error> {
        match kind {
            SocketKind::Raw => self.send_at(&CloseSocket { socket }),
            SocketKind::Coap => self.send_at(&DeleteCoapClient { socket }),
        }
    }

    /// Ask the modem for the state of a raw socket.
    ///
    /// A reply naming another mux id is an error.
    pub fn socket_status(&self, socket: SocketHandle) -> Result<SocketStatus, Error> {
        let reply = self.send_query(
            &GetSocketStatus { socket },
            timeout_of::<GetSocketStatus>(),
            b"+CSOSTATUS:",
        )?;

        if reply.socket != socket.0 {
            warn!("[{}] Status reply for mux {}", socket, reply.socket);
            return Err(Error::MuxOutOfRange(i32::from(reply.socket)));
        }
        Ok(SocketStatus::from(i32::from(reply.status)))
    }

    /// Send `data` over a raw socket, hex encoded in chunks.
    pub fn send_socket_data(&self, socket: SocketHandle, data: &[u8]) -> Result<usize, Error> {
        for chunk in data.chunks(MAX_SEND_CHUNK) {
            let hex = encode_hex::<{ 2 * MAX_SEND_CHUNK }>(chunk)
                .map_err(|_| Error::InvalidPayload)?;
            self.send_at(&SendSocketData {
                socket,
                length: hex.len(),
                data: &hex,
            })?;
        }
        Ok(data.len())
    }

    /// Send `data` to a CoAP client. The modem expects the length field to be
    /// half the character count.
    pub fn send_coap_data(&self, socket: SocketHandle, data: &[u8]) -> Result<usize, Error> {
        if data.len() > MAX_COAP_PAYLOAD {
            return Err(Error::InvalidPayload);
        }
        let text = core::str::from_utf8(data).map_err(|_| Error::InvalidPayload)?;
        self.send_at(&SendCoapData {
            socket,
            length: data.len() / 2,
            data: text,
        })?;
        Ok(data.len())
    }
}
