use embassy_time::Duration;
use embedded_io::{ErrorType, Read, ReadReady, Write};

use super::{OwnerToken, Socket, SocketHandle, SocketKind};
use crate::client::GsmClient;
use crate::command::ip_transport_layer::types::SocketStatus;
use crate::config::CellularConfig;
use crate::error::Error;
use crate::traits::Clock;

/// One virtual connection multiplexed over the client's transport.
///
/// The receive side is filled by the notification dispatcher whenever the
/// client waits on the transport, so reads never touch the modem. Dropping a
/// connection closes it.
pub struct Connection<'c, T, C, CFG>
where
    T: Read + Write + ReadReady,
    C: Clock,
    CFG: CellularConfig,
{
    client: &'c GsmClient<T, C, CFG>,
    kind: SocketKind,
    session: Option<(SocketHandle, OwnerToken)>,
}

impl<'c, T, C, CFG> Connection<'c, T, C, CFG>
where
    T: Read + Write + ReadReady,
    C: Clock,
    CFG: CellularConfig,
{
    pub fn new(client: &'c GsmClient<T, C, CFG>, kind: SocketKind) -> Self {
        Self {
            client,
            kind,
            session: None,
        }
    }

    /// A TCP socket in the modem's IP stack.
    pub fn tcp(client: &'c GsmClient<T, C, CFG>) -> Self {
        Self::new(client, SocketKind::Raw)
    }

    /// A CoAP client instance.
    pub fn coap(client: &'c GsmClient<T, C, CFG>) -> Self {
        Self::new(client, SocketKind::Coap)
    }

    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    /// Mux id of the current session.
    pub fn handle(&self) -> Option<SocketHandle> {
        self.session.map(|(handle, _)| handle)
    }

    /// Open a session to `host:port`, closing any previous one first.
    ///
    /// On success the connection is registered under the id the modem
    /// assigned, replacing whatever occupied that slot.
    pub fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<(), Error> {
        if let Err(e) = self.close() {
            warn!("Closing previous session failed: {:?}", e);
        }

        let handle = match self.kind {
            SocketKind::Raw => self.client.open_socket(host, port, timeout)?,
            SocketKind::Coap => self.client.open_coap(host, port, timeout)?,
        };

        let kind = self.kind;
        let owner = self.client.with_sockets(|sockets| {
            let owner = sockets.next_owner();
            sockets.register(handle, kind, owner).map(|_| owner)
        })??;

        self.session = Some((handle, owner));
        Ok(())
    }

    /// End the session. Calling this without a session is a no-op.
    ///
    /// The modem is only told to close the socket while this connection
    /// still owns its registry slot.
    pub fn close(&mut self) -> Result<(), Error> {
        let Some((handle, owner)) = self.session else {
            return Ok(());
        };

        let owned = self
            .client
            .with_sockets(|sockets| sockets.unregister(handle, owner))?;
        self.session = None;

        if owned {
            debug!("[{}] Closing {:?} session", handle, self.kind);
            self.client.close_socket(self.kind, handle)?;
        }
        Ok(())
    }

    fn with_socket<R>(&self, f: impl FnOnce(&mut Socket) -> R) -> Result<R, Error> {
        let (handle, owner) = self.session.ok_or(Error::NotConnected)?;
        self.client
            .with_sockets(|sockets| sockets.owned_mut(handle, owner).map(f))?
            .ok_or(Error::NotConnected)
    }

    /// Last known link state, as reported by notifications or the liveness
    /// probe.
    pub fn connected(&self) -> bool {
        self.with_socket(|s| s.is_connected()).unwrap_or(false)
    }

    /// Bytes waiting in the receive buffer.
    pub fn available(&self) -> usize {
        self.with_socket(|s| s.recv_queue()).unwrap_or(0)
    }

    /// Byte count the last data notification announced or delivered.
    pub fn available_hint(&self) -> usize {
        self.with_socket(|s| s.available_hint()).unwrap_or(0)
    }

    pub fn data_pending(&self) -> bool {
        self.with_socket(|s| s.data_pending()).unwrap_or(false)
    }

    /// Total bytes lost to receive buffer overflow.
    pub fn dropped(&self) -> usize {
        self.with_socket(|s| s.dropped()).unwrap_or(0)
    }

    /// Last condition the dispatcher recorded for this connection.
    pub fn take_error(&mut self) -> Option<Error> {
        self.with_socket(|s| s.take_error()).ok().flatten()
    }

    /// Copy buffered bytes into `buf` without waiting.
    pub fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.with_socket(|s| s.recv_slice(buf))
    }

    /// Send `data`, returning its full length on success.
    ///
    /// Raw sockets are probed with `+CSOSTATUS` first; a socket the modem
    /// does not report as connected fails without sending.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        let (handle, _) = self.session.ok_or(Error::NotConnected)?;
        self.client.maintain()?;

        if !self.with_socket(|s| s.is_connected())? {
            return Err(Error::NotConnected);
        }

        match self.kind {
            SocketKind::Raw => {
                match self.client.socket_status(handle) {
                    Ok(SocketStatus::Connected) => {}
                    Err(Error::Busy) => return Err(Error::Busy),
                    status => {
                        warn!("[{}] Liveness probe failed: {:?}", handle, status);
                        self.with_socket(|s| s.set_connected(false))?;
                        return Err(Error::NotConnected);
                    }
                }
                self.client.send_socket_data(handle, data)
            }
            SocketKind::Coap => self.client.send_coap_data(handle, data),
        }
    }
}

impl<T, C, CFG> Drop for Connection<'_, T, C, CFG>
where
    T: Read + Write + ReadReady,
    C: Clock,
    CFG: CellularConfig,
{
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close connection on drop: {:?}", e);
        }
    }
}

impl<T, C, CFG> ErrorType for Connection<'_, T, C, CFG>
where
    T: Read + Write + ReadReady,
    C: Clock,
    CFG: CellularConfig,
{
    type Error = Error;
}

impl<T, C, CFG> Read for Connection<'_, T, C, CFG>
where
    T: Read + Write + ReadReady,
    C: Clock,
    CFG: CellularConfig,
{
    /// Blocks, servicing notifications, until data arrives. Returns `Ok(0)`
    /// once the peer has closed and the buffer is drained.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let n = self.try_read(buf)?;
            if n > 0 || !self.connected() {
                return Ok(n);
            }
            self.client.maintain()?;
        }
    }
}

impl<T, C, CFG> ReadReady for Connection<'_, T, C, CFG>
where
    T: Read + Write + ReadReady,
    C: Clock,
    CFG: CellularConfig,
{
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        self.with_socket(|s| s.recv_queue() > 0 || !s.is_connected())
    }
}

impl<T, C, CFG> Write for Connection<'_, T, C, CFG>
where
    T: Read + Write + ReadReady,
    C: Clock,
    CFG: CellularConfig,
{
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Connection::write(self, buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
