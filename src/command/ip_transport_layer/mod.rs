//! ### 7 - TCP/IP commands
//!
//! Sockets are created in the modem's internal IP stack and addressed by the
//! id the modem assigns in `+CSOC: <id>`. Incoming data is pushed through the
//! `+CSONMI:` notification, and a failed socket reports `+CSOERR:`.
pub mod responses;
pub mod types;

use atat::atat_derive::AtatCmd;
use responses::{CreateSocketResponse, SocketStatusResponse};
use types::{SocketDomain, SocketProtocol, SocketType};

use super::NoResponse;
use crate::socket::SocketHandle;

/// 7.2.1 Create a TCP/UDP socket +CSOC
///
/// Replies with `+CSOC: <id>`.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CSOC", CreateSocketResponse, timeout_ms = 60000)]
pub struct CreateSocket {
    #[at_arg(position = 0)]
    pub domain: SocketDomain,
    #[at_arg(position = 1)]
    pub socket_type: SocketType,
    #[at_arg(position = 2)]
    pub protocol: SocketProtocol,
}

/// 7.2.2 Connect socket to remote address and port +CSOCON
#[derive(Clone, AtatCmd)]
#[at_cmd("+CSOCON", NoResponse, timeout_ms = 60000)]
pub struct ConnectSocket<'a> {
    #[at_arg(position = 0)]
    pub socket: SocketHandle,
    #[at_arg(position = 1)]
    pub remote_port: u16,
    #[at_arg(position = 2, len = 128)]
    pub remote_host: &'a str,
}

/// 7.2.4 Send data to remote via socket +CSOSEND
///
/// `data` is hex text and `length` counts its characters, not the bytes they
/// encode.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CSOSEND", NoResponse, timeout_ms = 2000)]
pub struct SendSocketData<'a> {
    #[at_arg(position = 0)]
    pub socket: SocketHandle,
    #[at_arg(position = 1)]
    pub length: usize,
    #[at_arg(position = 2, len = 1024)]
    pub data: &'a str,
}

/// 7.2.6 Close socket +CSOCL
#[derive(Clone, AtatCmd)]
#[at_cmd("+CSOCL", NoResponse)]
pub struct CloseSocket {
    #[at_arg(position = 0)]
    pub socket: SocketHandle,
}

/// 7.2.10 Get socket status +CSOSTATUS
///
/// Replies with `+CSOSTATUS: <id>,<status>`; status `2` means connected.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CSOSTATUS", SocketStatusResponse, timeout_ms = 2000)]
pub struct GetSocketStatus {
    #[at_arg(position = 0)]
    pub socket: SocketHandle,
}

/// 7.2.17 Configure domain name server +CDNSCFG
#[derive(Clone, AtatCmd)]
#[at_cmd("+CDNSCFG", NoResponse)]
pub struct SetDnsServers<'a> {
    #[at_arg(position = 0, len = 40)]
    pub primary: &'a str,
    #[at_arg(position = 1, len = 40)]
    pub secondary: &'a str,
}
