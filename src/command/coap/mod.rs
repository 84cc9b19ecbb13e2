//! ### 10 - CoAP commands
//!
//! A CoAP client instance is bound to a remote host when created, and is
//! addressed by the id the modem returns in `+CCOAPNEW: <id>`. Received
//! messages arrive as `+CCOAPNMI:` notifications.

pub mod responses;

use atat::atat_derive::AtatCmd;
use responses::CreateCoapClientResponse;

use super::psn::types::ContextId;
use super::NoResponse;
use crate::socket::SocketHandle;

/// 10.2.1 Create a CoAP client instance +CCOAPNEW
///
/// Replies with `+CCOAPNEW: <id>`.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CCOAPNEW", CreateCoapClientResponse, timeout_ms = 75000)]
pub struct CreateCoapClient<'a> {
    #[at_arg(position = 0, len = 128)]
    pub remote_host: &'a str,
    #[at_arg(position = 1)]
    pub remote_port: u16,
    #[at_arg(position = 2)]
    pub cid: ContextId,
}

/// 10.2.2 Send data over a CoAP client instance +CCOAPSEND
///
/// `length` is half the number of characters in `data`.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CCOAPSEND", NoResponse, timeout_ms = 2000)]
pub struct SendCoapData<'a> {
    #[at_arg(position = 0)]
    pub socket: SocketHandle,
    #[at_arg(position = 1)]
    pub length: usize,
    #[at_arg(position = 2, len = 1024)]
    pub data: &'a str,
}

/// 10.2.3 Destroy a CoAP client instance +CCOAPDEL
#[derive(Clone, AtatCmd)]
#[at_cmd("+CCOAPDEL", NoResponse)]
pub struct DeleteCoapClient {
    #[at_arg(position = 0)]
    pub socket: SocketHandle,
}
