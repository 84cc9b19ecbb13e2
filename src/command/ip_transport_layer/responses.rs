//! Responses for TCP/IP Commands
use atat::atat_derive::AtatResp;

/// 7.2.1 Create a TCP/UDP socket +CSOC
#[derive(Clone, AtatResp)]
pub struct CreateSocketResponse {
    #[at_arg(position = 0)]
    pub socket: u8,
}

/// 7.2.10 Get socket status +CSOSTATUS
#[derive(Clone, AtatResp)]
pub struct SocketStatusResponse {
    #[at_arg(position = 0)]
    pub socket: u8,
    #[at_arg(position = 1)]
    pub status: u8,
}
