//! Responses for Packet domain Commands
use super::types::*;
use atat::atat_derive::AtatResp;
use heapless::String;

/// 5.2.6 PS attach or detach +CGATT
#[derive(Clone, AtatResp)]
pub struct GPRSAttached {
    #[at_arg(position = 0)]
    pub state: GPRSAttachedState,
}

/// 5.2.10 Show PDP address +CGPADDR
#[derive(Clone, AtatResp)]
pub struct PDPAddress {
    #[at_arg(position = 0)]
    pub cid: ContextId,
    #[at_arg(position = 1)]
    pub ip: String<64>,
}
