//! Responses for CoAP Commands
use atat::atat_derive::AtatResp;

/// 10.2.1 Create a CoAP client instance +CCOAPNEW
#[derive(Clone, AtatResp)]
pub struct CreateCoapClientResponse {
    #[at_arg(position = 0)]
    pub socket: u8,
}
