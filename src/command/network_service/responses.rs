//! Responses for Network service Commands
use atat::atat_derive::AtatResp;
use heapless::String;

/// 3.2.20 EPS network registration status +CEREG
///
/// Location fields are only present for `<n>` of 2 and above.
#[derive(Clone, AtatResp)]
pub struct EPSNetworkRegistrationStatus {
    #[at_arg(position = 0)]
    pub n: u8,
    #[at_arg(position = 1)]
    pub stat: u8,
    #[at_arg(position = 2)]
    pub tac: Option<String<8>>,
    #[at_arg(position = 3)]
    pub ci: Option<String<16>>,
    #[at_arg(position = 4)]
    pub act: Option<u8>,
}

/// 3.2.13 Signal quality report +CSQ
#[derive(Clone, AtatResp)]
pub struct SignalQualityReport {
    #[at_arg(position = 0)]
    pub rssi: u8,
    #[at_arg(position = 1)]
    pub ber: u8,
}
