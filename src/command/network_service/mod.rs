//! ### 3 - Network service
pub mod responses;
pub mod types;

use atat::atat_derive::AtatCmd;
use responses::{EPSNetworkRegistrationStatus, SignalQualityReport};
use types::RegistrationUrcConfig;

use super::NoResponse;

/// 3.2.20 EPS network registration status +CEREG
///
/// Configures the `+CEREG:` unsolicited result code. It is kept disabled
/// while the driver polls registration itself.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CEREG", NoResponse)]
pub struct SetEPSNetworkRegistrationStatus {
    #[at_arg(position = 0)]
    pub n: RegistrationUrcConfig,
}

/// 3.2.20 EPS network registration status +CEREG
///
/// Replies with `+CEREG: <n>,<stat>[,...]`.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CEREG?", EPSNetworkRegistrationStatus)]
pub struct GetEPSNetworkRegistrationStatus;

/// 3.2.13 Signal quality report +CSQ
///
/// Replies with `+CSQ: <rssi>,<ber>`.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CSQ", SignalQualityReport)]
pub struct GetSignalQuality;
