//! ### 5 - Commands for packet domain
//!
//! On NB-IoT the PDP context is the default EPS bearer established during
//! attach. The SIM7020 keeps its definition in `*MCGDEFCONT`, which can only
//! be changed while the radio is at minimum functionality.
pub mod responses;
pub mod types;

use atat::atat_derive::AtatCmd;
use responses::{GPRSAttached, PDPAddress};
use types::{ContextId, GPRSAttachedState, PDPContextStatus};

use super::NoResponse;

/// 5.2.5 Packet domain event reporting +CGEREP
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGEREP", NoResponse)]
pub struct SetPacketSwitchedEventReporting {
    #[at_arg(position = 0)]
    pub mode: u8,
}

/// 5.2.6 Set PS attach or detach +CGATT
///
/// Any active PDP context is deactivated when the state changes to detached.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGATT", NoResponse, timeout_ms = 60000)]
pub struct SetGPRSAttached {
    #[at_arg(position = 0)]
    pub state: GPRSAttachedState,
}

/// 5.2.6 Read PS attach state +CGATT
///
/// Replies with `+CGATT: <state>`.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGATT?", GPRSAttached)]
pub struct GetGPRSAttached;

/// 5.2.7 PDP context activate or deactivate +CGACT
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGACT", NoResponse, timeout_ms = 60000)]
pub struct SetPDPContextState {
    #[at_arg(position = 0)]
    pub status: PDPContextStatus,
    #[at_arg(position = 1)]
    pub cid: ContextId,
}

/// 5.2.7 Read PDP context states +CGACT
///
/// Replies with one `+CGACT: <cid>,<state>` line per defined context.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGACT?", NoResponse)]
pub struct GetPDPContextState;

/// 5.2.10 Show PDP address +CGPADDR
///
/// Replies with `+CGPADDR: <cid>,"<address>"`.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGPADDR", PDPAddress)]
pub struct GetPDPAddress {
    #[at_arg(position = 0)]
    pub cid: ContextId,
}

/// 5.2.14 PDP context read dynamic parameters +CGCONTRDP
///
/// Used both to bring the bearer's IP configuration up after activation, and
/// to release it on teardown.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGCONTRDP", NoResponse, timeout_ms = 60000)]
pub struct ReadDynamicParameters;

/// 5.2.22 Set default PSD connection settings *MCGDEFCONT
///
/// Defines the APN used for the default bearer on the next attach.
#[derive(Clone, AtatCmd)]
#[at_cmd("*MCGDEFCONT", NoResponse, timeout_ms = 15000)]
pub struct SetDefaultContext<'a> {
    #[at_arg(position = 0, len = 6)]
    pub pdp_type: &'a str,
    #[at_arg(position = 1, len = 99)]
    pub apn: &'a str,
    #[at_arg(position = 2, len = 64)]
    pub username: Option<&'a str>,
    #[at_arg(position = 3, len = 64)]
    pub password: Option<&'a str>,
}
