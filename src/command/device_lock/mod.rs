//! ### 3.2.7 - Device lock

use atat::atat_derive::AtatCmd;

use super::NoResponse;

/// 3.2.7 Enter PIN +CPIN
///
/// Reports whether a password is required. The reply is one of `READY`,
/// `SIM PIN`, `SIM PUK`, `NOT INSERTED` or `NOT READY`.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CPIN?", NoResponse)]
pub struct GetPinStatus;

/// 3.2.7 Enter PIN +CPIN
///
/// Enter PIN. If no PIN request is pending, the corresponding error code is
/// returned.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CPIN", NoResponse, timeout_ms = 10000)]
pub struct SetPin<'a> {
    #[at_arg(position = 0, len = 8)]
    pub pin: &'a str,
}
