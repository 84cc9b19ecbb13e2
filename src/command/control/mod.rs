//! ### 2 - 3GPP and V.25TER commands for equipment control
pub mod types;

use atat::atat_derive::AtatCmd;
use types::{Functionality, PowerSavingMode, SlowClockMode};

use super::NoResponse;

/// 3.2.9 Set phone functionality +CFUN
///
/// Selects the level of functionality in the MT. Minimum functionality
/// disables both transmit and receive RF circuits, which is how the radio is
/// power cycled when network registration stalls.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CFUN", NoResponse, timeout_ms = 10000)]
pub struct SetModuleFunctionality {
    #[at_arg(position = 0)]
    pub fun: Functionality,
}

/// 3.2.28 Reset +CRESET
///
/// Restarts the module. The command can take several seconds to answer.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CRESET", NoResponse, timeout_ms = 10000)]
pub struct Reset;

/// 3.2.40 Power saving mode setting +CPSMS
#[derive(Clone, AtatCmd)]
#[at_cmd("+CPSMS", NoResponse)]
pub struct SetPowerSavingMode {
    #[at_arg(position = 0)]
    pub mode: PowerSavingMode,
}

/// 4.2.2 Power off +CPOWD
///
/// Answers `NORMAL POWER DOWN` instead of `OK`.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CPOWD", NoResponse, timeout_ms = 10000)]
pub struct PowerDown {
    #[at_arg(position = 0)]
    pub mode: u8,
}

/// 4.2.4 Configure slow clock +CSCLK
#[derive(Clone, AtatCmd)]
#[at_cmd("+CSCLK", NoResponse)]
pub struct SetSlowClock {
    #[at_arg(position = 0)]
    pub mode: SlowClockMode,
}

/// 2.2.21 Save the current parameter configuration &W
#[derive(Clone, AtatCmd)]
#[at_cmd("&W", NoResponse, value_sep = false)]
pub struct StoreConfiguration;

/// 2.2.33 Set flow control and data rate
///
/// Disables hardware flow control and fixes the UART at 115200 baud in one
/// command line.
#[derive(Clone, AtatCmd)]
#[at_cmd("+IFC=0,0;+IPR=115200", NoResponse, value_sep = false)]
pub struct SetFlowControlAndRate;
