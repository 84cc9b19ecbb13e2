use embassy_time::Duration;

use crate::command::psn::types::ContextId;

/// Compile time configuration of a [`GsmClient`](crate::client::GsmClient).
///
/// Every constant has a default matching the SIM7020 firmware behaviour, so
/// an application only overrides what differs for its carrier.
pub trait CellularConfig {
    /// PIN submitted once when the SIM reports it is locked
    const PIN: Option<&'static str> = None;
    const APN: Apn<'static> = Apn::None;
    const CONTEXT_ID: ContextId = ContextId(1);

    const PRIMARY_DNS: &'static str = "8.8.8.8";
    const SECONDARY_DNS: &'static str = "8.8.4.4";

    /// Bound for reading a single field of a reply or notification. Payload
    /// bytes are read with twice this budget.
    const STREAM_TIMEOUT: Duration = Duration::from_millis(1000);
    const MAINTAIN_TIMEOUT: Duration = Duration::from_millis(10);

    const SIM_TIMEOUT: Duration = Duration::from_secs(10);
    const SIM_POLL_INTERVAL: Duration = Duration::from_millis(1000);
    const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(120);
    const ATTACH_TIMEOUT: Duration = Duration::from_secs(120);
    const ACTIVATION_TIMEOUT: Duration = Duration::from_secs(120);
    const ACTIVATION_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);
    const POLL_INTERVAL: Duration = Duration::from_millis(250);
    const RADIO_SETTLE_TIME: Duration = Duration::from_secs(3);
    /// Wait after a reset before the modem is initialized again
    const RESET_SETTLE_TIME: Duration = Duration::from_secs(2);
}

#[derive(Debug, Clone)]
pub enum Apn<'a> {
    None,
    Given {
        name: &'a str,
        username: Option<&'a str>,
        password: Option<&'a str>,
    },
}

impl Default for Apn<'_> {
    fn default() -> Self {
        Self::None
    }
}

/// Configuration using the modem's default context and public DNS servers.
pub struct DefaultConfig;

impl CellularConfig for DefaultConfig {}
