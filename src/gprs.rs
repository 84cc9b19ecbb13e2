use core::fmt::Write as _;
use core::net::Ipv4Addr;

use embassy_time::Duration;
use embedded_io::{Read, ReadReady, Write};
use heapless::String;

use crate::client::{timeout_of, GsmClient};
use crate::command::control::{types::Functionality, SetModuleFunctionality};
use crate::command::ip_transport_layer::SetDnsServers;
use crate::command::psn::{
    types::{GPRSAttachedState, PDPContextStatus},
    GetGPRSAttached, GetPDPAddress, GetPDPContextState, ReadDynamicParameters, SetDefaultContext,
    SetGPRSAttached, SetPDPContextState,
};
use crate::config::{Apn, CellularConfig};
use crate::error::Error;
use crate::matcher::{Expect, ERROR, OK};
use crate::network::ConnectSequence;
use crate::traits::Clock;

/// Packet data attach, context activation and teardown.
pub trait GPRS {
    /// Make `apn` the default bearer's APN. The radio is switched off while
    /// the context is redefined.
    fn define_context(&self, apn: &Apn<'_>) -> Result<(), Error>;

    /// `+CGATT?` reports an attached packet domain.
    fn is_gprs_connected(&self) -> Result<bool, Error>;

    /// `+CGACT?` lists the configured context as active.
    fn is_pdp_connected(&self) -> Result<bool, Error>;

    fn activate_context(&self) -> Result<(), Error>;

    /// Bring up the bearer's IP configuration and set the DNS servers.
    fn configure_bearer(&self) -> Result<(), Error>;

    fn local_ip(&self) -> Result<Ipv4Addr, Error>;

    /// Run the full [`ConnectSequence`] to completion.
    fn gprs_connect(&self) -> Result<(), Error>;

    /// Deactivate the context, detach and release the IP configuration.
    /// Stops at the first step that fails.
    fn gprs_disconnect(&self) -> Result<(), Error>;
}

impl<T, C, CFG> GPRS for GsmClient<T, C, CFG>
where
    T: Read + Write + ReadReady,
    C: Clock,
    CFG: CellularConfig,
{
    fn define_context(&self, apn: &Apn<'_>) -> Result<(), Error> {
        let Apn::Given {
            name,
            username,
            password,
        } = *apn
        else {
            return Ok(());
        };

        self.send_at_with_timeout(
            &SetModuleFunctionality {
                fun: Functionality::Minimum,
            },
            Duration::from_secs(15),
        )?;
        self.send_at(&SetDefaultContext {
            pdp_type: "IP",
            apn: name,
            username,
            password,
        })?;
        self.send_at(&SetModuleFunctionality {
            fun: Functionality::Full,
        })
    }

    fn is_gprs_connected(&self) -> Result<bool, Error> {
        let reply = self.send_query(
            &GetGPRSAttached,
            timeout_of::<GetGPRSAttached>(),
            b"+CGATT:",
        )?;
        Ok(reply.state == GPRSAttachedState::Attached)
    }

    fn is_pdp_connected(&self) -> Result<bool, Error> {
        // Fits, the context id is a u8.
        let mut active: String<24> = String::new();
        write!(active, "\r\n+CGACT: {},1\r\n", CFG::CONTEXT_ID.0).ok();

        let index = self.send_at_expect(
            &GetPDPContextState,
            timeout_of::<GetPDPContextState>(),
            &Expect::new([Some(active.as_bytes()), Some(OK), Some(ERROR), None, None]),
        )?;
        if index == 1 {
            self.finish_reply();
        }
        Ok(index == 1)
    }

    fn activate_context(&self) -> Result<(), Error> {
        self.send_at_with_timeout(
            &SetPDPContextState {
                status: PDPContextStatus::Activated,
                cid: CFG::CONTEXT_ID,
            },
            CFG::ACTIVATION_COMMAND_TIMEOUT,
        )
    }

    fn configure_bearer(&self) -> Result<(), Error> {
        self.send_at(&ReadDynamicParameters)?;
        self.send_at(&SetDnsServers {
            primary: CFG::PRIMARY_DNS,
            secondary: CFG::SECONDARY_DNS,
        })
    }

    fn local_ip(&self) -> Result<Ipv4Addr, Error> {
        let reply = self.send_query(
            &GetPDPAddress {
                cid: CFG::CONTEXT_ID,
            },
            timeout_of::<GetPDPAddress>(),
            b"+CGPADDR:",
        )?;
        reply.ip.parse().map_err(|_| Error::InvalidPayload)
    }

    fn gprs_connect(&self) -> Result<(), Error> {
        let mut sequence = ConnectSequence::new();
        loop {
            match sequence.poll(self) {
                Ok(()) => return Ok(()),
                Err(nb::Error::WouldBlock) => {
                    if let Some(at) = sequence.wake_at() {
                        let now = self.now()?;
                        if let Some(wait) = at.checked_duration_since(now) {
                            self.delay(wait)?;
                        }
                    }
                }
                Err(nb::Error::Other(e)) => return Err(e),
            }
        }
    }

    fn gprs_disconnect(&self) -> Result<(), Error> {
        self.send_at(&SetPDPContextState {
            status: PDPContextStatus::Deactivated,
            cid: CFG::CONTEXT_ID,
        })?;
        self.send_at(&SetGPRSAttached {
            state: GPRSAttachedState::Detached,
        })?;
        self.send_at(&ReadDynamicParameters)
    }
}
