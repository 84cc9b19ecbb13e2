use embassy_time::Duration;
use embedded_io::{Read, ReadReady, Write};

use crate::client::{timeout_of, GsmClient};
use crate::command::control::{
    types::{Functionality, PowerSavingMode, SlowClockMode},
    PowerDown, Reset, SetFlowControlAndRate, SetModuleFunctionality, SetPowerSavingMode,
    SetSlowClock, StoreConfiguration,
};
use crate::command::device_lock::{GetPinStatus, SetPin};
use crate::command::network_service::{
    types::RegistrationUrcConfig, GetEPSNetworkRegistrationStatus, GetSignalQuality,
    SetEPSNetworkRegistrationStatus,
};
use crate::command::psn::SetPacketSwitchedEventReporting;
use crate::config::CellularConfig;
use crate::error::Error;
use crate::matcher::{Expect, ResponseBuffer};
use crate::registration::{RegistrationStatus, SignalQuality, SimStatus};
use crate::traits::Clock;

/// SIM, registration and radio queries.
pub trait GSM {
    /// Bring the modem to a known state and make sure the SIM is usable.
    ///
    /// A locked SIM is unlocked with the configured PIN. Without a PIN a
    /// locked SIM is accepted.
    fn init(&self) -> Result<(), Error>;

    /// Reset the modem, turn power saving off and run [`GSM::init`] again.
    fn restart(&self) -> Result<(), Error>;

    /// Shut the modem down. It only answers again after a power cycle.
    fn poweroff(&self) -> Result<(), Error>;

    /// Let the modem enter slow clock mode on its own.
    fn sleep_enable(&self, enabled: bool) -> Result<(), Error>;

    /// Query `+CPIN?` once.
    fn sim_status(&self) -> Result<SimStatus, Error>;

    /// Query the SIM until it answers or `timeout` elapses.
    fn wait_sim_status(&self, timeout: Duration) -> Result<SimStatus, Error>;

    fn unlock_sim(&self, pin: &str) -> Result<(), Error>;

    fn registration_status(&self) -> Result<RegistrationStatus, Error>;

    /// Registered on the home network or roaming.
    fn is_network_connected(&self) -> Result<bool, Error>;

    fn signal_quality(&self) -> Result<SignalQuality, Error>;

    fn radio_off(&self) -> Result<(), Error>;

    fn radio_on(&self) -> Result<(), Error>;

    /// Toggle the modem's registration and packet domain notifications and
    /// store the setting.
    fn set_reporting(&self, enabled: bool) -> Result<(), Error>;
}

impl<T, C, CFG> GSM for GsmClient<T, C, CFG>
where
    T: Read + Write + ReadReady,
    C: Clock,
    CFG: CellularConfig,
{
    fn init(&self) -> Result<(), Error> {
        if let Err(e) = self.set_reporting(false) {
            warn!("Failed to disable reporting: {:?}", e);
        }

        self.test_at(Duration::from_secs(10))?;
        self.send_at(&SetFlowControlAndRate).ok();

        match (self.wait_sim_status(CFG::SIM_TIMEOUT)?, CFG::PIN) {
            (SimStatus::Ready, _) | (SimStatus::Locked, None) => Ok(()),
            (SimStatus::Locked, Some(pin)) => {
                self.unlock_sim(pin)?;
                match self.wait_sim_status(CFG::SIM_TIMEOUT)? {
                    SimStatus::Ready => Ok(()),
                    status => Err(Error::Sim(status)),
                }
            }
            (status, _) => Err(Error::Sim(status)),
        }
    }

    fn restart(&self) -> Result<(), Error> {
        self.test_at(Duration::from_secs(10))?;
        self.send_at(&Reset)?;
        self.send_at(&SetPowerSavingMode {
            mode: PowerSavingMode::Disabled,
        })?;
        self.delay(CFG::RESET_SETTLE_TIME)?;
        self.init()
    }

    fn poweroff(&self) -> Result<(), Error> {
        self.send_at_expect(
            &PowerDown { mode: 1 },
            timeout_of::<PowerDown>(),
            &Expect::reply(b"NORMAL POWER DOWN"),
        )?;
        info!("Modem powered down");
        Ok(())
    }

    fn sleep_enable(&self, enabled: bool) -> Result<(), Error> {
        self.send_at(&SetSlowClock {
            mode: if enabled {
                SlowClockMode::Automatic
            } else {
                SlowClockMode::Disabled
            },
        })
    }

    fn sim_status(&self) -> Result<SimStatus, Error> {
        self.send_at_expect(
            &GetPinStatus,
            timeout_of::<GetPinStatus>(),
            &Expect::reply(b"\r\n+CPIN:"),
        )?;

        let index = match self.wait_response(
            timeout_of::<GetPinStatus>(),
            &Expect::new(SimStatus::REPLIES.map(Some)),
            &mut ResponseBuffer::new(),
        ) {
            Ok(index) => index,
            Err(Error::Timeout) => 0,
            Err(e) => return Err(e),
        };
        self.finish_reply();

        let status = SimStatus::from_reply(index);
        debug!("SIM status: {:?}", status);
        Ok(status)
    }

    fn wait_sim_status(&self, timeout: Duration) -> Result<SimStatus, Error> {
        let deadline = self.now()? + timeout;
        loop {
            match self.sim_status() {
                Ok(status) => return Ok(status),
                Err(Error::Busy) => return Err(Error::Busy),
                Err(_) => {}
            }
            if self.now()? >= deadline {
                return Ok(SimStatus::Error);
            }
            self.delay(CFG::SIM_POLL_INTERVAL)?;
        }
    }

    fn unlock_sim(&self, pin: &str) -> Result<(), Error> {
        self.send_at(&SetPin { pin })
    }

    fn registration_status(&self) -> Result<RegistrationStatus, Error> {
        let reply = self.send_query(
            &GetEPSNetworkRegistrationStatus,
            timeout_of::<GetEPSNetworkRegistrationStatus>(),
            b"+CEREG:",
        )?;
        Ok(RegistrationStatus::from(i32::from(reply.stat)))
    }

    fn is_network_connected(&self) -> Result<bool, Error> {
        Ok(self.registration_status()?.is_registered())
    }

    fn signal_quality(&self) -> Result<SignalQuality, Error> {
        let reply = self.send_query(
            &GetSignalQuality,
            timeout_of::<GetSignalQuality>(),
            b"+CSQ:",
        )?;
        Ok(SignalQuality {
            rssi: reply.rssi,
            ber: reply.ber,
        })
    }

    fn radio_off(&self) -> Result<(), Error> {
        self.send_at(&SetModuleFunctionality {
            fun: Functionality::Minimum,
        })?;
        self.delay(CFG::RADIO_SETTLE_TIME)
    }

    fn radio_on(&self) -> Result<(), Error> {
        self.send_at(&SetModuleFunctionality {
            fun: Functionality::Full,
        })?;
        self.delay(CFG::RADIO_SETTLE_TIME)
    }

    fn set_reporting(&self, enabled: bool) -> Result<(), Error> {
        self.send_at(&SetEPSNetworkRegistrationStatus {
            n: if enabled {
                RegistrationUrcConfig::UrcVerbose
            } else {
                RegistrationUrcConfig::UrcDisabled
            },
        })?;
        self.send_at(&SetPacketSwitchedEventReporting {
            mode: enabled as u8,
        })?;
        self.send_at(&StoreConfiguration)
    }
}
