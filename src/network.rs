//! The connection lifecycle as a pollable state machine.
//!
//! Each gate sends one status query per [`ConnectSequence::poll`] and either
//! moves on, asks to be polled again later, or fails once its own deadline
//! has passed. The caller decides how to wait between polls, see
//! [`GPRS::gprs_connect`](crate::gprs::GPRS::gprs_connect) for a blocking
//! driver.

use embassy_time::{Duration, Instant};
use embedded_io::{Read, ReadReady, Write};

use crate::client::GsmClient;
use crate::command::control::{types::Functionality, SetModuleFunctionality};
use crate::config::CellularConfig;
use crate::error::Error;
use crate::gprs::GPRS;
use crate::gsm::GSM;
use crate::registration::SimStatus;
use crate::traits::Clock;

/// Gates of the connection lifecycle, in traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    SimReady,
    DefineContext,
    Registering,
    RadioOff,
    RadioOn,
    Attaching,
    Activating,
    AwaitingActivation,
    Configuring,
    Connected,
}

impl State {
    /// Overall bound of a polling gate, `None` for single step states.
    fn timeout<CFG: CellularConfig>(self) -> Option<Duration> {
        match self {
            State::SimReady => Some(CFG::SIM_TIMEOUT),
            State::Registering => Some(CFG::REGISTRATION_TIMEOUT),
            State::Attaching => Some(CFG::ATTACH_TIMEOUT),
            State::AwaitingActivation => Some(CFG::ACTIVATION_TIMEOUT),
            _ => None,
        }
    }
}

/// Drives a [`GsmClient`] from SIM check to a configured data bearer.
///
/// Any failing gate ends the whole sequence and resets it, nothing of a
/// partial run is kept. Registration gets one recovery attempt: the radio is
/// cycled and the gate starts over.
#[derive(Debug)]
pub struct ConnectSequence {
    state: State,
    deadline: Option<Instant>,
    next_poll: Option<Instant>,
    pin_submitted: bool,
    radio_cycled: bool,
}

impl Default for ConnectSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectSequence {
    pub const fn new() -> Self {
        Self {
            state: State::SimReady,
            deadline: None,
            next_poll: None,
            pin_submitted: false,
            radio_cycled: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Earliest instant the next poll has work to do.
    pub fn wake_at(&self) -> Option<Instant> {
        self.next_poll
    }

    /// Advance the sequence by at most one gate query.
    ///
    /// Returns `WouldBlock` while a gate is pending and `Ok(())` once the
    /// bearer is configured.
    pub fn poll<T, C, CFG>(&mut self, client: &GsmClient<T, C, CFG>) -> nb::Result<(), Error>
    where
        T: Read + Write + ReadReady,
        C: Clock,
        CFG: CellularConfig,
    {
        let now = client.now()?;
        if let Some(at) = self.next_poll {
            if now < at {
                return Err(nb::Error::WouldBlock);
            }
        }
        self.next_poll = None;
        if self.deadline.is_none() {
            self.deadline = self.state.timeout::<CFG>().map(|t| now + t);
        }

        match self.step(client) {
            Ok(Some(next)) => {
                debug!("Connect sequence: {:?} -> {:?}", self.state, next);
                let settle = matches!(self.state, State::RadioOff | State::RadioOn);
                self.state = next;
                self.deadline = None;
                if next == State::Connected {
                    return Ok(());
                }
                if settle {
                    self.next_poll = Some(client.now()? + CFG::RADIO_SETTLE_TIME);
                }
                Err(nb::Error::WouldBlock)
            }
            Ok(None) => {
                let now = client.now()?;
                if self.deadline.map_or(false, |d| now >= d) {
                    if self.state == State::Registering && !self.radio_cycled {
                        warn!("Not registered, cycling the radio");
                        self.radio_cycled = true;
                        self.state = State::RadioOff;
                        self.deadline = None;
                        return Err(nb::Error::WouldBlock);
                    }
                    return Err(nb::Error::Other(self.fail(Error::StateTimeout(self.state))));
                }

                let interval = match self.state {
                    State::SimReady => CFG::SIM_POLL_INTERVAL,
                    _ => CFG::POLL_INTERVAL,
                };
                self.next_poll = Some(now + interval);
                Err(nb::Error::WouldBlock)
            }
            Err(Error::Busy) => Err(nb::Error::Other(Error::Busy)),
            Err(e) => Err(nb::Error::Other(self.fail(e))),
        }
    }

    fn fail(&mut self, e: Error) -> Error {
        error!("Connect sequence failed in {:?}: {:?}", self.state, e);
        *self = Self::new();
        e
    }

    /// Run the current gate once. `Ok(None)` means poll again.
    fn step<T, C, CFG>(&mut self, client: &GsmClient<T, C, CFG>) -> Result<Option<State>, Error>
    where
        T: Read + Write + ReadReady,
        C: Clock,
        CFG: CellularConfig,
    {
        match self.state {
            State::SimReady => match client.sim_status() {
                Ok(SimStatus::Ready) => Ok(Some(State::DefineContext)),
                Ok(SimStatus::Locked) => match CFG::PIN {
                    Some(pin) if !self.pin_submitted => {
                        self.pin_submitted = true;
                        client.unlock_sim(pin)?;
                        Ok(None)
                    }
                    Some(_) => Ok(None),
                    None => Err(Error::Sim(SimStatus::Locked)),
                },
                Ok(SimStatus::Error) => Ok(None),
                Err(Error::Busy) => Err(Error::Busy),
                Err(_) => Ok(None),
            },
            State::DefineContext => {
                client.define_context(&CFG::APN)?;
                Ok(Some(State::Registering))
            }
            State::Registering => match client.is_network_connected() {
                Ok(true) => {
                    if let Ok(quality) = client.signal_quality() {
                        debug!("Registered, signal quality {:?}", quality);
                    }
                    Ok(Some(State::Attaching))
                }
                Err(Error::Busy) => Err(Error::Busy),
                _ => Ok(None),
            },
            State::RadioOff => {
                client.send_at(&SetModuleFunctionality {
                    fun: Functionality::Minimum,
                })?;
                Ok(Some(State::RadioOn))
            }
            State::RadioOn => {
                client.send_at(&SetModuleFunctionality {
                    fun: Functionality::Full,
                })?;
                Ok(Some(State::Registering))
            }
            State::Attaching => match client.is_gprs_connected() {
                Ok(true) => Ok(Some(State::Activating)),
                Err(Error::Busy) => Err(Error::Busy),
                _ => Ok(None),
            },
            State::Activating => {
                if let Ok(true) = client.is_pdp_connected() {
                    return Ok(Some(State::Configuring));
                }
                if let Err(e) = client.activate_context() {
                    warn!("Context activation command failed: {:?}", e);
                }
                Ok(Some(State::AwaitingActivation))
            }
            State::AwaitingActivation => match client.is_pdp_connected() {
                Ok(true) => Ok(Some(State::Configuring)),
                Err(Error::Busy) => Err(Error::Busy),
                _ => Ok(None),
            },
            State::Configuring => {
                client.configure_bearer()?;
                Ok(Some(State::Connected))
            }
            State::Connected => Ok(Some(State::Connected)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{client, MockSerial};

    fn ready_modem(serial: &MockSerial) {
        serial.on("AT+CPIN?", "\r\n+CPIN: READY\r\n\r\nOK\r\n");
        serial.on("AT+CSQ", "\r\n+CSQ: 20,0\r\n\r\nOK\r\n");
        serial.on("AT+CFUN=", "\r\nOK\r\n");
    }

    #[test]
    fn full_sequence_connects() {
        let (client, serial, _) = client();
        ready_modem(&serial);
        serial.on("AT+CEREG?", "\r\n+CEREG: 0,1\r\n\r\nOK\r\n");
        serial.on("AT+CGATT?", "\r\n+CGATT: 1\r\n\r\nOK\r\n");
        serial.once("AT+CGACT?", "\r\n+CGACT: 1,0\r\n\r\nOK\r\n");
        serial.on("AT+CGACT?", "\r\n+CGACT: 1,1\r\n\r\nOK\r\n");
        serial.on("AT+CGACT=", "\r\nOK\r\n");
        serial.on("AT+CGCONTRDP", "\r\nOK\r\n");
        serial.on("AT+CDNSCFG=", "\r\nOK\r\n");

        assert_eq!(client.gprs_connect(), Ok(()));
        assert_eq!(
            serial.written(),
            "AT+CPIN?\r\nAT+CEREG?\r\nAT+CSQ\r\nAT+CGATT?\r\nAT+CGACT?\r\nAT+CGACT=1,1\r\n\
             AT+CGACT?\r\nAT+CGCONTRDP\r\nAT+CDNSCFG=\"8.8.8.8\",\"8.8.4.4\"\r\n"
        );
    }

    #[test]
    fn poll_advances_one_gate_at_a_time() {
        let (client, serial, _) = client();
        ready_modem(&serial);
        serial.on("AT+CEREG?", "\r\n+CEREG: 0,2\r\n\r\nOK\r\n");

        let mut sequence = ConnectSequence::new();
        assert_eq!(sequence.poll(&client), Err(nb::Error::WouldBlock));
        assert_eq!(sequence.state(), State::DefineContext);
        assert_eq!(sequence.poll(&client), Err(nb::Error::WouldBlock));
        assert_eq!(sequence.state(), State::Registering);

        serial.clear_written();
        assert_eq!(sequence.poll(&client), Err(nb::Error::WouldBlock));
        assert!(sequence.wake_at().is_some());
        assert_eq!(sequence.poll(&client), Err(nb::Error::WouldBlock));
        assert_eq!(serial.written(), "AT+CEREG?\r\n");
    }

    #[test]
    fn registration_timeout_skips_attach() {
        let (client, serial, _) = client();
        ready_modem(&serial);
        serial.on("AT+CEREG?", "\r\n+CEREG: 0,2\r\n\r\nOK\r\n");
        serial.on("AT+CGATT?", "\r\n+CGATT: 1\r\n\r\nOK\r\n");

        assert_eq!(
            client.gprs_connect(),
            Err(Error::StateTimeout(State::Registering))
        );

        let written = serial.written();
        assert_eq!(written.matches("AT+CFUN=0\r\n").count(), 1);
        assert_eq!(written.matches("AT+CFUN=1\r\n").count(), 1);
        assert!(!written.contains("AT+CGATT"));
        assert!(!written.contains("AT+CGACT"));
    }

    #[test]
    fn radio_cycle_recovers_registration() {
        let (client, serial, _) = client();
        ready_modem(&serial);
        serial.on("AT+CEREG?", "\r\n+CEREG: 0,2\r\n\r\nOK\r\n");
        serial.on("AT+CGATT?", "\r\n+CGATT: 1\r\n\r\nOK\r\n");
        serial.on("AT+CGACT?", "\r\n+CGACT: 1,1\r\n\r\nOK\r\n");
        serial.on("AT+CGCONTRDP", "\r\nOK\r\n");
        serial.on("AT+CDNSCFG=", "\r\nOK\r\n");

        let mut sequence = ConnectSequence::new();
        while sequence.state() != State::RadioOn {
            assert_eq!(sequence.poll(&client), Err(nb::Error::WouldBlock));
            client.delay(Duration::from_millis(10)).unwrap();
        }
        serial.once("AT+CEREG?", "\r\n+CEREG: 0,5\r\n\r\nOK\r\n");

        let result = loop {
            match sequence.poll(&client) {
                Err(nb::Error::WouldBlock) => client.delay(Duration::from_millis(10)).unwrap(),
                other => break other,
            }
        };
        assert_eq!(result, Ok(()));
        assert!(!serial.written().contains("AT+CGACT=1"));
    }

    #[test]
    fn locked_sim_without_pin_fails() {
        let (client, serial, _) = client();
        serial.on("AT+CPIN?", "\r\n+CPIN: SIM PIN\r\n\r\nOK\r\n");

        let mut sequence = ConnectSequence::new();
        assert_eq!(
            sequence.poll(&client),
            Err(nb::Error::Other(Error::Sim(SimStatus::Locked)))
        );
        assert_eq!(sequence.state(), State::SimReady);
        assert!(!serial.written().contains("AT+CPIN="));
    }

    #[test]
    fn missing_sim_times_out() {
        let (client, serial, _) = client();
        serial.on("AT+CPIN?", "\r\n+CPIN: NOT INSERTED\r\n\r\nOK\r\n");

        assert_eq!(
            client.gprs_connect(),
            Err(Error::StateTimeout(State::SimReady))
        );
        assert!(serial.written().matches("AT+CPIN?").count() > 1);
        assert!(!serial.written().contains("AT+CEREG"));
    }

    #[test]
    fn attach_timeout_skips_activation() {
        let (client, serial, _) = client();
        ready_modem(&serial);
        serial.on("AT+CEREG?", "\r\n+CEREG: 0,1\r\n\r\nOK\r\n");
        serial.on("AT+CGATT?", "\r\n+CGATT: 0\r\n\r\nOK\r\n");

        assert_eq!(
            client.gprs_connect(),
            Err(Error::StateTimeout(State::Attaching))
        );
        assert!(!serial.written().contains("AT+CGACT"));
    }

    #[test]
    fn dns_failure_aborts() {
        let (client, serial, _) = client();
        ready_modem(&serial);
        serial.on("AT+CEREG?", "\r\n+CEREG: 0,1\r\n\r\nOK\r\n");
        serial.on("AT+CGATT?", "\r\n+CGATT: 1\r\n\r\nOK\r\n");
        serial.on("AT+CGACT?", "\r\n+CGACT: 1,1\r\n\r\nOK\r\n");
        serial.on("AT+CGCONTRDP", "\r\nOK\r\n");
        serial.on("AT+CDNSCFG=", "\r\nERROR\r\n");

        assert_eq!(client.gprs_connect(), Err(Error::CommandRejected));
    }
}
