//! Session states derived from status queries. None of these are cached:
//! every lifecycle gate asks the modem again.

/// EPS registration state reported in `+CEREG: <n>,<stat>`.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistrationStatus {
    #[default]
    Unknown,
    NotRegistered,
    Home,
    Searching,
    Denied,
    Roaming,
}

impl RegistrationStatus {
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Home | Self::Roaming)
    }
}

impl From<i32> for RegistrationStatus {
    fn from(v: i32) -> Self {
        match v {
            0 => Self::NotRegistered,
            1 => Self::Home,
            2 => Self::Searching,
            3 => Self::Denied,
            5 => Self::Roaming,
            _ => Self::Unknown,
        }
    }
}

/// Classification of the `+CPIN:` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SimStatus {
    /// Missing, not ready, or no reply
    Error,
    Ready,
    /// Waiting for PIN or PUK
    Locked,
}

impl SimStatus {
    /// Replies in the order they are passed to the matcher. `NOT READY` has
    /// to come before `READY`, which is a suffix of it.
    pub(crate) const REPLIES: [&'static [u8]; 5] = [
        b"NOT READY",
        b"READY",
        b"SIM PIN",
        b"SIM PUK",
        b"NOT INSERTED",
    ];

    /// Map the 1-based index of the matched reply.
    pub(crate) fn from_reply(index: usize) -> Self {
        match index {
            2 => SimStatus::Ready,
            3 | 4 => SimStatus::Locked,
            _ => SimStatus::Error,
        }
    }
}

/// `+CSQ: <rssi>,<ber>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalQuality {
    pub rssi: u8,
    pub ber: u8,
}

impl SignalQuality {
    /// Received signal strength in dBm, `None` when not detectable.
    pub fn dbm(&self) -> Option<i16> {
        match self.rssi {
            0..=31 => Some(-113 + 2 * self.rssi as i16),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_status_mapping() {
        assert_eq!(RegistrationStatus::from(0), RegistrationStatus::NotRegistered);
        assert_eq!(RegistrationStatus::from(2), RegistrationStatus::Searching);
        assert_eq!(RegistrationStatus::from(4), RegistrationStatus::Unknown);
        assert!(RegistrationStatus::from(1).is_registered());
        assert!(RegistrationStatus::from(5).is_registered());
        assert!(!RegistrationStatus::from(3).is_registered());
        assert!(!RegistrationStatus::from(-1).is_registered());
    }

    #[test]
    fn sim_reply_mapping() {
        assert_eq!(SimStatus::from_reply(0), SimStatus::Error);
        assert_eq!(SimStatus::from_reply(1), SimStatus::Error);
        assert_eq!(SimStatus::from_reply(2), SimStatus::Ready);
        assert_eq!(SimStatus::from_reply(3), SimStatus::Locked);
        assert_eq!(SimStatus::from_reply(4), SimStatus::Locked);
        assert_eq!(SimStatus::from_reply(5), SimStatus::Error);
    }

    #[test]
    fn not_ready_is_not_mistaken_for_ready() {
        let expect = crate::matcher::Expect::new(SimStatus::REPLIES.map(Some));
        assert_eq!(expect.matches(b" NOT READY"), Some(1));
        assert_eq!(expect.matches(b" READY"), Some(2));
    }

    #[test]
    fn signal_quality_in_dbm() {
        assert_eq!(SignalQuality { rssi: 0, ber: 99 }.dbm(), Some(-113));
        assert_eq!(SignalQuality { rssi: 31, ber: 0 }.dbm(), Some(-51));
        assert_eq!(SignalQuality { rssi: 99, ber: 99 }.dbm(), None);
    }
}
