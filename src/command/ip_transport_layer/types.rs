//! Argument and parameter types used by TCP/IP Commands
use atat::atat_derive::AtatEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum SocketDomain {
    IPv4 = 1,
    IPv6 = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum SocketType {
    Stream = 1,
    Datagram = 2,
    Raw = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
pub enum SocketProtocol {
    Ip = 1,
    Icmp = 2,
}

/// Connection state reported in `+CSOSTATUS: <id>,<status>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketStatus {
    NotUsed,
    Allocated,
    Connected,
    Unknown(i32),
}

impl From<i32> for SocketStatus {
    fn from(v: i32) -> Self {
        match v {
            0 => SocketStatus::NotUsed,
            1 => SocketStatus::Allocated,
            2 => SocketStatus::Connected,
            n => SocketStatus::Unknown(n),
        }
    }
}
