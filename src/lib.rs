#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod gprs;
pub mod gsm;
pub mod hex;
pub mod matcher;
pub mod network;
pub mod prelude;
pub mod registration;
pub mod soc;
pub mod socket;
pub mod traits;
pub mod urc_handler;

mod port;

#[cfg(test)]
mod test_helpers;

pub use client::GsmClient;
pub use error::Error;
pub use network::{ConnectSequence, State};
pub use socket::{Connection, SocketHandle, SocketKind};
