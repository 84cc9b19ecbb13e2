//! Prelude - Include traits
pub use super::config::CellularConfig;
pub use super::gprs::GPRS;
pub use super::gsm::GSM;
pub use super::traits::Clock;
