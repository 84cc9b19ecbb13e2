//! Argument and parameter types used by equipment control commands
use atat::atat_derive::AtatEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Functionality {
    /// 0: Minimum functionality, RF circuits disabled
    Minimum = 0,
    /// 1: Full functionality
    Full = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerSavingMode {
    Disabled = 0,
    Enabled = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlowClockMode {
    /// 0: Slow clock disabled
    Disabled = 0,
    /// 2: The module decides on its own when to enter sleep
    Automatic = 2,
}
