use atat::atat_derive::AtatEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistrationUrcConfig {
    /// Disable network registration unsolicited result code
    UrcDisabled = 0,
    /// Enable `+CEREG: <stat>[,<tac>,<ci>,<AcT>]` unsolicited result code
    UrcVerbose = 2,
}
