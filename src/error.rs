//! Error definitions for the BD9995x driver.

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug)]
pub enum Error<I2cError> {
    /// Underlying I2C transaction failed.
    I2c(I2cError),
    /// A bounded wait on the hardware ran out of retries.
    Timeout,
    /// Parameter not valid for this operation (unknown bank code, `ChargePort::Both` on a
    /// per-port operation, ...).
    InvalidArgument,
    /// CHIP_ID did not match a supported part.
    InvalidDevice(u16),
}

impl<I2cError: core::fmt::Debug> core::fmt::Display for Error<I2cError> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {:?}", e),
            Error::Timeout => write!(f, "timed out waiting for the charger"),
            Error::InvalidArgument => write!(f, "invalid argument"),
            Error::InvalidDevice(id) => write!(f, "unexpected chip id {:#06x}", id),
        }
    }
}
