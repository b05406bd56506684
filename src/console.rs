//! Diagnostic register access for a debug console.
//!
//! Everything here goes through [`BankSelector`], so console pokes are serialized with the
//! charger and detection task like any other access.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::bank::BankSelector;
use crate::data_types::Bank;
use crate::error::Error;
use crate::registers::addr;

/// Battery charge bank registers shown by [`dump`].
pub const BATTERY_DUMP_REGS: [u8; 6] = [
    addr::CHG_CURRENT,
    addr::CHG_VOLTAGE,
    addr::IBUS_LIM_SET,
    addr::ICC_LIM_SET,
    addr::PROTECT_SET,
    addr::MAP_SET,
];

/// Extended registers shown by [`dump`] (`0x00..EXTENDED_DUMP_END`).
pub const EXTENDED_DUMP_END: u8 = 0x7F;

/// Read `reg` from the bank with MAP_SET code `bank_code`.
pub fn raw_read<M, I2C>(regs: &BankSelector<M, I2C>, reg: u8, bank_code: u16) -> Result<u16, Error<I2C::Error>>
where
    M: RawMutex,
    I2C: embedded_hal::i2c::I2c,
{
    let bank = Bank::from_code(bank_code).ok_or(Error::InvalidArgument)?;
    regs.read(reg, bank)
}

/// Write `value` to `reg` in the bank with MAP_SET code `bank_code`, then read it back.
pub fn raw_write<M, I2C>(
    regs: &BankSelector<M, I2C>,
    reg: u8,
    bank_code: u16,
    value: u16,
) -> Result<u16, Error<I2C::Error>>
where
    M: RawMutex,
    I2C: embedded_hal::i2c::I2c,
{
    let bank = Bank::from_code(bank_code).ok_or(Error::InvalidArgument)?;
    regs.write(reg, value, bank)?;
    regs.read(reg, bank)
}

/// Read every readable register, battery bank first, handing each result to `visit`.
pub fn dump<M, I2C, F>(regs: &BankSelector<M, I2C>, mut visit: F)
where
    M: RawMutex,
    I2C: embedded_hal::i2c::I2c,
    F: FnMut(Bank, u8, Result<u16, Error<I2C::Error>>),
{
    for reg in BATTERY_DUMP_REGS {
        visit(Bank::BatteryCharge, reg, regs.read(reg, Bank::BatteryCharge));
    }
    for reg in 0..EXTENDED_DUMP_END {
        visit(Bank::Extended, reg, regs.read(reg, Bank::Extended));
    }
}
