//! Banked register access.
//!
//! Every register address on the BD9995x is interpreted relative to the command map selected
//! through MAP_SET. [`BankSelector`] owns the bus together with the last selected bank and
//! serializes each "select bank, then access register" pair under one lock, so concurrent users
//! (charge policy, port detection, console) never observe each other's bank switches.

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::data_types::{Bank, CHARGE_PORT_COUNT, UsbSwitch};
use crate::error::Error;
use crate::registers::{DEFAULT_I2C_ADDRESS, addr};

struct BankedBus<I2C> {
    i2c: I2C,
    /// `None` until a select succeeds, and again after any failed select.
    bank: Option<Bank>,
}

/// Bus handle plus command map cache for one charger chip.
pub struct BankSelector<M: RawMutex, I2C> {
    address: u8,
    inner: Mutex<M, RefCell<BankedBus<I2C>>>,
    /// Last connect/disconnect request per port, never `Restore`.
    pub(crate) switches: Mutex<M, Cell<[UsbSwitch; CHARGE_PORT_COUNT]>>,
}

impl<M: RawMutex, I2C> BankSelector<M, I2C> {
    /// Create a selector at the default I2C address (0x09).
    pub const fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_I2C_ADDRESS)
    }

    /// Create a selector with a custom I2C address.
    pub const fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            address,
            inner: Mutex::new(RefCell::new(BankedBus { i2c, bank: None })),
            switches: Mutex::new(Cell::new([UsbSwitch::Disconnect; CHARGE_PORT_COUNT])),
        }
    }

    /// 7-bit I2C address of the charger.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Bank the chip is known to have mapped, if any.
    pub fn cached_bank(&self) -> Option<Bank> {
        self.inner.lock(|bus| bus.borrow().bank)
    }

    /// Forget the cached bank so the next access re-selects.
    pub fn invalidate(&self) {
        self.inner.lock(|bus| bus.borrow_mut().bank = None);
    }

    /// Consume the selector and hand back the bus.
    pub fn release(self) -> I2C {
        self.inner.into_inner().into_inner().i2c
    }
}

impl<M: RawMutex, I2C> BankSelector<M, I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Read a 16-bit register from `bank`.
    pub fn read(&self, reg: u8, bank: Bank) -> Result<u16, Error<I2C::Error>> {
        self.inner.lock(|bus| {
            let mut bus = bus.borrow_mut();
            bus.select(self.address, bank)?;
            bus.read16(self.address, reg)
        })
    }

    /// Write a 16-bit register in `bank`.
    pub fn write(&self, reg: u8, value: u16, bank: Bank) -> Result<(), Error<I2C::Error>> {
        self.inner.lock(|bus| {
            let mut bus = bus.borrow_mut();
            bus.select(self.address, bank)?;
            bus.write16(self.address, reg, value)
        })
    }

    /// Read-modify-write a register. The read and the write are separate critical sections.
    ///
    /// Returns the value written.
    pub fn update<F>(&self, reg: u8, bank: Bank, f: F) -> Result<u16, Error<I2C::Error>>
    where
        F: FnOnce(u16) -> u16,
    {
        let value = f(self.read(reg, bank)?);
        self.write(reg, value, bank)?;
        Ok(value)
    }
}

impl<I2C> BankedBus<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn select(&mut self, address: u8, bank: Bank) -> Result<(), Error<I2C::Error>> {
        if self.bank == Some(bank) {
            return Ok(());
        }
        trace!("select bank {:?}", bank);
        match self.write16(address, addr::MAP_SET, bank.code()) {
            Ok(()) => {
                self.bank = Some(bank);
                Ok(())
            }
            Err(e) => {
                warn!("bank select {:?} failed", bank);
                self.bank = None;
                Err(e)
            }
        }
    }

    fn write16(&mut self, address: u8, reg: u8, value: u16) -> Result<(), Error<I2C::Error>> {
        let [lo, hi] = value.to_le_bytes();
        self.i2c.write(address, &[reg, lo, hi]).map_err(Error::I2c)
    }

    fn read16(&mut self, address: u8, reg: u8) -> Result<u16, Error<I2C::Error>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(address, &[reg], &mut buf)
            .map_err(Error::I2c)?;
        Ok(u16::from_le_bytes(buf))
    }
}
