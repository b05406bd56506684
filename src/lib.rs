//! BD9995x Rust Driver
//!
//! `no_std` driver for the ROHM BD99955/BD99956 narrow-VDC battery charger. The chip multiplexes
//! its 16-bit registers across several command maps; [`BankSelector`] serializes bank switching
//! for all users of the bus. On top of it sit charger control ([`Bd9995x`]), the one-shot init
//! sequence, and the USB charger port detection task ([`UsbCharger`]) that classifies BC1.2
//! supplies and feeds a charge manager.

#![no_std]

// This must go first, so the macros are visible to the other modules.
mod fmt;

pub mod bank;
pub mod config;
pub mod console;
pub mod data_types;
pub mod driver;
pub mod error;
pub mod init;
pub mod interfaces;
mod port;
pub mod registers;
pub mod usb_charger;

pub use bank::BankSelector;
pub use config::Config;
pub use driver::Bd9995x;
pub use error::Error;
pub use registers::DEFAULT_I2C_ADDRESS;
pub use usb_charger::UsbCharger;
