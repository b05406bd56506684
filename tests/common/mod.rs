#![allow(dead_code)]

use bd9995x_rs::data_types::{BatteryInfo, ChargePortInfo, SupplierType};
use bd9995x_rs::interfaces::{Battery, ChargeManager, DischargeControl};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::i2c::Transaction as I2cTrans;

pub const ADDR: u8 = 0x09;
pub const MAP_SET: u8 = 0x3F;

pub const BANK_BAT: u16 = 0;
pub const BANK_EXT: u16 = 1;
pub const BANK_DBG: u16 = 2;

/// 16-bit little-endian register write.
pub fn wr(reg: u8, value: u16) -> I2cTrans {
    let [lo, hi] = value.to_le_bytes();
    I2cTrans::write(ADDR, vec![reg, lo, hi])
}

/// 16-bit little-endian register read returning `value`.
pub fn rd(reg: u8, value: u16) -> I2cTrans {
    I2cTrans::write_read(ADDR, vec![reg], value.to_le_bytes().to_vec())
}

pub fn wr_err(reg: u8, value: u16) -> I2cTrans {
    wr(reg, value).with_error(ErrorKind::Other)
}

pub fn rd_err(reg: u8) -> I2cTrans {
    rd(reg, 0).with_error(ErrorKind::Other)
}

/// MAP_SET write selecting `bank`.
pub fn sel(bank: u16) -> I2cTrans {
    wr(MAP_SET, bank)
}

/// Delay that records every millisecond and microsecond request instead of sleeping.
#[derive(Default)]
pub struct RecordingDelay {
    pub ms: Vec<u32>,
    pub us: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_us(&mut self, us: u32) {
        self.us.push(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.ms.push(ms);
    }
}

pub struct TestBattery {
    pub present: bool,
    pub cut_off: bool,
    pub initialized: bool,
}

pub const BATTERY_INFO: BatteryInfo = BatteryInfo {
    voltage_max: 8_700,
    voltage_min: 6_000,
    precharge_current: 256,
};

impl TestBattery {
    pub fn present() -> Self {
        Self {
            present: true,
            cut_off: false,
            initialized: true,
        }
    }

    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::present()
        }
    }
}

impl Battery for TestBattery {
    fn is_present(&self) -> bool {
        self.present
    }

    fn is_cut_off(&self) -> bool {
        self.cut_off
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn info(&self) -> BatteryInfo {
        BATTERY_INFO
    }
}

#[derive(Default)]
pub struct RecordingManager {
    pub reports: Vec<(SupplierType, usize, ChargePortInfo)>,
    pub vbus: Vec<(usize, bool)>,
    pub sourcing: [bool; 2],
}

impl ChargeManager for RecordingManager {
    fn update_charge(&mut self, supplier: SupplierType, port: usize, charge: ChargePortInfo) {
        self.reports.push((supplier, port, charge));
    }

    fn vbus_change(&mut self, port: usize, present: bool) {
        self.vbus.push((port, present));
    }

    fn is_sourcing_vbus(&self, port: usize) -> bool {
        self.sourcing[port]
    }
}

#[derive(Default)]
pub struct RecordingDischarge {
    pub calls: Vec<(usize, bool)>,
}

impl DischargeControl for RecordingDischarge {
    fn set_discharge(&mut self, port: usize, enabled: bool) {
        self.calls.push((port, enabled));
    }
}

pub fn charge(voltage_mv: u16, current_ma: u16) -> ChargePortInfo {
    ChargePortInfo { voltage_mv, current_ma }
}
