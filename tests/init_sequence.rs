mod common;

use bd9995x_rs::data_types::{DcdcFrequency, PowerSaveMode};
use bd9995x_rs::error::Error;
use bd9995x_rs::{BankSelector, Bd9995x, Config};
use common::*;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

type Regs = BankSelector<NoopRawMutex, I2cMock>;

/// Everything after the two UCD updates, for the default config and [`BATTERY_INFO`].
fn after_ucd() -> Vec<I2cTrans> {
    vec![
        // CHGOP_SET1: BC1.2 auto charge off, auto ILIM off, SDP 500 / DCP 2500 select.
        rd(0x0B, 0x0000),
        wr(0x0B, 0xEF00),
        // CHGOP_SET2: USB_SUS and clock select cleared, 1.2 MHz.
        rd(0x0C, 0x0044),
        wr(0x0C, 0x0008),
        // VM_CTRL: EXTIADPEN off.
        rd(0x40, 0x0201),
        wr(0x40, 0x0001),
        // Input current 512 mA on both inputs.
        sel(BANK_BAT),
        wr(0x3C, 0x0200),
        wr(0x3D, 0x0200),
        // Charge current 3000 mA -> 2944 mA, precharge capped at 1024 mA.
        sel(BANK_EXT),
        wr(0x15, 1_024),
        sel(BANK_BAT),
        wr(0x14, 2_944),
        // Charge profile.
        sel(BANK_EXT),
        wr(0x17, 0x0080),
        wr(0x14, 0x0100),
        wr(0x1A, 0x21F0),
        wr(0x1B, 0x21F0),
        wr(0x1C, 0x21F0),
        wr(0x18, 0x1380),
        wr(0x1D, 0x21F0),
        wr(0x1E, 0x23F0),
        wr(0x19, 0x0000),
        wr(0x0F, 0x0000),
        // Power save off.
        wr(0x7A, 0x0000),
        // Discharge thresholds 3900 mV.
        wr(0x4C, 3_900),
        wr(0x4D, 3_900),
        // Debug bank tuning.
        wr(0x3E, 0x003C),
        sel(BANK_DBG),
        wr(0x14, 0x0202),
        wr(0x1A, 0x0080),
        sel(BANK_EXT),
        wr(0x3E, 0x0000),
    ]
}

#[test]
fn init_programs_defaults() {
    let mut expectations = vec![
        sel(BANK_EXT),
        // USBDETEN on, USB switch off.
        rd(0x28, 0x0002),
        wr(0x28, 0x0080),
        rd(0x30, 0x0000),
        wr(0x30, 0x0080),
    ];
    expectations.extend(after_ucd());
    let regs = Regs::new(I2cMock::new(&expectations));
    let mut chg = Bd9995x::new(&regs, RecordingDelay::default(), TestBattery::present(), Config::default());

    chg.init().unwrap();

    drop(chg);
    assert_eq!(regs.cached_bank(), Some(bd9995x_rs::data_types::Bank::Extended));
    regs.release().done();
}

#[test]
fn init_continues_after_failed_step() {
    let mut expectations = vec![
        sel(BANK_EXT),
        // VCC UCD read fails, so its write is skipped.
        rd_err(0x28),
        rd(0x30, 0x0000),
        wr(0x30, 0x0080),
    ];
    expectations.extend(after_ucd());
    let regs = Regs::new(I2cMock::new(&expectations));
    let mut chg = Bd9995x::new(&regs, RecordingDelay::default(), TestBattery::present(), Config::default());

    assert!(matches!(chg.init(), Err(Error::I2c(ErrorKind::Other))));

    drop(chg);
    regs.release().done();
}

#[test]
fn init_honours_board_options() {
    let config = Config {
        input_current_ma: 2_000,
        charge_current_ma: 512,
        power_save: PowerSaveMode::High,
        vbus_discharge: false,
        chg_en_control: true,
        dcdc_frequency: DcdcFrequency::Khz600,
        ..Config::default()
    };
    let expectations = [
        sel(BANK_EXT),
        rd(0x28, 0x0000),
        wr(0x28, 0x0080),
        rd(0x30, 0x0000),
        wr(0x30, 0x0080),
        rd(0x0B, 0x0000),
        wr(0x0B, 0xEF00),
        // 600 kHz clears the clock select; CHG_EN owned by the driver.
        rd(0x0C, 0x0008),
        wr(0x0C, 0x0080),
        rd(0x40, 0x0000),
        wr(0x40, 0x0000),
        sel(BANK_BAT),
        wr(0x3C, 1_984),
        wr(0x3D, 1_984),
        sel(BANK_EXT),
        wr(0x15, 512),
        sel(BANK_BAT),
        wr(0x14, 512),
        sel(BANK_EXT),
        wr(0x17, 0x0080),
        wr(0x14, 0x0100),
        wr(0x1A, 0x21F0),
        wr(0x1B, 0x21F0),
        wr(0x1C, 0x21F0),
        wr(0x18, 0x1380),
        wr(0x1D, 0x21F0),
        wr(0x1E, 0x23F0),
        wr(0x19, 0x0000),
        wr(0x0F, 0x0000),
        wr(0x7A, 0x0005),
        // No discharge thresholds.
        wr(0x3E, 0x003C),
        sel(BANK_DBG),
        wr(0x14, 0x0202),
        wr(0x1A, 0x0080),
        sel(BANK_EXT),
        wr(0x3E, 0x0000),
    ];
    let regs = Regs::new(I2cMock::new(&expectations));
    let mut chg = Bd9995x::new(&regs, RecordingDelay::default(), TestBattery::present(), config);

    chg.init().unwrap();

    drop(chg);
    regs.release().done();
}
