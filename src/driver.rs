//! Charger control for the BD9995x.
//!
//! [`Bd9995x`] is the charge policy's handle on the chip: operating point (input current,
//! charge current and voltage), charge inhibit, resets and status. All register traffic goes
//! through the shared [`BankSelector`], which is the only lock involved.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::delay::DelayNs;

use crate::bank::BankSelector;
use crate::config::Config;
use crate::data_types::{
    Bank, BatteryTemp, ChargeModeFlags, ChargePort, ChargerInfo, ChargerStatus, CurrentMonitor, CurrentReading,
    PowerSaveMode, UsbSwitch,
};
use crate::error::Error;
use crate::interfaces::Battery;
use crate::registers::{
    CHARGE_VSYSREG_MV, CHIP_ID_BD99955, CHIP_ID_BD99956, ChgopSet2Bits, ChgopStatusBits, DISCHARGE_VSYSREG_MV,
    IOUT_GAIN_MASK, IOUT_GAIN_SHIFT, IPRECH_MAX, MONITOR_ADC_INTERVAL_US, MONITOR_ADC_SAMPLES, PMON_GAIN_MASK,
    PmonIoutCtrlBits, ProchotCtrlBits, SystemCtrlBits, SystemStatusBits, addr, charge_current_to_reg,
    charge_voltage_to_reg, decode_battemp, ext, input_current_to_reg, vsysreg_to_reg,
};

/// Status polls after a POR reset before giving up.
pub const OTPROM_LOAD_WAIT_RETRY: u32 = 3;
/// Delay before each POR status poll.
pub const OTPROM_LOAD_WAIT_MS: u32 = 10;
/// Settle time between lowering VSYS regulation and cutting the charge path.
pub const INHIBIT_SETTLE_MS: u32 = 50;
/// BGATE ramp time before VSYS regulation returns to the charge target.
///
/// BGATE capacitance 0.1 uF + 20 %, MOSFET threshold 2.8 V, pump current 3 uA: T = CV/I = 112 ms.
pub const BGATE_RAMP_MS: u32 = 115;

/// Charger control handle.
pub struct Bd9995x<'a, M: RawMutex, I2C, D, B> {
    regs: &'a BankSelector<M, I2C>,
    delay: D,
    battery: B,
    config: Config,
    /// Inhibit state last applied by `set_mode`; `None` until the first call.
    inhibited: Option<bool>,
}

impl<'a, M: RawMutex, I2C, D, B> Bd9995x<'a, M, I2C, D, B> {
    pub fn new(regs: &'a BankSelector<M, I2C>, delay: D, battery: B, config: Config) -> Self {
        Self {
            regs,
            delay,
            battery,
            config,
            inhibited: None,
        }
    }

    /// Charger limits.
    pub fn info(&self) -> &ChargerInfo {
        &self.config.info
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn battery(&self) -> &B {
        &self.battery
    }

    /// Shared register access, e.g. for the port helpers.
    pub fn registers(&self) -> &'a BankSelector<M, I2C> {
        self.regs
    }

    /// Give back the delay and battery handles.
    pub fn free(self) -> (D, B) {
        (self.delay, self.battery)
    }
}

impl<M: RawMutex, I2C, D, B> Bd9995x<'_, M, I2C, D, B>
where
    I2C: embedded_hal::i2c::I2c,
    D: DelayNs,
    B: Battery,
{
    /// Read CHIP_ID.
    pub fn device_id(&mut self) -> Result<u16, Error<I2C::Error>> {
        self.regs.read(ext::CHIP_ID, Bank::Extended)
    }

    /// Check that a supported BD9995x answers.
    pub fn probe(&mut self) -> Result<u16, Error<I2C::Error>> {
        match self.device_id()? {
            id @ (CHIP_ID_BD99955 | CHIP_ID_BD99956) => Ok(id),
            other => Err(Error::InvalidDevice(other)),
        }
    }

    /// Program the input current limit on both inputs (32 mA steps, clamped to the charger limits).
    ///
    /// The two limits are written one after the other. If the second write fails the first one
    /// has already taken effect; the error is returned as is.
    pub fn set_input_current(&mut self, ma: u16) -> Result<(), Error<I2C::Error>> {
        let value = input_current_to_reg(ma, &self.config.info);
        self.regs.write(addr::IBUS_LIM_SET, value, Bank::BatteryCharge)?;
        self.regs.write(addr::ICC_LIM_SET, value, Bank::BatteryCharge)
    }

    /// Input current limit currently in force (mA).
    pub fn get_input_current(&mut self) -> Result<u16, Error<I2C::Error>> {
        self.regs.read(ext::CUR_ILIM_VAL, Bank::Extended)
    }

    /// Program the fast-charge current (64 mA steps).
    ///
    /// Without a usable battery the floor is the no-battery minimum, so the system rail does not
    /// collapse; otherwise the charger minimum.
    pub fn set_current(&mut self, ma: u16) -> Result<(), Error<I2C::Error>> {
        let no_battery = !self.battery.is_present() || self.battery.is_cut_off();
        let value = charge_current_to_reg(ma, &self.config.info, no_battery);
        self.regs.write(ext::IPRECH_SET, value.min(IPRECH_MAX), Bank::Extended)?;
        self.regs.write(addr::CHG_CURRENT, value, Bank::BatteryCharge)
    }

    pub fn get_current(&mut self) -> Result<u16, Error<I2C::Error>> {
        self.regs.read(addr::CHG_CURRENT, Bank::BatteryCharge)
    }

    /// Program the charge voltage (16 mV steps).
    ///
    /// Zero, battery-learn mode, or a missing/cut-off battery all regulate to the battery's
    /// maximum voltage instead.
    pub fn set_voltage(&mut self, mv: u16) -> Result<(), Error<I2C::Error>> {
        let set2 = ChgopSet2Bits::from_bits_retain(self.regs.read(ext::CHGOP_SET2, Bank::Extended)?);
        let mv = if mv == 0
            || set2.contains(ChgopSet2Bits::BATT_LEARN)
            || !self.battery.is_present()
            || self.battery.is_cut_off()
        {
            self.battery.info().voltage_max
        } else {
            mv
        };
        let value = charge_voltage_to_reg(mv, &self.config.info);
        self.regs.write(addr::CHG_VOLTAGE, value, Bank::BatteryCharge)
    }

    pub fn get_voltage(&mut self) -> Result<u16, Error<I2C::Error>> {
        self.regs.read(addr::CHG_VOLTAGE, Bank::BatteryCharge)
    }

    /// Combined CHGOP_SET1 (low half) and CHGOP_SET2 (high half).
    pub fn get_option(&mut self) -> Result<u32, Error<I2C::Error>> {
        let low = self.regs.read(ext::CHGOP_SET1, Bank::Extended)?;
        let high = self.regs.read(ext::CHGOP_SET2, Bank::Extended)?;
        Ok(u32::from(low) | (u32::from(high) << 16))
    }

    pub fn set_option(&mut self, option: u32) -> Result<(), Error<I2C::Error>> {
        self.regs.write(ext::CHGOP_SET1, option as u16, Bank::Extended)?;
        self.regs.write(ext::CHGOP_SET2, (option >> 16) as u16, Bank::Extended)
    }

    /// Summarize charge enable, alarms, power fail, battery temperature and AC presence.
    pub fn get_status(&mut self) -> Result<ChargerStatus, Error<I2C::Error>> {
        let mut status = ChargerStatus::LEVEL_2;

        let set2 = ChgopSet2Bits::from_bits_retain(self.regs.read(ext::CHGOP_SET2, Bank::Extended)?);
        if !set2.contains(ChgopSet2Bits::CHG_EN) {
            status |= ChargerStatus::CHARGE_INHIBITED;
        }

        let prochot = ProchotCtrlBits::from_bits_retain(self.regs.read(ext::PROCHOT_CTRL_SET, Bank::Extended)?);
        if !prochot.intersects(ProchotCtrlBits::all()) {
            status |= ChargerStatus::ALARM_INHIBITED;
        }

        let op = self.regs.read(ext::CHGOP_STATUS, Bank::Extended)?;
        if !ChgopStatusBits::from_bits_retain(op).contains(ChgopStatusBits::RBOOST_UV) {
            status |= ChargerStatus::POWER_FAIL;
        }

        status |= ChargerStatus::BATTERY_PRESENT;
        match BatteryTemp::from_bits(decode_battemp(op)) {
            BatteryTemp::Cold1 => status |= ChargerStatus::RES_COLD,
            BatteryTemp::Cold2 => status |= ChargerStatus::RES_COLD | ChargerStatus::RES_UR,
            BatteryTemp::Hot1 | BatteryTemp::Hot2 => status |= ChargerStatus::RES_HOT,
            BatteryTemp::Hot3 => status |= ChargerStatus::RES_HOT | ChargerStatus::RES_OR,
            BatteryTemp::BatteryOpen => status.remove(ChargerStatus::BATTERY_PRESENT),
            BatteryTemp::RoomTemp | BatteryTemp::Reserved => {}
        }

        if self.regs.is_vbus_provided(ChargePort::Both)? {
            status |= ChargerStatus::AC_PRESENT;
        }
        Ok(status)
    }

    /// Apply charge mode flags.
    ///
    /// The inhibit flag only acts on a change. Inhibiting first drops VSYS regulation to the
    /// discharge target and waits for it to settle before cutting the charge path; releasing
    /// re-enables the charge path and waits for BGATE to ramp before restoring the charge
    /// target. POR reset and reset-to-zero run on every call that carries them.
    pub fn set_mode(&mut self, flags: ChargeModeFlags) -> Result<(), Error<I2C::Error>> {
        let inhibit = flags.contains(ChargeModeFlags::INHIBIT_CHARGE);
        if self.inhibited != Some(inhibit) {
            debug!("charge inhibit -> {:?}", inhibit);
            let result = if inhibit {
                let vsys = self.set_vsysreg(DISCHARGE_VSYSREG_MV);
                self.delay.delay_ms(INHIBIT_SETTLE_MS);
                let enable = self.charger_enable(false);
                vsys.and(enable)
            } else {
                let enable = self.charger_enable(true);
                self.delay.delay_ms(BGATE_RAMP_MS);
                let vsys = self.set_vsysreg(CHARGE_VSYSREG_MV);
                enable.and(vsys)
            };
            self.inhibited = Some(inhibit);
            result?;
        }

        if flags.contains(ChargeModeFlags::POR_RESET) {
            self.por_reset()?;
        }

        if flags.contains(ChargeModeFlags::RESET_TO_ZERO) {
            self.reset_to_zero()?;
        }

        Ok(())
    }

    /// Reload OTPROM and reset all registers, then wait for the chip to report both done.
    ///
    /// Gives up with [`Error::Timeout`] after [`OTPROM_LOAD_WAIT_RETRY`] polls; in that case
    /// the reset control register is left as written.
    pub fn por_reset(&mut self) -> Result<(), Error<I2C::Error>> {
        self.regs.write(
            ext::SYSTEM_CTRL_SET,
            (SystemCtrlBits::OTPLD | SystemCtrlBits::ALLRST).bits(),
            Bank::Extended,
        )?;
        // The reset puts the command map back to its default.
        self.regs.invalidate();

        let ready = SystemStatusBits::OTPLD_STATE | SystemStatusBits::ALLRST_STATE;
        let mut last = Ok(0);
        let mut done = false;
        for _ in 0..OTPROM_LOAD_WAIT_RETRY {
            self.delay.delay_ms(OTPROM_LOAD_WAIT_MS);
            last = self.regs.read(ext::SYSTEM_STATUS, Bank::Extended);
            if let Ok(raw) = last {
                if SystemStatusBits::from_bits_retain(raw).contains(ready) {
                    done = true;
                    break;
                }
            }
        }
        last?;
        if !done {
            error!("POR reset timed out");
            return Err(Error::Timeout);
        }

        self.regs.write(ext::SYSTEM_CTRL_SET, 0, Bank::Extended)
    }

    /// Program zero charge current and voltage (each subject to the usual floors).
    pub fn reset_to_zero(&mut self) -> Result<(), Error<I2C::Error>> {
        self.set_current(0)?;
        self.set_voltage(0)
    }

    /// Set or clear CHG_EN.
    ///
    /// With `chg_en_control`, a disable request is ignored until the battery is initialized so
    /// AC keeps reaching the pack.
    pub fn charger_enable(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        if self.config.chg_en_control && !enable && !self.battery.is_initialized() {
            return Ok(());
        }
        self.regs.update(ext::CHGOP_SET2, Bank::Extended, |v| {
            let mut bits = ChgopSet2Bits::from_bits_retain(v);
            bits.set(ChgopSet2Bits::CHG_EN, enable);
            bits.bits()
        })?;
        Ok(())
    }

    /// Program the VSYS regulation target (64 mV steps).
    pub fn set_vsysreg(&mut self, mv: u16) -> Result<(), Error<I2C::Error>> {
        self.regs.write(ext::VSYSREG_SET, vsysreg_to_reg(mv), Bank::Extended)
    }

    /// Enter or leave battery-learn mode (discharge on AC).
    ///
    /// USB charging and the DC/DC converter are suspended with it so learn mode does not exit on
    /// its own and VBUS drains quickly once AC goes away.
    pub fn discharge_on_ac(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.regs.update(ext::CHGOP_SET2, Bank::Extended, |v| {
            let mut bits = ChgopSet2Bits::from_bits_retain(v);
            bits.set(ChgopSet2Bits::BATT_LEARN | ChgopSet2Bits::USB_SUS, enable);
            bits.bits()
        })?;
        Ok(())
    }

    /// Higher of the VBUS and VCC input voltages (mV).
    pub fn vbus_level(&mut self) -> Result<u16, Error<I2C::Error>> {
        let vbus = self.regs.read(ext::VBUS_VAL, Bank::Extended)?;
        let vcc = self.regs.read(ext::VCC_VAL, Bank::Extended)?;
        Ok(vbus.max(vcc))
    }

    /// Battery voltage measured by the charger (mV).
    pub fn battery_voltage(&mut self) -> Result<u16, Error<I2C::Error>> {
        self.regs.read(ext::VBAT_VAL, Bank::Extended)
    }

    /// Battery thermistor temperature in degrees C (1 C steps, -55..=200 for sane readings).
    pub fn battery_temperature(&mut self) -> Result<i32, Error<I2C::Error>> {
        let raw = self.regs.read(ext::THERM_VAL, Bank::Extended)?;
        Ok(200 - i32::from(raw))
    }

    pub fn set_power_save_mode(&mut self, mode: PowerSaveMode) -> Result<(), Error<I2C::Error>> {
        self.regs.write(ext::SMBREG, mode.bits(), Bank::Extended)
    }

    /// Connect, disconnect or restore a port's USB data switch under the configured power save
    /// mode. See [`BankSelector::set_usb_switches`].
    pub fn set_usb_switches(&mut self, port: ChargePort, setting: UsbSwitch) -> Result<(), Error<I2C::Error>> {
        self.regs.set_usb_switches(port, setting, self.config.power_save)
    }

    /// Turn on the system power (PSYS) monitor with the configured gain.
    pub fn enable_psys(&mut self) -> Result<(), Error<I2C::Error>> {
        let gain = u16::from(self.config.psys_gain_select) & PMON_GAIN_MASK;
        self.regs.update(ext::PMON_IOUT_CTRL_SET, Bank::Extended, |v| {
            let bits = PmonIoutCtrlBits::from_bits_retain(v & !PMON_GAIN_MASK)
                | PmonIoutCtrlBits::PMON_INSEL
                | PmonIoutCtrlBits::PMON_OUT_EN;
            bits.bits() | gain
        })?;
        Ok(())
    }

    /// System power in mW, averaged over [`MONITOR_ADC_SAMPLES`] readings.
    ///
    /// Call [`Bd9995x::enable_psys`] first.
    pub fn system_power_mw(&mut self) -> Result<u32, Error<I2C::Error>> {
        let sum = self.sample_monitor(ext::PMON_DACIN_VAL)?;
        let gain = 1u64 << (self.config.psys_gain_select & PMON_GAIN_MASK as u8);
        Ok((sum * 1_000 / (gain * u64::from(MONITOR_ADC_SAMPLES))) as u32)
    }

    /// Route the adapter (AMON) or battery (BMON) current to the current monitor.
    pub fn enable_current_monitor(&mut self, source: CurrentMonitor) -> Result<(), Error<I2C::Error>> {
        let gain = self.config.iout_gain.select() << IOUT_GAIN_SHIFT;
        self.regs.update(ext::PMON_IOUT_CTRL_SET, Bank::Extended, |v| {
            let mut bits = PmonIoutCtrlBits::from_bits_retain(v & !IOUT_GAIN_MASK)
                | PmonIoutCtrlBits::IMON_INSEL
                | PmonIoutCtrlBits::IOUT_OUT_EN;
            bits.set(PmonIoutCtrlBits::IOUT_SOURCE_SEL, source == CurrentMonitor::Adapter);
            bits.bits() | gain
        })?;
        Ok(())
    }

    /// Select `source` on the current monitor and return its averaged current.
    pub fn monitor_current(&mut self, source: CurrentMonitor) -> Result<CurrentReading, Error<I2C::Error>> {
        self.enable_current_monitor(source)?;
        let sum = self.sample_monitor(ext::IOUT_DACIN_VAL)?;
        let scale = 5u64 << self.config.iout_gain.select();
        let current_ma = (sum * scale / (10 * u64::from(MONITOR_ADC_SAMPLES))) as u32;
        let sense_mohm = match source {
            CurrentMonitor::Adapter => self.config.sense_resistor_ac_mohm,
            CurrentMonitor::Battery => self.config.sense_resistor_mohm,
        };
        debug!("{:?} monitor: {} mA", source, current_ma);
        Ok(CurrentReading {
            current_ma,
            sense_uv: current_ma.saturating_mul(u32::from(sense_mohm)),
        })
    }

    /// Sum of [`MONITOR_ADC_SAMPLES`] readings of `reg`, one conversion interval apart.
    fn sample_monitor(&mut self, reg: u8) -> Result<u64, Error<I2C::Error>> {
        let mut sum = 0u64;
        for _ in 0..MONITOR_ADC_SAMPLES {
            sum += u64::from(self.regs.read(reg, Bank::Extended)?);
            self.delay.delay_us(MONITOR_ADC_INTERVAL_US);
        }
        Ok(sum)
    }
}
