//! One-shot register programming at driver start.
//!
//! Bring-up is best effort: a failing step is logged and skipped, the remaining steps still
//! run, and the first error is reported once everything was attempted.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::delay::DelayNs;

use crate::data_types::Bank;
use crate::driver::Bd9995x;
use crate::error::Error;
use crate::interfaces::Battery;
use crate::registers::{
    ChgopSet1Bits, ChgopSet2Bits, DEBUG_UNLOCK_KEY, UcdSetBits, VBUS_DISCHARGE_TH_MV, VmCtrlBits, dbg, ext,
};

/// Debug bank tuning applied at the end of init: unlock, reverse current threshold -50 mV,
/// internal gain 2x, re-lock. Order matters.
pub const DEBUG_TUNING: [(u8, u16, Bank); 4] = [
    (ext::EXT_PROTECT_SET, DEBUG_UNLOCK_KEY, Bank::Extended),
    (dbg::REVERSE_CURRENT_TH, 0x0202, Bank::Debug),
    (dbg::INTERNAL_GAIN, 0x0080, Bank::Debug),
    (ext::EXT_PROTECT_SET, 0x0000, Bank::Extended),
];

/// Keeps the first error of a best-effort sequence.
struct FirstError<E> {
    first: Option<Error<E>>,
}

impl<E> FirstError<E> {
    fn new() -> Self {
        Self { first: None }
    }

    fn step<T>(&mut self, what: &'static str, result: Result<T, Error<E>>) {
        if let Err(e) = result {
            warn!("init step {} failed", what);
            if self.first.is_none() {
                self.first = Some(e);
            }
        }
    }

    fn finish(self) -> Result<(), Error<E>> {
        match self.first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<M: RawMutex, I2C, D, B> Bd9995x<'_, M, I2C, D, B>
where
    I2C: embedded_hal::i2c::I2c,
    D: DelayNs,
    B: Battery,
{
    /// Program detection, converter and charge profile defaults.
    pub fn init(&mut self) -> Result<(), Error<I2C::Error>> {
        let regs = self.registers();
        let config = *self.config();
        let mut steps = FirstError::new();

        // BC1.2 detection on both inputs, USB data switch open.
        for reg in [ext::VCC_UCD_SET, ext::VBUS_UCD_SET] {
            steps.step(
                "ucd",
                regs.update(reg, Bank::Extended, |v| {
                    let mut bits = UcdSetBits::from_bits_retain(v);
                    bits.insert(UcdSetBits::USBDETEN);
                    bits.remove(UcdSetBits::USB_SW_EN);
                    bits.bits()
                }),
            );
        }

        // No autonomous charging on BC1.2 results, no automatic input current limit.
        steps.step(
            "chgop_set1",
            regs.update(ext::CHGOP_SET1, Bank::Extended, |v| {
                (ChgopSet1Bits::from_bits_retain(v)
                    | ChgopSet1Bits::SDP_CHG_TRIG_EN
                    | ChgopSet1Bits::SDP_CHG_TRIG
                    | ChgopSet1Bits::VBUS_BC_DISEN
                    | ChgopSet1Bits::VCC_BC_DISEN
                    | ChgopSet1Bits::ILIM_AUTO_DISEN
                    | ChgopSet1Bits::SDP_500_SEL
                    | ChgopSet1Bits::DCP_2500_SEL)
                    .bits()
            }),
        );

        steps.step(
            "chgop_set2",
            regs.update(ext::CHGOP_SET2, Bank::Extended, |v| {
                let mut bits = ChgopSet2Bits::from_bits_retain(v);
                bits.remove(ChgopSet2Bits::USB_SUS | ChgopSet2Bits::DCDC_CLK_SEL0 | ChgopSet2Bits::DCDC_CLK_SEL1);
                bits |= ChgopSet2Bits::from_bits_retain(config.dcdc_frequency.bits());
                if config.chg_en_control {
                    bits.insert(ChgopSet2Bits::CHG_EN);
                }
                bits.bits()
            }),
        );

        // External IADP pin current limit off.
        steps.step(
            "vm_ctrl",
            regs.update(ext::VM_CTRL_SET, Bank::Extended, |v| {
                (VmCtrlBits::from_bits_retain(v) - VmCtrlBits::EXTIADPEN).bits()
            }),
        );

        self.charge_profile(&mut steps);

        steps.step("power_save", self.set_power_save_mode(config.power_save));

        if config.vbus_discharge {
            steps.step("vbus_th", regs.write(ext::VBUS_TH_SET, VBUS_DISCHARGE_TH_MV, Bank::Extended));
            steps.step("vcc_th", regs.write(ext::VCC_TH_SET, VBUS_DISCHARGE_TH_MV, Bank::Extended));
        }

        for (reg, value, bank) in DEBUG_TUNING {
            steps.step("debug", regs.write(reg, value, bank));
        }

        info!("bd9995x init done");
        steps.finish()
    }

    fn charge_profile(&mut self, steps: &mut FirstError<I2C::Error>) {
        let regs = self.registers();
        let config = *self.config();
        let battery = self.battery().info();

        steps.step("input_current", self.set_input_current(config.input_current_ma));
        steps.step("charge_current", self.set_current(config.charge_current_ma));

        let vmax = battery.voltage_max & 0x7FF0;
        let writes = [
            (ext::ITERM_SET, config.info.current_min & 0x07C0),
            (ext::ITRICH_SET, battery.precharge_current & 0x07C0),
            (ext::VFASTCHG_REG_SET1, vmax),
            (ext::VFASTCHG_REG_SET2, vmax),
            (ext::VFASTCHG_REG_SET3, vmax),
            (ext::VPRECHG_TH_SET, battery.voltage_min.saturating_sub(1_000) & 0x7FC0),
            (ext::VRECHG_SET, vmax),
            (ext::VBATOVP_SET, battery.voltage_max.saturating_add(500) & 0x7FF0),
            (ext::VRBOOST_SET, 0),
            // Fast/pre-charge watchdog off.
            (ext::CHGWDT_SET, 0),
        ];
        for (reg, value) in writes {
            steps.step("profile", regs.write(reg, value, Bank::Extended));
        }
    }
}
