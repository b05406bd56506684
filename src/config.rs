//! Board-level driver configuration.

use crate::data_types::{BD9995X_CHARGER_INFO, ChargerInfo, DcdcFrequency, IoutGain, PowerSaveMode};

/// Fixed at construction; shared by the charger, the init sequence and the detection task.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// Charger limits used for clamping.
    pub info: ChargerInfo,
    /// Input current limit programmed at init (mA).
    pub input_current_ma: u16,
    /// Fast-charge current programmed at init (mA).
    pub charge_current_ma: u16,
    /// Power save level used while no USB data switch is connected.
    pub power_save: PowerSaveMode,
    /// Drive the external VBUS discharge path from the threshold interrupts.
    pub vbus_discharge: bool,
    /// Input current ramping is available, so unknown chargers may be offered more current.
    pub charge_ramp: bool,
    /// The driver owns CHGOP_SET2.CHG_EN (set at init, held on until the battery is initialized).
    pub chg_en_control: bool,
    pub dcdc_frequency: DcdcFrequency,
    /// System power monitor gain select (0..=7). Readings scale with `2^select`.
    pub psys_gain_select: u8,
    pub iout_gain: IoutGain,
    /// Battery current sense resistor (mOhm).
    pub sense_resistor_mohm: u16,
    /// Adapter current sense resistor (mOhm).
    pub sense_resistor_ac_mohm: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            info: BD9995X_CHARGER_INFO,
            input_current_ma: 512,
            charge_current_ma: 3_000,
            power_save: PowerSaveMode::Off,
            vbus_discharge: true,
            charge_ramp: false,
            chg_en_control: false,
            dcdc_frequency: DcdcFrequency::Khz1200,
            psys_gain_select: 2,
            iout_gain: IoutGain::V20,
            sense_resistor_mohm: 10,
            sense_resistor_ac_mohm: 10,
        }
    }
}
