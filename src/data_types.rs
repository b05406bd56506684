//! Data types for the BD9995x driver.

use crate::registers::{
    CHARGE_I_MAX, CHARGE_I_MIN, CHARGE_I_STEP, CHARGE_V_MAX, CHARGE_V_MIN, CHARGE_V_STEP, DCDC_CLK_SEL_SHIFT,
    INPUT_I_MAX, INPUT_I_MIN, INPUT_I_STEP, decode_ucd_type, ucd_type,
};

/// Number of physical charge inputs (VBUS and VCC).
pub const CHARGE_PORT_COUNT: usize = 2;

/// Command map selected through MAP_SET.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Bank {
    /// Battery charge command set (smart-charger compatible registers).
    BatteryCharge,
    /// Extended command set.
    Extended,
    /// Undocumented debug command set.
    Debug,
}

impl Bank {
    /// Value written to MAP_SET to select this bank.
    pub const fn code(self) -> u16 {
        match self {
            Bank::BatteryCharge => 0,
            Bank::Extended => 1,
            Bank::Debug => 2,
        }
    }

    /// Decode a MAP_SET value. Unknown codes yield `None`.
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Bank::BatteryCharge),
            1 => Some(Bank::Extended),
            2 => Some(Bank::Debug),
            _ => None,
        }
    }
}

/// Physical charge input.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChargePort {
    /// Primary input rail.
    Vbus,
    /// Secondary input rail.
    Vcc,
    /// Both rails. Only meaningful for routing and presence queries.
    Both,
}

impl ChargePort {
    /// The two physical ports in processing order.
    pub const PORTS: [ChargePort; CHARGE_PORT_COUNT] = [ChargePort::Vbus, ChargePort::Vcc];

    /// Index into per-port state arrays; `None` for [`ChargePort::Both`].
    pub const fn index(self) -> Option<usize> {
        match self {
            ChargePort::Vbus => Some(0),
            ChargePort::Vcc => Some(1),
            ChargePort::Both => None,
        }
    }

    /// Inverse of [`ChargePort::index`].
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ChargePort::Vbus),
            1 => Some(ChargePort::Vcc),
            _ => None,
        }
    }
}

/// BC1.2 classification of an attached supply.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SupplierType {
    #[default]
    None,
    /// Proprietary or unrecognised charger.
    Other,
    /// Charging downstream port.
    Bc12Cdp,
    /// Dedicated charging port.
    Bc12Dcp,
    /// Standard downstream port.
    Bc12Sdp,
}

impl SupplierType {
    /// Decode a raw VBUS/VCC UCD status value.
    pub fn from_ucd_status(raw: u16) -> Self {
        match decode_ucd_type(raw) {
            ucd_type::CDP => SupplierType::Bc12Cdp,
            ucd_type::DCP => SupplierType::Bc12Dcp,
            ucd_type::SDP => SupplierType::Bc12Sdp,
            ucd_type::PUP_PORT | ucd_type::OTHER => SupplierType::Other,
            _ => SupplierType::None,
        }
    }

    /// Input current limit advertised for this supplier.
    ///
    /// `Other` is capped at 1 A unless input current ramping is available, since pulling more
    /// from an unknown adapter can collapse it.
    pub const fn current_limit_ma(self, charge_ramp: bool) -> Option<u16> {
        match self {
            SupplierType::None => None,
            SupplierType::Bc12Cdp => Some(1_500),
            SupplierType::Bc12Dcp => Some(2_000),
            SupplierType::Bc12Sdp => Some(900),
            SupplierType::Other if charge_ramp => Some(2_400),
            SupplierType::Other => Some(1_000),
        }
    }
}

/// Supply capability reported to the charge manager.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChargePortInfo {
    pub voltage_mv: u16,
    pub current_ma: u16,
}

/// Charger operating limits.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChargerInfo {
    pub name: &'static str,
    pub voltage_max: u16,
    pub voltage_min: u16,
    pub voltage_step: u16,
    pub current_max: u16,
    pub current_min: u16,
    pub current_step: u16,
    pub input_current_max: u16,
    pub input_current_min: u16,
    pub input_current_step: u16,
}

/// Datasheet limits for the BD9995x family.
pub const BD9995X_CHARGER_INFO: ChargerInfo = ChargerInfo {
    name: "bd9995x",
    voltage_max: CHARGE_V_MAX,
    voltage_min: CHARGE_V_MIN,
    voltage_step: CHARGE_V_STEP,
    current_max: CHARGE_I_MAX,
    current_min: CHARGE_I_MIN,
    current_step: CHARGE_I_STEP,
    input_current_max: INPUT_I_MAX,
    input_current_min: INPUT_I_MIN,
    input_current_step: INPUT_I_STEP,
};

/// Battery pack parameters used for the charge profile.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BatteryInfo {
    pub voltage_max: u16,
    pub voltage_min: u16,
    pub precharge_current: u16,
}

/// SMBREG power save levels applied while no input is attached.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PowerSaveMode {
    #[default]
    Off,
    Low,
    Medium,
    High,
    Max,
}

impl PowerSaveMode {
    pub const fn bits(self) -> u16 {
        match self {
            PowerSaveMode::Off => 0,
            PowerSaveMode::Low => 1,
            PowerSaveMode::Medium => 2,
            PowerSaveMode::High => 5,
            PowerSaveMode::Max => 6,
        }
    }
}

/// DC/DC converter switching frequency (CHGOP_SET2 DCDC_CLK_SEL).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DcdcFrequency {
    Khz600,
    Khz857,
    #[default]
    Khz1200,
}

impl DcdcFrequency {
    pub const fn bits(self) -> u16 {
        let sel = match self {
            DcdcFrequency::Khz600 => 0,
            DcdcFrequency::Khz857 => 1,
            DcdcFrequency::Khz1200 => 2,
        };
        sel << DCDC_CLK_SEL_SHIFT
    }
}

/// Requested state of a port's USB D+/D- switch.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UsbSwitch {
    Connect,
    Disconnect,
    /// Re-apply the last connect/disconnect request, e.g. after the chip lost its settings.
    Restore,
}

/// Source measured by the current monitor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CurrentMonitor {
    /// Adapter input current (AMON), across the AC sense resistor.
    Adapter,
    /// Battery discharge current (BMON), across the battery sense resistor.
    Battery,
}

/// Current monitor amplifier gain (PMON_IOUT_CTRL_SET IOUT_GAIN_SET).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum IoutGain {
    V5,
    V10,
    #[default]
    V20,
    V40,
}

impl IoutGain {
    /// Field value before shifting into place.
    pub const fn select(self) -> u16 {
        match self {
            IoutGain::V5 => 0,
            IoutGain::V10 => 1,
            IoutGain::V20 => 2,
            IoutGain::V40 => 3,
        }
    }
}

/// Averaged current monitor result.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CurrentReading {
    pub current_ma: u32,
    /// Voltage across the sense resistor (uV).
    pub sense_uv: u32,
}

/// Battery thermistor range decoded from CHGOP_STATUS.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BatteryTemp {
    RoomTemp,
    Cold1,
    Cold2,
    Hot1,
    Hot2,
    Hot3,
    /// Thermistor open, no battery connected.
    BatteryOpen,
    Reserved,
}

impl BatteryTemp {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0 => BatteryTemp::RoomTemp,
            1 => BatteryTemp::Cold1,
            2 => BatteryTemp::Cold2,
            3 => BatteryTemp::Hot1,
            4 => BatteryTemp::Hot2,
            5 => BatteryTemp::Hot3,
            6 => BatteryTemp::BatteryOpen,
            _ => BatteryTemp::Reserved,
        }
    }
}

bitflags::bitflags! {
    /// Charger state summary returned by `get_status`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ChargerStatus: u16 {
        const LEVEL_2          = 1 << 0;
        const CHARGE_INHIBITED = 1 << 1;
        const ALARM_INHIBITED  = 1 << 2;
        const POWER_FAIL       = 1 << 3;
        const BATTERY_PRESENT  = 1 << 4;
        /// Battery temperature over range.
        const RES_OR           = 1 << 5;
        /// Battery temperature under range.
        const RES_UR           = 1 << 6;
        const RES_HOT          = 1 << 7;
        const RES_COLD         = 1 << 8;
        const AC_PRESENT       = 1 << 9;
    }

    /// Flags accepted by `set_mode`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ChargeModeFlags: u8 {
        /// Stop charging and regulate VSYS for discharge.
        const INHIBIT_CHARGE = 1 << 0;
        /// Reload OTPROM and reset every register.
        const POR_RESET      = 1 << 1;
        /// Program zero charge current and voltage.
        const RESET_TO_ZERO  = 1 << 2;
    }
}
