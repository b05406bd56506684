//! Register map and constants for the BD9995x.
//!
//! The chip exposes a 7-bit register window whose meaning depends on the command map selected
//! through [`addr::MAP_SET`]. Addresses below are grouped by the bank they live in.

use crate::data_types::ChargerInfo;

/// Fixed 7-bit I2C address.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x09;

/// CHIP_ID value reported by the BD99955.
pub const CHIP_ID_BD99955: u16 = 0x0221;
/// CHIP_ID value reported by the BD99956.
pub const CHIP_ID_BD99956: u16 = 0x0222;

/// Battery charge command set (bank 0).
pub mod addr {
    /// Fast-charge current (64 mA LSB).
    pub const CHG_CURRENT: u8 = 0x14;
    /// Charge voltage (16 mV LSB).
    pub const CHG_VOLTAGE: u8 = 0x15;
    /// VBUS input current limit (32 mA LSB).
    pub const IBUS_LIM_SET: u8 = 0x3C;
    /// VCC input current limit (32 mA LSB).
    pub const ICC_LIM_SET: u8 = 0x3D;
    pub const PROTECT_SET: u8 = 0x3E;
    /// Command map select. Present at the same address in every bank.
    pub const MAP_SET: u8 = 0x3F;
}

/// Extended command set (bank 1).
pub mod ext {
    pub const CHGSTM_STATUS: u8 = 0x00;
    pub const VBAT_VSYS_STATUS: u8 = 0x01;
    pub const VBUS_VCC_STATUS: u8 = 0x02;
    pub const CHGOP_STATUS: u8 = 0x03;
    pub const WDT_STATUS: u8 = 0x04;
    pub const CUR_ILIM_VAL: u8 = 0x05;
    pub const SEL_ILIM_VAL: u8 = 0x06;
    pub const EXT_IBUS_LIM_SET: u8 = 0x07;
    pub const EXT_ICC_LIM_SET: u8 = 0x08;
    pub const IOTG_LIM_SET: u8 = 0x09;
    pub const VIN_CTRL_SET: u8 = 0x0A;
    pub const CHGOP_SET1: u8 = 0x0B;
    pub const CHGOP_SET2: u8 = 0x0C;
    pub const VBUSCLPS_TH_SET: u8 = 0x0D;
    pub const VCCCLPS_TH_SET: u8 = 0x0E;
    pub const CHGWDT_SET: u8 = 0x0F;
    pub const BATTWDT_SET: u8 = 0x10;
    /// System voltage regulation (64 mV LSB).
    pub const VSYSREG_SET: u8 = 0x11;
    pub const VSYSVAL_THH_SET: u8 = 0x12;
    pub const VSYSVAL_THL_SET: u8 = 0x13;
    pub const ITRICH_SET: u8 = 0x14;
    pub const IPRECH_SET: u8 = 0x15;
    pub const ICHG_SET: u8 = 0x16;
    pub const ITERM_SET: u8 = 0x17;
    pub const VPRECHG_TH_SET: u8 = 0x18;
    pub const VRBOOST_SET: u8 = 0x19;
    pub const VFASTCHG_REG_SET1: u8 = 0x1A;
    pub const VFASTCHG_REG_SET2: u8 = 0x1B;
    pub const VFASTCHG_REG_SET3: u8 = 0x1C;
    pub const VRECHG_SET: u8 = 0x1D;
    pub const VBATOVP_SET: u8 = 0x1E;
    pub const IBATSHORT_SET: u8 = 0x1F;
    pub const PROCHOT_CTRL_SET: u8 = 0x20;
    pub const VCC_UCD_SET: u8 = 0x28;
    pub const VCC_UCD_STATUS: u8 = 0x29;
    pub const VBUS_UCD_SET: u8 = 0x30;
    pub const VBUS_UCD_STATUS: u8 = 0x31;
    pub const CHIP_ID: u8 = 0x38;
    pub const CHIP_REV: u8 = 0x39;
    pub const SYSTEM_STATUS: u8 = 0x3C;
    pub const SYSTEM_CTRL_SET: u8 = 0x3D;
    /// Debug register lock. Writing the unlock key opens the debug bank for writes.
    pub const EXT_PROTECT_SET: u8 = 0x3E;
    pub const VM_CTRL_SET: u8 = 0x40;
    pub const VBUS_TH_SET: u8 = 0x4C;
    pub const VCC_TH_SET: u8 = 0x4D;
    /// System power / current monitor output control.
    pub const PMON_IOUT_CTRL_SET: u8 = 0x50;
    /// System power monitor ADC reading.
    pub const PMON_DACIN_VAL: u8 = 0x51;
    /// Adapter/battery current monitor ADC reading.
    pub const IOUT_DACIN_VAL: u8 = 0x52;
    pub const VBAT_VAL: u8 = 0x54;
    pub const THERM_VAL: u8 = 0x56;
    pub const VBUS_VAL: u8 = 0x5C;
    pub const VCC_VAL: u8 = 0x5E;
    pub const INT0_SET: u8 = 0x68;
    pub const INT1_SET: u8 = 0x69;
    pub const INT2_SET: u8 = 0x6A;
    pub const INT0_STATUS: u8 = 0x70;
    pub const INT1_STATUS: u8 = 0x71;
    pub const INT2_STATUS: u8 = 0x72;
    /// Power save mode selection.
    pub const SMBREG: u8 = 0x7A;
}

/// Undocumented debug command set (bank 2).
pub mod dbg {
    /// Reverse current comparator threshold.
    pub const REVERSE_CURRENT_TH: u8 = 0x14;
    /// Internal current sense gain.
    pub const INTERNAL_GAIN: u8 = 0x1A;
}

/// Charge voltage limits (mV).
pub const CHARGE_V_MAX: u16 = 19_200;
pub const CHARGE_V_MIN: u16 = 3_072;
pub const CHARGE_V_STEP: u16 = 16;

/// Fast-charge current limits (mA).
pub const CHARGE_I_MAX: u16 = 16_320;
pub const CHARGE_I_MIN: u16 = 128;
pub const CHARGE_I_STEP: u16 = 64;

/// Input current limits (mA).
pub const INPUT_I_MAX: u16 = 16_352;
pub const INPUT_I_MIN: u16 = 512;
pub const INPUT_I_STEP: u16 = 32;

/// Smallest fast-charge current used without a battery, so the system rail does not collapse.
pub const NO_BATTERY_CHARGE_I_MIN: u16 = 512;
/// Ceiling for the pre-charge current register.
pub const IPRECH_MAX: u16 = 1_024;

/// VSYS regulation target while charging is inhibited.
pub const DISCHARGE_VSYSREG_MV: u16 = 8_960;
/// VSYS regulation target while charging.
pub const CHARGE_VSYSREG_MV: u16 = 6_144;
pub const VSYSREG_STEP: u16 = 64;

/// VBUS/VCC level below which the port discharge path is enabled.
pub const VBUS_DISCHARGE_TH_MV: u16 = 3_900;

/// Nominal USB supply voltage reported for BC1.2 suppliers.
pub const USB_CHARGER_VOLTAGE_MV: u16 = 5_000;

/// Unlock key for [`ext::EXT_PROTECT_SET`].
pub const DEBUG_UNLOCK_KEY: u16 = 0x003C;

/// CHGOP_STATUS battery temperature field.
pub const BATTEMP_MASK: u16 = 0x0700;
pub const BATTEMP_SHIFT: u16 = 8;

/// PMON_IOUT_CTRL_SET current monitor gain field.
pub const IOUT_GAIN_MASK: u16 = 0x0030;
pub const IOUT_GAIN_SHIFT: u16 = 4;
/// PMON_IOUT_CTRL_SET system power monitor gain field.
pub const PMON_GAIN_MASK: u16 = 0x0007;

/// Monitor ADC samples averaged per reading.
pub const MONITOR_ADC_SAMPLES: u32 = 100;
/// Monitor ADC conversion interval (us).
pub const MONITOR_ADC_INTERVAL_US: u32 = 200;

/// CHGOP_SET2 DC/DC switching clock field.
pub const DCDC_CLK_SEL_SHIFT: u16 = 2;

bitflags::bitflags! {
    /// VBUS_VCC_STATUS register bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct VbusVccStatusBits: u16 {
        const VCC_DETECT  = 1 << 8;
        const VBUS_DETECT = 1 << 0;
    }

    /// CHGOP_STATUS register bits (battery temperature lives in [`BATTEMP_MASK`]).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ChgopStatusBits: u16 {
        const BATTEMP2  = 1 << 10;
        const BATTEMP1  = 1 << 9;
        const BATTEMP0  = 1 << 8;
        /// Reverse buck-boost output is above its under-voltage threshold.
        const RBOOST_UV = 1 << 1;
    }

    /// VIN_CTRL_SET register bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct VinCtrlBits: u16 {
        const PP_BOTH_THRU  = 1 << 11;
        const VBUS_PRIORITY = 1 << 7;
        const VBUS_EN       = 1 << 6;
        const VCC_EN        = 1 << 5;
        const VSYS_PRIORITY = 1 << 4;
    }

    /// CHGOP_SET1 register bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ChgopSet1Bits: u16 {
        const DCP_2500_SEL    = 1 << 15;
        const SDP_500_SEL     = 1 << 14;
        const ILIM_AUTO_DISEN = 1 << 13;
        const VCC_BC_DISEN    = 1 << 11;
        const VBUS_BC_DISEN   = 1 << 10;
        const SDP_CHG_TRIG_EN = 1 << 9;
        const SDP_CHG_TRIG    = 1 << 8;
    }

    /// CHGOP_SET2 register bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ChgopSet2Bits: u16 {
        const BATT_LEARN   = 1 << 8;
        const CHG_EN       = 1 << 7;
        const USB_SUS      = 1 << 6;
        const DCDC_CLK_SEL1 = 1 << 3;
        const DCDC_CLK_SEL0 = 1 << 2;
    }

    /// Bits shared by VCC_UCD_SET and VBUS_UCD_SET.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct UcdSetBits: u16 {
        const BCSRETRY  = 1 << 12;
        const USBDETEN  = 1 << 7;
        const USB_SW_EN = 1 << 1;
    }

    /// Bits shared by VCC_UCD_STATUS and VBUS_UCD_STATUS.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct UcdStatusBits: u16 {
        const DCDFAIL  = 1 << 15;
        const CHGPORT1 = 1 << 13;
        const CHGPORT0 = 1 << 12;
        const PUPDET   = 1 << 11;
        const CHGDET   = 1 << 6;
    }

    /// SYSTEM_STATUS register bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SystemStatusBits: u16 {
        const OTPLD_STATE  = 1 << 1;
        const ALLRST_STATE = 1 << 0;
    }

    /// SYSTEM_CTRL_SET register bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SystemCtrlBits: u16 {
        /// Reload OTPROM trim values.
        const OTPLD  = 1 << 1;
        /// Reset all registers.
        const ALLRST = 1 << 0;
    }

    /// VM_CTRL_SET register bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct VmCtrlBits: u16 {
        const EXTIADPEN = 1 << 9;
    }

    /// PMON_IOUT_CTRL_SET register bits (gain fields excluded).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PmonIoutCtrlBits: u16 {
        /// Route the current monitor to the IMON pin.
        const IMON_INSEL      = 1 << 9;
        /// Route the power monitor to the PMON pin.
        const PMON_INSEL      = 1 << 8;
        const IOUT_OUT_EN     = 1 << 7;
        /// Set: adapter current (AMON). Clear: battery current (BMON).
        const IOUT_SOURCE_SEL = 1 << 6;
        const PMON_OUT_EN     = 1 << 3;
    }

    /// PROCHOT_CTRL_SET register bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ProchotCtrlBits: u16 {
        const PROCHOT_EN4 = 1 << 4;
        const PROCHOT_EN3 = 1 << 3;
        const PROCHOT_EN2 = 1 << 2;
        const PROCHOT_EN1 = 1 << 1;
        const PROCHOT_EN0 = 1 << 0;
    }

    /// INT0_SET (first level interrupt enable) bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Int0SetBits: u16 {
        /// VCC port group (INT2).
        const INT2_EN = 1 << 2;
        /// VBUS port group (INT1).
        const INT1_EN = 1 << 1;
        const INT0_EN = 1 << 0;
    }

    /// Bits shared by the INT1/INT2 set and status registers.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PortIntBits: u16 {
        /// Voltage threshold crossed upwards.
        const TH_DET = 1 << 9;
        /// Voltage threshold crossed downwards.
        const TH_RES = 1 << 8;
        /// Supply detected.
        const DET    = 1 << 1;
        /// Supply removed.
        const RES    = 1 << 0;
        /// Any VBUS attach/detach edge.
        const VBUS_DET = Self::DET.bits() | Self::RES.bits();
        /// Any discharge threshold crossing.
        const VBUS_TH  = Self::TH_DET.bits() | Self::TH_RES.bits();
    }
}

/// Mask applied to UCD status before decoding the BC1.2 port type.
pub const UCD_TYPE_MASK: u16 = UcdStatusBits::DCDFAIL.bits()
    | UcdStatusBits::CHGPORT1.bits()
    | UcdStatusBits::CHGPORT0.bits()
    | UcdStatusBits::PUPDET.bits()
    | UcdStatusBits::CHGDET.bits();

/// Raw BC1.2 port types after [`UCD_TYPE_MASK`].
pub mod ucd_type {
    use super::UcdStatusBits as B;

    pub const VBUS_OPEN: u16 = 0;
    pub const SDP: u16 = B::CHGPORT0.bits();
    pub const CDP: u16 = B::CHGPORT1.bits() | B::CHGDET.bits();
    pub const DCP: u16 = B::CHGPORT1.bits() | B::CHGPORT0.bits() | B::CHGDET.bits();
    pub const OTHER: u16 = B::DCDFAIL.bits() | B::CHGPORT1.bits() | B::CHGPORT0.bits() | B::CHGDET.bits();
    pub const OPEN_PORT: u16 = B::DCDFAIL.bits() | B::CHGPORT0.bits();
    pub const PUP_PORT: u16 = B::DCDFAIL.bits() | B::CHGPORT0.bits() | B::PUPDET.bits();
}

/// Clamp an input current limit to `info`'s range and round it down to the 32 mA grid.
///
/// The minimum wins if rounding drops below it.
pub fn input_current_to_reg(ma: u16, info: &ChargerInfo) -> u16 {
    let ma = ma.min(info.input_current_max) & !(INPUT_I_STEP - 1);
    ma.max(info.input_current_min)
}

/// Clamp a fast-charge current to `info`'s maximum, round it down to the 64 mA grid and apply
/// the floor.
///
/// `no_battery` selects [`NO_BATTERY_CHARGE_I_MIN`] as the floor instead of `info.current_min`.
pub fn charge_current_to_reg(ma: u16, info: &ChargerInfo, no_battery: bool) -> u16 {
    let ma = ma.min(info.current_max) & !(CHARGE_I_STEP - 1);
    if no_battery && ma < NO_BATTERY_CHARGE_I_MIN {
        NO_BATTERY_CHARGE_I_MIN
    } else {
        ma.max(info.current_min)
    }
}

/// Clamp a charge voltage to `info`'s range and round it down to the 16 mV grid.
pub fn charge_voltage_to_reg(mv: u16, info: &ChargerInfo) -> u16 {
    let mv = mv.min(info.voltage_max) & !(CHARGE_V_STEP - 1);
    mv.max(info.voltage_min)
}

/// Round a VSYS regulation target down to the 64 mV grid.
pub fn vsysreg_to_reg(mv: u16) -> u16 {
    mv & !(VSYSREG_STEP - 1)
}

/// Extract the BC1.2 type field from a UCD status value.
pub fn decode_ucd_type(raw: u16) -> u16 {
    raw & UCD_TYPE_MASK
}

/// Extract the 3-bit battery temperature field from CHGOP_STATUS.
pub fn decode_battemp(raw: u16) -> u8 {
    ((raw & BATTEMP_MASK) >> BATTEMP_SHIFT) as u8
}
