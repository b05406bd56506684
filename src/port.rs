//! Per-input (VBUS / VCC) hardware helpers.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::bank::BankSelector;
use crate::data_types::{Bank, ChargePort, PowerSaveMode, SupplierType, UsbSwitch};
use crate::error::Error;
use crate::registers::{ChgopSet1Bits, Int0SetBits, PortIntBits, UcdSetBits, VbusVccStatusBits, VinCtrlBits, ext};

/// Register set belonging to one physical input.
struct PortRegs {
    ucd_set: u8,
    ucd_status: u8,
    int_set: u8,
    int_status: u8,
    voltage: u8,
    int0_enable: Int0SetBits,
    bc_disable: ChgopSet1Bits,
}

const VBUS_REGS: PortRegs = PortRegs {
    ucd_set: ext::VBUS_UCD_SET,
    ucd_status: ext::VBUS_UCD_STATUS,
    int_set: ext::INT1_SET,
    int_status: ext::INT1_STATUS,
    voltage: ext::VBUS_VAL,
    int0_enable: Int0SetBits::INT1_EN,
    bc_disable: ChgopSet1Bits::VBUS_BC_DISEN,
};

const VCC_REGS: PortRegs = PortRegs {
    ucd_set: ext::VCC_UCD_SET,
    ucd_status: ext::VCC_UCD_STATUS,
    int_set: ext::INT2_SET,
    int_status: ext::INT2_STATUS,
    voltage: ext::VCC_VAL,
    int0_enable: Int0SetBits::INT2_EN,
    bc_disable: ChgopSet1Bits::VCC_BC_DISEN,
};

fn port_regs<E>(port: ChargePort) -> Result<&'static PortRegs, Error<E>> {
    match port {
        ChargePort::Vbus => Ok(&VBUS_REGS),
        ChargePort::Vcc => Ok(&VCC_REGS),
        ChargePort::Both => Err(Error::InvalidArgument),
    }
}

impl<M: RawMutex, I2C> BankSelector<M, I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Whether the input detector sees a supply on `port` (`Both`: on either input).
    pub fn is_vbus_provided(&self, port: ChargePort) -> Result<bool, Error<I2C::Error>> {
        let status = VbusVccStatusBits::from_bits_truncate(self.read(ext::VBUS_VCC_STATUS, Bank::Extended)?);
        let mask = match port {
            ChargePort::Vbus => VbusVccStatusBits::VBUS_DETECT,
            ChargePort::Vcc => VbusVccStatusBits::VCC_DETECT,
            ChargePort::Both => VbusVccStatusBits::VBUS_DETECT | VbusVccStatusBits::VCC_DETECT,
        };
        Ok(status.intersects(mask))
    }

    /// Current BC1.2 classification of the supply on `port`.
    pub fn bc12_device_type(&self, port: ChargePort) -> Result<SupplierType, Error<I2C::Error>> {
        let regs = port_regs(port)?;
        let raw = self.read(regs.ucd_status, Bank::Extended)?;
        Ok(SupplierType::from_ucd_status(raw))
    }

    /// Connect or isolate the USB D+/D- switch of `port`.
    pub fn enable_usb_switch(&self, port: ChargePort, connect: bool) -> Result<(), Error<I2C::Error>> {
        let regs = port_regs(port)?;
        self.update(regs.ucd_set, Bank::Extended, |v| {
            let mut bits = UcdSetBits::from_bits_retain(v);
            bits.set(UcdSetBits::USB_SW_EN, connect);
            bits.bits()
        })?;
        Ok(())
    }

    /// Apply a USB switch request for `port`, keeping power save off while any switch is connected.
    ///
    /// A request matching the port's recorded state is ignored. `Restore` re-applies the recorded
    /// state without changing it. `power_save` is the mode to use once every switch is
    /// disconnected; with [`PowerSaveMode::Off`] SMBREG is left alone.
    pub fn set_usb_switches(
        &self,
        port: ChargePort,
        setting: UsbSwitch,
        power_save: PowerSaveMode,
    ) -> Result<(), Error<I2C::Error>> {
        let index = port.index().ok_or(Error::InvalidArgument)?;
        let Some(state) = self.switches.lock(|cell| {
            let mut states = cell.get();
            if states[index] == setting {
                return None;
            }
            if setting != UsbSwitch::Restore {
                states[index] = setting;
                cell.set(states);
            }
            Some(states)
        }) else {
            return Ok(());
        };

        if power_save != PowerSaveMode::Off {
            let any_connected = state.contains(&UsbSwitch::Connect);
            let mode = if any_connected { PowerSaveMode::Off } else { power_save };
            debug!("{:?}: usb switch {:?}, power save {:?}", port, setting, mode);
            self.write(ext::SMBREG, mode.bits(), Bank::Extended)?;
        }
        self.enable_usb_switch(port, state[index] == UsbSwitch::Connect)
    }

    /// Last connect/disconnect request recorded for `port`.
    pub fn usb_switch_state(&self, port: ChargePort) -> Result<UsbSwitch, Error<I2C::Error>> {
        let index = port.index().ok_or(Error::InvalidArgument)?;
        Ok(self.switches.lock(|cell| cell.get()[index]))
    }

    /// Allow or forbid charging triggered autonomously by BC1.2 detection on `port`.
    ///
    /// Enabling clears the port's BC_DISEN together with the SDP charge trigger bits; disabling
    /// sets them.
    pub fn bc12_enable_charging(&self, port: ChargePort, enable: bool) -> Result<(), Error<I2C::Error>> {
        let regs = port_regs(port)?;
        let mask = ChgopSet1Bits::SDP_CHG_TRIG_EN | ChgopSet1Bits::SDP_CHG_TRIG | regs.bc_disable;
        self.update(ext::CHGOP_SET1, Bank::Extended, |v| {
            let mut bits = ChgopSet1Bits::from_bits_retain(v);
            bits.set(mask, !enable);
            bits.bits()
        })?;
        Ok(())
    }

    /// Enable or disable the interrupts the detection task waits on.
    ///
    /// The first level enables the global line and the port group, the second level the VBUS
    /// detect edges, plus the discharge threshold edges when `thresholds` is set.
    pub fn enable_vbus_detect_interrupts(
        &self,
        port: ChargePort,
        enable: bool,
        thresholds: bool,
    ) -> Result<(), Error<I2C::Error>> {
        let regs = port_regs(port)?;

        let top = Int0SetBits::INT0_EN | regs.int0_enable;
        self.update(ext::INT0_SET, Bank::Extended, |v| {
            let mut bits = Int0SetBits::from_bits_retain(v);
            bits.set(top, enable);
            bits.bits()
        })?;

        let mut second = PortIntBits::VBUS_DET;
        if thresholds {
            second |= PortIntBits::VBUS_TH;
        }
        self.update(regs.int_set, Bank::Extended, |v| {
            let mut bits = PortIntBits::from_bits_retain(v);
            bits.set(second, enable);
            bits.bits()
        })?;
        Ok(())
    }

    /// Read the port interrupt status and clear exactly the bits that were set.
    ///
    /// A failed read reports no interrupts. A failed clear still returns what was read: the
    /// bits stay latched and will be seen again on the next pass.
    pub fn take_interrupts(&self, port: ChargePort) -> Result<PortIntBits, Error<I2C::Error>> {
        let regs = port_regs(port)?;
        let raw = match self.read(regs.int_status, Bank::Extended) {
            Ok(raw) => raw,
            Err(_e) => {
                warn!("{:?}: interrupt status read failed", port);
                return Ok(PortIntBits::empty());
            }
        };
        if let Err(_e) = self.write(regs.int_status, raw, Bank::Extended) {
            warn!("{:?}: interrupt clear failed, status {} stays latched", port, raw);
        }
        Ok(PortIntBits::from_bits_retain(raw))
    }

    /// Raw input voltage on `port` (mV).
    pub fn port_voltage(&self, port: ChargePort) -> Result<u16, Error<I2C::Error>> {
        let regs = port_regs(port)?;
        self.read(regs.voltage, Bank::Extended)
    }

    /// Route (or stop routing) power from the given input(s).
    ///
    /// Selecting a single port deselects the other one; `Both` enables or disables both inputs.
    pub fn select_input_port(&self, port: ChargePort, select: bool) -> Result<(), Error<I2C::Error>> {
        self.update(ext::VIN_CTRL_SET, Bank::Extended, |v| {
            let mut bits = VinCtrlBits::from_bits_retain(v);
            let (on, other) = match port {
                ChargePort::Vbus => (VinCtrlBits::VBUS_EN, VinCtrlBits::VCC_EN),
                ChargePort::Vcc => (VinCtrlBits::VCC_EN, VinCtrlBits::VBUS_EN),
                ChargePort::Both => (VinCtrlBits::VBUS_EN | VinCtrlBits::VCC_EN, VinCtrlBits::empty()),
            };
            if select {
                bits.insert(on);
                bits.remove(other);
            } else {
                bits.remove(on);
            }
            bits.bits()
        })?;
        Ok(())
    }
}
