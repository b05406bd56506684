//! Boundaries to the rest of the power subsystem.
//!
//! The driver never decides charge policy itself. It classifies supplies and hands the result
//! to a [`ChargeManager`], asks a [`DischargeControl`] to open or close the port discharge path,
//! and queries a [`Battery`] for presence and pack limits.

use crate::data_types::{BatteryInfo, ChargePortInfo, SupplierType};

/// Charge manager fed by the port detection task.
pub trait ChargeManager {
    /// Record the capability of `supplier` on `port`. A zero `current_ma` for a previously
    /// reported supplier means it went away.
    fn update_charge(&mut self, supplier: SupplierType, port: usize, charge: ChargePortInfo);

    /// VBUS presence changed (or was re-evaluated) on `port`.
    fn vbus_change(&mut self, _port: usize, _present: bool) {}

    /// Whether the system is currently sourcing VBUS on `port`, in which case the voltage seen
    /// there is our own.
    fn is_sourcing_vbus(&self, _port: usize) -> bool {
        false
    }
}

/// Port VBUS discharge path owner.
pub trait DischargeControl {
    fn set_discharge(&mut self, port: usize, enabled: bool);
}

/// Battery pack state as seen by the charge policy.
pub trait Battery {
    fn is_present(&self) -> bool;

    fn is_cut_off(&self) -> bool {
        false
    }

    /// Whether the pack finished its own bring-up. While it has not, the charge path must stay
    /// on so the pack keeps receiving AC power.
    fn is_initialized(&self) -> bool {
        true
    }

    fn info(&self) -> BatteryInfo;
}

/// Blocks the port detection task until the charger interrupt (or another wake) fires.
pub trait WakeSignal {
    fn wait(&mut self);
}

impl<T: ChargeManager + ?Sized> ChargeManager for &mut T {
    fn update_charge(&mut self, supplier: SupplierType, port: usize, charge: ChargePortInfo) {
        (**self).update_charge(supplier, port, charge)
    }

    fn vbus_change(&mut self, port: usize, present: bool) {
        (**self).vbus_change(port, present)
    }

    fn is_sourcing_vbus(&self, port: usize) -> bool {
        (**self).is_sourcing_vbus(port)
    }
}

impl<T: DischargeControl + ?Sized> DischargeControl for &mut T {
    fn set_discharge(&mut self, port: usize, enabled: bool) {
        (**self).set_discharge(port, enabled)
    }
}

impl<T: Battery + ?Sized> Battery for &T {
    fn is_present(&self) -> bool {
        (**self).is_present()
    }

    fn is_cut_off(&self) -> bool {
        (**self).is_cut_off()
    }

    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }

    fn info(&self) -> BatteryInfo {
        (**self).info()
    }
}

/// Discharge controller for boards without a controllable discharge path.
impl DischargeControl for () {
    fn set_discharge(&mut self, _port: usize, _enabled: bool) {}
}
