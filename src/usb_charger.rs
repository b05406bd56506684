//! USB charger port detection task.
//!
//! One long-lived task owns the per-port detection state. Each pass walks both inputs in a fixed
//! order, consumes their interrupt status, runs BC1.2 classification on VBUS edges and updates
//! the discharge path on threshold edges. Results go to the [`ChargeManager`] and
//! [`DischargeControl`] collaborators.
//!
//! The interrupt line is level triggered and shared by both inputs, and status bits are cleared
//! by writing back what was read. A source that latches while the other one is being serviced
//! keeps the line asserted without producing a new edge, so after any pass that found work the
//! task re-reads immediately instead of waiting for a wake.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::delay::DelayNs;

use crate::bank::BankSelector;
use crate::config::Config;
use crate::data_types::{CHARGE_PORT_COUNT, ChargePort, ChargePortInfo, SupplierType};
use crate::error::Error;
use crate::interfaces::{ChargeManager, DischargeControl, WakeSignal};
use crate::registers::{PortIntBits, USB_CHARGER_VOLTAGE_MV, VBUS_DISCHARGE_TH_MV};

/// BC1.2 detection completes about 312 ms after the supply attaches.
pub const BC12_SETTLE_MS: u32 = 312;
/// Classification reads before a supply is declared unrecognised.
pub const BC12_DETECT_RETRY: u32 = 10;
/// Delay after each read that found nothing.
pub const BC12_RETRY_MS: u32 = 100;

/// Detection progress of one input.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DetectState {
    /// Nothing attached (or nothing recognised).
    #[default]
    Idle,
    /// Supply seen, waiting for the hardware classifier to finish.
    AwaitingSettle,
    /// Reading the classifier result.
    Polling,
    /// Supply classified and reported.
    Attached(SupplierType),
}

/// Per-input detection record.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PortDetectionState {
    pub state: DetectState,
    /// Last supplier reported to the charge manager.
    pub supplier: SupplierType,
}

/// Port detection task state.
pub struct UsbCharger<'a, M: RawMutex, I2C, D> {
    regs: &'a BankSelector<M, I2C>,
    delay: D,
    config: Config,
    ports: [PortDetectionState; CHARGE_PORT_COUNT],
    initialized: bool,
}

impl<'a, M: RawMutex, I2C, D> UsbCharger<'a, M, I2C, D> {
    pub fn new(regs: &'a BankSelector<M, I2C>, delay: D, config: Config) -> Self {
        Self {
            regs,
            delay,
            config,
            ports: [PortDetectionState::default(); CHARGE_PORT_COUNT],
            initialized: false,
        }
    }

    /// Detection record for `port`; `None` for [`ChargePort::Both`].
    pub fn port_state(&self, port: ChargePort) -> Option<&PortDetectionState> {
        port.index().map(|i| &self.ports[i])
    }

    /// Whether the cold-start pass has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn free(self) -> D {
        self.delay
    }
}

impl<M: RawMutex, I2C, D> UsbCharger<'_, M, I2C, D>
where
    I2C: embedded_hal::i2c::I2c,
    D: DelayNs,
{
    /// Reset both inputs and enable the interrupts the task waits on.
    ///
    /// The next pass is treated as a cold start and evaluates every input regardless of
    /// interrupt status.
    pub fn start(&mut self) -> Result<(), Error<I2C::Error>> {
        self.ports = [PortDetectionState::default(); CHARGE_PORT_COUNT];
        self.initialized = false;
        let mut result = Ok(());
        for port in ChargePort::PORTS {
            if let Err(e) = self
                .regs
                .enable_vbus_detect_interrupts(port, true, self.config.vbus_discharge)
            {
                warn!("interrupt enable failed on {:?}", port);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Run the task forever: one pass per wake, re-running immediately while passes find work.
    pub fn run<CM, DC, W>(&mut self, manager: &mut CM, discharge: &mut DC, wake: &mut W) -> !
    where
        CM: ChargeManager,
        DC: DischargeControl,
        W: WakeSignal,
    {
        if let Err(_e) = self.start() {
            warn!("usb charger start incomplete");
        }
        loop {
            if !self.run_pass(manager, discharge) {
                wake.wait();
            }
        }
    }

    /// One coalesced pass over both inputs. Returns whether any input needed work.
    pub fn run_pass<CM, DC>(&mut self, manager: &mut CM, discharge: &mut DC) -> bool
    where
        CM: ChargeManager,
        DC: DischargeControl,
    {
        let cold = !self.initialized;
        let mut changed = false;

        for (index, port) in ChargePort::PORTS.into_iter().enumerate() {
            let interrupts = self.regs.take_interrupts(port).unwrap_or(PortIntBits::empty());

            if cold || interrupts.intersects(PortIntBits::VBUS_DET) {
                self.process(index, port, manager);
                changed = true;
            }

            if self.config.vbus_discharge && (cold || interrupts.intersects(PortIntBits::VBUS_TH)) {
                // An unreadable level counts as 0 V so the port discharges.
                let voltage = self.regs.port_voltage(port).unwrap_or(0);
                let enable = voltage < VBUS_DISCHARGE_TH_MV;
                debug!("{:?} at {} mV, discharge {:?}", port, voltage, enable);
                discharge.set_discharge(index, enable);
                changed = true;
            }
        }

        self.initialized = true;
        changed
    }

    /// Re-evaluate VBUS on one input and attach or detach accordingly.
    fn process<CM: ChargeManager>(&mut self, index: usize, port: ChargePort, manager: &mut CM) {
        let present = self.regs.is_vbus_provided(port).unwrap_or(false) && !manager.is_sourcing_vbus(index);
        manager.vbus_change(index, present);

        let previous = self.ports[index].supplier;
        if present {
            let detected = self.bc12_detect(index, port);
            if previous != SupplierType::None && previous != detected {
                Self::report_detach(manager, index, previous);
            }
            if let Some(current_ma) = detected.current_limit_ma(self.config.charge_ramp) {
                info!("{:?}: {:?} attached, {} mA", port, detected, current_ma);
                manager.update_charge(
                    detected,
                    index,
                    ChargePortInfo {
                        voltage_mv: USB_CHARGER_VOLTAGE_MV,
                        current_ma,
                    },
                );
                self.ports[index].state = DetectState::Attached(detected);
            } else {
                self.ports[index].state = DetectState::Idle;
            }
            self.ports[index].supplier = detected;
        } else if previous != SupplierType::None {
            info!("{:?}: {:?} detached", port, previous);
            Self::report_detach(manager, index, previous);
            // Stop the charger from starting on its own on the next BC1.2 result.
            if let Err(_e) = self.regs.bc12_enable_charging(port, false) {
                warn!("{:?}: BC1.2 charge trigger disable failed", port);
            }
            self.ports[index] = PortDetectionState::default();
        } else {
            self.ports[index].state = DetectState::Idle;
        }
    }

    /// Wait for the classifier, then poll it until it reports a type or retries run out.
    fn bc12_detect(&mut self, index: usize, port: ChargePort) -> SupplierType {
        self.ports[index].state = DetectState::AwaitingSettle;
        self.delay.delay_ms(BC12_SETTLE_MS);

        self.ports[index].state = DetectState::Polling;
        for _ in 0..BC12_DETECT_RETRY {
            let detected = self.regs.bc12_device_type(port).unwrap_or(SupplierType::None);
            if detected != SupplierType::None {
                return detected;
            }
            self.delay.delay_ms(BC12_RETRY_MS);
        }
        SupplierType::None
    }

    fn report_detach<CM: ChargeManager>(manager: &mut CM, index: usize, supplier: SupplierType) {
        manager.update_charge(
            supplier,
            index,
            ChargePortInfo {
                voltage_mv: USB_CHARGER_VOLTAGE_MV,
                current_ma: 0,
            },
        );
    }
}
