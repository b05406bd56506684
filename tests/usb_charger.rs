mod common;

use bd9995x_rs::data_types::{ChargePort, SupplierType};
use bd9995x_rs::usb_charger::{DetectState, PortDetectionState};
use bd9995x_rs::{BankSelector, Config, UsbCharger};
use common::*;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

type Regs = BankSelector<NoopRawMutex, I2cMock>;

const SDP: u16 = 0x1000;
const CDP: u16 = 0x2040;
const DCP: u16 = 0x3040;
const OPEN_PORT: u16 = 0x9000;

fn no_discharge() -> Config {
    Config {
        vbus_discharge: false,
        ..Config::default()
    }
}

/// Quiet second-level status on one port: read zero, write zero back.
fn quiet(int_status: u8) -> [I2cTrans; 2] {
    [rd(int_status, 0), wr(int_status, 0)]
}

#[test]
fn start_enables_port_interrupts() {
    let expectations = [
        sel(BANK_EXT),
        // VBUS: global + INT1 group, then detect and threshold edges.
        rd(0x68, 0x0000),
        wr(0x68, 0x0003),
        rd(0x69, 0x0000),
        wr(0x69, 0x0303),
        // VCC: global + INT2 group.
        rd(0x68, 0x0003),
        wr(0x68, 0x0007),
        rd(0x6A, 0x0000),
        wr(0x6A, 0x0303),
    ];
    let regs = Regs::new(I2cMock::new(&expectations));
    let mut usb = UsbCharger::new(&regs, RecordingDelay::default(), Config::default());

    usb.start().unwrap();
    assert!(!usb.is_initialized());

    drop(usb);
    regs.release().done();
}

#[test]
fn start_without_discharge_skips_threshold_edges() {
    let expectations = [
        sel(BANK_EXT),
        rd(0x68, 0x0000),
        wr(0x68, 0x0003),
        rd(0x69, 0x0000),
        wr(0x69, 0x0003),
        rd(0x68, 0x0003),
        wr(0x68, 0x0007),
        rd(0x6A, 0x0000),
        wr(0x6A, 0x0003),
    ];
    let regs = Regs::new(I2cMock::new(&expectations));
    let mut usb = UsbCharger::new(&regs, RecordingDelay::default(), no_discharge());

    usb.start().unwrap();

    drop(usb);
    regs.release().done();
}

#[test]
fn cold_start_classifies_attached_sdp() {
    let mut expectations = vec![sel(BANK_EXT)];
    expectations.extend(quiet(0x71));
    expectations.extend([
        // VBUS present, SDP on first poll, 5 V so no discharge.
        rd(0x02, 0x0001),
        rd(0x31, SDP),
        rd(0x5C, 5_000),
    ]);
    expectations.extend(quiet(0x72));
    expectations.extend([
        // VCC absent and at 0 V.
        rd(0x02, 0x0001),
        rd(0x5E, 0),
    ]);
    let regs = Regs::new(I2cMock::new(&expectations));
    let mut usb = UsbCharger::new(&regs, RecordingDelay::default(), Config::default());
    let mut manager = RecordingManager::default();
    let mut discharge = RecordingDischarge::default();

    assert!(usb.run_pass(&mut manager, &mut discharge));
    assert!(usb.is_initialized());

    assert_eq!(manager.reports, vec![(SupplierType::Bc12Sdp, 0, charge(5_000, 900))]);
    assert_eq!(manager.vbus, vec![(0, true), (1, false)]);
    assert_eq!(discharge.calls, vec![(0, false), (1, true)]);
    assert_eq!(
        usb.port_state(ChargePort::Vbus),
        Some(&PortDetectionState {
            state: DetectState::Attached(SupplierType::Bc12Sdp),
            supplier: SupplierType::Bc12Sdp,
        })
    );
    assert_eq!(usb.port_state(ChargePort::Vcc), Some(&PortDetectionState::default()));
    assert_eq!(usb.port_state(ChargePort::Both), None);

    let delay = usb.free();
    assert_eq!(delay.ms, vec![312]);
    regs.release().done();
}

#[test]
fn quiet_pass_reports_no_work() {
    let mut expectations = vec![sel(BANK_EXT)];
    // Cold pass with nothing attached.
    expectations.extend(quiet(0x71));
    expectations.push(rd(0x02, 0x0000));
    expectations.extend(quiet(0x72));
    expectations.push(rd(0x02, 0x0000));
    // Second pass: no latched interrupts.
    expectations.extend(quiet(0x71));
    expectations.extend(quiet(0x72));
    let regs = Regs::new(I2cMock::new(&expectations));
    let mut usb = UsbCharger::new(&regs, RecordingDelay::default(), no_discharge());
    let mut manager = RecordingManager::default();
    let mut discharge = RecordingDischarge::default();

    assert!(usb.run_pass(&mut manager, &mut discharge));
    assert!(!usb.run_pass(&mut manager, &mut discharge));
    assert!(manager.reports.is_empty());
    assert!(discharge.calls.is_empty());

    let delay = usb.free();
    assert!(delay.ms.is_empty());
    regs.release().done();
}

#[test]
fn detach_reports_zero_current_and_blocks_autocharge() {
    let mut expectations = vec![sel(BANK_EXT)];
    // Cold pass: DCP on VBUS.
    expectations.extend(quiet(0x71));
    expectations.extend([rd(0x02, 0x0001), rd(0x31, DCP)]);
    expectations.extend(quiet(0x72));
    expectations.push(rd(0x02, 0x0001));
    // VBUS removed.
    expectations.extend([
        rd(0x71, 0x0001),
        wr(0x71, 0x0001),
        rd(0x02, 0x0000),
        rd(0x0B, 0x0000),
        wr(0x0B, 0x0700),
    ]);
    expectations.extend(quiet(0x72));
    let regs = Regs::new(I2cMock::new(&expectations));
    let mut usb = UsbCharger::new(&regs, RecordingDelay::default(), no_discharge());
    let mut manager = RecordingManager::default();
    let mut discharge = RecordingDischarge::default();

    usb.run_pass(&mut manager, &mut discharge);
    assert!(usb.run_pass(&mut manager, &mut discharge));

    assert_eq!(
        manager.reports,
        vec![
            (SupplierType::Bc12Dcp, 0, charge(5_000, 2_000)),
            (SupplierType::Bc12Dcp, 0, charge(5_000, 0)),
        ]
    );
    assert_eq!(usb.port_state(ChargePort::Vbus), Some(&PortDetectionState::default()));

    drop(usb);
    regs.release().done();
}

#[test]
fn reclassification_detaches_previous_supplier() {
    let mut expectations = vec![sel(BANK_EXT)];
    // Cold pass: nothing on VBUS, CDP on VCC.
    expectations.extend(quiet(0x71));
    expectations.push(rd(0x02, 0x0100));
    expectations.extend(quiet(0x72));
    expectations.extend([rd(0x02, 0x0100), rd(0x29, CDP)]);
    // VCC re-attach edge, now a DCP.
    expectations.extend(quiet(0x71));
    expectations.extend([rd(0x72, 0x0002), wr(0x72, 0x0002), rd(0x02, 0x0100), rd(0x29, DCP)]);
    let regs = Regs::new(I2cMock::new(&expectations));
    let mut usb = UsbCharger::new(&regs, RecordingDelay::default(), no_discharge());
    let mut manager = RecordingManager::default();
    let mut discharge = RecordingDischarge::default();

    usb.run_pass(&mut manager, &mut discharge);
    usb.run_pass(&mut manager, &mut discharge);

    assert_eq!(
        manager.reports,
        vec![
            (SupplierType::Bc12Cdp, 1, charge(5_000, 1_500)),
            (SupplierType::Bc12Cdp, 1, charge(5_000, 0)),
            (SupplierType::Bc12Dcp, 1, charge(5_000, 2_000)),
        ]
    );
    assert_eq!(
        usb.port_state(ChargePort::Vcc).map(|p| p.state),
        Some(DetectState::Attached(SupplierType::Bc12Dcp))
    );

    let delay = usb.free();
    assert_eq!(delay.ms, vec![312, 312]);
    regs.release().done();
}

#[test]
fn unrecognised_supply_is_not_reported() {
    let mut expectations = vec![sel(BANK_EXT)];
    expectations.extend(quiet(0x71));
    expectations.push(rd(0x02, 0x0001));
    for _ in 0..10 {
        expectations.push(rd(0x31, OPEN_PORT));
    }
    expectations.extend(quiet(0x72));
    expectations.push(rd(0x02, 0x0001));
    let regs = Regs::new(I2cMock::new(&expectations));
    let mut usb = UsbCharger::new(&regs, RecordingDelay::default(), no_discharge());
    let mut manager = RecordingManager::default();
    let mut discharge = RecordingDischarge::default();

    usb.run_pass(&mut manager, &mut discharge);

    assert!(manager.reports.is_empty());
    assert_eq!(usb.port_state(ChargePort::Vbus), Some(&PortDetectionState::default()));

    let delay = usb.free();
    let mut expected = vec![312];
    expected.extend([100; 10]);
    assert_eq!(delay.ms, expected);
    regs.release().done();
}

#[test]
fn late_classification_after_retries() {
    let mut expectations = vec![sel(BANK_EXT)];
    expectations.extend(quiet(0x71));
    expectations.extend([
        rd(0x02, 0x0001),
        rd(0x31, 0x0000),
        rd_err(0x31),
        rd(0x31, DCP),
    ]);
    expectations.extend(quiet(0x72));
    expectations.push(rd(0x02, 0x0001));
    let regs = Regs::new(I2cMock::new(&expectations));
    let mut usb = UsbCharger::new(&regs, RecordingDelay::default(), no_discharge());
    let mut manager = RecordingManager::default();
    let mut discharge = RecordingDischarge::default();

    usb.run_pass(&mut manager, &mut discharge);

    assert_eq!(manager.reports, vec![(SupplierType::Bc12Dcp, 0, charge(5_000, 2_000))]);

    let delay = usb.free();
    assert_eq!(delay.ms, vec![312, 100, 100]);
    regs.release().done();
}

#[test]
fn own_source_is_not_a_supply() {
    let mut expectations = vec![sel(BANK_EXT)];
    expectations.extend(quiet(0x71));
    expectations.push(rd(0x02, 0x0001));
    expectations.extend(quiet(0x72));
    expectations.push(rd(0x02, 0x0001));
    let regs = Regs::new(I2cMock::new(&expectations));
    let mut usb = UsbCharger::new(&regs, RecordingDelay::default(), no_discharge());
    let mut manager = RecordingManager {
        sourcing: [true, false],
        ..RecordingManager::default()
    };
    let mut discharge = RecordingDischarge::default();

    usb.run_pass(&mut manager, &mut discharge);

    assert!(manager.reports.is_empty());
    assert_eq!(manager.vbus, vec![(0, false), (1, false)]);

    drop(usb);
    regs.release().done();
}

#[test]
fn unreadable_voltage_enables_discharge() {
    let mut expectations = vec![sel(BANK_EXT)];
    expectations.extend(quiet(0x71));
    expectations.extend([rd(0x02, 0x0000), rd_err(0x5C)]);
    expectations.extend(quiet(0x72));
    expectations.extend([rd(0x02, 0x0000), rd(0x5E, 3_900)]);
    // Threshold edge on VCC only.
    expectations.extend(quiet(0x71));
    expectations.extend([rd(0x72, 0x0100), wr(0x72, 0x0100), rd(0x5E, 3_899)]);
    let regs = Regs::new(I2cMock::new(&expectations));
    let mut usb = UsbCharger::new(&regs, RecordingDelay::default(), Config::default());
    let mut manager = RecordingManager::default();
    let mut discharge = RecordingDischarge::default();

    usb.run_pass(&mut manager, &mut discharge);
    assert!(usb.run_pass(&mut manager, &mut discharge));

    assert_eq!(discharge.calls, vec![(0, true), (1, false), (1, true)]);
    // A threshold edge alone does not re-run detection.
    assert_eq!(manager.vbus.len(), 2);

    drop(usb);
    regs.release().done();
}

#[test]
fn unreadable_interrupt_status_skips_port() {
    let mut expectations = vec![sel(BANK_EXT)];
    expectations.extend(quiet(0x71));
    expectations.push(rd(0x02, 0x0000));
    expectations.extend(quiet(0x72));
    expectations.push(rd(0x02, 0x0000));
    expectations.push(rd_err(0x71));
    expectations.extend(quiet(0x72));
    let regs = Regs::new(I2cMock::new(&expectations));
    let mut usb = UsbCharger::new(&regs, RecordingDelay::default(), no_discharge());
    let mut manager = RecordingManager::default();
    let mut discharge = RecordingDischarge::default();

    usb.run_pass(&mut manager, &mut discharge);
    assert!(!usb.run_pass(&mut manager, &mut discharge));

    drop(usb);
    regs.release().done();
}
