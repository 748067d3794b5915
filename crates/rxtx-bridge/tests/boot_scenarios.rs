//! Integration tests for the power-on decision.
//!
//! Each test drives `BootSequence` end-to-end against the recording doubles
//! in `infrastructure::*::mock` and checks what the operator saw, what was
//! stored, and that every network acquisition was released.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::{assert_in_order, provisioned_image, provisioned_record, running, Rig};
use rxtx_bridge::application::boot::{BootOptions, BootOutcome, MenuReason};
use rxtx_bridge::application::menu::MenuExit;
use rxtx_bridge::application::ports::{Direction, Level};
use rxtx_bridge::infrastructure::console::mock::{InstantDelay, ScriptedConsole};
use rxtx_bridge::infrastructure::gpio::mock::ScriptedGpio;
use rxtx_bridge::infrastructure::network::mock::{RecordingBridge, RecordingPublisher, ScriptedLink};
use rxtx_bridge::infrastructure::storage::memory::MemoryEeprom;
use rxtx_core::{check, check_image, update, NetworkMode, Pin, SerialLink, SettingsError, SettingsRecord};

// ── First boot ────────────────────────────────────────────────────────────────

#[test]
fn test_first_boot_goes_to_menu_without_network() {
    // Arrange
    let mut rig = Rig::new(
        ScriptedConsole::new().key(b'Q'),
        MemoryEeprom::erased(),
        ScriptedLink::reachable(),
    );

    // Act
    let (outcome, _) = rig.boot(BootOptions::default(), running());

    // Assert
    assert_eq!(
        outcome,
        BootOutcome::AwaitRestart {
            reason: MenuReason::Failure(SettingsError::CorruptOrUnwritten),
            menu: MenuExit::Quit,
        }
    );
    assert_eq!(rig.link.bring_up_count(), 0, "no bring-up on invalid settings");
    assert!(rig.publisher.published().is_empty());
    assert_eq!(rig.storage.store_count(), 0);
    assert_in_order(&rig.output(), &["Invalid settings.", "not checksummed", "Please restart controller."]);
}

#[test]
fn test_first_boot_provisioning_persists_a_valid_record() {
    // Arrange
    let console = ScriptedConsole::new()
        .key(b'1')
        .line("lab-bridge")
        .key(b'2')
        .line("workshop")
        .key(b'3')
        .line("hunter2")
        .key(b'W')
        .key(b'Q');
    let mut rig = Rig::new(console, MemoryEeprom::erased(), ScriptedLink::reachable());

    // Act
    let (outcome, record) = rig.boot(BootOptions::default(), running());

    // Assert
    assert!(matches!(outcome, BootOutcome::AwaitRestart { menu: MenuExit::Quit, .. }));
    let output = rig.output();
    assert_in_order(
        &output,
        &["Invalid settings.", "Connecting to WiFi(workshop)", "Saving values into eeprom.", "Settings written.", "Please restart controller."],
    );
    assert!(!output.contains("hunter2"), "password must never be echoed");

    assert_eq!(rig.storage.store_count(), 1);
    let stored = *rig.storage.image();
    assert!(check_image(&stored));
    let decoded = SettingsRecord::from_image(&stored);
    assert_eq!(decoded.name().to_string(), "lab-bridge");
    assert_eq!(decoded.ssid().to_string(), "workshop");
    assert_eq!(decoded.password().to_string(), "hunter2");
    assert_eq!(decoded, record);

    assert_eq!(rig.link.bring_up_count(), 1);
    let joined = rig.link.last_config().expect("link was brought up");
    assert_eq!(joined.mode, NetworkMode::Station, "erased mode byte is not handed to the radio");
    assert_eq!(joined.ssid, "workshop");
    assert_eq!(rig.link.teardown_count(), 1, "self-test releases the link");
    assert_eq!(rig.publisher.withdraw_count(), 1, "self-test withdraws the advert");
}

#[test]
fn test_provisioned_device_boots_into_bridge_mode() {
    // Arrange
    let flag = running();
    let mut rig = Rig::new(
        ScriptedConsole::new(),
        MemoryEeprom::with_image(provisioned_image()),
        ScriptedLink::reachable(),
    );
    rig.delay = InstantDelay::stopping_after(3, Arc::clone(&flag));

    // Act
    let (outcome, record) = rig.boot(BootOptions::default(), flag);

    // Assert
    assert_eq!(outcome, BootOutcome::Shutdown);
    assert!(check(&record));
    assert_eq!(rig.bridge.opened().len(), 1);
    let (serial, port) = rig.bridge.opened()[0];
    assert_eq!(port, 2345);
    assert_eq!(serial.baud_rate, 115_200);
    assert_eq!(serial.link, SerialLink::Hardware);
    assert_eq!(rig.bridge.pump_count(), 3);
    assert_eq!(rig.publisher.refresh_count(), 3);

    let advert = &rig.publisher.published()[0];
    assert_eq!(advert.instance, "lab-bridge");
    assert_eq!(advert.service_label(), "_rxtx._tcp.local");

    assert_eq!(rig.bridge.close_count(), 1);
    assert_eq!(rig.publisher.withdraw_count(), 1);
    assert_eq!(rig.link.teardown_count(), 1);
    assert!(rig.output().is_empty(), "bridge mode prints nothing on the console");
}

// ── Network failures ──────────────────────────────────────────────────────────

#[test]
fn test_valid_record_with_network_down_cannot_be_written() {
    // Arrange
    let mut rig = Rig::new(
        ScriptedConsole::new().key(b'W').key(b'Q'),
        MemoryEeprom::with_image(provisioned_image()),
        ScriptedLink::unreachable(),
    );

    // Act
    let (outcome, _) = rig.boot(BootOptions::default(), running());

    // Assert
    assert_eq!(
        outcome,
        BootOutcome::AwaitRestart {
            reason: MenuReason::Failure(SettingsError::NetworkBringUpFailed),
            menu: MenuExit::Quit,
        }
    );
    assert_in_order(&rig.output(), &["Invalid settings.", "Can't create checksum.", "Please restart controller."]);
    assert!(!rig.output().contains("Settings written."));
    assert_eq!(rig.storage.store_count(), 0, "nothing is stored");
    assert_eq!(rig.link.bring_up_count(), 2, "once at boot, once for W");
    assert_eq!(rig.link.teardown_count(), 2);
    assert!(rig.bridge.opened().is_empty());
}

#[test]
fn test_refused_service_registration_sends_device_to_menu() {
    // Arrange
    let mut rig = Rig::new(
        ScriptedConsole::new().key(b'Q'),
        MemoryEeprom::with_image(provisioned_image()),
        ScriptedLink::reachable(),
    );
    rig.publisher = RecordingPublisher::refusing();

    // Act
    let (outcome, _) = rig.boot(BootOptions::default(), running());

    // Assert
    assert!(matches!(
        outcome,
        BootOutcome::AwaitRestart {
            reason: MenuReason::Failure(SettingsError::NetworkBringUpFailed),
            ..
        }
    ));
    assert_eq!(rig.link.teardown_count(), 1);
    assert_eq!(rig.publisher.withdraw_count(), 1);
    assert!(rig.bridge.opened().is_empty());
}

#[test]
fn test_bridge_open_failure_releases_network_and_enters_menu() {
    let mut rig = Rig::new(
        ScriptedConsole::new().key(b'q'),
        MemoryEeprom::with_image(provisioned_image()),
        ScriptedLink::reachable(),
    );
    rig.bridge = RecordingBridge::failing_open();

    let (outcome, _) = rig.boot(BootOptions::default(), running());

    assert!(matches!(outcome, BootOutcome::AwaitRestart { menu: MenuExit::Quit, .. }));
    assert_eq!(rig.bridge.pump_count(), 0);
    assert_eq!(rig.publisher.withdraw_count(), 1);
    assert_eq!(rig.link.teardown_count(), 1);
}

// ── Mode switch ───────────────────────────────────────────────────────────────

#[test]
fn test_mode_switch_toggle_leaves_bridge_mode_for_menu() {
    // Arrange
    let mut record = provisioned_record();
    let switch = Pin::from_input(5).unwrap();
    let reset = Pin::from_input(6).unwrap();
    record.set_mode_switch_pin(switch);
    record.set_reset_pin(reset);
    update(&mut record);
    let switch_id = switch.id().unwrap();
    let reset_id = reset.id().unwrap();

    let mut rig = Rig::new(
        ScriptedConsole::new().key(b'Q'),
        MemoryEeprom::with_image(record.to_image()),
        ScriptedLink::reachable(),
    );
    // Sampled high at bring-up, pressed (low) on the fourth read.
    rig.gpio = ScriptedGpio::new()
        .with_level(switch_id, Level::High)
        .change_after(switch_id, 3, Level::Low);

    // Act
    let (outcome, _) = rig.boot(BootOptions::default(), running());

    // Assert
    assert_eq!(
        outcome,
        BootOutcome::AwaitRestart {
            reason: MenuReason::ModeSwitch,
            menu: MenuExit::Quit,
        }
    );
    assert_eq!(rig.bridge.pump_count(), 3);
    assert_eq!(rig.bridge.close_count(), 1);
    assert_eq!(rig.publisher.withdraw_count(), 1);
    assert_eq!(rig.link.teardown_count(), 1);
    assert_eq!(
        rig.gpio.configured(),
        &[(reset_id, Direction::Output), (switch_id, Direction::Input)]
    );
    assert_eq!(rig.gpio.writes(), &[(reset_id, Level::High)]);
    assert_in_order(&rig.output(), &["Mode switch pressed.", "checksum ok", "Please restart controller."]);
}

#[test]
fn test_unwired_mode_switch_is_never_read() {
    let flag = running();
    let mut rig = Rig::new(
        ScriptedConsole::new(),
        MemoryEeprom::with_image(provisioned_image()),
        ScriptedLink::reachable(),
    );
    rig.delay = InstantDelay::stopping_after(2, Arc::clone(&flag));

    let (outcome, _) = rig.boot(BootOptions::default(), flag);

    assert_eq!(outcome, BootOutcome::Shutdown);
    assert!(rig.gpio.configured().is_empty());
    assert!(rig.gpio.writes().is_empty());
}

// ── Shutdown ──────────────────────────────────────────────────────────────────

#[test]
fn test_cleared_running_flag_stops_bridge_before_first_pump() {
    let flag = Arc::new(AtomicBool::new(false));
    let mut rig = Rig::new(
        ScriptedConsole::new(),
        MemoryEeprom::with_image(provisioned_image()),
        ScriptedLink::reachable(),
    );

    let (outcome, _) = rig.boot(BootOptions::default(), Arc::clone(&flag));

    assert_eq!(outcome, BootOutcome::Shutdown);
    assert_eq!(rig.bridge.pump_count(), 0);
    assert_eq!(rig.bridge.close_count(), 1);
    assert!(!flag.load(Ordering::SeqCst));
}

#[test]
fn test_closed_console_ends_menu_after_invalid_boot() {
    let mut rig = Rig::new(ScriptedConsole::new(), MemoryEeprom::erased(), ScriptedLink::reachable());

    let (outcome, _) = rig.boot(BootOptions::default(), running());

    assert!(matches!(outcome, BootOutcome::AwaitRestart { menu: MenuExit::InputClosed, .. }));
    assert!(rig.output().contains("Please restart controller."));
}
