//! Integration test for settings persistence through the file-backed EEPROM:
//! provision on first boot, power-cycle, and come up in bridge mode.

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use common::running;
use rxtx_bridge::application::boot::{BootOptions, BootOutcome, BootSequence, MenuReason};
use rxtx_bridge::application::ports::{Peripherals, SettingsStorage};
use rxtx_bridge::infrastructure::console::mock::{InstantDelay, ScriptedConsole};
use rxtx_bridge::infrastructure::gpio::NullGpio;
use rxtx_bridge::infrastructure::network::mock::{RecordingBridge, RecordingPublisher, ScriptedLink};
use rxtx_bridge::infrastructure::storage::eeprom::FileEeprom;
use rxtx_core::{check_image, SettingsError, SettingsRecord};
use uuid::Uuid;

fn scratch_eeprom() -> PathBuf {
    std::env::temp_dir()
        .join(format!("rxtx_persistence_test_{}", Uuid::new_v4()))
        .join("eeprom.bin")
}

fn power_on(
    eeprom: &mut FileEeprom,
    console: &mut ScriptedConsole,
    delay: &mut InstantDelay,
    bridge: &mut RecordingBridge,
    running: Arc<std::sync::atomic::AtomicBool>,
) -> BootOutcome {
    let mut link = ScriptedLink::reachable();
    let mut publisher = RecordingPublisher::accepting();
    let mut gpio = NullGpio;
    let mut io = Peripherals {
        console,
        delay,
        storage: eeprom,
        link: &mut link,
        publisher: &mut publisher,
        gpio: &mut gpio,
        bridge,
    };
    let mut record = SettingsRecord::default();
    BootSequence::new(&mut io, BootOptions::default(), running).run(&mut record)
}

#[test]
fn test_settings_survive_a_power_cycle() {
    // Arrange
    let path = scratch_eeprom();
    let mut eeprom = FileEeprom::new(&path);

    // Act: first power-on with an empty EEPROM, provision through the menu
    let mut console = ScriptedConsole::new()
        .key(b'1')
        .line("bench")
        .key(b'2')
        .line("shop-wifi")
        .key(b'5')
        .line("4100")
        .key(b'W')
        .key(b'Q');
    let mut bridge = RecordingBridge::new();
    let first = power_on(&mut eeprom, &mut console, &mut InstantDelay::new(), &mut bridge, running());

    // Act: second power-on reads the file back
    let flag = running();
    let mut delay = InstantDelay::stopping_after(1, Arc::clone(&flag));
    let mut second_bridge = RecordingBridge::new();
    let second = power_on(
        &mut eeprom,
        &mut ScriptedConsole::new(),
        &mut delay,
        &mut second_bridge,
        flag,
    );

    // Assert
    assert_eq!(
        first,
        BootOutcome::AwaitRestart {
            reason: MenuReason::Failure(SettingsError::CorruptOrUnwritten),
            menu: rxtx_bridge::application::menu::MenuExit::Quit,
        }
    );
    assert!(console.output_text().contains("Settings written."));
    assert!(bridge.opened().is_empty());

    assert_eq!(second, BootOutcome::Shutdown);
    assert_eq!(second_bridge.opened().len(), 1);
    assert_eq!(second_bridge.opened()[0].1, 4100);

    let image = eeprom.load();
    assert!(check_image(&image));
    let stored = SettingsRecord::from_image(&image);
    assert_eq!(stored.name().to_string(), "bench");
    assert_eq!(stored.ssid().to_string(), "shop-wifi");

    std::fs::remove_dir_all(path.parent().unwrap()).ok();
}
