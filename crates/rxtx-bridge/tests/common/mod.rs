//! Shared rig for the integration tests: every port backed by a recording
//! double, plus helpers to build stored images.

#![allow(dead_code)]

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rxtx_bridge::application::boot::{BootOptions, BootOutcome, BootSequence};
use rxtx_bridge::application::menu::{ConfigMenu, MenuExit, MenuOptions};
use rxtx_bridge::application::ports::Peripherals;
use rxtx_bridge::infrastructure::console::mock::{InstantDelay, ScriptedConsole};
use rxtx_bridge::infrastructure::gpio::mock::ScriptedGpio;
use rxtx_bridge::infrastructure::network::mock::{RecordingBridge, RecordingPublisher, ScriptedLink};
use rxtx_bridge::infrastructure::storage::memory::MemoryEeprom;
use rxtx_core::{update, RecordImage, SettingsRecord};

pub struct Rig {
    pub console: ScriptedConsole,
    pub delay: InstantDelay,
    pub storage: MemoryEeprom,
    pub link: ScriptedLink,
    pub publisher: RecordingPublisher,
    pub gpio: ScriptedGpio,
    pub bridge: RecordingBridge,
}

impl Rig {
    pub fn new(console: ScriptedConsole, storage: MemoryEeprom, link: ScriptedLink) -> Self {
        Self {
            console,
            delay: InstantDelay::new(),
            storage,
            link,
            publisher: RecordingPublisher::accepting(),
            gpio: ScriptedGpio::new(),
            bridge: RecordingBridge::new(),
        }
    }

    pub fn boot(&mut self, options: BootOptions, running: Arc<AtomicBool>) -> (BootOutcome, SettingsRecord) {
        let mut io = Peripherals {
            console: &mut self.console,
            delay: &mut self.delay,
            storage: &mut self.storage,
            link: &mut self.link,
            publisher: &mut self.publisher,
            gpio: &mut self.gpio,
            bridge: &mut self.bridge,
        };
        let mut record = SettingsRecord::default();
        let outcome = BootSequence::new(&mut io, options, running).run(&mut record);
        (outcome, record)
    }

    pub fn menu(&mut self, record: &mut SettingsRecord, options: MenuOptions) -> MenuExit {
        let mut io = Peripherals {
            console: &mut self.console,
            delay: &mut self.delay,
            storage: &mut self.storage,
            link: &mut self.link,
            publisher: &mut self.publisher,
            gpio: &mut self.gpio,
            bridge: &mut self.bridge,
        };
        ConfigMenu::new(&mut io, record, options).run()
    }

    pub fn output(&self) -> String {
        self.console.output_text()
    }
}

pub fn running() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(true))
}

/// A record that has been through the menu and got its checksum.
pub fn provisioned_record() -> SettingsRecord {
    let mut record = SettingsRecord::default();
    record.set_name("lab-bridge");
    record.set_ssid("workshop");
    record.set_password("hunter2");
    update(&mut record);
    record
}

pub fn provisioned_image() -> RecordImage {
    provisioned_record().to_image()
}

/// Asserts that `needles` occur in `haystack` in this order.
pub fn assert_in_order(haystack: &str, needles: &[&str]) {
    let mut rest = haystack;
    for needle in needles {
        match rest.find(needle) {
            Some(at) => rest = &rest[at + needle.len()..],
            None => panic!("{needle:?} missing (or out of order) in console output:\n{haystack}"),
        }
    }
}
