//! Power-on decision and bridge mode.
//!
//! # Boot flow (for beginners)
//!
//! ```text
//!  load image ──invalid──▶ "Invalid settings." ─▶ menu ─▶ "Please restart controller."
//!      │valid
//!      ▼
//!  bring-up + advert ──failed──▶ "Invalid settings." ─▶ menu ─▶ restart prompt
//!      │ok
//!      ▼
//!  bridge mode: pump, refresh, poll mode switch ──level changed──▶ menu ─▶ restart prompt
//! ```
//!
//! The device never leaves the menu path on its own: after the menu the only
//! way forward is a power cycle, which [`await_restart`] waits for.  On a
//! development host the shared `running` flag stands in for the power
//! switch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rxtx_core::{check_image, Delay, PinId, SettingsError, SettingsRecord};
use tracing::{debug, info, warn};

use super::menu::{ConfigMenu, DeviceProfile, MenuExit, MenuOptions};
use super::ports::{Direction, Level, Peripherals, SerialParams};
use super::self_test::bring_up;

/// Idle sleep between bridge-mode ticks.
pub const DEFAULT_IDLE_INTERVAL_MS: u32 = 500;
/// Sleep between checks of the running flag while waiting for a restart.
pub const RESTART_POLL_INTERVAL_MS: u32 = 1000;

/// Why the device ended up in the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuReason {
    /// Stored settings failed validation or the network did not come up.
    Failure(SettingsError),
    /// The operator toggled the mode-switch pin during bridge mode.
    ModeSwitch,
}

/// How a boot sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    /// The menu ran; the device now needs a power cycle.
    AwaitRestart { reason: MenuReason, menu: MenuExit },
    /// The running flag was cleared during bridge mode.
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootOptions {
    pub profile: DeviceProfile,
    pub console_poll_interval_ms: u32,
    pub idle_interval_ms: u32,
}

impl Default for BootOptions {
    fn default() -> Self {
        let menu = MenuOptions::default();
        Self {
            profile: menu.profile,
            console_poll_interval_ms: menu.poll_interval_ms,
            idle_interval_ms: DEFAULT_IDLE_INTERVAL_MS,
        }
    }
}

enum BridgeExit {
    ModeSwitch,
    OpenFailed,
    Shutdown,
}

/// One power-on of the device.
pub struct BootSequence<'p, 'a> {
    io: &'p mut Peripherals<'a>,
    options: BootOptions,
    running: Arc<AtomicBool>,
}

impl<'p, 'a> BootSequence<'p, 'a> {
    pub fn new(io: &'p mut Peripherals<'a>, options: BootOptions, running: Arc<AtomicBool>) -> Self {
        Self { io, options, running }
    }

    /// Loads the record into `record` and runs until the device must be
    /// restarted or the running flag is cleared.
    pub fn run(&mut self, record: &mut SettingsRecord) -> BootOutcome {
        let image = self.io.storage.load();
        *record = SettingsRecord::from_image(&image);

        if !check_image(&image) {
            warn!("stored settings failed validation");
            return self.recover(record, MenuReason::Failure(SettingsError::CorruptOrUnwritten));
        }

        let profile = self.options.profile;
        if let Err(err) = bring_up(&mut *self.io.link, &mut *self.io.publisher, record, profile) {
            warn!(error = %err, "network bring-up failed at boot");
            return self.recover(record, MenuReason::Failure(err));
        }

        info!(port = record.port(), baud = record.baud_rate(), "entering bridge mode");
        match self.bridge_mode(record) {
            BridgeExit::Shutdown => BootOutcome::Shutdown,
            BridgeExit::ModeSwitch => self.recover(record, MenuReason::ModeSwitch),
            BridgeExit::OpenFailed => {
                self.recover(record, MenuReason::Failure(SettingsError::NetworkBringUpFailed))
            }
        }
    }

    fn recover(&mut self, record: &mut SettingsRecord, reason: MenuReason) -> BootOutcome {
        let banner = match reason {
            MenuReason::Failure(_) => "Invalid settings.",
            MenuReason::ModeSwitch => "Mode switch pressed.",
        };
        self.io.console.write_line(banner);
        self.io.console.flush();

        let options = MenuOptions {
            profile: self.options.profile,
            poll_interval_ms: self.options.console_poll_interval_ms,
        };
        let menu = ConfigMenu::new(&mut *self.io, record, options).run();

        self.io.console.write_line("Please restart controller.");
        self.io.console.flush();
        info!(?reason, ?menu, "configuration finished; waiting for restart");
        BootOutcome::AwaitRestart { reason, menu }
    }

    // ── Bridge mode ───────────────────────────────────────────────────────────

    fn bridge_mode(&mut self, record: &SettingsRecord) -> BridgeExit {
        let mode_switch = self.prepare_pins(record);
        let baseline = mode_switch.map(|pin| self.io.gpio.read(pin));
        debug!(?mode_switch, ?baseline, "mode switch sampled");

        if !self.io.bridge.open(&SerialParams::from_record(record), record.port()) {
            warn!(port = record.port(), "bridge could not be opened");
            self.release_network();
            return BridgeExit::OpenFailed;
        }

        loop {
            if !self.running.load(Ordering::SeqCst) {
                info!("shutdown requested; leaving bridge mode");
                self.leave_bridge();
                return BridgeExit::Shutdown;
            }

            self.io.bridge.pump();
            self.io.publisher.refresh();

            if let (Some(pin), Some(level)) = (mode_switch, baseline) {
                if self.io.gpio.read(pin) != level {
                    info!(pin = pin.get(), "mode switch toggled; leaving bridge mode");
                    self.leave_bridge();
                    return BridgeExit::ModeSwitch;
                }
            }

            self.io.delay.delay_ms(self.options.idle_interval_ms);
        }
    }

    /// Releases the target from reset and arms the mode switch.  Returns the
    /// mode-switch pin when one is wired.
    fn prepare_pins(&mut self, record: &SettingsRecord) -> Option<PinId> {
        if let Some(reset) = record.reset_pin().id() {
            self.io.gpio.configure(reset, Direction::Output);
            self.io.gpio.write(reset, Level::High);
        }
        let mode_switch = record.mode_switch_pin().id();
        if let Some(pin) = mode_switch {
            self.io.gpio.configure(pin, Direction::Input);
        }
        mode_switch
    }

    fn leave_bridge(&mut self) {
        self.io.bridge.close();
        self.release_network();
    }

    fn release_network(&mut self) {
        self.io.publisher.withdraw();
        self.io.link.teardown();
    }
}

/// Blocks until the running flag is cleared.  On the device nothing clears
/// it and only a power cycle ends the wait.
pub fn await_restart(delay: &mut dyn Delay, running: &AtomicBool, interval_ms: u32) {
    while running.load(Ordering::SeqCst) {
        delay.delay_ms(interval_ms);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
