//! Interactive configuration menu.
//!
//! # How the menu works (for beginners)
//!
//! The menu is a single idle state with a "redraw" toggle.  On entry it
//! prints the current record and a key legend, then waits for one key at a
//! time:
//!
//! | Key          | Action                                                    |
//! |--------------|-----------------------------------------------------------|
//! | `1`–`9`, `0` | edit one field (see [`Field`])                            |
//! | `m`, `a`     | network mode / address (access-point profile only)        |
//! | `C`          | self-test the network; on success stamp the checksum      |
//! | `R`          | reload from storage, discarding edits                     |
//! | `W`          | self-test, stamp the checksum, persist                    |
//! | `X`          | reset every field to its compiled-in default              |
//! | `Q` / `q`    | leave the menu                                            |
//!
//! Whitespace and unknown keys do nothing, not even a redraw.  Failures never
//! leave the loop: they print one line and the operator tries again.

use std::net::Ipv4Addr;

use rxtx_core::editor::DEFAULT_POLL_INTERVAL_MS;
use rxtx_core::{
    check, update, LineEditor, NetworkMode, Pin, ReadStatus, SettingsError, SettingsRecord, TEXT_SIZE,
};
use tracing::{debug, info, warn};

pub use super::ports::DeviceProfile;
use super::ports::Peripherals;
use super::self_test::run_self_test;

/// Digits accepted for a TCP port.
const PORT_DIGITS: usize = 5;
/// Digits accepted for a baud rate (up to 9 999 999).
const BAUD_DIGITS: usize = 7;
/// Digits accepted for a pin number.
const PIN_DIGITS: usize = 3;
/// Longest dotted-quad address plus the terminator slot.
const ADDRESS_LEN: usize = 16;

// ── Profile and options ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuOptions {
    pub profile: DeviceProfile,
    /// Sleep between console polls while waiting for a key.
    pub poll_interval_ms: u32,
}

impl Default for MenuOptions {
    fn default() -> Self {
        Self {
            profile: DeviceProfile::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Why the menu loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuExit {
    Quit,
    InputClosed,
}

// ── Keys ──────────────────────────────────────────────────────────────────────

/// An editable record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Ssid,
    Password,
    ServiceName,
    Port,
    BaudRate,
    RxPin,
    TxPin,
    ResetPin,
    ModeSwitchPin,
    NetworkMode,
    Address,
}

impl Field {
    /// Legend order.
    pub const ALL: [Field; 12] = [
        Field::Name,
        Field::Ssid,
        Field::Password,
        Field::ServiceName,
        Field::Port,
        Field::BaudRate,
        Field::RxPin,
        Field::TxPin,
        Field::ResetPin,
        Field::ModeSwitchPin,
        Field::NetworkMode,
        Field::Address,
    ];

    pub fn key(self) -> u8 {
        match self {
            Field::Name => b'1',
            Field::Ssid => b'2',
            Field::Password => b'3',
            Field::ServiceName => b'4',
            Field::Port => b'5',
            Field::BaudRate => b'6',
            Field::RxPin => b'7',
            Field::TxPin => b'8',
            Field::ResetPin => b'9',
            Field::ModeSwitchPin => b'0',
            Field::NetworkMode => b'm',
            Field::Address => b'a',
        }
    }

    /// Fixed-width label, also used as the edit prompt.
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name        : ",
            Field::Ssid => "SSID        : ",
            Field::Password => "Password    : ",
            Field::ServiceName => "Service     : ",
            Field::Port => "Port        : ",
            Field::BaudRate => "Baud rate   : ",
            Field::RxPin => "RX pin      : ",
            Field::TxPin => "TX pin      : ",
            Field::ResetPin => "Reset pin   : ",
            Field::ModeSwitchPin => "Mode switch : ",
            Field::NetworkMode => "Network mode: ",
            Field::Address => "AP address  : ",
        }
    }

    pub fn is_available(self, profile: DeviceProfile) -> bool {
        match self {
            Field::NetworkMode | Field::Address => profile.access_point,
            _ => true,
        }
    }
}

/// A decoded menu key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Edit(Field),
    Check,
    Read,
    Write,
    Defaults,
    Quit,
}

impl MenuCommand {
    /// Maps a key to a command.  `None` for whitespace, unknown keys and
    /// fields the profile does not offer.
    pub fn from_key(key: u8, profile: DeviceProfile) -> Option<Self> {
        match key {
            b'C' => Some(MenuCommand::Check),
            b'R' => Some(MenuCommand::Read),
            b'W' => Some(MenuCommand::Write),
            b'X' => Some(MenuCommand::Defaults),
            b'Q' | b'q' => Some(MenuCommand::Quit),
            _ => Field::ALL
                .iter()
                .copied()
                .find(|field| field.key() == key && field.is_available(profile))
                .map(MenuCommand::Edit),
        }
    }
}

// ── Menu ──────────────────────────────────────────────────────────────────────

/// The configuration menu bound to one record and one set of collaborators.
pub struct ConfigMenu<'p, 'a> {
    io: &'p mut Peripherals<'a>,
    record: &'p mut SettingsRecord,
    options: MenuOptions,
}

impl<'p, 'a> ConfigMenu<'p, 'a> {
    pub fn new(io: &'p mut Peripherals<'a>, record: &'p mut SettingsRecord, options: MenuOptions) -> Self {
        Self { io, record, options }
    }

    /// Runs until the operator quits or the console closes.
    pub fn run(&mut self) -> MenuExit {
        info!(access_point = self.options.profile.access_point, "entering configuration menu");
        let mut redraw = true;
        loop {
            if redraw {
                self.redraw();
            }
            let Some(key) = self.wait_for_key() else {
                info!("console closed; leaving configuration menu");
                return MenuExit::InputClosed;
            };
            let Some(command) = MenuCommand::from_key(key, self.options.profile) else {
                redraw = false;
                continue;
            };
            debug!(?command, "menu command");
            redraw = match command {
                MenuCommand::Edit(field) => {
                    self.edit(field);
                    true
                }
                MenuCommand::Check => {
                    self.check_network();
                    false
                }
                MenuCommand::Read => {
                    self.reload();
                    true
                }
                MenuCommand::Write => {
                    self.write_settings();
                    false
                }
                MenuCommand::Defaults => {
                    self.record.reset_to_defaults();
                    true
                }
                MenuCommand::Quit => return MenuExit::Quit,
            };
        }
    }

    fn wait_for_key(&mut self) -> Option<u8> {
        loop {
            match self.io.console.read_byte() {
                ReadStatus::Byte(key) => return Some(key),
                ReadStatus::Pending => self.io.delay.delay_ms(self.options.poll_interval_ms),
                ReadStatus::Closed => return None,
            }
        }
    }

    fn say(&mut self, line: &str) {
        self.io.console.write_line(line);
        self.io.console.flush();
    }

    // ── Screen ────────────────────────────────────────────────────────────────

    fn redraw(&mut self) {
        let status = if check(self.record) { "checksum ok" } else { "not checksummed" };
        let mut screen = format!("\r\nRXTX bridge settings ({status})\r\n");
        for field in Field::ALL {
            if field.is_available(self.options.profile) {
                screen.push_str(&format!(
                    "  {} {}{}\r\n",
                    char::from(field.key()),
                    field.label(),
                    self.display_value(field)
                ));
            }
        }
        screen.push_str("Commands: C=check  R=read  W=write  X=defaults  Q=quit\r\n");
        self.io.console.write_str(&screen);
        self.io.console.flush();
    }

    fn display_value(&self, field: Field) -> String {
        let record = &*self.record;
        match field {
            Field::Name => record.name().to_string_lossy(),
            Field::Ssid => record.ssid().to_string_lossy(),
            Field::Password => "*".repeat(record.password().len()),
            Field::ServiceName => record.service_name().to_string_lossy(),
            Field::Port => record.port().to_string(),
            Field::BaudRate => record.baud_rate().to_string(),
            Field::RxPin => record.rx_pin().to_string(),
            Field::TxPin => record.tx_pin().to_string(),
            Field::ResetPin => record.reset_pin().to_string(),
            Field::ModeSwitchPin => record.mode_switch_pin().to_string(),
            Field::NetworkMode => format!(
                "{} ({})",
                record.network_mode().as_persisted(),
                record.network_mode()
            ),
            Field::Address => record.address().to_string(),
        }
    }

    // ── Field editors ─────────────────────────────────────────────────────────

    fn edit(&mut self, field: Field) {
        let poll = self.options.poll_interval_ms;
        let mut editor = LineEditor::new(&mut *self.io.console, &mut *self.io.delay).with_poll_interval(poll);
        let prompt = field.label();
        let record = &mut *self.record;

        let accepted = match field {
            Field::Name => {
                record.set_name(editor.read_text::<TEXT_SIZE>(prompt, false));
                true
            }
            Field::Ssid => {
                record.set_ssid(editor.read_text::<TEXT_SIZE>(prompt, false));
                true
            }
            Field::Password => {
                record.set_password(editor.read_text::<TEXT_SIZE>(prompt, true));
                true
            }
            Field::ServiceName => {
                record.set_service_name(editor.read_text::<TEXT_SIZE>(prompt, false));
                true
            }
            Field::Port => match u16::try_from(editor.read_int(prompt, PORT_DIGITS)) {
                Ok(port) if port != 0 => {
                    record.set_port(port);
                    true
                }
                _ => false,
            },
            Field::BaudRate => match u32::try_from(editor.read_int(prompt, BAUD_DIGITS)) {
                Ok(baud_rate) if baud_rate != 0 => {
                    record.set_baud_rate(baud_rate);
                    true
                }
                _ => false,
            },
            Field::RxPin | Field::TxPin | Field::ResetPin | Field::ModeSwitchPin => {
                match Pin::from_input(editor.read_int(prompt, PIN_DIGITS)) {
                    Some(pin) => {
                        match field {
                            Field::RxPin => record.set_rx_pin(pin),
                            Field::TxPin => record.set_tx_pin(pin),
                            Field::ResetPin => record.set_reset_pin(pin),
                            _ => record.set_mode_switch_pin(pin),
                        }
                        true
                    }
                    None => false,
                }
            }
            Field::NetworkMode => {
                let value = editor.read_int("Network mode (0=off 1=station 2=ap 3=both): ", 1);
                match u8::try_from(value).ok().and_then(NetworkMode::from_persisted) {
                    Some(mode) => {
                        record.set_network_mode(mode);
                        true
                    }
                    None => false,
                }
            }
            Field::Address => {
                let text = editor.read_line(prompt, ADDRESS_LEN, false);
                match std::str::from_utf8(&text).ok().and_then(|s| s.trim().parse::<Ipv4Addr>().ok()) {
                    Some(address) => {
                        record.set_address(address);
                        true
                    }
                    None => false,
                }
            }
        };

        if !accepted {
            warn!(?field, "rejected out-of-range input");
            self.say("Value out of range; unchanged.");
        }
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    fn announce_connect(&mut self) {
        let line = format!("Connecting to WiFi({})...", self.record.ssid());
        self.say(&line);
    }

    /// `C`: proves the network comes up and stamps the checksum on success.
    fn check_network(&mut self) {
        self.announce_connect();
        let profile = self.options.profile;
        match run_self_test(&mut *self.io.link, &mut *self.io.publisher, self.record, profile) {
            Ok(()) => {
                update(self.record);
                let line = format!("Check passed. Checksum {}.", self.record.checksum_trailer()[0]);
                self.say(&line);
            }
            Err(err) => {
                let line = format!("Check failed: {}", err.operator_message());
                self.say(&line);
            }
        }
    }

    /// `R`: discards edits and reloads whatever storage holds.
    fn reload(&mut self) {
        let image = self.io.storage.load();
        *self.record = SettingsRecord::from_image(&image);
        info!(valid = check(self.record), "settings reloaded from storage");
    }

    /// `W`: self-test, stamp, verify and persist.
    fn write_settings(&mut self) {
        self.announce_connect();
        let line = match self.try_write() {
            Ok(()) => "Settings written.",
            Err(SettingsError::PersistenceNotCommitted) => "Settings not written.",
            Err(SettingsError::NetworkBringUpFailed | SettingsError::CorruptOrUnwritten) => {
                "Can't create checksum."
            }
        };
        self.say(line);
    }

    fn try_write(&mut self) -> Result<(), SettingsError> {
        let profile = self.options.profile;
        run_self_test(&mut *self.io.link, &mut *self.io.publisher, self.record, profile)?;
        update(self.record);
        if !check(self.record) {
            return Err(SettingsError::CorruptOrUnwritten);
        }
        self.say("Saving values into eeprom.");
        if self.io.storage.store(&self.record.to_image()) {
            info!("settings persisted");
            Ok(())
        } else {
            warn!("storage did not commit the settings image");
            Err(SettingsError::PersistenceNotCommitted)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
