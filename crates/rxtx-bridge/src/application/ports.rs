//! Collaborator traits the use cases are written against.
//!
//! # Why traits? (for beginners)
//!
//! On the device these are backed by the EEPROM driver, the Wi-Fi stack, the
//! mDNS responder and the GPIO registers.  On a development host they are
//! backed by a file, a TCP socket and sysfs (see `infrastructure`).  In tests
//! they are in-memory mocks.  The menu and boot logic never know which one
//! they are talking to.
//!
//! Every operation reports success as a plain `bool` or a value; the adapters
//! log the underlying cause with `tracing` before flattening it, because the
//! operator only ever sees one line per failure.

use std::net::Ipv4Addr;

use rxtx_core::{Console, Delay, NetworkMode, PinId, RecordImage, SerialLink, ServiceAdvert, SettingsRecord};

// ── Storage ───────────────────────────────────────────────────────────────────

/// Non-volatile storage holding exactly one settings image at offset 0.
pub trait SettingsStorage {
    /// Reads the image.  Never fails: unwritten storage returns whatever
    /// bytes are there, and validation rejects them later.
    fn load(&mut self) -> RecordImage;

    /// Writes and commits the image.  `false` means the write was not
    /// confirmed durable.
    fn store(&mut self, image: &RecordImage) -> bool;
}

// ── Network ───────────────────────────────────────────────────────────────────

/// Capabilities of the hardware build.
///
/// The stored layout always carries every field; the profile decides which
/// of them the operator may edit and which the radio honours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceProfile {
    /// The radio can run its own access point, so the network mode and the
    /// access-point address are editable.
    pub access_point: bool,
}

impl DeviceProfile {
    /// The mode the radio actually runs for a stored mode.
    ///
    /// A station-only build always joins as a station: its stored mode byte
    /// cannot be edited, so whatever erased or stale value it holds is
    /// ignored.
    pub fn effective_mode(self, stored: NetworkMode) -> NetworkMode {
        if self.access_point {
            stored
        } else {
            NetworkMode::Station
        }
    }

    /// The discovery advert for `record` as this build will run it.
    pub fn advert(self, record: &SettingsRecord) -> ServiceAdvert {
        ServiceAdvert::from_record(record).with_network_mode(self.effective_mode(record.network_mode()))
    }
}

/// Everything the link needs to associate and answer on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub host_name: String,
    pub ssid: String,
    pub password: String,
    pub mode: NetworkMode,
    /// Access-point address; ignored in pure station mode.
    pub address: Ipv4Addr,
    pub port: u16,
}

impl LinkConfig {
    pub fn from_record(record: &SettingsRecord, profile: DeviceProfile) -> Self {
        Self {
            host_name: record.name().to_string_lossy(),
            ssid: record.ssid().to_string_lossy(),
            password: record.password().to_string_lossy(),
            mode: profile.effective_mode(record.network_mode()),
            address: record.address(),
            port: record.port(),
        }
    }
}

/// Wi-Fi association (or its host stand-in).
///
/// The bounded retry budget lives inside the implementation: `bring_up`
/// returns only once the link is up or the attempts are used up.
#[cfg_attr(test, mockall::automock)]
pub trait NetworkLink {
    fn bring_up(&mut self, config: &LinkConfig) -> bool;
    fn teardown(&mut self);
}

/// Discovery responder (mDNS/DNS-SD on the device).
#[cfg_attr(test, mockall::automock)]
pub trait ServicePublisher {
    fn publish(&mut self, advert: &ServiceAdvert) -> bool;
    /// Answers pending queries.  Called once per bridge-mode tick.
    fn refresh(&mut self);
    fn withdraw(&mut self);
}

// ── GPIO ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Digital pins.  Takes [`PinId`], so a "no pin" sentinel can never reach
/// the hardware.
pub trait Gpio {
    fn configure(&mut self, pin: PinId, direction: Direction);
    fn read(&mut self, pin: PinId) -> Level;
    fn write(&mut self, pin: PinId, level: Level);
}

// ── Bridge ────────────────────────────────────────────────────────────────────

/// Serial-side parameters of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialParams {
    pub baud_rate: u32,
    pub link: SerialLink,
}

impl SerialParams {
    pub fn from_record(record: &SettingsRecord) -> Self {
        Self {
            baud_rate: record.baud_rate(),
            link: record.serial_link(),
        }
    }
}

/// The TCP-to-serial forwarder.  `pump` moves whatever is pending in both
/// directions and returns without waiting.
pub trait Bridge {
    fn open(&mut self, serial: &SerialParams, port: u16) -> bool;
    fn pump(&mut self);
    fn close(&mut self);
}

// ── Bundle ────────────────────────────────────────────────────────────────────

/// Mutable borrows of every collaborator, handed to the menu and the boot
/// sequence.  Nothing here is shared between threads.
pub struct Peripherals<'a> {
    pub console: &'a mut dyn Console,
    pub delay: &'a mut dyn Delay,
    pub storage: &'a mut dyn SettingsStorage,
    pub link: &'a mut dyn NetworkLink,
    pub publisher: &'a mut dyn ServicePublisher,
    pub gpio: &'a mut dyn Gpio,
    pub bridge: &'a mut dyn Bridge,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxtx_core::Pin;

    #[test]
    fn test_link_config_copies_network_fields_from_record() {
        // Arrange
        let mut record = SettingsRecord::default();
        record.set_name("uart-7");
        record.set_ssid("lab");
        record.set_password("secret");
        record.set_network_mode(NetworkMode::StationAndAccessPoint);
        record.set_port(4000);

        // Act
        let config = LinkConfig::from_record(&record, DeviceProfile { access_point: true });

        // Assert
        assert_eq!(config.host_name, "uart-7");
        assert_eq!(config.ssid, "lab");
        assert_eq!(config.password, "secret");
        assert_eq!(config.mode, NetworkMode::StationAndAccessPoint);
        assert_eq!(config.port, 4000);
    }

    #[test]
    fn test_station_only_profile_joins_as_station_whatever_is_stored() {
        // Arrange: an erased mode byte decodes as Off
        let record = SettingsRecord::from_image(&[0xFF; rxtx_core::RECORD_SIZE]);
        assert_eq!(record.network_mode(), NetworkMode::Off);

        // Act
        let config = LinkConfig::from_record(&record, DeviceProfile::default());
        let advert = DeviceProfile::default().advert(&record);

        // Assert
        assert_eq!(config.mode, NetworkMode::Station);
        assert!(advert.txt.contains(&("mode".to_string(), "1".to_string())));
    }

    #[test]
    fn test_access_point_profile_keeps_stored_mode() {
        let profile = DeviceProfile { access_point: true };

        assert_eq!(profile.effective_mode(NetworkMode::Off), NetworkMode::Off);
        assert_eq!(profile.effective_mode(NetworkMode::AccessPoint), NetworkMode::AccessPoint);
    }

    #[test]
    fn test_serial_params_use_software_link_when_rx_is_wired() {
        let mut record = SettingsRecord::default();
        record.set_baud_rate(9600);
        record.set_rx_pin(Pin::from_input(4).unwrap());

        let params = SerialParams::from_record(&record);

        assert_eq!(params.baud_rate, 9600);
        assert!(matches!(params.link, SerialLink::Software { .. }));
    }
}
