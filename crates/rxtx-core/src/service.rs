//! Discovery advertisement derived from the settings record.
//!
//! Once the bridge is up it announces itself on the LAN (mDNS/DNS-SD on the
//! device).  Everything in the announcement comes from already-validated
//! record fields, so the publisher never needs to read the record itself.

use crate::settings::record::{NetworkMode, SettingsRecord, DEFAULT_SERVICE_NAME};

/// Transport protocol label of the bridge service.
pub const SERVICE_PROTOCOL: &str = "tcp";

/// A service registration as handed to the discovery publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAdvert {
    /// Instance and host name (`<instance>.local`).
    pub instance: String,
    /// Service type label, e.g. `rxtx` for `_rxtx._tcp`.
    pub service_type: String,
    pub protocol: &'static str,
    pub port: u16,
    /// TXT record entries in publication order.
    pub txt: Vec<(String, String)>,
}

impl ServiceAdvert {
    /// Builds the advert.  An empty service name advertises the default
    /// `rxtx` type.
    pub fn from_record(record: &SettingsRecord) -> Self {
        let service_type = match record.service_name() {
            name if name.is_empty() => DEFAULT_SERVICE_NAME.to_string(),
            name => name.to_string_lossy(),
        };
        Self {
            instance: record.name().to_string_lossy(),
            service_type,
            protocol: SERVICE_PROTOCOL,
            port: record.port(),
            txt: vec![
                ("baud".to_string(), record.baud_rate().to_string()),
                ("serial".to_string(), record.serial_link().to_string()),
                ("mode".to_string(), record.network_mode().as_persisted().to_string()),
            ],
        }
    }

    /// Replaces the `mode` TXT entry with the mode the radio actually runs.
    pub fn with_network_mode(mut self, mode: NetworkMode) -> Self {
        let value = mode.as_persisted().to_string();
        match self.txt.iter_mut().find(|(key, _)| key == "mode") {
            Some(entry) => entry.1 = value,
            None => self.txt.push(("mode".to_string(), value)),
        }
        self
    }

    /// DNS-SD service label, e.g. `_rxtx._tcp.local`.
    pub fn service_label(&self) -> String {
        format!("_{}._{}.local", self.service_type, self.protocol)
    }

    /// Host name the device answers to, e.g. `bridge.local`.
    pub fn host_name(&self) -> String {
        format!("{}.local", self.instance)
    }
}
