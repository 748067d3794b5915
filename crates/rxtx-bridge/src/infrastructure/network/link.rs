//! Host stand-in for Wi-Fi association.

use std::net::{IpAddr, Ipv4Addr, TcpListener};
use std::time::Duration;

use rxtx_core::NetworkMode;
use tracing::{debug, info, warn};

use crate::application::ports::{LinkConfig, NetworkLink};

/// [`NetworkLink`] that is "up" once the bridge port can be bound on the
/// configured interface.
///
/// Station mode additionally needs a non-empty SSID, and every mode needs a
/// host name to answer to.  Each attempt that fails sleeps
/// `attempt_interval` before the next one.
#[derive(Debug, Clone)]
pub struct HostNetworkLink {
    bind_address: IpAddr,
    attempts: u32,
    attempt_interval: Duration,
    up: bool,
}

impl HostNetworkLink {
    pub fn new(bind_address: IpAddr, attempts: u32, attempt_interval: Duration) -> Self {
        Self {
            bind_address,
            attempts: attempts.max(1),
            attempt_interval,
            up: false,
        }
    }

    pub fn is_up(&self) -> bool {
        self.up
    }

    fn preconditions_hold(config: &LinkConfig) -> bool {
        if config.mode == NetworkMode::Off {
            warn!("network mode is off");
            return false;
        }
        if config.mode.includes_station() && config.ssid.is_empty() {
            warn!("station mode needs an SSID");
            return false;
        }
        if config.host_name.is_empty() {
            warn!("device name is empty; nothing to answer to");
            return false;
        }
        true
    }
}

impl Default for HostNetworkLink {
    fn default() -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 10, Duration::from_secs(1))
    }
}

impl NetworkLink for HostNetworkLink {
    fn bring_up(&mut self, config: &LinkConfig) -> bool {
        if !Self::preconditions_hold(config) {
            return false;
        }
        info!(ssid = %config.ssid, mode = %config.mode, "connecting");

        for attempt in 1..=self.attempts {
            match TcpListener::bind((self.bind_address, config.port)) {
                Ok(_probe) => {
                    info!(attempt, addr = %self.bind_address, port = config.port, "link up");
                    self.up = true;
                    return true;
                }
                Err(e) => {
                    debug!(attempt, error = %e, "port not bindable yet");
                    if attempt < self.attempts {
                        std::thread::sleep(self.attempt_interval);
                    }
                }
            }
        }
        warn!(attempts = self.attempts, port = config.port, "link did not come up");
        false
    }

    fn teardown(&mut self) {
        if self.up {
            info!("link down");
        }
        self.up = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(port: u16) -> LinkConfig {
        LinkConfig {
            host_name: "bridge".to_string(),
            ssid: "lab".to_string(),
            password: String::new(),
            mode: NetworkMode::Station,
            address: Ipv4Addr::new(192, 168, 4, 1),
            port,
        }
    }

    fn localhost_link(attempts: u32) -> HostNetworkLink {
        HostNetworkLink::new(IpAddr::V4(Ipv4Addr::LOCALHOST), attempts, Duration::from_millis(1))
    }

    #[test]
    fn test_free_port_brings_link_up() {
        // Arrange
        let mut link = localhost_link(1);

        // Act
        // Port 0 asks the OS for any free port.
        let up = link.bring_up(&config(0));

        // Assert
        assert!(up);
        assert!(link.is_up());
        link.teardown();
        assert!(!link.is_up());
    }

    #[test]
    fn test_occupied_port_fails_after_all_attempts() {
        let holder = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = holder.local_addr().unwrap().port();
        let mut link = localhost_link(2);

        assert!(!link.bring_up(&config(port)));
        assert!(!link.is_up());
    }

    #[test]
    fn test_station_mode_without_ssid_fails() {
        let mut link = localhost_link(1);
        let mut cfg = config(0);
        cfg.ssid.clear();

        assert!(!link.bring_up(&cfg));
    }

    #[test]
    fn test_access_point_mode_does_not_need_ssid() {
        let mut link = localhost_link(1);
        let mut cfg = config(0);
        cfg.ssid.clear();
        cfg.mode = NetworkMode::AccessPoint;

        assert!(link.bring_up(&cfg));
    }

    #[test]
    fn test_mode_off_fails() {
        let mut link = localhost_link(1);
        let mut cfg = config(0);
        cfg.mode = NetworkMode::Off;

        assert!(!link.bring_up(&cfg));
    }
}
