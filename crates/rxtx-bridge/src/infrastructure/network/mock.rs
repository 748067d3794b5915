//! Recording network doubles for integration tests.
//!
//! Each double counts the calls it receives so a test can assert the
//! acquire/release pairing after the boot sequence or menu has returned.

use std::collections::VecDeque;

use rxtx_core::ServiceAdvert;

use crate::application::ports::{Bridge, LinkConfig, NetworkLink, SerialParams, ServicePublisher};

// ── Link ──────────────────────────────────────────────────────────────────────

/// [`NetworkLink`] whose bring-up results come from a script.
///
/// When the script is empty every further attempt returns the fallback.
#[derive(Debug, Default, Clone)]
pub struct ScriptedLink {
    outcomes: VecDeque<bool>,
    fallback: bool,
    configs: Vec<LinkConfig>,
    teardowns: usize,
}

impl ScriptedLink {
    /// Every bring-up succeeds.
    pub fn reachable() -> Self {
        Self {
            fallback: true,
            ..Self::default()
        }
    }

    /// Every bring-up fails.
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Plays `outcomes` in order before falling back.
    pub fn then(mut self, outcomes: &[bool]) -> Self {
        self.outcomes.extend(outcomes.iter().copied());
        self
    }

    pub fn bring_up_count(&self) -> usize {
        self.configs.len()
    }

    pub fn teardown_count(&self) -> usize {
        self.teardowns
    }

    pub fn last_config(&self) -> Option<&LinkConfig> {
        self.configs.last()
    }
}

impl NetworkLink for ScriptedLink {
    fn bring_up(&mut self, config: &LinkConfig) -> bool {
        self.configs.push(config.clone());
        self.outcomes.pop_front().unwrap_or(self.fallback)
    }

    fn teardown(&mut self) {
        self.teardowns += 1;
    }
}

// ── Publisher ─────────────────────────────────────────────────────────────────

/// [`ServicePublisher`] that accepts or refuses every advert.
#[derive(Debug, Clone)]
pub struct RecordingPublisher {
    accept: bool,
    published: Vec<ServiceAdvert>,
    refreshes: usize,
    withdrawals: usize,
}

impl RecordingPublisher {
    pub fn accepting() -> Self {
        Self {
            accept: true,
            published: Vec::new(),
            refreshes: 0,
            withdrawals: 0,
        }
    }

    pub fn refusing() -> Self {
        Self {
            accept: false,
            ..Self::accepting()
        }
    }

    /// Every advert offered, accepted or not.
    pub fn published(&self) -> &[ServiceAdvert] {
        &self.published
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    pub fn withdraw_count(&self) -> usize {
        self.withdrawals
    }
}

impl Default for RecordingPublisher {
    fn default() -> Self {
        Self::accepting()
    }
}

impl ServicePublisher for RecordingPublisher {
    fn publish(&mut self, advert: &ServiceAdvert) -> bool {
        self.published.push(advert.clone());
        self.accept
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
    }

    fn withdraw(&mut self) {
        self.withdrawals += 1;
    }
}

// ── Bridge ────────────────────────────────────────────────────────────────────

/// [`Bridge`] that records its lifecycle.
#[derive(Debug, Clone)]
pub struct RecordingBridge {
    open_result: bool,
    opened: Vec<(SerialParams, u16)>,
    pumps: usize,
    closes: usize,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self {
            open_result: true,
            opened: Vec::new(),
            pumps: 0,
            closes: 0,
        }
    }

    /// Every `open` fails, as if the port were taken.
    pub fn failing_open() -> Self {
        Self {
            open_result: false,
            ..Self::new()
        }
    }

    pub fn opened(&self) -> &[(SerialParams, u16)] {
        &self.opened
    }

    pub fn pump_count(&self) -> usize {
        self.pumps
    }

    pub fn close_count(&self) -> usize {
        self.closes
    }
}

impl Default for RecordingBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge for RecordingBridge {
    fn open(&mut self, serial: &SerialParams, port: u16) -> bool {
        self.opened.push((*serial, port));
        self.open_result
    }

    fn pump(&mut self) {
        self.pumps += 1;
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}
