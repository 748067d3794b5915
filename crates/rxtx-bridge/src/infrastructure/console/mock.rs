//! Scripted console and instant delay for tests.
//!
//! A [`ScriptedConsole`] replays an operator session.  Each action
//! ([`key`](ScriptedConsole::key), [`line`](ScriptedConsole::line)) is
//! preceded by one "nothing buffered" poll, the way a human only starts
//! typing after the prompt appears.  That pause also stops the editor's
//! drain-before-prompt from swallowing the answer.  Once the script runs
//! out the console reports [`ReadStatus::Closed`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rxtx_core::{Console, Delay, ReadStatus};

/// A [`Console`] fed from a script that records everything written to it.
#[derive(Debug, Default, Clone)]
pub struct ScriptedConsole {
    script: VecDeque<Option<u8>>,
    output: Vec<u8>,
    flushes: usize,
}

impl ScriptedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// The operator presses one key.
    pub fn key(mut self, key: u8) -> Self {
        self.script.push_back(None);
        self.script.push_back(Some(key));
        self
    }

    /// The operator types `text` and presses Enter.
    pub fn line(mut self, text: &str) -> Self {
        self.script.push_back(None);
        self.script.extend(text.bytes().map(Some));
        self.script.push_back(Some(b'\r'));
        self
    }

    /// Bytes already buffered before anything is read (line noise).
    pub fn stale(mut self, bytes: &[u8]) -> Self {
        self.script.extend(bytes.iter().copied().map(Some));
        self
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    pub fn is_exhausted(&self) -> bool {
        self.script.is_empty()
    }
}

impl Console for ScriptedConsole {
    fn read_byte(&mut self) -> ReadStatus {
        match self.script.pop_front() {
            Some(Some(byte)) => ReadStatus::Byte(byte),
            Some(None) => ReadStatus::Pending,
            None => ReadStatus::Closed,
        }
    }

    fn write(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

/// A [`Delay`] that returns at once and counts what it was asked for.
///
/// With [`InstantDelay::stopping_after`] it clears a running flag after a
/// number of calls, ending loops that only watch that flag.
#[derive(Debug, Default, Clone)]
pub struct InstantDelay {
    calls: usize,
    total_ms: u64,
    stop: Option<(usize, Arc<AtomicBool>)>,
}

impl InstantDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stopping_after(calls: usize, running: Arc<AtomicBool>) -> Self {
        Self {
            stop: Some((calls, running)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }
}

impl Delay for InstantDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.calls += 1;
        self.total_ms += u64::from(ms);
        if let Some((limit, running)) = &self.stop {
            if self.calls >= *limit {
                running.store(false, Ordering::SeqCst);
            }
        }
    }
}
