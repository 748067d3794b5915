//! Operator console on the host's stdin/stdout.
//!
//! Reading stdin blocks, and the menu must never block on input (it polls
//! and sleeps).  So a dedicated reader thread owns stdin and pushes every
//! byte into a `tokio::sync::mpsc` channel; [`StdioConsole::read_byte`] just
//! calls `try_recv`.
//!
//! When stdin reaches end-of-file the thread exits and drops its sender, and
//! the console reports [`ReadStatus::Closed`] from then on.  Clearing the
//! shared `running` flag does the same, so Ctrl-C ends an open menu.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rxtx_core::{Console, Delay, ReadStatus};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, warn};

pub mod mock;

const READ_CHUNK: usize = 256;

/// [`Console`] over the process's stdin and stdout.
pub struct StdioConsole {
    input: mpsc::UnboundedReceiver<u8>,
    output: std::io::Stdout,
    running: Arc<AtomicBool>,
}

impl StdioConsole {
    /// Starts the stdin reader thread.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn(running: Arc<AtomicBool>) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("rxtx-console".to_string())
            .spawn(move || read_stdin(tx))?;
        Ok(Self {
            input: rx,
            output: std::io::stdout(),
            running,
        })
    }
}

fn read_stdin(tx: mpsc::UnboundedSender<u8>) {
    let mut stdin = std::io::stdin().lock();
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match stdin.read(&mut buf) {
            Ok(0) => {
                debug!("stdin reached end of file");
                return;
            }
            Ok(n) => {
                for &byte in &buf[..n] {
                    if tx.send(byte).is_err() {
                        return;
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "stdin read failed; console input closed");
                return;
            }
        }
    }
}

impl Console for StdioConsole {
    fn read_byte(&mut self) -> ReadStatus {
        if !self.running.load(Ordering::SeqCst) {
            return ReadStatus::Closed;
        }
        match self.input.try_recv() {
            Ok(byte) => ReadStatus::Byte(byte),
            Err(TryRecvError::Empty) => ReadStatus::Pending,
            Err(TryRecvError::Disconnected) => ReadStatus::Closed,
        }
    }

    fn write(&mut self, bytes: &[u8]) {
        if let Err(e) = self.output.write_all(bytes) {
            debug!(error = %e, "console write failed");
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.output.flush() {
            debug!(error = %e, "console flush failed");
        }
    }
}

/// [`Delay`] that sleeps the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
