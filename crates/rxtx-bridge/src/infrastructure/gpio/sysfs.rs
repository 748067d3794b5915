//! Linux sysfs GPIO.
//!
//! # How sysfs GPIO works (for beginners)
//!
//! The kernel exposes each pin as a directory of text files:
//!
//! ```text
//! /sys/class/gpio/export          write "17" to create gpio17/
//! /sys/class/gpio/gpio17/direction  "in" or "out"
//! /sys/class/gpio/gpio17/value      "0" or "1"
//! ```
//!
//! Every operation here is a small file read or write.  Failures are logged
//! and a failed read reports [`Level::Low`].

use std::path::{Path, PathBuf};

use rxtx_core::PinId;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::ports::{Direction, Gpio, Level};

#[derive(Debug, Error)]
pub enum GpioError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected value {value:?} in {path}")]
    BadValue { path: PathBuf, value: String },
}

/// [`Gpio`] over a sysfs tree rooted at `root`.
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    root: PathBuf,
}

impl SysfsGpio {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn pin_dir(&self, pin: PinId) -> PathBuf {
        self.root.join(format!("gpio{}", pin.get()))
    }

    fn export(&self, pin: PinId) -> Result<(), GpioError> {
        if self.pin_dir(pin).exists() {
            return Ok(());
        }
        debug!(pin = pin.get(), "exporting gpio");
        write_file(&self.root.join("export"), &pin.get().to_string())
    }

    fn try_configure(&self, pin: PinId, direction: Direction) -> Result<(), GpioError> {
        self.export(pin)?;
        let value = match direction {
            Direction::Input => "in",
            Direction::Output => "out",
        };
        write_file(&self.pin_dir(pin).join("direction"), value)
    }

    fn try_read(&self, pin: PinId) -> Result<Level, GpioError> {
        let path = self.pin_dir(pin).join("value");
        let text = std::fs::read_to_string(&path).map_err(|source| GpioError::Io {
            path: path.clone(),
            source,
        })?;
        match text.trim() {
            "0" => Ok(Level::Low),
            "1" => Ok(Level::High),
            other => Err(GpioError::BadValue {
                path,
                value: other.to_string(),
            }),
        }
    }

    fn try_write(&self, pin: PinId, level: Level) -> Result<(), GpioError> {
        let value = match level {
            Level::Low => "0",
            Level::High => "1",
        };
        write_file(&self.pin_dir(pin).join("value"), value)
    }
}

fn write_file(path: &Path, value: &str) -> Result<(), GpioError> {
    std::fs::write(path, value).map_err(|source| GpioError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Gpio for SysfsGpio {
    fn configure(&mut self, pin: PinId, direction: Direction) {
        if let Err(e) = self.try_configure(pin, direction) {
            warn!(pin = pin.get(), error = %e, "gpio configure failed");
        }
    }

    fn read(&mut self, pin: PinId) -> Level {
        self.try_read(pin).unwrap_or_else(|e| {
            warn!(pin = pin.get(), error = %e, "gpio read failed");
            Level::Low
        })
    }

    fn write(&mut self, pin: PinId, level: Level) {
        if let Err(e) = self.try_write(pin, level) {
            warn!(pin = pin.get(), error = %e, "gpio write failed");
        }
    }
}
