//! File-backed EEPROM image.
//!
//! The file plays the role of the device's emulated EEPROM: the settings
//! image lives at offset 0 and anything after it is left untouched.  A file
//! that does not exist yet, or is shorter than one image, reads as erased
//! flash (`0xFF`), which the integrity check rejects.

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use rxtx_core::{RecordImage, RECORD_SIZE};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::ports::SettingsStorage;

/// Value of an erased flash byte.
pub const ERASED: u8 = 0xFF;

#[derive(Debug, Error)]
pub enum EepromError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on EEPROM image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// [`SettingsStorage`] backed by a file on the host.
#[derive(Debug, Clone)]
pub struct FileEeprom {
    path: PathBuf,
}

impl FileEeprom {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_image(&self, image: &RecordImage) -> Result<(), EepromError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| EepromError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let io_err = |source: std::io::Error| EepromError::Io {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(io_err)?;
        file.seek(SeekFrom::Start(0)).map_err(io_err)?;
        file.write_all(image).map_err(io_err)?;
        file.sync_all().map_err(io_err)
    }
}

impl SettingsStorage for FileEeprom {
    fn load(&mut self) -> RecordImage {
        let mut image = [ERASED; RECORD_SIZE];
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                let len = bytes.len().min(RECORD_SIZE);
                image[..len].copy_from_slice(&bytes[..len]);
                debug!(path = %self.path.display(), len, "EEPROM image loaded");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no EEPROM image yet; reading as erased");
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "EEPROM image unreadable; reading as erased");
            }
        }
        image
    }

    fn store(&mut self, image: &RecordImage) -> bool {
        match self.write_image(image) {
            Ok(()) => {
                info!(path = %self.path.display(), "EEPROM image committed");
                true
            }
            Err(e) => {
                warn!(error = %e, "EEPROM image not committed");
                false
            }
        }
    }
}
