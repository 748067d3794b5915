//! In-memory EEPROM for tests.

use rxtx_core::{RecordImage, RECORD_SIZE};

use super::eeprom::ERASED;
use crate::application::ports::SettingsStorage;

/// [`SettingsStorage`] holding the image in memory.
///
/// With [`MemoryEeprom::failing_commits`] every `store` reports "not
/// committed" and leaves the held image unchanged.
#[derive(Debug, Clone)]
pub struct MemoryEeprom {
    image: RecordImage,
    commit: bool,
    loads: usize,
    stores: usize,
}

impl MemoryEeprom {
    /// Storage that was never written.
    pub fn erased() -> Self {
        Self::with_image([ERASED; RECORD_SIZE])
    }

    pub fn with_image(image: RecordImage) -> Self {
        Self {
            image,
            commit: true,
            loads: 0,
            stores: 0,
        }
    }

    pub fn failing_commits(mut self) -> Self {
        self.commit = false;
        self
    }

    pub fn image(&self) -> &RecordImage {
        &self.image
    }

    pub fn load_count(&self) -> usize {
        self.loads
    }

    /// Number of `store` calls, committed or not.
    pub fn store_count(&self) -> usize {
        self.stores
    }
}

impl Default for MemoryEeprom {
    fn default() -> Self {
        Self::erased()
    }
}

impl SettingsStorage for MemoryEeprom {
    fn load(&mut self) -> RecordImage {
        self.loads += 1;
        self.image
    }

    fn store(&mut self, image: &RecordImage) -> bool {
        self.stores += 1;
        if self.commit {
            self.image = *image;
        }
        self.commit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_replaces_image_when_committing() {
        // Arrange
        let mut eeprom = MemoryEeprom::erased();
        let image = [0x11u8; RECORD_SIZE];

        // Act
        let committed = eeprom.store(&image);

        // Assert
        assert!(committed);
        assert_eq!(eeprom.load(), image);
        assert_eq!(eeprom.store_count(), 1);
        assert_eq!(eeprom.load_count(), 1);
    }

    #[test]
    fn test_failing_commit_keeps_previous_image() {
        let mut eeprom = MemoryEeprom::erased().failing_commits();

        let committed = eeprom.store(&[0u8; RECORD_SIZE]);

        assert!(!committed);
        assert!(eeprom.image().iter().all(|&b| b == ERASED));
        assert_eq!(eeprom.store_count(), 1);
    }
}
