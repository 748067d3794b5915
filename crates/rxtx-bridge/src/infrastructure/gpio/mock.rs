//! Scripted GPIO for tests.

use std::collections::HashMap;

use rxtx_core::PinId;

use crate::application::ports::{Direction, Gpio, Level};

/// [`Gpio`] with settable input levels and recorded outputs.
///
/// Unset pins read low.  [`ScriptedGpio::change_after`] flips a pin once it
/// has been read a given number of times, which is how tests press the mode
/// switch in the middle of bridge mode.
#[derive(Debug, Default, Clone)]
pub struct ScriptedGpio {
    levels: HashMap<u8, Level>,
    reads: HashMap<u8, usize>,
    changes: Vec<(u8, usize, Level)>,
    configured: Vec<(PinId, Direction)>,
    writes: Vec<(PinId, Level)>,
}

impl ScriptedGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, pin: PinId, level: Level) -> Self {
        self.levels.insert(pin.get(), level);
        self
    }

    /// From the `after_reads + 1`-th read on, `pin` reads `level`.
    pub fn change_after(mut self, pin: PinId, after_reads: usize, level: Level) -> Self {
        self.changes.push((pin.get(), after_reads, level));
        self
    }

    pub fn configured(&self) -> &[(PinId, Direction)] {
        &self.configured
    }

    pub fn writes(&self) -> &[(PinId, Level)] {
        &self.writes
    }

    pub fn read_count(&self, pin: PinId) -> usize {
        self.reads.get(&pin.get()).copied().unwrap_or(0)
    }
}

impl Gpio for ScriptedGpio {
    fn configure(&mut self, pin: PinId, direction: Direction) {
        self.configured.push((pin, direction));
    }

    fn read(&mut self, pin: PinId) -> Level {
        let id = pin.get();
        let count = self.reads.entry(id).or_insert(0);
        let before = *count;
        *count += 1;
        for &(changed, after, level) in &self.changes {
            if changed == id && before >= after {
                self.levels.insert(id, level);
            }
        }
        self.levels.get(&id).copied().unwrap_or(Level::Low)
    }

    fn write(&mut self, pin: PinId, level: Level) {
        self.writes.push((pin, level));
        self.levels.insert(pin.get(), level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_changes_after_scheduled_reads() {
        // Arrange
        let pin = PinId::new(3).unwrap();
        let mut gpio = ScriptedGpio::new()
            .with_level(pin, Level::High)
            .change_after(pin, 2, Level::Low);

        // Act
        let levels: Vec<Level> = (0..4).map(|_| gpio.read(pin)).collect();

        // Assert
        assert_eq!(levels, vec![Level::High, Level::High, Level::Low, Level::Low]);
        assert_eq!(gpio.read_count(pin), 4);
    }

    #[test]
    fn test_unset_pin_reads_low() {
        let mut gpio = ScriptedGpio::new();
        assert_eq!(gpio.read(PinId::new(1).unwrap()), Level::Low);
    }
}
