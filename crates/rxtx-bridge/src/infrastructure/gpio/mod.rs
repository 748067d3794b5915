//! GPIO infrastructure.
//!
//! - **`sysfs`** – [`sysfs::SysfsGpio`] drives pins through the Linux sysfs
//!   interface (`/sys/class/gpio`), e.g. on a single-board computer.
//! - **`mock`**  – [`mock::ScriptedGpio`] for tests.
//!
//! [`NullGpio`] is used when pin access is disabled: every pin reads low, so
//! the mode switch never appears to change.

use rxtx_core::PinId;
use tracing::trace;

use crate::application::ports::{Direction, Gpio, Level};

pub mod mock;
pub mod sysfs;

/// [`Gpio`] with no pins behind it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGpio;

impl Gpio for NullGpio {
    fn configure(&mut self, pin: PinId, direction: Direction) {
        trace!(pin = pin.get(), ?direction, "gpio disabled; configure ignored");
    }

    fn read(&mut self, _pin: PinId) -> Level {
        Level::Low
    }

    fn write(&mut self, pin: PinId, level: Level) {
        trace!(pin = pin.get(), ?level, "gpio disabled; write ignored");
    }
}
