//! Storage infrastructure: runtime configuration and the settings image.
//!
//! - **`config`** – The TOML file that configures the *host adapters* (paths,
//!   intervals, the device profile).  Not to be confused with the settings
//!   record, which configures the *device* and is edited through the menu.
//! - **`eeprom`** – [`eeprom::FileEeprom`], a file standing in for the
//!   device's EEPROM.
//! - **`memory`** – [`memory::MemoryEeprom`], an in-memory image with
//!   commit-failure injection for tests.

pub mod config;
pub mod eeprom;
pub mod memory;
