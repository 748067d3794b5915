//! # rxtx-core
//!
//! Shared domain library for the RXTX bridge: a small device that forwards a
//! TCP byte stream to a serial port and is configured over a local terminal.
//!
//! This crate has zero dependencies on OS APIs, sockets, or storage devices.
//! Everything that touches hardware is a trait implemented elsewhere.
//!
//! # Architecture overview (for beginners)
//!
//! The device keeps all of its operating parameters in one fixed-size binary
//! record stored in EEPROM/flash.  On boot the record is loaded and checked;
//! if it is missing or corrupted the device drops into an interactive menu
//! where an operator can fix it.  This crate defines:
//!
//! - **`settings`** – The [`SettingsRecord`] value object, its hand-written
//!   byte layout, and the integrity codec (weighted checksum + magic byte)
//!   that tells a valid record apart from garbage storage.
//!
//! - **`editor`** – A character-at-a-time line editor used by the menu to
//!   read text and signed integers with backspace support and masked echo.
//!
//! - **`terminal`** – The [`Console`] and [`Delay`] traits the editor polls.
//!
//! - **`service`** – The [`ServiceAdvert`] published for network discovery,
//!   derived entirely from record fields.
//!
//! - **`error`** – The [`SettingsError`] taxonomy shared by boot and menu.

pub mod editor;
pub mod error;
pub mod service;
pub mod settings;
pub mod terminal;

pub use editor::LineEditor;
pub use error::SettingsError;
pub use service::ServiceAdvert;
pub use settings::integrity::{check, check_image, checksum, update, update_image, CHECK_PRIME, MAGIC};
pub use settings::record::{
    FixedText, NetworkMode, Pin, PinId, RecordImage, SerialLink, SettingsRecord, RECORD_SIZE, TEXT_SIZE,
};
pub use terminal::{Console, Delay, ReadStatus};
