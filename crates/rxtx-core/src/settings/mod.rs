//! The persisted settings record and its integrity codec.
//!
//! # Why a hand-written binary layout? (for beginners)
//!
//! The record is written to EEPROM exactly as it sits in the byte image
//! produced by [`record::SettingsRecord::to_image`].  Nothing in Rust
//! guarantees that a `#[repr(Rust)]` struct keeps its field order or padding
//! between compiler versions, so the layout is written out by hand: every
//! field has a fixed offset, multi-byte integers are little-endian, and the
//! padding bytes are explicit `reserved` slots that are always written as
//! zero.  The checksum walks that image byte by byte, so the same bytes are
//! hashed on every build and every host.

/// Weighted checksum and magic-byte fingerprint.
pub mod integrity;

/// The settings value object, its field types, and the byte layout.
pub mod record;
