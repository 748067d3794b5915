//! Error taxonomy for settings validation, bring-up, and persistence.
//!
//! None of these are fatal: the configuration menu reports them to the
//! operator and stays in its loop, and the boot sequence routes every one of
//! them to the menu.  Over-long text input is not an error at all; it is
//! truncated silently to the field size.

use thiserror::Error;

/// Failures surfaced to the operator.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// The stored image has no magic byte or its weighted sum is not zero.
    #[error("invalid settings: storage is corrupt or was never written")]
    CorruptOrUnwritten,

    /// Network association or service registration did not succeed within
    /// the link's retry budget.
    #[error("network bring-up failed")]
    NetworkBringUpFailed,

    /// The storage accepted the write but did not confirm durability.
    #[error("settings not written: storage did not commit")]
    PersistenceNotCommitted,
}

impl SettingsError {
    /// The line printed on the operator console for this failure.
    pub fn operator_message(self) -> &'static str {
        match self {
            SettingsError::CorruptOrUnwritten => "Invalid settings.",
            SettingsError::NetworkBringUpFailed => "Network bring-up failed.",
            SettingsError::PersistenceNotCommitted => "Settings not written.",
        }
    }
}
