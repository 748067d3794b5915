//! Infrastructure layer for the bridge.
//!
//! Contains the host-side adapters behind the application ports: a
//! file-backed EEPROM image, the stdio operator console, the TCP/serial
//! bridge and its network stand-ins, and sysfs GPIO.  Each sub-module also
//! carries a `mock` (or in-memory) adapter used by the integration tests.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `rxtx_core`, but MUST NOT be imported by the `application` layer.

pub mod console;
pub mod gpio;
pub mod network;
pub mod storage;
