//! Application layer use cases for the bridge device.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (the settings record and its codec in `rxtx-core`) and the infrastructure
//! (files, sockets, sysfs GPIO).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil an operator goal (e.g. "edit
//!   the Wi-Fi password, prove the network comes up, then persist").
//! - **Depend on abstractions** (the traits in [`ports`]) rather than
//!   concrete implementations, so the same code drives real hardware, the
//!   host adapters, and the test mocks.
//! - **Contain no OS calls, no network I/O, no file system access**.
//!
//! # Sub-modules
//!
//! - **`ports`**     – The collaborator traits and the [`ports::Peripherals`]
//!   bundle handed to the use cases.
//!
//! - **`self_test`** – Scoped network bring-up: the link and the service
//!   registration are guards that tear themselves down when dropped.
//!
//! - **`menu`**      – The interactive configuration menu.
//!
//! - **`boot`**      – The power-on decision: bridge mode when the stored
//!   record is valid and the network comes up, the menu otherwise.

pub mod boot;
pub mod menu;
pub mod ports;
