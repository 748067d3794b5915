//! Network infrastructure for the host build.
//!
//! On the device these ports are the Wi-Fi driver, the mDNS responder and a
//! `WiFiServer` copying bytes to the UART.  On a host:
//!
//! - **`link`**      – [`link::HostNetworkLink`] treats "the link is up" as
//!   "the configured port can be bound", retried a bounded number of times.
//! - **`publisher`** – [`publisher::LogPublisher`] logs the advert it would
//!   announce.
//! - **`bridge`**    – [`bridge::TcpSerialBridge`] forwards one TCP client to
//!   a serial device file.
//! - **`mock`**      – Recording doubles for tests.

pub mod bridge;
pub mod link;
pub mod mock;
pub mod publisher;
