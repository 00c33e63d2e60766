//! Non-blocking Ethernet connection management for a device main loop.
//!
//! [`ConnectionManager`] brings a wired interface up through DHCP or a static
//! configuration, maintains the DHCP lease, watches the physical link and
//! retries on a fixed interval whenever connectivity is lost. It is driven by
//! calling [`ConnectionManager::poll`] from the main loop and never blocks
//! beyond the hardware calls it delegates to.
//!
//! The hardware is any [`NetworkInterface`]; [`W5500`] drives a WIZnet W5500
//! over an `embedded-hal` SPI device.
#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod bus;
mod clock;
mod config;
mod interface;
mod manager;
mod net;
pub mod register;
mod socket;
pub mod tcp;
mod w5500;

pub use clock::Clock;
pub use config::{AddressMode, ChipSelect, StaticConfig, DEFAULT_RETRY_INTERVAL};
pub use interface::{LeaseStatus, NetworkInterface};
pub use manager::{Callback, ConnectionManager, NetState};
pub use net::{Ipv4Addr, MacAddress};
pub use tcp::{TcpClient, TcpSocket, TcpSocketError};
pub use w5500::{InitializeError, W5500};
