//! beacon-core — configuration and request-address resolution shared by
//! every beacon crate.

pub mod addr;
pub mod config;

pub use addr::{resolve_remote_addr, RemoteAddr, FORWARDED_FOR};
pub use config::{BeaconConfig, ConfigError, DirectoryBackend, StoreBackend};
