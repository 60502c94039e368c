//! Automation backend access for HearthVoice.
//!
//! Provides the `AutomationBackend` abstraction over the Home Assistant REST
//! API, a reqwest implementation (`RestBackend`), a recording mock for tests,
//! and the fail-soft device inventory fetcher.

pub mod client;
pub mod config;
pub mod error;
pub mod inventory;
pub mod mock;

pub use client::{AutomationBackend, RestBackend};
pub use config::BackendConfig;
pub use error::{BackendError, BackendResult, InventoryFetchError};
pub use inventory::{fetch_inventory, filter_supported, try_fetch_inventory};
pub use mock::MockBackend;
