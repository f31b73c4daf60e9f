// === PUBLIC CONTRACT ===
pub mod contract;

pub use contract::{client, error, model};

// === CONFIGURATION ===
pub mod config;
pub use config::AgencySyncConfig;

// === INTERNAL MODULES ===
// Exposed for the console app and for integration tests.
// Consumers that only render data should stick to `contract`.
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
