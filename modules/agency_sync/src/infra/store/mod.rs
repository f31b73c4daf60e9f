//! Record store adapters.

pub mod memory;
pub mod rest;

pub use memory::{InMemoryRecordStore, StoreOp};
pub use rest::{RestRecordStore, RestStoreError};
