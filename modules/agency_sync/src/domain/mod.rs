pub mod activity;
pub mod entity;
pub mod error;
pub mod events;
pub mod filter;
pub mod format;
pub mod metrics;
pub mod ports;
pub mod repo;
pub mod resource;
pub mod service;
pub mod validation;
