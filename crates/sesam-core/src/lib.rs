//! Domain models and store contracts shared across the sesam crates.
//!
//! This crate has no I/O dependencies. Store implementations live in
//! `sesam-store`; orchestration lives in `sesam-auth`.

pub mod error;
pub mod models;
pub mod store;
