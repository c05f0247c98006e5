//! Sesam storage engines.
//!
//! This crate implements the `sesam-core` store contracts against the
//! real backends and their in-memory stand-ins:
//! - PostgreSQL user directory ([`PgUserStore`]) with transactional
//!   units of work, plus migrations ([`run_migrations`])
//! - Redis session store ([`KvSessionStore`] over [`RedisKv`])
//! - In-memory engines ([`MemoryUserStore`], [`MemoryKv`]) for tests
//!   and local development
//!
//! The service crates stay generic over the core traits and never
//! depend on this crate directly; wiring happens in the server.

mod connection;
mod error;
mod kv;
mod memory;
mod postgres;
mod session;

pub use connection::{KvConfig, MIGRATOR, PgConfig, connect_kv, connect_postgres, run_migrations};
pub use error::StoreError;
pub use kv::{KvBackend, RedisKv};
pub use memory::{MemoryKv, MemoryUserStore, MemoryUserUow};
pub use postgres::{PgUserStore, PgUserUow};
pub use session::KvSessionStore;
