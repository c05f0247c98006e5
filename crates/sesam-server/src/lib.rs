//! Sesam HTTP server: routing, session middleware, and wiring.
//!
//! Everything here is generic over the core store traits; `main.rs`
//! picks the PostgreSQL and Redis engines, the tests pick the
//! in-memory ones.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod seed;
pub mod state;
