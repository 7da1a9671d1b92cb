//! Library crate for jank-back, exposing modules for binaries and tests.

/// Application configuration loaded at startup.
pub mod config;
/// Storage entities and backends.
pub mod dao;
mod dto;
mod error;
/// HTTP and WebSocket routes.
pub mod routes;
/// Services behind the routes and background tasks.
pub mod services;
/// Shared application state and the game itself.
pub mod state;
