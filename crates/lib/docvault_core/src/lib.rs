//! # docvault_core
//!
//! Core domain logic for Docvault: credential and token persistence, the
//! session lifecycle, and per-user document storage.

pub mod auth;
pub mod db;
pub mod files;
pub mod migrate;
pub mod models;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
