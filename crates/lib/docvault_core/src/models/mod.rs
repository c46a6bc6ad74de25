//! Domain models.

pub mod auth;
pub mod files;
