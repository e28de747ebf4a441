//! # SalesFlow Common Library
//!
//! Shared code for the SalesFlow service including:
//! - Error types
//! - Configuration loading
//! - Database initialization and row models
//! - The dossier organizer (sections, items, drag transitions)

pub mod config;
pub mod db;
pub mod dossier;
pub mod error;

pub use error::{Error, Result};
