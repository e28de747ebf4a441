//! Database layer: initialization and row models

pub mod init;
pub mod models;

pub use init::{create_schema, init_database};
