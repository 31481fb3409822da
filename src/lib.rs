//! Massact - bulk actions on course modules
//!
//! Duplicates, moves, deletes and edits many course modules at once while
//! keeping their course order, honouring policy listeners and reporting a
//! per-module outcome. The engine works through collaborator traits; the
//! bundled sled [`db::Database`] implements all of them for the CLI.

use thiserror::Error;

pub mod auth;
pub mod bulk;
pub mod cli;
pub mod commands;
pub mod config;
pub mod course;
pub mod db;
pub mod events;
pub mod hooks;
pub mod output;
pub mod tasks;

#[cfg(test)]
pub mod testing;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum MassactError {
    /// Database error
    #[error("Database error: {0}")]
    DbError(#[from] db::DbError),
    /// A bulk action was rejected
    #[error("{0}")]
    BulkError(#[from] bulk::BulkError),
    /// Course store collaborator error
    #[error("Store error: {0}")]
    StoreError(#[from] course::StoreError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Output serialization error
    #[error("Serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for the command layer
pub type Result<T> = std::result::Result<T, MassactError>;
