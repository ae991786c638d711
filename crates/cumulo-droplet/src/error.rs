// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for cumulo-droplet.

use thiserror::Error;

/// Droplet orchestrator errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Content store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    /// Task submission failed.
    #[error("Task submission error: {0}")]
    Task(#[from] crate::task::TaskError),

    /// App launcher or examiner call failed.
    #[error("App service error: {0}")]
    App(#[from] crate::app::AppError),

    /// No droplet objects exist under the given name.
    #[error("Droplet not found: {0}")]
    DropletNotFound(String),

    /// Staging metadata (`result.json`) is absent or undecodable.
    #[error("Metadata not found: {0}")]
    MetadataNotFound(String),

    /// A running app was launched from the droplet being removed.
    #[error("Droplet {droplet} is in use: app {process_id} was launched from it")]
    DropletInUse {
        /// Name of the droplet that cannot be removed.
        droplet: String,
        /// Process GUID of the app holding it.
        process_id: String,
    },

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type using the orchestrator [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
