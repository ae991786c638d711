// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Cumulo Droplet - Staging and Launch Orchestration
//!
//! This crate coordinates the lifecycle of droplets: pre-compiled,
//! runnable application artifacts produced by buildpack staging. It turns
//! high-level intents (stage, launch, list/remove, import/export) into
//! declarative action graphs and app specifications consumed by external
//! services, and coordinates artifact storage in a content blob store.
//! It never executes work itself.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         External Clients                                 │
//! │                        (cumulo CLI, API)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    cumulo-droplet (This Crate)                           │
//! │  ┌──────────────┐  ┌──────────────┐  ┌─────────────────────────────┐    │
//! │  │ Build graphs │  │ Launch specs │  │ List / Remove / Export /    │    │
//! │  │ (POSIX, Win) │  │ (POSIX, Win) │  │ Import                      │    │
//! │  └──────┬───────┘  └──────┬───────┘  └──────────────┬──────────────┘    │
//! └─────────┼─────────────────┼──────────────────────────┼──────────────────┘
//!           │ submit          │ create                   │ list/up/down/del
//!           ▼                 ▼                          ▼
//! ┌───────────────┐  ┌─────────────────┐  ┌───────────────────────────────┐
//! │ Task Submitter│  │  App Launcher   │  │        Content Store          │
//! │ (staging runs │  │  + Examiner     │  │  {droplet}/bits.zip           │
//! │  on a cell)   │  │ (running apps)  │  │  {droplet}/droplet.tgz|zip    │
//! └───────────────┘  └─────────────────┘  │  {droplet}/result.json        │
//!                                         └───────────────────────────────┘
//! ```
//!
//! Build and launch are independent pipelines sharing only the content
//! store as the handoff medium: staging writes `result.json` (detected
//! start command, buildpack identity), launch reads it back.
//!
//! # Operations
//!
//! | Operation | Description |
//! |-----------|-------------|
//! | `upload_bits` | Upload app source to `{name}/bits.zip` |
//! | `build_droplet` / `build_windows_droplet` | Submit a staging action graph as one task |
//! | `launch_droplet` / `launch_windows_droplet` | Read staging metadata, delegate an app spec |
//! | `list_droplets` | Project two-segment `droplet.tgz`/`droplet.zip` paths |
//! | `remove_droplet` | Prefix-wide delete, guarded by the in-use annotation scan |
//! | `export_droplet` | Stream the archive and metadata out |
//! | `import_droplet` | Upload both from local files (non-atomic) |
//!
//! # Deletion safety
//!
//! Every launched app carries an opaque annotation naming its source
//! droplet (see [`annotation`]). `remove_droplet` scans running apps and
//! refuses to delete a droplet any decodable annotation still names.
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `CUMULO_BLOB_STORE_HOST` | Yes | - | Content store host |
//! | `CUMULO_BLOB_STORE_PORT` | No | `8444` | Content store port |
//! | `CUMULO_BLOB_STORE_USERNAME` | No | empty | Basic-auth username |
//! | `CUMULO_BLOB_STORE_PASSWORD` | No | empty | Basic-auth password |
//! | `CUMULO_HELPER_BUNDLE_URL` | No | file server | Cell helpers bundle |
//! | `CUMULO_HEALTHCHECK_BUNDLE_URL` | No | file server | Healthcheck bundle |
//! | `CUMULO_DAV_TOOL_URL` | No | file server | Windows transfer tool |
//!
//! # Modules
//!
//! - [`action`]: Declarative action graph model
//! - [`annotation`]: Droplet-source back-reference envelope
//! - [`app`]: App launcher/examiner seams
//! - [`config`]: Configuration from environment variables
//! - [`error`]: Error types for orchestrator operations
//! - [`orchestrator`]: The droplet orchestrator
//! - [`store`]: Content store seam and in-memory mock
//! - [`task`]: Task submitter seam
//! - [`variant`]: POSIX/Windows staging and launch pipelines

#![deny(missing_docs)]

/// Declarative action graph model.
pub mod action;

/// Droplet-source annotation attached to launched apps.
pub mod annotation;

/// App launcher and examiner seams.
pub mod app;

/// Configuration loaded from environment variables.
pub mod config;

/// Error types for orchestrator operations.
pub mod error;

/// The droplet orchestrator.
pub mod orchestrator;

/// Content store seam.
pub mod store;

/// Task submitter seam.
pub mod task;

/// Staging/launch lifecycle variants.
pub mod variant;

pub use config::Config;
pub use error::Error;
pub use orchestrator::{Droplet, DropletOrchestrator, WorkflowOutcome};
