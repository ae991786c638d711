// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! App launcher and examiner seams.
//!
//! Launching a droplet delegates to an external app-execution service:
//! the orchestrator describes the long-lived process (entry point, args,
//! setup action graph, resource envelope, opaque annotation) and the
//! service runs it. The examiner is the read side, listing running apps
//! with their annotations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::action::ActionGraph;

/// How the service checks a launched process's health.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorMethod {
    /// Probe a listening port (POSIX cells).
    #[default]
    Port,
    /// Check the process is alive (Windows cells have no port probe).
    Process,
}

/// Health monitoring configuration for a launched app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Health check method.
    pub method: MonitorMethod,
}

/// Resource envelope for a launched app's instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEnvelope {
    /// Memory limit in megabytes.
    pub memory_mb: u32,
    /// Relative CPU weight.
    pub cpu_weight: u32,
    /// Disk limit in megabytes.
    pub disk_mb: u32,
}

/// Specification of a long-lived app process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppRequest {
    /// App name.
    pub name: String,
    /// Execution environment (root filesystem) the cell must provide.
    pub environment_id: String,
    /// Entry point executable.
    pub start_command: String,
    /// Arguments to the entry point.
    pub args: Vec<String>,
    /// Actions run on the cell before the process starts.
    pub setup: ActionGraph,
    /// Opaque annotation attached to the app record.
    pub annotation: String,
    /// Environment variables for the process.
    pub env: HashMap<String, String>,
    /// Working directory override, if any.
    pub working_dir: Option<String>,
    /// Number of instances to run.
    pub instances: u32,
    /// Resource envelope per instance.
    pub resources: ResourceEnvelope,
    /// Health monitoring configuration.
    pub monitor: MonitorConfig,
}

/// A running app as reported by the examiner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfo {
    /// Process GUID assigned by the app-execution service.
    pub process_id: String,
    /// Opaque annotation attached at launch time.
    pub annotation: String,
}

/// Errors from the app-execution service.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// The service rejected the specification.
    #[error("App creation rejected: {0}")]
    Rejected(String),

    /// Transport-level failure reaching the service.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Abstract app launch interface.
#[async_trait]
pub trait AppLauncher: Send + Sync {
    /// Create a long-lived app from the specification.
    async fn create_app(&self, request: CreateAppRequest) -> Result<(), AppError>;
}

/// Abstract running-app listing interface.
#[async_trait]
pub trait AppExaminer: Send + Sync {
    /// List currently running apps with their annotations.
    async fn list_apps(&self) -> Result<Vec<AppInfo>, AppError>;
}
