// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Task submitter seam.
//!
//! Staging work is handed to an external task-execution service as a
//! single action graph plus resource envelope. Submission returns as soon
//! as the remote accepts the graph; completion is observed through the
//! service's own status interface, not here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::action::ActionGraph;

/// Identifier assigned to an accepted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An egress rule granted to a task while it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRule {
    /// Network protocol ("tcp", "udp", "all")
    pub protocol: String,
    /// Destination CIDRs
    pub destinations: Vec<String>,
    /// Allowed ports
    pub ports: Vec<u16>,
}

/// Parameters for one task submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTaskRequest {
    /// The work to run, in order.
    pub actions: ActionGraph,
    /// Caller-chosen task name.
    pub task_name: String,
    /// Execution environment (root filesystem) the cell must provide.
    pub environment_id: String,
    /// Tag attached to the task's log stream.
    pub log_tag: String,
    /// Task kind, used by the service for routing/reporting.
    pub kind: String,
    /// Environment variables for the task's steps.
    pub env: HashMap<String, String>,
    /// Egress rules granted to the task.
    pub security_rules: Vec<SecurityRule>,
    /// Memory limit in megabytes.
    pub memory_mb: u32,
    /// Relative CPU weight.
    pub cpu_weight: u32,
    /// Disk limit in megabytes.
    pub disk_mb: u32,
}

/// Errors from task submission.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TaskError {
    /// The service rejected the submission.
    #[error("Submission rejected: {0}")]
    Rejected(String),

    /// Transport-level failure reaching the service.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Abstract task submission interface.
#[async_trait]
pub trait TaskSubmitter: Send + Sync {
    /// Submit one task. Returns the service-assigned id on acceptance.
    async fn submit_task(&self, request: SubmitTaskRequest) -> Result<TaskId, TaskError>;
}
