// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Staging/launch lifecycle variants.
//!
//! POSIX and Windows cells have fundamentally different process and
//! transport models: POSIX cells run the standard builder/launcher
//! helpers and reach the store through its delegated actions, while
//! Windows cells inline staging into one scripted step and address the
//! store over its native protocol. Rather than one leaky polymorphic
//! pipeline, the two are a closed variant set behind one trait with a
//! uniform contract: build an action graph, build a launch spec.

pub mod posix;
pub mod windows;

pub use posix::PosixVariant;
pub use windows::WindowsVariant;

use std::collections::HashMap;

use crate::action::ActionGraph;
use crate::app::{CreateAppRequest, MonitorConfig, ResourceEnvelope};
use crate::error::Result;
use crate::store::ContentStore;

/// Request to stage a droplet from uploaded bits.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Name for the staging task.
    pub task_name: String,
    /// Droplet to stage; its bits must already be uploaded.
    pub droplet_name: String,
    /// Buildpack to stage with.
    pub buildpack_url: String,
    /// Caller-supplied environment for the staging steps.
    pub env: HashMap<String, String>,
    /// Memory limit in megabytes.
    pub memory_mb: u32,
    /// Relative CPU weight.
    pub cpu_weight: u32,
    /// Disk limit in megabytes.
    pub disk_mb: u32,
}

/// Request to launch a staged droplet as a running app.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// App name.
    pub app_name: String,
    /// Droplet to launch.
    pub droplet_name: String,
    /// Start command override prepended to the detected one (POSIX only).
    pub start_command: String,
    /// Arguments appended to the start command (POSIX only).
    pub start_args: Vec<String>,
    /// Caller-supplied environment for the app process.
    pub env: HashMap<String, String>,
    /// Number of instances to run.
    pub instances: u32,
    /// Resource envelope per instance.
    pub resources: ResourceEnvelope,
    /// Health monitoring configuration; Windows overrides the method.
    pub monitor: MonitorConfig,
}

/// A staging/launch pipeline for one cell environment.
pub trait LifecycleVariant: Send + Sync {
    /// Execution environment (root filesystem) id submitted with tasks
    /// and apps for this variant.
    fn environment_id(&self) -> &'static str;

    /// Stack identifier exported as `CF_STACK` during staging.
    fn stack(&self) -> &'static str;

    /// Build the ordered staging action graph for a request.
    fn build_graph(&self, store: &dyn ContentStore, request: &BuildRequest) -> ActionGraph;

    /// Staging environment for a build request, with the variant's stack
    /// id and the memory limit force-set over caller values.
    fn build_env(&self, request: &BuildRequest) -> HashMap<String, String> {
        staging_env(&request.env, self.stack(), request.memory_mb)
    }

    /// Build the app specification launching a staged droplet.
    ///
    /// `execution_metadata` is the staging-produced metadata string read
    /// from the droplet's `result.json`; `annotation` is the encoded
    /// droplet-source envelope to attach.
    fn launch_spec(
        &self,
        store: &dyn ContentStore,
        request: &LaunchRequest,
        execution_metadata: &str,
        annotation: String,
    ) -> Result<CreateAppRequest>;
}

/// Staging environment with the two fixed keys force-set, overriding any
/// caller-supplied values.
pub(crate) fn staging_env(
    caller_env: &HashMap<String, String>,
    stack: &str,
    memory_mb: u32,
) -> HashMap<String, String> {
    let mut env = caller_env.clone();
    env.insert("CF_STACK".to_string(), stack.to_string());
    env.insert("MEMORY_LIMIT".to_string(), format!("{memory_mb}M"));
    env
}
