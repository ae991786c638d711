// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The droplet orchestrator.
//!
//! Coordinates the droplet lifecycle across three collaborators: the
//! content store (artifact storage), the task submitter (staging), and
//! the app launcher/examiner (running apps). The orchestrator composes
//! descriptions of work and delegates; it never executes actions itself,
//! never waits on task completion, and holds no state beyond its
//! collaborator handles.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

use crate::annotation::DropletAnnotation;
use crate::app::{AppExaminer, AppLauncher};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{
    BlobReader, ContentStore, DROPLET_TGZ_OBJECT, DROPLET_ZIP_OBJECT, bits_path,
    droplet_tgz_path, metadata_path,
};
use crate::task::{SubmitTaskRequest, TaskId, TaskSubmitter};
use crate::variant::{
    BuildRequest, LaunchRequest, LifecycleVariant, PosixVariant, WindowsVariant,
};

/// Log tag attached to staging task output.
pub const STAGING_LOG_TAG: &str = "cumulo";
/// Task kind submitted for staging work.
pub const STAGING_TASK_KIND: &str = "BUILD";

/// A stored droplet, as projected from the content store listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Droplet {
    /// Droplet name (the store path prefix).
    pub name: String,
    /// Size of the staged archive in bytes.
    pub size: i64,
    /// When the staged archive was created.
    pub created: DateTime<Utc>,
}

/// Outcome of a multi-step workflow that is not atomic.
///
/// Import writes two store objects in sequence; a failure between them
/// leaves observable partial state. The outcome makes that explicit so
/// callers can distinguish "nothing durable happened" from "a droplet
/// object exists without its metadata".
#[derive(Debug)]
pub enum WorkflowOutcome {
    /// Every step completed.
    FullySucceeded,
    /// A later step failed after durable state was already written.
    PartiallyCompleted {
        /// Number of durable steps that completed before the failure.
        steps_done: usize,
        /// The failure that stopped the workflow.
        cause: Error,
    },
    /// The workflow failed before writing any durable state.
    Failed {
        /// The step that failed.
        at_step: &'static str,
        /// The failure.
        cause: Error,
    },
}

impl WorkflowOutcome {
    /// Whether every step completed.
    pub fn fully_succeeded(&self) -> bool {
        matches!(self, WorkflowOutcome::FullySucceeded)
    }
}

/// Shape of the staging result object (`result.json`).
#[derive(Debug, Deserialize)]
struct StagingResult {
    execution_metadata: String,
}

/// The droplet orchestrator.
pub struct DropletOrchestrator {
    store: Arc<dyn ContentStore>,
    tasks: Arc<dyn TaskSubmitter>,
    apps: Arc<dyn AppLauncher>,
    examiner: Arc<dyn AppExaminer>,
    posix: PosixVariant,
    windows: WindowsVariant,
}

impl DropletOrchestrator {
    /// Create an orchestrator over the given collaborators.
    pub fn new(
        store: Arc<dyn ContentStore>,
        tasks: Arc<dyn TaskSubmitter>,
        apps: Arc<dyn AppLauncher>,
        examiner: Arc<dyn AppExaminer>,
        config: Config,
    ) -> Self {
        Self {
            store,
            tasks,
            apps,
            examiner,
            posix: PosixVariant::new(config.clone()),
            windows: WindowsVariant::new(config),
        }
    }

    /// Upload app source bits for a droplet to `{name}/bits.zip`.
    pub async fn upload_bits(&self, droplet_name: &str, upload_path: &Path) -> Result<()> {
        let file = tokio::fs::File::open(upload_path).await?;
        self.store
            .upload(&bits_path(droplet_name), Box::new(file))
            .await?;

        tracing::info!(droplet = %droplet_name, path = %upload_path.display(), "Uploaded app bits");
        Ok(())
    }

    /// Stage uploaded bits into a droplet on a POSIX cell.
    ///
    /// Submits the staging graph as one task and returns as soon as the
    /// task service accepts it; staging success is observed through the
    /// task service, not here.
    pub async fn build_droplet(&self, request: BuildRequest) -> Result<TaskId> {
        self.submit_build(&self.posix, request).await
    }

    /// Stage uploaded bits into a droplet on a Windows cell.
    pub async fn build_windows_droplet(&self, request: BuildRequest) -> Result<TaskId> {
        self.submit_build(&self.windows, request).await
    }

    async fn submit_build(
        &self,
        variant: &dyn LifecycleVariant,
        request: BuildRequest,
    ) -> Result<TaskId> {
        let graph = variant.build_graph(self.store.as_ref(), &request);
        let env = variant.build_env(&request);

        let task_id = self
            .tasks
            .submit_task(SubmitTaskRequest {
                actions: graph,
                task_name: request.task_name.clone(),
                environment_id: variant.environment_id().to_string(),
                log_tag: STAGING_LOG_TAG.to_string(),
                kind: STAGING_TASK_KIND.to_string(),
                env,
                security_rules: vec![],
                memory_mb: request.memory_mb,
                cpu_weight: request.cpu_weight,
                disk_mb: request.disk_mb,
            })
            .await?;

        tracing::info!(
            droplet = %request.droplet_name,
            task = %task_id,
            stack = %variant.stack(),
            "Submitted staging task"
        );
        Ok(task_id)
    }

    /// Launch a staged droplet as a running app on a POSIX cell.
    pub async fn launch_droplet(&self, request: LaunchRequest) -> Result<()> {
        self.submit_launch(&self.posix, request).await
    }

    /// Launch a staged droplet as a running app on a Windows cell.
    pub async fn launch_windows_droplet(&self, request: LaunchRequest) -> Result<()> {
        self.submit_launch(&self.windows, request).await
    }

    async fn submit_launch(
        &self,
        variant: &dyn LifecycleVariant,
        request: LaunchRequest,
    ) -> Result<()> {
        let execution_metadata = self.execution_metadata(&request.droplet_name).await?;
        let annotation = DropletAnnotation::for_droplet(&request.droplet_name).encode();

        let spec = variant.launch_spec(
            self.store.as_ref(),
            &request,
            &execution_metadata,
            annotation,
        )?;

        self.apps.create_app(spec).await?;

        tracing::info!(
            app = %request.app_name,
            droplet = %request.droplet_name,
            "Launched droplet"
        );
        Ok(())
    }

    /// Execution metadata string from a droplet's `result.json`.
    ///
    /// An absent or undecodable result object is a metadata error; the
    /// launch cannot proceed without it.
    async fn execution_metadata(&self, droplet_name: &str) -> Result<String> {
        let mut reader = self
            .store
            .download(&metadata_path(droplet_name))
            .await
            .map_err(|e| Error::MetadataNotFound(e.to_string()))?;

        let mut raw = Vec::new();
        reader
            .read_to_end(&mut raw)
            .await
            .map_err(|e| Error::MetadataNotFound(e.to_string()))?;

        let result: StagingResult = serde_json::from_slice(&raw)
            .map_err(|e| Error::MetadataNotFound(e.to_string()))?;

        Ok(result.execution_metadata)
    }

    /// List stored droplets.
    ///
    /// A droplet exists exactly when a two-segment `{name}/droplet.tgz`
    /// or `{name}/droplet.zip` object exists; every other path shape is
    /// ignored. Ordering is whatever the store returns.
    pub async fn list_droplets(&self) -> Result<Vec<Droplet>> {
        let blobs = self.store.list().await?;

        let droplets = blobs
            .into_iter()
            .filter_map(|blob| {
                let segments: Vec<&str> = blob.path.split('/').collect();
                match segments.as_slice() {
                    [name, object]
                        if *object == DROPLET_TGZ_OBJECT || *object == DROPLET_ZIP_OBJECT =>
                    {
                        Some(Droplet {
                            name: name.to_string(),
                            size: blob.size,
                            created: blob.created,
                        })
                    }
                    _ => None,
                }
            })
            .collect();

        Ok(droplets)
    }

    /// Remove a droplet and every object sharing its prefix.
    ///
    /// Fails without deleting anything if any running app's annotation
    /// names this droplet. A mid-sequence delete failure aborts with
    /// that error; already-deleted objects stay gone (no rollback).
    pub async fn remove_droplet(&self, droplet_name: &str) -> Result<()> {
        let apps = self.examiner.list_apps().await?;
        for app in apps {
            // Annotations come from a foreign, possibly evolving
            // subsystem; anything undecodable is not a match.
            let Some(annotation) = DropletAnnotation::decode(&app.annotation) else {
                continue;
            };
            if annotation.matches(droplet_name) {
                return Err(Error::DropletInUse {
                    droplet: droplet_name.to_string(),
                    process_id: app.process_id,
                });
            }
        }

        let blobs = self.store.list().await?;
        let prefix = format!("{droplet_name}/");

        let mut found = false;
        for blob in blobs {
            if blob.path.starts_with(&prefix) {
                self.store.delete(&blob.path).await?;
                found = true;
            }
        }

        if !found {
            return Err(Error::DropletNotFound(droplet_name.to_string()));
        }

        tracing::info!(droplet = %droplet_name, "Removed droplet");
        Ok(())
    }

    /// Open the staged archive and metadata of a droplet for export.
    ///
    /// Returns `(droplet, metadata)` readers, both live streams owned by
    /// the caller. Each missing object is its own distinct error.
    pub async fn export_droplet(&self, droplet_name: &str) -> Result<(BlobReader, BlobReader)> {
        let droplet_reader = self
            .store
            .download(&droplet_tgz_path(droplet_name))
            .await
            .map_err(|e| Error::DropletNotFound(format!("{droplet_name}: {e}")))?;

        let metadata_reader = self
            .store
            .download(&metadata_path(droplet_name))
            .await
            .map_err(|e| Error::MetadataNotFound(format!("{droplet_name}: {e}")))?;

        Ok((droplet_reader, metadata_reader))
    }

    /// Import a droplet archive and its metadata from local files.
    ///
    /// The two uploads are sequential and not atomic: a failure on the
    /// second leaves a droplet object without metadata, reported as
    /// [`WorkflowOutcome::PartiallyCompleted`].
    pub async fn import_droplet(
        &self,
        droplet_name: &str,
        droplet_path: &Path,
        metadata_file_path: &Path,
    ) -> WorkflowOutcome {
        let droplet_file = match tokio::fs::File::open(droplet_path).await {
            Ok(file) => file,
            Err(e) => {
                return WorkflowOutcome::Failed {
                    at_step: "open droplet archive",
                    cause: e.into(),
                };
            }
        };
        let metadata_file = match tokio::fs::File::open(metadata_file_path).await {
            Ok(file) => file,
            Err(e) => {
                return WorkflowOutcome::Failed {
                    at_step: "open metadata file",
                    cause: e.into(),
                };
            }
        };

        if let Err(e) = self
            .store
            .upload(&droplet_tgz_path(droplet_name), Box::new(droplet_file))
            .await
        {
            return WorkflowOutcome::Failed {
                at_step: "upload droplet archive",
                cause: e.into(),
            };
        }

        if let Err(e) = self
            .store
            .upload(&metadata_path(droplet_name), Box::new(metadata_file))
            .await
        {
            return WorkflowOutcome::PartiallyCompleted {
                steps_done: 1,
                cause: e.into(),
            };
        }

        tracing::info!(droplet = %droplet_name, "Imported droplet");
        WorkflowOutcome::FullySucceeded
    }
}
