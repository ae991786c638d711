// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for cumulo-droplet integration tests.
//!
//! Provides recording doubles for the task submitter and app services,
//! and a harness wiring them to an orchestrator over the mock store.

#![allow(dead_code)]

use std::sync::Arc;
use tokio::sync::Mutex;

use async_trait::async_trait;
use cumulo_droplet::app::{AppError, AppExaminer, AppInfo, AppLauncher, CreateAppRequest};
use cumulo_droplet::config::Config;
use cumulo_droplet::orchestrator::DropletOrchestrator;
use cumulo_droplet::store::MockStore;
use cumulo_droplet::task::{SubmitTaskRequest, TaskError, TaskId, TaskSubmitter};

/// Task submitter double that records every submission.
pub struct RecordingTaskSubmitter {
    submissions: Mutex<Vec<SubmitTaskRequest>>,
    fail: bool,
}

impl RecordingTaskSubmitter {
    pub fn new() -> Self {
        Self {
            submissions: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            submissions: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn submissions(&self) -> Vec<SubmitTaskRequest> {
        self.submissions.lock().await.clone()
    }
}

#[async_trait]
impl TaskSubmitter for RecordingTaskSubmitter {
    async fn submit_task(&self, request: SubmitTaskRequest) -> Result<TaskId, TaskError> {
        let mut submissions = self.submissions.lock().await;
        submissions.push(request);
        if self.fail {
            return Err(TaskError::Rejected("submitter double failure".to_string()));
        }
        Ok(TaskId(format!("task-{}", submissions.len())))
    }
}

/// App launcher double that records every specification.
pub struct RecordingAppLauncher {
    requests: Mutex<Vec<CreateAppRequest>>,
    fail: bool,
}

impl RecordingAppLauncher {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn requests(&self) -> Vec<CreateAppRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl AppLauncher for RecordingAppLauncher {
    async fn create_app(&self, request: CreateAppRequest) -> Result<(), AppError> {
        self.requests.lock().await.push(request);
        if self.fail {
            return Err(AppError::Rejected("launcher double failure".to_string()));
        }
        Ok(())
    }
}

/// Examiner double serving a fixed app list.
pub struct StaticAppExaminer {
    apps: Vec<AppInfo>,
}

impl StaticAppExaminer {
    pub fn empty() -> Self {
        Self { apps: vec![] }
    }

    pub fn with_apps(apps: Vec<AppInfo>) -> Self {
        Self { apps }
    }
}

#[async_trait]
impl AppExaminer for StaticAppExaminer {
    async fn list_apps(&self) -> Result<Vec<AppInfo>, AppError> {
        Ok(self.apps.clone())
    }
}

/// Harness wiring an orchestrator to the doubles.
pub struct TestHarness {
    pub store: Arc<MockStore>,
    pub tasks: Arc<RecordingTaskSubmitter>,
    pub apps: Arc<RecordingAppLauncher>,
    pub orchestrator: DropletOrchestrator,
}

impl TestHarness {
    /// Harness with no running apps.
    pub fn new() -> Self {
        Self::with_running_apps(vec![])
    }

    /// Harness whose examiner reports the given running apps.
    pub fn with_running_apps(running: Vec<AppInfo>) -> Self {
        let store = Arc::new(MockStore::new());
        let tasks = Arc::new(RecordingTaskSubmitter::new());
        let apps = Arc::new(RecordingAppLauncher::new());
        let examiner = Arc::new(StaticAppExaminer::with_apps(running));

        let orchestrator = DropletOrchestrator::new(
            store.clone(),
            tasks.clone(),
            apps.clone(),
            examiner,
            Config::default(),
        );

        Self {
            store,
            tasks,
            apps,
            orchestrator,
        }
    }
}
