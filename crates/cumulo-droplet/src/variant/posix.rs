// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! POSIX staging/launch variant.
//!
//! POSIX cells run the standard helper bundle (builder, launcher,
//! healthcheck) and reach the content store through its delegated
//! actions, so the graphs here never carry store credentials.

use crate::action::{Action, ActionGraph};
use crate::app::CreateAppRequest;
use crate::config::Config;
use crate::error::Result;
use crate::store::ContentStore;

use super::{BuildRequest, LaunchRequest, LifecycleVariant};

/// Stack identifier for POSIX staging.
pub const STACK: &str = "cflinuxfs2";
/// Execution environment id for POSIX cells.
pub const ENVIRONMENT_ID: &str = "preloaded:cflinuxfs2";

const CELL_USER: &str = "vcap";
const APP_ROOT: &str = "/home/vcap/app";

/// The POSIX lifecycle variant.
pub struct PosixVariant {
    config: Config,
}

impl PosixVariant {
    /// Create a POSIX variant using the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn builder_args(buildpack_url: &str) -> Vec<String> {
        vec![
            format!("-buildpackOrder={buildpack_url}"),
            "-skipDetect=true".to_string(),
        ]
    }
}

impl LifecycleVariant for PosixVariant {
    fn environment_id(&self) -> &'static str {
        ENVIRONMENT_ID
    }

    fn stack(&self) -> &'static str {
        STACK
    }

    fn build_graph(&self, store: &dyn ContentStore, request: &BuildRequest) -> ActionGraph {
        ActionGraph::serial(vec![
            Action::download(&self.config.helper_bundle_url, "/tmp", CELL_USER),
            store.download_app_bits_action(&request.droplet_name),
            store.delete_app_bits_action(&request.droplet_name),
            Action::run(
                "/bin/chmod",
                "/tmp/app",
                vec!["-R".to_string(), "a+X".to_string(), ".".to_string()],
                CELL_USER,
            ),
            Action::run(
                "/tmp/builder",
                "/",
                Self::builder_args(&request.buildpack_url),
                CELL_USER,
            ),
            store.upload_droplet_action(&request.droplet_name),
            store.upload_droplet_metadata_action(&request.droplet_name),
        ])
    }

    fn launch_spec(
        &self,
        store: &dyn ContentStore,
        request: &LaunchRequest,
        execution_metadata: &str,
        annotation: String,
    ) -> Result<CreateAppRequest> {
        let mut env = request.env.clone();
        env.insert("PWD".to_string(), "/home/vcap".to_string());
        env.insert("TMPDIR".to_string(), "/home/vcap/tmp".to_string());

        let mut start_command = vec![request.start_command.clone()];
        start_command.extend(request.start_args.iter().cloned());

        Ok(CreateAppRequest {
            name: request.app_name.clone(),
            environment_id: ENVIRONMENT_ID.to_string(),
            start_command: "/tmp/launcher".to_string(),
            args: vec![
                APP_ROOT.to_string(),
                start_command.join(" "),
                execution_metadata.to_string(),
            ],
            setup: ActionGraph::serial(vec![
                Action::download(&self.config.helper_bundle_url, "/tmp", CELL_USER),
                Action::download(&self.config.healthcheck_bundle_url, "/tmp", CELL_USER),
                store.download_droplet_action(&request.droplet_name),
            ])
            .with_log_source(&request.app_name),
            annotation,
            env,
            working_dir: None,
            instances: request.instances,
            resources: request.resources,
            monitor: request.monitor,
        })
    }
}
