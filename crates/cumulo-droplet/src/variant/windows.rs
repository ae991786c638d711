// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Windows staging/launch variant.
//!
//! Windows cells cannot run the standard builder binary or the store's
//! helper actions, so staging is inlined as one scripted powershell step
//! with fail-fast exit checks, and all store traffic goes through a
//! WebDAV transfer tool addressing the store's native endpoint directly
//! (credentials embedded in the URL via [`ContentStore::raw_endpoint`]).

use serde_json::Value;

use crate::action::{Action, ActionGraph};
use crate::app::{CreateAppRequest, MonitorConfig, MonitorMethod};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{ContentStore, bits_path, droplet_zip_path, metadata_path, raw_blob_url};

use super::{BuildRequest, LaunchRequest, LifecycleVariant};

/// Stack identifier for Windows staging.
pub const STACK: &str = "buildpack";
/// Execution environment id for Windows cells.
pub const ENVIRONMENT_ID: &str = "windowsservercore:buildpack";

const CELL_USER: &str = "dummy";

// Fail-fast exit codes for the scripted staging sub-steps. The cell
// reports them as-is; there is no finer-grained mapping.
const EXIT_DETECT_FAILED: u8 = 10;
const EXIT_RELEASE_FAILED: u8 = 11;
const EXIT_COMPILE_FAILED: u8 = 12;

/// The Windows lifecycle variant.
pub struct WindowsVariant {
    config: Config,
}

impl WindowsVariant {
    /// Create a Windows variant using the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The single scripted staging step: merge nested buildpack dirs,
    /// run detect/release/compile with exit checks, extract the released
    /// start command, zip the compiled app, and write `result.json`
    /// embedding the buildpack identity and detected start command.
    fn staging_script_args(buildpack_url: &str) -> Vec<String> {
        vec![
            "-command".to_string(),
            r#"""#.to_string(),
            r"cp -Recurse .\buildpack\*\* .\buildpack\ -ErrorAction SilentlyContinue;".to_string(),
            r"$detectedBuildpack = (& C:\tmp\buildpack\bin\detect.bat C:\tmp\app | Out-String);"
                .to_string(),
            format!(r"if ($LASTEXITCODE -ne 0) {{ exit {EXIT_DETECT_FAILED} }};"),
            r"$releaseYaml = (& C:\tmp\buildpack\bin\release.bat C:\tmp\app | Out-String);"
                .to_string(),
            format!(r"if ($LASTEXITCODE -ne 0) {{ exit {EXIT_RELEASE_FAILED} }};"),
            r"$releaseYaml -match '\s+web:\s(?<start>.+)';".to_string(),
            r"$startCommand = $Matches['start'].Trim();".to_string(),
            r"& C:\tmp\buildpack\bin\compile.bat C:\tmp\app c:\tmp\cache;".to_string(),
            format!(r"if ($LASTEXITCODE -ne 0) {{ exit {EXIT_COMPILE_FAILED} }};"),
            r"$fileSystemAssemblyPath = Join-Path ([System.Runtime.InteropServices.RuntimeEnvironment]::GetRuntimeDirectory()) 'System.IO.Compression.FileSystem.dll';"
                .to_string(),
            r"Add-Type -Path $fileSystemAssemblyPath;".to_string(),
            r"[System.IO.Compression.ZipFile]::CreateFromDirectory('c:\tmp\app','c:\tmp\droplet.zip',[System.IO.Compression.CompressionLevel]::Optimal, $false);"
                .to_string(),
            r"$executionMetadata = (@{ 'start_command' = $startCommand } | ConvertTo-Json | Out-String);"
                .to_string(),
            // result.json keys: the buildpack identity pair is
            // hyphenated, the execution metadata pair snake_case. Launch
            // only ever reads execution_metadata.
            format!(
                r"@{{'buildpack-key' = '{buildpack_url}'; 'detected-buildpack' = ''; 'execution_metadata' = $executionMetadata; 'detected_start_command' = @{{ 'web' = $startCommand }} }} | ConvertTo-Json | Out-File -Encoding 'ASCII' c:\tmp\result.json;"
            ),
            r#"""#.to_string(),
        ]
    }

    /// Start command extracted from the execution metadata payload.
    ///
    /// Windows staging writes the metadata as a JSON object carrying a
    /// `start_command` field; any other shape means the droplet cannot
    /// be launched on a Windows cell.
    fn start_command_from_metadata(execution_metadata: &str) -> Result<String> {
        let value: Value = serde_json::from_str(execution_metadata).map_err(|e| {
            Error::MetadataNotFound(format!("execution metadata is not JSON: {e}"))
        })?;

        value
            .as_object()
            .and_then(|obj| obj.get("start_command"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::MetadataNotFound(
                    "execution metadata has no start_command field".to_string(),
                )
            })
    }
}

impl LifecycleVariant for WindowsVariant {
    fn environment_id(&self) -> &'static str {
        ENVIRONMENT_ID
    }

    fn stack(&self) -> &'static str {
        STACK
    }

    fn build_graph(&self, store: &dyn ContentStore, request: &BuildRequest) -> ActionGraph {
        let endpoint = store.raw_endpoint();
        let bits_url = raw_blob_url(&endpoint, &bits_path(&request.droplet_name));
        let droplet_url = raw_blob_url(&endpoint, &droplet_zip_path(&request.droplet_name));
        let result_url = raw_blob_url(&endpoint, &metadata_path(&request.droplet_name));

        ActionGraph::serial(vec![
            Action::download(&self.config.dav_tool_url, "tmp", CELL_USER),
            Action::download(&bits_url, r"tmp\app", CELL_USER),
            Action::download(&request.buildpack_url, r"tmp\buildpack", CELL_USER),
            Action::run(
                r"c:\tmp\davtool",
                r"c:\",
                vec!["delete".to_string(), bits_url],
                CELL_USER,
            ),
            Action::run(
                "powershell.exe",
                r"c:\tmp",
                Self::staging_script_args(&request.buildpack_url),
                CELL_USER,
            ),
            Action::run(
                r"c:\tmp\davtool",
                r"c:\",
                vec![
                    "put".to_string(),
                    droplet_url,
                    r"c:\tmp\droplet.zip".to_string(),
                ],
                CELL_USER,
            ),
            Action::run(
                r"c:\tmp\davtool",
                r"c:\",
                vec![
                    "put".to_string(),
                    result_url,
                    r"c:\tmp\result.json".to_string(),
                ],
                CELL_USER,
            ),
        ])
    }

    fn launch_spec(
        &self,
        store: &dyn ContentStore,
        request: &LaunchRequest,
        execution_metadata: &str,
        annotation: String,
    ) -> Result<CreateAppRequest> {
        let start_command = Self::start_command_from_metadata(execution_metadata)?;

        let endpoint = store.raw_endpoint();
        let droplet_url = raw_blob_url(&endpoint, &droplet_zip_path(&request.droplet_name));

        let mut env = request.env.clone();
        env.insert("HOME".to_string(), r"c:\app".to_string());
        env.insert("HOMEPATH".to_string(), r"c:\".to_string());

        Ok(CreateAppRequest {
            name: request.app_name.clone(),
            environment_id: ENVIRONMENT_ID.to_string(),
            start_command: "powershell.exe".to_string(),
            args: vec![
                "-command".to_string(),
                r#"""#.to_string(),
                r"cd c:\app;".to_string(),
                format!("& {start_command};"),
                r#"""#.to_string(),
            ],
            setup: ActionGraph::serial(vec![Action::download(&droplet_url, "app", "vcap")])
                .with_log_source(&request.app_name),
            annotation,
            env,
            working_dir: Some(r"c:\app".to_string()),
            instances: request.instances,
            resources: request.resources,
            monitor: MonitorConfig {
                method: MonitorMethod::Process,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockStore;
    use std::collections::HashMap;

    fn build_request() -> BuildRequest {
        BuildRequest {
            task_name: "t1".to_string(),
            droplet_name: "winapp".to_string(),
            buildpack_url: "http://bp.example/iis.git".to_string(),
            env: HashMap::new(),
            memory_mb: 512,
            cpu_weight: 100,
            disk_mb: 1024,
        }
    }

    fn launch_request() -> LaunchRequest {
        LaunchRequest {
            app_name: "winweb".to_string(),
            droplet_name: "winapp".to_string(),
            start_command: String::new(),
            start_args: vec![],
            env: HashMap::new(),
            instances: 1,
            resources: Default::default(),
            monitor: Default::default(),
        }
    }

    #[test]
    fn test_build_graph_shape() {
        let variant = WindowsVariant::new(Config::default());
        let store = MockStore::new();

        let graph = variant.build_graph(&store, &build_request());

        assert_eq!(graph.len(), 7);
        // tool, bits, buildpack downloads up front
        assert!(matches!(&graph.actions[0], Action::Download { .. }));
        assert!(matches!(&graph.actions[1], Action::Download { to, .. } if to == r"tmp\app"));
        assert!(
            matches!(&graph.actions[2], Action::Download { to, .. } if to == r"tmp\buildpack")
        );
        // bits deleted over the native protocol, not a delegated action
        let Action::Run { path, args, .. } = &graph.actions[3] else {
            panic!("expected davtool delete");
        };
        assert_eq!(path, r"c:\tmp\davtool");
        assert_eq!(args[0], "delete");
        assert!(args[1].contains("winapp/bits.zip"));
        assert!(args[1].contains("user:pass@"));
    }

    #[test]
    fn test_staging_script_fail_fast_exit_codes() {
        let variant = WindowsVariant::new(Config::default());
        let store = MockStore::new();

        let graph = variant.build_graph(&store, &build_request());

        let Action::Run { path, args, .. } = &graph.actions[4] else {
            panic!("expected scripted staging step");
        };
        assert_eq!(path, "powershell.exe");
        let script = args.join(" ");
        assert!(script.contains("exit 10"));
        assert!(script.contains("exit 11"));
        assert!(script.contains("exit 12"));
        assert!(script.contains("detect.bat"));
        assert!(script.contains("release.bat"));
        assert!(script.contains("compile.bat"));
        assert!(script.contains("http://bp.example/iis.git"));
    }

    #[test]
    fn test_staging_script_result_json_keys() {
        let variant = WindowsVariant::new(Config::default());
        let store = MockStore::new();

        let graph = variant.build_graph(&store, &build_request());

        let Action::Run { args, .. } = &graph.actions[4] else {
            panic!("expected scripted staging step");
        };
        let script = args.join(" ");
        assert!(script.contains("'buildpack-key' = 'http://bp.example/iis.git'"));
        assert!(script.contains("'detected-buildpack' = ''"));
        assert!(script.contains("'execution_metadata' = $executionMetadata"));
        assert!(script.contains("'detected_start_command'"));
    }

    #[test]
    fn test_build_graph_ends_with_two_uploads() {
        let variant = WindowsVariant::new(Config::default());
        let store = MockStore::new();

        let graph = variant.build_graph(&store, &build_request());

        for (action, object) in [(&graph.actions[5], "droplet.zip"), (&graph.actions[6], "result.json")] {
            let Action::Run { path, args, .. } = action else {
                panic!("expected davtool put");
            };
            assert_eq!(path, r"c:\tmp\davtool");
            assert_eq!(args[0], "put");
            assert!(args[1].contains(object));
        }
    }

    #[test]
    fn test_launch_spec_extracts_start_command() {
        let variant = WindowsVariant::new(Config::default());
        let store = MockStore::new();

        let spec = variant
            .launch_spec(
                &store,
                &launch_request(),
                r#"{"start_command":"npm start"}"#,
                "{}".to_string(),
            )
            .unwrap();

        assert_eq!(spec.start_command, "powershell.exe");
        assert!(spec.args.contains(&"& npm start;".to_string()));
        assert_eq!(spec.working_dir.as_deref(), Some(r"c:\app"));
        assert_eq!(spec.monitor.method, MonitorMethod::Process);
        assert_eq!(spec.env["HOME"], r"c:\app");
        assert_eq!(spec.env["HOMEPATH"], r"c:\");
        // only the droplet download, no helper bundles
        assert_eq!(spec.setup.len(), 1);
    }

    #[test]
    fn test_launch_spec_rejects_malformed_metadata() {
        let variant = WindowsVariant::new(Config::default());
        let store = MockStore::new();

        for metadata in ["not json", r#""just a string""#, r#"{"no_start":"here"}"#] {
            let err = variant
                .launch_spec(&store, &launch_request(), metadata, "{}".to_string())
                .unwrap_err();
            assert!(matches!(err, Error::MetadataNotFound(_)), "{metadata}");
        }
    }
}
