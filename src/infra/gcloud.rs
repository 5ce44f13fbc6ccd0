//! # Service CLI Backend / 服务 CLI 后端
//!
//! Production implementation of the remote collaborator traits on top of the
//! `gcloud` and `gsutil` command-line tools. Command output is captured with
//! [`spawn_and_capture`](crate::infra::command::spawn_and_capture) and parsed
//! from JSON into typed wire structs.
//!
//! 基于 `gcloud` 和 `gsutil` 命令行工具的远程协作者 trait 的生产实现。
//! 命令输出通过 [`spawn_and_capture`](crate::infra::command::spawn_and_capture)
//! 捕获，并从 JSON 解析为带类型的传输结构。

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::core::args::{DeviceConfig, RunArgs};
use crate::core::models::{MatrixMap, MatrixRecord, MatrixState};
use crate::infra::command::spawn_and_capture;
use crate::infra::remote::{
    MatrixDetail, ObjectStore, RemoteMatrix, StorageObject, TestExecution, TestService,
    parse_gcs_path,
};

/// A test matrix as reported by `gcloud ... --format=json`.
/// `gcloud ... --format=json` 报告的测试矩阵。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GcloudMatrix {
    test_matrix_id: String,
    state: MatrixState,
    #[serde(default)]
    result_storage: Option<ResultStorage>,
    #[serde(default)]
    test_executions: Vec<GcloudExecution>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultStorage {
    google_cloud_storage: GoogleCloudStorage,
    #[serde(default)]
    results_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleCloudStorage {
    /// Full `gs://bucket/path` URL of the matrix's result directory.
    /// 矩阵结果目录的完整 `gs://bucket/path` URL。
    gcs_path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GcloudExecution {
    #[serde(default)]
    id: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    test_details: Option<TestDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestDetails {
    #[serde(default)]
    progress_messages: Vec<String>,
    #[serde(default)]
    error_message: Option<String>,
}

impl GcloudMatrix {
    fn into_remote(self) -> Result<RemoteMatrix> {
        let (web_link, gcs_url) = match self.result_storage {
            Some(storage) => (
                storage.results_url.unwrap_or_default(),
                storage.google_cloud_storage.gcs_path,
            ),
            None => (String::new(), String::new()),
        };
        let (gcs_bucket, gcs_path) = if gcs_url.is_empty() {
            (String::new(), String::new())
        } else {
            parse_gcs_path(&gcs_url)?
        };
        Ok(RemoteMatrix {
            matrix_id: self.test_matrix_id,
            state: self.state,
            web_link,
            gcs_bucket,
            gcs_path,
        })
    }

    fn into_detail(self) -> MatrixDetail {
        MatrixDetail {
            state: self.state,
            executions: self
                .test_executions
                .into_iter()
                .map(|e| {
                    let details = e.test_details.unwrap_or(TestDetails {
                        progress_messages: vec![],
                        error_message: None,
                    });
                    TestExecution {
                        id: e.id,
                        state: e.state.unwrap_or_default(),
                        error: details.error_message,
                        progress: details.progress_messages,
                    }
                })
                .collect(),
        }
    }
}

/// The remote test-execution service behind the `gcloud firebase test` CLI.
/// `gcloud firebase test` CLI 背后的远程测试执行服务。
#[derive(Debug, Clone, Default)]
pub struct GcloudService;

impl GcloudService {
    /// Base command `gcloud firebase test <platform> ...` for the platform the
    /// arguments are tagged with.
    fn base_command(args: &RunArgs) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new("gcloud");
        cmd.kill_on_drop(true)
            .arg("firebase")
            .arg("test")
            .arg(args.platform());
        cmd
    }

    fn device_flags(cmd: &mut tokio::process::Command, devices: &[DeviceConfig]) {
        for d in devices {
            cmd.arg("--device").arg(format!(
                "model={},version={},locale={},orientation={}",
                d.model, d.version, d.locale, d.orientation
            ));
        }
    }

    async fn run_json<T: DeserializeOwned>(
        mut cmd: tokio::process::Command,
        what: &str,
    ) -> Result<T> {
        cmd.arg("--format=json");
        let (status_res, output) = spawn_and_capture(cmd).await;
        let status =
            status_res.with_context(|| format!("Failed to spawn gcloud for {}", what))?;
        if !status.success() {
            bail!("gcloud {} failed:\n{}", what, output.trim());
        }
        // gcloud prints warnings before the JSON document; skip to the first
        // line that opens it.
        // gcloud 会在 JSON 文档之前打印警告；跳到打开 JSON 的第一行。
        let json_start = output
            .find(['[', '{'])
            .ok_or_else(|| anyhow!("gcloud {} produced no JSON:\n{}", what, output.trim()))?;
        serde_json::from_str(&output[json_start..])
            .with_context(|| format!("Failed to parse gcloud {} output", what))
    }

    async fn describe_matrix(matrix_id: &str, args: &RunArgs) -> Result<GcloudMatrix> {
        let mut cmd = Self::base_command(args);
        cmd.arg("matrices")
            .arg("describe")
            .arg(matrix_id)
            .arg("--project")
            .arg(args.project());
        Self::run_json(cmd, "matrices describe").await
    }
}

impl TestService for GcloudService {
    async fn submit(&self, args: &RunArgs, run_path: &Path) -> Result<MatrixMap> {
        let mut cmd = Self::base_command(args);
        cmd.arg("run").arg("--async");
        match args {
            RunArgs::Android(a) => {
                cmd.arg("--type")
                    .arg("instrumentation")
                    .arg("--app")
                    .arg(&a.app)
                    .arg("--test")
                    .arg(&a.test);
                Self::device_flags(&mut cmd, &a.device);
                if a.flaky_test_attempts > 0 {
                    cmd.arg("--num-flaky-test-attempts")
                        .arg(a.flaky_test_attempts.to_string());
                }
            }
            RunArgs::Ios(i) => {
                cmd.arg("--test")
                    .arg(&i.test)
                    .arg("--xctestrun-file")
                    .arg(&i.xctestrun_file);
                Self::device_flags(&mut cmd, &i.device);
            }
        }
        cmd.arg("--project").arg(args.project());

        let accepted: Vec<GcloudMatrix> = Self::run_json(cmd, "run").await?;
        if accepted.is_empty() {
            bail!("the service accepted no matrices");
        }

        let mut matrices = MatrixMap::new(run_path.to_path_buf());
        for matrix in accepted {
            let remote = matrix.into_remote()?;
            matrices
                .map
                .insert(remote.matrix_id.clone(), MatrixRecord::from_remote(&remote));
        }
        Ok(matrices)
    }

    async fn refresh(&self, matrix_id: &str, args: &RunArgs) -> Result<RemoteMatrix> {
        Self::describe_matrix(matrix_id, args).await?.into_remote()
    }

    async fn cancel(&self, matrix_id: &str, args: &RunArgs) -> Result<()> {
        let mut cmd = Self::base_command(args);
        cmd.arg("matrices")
            .arg("cancel")
            .arg(matrix_id)
            .arg("--project")
            .arg(args.project());
        let (status_res, output) = spawn_and_capture(cmd).await;
        let status = status_res.context("Failed to spawn gcloud for matrices cancel")?;
        if !status.success() {
            bail!("gcloud matrices cancel failed:\n{}", output.trim());
        }
        Ok(())
    }

    async fn describe(&self, matrix_id: &str, args: &RunArgs) -> Result<MatrixDetail> {
        Ok(Self::describe_matrix(matrix_id, args).await?.into_detail())
    }
}

/// The object-storage service behind the `gsutil` CLI.
/// `gsutil` CLI 背后的对象存储服务。
#[derive(Debug, Clone, Default)]
pub struct GsutilStore;

impl ObjectStore for GsutilStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<StorageObject>> {
        let mut cmd = tokio::process::Command::new("gsutil");
        cmd.kill_on_drop(true)
            .arg("ls")
            .arg("-r")
            .arg(format!("gs://{}/{}**", bucket, prefix));
        let (status_res, output) = spawn_and_capture(cmd).await;
        let status = status_res.context("Failed to spawn gsutil ls")?;
        if !status.success() {
            bail!("gsutil ls failed:\n{}", output.trim());
        }

        output
            .lines()
            .map(str::trim)
            // Directory placeholders end with a slash and are not objects.
            // 目录占位行以斜杠结尾，不是对象。
            .filter(|line| line.starts_with("gs://") && !line.ends_with('/') && !line.ends_with(':'))
            .map(|line| {
                let (bucket, name) = parse_gcs_path(line)?;
                Ok(StorageObject { bucket, name })
            })
            .collect()
    }

    async fn download(&self, object: &StorageObject, dest: &Path) -> Result<()> {
        let mut cmd = tokio::process::Command::new("gsutil");
        cmd.kill_on_drop(true)
            .arg("cp")
            .arg(format!("gs://{}/{}", object.bucket, object.name))
            .arg(dest);
        let (status_res, output) = spawn_and_capture(cmd).await;
        let status = status_res.context("Failed to spawn gsutil cp")?;
        if !status.success() {
            bail!("gsutil cp failed for {}:\n{}", object.name, output.trim());
        }
        Ok(())
    }
}
