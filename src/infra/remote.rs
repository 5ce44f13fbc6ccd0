//! # Remote Collaborator Contracts / 远程协作者契约
//!
//! The narrow interfaces through which the orchestrator consumes the remote
//! test-execution service and the object-storage service. Everything behind
//! these traits is an external collaborator; the orchestrator only observes
//! and reacts to what they report.
//!
//! 编排器用来消费远程测试执行服务和对象存储服务的窄接口。
//! 这些 trait 背后的一切都是外部协作者；编排器只观察它们的报告并作出反应。

use anyhow::{Result, bail};
use std::path::Path;

use crate::core::args::RunArgs;
use crate::core::models::{MatrixMap, MatrixState};

/// The remote service's view of one matrix, as returned by a refresh call.
/// 远程服务对单个矩阵的视图，由一次刷新调用返回。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMatrix {
    pub matrix_id: String,
    pub state: MatrixState,
    pub web_link: String,
    pub gcs_bucket: String,
    pub gcs_path: String,
}

/// One constituent test execution within a matrix, e.g. one device/OS
/// combination. The execution-level state is a free-form service string and is
/// only compared for change, never interpreted.
///
/// 矩阵中的单个测试执行，例如一个设备/系统组合。
/// 执行级状态是服务端的自由格式字符串，只用于变化比较，从不被解释。
#[derive(Debug, Clone, Default)]
pub struct TestExecution {
    pub id: String,
    pub state: String,
    /// Sticky error message; the service never clears it once set.
    /// 粘性错误消息；服务一旦设置就不会清除。
    pub error: Option<String>,
    /// Ordered progress narration for this execution so far.
    /// 此执行到目前为止的有序进度消息。
    pub progress: Vec<String>,
}

/// The full detail of one matrix, fetched by the detail poller.
/// 由详细轮询器获取的单个矩阵的完整详情。
#[derive(Debug, Clone)]
pub struct MatrixDetail {
    pub state: MatrixState,
    pub executions: Vec<TestExecution>,
}

/// One result object stored remotely, e.g. a log, video or XML report.
/// 远程存储的单个结果对象，例如日志、视频或 XML 报告。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageObject {
    pub bucket: String,
    /// Full object name under the bucket, including the matrix's path prefix.
    /// 桶内的完整对象名称，包括矩阵的路径前缀。
    pub name: String,
}

/// The remote test-execution service. Refresh and describe are idempotent and
/// safe to issue concurrently for distinct ids; cancel is fire-and-forget and
/// its effect is only observed on the next refresh.
///
/// 远程测试执行服务。refresh 与 describe 是幂等的，
/// 对不同的 id 并发调用是安全的；cancel 是即发即弃的，
/// 其效果只能在下一次刷新时观察到。
pub trait TestService {
    /// Submits a new run, returning the map of matrices the service accepted.
    fn submit(
        &self,
        args: &RunArgs,
        run_path: &Path,
    ) -> impl Future<Output = Result<MatrixMap>> + Send;

    /// Fetches the current remote record for one matrix.
    fn refresh(
        &self,
        matrix_id: &str,
        args: &RunArgs,
    ) -> impl Future<Output = Result<RemoteMatrix>> + Send;

    /// Requests cancellation of one matrix.
    fn cancel(
        &self,
        matrix_id: &str,
        args: &RunArgs,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Fetches the full detail of one matrix, including its test executions.
    fn describe(
        &self,
        matrix_id: &str,
        args: &RunArgs,
    ) -> impl Future<Output = Result<MatrixDetail>> + Send;
}

/// The object-storage service the remote service writes result artifacts to.
/// 远程服务将结果产物写入的对象存储服务。
pub trait ObjectStore {
    /// Lists every object under a bucket/prefix pair.
    fn list(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> impl Future<Output = Result<Vec<StorageObject>>> + Send;

    /// Downloads one object to a local path. Parent directories already exist.
    fn download(
        &self,
        object: &StorageObject,
        dest: &Path,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Splits a `gs://bucket/path/prefix` URL into its bucket and prefix parts.
/// The remote service reports result locations in this form.
///
/// 将 `gs://bucket/path/prefix` URL 拆分为桶和前缀两部分。
/// 远程服务以这种形式报告结果位置。
pub fn parse_gcs_path(gcs_url: &str) -> Result<(String, String)> {
    let Some(rest) = gcs_url.strip_prefix("gs://") else {
        bail!("Not a storage URL: {}", gcs_url);
    };
    match rest.split_once('/') {
        Some((bucket, prefix)) => Ok((bucket.to_string(), prefix.to_string())),
        None => Ok((rest.to_string(), String::new())),
    }
}
