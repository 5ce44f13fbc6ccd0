//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures used throughout the matrix
//! orchestrator. It includes the matrix lifecycle state machine, the persisted
//! record for a single remotely-scheduled job, and the run-wide state map.
//!
//! 此模块定义了整个矩阵编排器中使用的核心数据结构。
//! 它包括矩阵生命周期状态机、单个远程调度任务的持久化记录以及整个运行的状态映射。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::infra::remote::RemoteMatrix;

/// The lifecycle state of a remotely-scheduled test matrix.
/// This is a closed set reported by the remote service; the orchestrator never
/// invents a state on its own, it only mirrors what the service last reported.
///
/// 远程调度的测试矩阵的生命周期状态。
/// 这是由远程服务报告的封闭集合；编排器从不自行发明状态，
/// 它只反映服务最后报告的内容。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatrixState {
    /// The service is still validating the submitted matrix.
    /// 服务仍在验证已提交的矩阵。
    Validating,
    /// The matrix is accepted and waiting for devices.
    /// 矩阵已被接受，正在等待设备。
    Pending,
    /// At least one test execution is running.
    /// 至少有一个测试执行正在运行。
    Running,
    /// Every test execution completed; results are available.
    /// 所有测试执行均已完成；结果可用。
    Finished,
    /// The service hit an infrastructure error while running the matrix.
    /// 服务在运行矩阵时遇到基础设施错误。
    Error,
    /// The requested environment is not supported.
    /// 请求的环境不受支持。
    Unsupported,
    /// The submitted inputs were rejected as invalid.
    /// 提交的输入被判定为无效而拒绝。
    Invalid,
    /// The matrix was cancelled before completion.
    /// 矩阵在完成之前被取消。
    Cancelled,
}

impl MatrixState {
    /// Returns `true` while the remote service has not yet reached a terminal
    /// outcome for the matrix. Only in-progress matrices are refreshed or polled.
    ///
    /// 在远程服务尚未对矩阵得出最终结果时返回 `true`。
    /// 只有进行中的矩阵才会被刷新或轮询。
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            MatrixState::Validating | MatrixState::Pending | MatrixState::Running
        )
    }

    /// A terminal state is one from which no further transition occurs.
    pub fn is_terminal(&self) -> bool {
        !self.is_in_progress()
    }
}

impl fmt::Display for MatrixState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatrixState::Validating => "VALIDATING",
            MatrixState::Pending => "PENDING",
            MatrixState::Running => "RUNNING",
            MatrixState::Finished => "FINISHED",
            MatrixState::Error => "ERROR",
            MatrixState::Unsupported => "UNSUPPORTED",
            MatrixState::Invalid => "INVALID",
            MatrixState::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// One remotely-scheduled test job as persisted in `matrix_ids.json`.
/// The `matrix_id` is the primary key and never changes; every other field is
/// replaced in place when a freshly-fetched remote record is merged in.
///
/// 持久化在 `matrix_ids.json` 中的单个远程调度测试任务。
/// `matrix_id` 是主键且永不改变；当合并新获取的远程记录时，
/// 其他所有字段都会被就地替换。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRecord {
    /// Opaque identifier assigned by the remote service.
    /// 远程服务分配的不透明标识符。
    pub matrix_id: String,
    /// The last lifecycle state reported by the remote service.
    /// 远程服务最后报告的生命周期状态。
    pub state: MatrixState,
    /// Link to the service's own page for this matrix, for the report.
    /// 指向服务端此矩阵页面的链接，用于报告。
    #[serde(default)]
    pub web_link: String,
    /// The object-storage bucket holding this matrix's result artifacts.
    /// 保存此矩阵结果产物的对象存储桶。
    #[serde(default)]
    pub gcs_bucket: String,
    /// The path prefix under the bucket, assigned once by the remote service.
    /// 桶内的路径前缀，由远程服务一次性分配。
    #[serde(default)]
    pub gcs_path: String,
    /// Monotonic false-to-true flag; set only after a successful artifact
    /// download pass, and only for a `FINISHED` matrix.
    /// 单调的 false 到 true 标志；仅在成功的产物下载后设置，
    /// 且仅适用于 `FINISHED` 状态的矩阵。
    #[serde(default)]
    pub downloaded: bool,
}

impl MatrixRecord {
    /// Builds a fresh record from the remote service's view of a just-accepted
    /// matrix. New records start out not downloaded.
    pub fn from_remote(remote: &RemoteMatrix) -> Self {
        Self {
            matrix_id: remote.matrix_id.clone(),
            state: remote.state,
            web_link: remote.web_link.clone(),
            gcs_bucket: remote.gcs_bucket.clone(),
            gcs_path: remote.gcs_path.clone(),
            downloaded: false,
        }
    }

    /// Merges a freshly-fetched remote record into this one, replacing the
    /// mutable fields in place. Returns whether any observable field changed,
    /// so the caller can decide whether a persist is needed. Merging an
    /// identical record is a no-op and reports no change.
    ///
    /// 将新获取的远程记录合并到此记录中，就地替换可变字段。
    /// 返回是否有任何可观察字段发生了变化，以便调用者决定是否需要持久化。
    /// 合并完全相同的记录是无操作，并报告无变化。
    pub fn merge(&mut self, remote: &RemoteMatrix) -> bool {
        debug_assert_eq!(self.matrix_id, remote.matrix_id);
        let changed = self.state != remote.state
            || self.web_link != remote.web_link
            || self.gcs_bucket != remote.gcs_bucket
            || self.gcs_path != remote.gcs_path;
        self.state = remote.state;
        self.web_link = remote.web_link.clone();
        self.gcs_bucket = remote.gcs_bucket.clone();
        self.gcs_path = remote.gcs_path.clone();
        changed
    }

    /// Replaces only the lifecycle state, as observed by the detail poller.
    /// Returns whether the state actually changed.
    pub fn merge_state(&mut self, state: MatrixState) -> bool {
        let changed = self.state != state;
        self.state = state;
        changed
    }

    /// Marks the record as downloaded after an artifact-fetch pass. The flag is
    /// monotonic and is never set while the matrix is not `FINISHED`. Returns
    /// whether the record changed.
    ///
    /// 在产物获取完成后将记录标记为已下载。该标志是单调的，
    /// 并且在矩阵未处于 `FINISHED` 状态时永远不会被设置。返回记录是否发生了变化。
    pub fn mark_downloaded(&mut self) -> bool {
        if self.state == MatrixState::Finished && !self.downloaded {
            self.downloaded = true;
            true
        } else {
            false
        }
    }

    /// A record is eligible for artifact fetching once it finished successfully
    /// and its artifacts have not been downloaded yet.
    pub fn needs_download(&self) -> bool {
        self.state == MatrixState::Finished && !self.downloaded
    }
}

/// The full set of matrix records for one run, keyed by matrix id, plus the
/// run's own directory under the results root. This map is the unit of
/// persistence: every crash-surviving mutation is followed by a full rewrite
/// of `matrix_ids.json` before the mutating pass is considered complete.
///
/// 一次运行的全部矩阵记录集合，以矩阵 id 为键，外加该运行在结果根目录下的
/// 自有目录。此映射是持久化的基本单位：每次需要在崩溃后保留的变更，
/// 都会在变更操作被视为完成之前完整重写 `matrix_ids.json`。
#[derive(Debug, Clone)]
pub struct MatrixMap {
    /// The timestamped run directory this map persists into.
    /// 此映射持久化到的带时间戳的运行目录。
    pub run_path: PathBuf,
    /// Records keyed by their unique matrix id. Insertion order carries no
    /// meaning; a BTreeMap keeps serialization deterministic.
    /// 以唯一矩阵 id 为键的记录。插入顺序没有语义；
    /// BTreeMap 使序列化结果保持确定性。
    pub map: BTreeMap<String, MatrixRecord>,
}

impl MatrixMap {
    pub fn new(run_path: PathBuf) -> Self {
        Self {
            run_path,
            map: BTreeMap::new(),
        }
    }

    /// Ids of every record the remote service has not yet finished with.
    /// Terminal records are never included, so a matrix observed terminal once
    /// is never refreshed or polled again.
    ///
    /// 远程服务尚未完成的所有记录的 id。
    /// 终态记录永远不会包含在内，因此一旦观察到矩阵处于终态，
    /// 它就不会再被刷新或轮询。
    pub fn in_progress_ids(&self) -> Vec<String> {
        self.map
            .values()
            .filter(|r| r.state.is_in_progress())
            .map(|r| r.matrix_id.clone())
            .collect()
    }

    /// `true` once every matrix reached the successful terminal state.
    pub fn all_finished(&self) -> bool {
        self.map.values().all(|r| r.state == MatrixState::Finished)
    }
}
