//! # Run Resolver Module / 运行解析模块
//!
//! Reconstructs a previous run from disk: the most recent run directory, the
//! platform-specific arguments persisted inside it, and its matrix map. This
//! is what makes "refresh the last run" and "cancel the last run" possible
//! across process restarts.
//!
//! 从磁盘重建先前的运行：最近的运行目录、其中持久化的平台特定参数
//! 及其矩阵映射。这正是跨进程重启实现"刷新上次运行"和"取消上次运行"的基础。

use anyhow::{Result, bail};
use std::path::Path;

use crate::core::args::{ANDROID_ARGS_FILE, IOS_ARGS_FILE, RunArgs};
use crate::core::models::MatrixMap;
use crate::infra::fs::{self, NotFoundError};

/// Reconstructs the run arguments of the most recent run by detecting which
/// platform-specific config file is present in its directory. Fails with
/// [`NotFoundError`] if no run directory exists or the selected directory
/// contains no recognized config file.
///
/// 通过检测最近运行目录中存在哪个平台特定配置文件来重建其运行参数。
/// 如果不存在任何运行目录，或所选目录中没有可识别的配置文件，
/// 则以 [`NotFoundError`] 失败。
pub fn last_args(results_root: &Path) -> Result<RunArgs> {
    let run_path = fs::last_run_path(results_root)?;
    args_from_run_dir(&run_path)
}

/// Loads the run arguments persisted inside one run directory.
pub fn args_from_run_dir(run_path: &Path) -> Result<RunArgs> {
    for file_name in [ANDROID_ARGS_FILE, IOS_ARGS_FILE] {
        let candidate = run_path.join(file_name);
        if candidate.is_file() {
            return RunArgs::from_file(&candidate);
        }
    }
    bail!(NotFoundError(format!(
        "no recognized run config in {}",
        run_path.display()
    )));
}

/// Reconstructs the matrix map of the most recent run.
/// 重建最近一次运行的矩阵映射。
pub fn last_matrices(results_root: &Path) -> Result<MatrixMap> {
    let run_path = fs::last_run_path(results_root)?;
    fs::load_matrix_map(&run_path, results_root)
}

/// Loads a matrix map from an explicit path, resolved first as given and then
/// under the results root.
pub fn matrix_path_to_obj(path: &Path, results_root: &Path) -> Result<MatrixMap> {
    fs::load_matrix_map(path, results_root)
}
