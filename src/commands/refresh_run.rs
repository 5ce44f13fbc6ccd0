// src/commands/refresh_run.rs

use anyhow::Result;
use colored::*;
use std::path::Path;

use crate::commands::{run_pipeline, setup_signal_handler};
use crate::core::{refresh, resolver};
use crate::infra::gcloud::{GcloudService, GsutilStore};
use crate::infra::{fs, t};

/// Resumes the most recent run: reconstructs its arguments and matrix map from
/// disk, refreshes every in-progress matrix, then re-enters the same poll →
/// fetch → report pipeline a new run uses. Returns the process exit code.
///
/// 恢复最近一次运行：从磁盘重建其参数和矩阵映射，刷新每个进行中的矩阵，
/// 然后重新进入与新运行相同的轮询 → 获取 → 报告管线。返回进程退出码。
pub async fn execute(results_dir: Option<&Path>) -> Result<i32> {
    let results_root = fs::results_root(results_dir);
    let args = resolver::last_args(&results_root)?;
    let mut matrices = resolver::last_matrices(&results_root)?;

    println!(
        "{}",
        t!("refresh.resuming", path = matrices.run_path.display()).bold()
    );

    let service = GcloudService;
    refresh::refresh_matrices(&mut matrices, &args, &service).await?;

    setup_signal_handler(&matrices, &args);
    run_pipeline(&mut matrices, &args, &service, &GsutilStore, &results_root).await
}
