// src/commands/cancel.rs

use anyhow::Result;
use colored::*;
use std::path::Path;

use crate::core::{refresh, resolver};
use crate::infra::gcloud::GcloudService;
use crate::infra::{fs, t};

/// Cancels the most recent run: reconstructs it from disk and requests
/// best-effort cancellation of every in-progress matrix. Cancellation is not
/// merged back; the next refresh observes its effect.
///
/// 取消最近一次运行：从磁盘重建并请求尽力取消每个进行中的矩阵。
/// 取消不会合并回映射；其效果由下一次刷新观察到。
pub async fn execute(results_dir: Option<&Path>) -> Result<i32> {
    let results_root = fs::results_root(results_dir);
    let args = resolver::last_args(&results_root)?;
    let matrices = resolver::last_matrices(&results_root)?;

    println!(
        "{}",
        t!("cancel.cancelling_run", path = matrices.run_path.display()).bold()
    );

    let requested = refresh::cancel_matrices(&matrices, &args, &GcloudService).await?;
    if requested > 0 {
        println!("{}", t!("cancel.requested", count = requested).green());
    }
    Ok(0)
}
