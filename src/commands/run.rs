// src/commands/run.rs

use anyhow::Result;
use colored::*;
use std::path::{Path, PathBuf};

use crate::commands::{run_pipeline, setup_signal_handler};
use crate::core::args::RunArgs;
use crate::infra::gcloud::{GcloudService, GsutilStore};
use crate::infra::remote::TestService;
use crate::infra::{fs, t};

/// Starts a new run: submits the matrices described by the config file,
/// persists the fresh state map and arguments into a new timestamped run
/// directory, then drives the poll → fetch → report pipeline unless the run is
/// asynchronous. Returns the process exit code.
///
/// 启动一次新运行：提交配置文件描述的矩阵，将新的状态映射和参数持久化到
/// 新的带时间戳运行目录，然后驱动轮询 → 获取 → 报告管线（异步运行除外）。
/// 返回进程退出码。
pub async fn execute(config: PathBuf, results_dir: Option<&Path>) -> Result<i32> {
    let args = RunArgs::from_file(&config)?;
    let results_root = fs::results_root(results_dir);
    let run_path = fs::unique_run_path(&results_root);

    println!("{}", t!("run.submitting", platform = args.platform()).bold());

    let service = GcloudService;
    let mut matrices = service.submit(&args, &run_path).await?;

    // Persist before anything else so the run can be resumed or cancelled
    // even if this process dies mid-poll.
    // 先行持久化，这样即使此进程在轮询中途死亡，运行也可以被恢复或取消。
    let state_path = fs::persist_matrix_map(&matrices)?;
    args.save(&run_path)?;

    println!(
        "{}",
        t!(
            "run.submitted",
            count = matrices.map.len(),
            path = state_path.display()
        )
        .green()
    );
    for record in matrices.map.values() {
        println!("  {} {}", record.matrix_id.cyan(), record.web_link);
    }

    if args.async_run() {
        println!("{}", t!("run.async_mode").yellow());
        return Ok(0);
    }

    setup_signal_handler(&matrices, &args);
    run_pipeline(&mut matrices, &args, &service, &GsutilStore, &results_root).await
}
