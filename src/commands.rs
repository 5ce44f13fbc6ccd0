//! # Commands Module / 命令模块
//!
//! The top-level operations behind the CLI subcommands: starting a new run,
//! refreshing the last run, and cancelling the last run. Each one drives the
//! strict pass ordering refresh → poll → fetch → report over the shared
//! pipeline below.
//!
//! CLI 子命令背后的顶层操作：启动新运行、刷新上次运行以及取消上次运行。
//! 每个操作都通过下面的共享管线按刷新 → 轮询 → 获取 → 报告的严格顺序推进。

use anyhow::Result;
use colored::*;
use std::path::Path;

use crate::core::args::RunArgs;
use crate::core::models::MatrixMap;
use crate::core::poller::POLL_INTERVAL;
use crate::core::{fetch, poller};
use crate::infra::gcloud::{GcloudService, GsutilStore};
use crate::infra::remote::TestService;
use crate::infra::t;
use crate::reporting;

pub mod cancel;
pub mod refresh_run;
pub mod run;

/// Polls every in-progress matrix to completion, fetches the artifacts of the
/// newly finished ones, and generates the report. Returns the report's exit
/// code. Artifacts are never fetched before polling confirms terminal state,
/// and the report is never generated before artifacts are fetched.
///
/// 轮询每个进行中的矩阵直至完成，获取新完成矩阵的产物，然后生成报告。
/// 返回报告的退出码。在轮询确认终态之前绝不获取产物，
/// 在产物获取之前绝不生成报告。
async fn run_pipeline(
    matrices: &mut MatrixMap,
    args: &RunArgs,
    service: &GcloudService,
    store: &GsutilStore,
    results_root: &Path,
) -> Result<i32> {
    poller::poll_all(matrices, args, service, POLL_INTERVAL).await?;
    fetch::fetch_artifacts(matrices, args, store, results_root).await?;
    reporting::generate(matrices)
}

/// Installs a Ctrl-C handler that requests best-effort cancellation of the
/// run's in-progress matrices before terminating the process. The ids are
/// snapshotted up front; cancellation's effect on the remote side is observed
/// by the next refresh of the run.
///
/// 安装一个 Ctrl-C 处理器，在终止进程之前请求尽力取消该运行中进行中的矩阵。
/// 矩阵 id 预先快照；取消在远端的效果将由该运行的下一次刷新观察到。
fn setup_signal_handler(matrices: &MatrixMap, args: &RunArgs) {
    let in_progress = matrices.in_progress_ids();
    let args = args.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        println!("\n{}", t!("run.interrupted").yellow());
        let service = GcloudService;
        for matrix_id in &in_progress {
            if let Err(e) = service.cancel(matrix_id, &args).await {
                eprintln!("{}", t!("cancel.request_failed", id = matrix_id, error = e).red());
            }
        }
        std::process::exit(130);
    });
}
