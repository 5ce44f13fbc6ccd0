//! # Status Refresh & Cancel Engines / 状态刷新与取消引擎
//!
//! The two concurrent fan-out passes over a run's matrix map: bringing every
//! in-progress record up to date with the remote service, and requesting
//! best-effort cancellation.
//!
//! 对运行的矩阵映射进行的两个并发扇出阶段：
//! 将每个进行中的记录与远程服务同步，以及请求尽力而为的取消。

use anyhow::Result;
use colored::*;
use futures::future::{join_all, try_join_all};

use crate::core::args::RunArgs;
use crate::core::models::MatrixMap;
use crate::infra::remote::TestService;
use crate::infra::{fs, t};

/// Brings every in-progress record up to date with the remote service.
///
/// One refresh request is issued per in-progress record, all concurrently and
/// with no bound on fan-out; the remote service is idempotent and safe to
/// query concurrently per distinct id. The pass is fail-fast: a failed request
/// aborts the join before any merge, so the persisted map never reflects a
/// partial pass. After the join, each fetched record is merged into the stored
/// record; the whole map is persisted once at the end iff any merge changed a
/// record.
///
/// 将每个进行中的记录与远程服务同步。
///
/// 为每个进行中的记录并发发出一个刷新请求，扇出数量不设上限；
/// 远程服务是幂等的，对不同 id 的并发查询是安全的。此阶段采用快速失败策略：
/// 任一请求失败会在合并之前中止汇合，因此持久化的映射永远不会反映部分完成的阶段。
/// 汇合之后，每个获取到的记录被合并到存储的记录中；
/// 仅当有合并改变了记录时，才在最后整体持久化一次映射。
pub async fn refresh_matrices<S: TestService>(
    matrices: &mut MatrixMap,
    args: &RunArgs,
    service: &S,
) -> Result<()> {
    let in_progress = matrices.in_progress_ids();
    if in_progress.is_empty() {
        println!("{}", t!("refresh.nothing_to_refresh").dimmed());
        return Ok(());
    }

    println!(
        "{}",
        t!("refresh.refreshing", count = in_progress.len()).bold()
    );

    let fetched = try_join_all(in_progress.iter().map(|id| async move {
        let remote = service.refresh(id, args).await?;
        anyhow::Ok((id.clone(), remote))
    }))
    .await?;

    // Merge after the join: each record is only touched by its own result, so
    // the final map is independent of task completion order.
    // 在汇合之后进行合并：每个记录只被它自己的结果触及，
    // 因此最终映射与任务完成顺序无关。
    let mut dirty = false;
    for (id, remote) in fetched {
        if let Some(record) = matrices.map.get_mut(&id) {
            let changed = record.merge(&remote);
            dirty |= changed;
            if changed {
                println!(
                    "  {} {}",
                    record.matrix_id.cyan(),
                    record.state.to_string().yellow()
                );
            }
        }
    }

    if dirty {
        fs::persist_matrix_map(matrices)?;
    }
    Ok(())
}

/// Requests cancellation of every in-progress record, concurrently.
///
/// Cancellation is fire-and-forget: nothing is merged back into the map, and
/// its effect is observed on the next refresh. Unlike the refresh pass this
/// one is fail-soft by contract; an individual failure is printed and skipped
/// while the remaining requests proceed. Returns how many cancellations were
/// requested.
///
/// 并发请求取消每个进行中的记录。
///
/// 取消是即发即弃的：不会有任何内容合并回映射，其效果在下一次刷新时观察到。
/// 与刷新阶段不同，此阶段按契约采取失败宽容策略；
/// 单个失败会被打印并跳过，其余请求继续进行。返回请求了多少次取消。
pub async fn cancel_matrices<S: TestService>(
    matrices: &MatrixMap,
    args: &RunArgs,
    service: &S,
) -> Result<usize> {
    let in_progress = matrices.in_progress_ids();
    if in_progress.is_empty() {
        println!("{}", t!("cancel.nothing_to_cancel").dimmed());
        return Ok(0);
    }

    println!(
        "{}",
        t!("cancel.cancelling", count = in_progress.len()).bold()
    );

    let outcomes = join_all(in_progress.iter().map(|id| async move {
        (id.clone(), service.cancel(id, args).await)
    }))
    .await;

    for (id, outcome) in outcomes {
        if let Err(e) = outcome {
            eprintln!("{}", t!("cancel.request_failed", id = id, error = e).red());
        }
    }

    Ok(in_progress.len())
}
