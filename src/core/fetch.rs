//! # Artifact Fetcher Module / 产物获取模块
//!
//! Downloads result artifacts for matrices that finished successfully and have
//! not been downloaded yet, mirroring their storage paths under the results
//! root.
//!
//! 为已成功完成且尚未下载的矩阵下载结果产物，
//! 并在结果根目录下按其存储路径进行镜像。

use anyhow::{Context, Result};
use colored::*;
use futures::future::try_join_all;
use std::fs as std_fs;
use std::path::{Path, PathBuf};

use crate::core::args::RunArgs;
use crate::core::models::MatrixMap;
use crate::infra::remote::ObjectStore;
use crate::infra::{fs, t};

/// Work order for one eligible record, captured before the fan-out so the
/// concurrent tasks never touch the map itself.
/// 在扇出之前为每个符合条件的记录捕获的工作项，
/// 使并发任务完全不触及映射本身。
struct DownloadTask {
    matrix_id: String,
    bucket: String,
    prefix: String,
}

/// Downloads result artifacts for every record that is `FINISHED` and not yet
/// downloaded.
///
/// Records are processed concurrently, one task per eligible record; within a
/// record, objects under its storage prefix are listed, filtered by the
/// caller-supplied pattern set (substring match on the object name), and
/// downloaded one by one, skipping files already present locally. The pass is
/// fail-fast like the refresh pass. After a record's pass completes — even
/// with zero matches — it is marked downloaded, and the map is persisted once
/// at the end if anything changed. Re-running the pass is safe: downloaded
/// records are skipped entirely.
///
/// 为每个处于 `FINISHED` 状态且尚未下载的记录下载结果产物。
///
/// 记录并发处理，每个符合条件的记录一个任务；在单个记录内，
/// 列出其存储前缀下的对象，用调用方提供的模式集过滤（对象名子串匹配），
/// 并逐个下载，跳过本地已存在的文件。此阶段与刷新阶段一样采用快速失败策略。
/// 记录的下载阶段完成后（即使没有任何匹配）即被标记为已下载，
/// 若有任何变化则在最后整体持久化一次映射。重复运行是安全的：
/// 已下载的记录会被完全跳过。
pub async fn fetch_artifacts<O: ObjectStore>(
    matrices: &mut MatrixMap,
    args: &RunArgs,
    store: &O,
    results_root: &Path,
) -> Result<()> {
    let tasks: Vec<DownloadTask> = matrices
        .map
        .values()
        .filter(|r| r.needs_download())
        .map(|r| DownloadTask {
            matrix_id: r.matrix_id.clone(),
            bucket: r.gcs_bucket.clone(),
            prefix: r.gcs_path.clone(),
        })
        .collect();

    if tasks.is_empty() {
        println!("{}", t!("fetch.nothing_to_download").dimmed());
        return Ok(());
    }

    println!("{}", t!("fetch.downloading", count = tasks.len()).bold());

    let patterns = args.artifact_patterns();
    let completed: Vec<String> = try_join_all(tasks.iter().map(|task| async move {
        fetch_for_record(task, patterns, store, results_root).await?;
        anyhow::Ok(task.matrix_id.clone())
    }))
    .await?;

    let mut dirty = false;
    for matrix_id in completed {
        if let Some(record) = matrices.map.get_mut(&matrix_id) {
            dirty |= record.mark_downloaded();
        }
    }

    if dirty {
        fs::persist_matrix_map(matrices)?;
    }
    Ok(())
}

async fn fetch_for_record<O: ObjectStore>(
    task: &DownloadTask,
    patterns: &[String],
    store: &O,
    results_root: &Path,
) -> Result<()> {
    let objects = store.list(&task.bucket, &task.prefix).await?;

    for object in objects
        .iter()
        .filter(|o| patterns.iter().any(|p| o.name.contains(p)))
    {
        let dest = fs::local_artifact_path(results_root, &object.name);
        if dest.exists() {
            continue;
        }
        create_parent_dirs(&dest)?;
        store.download(object, &dest).await?;
        println!("  {}", t!("fetch.downloaded", path = dest.display()).green());
    }
    Ok(())
}

fn create_parent_dirs(dest: &PathBuf) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std_fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create artifact directory: {}", parent.display())
        })?;
    }
    Ok(())
}
