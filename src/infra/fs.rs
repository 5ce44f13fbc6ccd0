//! # File System Operations Module / 文件系统操作模块
//!
//! Local persistence for run state: the results root, timestamped run
//! directories, and the atomic rewrite of `matrix_ids.json`.
//!
//! 运行状态的本地持久化：结果根目录、带时间戳的运行目录，
//! 以及 `matrix_ids.json` 的原子重写。

use anyhow::{Context, Result, bail};
use chrono::Local;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::models::{MatrixMap, MatrixRecord};

/// File name of the persisted matrix map inside a run directory.
pub const MATRIX_IDS_FILE: &str = "matrix_ids.json";

/// Environment variable overriding the results root, used by tests and CI.
pub const RESULTS_ROOT_ENV: &str = "MATRIX_RESULTS_ROOT";

/// Distinct failure for a run state that cannot be located.
/// Callers resolving a previous run treat this as fatal; it indicates a
/// precondition the orchestrator cannot repair.
///
/// 针对无法定位的运行状态的独立失败类型。
/// 解析先前运行的调用者将其视为致命错误；它表示编排器无法修复的前置条件。
#[derive(Debug)]
pub struct NotFoundError(pub String);

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Not found: {}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

/// The directory all run directories live under. An explicit override wins,
/// then the environment variable, then `./results`.
///
/// 所有运行目录所在的目录。显式覆盖优先，其次是环境变量，最后是 `./results`。
pub fn results_root(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    match env::var(RESULTS_ROOT_ENV) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from("results"),
    }
}

/// Allocates a fresh timestamped run directory path under the results root.
/// The directory itself is created lazily by the first persist.
pub fn unique_run_path(results_root: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S%.3f").to_string();
    results_root.join(stamp)
}

/// Serializes the whole matrix map into `matrix_ids.json` inside its run
/// directory, creating parent directories as needed, and returns the written
/// location. The rewrite is atomic (write to a sibling temp file, then rename)
/// and idempotent, so it is safe to call after every state-changing pass.
///
/// 将整个矩阵映射序列化到其运行目录中的 `matrix_ids.json`，
/// 按需创建父目录，并返回写入位置。重写是原子的
/// （先写入同目录临时文件再重命名）且幂等，因此可以在每次改变状态的阶段后安全调用。
pub fn persist_matrix_map(matrices: &MatrixMap) -> Result<PathBuf> {
    fs::create_dir_all(&matrices.run_path).with_context(|| {
        format!(
            "Failed to create run directory: {}",
            matrices.run_path.display()
        )
    })?;

    let path = matrices.run_path.join(MATRIX_IDS_FILE);
    let content = serde_json::to_string_pretty(&matrices.map)
        .context("Failed to serialize matrix map")?;

    let tmp = tempfile::NamedTempFile::new_in(&matrices.run_path)
        .context("Failed to create temporary state file")?;
    fs::write(tmp.path(), content).context("Failed to write temporary state file")?;
    tmp.persist(&path)
        .with_context(|| format!("Failed to replace state file: {}", path.display()))?;

    Ok(path)
}

/// Deserializes a persisted matrix map. `path` may point at a run directory or
/// directly at a `matrix_ids.json` file, and is resolved first as given, then
/// as a subpath under the results root. Fails with [`NotFoundError`] if
/// neither resolves.
///
/// 反序列化已持久化的矩阵映射。`path` 可以指向运行目录，也可以直接指向
/// `matrix_ids.json` 文件；先按原样解析，再作为结果根目录下的子路径解析。
/// 如果两者都无法解析，则以 [`NotFoundError`] 失败。
pub fn load_matrix_map(path: &Path, results_root: &Path) -> Result<MatrixMap> {
    let Some(run_path) = resolve_run_path(path, results_root) else {
        bail!(NotFoundError(format!(
            "no matrix state at {}",
            path.display()
        )));
    };

    let file = if run_path.is_dir() {
        run_path.join(MATRIX_IDS_FILE)
    } else {
        run_path.clone()
    };
    if !file.is_file() {
        bail!(NotFoundError(format!(
            "no {} in {}",
            MATRIX_IDS_FILE,
            run_path.display()
        )));
    }

    let content = fs::read_to_string(&file)
        .with_context(|| format!("Failed to read state file: {}", file.display()))?;
    let map: BTreeMap<String, MatrixRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse state file: {}", file.display()))?;

    let run_dir = if run_path.is_dir() {
        run_path
    } else {
        // A direct file path; its parent is the run directory.
        file.parent().map(Path::to_path_buf).unwrap_or(run_path)
    };

    Ok(MatrixMap {
        run_path: run_dir,
        map,
    })
}

fn resolve_run_path(path: &Path, results_root: &Path) -> Option<PathBuf> {
    if path.exists() {
        return Some(path.to_path_buf());
    }
    let under_root = results_root.join(path);
    if under_root.exists() {
        return Some(under_root);
    }
    None
}

/// Locates the most recently modified run directory under the results root.
/// Modification-time ties are broken by filesystem ordering, which carries no
/// meaning. Fails with [`NotFoundError`] when no run directory exists.
///
/// 定位结果根目录下最近修改的运行目录。修改时间相同时按文件系统顺序决定，
/// 这不具有语义。当不存在任何运行目录时以 [`NotFoundError`] 失败。
pub fn last_run_path(results_root: &Path) -> Result<PathBuf> {
    let entries = match fs::read_dir(results_root) {
        Ok(entries) => entries,
        Err(_) => bail!(NotFoundError(format!(
            "no results directory at {}",
            results_root.display()
        ))),
    };

    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::UNIX_EPOCH);
        match &newest {
            Some((best, _)) if *best >= modified => {}
            _ => newest = Some((modified, path)),
        }
    }

    match newest {
        Some((_, path)) => Ok(path),
        None => bail!(NotFoundError(format!(
            "no previous run under {}",
            results_root.display()
        ))),
    }
}

/// The local path a remote object is mirrored to, preserving its storage path
/// under the results root.
pub fn local_artifact_path(results_root: &Path, object_name: &str) -> PathBuf {
    results_root.join(object_name)
}
