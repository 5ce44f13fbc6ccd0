//! # Run-State Store Unit Tests / 运行状态存储单元测试
//!
//! Persistence round trips, path resolution, the distinct not-found failure,
//! and run resolution across multiple run directories.
//!
//! 持久化往返、路径解析、独立的未找到失败类型，以及跨多个运行目录的运行解析。

use matrix_orchestrator::core::args::{AndroidArgs, RunArgs};
use matrix_orchestrator::core::models::{MatrixMap, MatrixRecord, MatrixState};
use matrix_orchestrator::core::resolver;
use matrix_orchestrator::infra::fs::{
    self, MATRIX_IDS_FILE, NotFoundError, load_matrix_map, persist_matrix_map,
};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn record(id: &str, state: MatrixState) -> MatrixRecord {
    MatrixRecord {
        matrix_id: id.to_string(),
        state,
        web_link: String::new(),
        gcs_bucket: "bucket".to_string(),
        gcs_path: format!("run/{}", id),
        downloaded: false,
    }
}

fn sample_map(run_path: &Path) -> MatrixMap {
    let mut matrices = MatrixMap::new(run_path.to_path_buf());
    matrices
        .map
        .insert("matrix-1".to_string(), record("matrix-1", MatrixState::Running));
    matrices
        .map
        .insert("matrix-2".to_string(), record("matrix-2", MatrixState::Finished));
    matrices
}

fn android_args() -> RunArgs {
    RunArgs::Android(AndroidArgs {
        project: "demo-project".to_string(),
        app: "app.apk".to_string(),
        test: "app-test.apk".to_string(),
        device: vec![],
        async_run: false,
        flaky_test_attempts: 0,
        artifact_patterns: vec![".xml".to_string()],
    })
}

#[cfg(test)]
mod persist_tests {
    use super::*;

    #[test]
    fn test_persist_then_load_round_trips() {
        let root = TempDir::new().unwrap();
        let run_path = root.path().join("2026-08-30_10-00-00.000");
        let matrices = sample_map(&run_path);

        let written = persist_matrix_map(&matrices).unwrap();
        assert_eq!(written, run_path.join(MATRIX_IDS_FILE));

        let loaded = load_matrix_map(&run_path, root.path()).unwrap();
        assert_eq!(loaded.map, matrices.map);
        assert_eq!(loaded.run_path, run_path);
    }

    #[test]
    fn test_persist_is_an_idempotent_overwrite() {
        let root = TempDir::new().unwrap();
        let run_path = root.path().join("run-a");
        let mut matrices = sample_map(&run_path);

        persist_matrix_map(&matrices).unwrap();
        matrices
            .map
            .get_mut("matrix-1")
            .unwrap()
            .merge_state(MatrixState::Finished);
        persist_matrix_map(&matrices).unwrap();

        // The rewrite replaces the file wholesale, not append.
        let loaded = load_matrix_map(&run_path, root.path()).unwrap();
        assert_eq!(loaded.map.len(), 2);
        assert_eq!(loaded.map["matrix-1"].state, MatrixState::Finished);
    }

    #[test]
    fn test_load_resolves_direct_file_path() {
        let root = TempDir::new().unwrap();
        let run_path = root.path().join("run-a");
        persist_matrix_map(&sample_map(&run_path)).unwrap();

        let loaded = load_matrix_map(&run_path.join(MATRIX_IDS_FILE), root.path()).unwrap();
        assert_eq!(loaded.map.len(), 2);
        assert_eq!(loaded.run_path, run_path);
    }

    #[test]
    fn test_load_resolves_subpath_under_results_root() {
        let root = TempDir::new().unwrap();
        let run_path = root.path().join("run-a");
        persist_matrix_map(&sample_map(&run_path)).unwrap();

        let loaded = load_matrix_map(Path::new("run-a"), root.path()).unwrap();
        assert_eq!(loaded.map.len(), 2);
    }

    #[test]
    fn test_load_missing_path_is_a_not_found_failure() {
        let root = TempDir::new().unwrap();
        let err = load_matrix_map(Path::new("no-such-run"), root.path()).unwrap_err();
        assert!(err.downcast_ref::<NotFoundError>().is_some());
    }
}

#[cfg(test)]
mod resolver_tests {
    use super::*;

    #[test]
    fn test_last_run_path_picks_most_recently_modified() {
        let root = TempDir::new().unwrap();
        let older = root.path().join("run-older");
        let newer = root.path().join("run-newer");

        persist_matrix_map(&sample_map(&older)).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        persist_matrix_map(&sample_map(&newer)).unwrap();

        assert_eq!(fs::last_run_path(root.path()).unwrap(), newer);
    }

    #[test]
    fn test_last_run_path_fails_without_any_run() {
        let root = TempDir::new().unwrap();
        let err = fs::last_run_path(root.path()).unwrap_err();
        assert!(err.downcast_ref::<NotFoundError>().is_some());
    }

    #[test]
    fn test_last_args_detects_platform_config_file() {
        let root = TempDir::new().unwrap();
        let run_path = root.path().join("run-a");
        persist_matrix_map(&sample_map(&run_path)).unwrap();
        android_args().save(&run_path).unwrap();

        let args = resolver::last_args(root.path()).unwrap();
        assert!(matches!(args, RunArgs::Android(_)));
        assert_eq!(args.project(), "demo-project");
    }

    #[test]
    fn test_run_dir_without_recognized_config_is_fatal() {
        let root = TempDir::new().unwrap();
        let run_path = root.path().join("run-a");
        persist_matrix_map(&sample_map(&run_path)).unwrap();

        let err = resolver::args_from_run_dir(&run_path).unwrap_err();
        assert!(err.downcast_ref::<NotFoundError>().is_some());
    }

    #[test]
    fn test_last_matrices_reads_newest_run() {
        let root = TempDir::new().unwrap();
        let older = root.path().join("run-older");
        persist_matrix_map(&sample_map(&older)).unwrap();

        std::thread::sleep(Duration::from_millis(50));
        let newer = root.path().join("run-newer");
        let mut newer_map = MatrixMap::new(newer.clone());
        newer_map
            .map
            .insert("matrix-9".to_string(), record("matrix-9", MatrixState::Pending));
        persist_matrix_map(&newer_map).unwrap();

        let loaded = resolver::last_matrices(root.path()).unwrap();
        assert_eq!(loaded.run_path, newer);
        assert!(loaded.map.contains_key("matrix-9"));
    }

    #[test]
    fn test_matrix_path_to_obj_matches_direct_load() {
        let root = TempDir::new().unwrap();
        let run_path = root.path().join("run-a");
        persist_matrix_map(&sample_map(&run_path)).unwrap();

        let loaded = resolver::matrix_path_to_obj(&run_path, root.path()).unwrap();
        assert_eq!(loaded.map.len(), 2);
    }
}

#[cfg(test)]
mod args_tests {
    use super::*;

    #[test]
    fn test_args_round_trip_through_config_file() {
        let root = TempDir::new().unwrap();
        let run_path = root.path().join("run-a");
        android_args().save(&run_path).unwrap();

        let path = run_path.join("android_args.json");
        let loaded = RunArgs::from_file(&path).unwrap();
        assert!(matches!(loaded, RunArgs::Android(_)));
        assert_eq!(loaded.artifact_patterns(), &[".xml".to_string()]);
        assert!(!loaded.async_run());
    }

    #[test]
    fn test_platform_tag_is_required() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("bad.json");
        std::fs::write(&path, r#"{"project": "p", "app": "a", "test": "t"}"#).unwrap();
        assert!(RunArgs::from_file(&path).is_err());
    }
}
