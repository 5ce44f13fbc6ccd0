//! # Models Module Unit Tests / Models 模块单元测试
//!
//! This module contains unit tests for the matrix lifecycle state machine and
//! the record-merge behavior the refresh and fetch passes rely on.
//!
//! 此模块包含矩阵生命周期状态机以及刷新和获取阶段所依赖的记录合并行为的单元测试。

use matrix_orchestrator::core::models::{MatrixMap, MatrixRecord, MatrixState};
use matrix_orchestrator::infra::remote::RemoteMatrix;
use std::path::PathBuf;

fn remote(id: &str, state: MatrixState) -> RemoteMatrix {
    RemoteMatrix {
        matrix_id: id.to_string(),
        state,
        web_link: format!("https://console.example.com/{}", id),
        gcs_bucket: "results-bucket".to_string(),
        gcs_path: format!("2026-08-30/{}", id),
    }
}

fn record(id: &str, state: MatrixState) -> MatrixRecord {
    MatrixRecord::from_remote(&remote(id, state))
}

#[cfg(test)]
mod state_machine_tests {
    use super::*;

    #[test]
    fn test_in_progress_set() {
        assert!(MatrixState::Validating.is_in_progress());
        assert!(MatrixState::Pending.is_in_progress());
        assert!(MatrixState::Running.is_in_progress());
    }

    #[test]
    fn test_terminal_set_is_complement() {
        for state in [
            MatrixState::Finished,
            MatrixState::Error,
            MatrixState::Unsupported,
            MatrixState::Invalid,
            MatrixState::Cancelled,
        ] {
            assert!(state.is_terminal(), "{} should be terminal", state);
            assert!(!state.is_in_progress());
        }
    }

    #[test]
    fn test_state_serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&MatrixState::Finished).unwrap();
        assert_eq!(json, "\"FINISHED\"");

        let state: MatrixState = serde_json::from_str("\"VALIDATING\"").unwrap();
        assert_eq!(state, MatrixState::Validating);
    }
}

#[cfg(test)]
mod merge_tests {
    use super::*;

    #[test]
    fn test_merge_identical_record_reports_no_change() {
        let mut stored = record("matrix-1", MatrixState::Running);
        let changed = stored.merge(&remote("matrix-1", MatrixState::Running));
        assert!(!changed);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut stored = record("matrix-1", MatrixState::Running);
        let fetched = remote("matrix-1", MatrixState::Finished);

        assert!(stored.merge(&fetched));
        assert!(!stored.merge(&fetched));
        assert!(!stored.merge(&fetched));
        assert_eq!(stored.state, MatrixState::Finished);
    }

    #[test]
    fn test_merge_replaces_mutable_fields_in_place() {
        let mut stored = record("matrix-1", MatrixState::Pending);
        let mut fetched = remote("matrix-1", MatrixState::Running);
        fetched.gcs_path = "2026-08-30/matrix-1/retry".to_string();

        assert!(stored.merge(&fetched));
        assert_eq!(stored.matrix_id, "matrix-1");
        assert_eq!(stored.state, MatrixState::Running);
        assert_eq!(stored.gcs_path, "2026-08-30/matrix-1/retry");
    }

    #[test]
    fn test_merge_state_only_reports_actual_change() {
        let mut stored = record("matrix-1", MatrixState::Running);
        assert!(stored.merge_state(MatrixState::Finished));
        assert!(!stored.merge_state(MatrixState::Finished));
    }
}

#[cfg(test)]
mod downloaded_flag_tests {
    use super::*;

    #[test]
    fn test_downloaded_never_set_while_not_finished() {
        for state in [
            MatrixState::Running,
            MatrixState::Error,
            MatrixState::Cancelled,
        ] {
            let mut rec = record("matrix-1", state);
            assert!(!rec.mark_downloaded());
            assert!(!rec.downloaded);
        }
    }

    #[test]
    fn test_downloaded_transitions_at_most_once() {
        let mut rec = record("matrix-1", MatrixState::Finished);
        assert!(rec.needs_download());

        // The first marking is a change, every later one is a no-op.
        assert!(rec.mark_downloaded());
        assert!(rec.downloaded);
        assert!(!rec.mark_downloaded());
        assert!(rec.downloaded);
        assert!(!rec.needs_download());
    }
}

#[cfg(test)]
mod matrix_map_tests {
    use super::*;

    fn map_with(records: Vec<MatrixRecord>) -> MatrixMap {
        let mut matrices = MatrixMap::new(PathBuf::from("results/2026-08-30_00-00-00.000"));
        for r in records {
            matrices.map.insert(r.matrix_id.clone(), r);
        }
        matrices
    }

    #[test]
    fn test_in_progress_ids_excludes_terminal_records() {
        let matrices = map_with(vec![
            record("matrix-1", MatrixState::Running),
            record("matrix-2", MatrixState::Finished),
            record("matrix-3", MatrixState::Pending),
        ]);

        let ids = matrices.in_progress_ids();
        assert_eq!(ids, vec!["matrix-1".to_string(), "matrix-3".to_string()]);
    }

    #[test]
    fn test_all_finished() {
        let mut matrices = map_with(vec![
            record("matrix-1", MatrixState::Finished),
            record("matrix-2", MatrixState::Running),
        ]);
        assert!(!matrices.all_finished());

        matrices
            .map
            .get_mut("matrix-2")
            .unwrap()
            .merge_state(MatrixState::Finished);
        assert!(matrices.all_finished());
    }

    #[test]
    fn test_persisted_form_round_trips() {
        let matrices = map_with(vec![record("matrix-1", MatrixState::Finished)]);
        let json = serde_json::to_string(&matrices.map).unwrap();
        let parsed: std::collections::BTreeMap<String, MatrixRecord> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, matrices.map);
    }

    #[test]
    fn test_loads_minimal_persisted_record() {
        // Older state files may predate the optional fields; they default.
        let json = r#"{
            "matrix-9": {
                "matrix_id": "matrix-9",
                "state": "RUNNING"
            }
        }"#;
        let parsed: std::collections::BTreeMap<String, MatrixRecord> =
            serde_json::from_str(json).unwrap();
        let rec = &parsed["matrix-9"];
        assert_eq!(rec.state, MatrixState::Running);
        assert!(!rec.downloaded);
        assert!(rec.gcs_bucket.is_empty());
    }
}
