//! # Detail Poller Module / 详细轮询模块
//!
//! Drives one matrix at a time to a terminal state, narrating progress as it
//! goes. The per-iteration bookkeeping lives in [`PollState`], an explicit
//! state-machine object that can be exercised with a scripted sequence of
//! fetched records, independent of any network or clock.
//!
//! 每次驱动一个矩阵到达终态，并在此过程中叙述进度。
//! 每次迭代的记录保存在 [`PollState`] 中——一个显式的状态机对象，
//! 可以用一段预设的获取记录序列来单独测试，不依赖网络或时钟。

use anyhow::Result;
use colored::*;
use std::time::{Duration, Instant};

use crate::core::args::RunArgs;
use crate::core::models::{MatrixMap, MatrixState};
use crate::infra::remote::{MatrixDetail, TestService};
use crate::infra::{fs, t};

/// Fixed interval between detail fetches. The remote service is explicitly not
/// designed for high-frequency polling, so the interval is fixed rather than
/// adaptive.
///
/// 两次详情获取之间的固定间隔。远程服务明确不适合高频轮询，
/// 因此间隔是固定的而不是自适应的。
pub const POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Phrase the remote service puts in a progress message once test execution
/// finished. A significant, variable delay can still follow before the matrix
/// itself is finalized, so seeing it triggers an extra note.
///
/// 远程服务在测试执行结束后放入进度消息中的短语。
/// 在矩阵本身最终确定之前仍可能有显著且不定的延迟，因此看到它会触发一条额外提示。
const TEST_DONE_PHRASE: &str = "Done. Test time=";

/// State carried across poll iterations for one matrix.
/// 针对单个矩阵在轮询迭代之间保存的状态。
#[derive(Debug, Default)]
pub struct PollState {
    /// Last reported execution-level state (not the matrix-level state).
    /// 最后报告的执行级状态（不是矩阵级状态）。
    last_state: String,
    /// Last reported error content. The remote error field is sticky and never
    /// cleared by the service, so only a change in content is re-reported.
    /// 最后报告的错误内容。远程错误字段是粘性的且服务不会清除它，
    /// 因此只有内容发生变化时才会再次报告。
    last_error: String,
    /// Progress messages accumulated so far.
    /// 到目前为止累积的进度消息。
    progress: Vec<String>,
    /// How many of `progress` have already been emitted.
    /// `progress` 中已经输出了多少条。
    emitted: usize,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one freshly fetched matrix detail through the state machine.
    /// Returns the lines to emit for this iteration and whether the matrix
    /// reached a terminal state. When terminal, the loop must stop before any
    /// further progress is emitted; only a changed error is still reported.
    ///
    /// 将一次新获取的矩阵详情送入状态机。
    /// 返回本次迭代要输出的行以及矩阵是否到达终态。到达终态时，
    /// 循环必须在输出更多进度之前停止；只有发生变化的错误仍会被报告。
    pub fn observe(&mut self, detail: &MatrixDetail) -> (Vec<String>, bool) {
        let mut lines = Vec::new();

        // Fine-grained narration is only meaningful when the matrix has
        // exactly one constituent test execution.
        // 只有当矩阵恰好包含一个测试执行时，细粒度叙述才有意义。
        let execution = match detail.executions.as_slice() {
            [single] => single,
            _ => return (lines, detail.state.is_terminal()),
        };

        if let Some(error) = &execution.error {
            if !error.is_empty() && *error != self.last_error {
                lines.push(t!("poll.execution_error", error = error).to_string());
                self.last_error = error.clone();
            }
        }

        // Replace the accumulated list with the fresh one, falling back to the
        // previous list if the fetch returned none.
        // 用新列表替换累积列表；如果本次获取没有返回任何消息，则保留之前的列表。
        if !execution.progress.is_empty() {
            self.progress = execution.progress.clone();
        }

        if detail.state.is_terminal() {
            return (lines, true);
        }

        // Flaky-test-attempt retries restart the remote progress array at
        // length 1; treat every current message as new again.
        // 不稳定测试的重试会使远程进度数组从长度 1 重新开始；
        // 此时将当前所有消息重新视为新消息。
        if self.emitted > self.progress.len() {
            self.emitted = 0;
        }

        for message in &self.progress[self.emitted..] {
            lines.push(message.clone());
            if message.contains(TEST_DONE_PHRASE) {
                lines.push(t!("poll.waiting_post_processing").to_string());
            }
        }
        self.emitted = self.progress.len();

        if execution.state != self.last_state {
            if !execution.state.is_empty() {
                lines.push(execution.state.clone());
            }
            self.last_state = execution.state.clone();
        }

        (lines, false)
    }
}

/// Elapsed-time stamp prefixed to every narrated line, `mm:ss` from the start
/// of the poll loop.
fn elapsed_stamp(start: Instant) -> String {
    let secs = start.elapsed().as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Drives one matrix to a terminal state, synchronously, fetching its full
/// detail every `interval` and narrating deduplicated progress with an
/// elapsed-time stamp. The final matrix state is emitted once more after the
/// loop; it may differ materially in timing from the last "Done" progress
/// message. Returns the terminal state.
///
/// 同步地驱动单个矩阵到达终态，每隔 `interval` 获取一次完整详情，
/// 并带着耗时戳叙述去重后的进度。循环结束后再输出一次最终矩阵状态；
/// 它在时间上可能与最后一条 "Done" 进度消息有显著差异。返回终态。
pub async fn poll_matrix<S: TestService>(
    matrix_id: &str,
    args: &RunArgs,
    service: &S,
    interval: Duration,
) -> Result<MatrixState> {
    let start = Instant::now();
    let mut state = PollState::new();

    let final_state = loop {
        let detail = service.describe(matrix_id, args).await?;
        let (lines, terminal) = state.observe(&detail);
        for line in lines {
            println!("{} {}", elapsed_stamp(start).dimmed(), line);
        }
        if terminal {
            break detail.state;
        }
        tokio::time::sleep(interval).await;
    };

    println!(
        "{} {}",
        elapsed_stamp(start).dimmed(),
        t!(
            "poll.final_state",
            id = matrix_id,
            state = final_state.to_string()
        )
        .bold()
    );
    Ok(final_state)
}

/// Drives every in-progress matrix in the map to completion, sequentially.
/// Each poll already blocks for the duration of one job, and the jobs run on
/// the remote side independently of local polling order. Terminal states are
/// merged into the map as they are observed; the map is persisted once after
/// the full sweep.
///
/// 依次驱动映射中每个进行中的矩阵至完成。每次轮询本身就会阻塞一个任务的时长，
/// 而任务在远端的运行与本地轮询顺序无关。观察到的终态随即合并进映射；
/// 整个扫描完成后仅持久化一次映射。
pub async fn poll_all<S: TestService>(
    matrices: &mut MatrixMap,
    args: &RunArgs,
    service: &S,
    interval: Duration,
) -> Result<()> {
    let in_progress = matrices.in_progress_ids();
    if in_progress.is_empty() {
        println!("{}", t!("poll.nothing_to_poll").dimmed());
        return Ok(());
    }

    println!("{}", t!("poll.polling", count = in_progress.len()).bold());

    let mut dirty = false;
    for matrix_id in in_progress {
        let final_state = poll_matrix(&matrix_id, args, service, interval).await?;
        if let Some(record) = matrices.map.get_mut(&matrix_id) {
            dirty |= record.merge_state(final_state);
        }
    }

    if dirty {
        fs::persist_matrix_map(matrices)?;
    }
    Ok(())
}
