//! # Console Reporting Module / 控制台报告模块
//!
//! Prints the colorful end-of-run summary of every matrix in the map.
//! 打印运行结束时映射中每个矩阵的彩色摘要。

use colored::*;

use crate::core::models::{MatrixMap, MatrixState};
use crate::infra::t;

/// Prints a formatted summary of matrix outcomes to the console.
/// Displays a table with matrix id, final state, download flag and web link,
/// using color coding to highlight the different outcomes.
///
/// 在控制台打印矩阵结果的格式化摘要。
/// 显示包含矩阵 id、最终状态、下载标志和网页链接的表格，
/// 使用颜色编码突出显示不同的结果。
///
/// # Output Format / 输出格式
/// ```text
/// --- Matrix Summary ---
///   - matrix-1001        | FINISHED    | downloaded | https://...
///   - matrix-1002        | ERROR       |            | https://...
/// ```
pub fn print_summary(matrices: &MatrixMap) {
    println!("\n{}", t!("report.summary_banner").bold());

    for record in matrices.map.values() {
        let state_str = record.state.to_string();
        let state_colored = match record.state {
            MatrixState::Finished => state_str.green(),
            MatrixState::Cancelled => state_str.yellow(),
            MatrixState::Validating | MatrixState::Pending | MatrixState::Running => {
                state_str.cyan()
            }
            _ => state_str.red(),
        };
        let downloaded_str = if record.downloaded {
            t!("report.downloaded_marker").to_string()
        } else {
            String::new()
        };

        println!(
            "  - {:<20} | {:<11} | {:<10} | {}",
            record.matrix_id, state_colored, downloaded_str, record.web_link
        );
    }

    if matrices.all_finished() {
        println!("\n{}", t!("report.all_finished").green().bold());
    } else {
        println!("\n{}", t!("report.not_all_finished").red().bold());
    }
}
