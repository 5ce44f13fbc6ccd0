//! # Reporting Module / 报告模块
//!
//! End-of-run report generation: a colored console summary plus an HTML
//! summary written into the run directory. The exit code of a synchronous run
//! is whatever this module returns.
//!
//! 运行结束时的报告生成：彩色控制台摘要以及写入运行目录的 HTML 摘要。
//! 同步运行的退出码即为此模块的返回值。

use anyhow::Result;

use crate::core::models::MatrixMap;
use crate::infra::t;

pub mod console;
pub mod html;

// Re-export common reporting functions
pub use console::print_summary;
pub use html::generate_html_report;

/// File name of the HTML summary inside a run directory.
pub const HTML_REPORT_FILE: &str = "matrix_report.html";

/// Generates the end-of-run report and maps the run outcome to an exit code:
/// `0` when every matrix reached `FINISHED`, `1` otherwise.
///
/// 生成运行结束报告，并将运行结果映射为退出码：
/// 所有矩阵均到达 `FINISHED` 时为 `0`，否则为 `1`。
pub fn generate(matrices: &MatrixMap) -> Result<i32> {
    print_summary(matrices);

    let report_path = matrices.run_path.join(HTML_REPORT_FILE);
    generate_html_report(matrices, &report_path)?;
    println!("{}", t!("report.html_written", path = report_path.display()));

    Ok(if matrices.all_finished() { 0 } else { 1 })
}
