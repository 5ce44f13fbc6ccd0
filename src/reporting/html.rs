//! # HTML Reporting Module / HTML 报告模块
//!
//! Writes a self-contained HTML summary of the run into its run directory.
//! 将运行的自包含 HTML 摘要写入其运行目录。

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::core::models::{MatrixMap, MatrixState};
use crate::infra::t;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = include_str!("assets/report.css");

/// Generates an HTML summary of the run's matrix outcomes.
/// Creates a styled, self-contained HTML file with overall statistics and a
/// per-matrix table linking back to the remote service.
///
/// 生成该运行矩阵结果的 HTML 摘要。
/// 创建一个带样式的自包含 HTML 文件，包含总体统计信息和
/// 链接回远程服务的逐矩阵表格。
pub fn generate_html_report(matrices: &MatrixMap, output_path: &Path) -> Result<()> {
    let mut html = String::new();
    html.push_str(&format!(
        "<!DOCTYPE html><html><head><title>{}</title>",
        t!("html_report.title")
    ));
    html.push_str("<style>");
    html.push_str(HTML_STYLE);
    html.push_str("</style>");
    html.push_str("</head><body>");
    html.push_str(&format!("<h1>{}</h1>", t!("html_report.main_header")));

    let total = matrices.map.len();
    let finished = matrices
        .map
        .values()
        .filter(|r| r.state == MatrixState::Finished)
        .count();
    let failed = matrices
        .map
        .values()
        .filter(|r| r.state.is_terminal() && r.state != MatrixState::Finished)
        .count();

    html.push_str("<div class='summary-container'>");
    html.push_str(&format!(
        "<div class='summary-item'><span class='count'>{}</span><span class='label'>{}</span></div>",
        total,
        t!("html_report.summary.total")
    ));
    html.push_str(&format!(
        "<div class='summary-item'><span class='count finished-text'>{}</span><span class='label'>{}</span></div>",
        finished,
        t!("html_report.summary.finished")
    ));
    html.push_str(&format!(
        "<div class='summary-item'><span class='count failed-text'>{}</span><span class='label'>{}</span></div>",
        failed,
        t!("html_report.summary.failed")
    ));
    html.push_str("</div>");

    html.push_str("<table><thead><tr>");
    html.push_str(&format!("<th>{}</th>", t!("html_report.table.header.matrix")));
    html.push_str(&format!(
        "<th class='state-col'>{}</th>",
        t!("html_report.table.header.state")
    ));
    html.push_str(&format!(
        "<th>{}</th>",
        t!("html_report.table.header.downloaded")
    ));
    html.push_str(&format!("<th>{}</th>", t!("html_report.table.header.link")));
    html.push_str("</tr></thead><tbody>");

    for record in matrices.map.values() {
        let state_class = match record.state {
            MatrixState::Finished => "state-finished",
            MatrixState::Cancelled => "state-cancelled",
            s if s.is_in_progress() => "state-in-progress",
            _ => "state-failed",
        };
        let link = if record.web_link.is_empty() {
            String::new()
        } else {
            format!(
                "<a href='{}'>{}</a>",
                escape_html(&record.web_link),
                escape_html(&record.web_link)
            )
        };

        html.push_str("<tr>");
        html.push_str(&format!("<td>{}</td>", escape_html(&record.matrix_id)));
        html.push_str(&format!(
            "<td class='state-col'><div class='state-cell {}'>{}</div></td>",
            state_class, record.state
        ));
        html.push_str(&format!(
            "<td>{}</td>",
            if record.downloaded { "&#10003;" } else { "" }
        ));
        html.push_str(&format!("<td>{}</td>", link));
        html.push_str("</tr>");
    }

    html.push_str("</tbody></table>");
    html.push_str("</body></html>");

    fs::write(output_path, html)?;
    Ok(())
}

/// Simple HTML escape function to replace special characters with their HTML entities
/// 简单的 HTML 转义函数，用 HTML 实体替换特殊字符
fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
