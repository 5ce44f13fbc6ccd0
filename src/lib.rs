//! # Matrix Orchestrator Library / Matrix Orchestrator 库
//!
//! This library provides the core functionality for the Matrix Orchestrator
//! tool, which tracks remotely-executed test matrices from submission through
//! completion: refreshing their status concurrently, polling detailed
//! progress, cancelling in-progress work, and downloading result artifacts.
//!
//! 此库为 Matrix Orchestrator 工具提供核心功能，
//! 它跟踪远程执行的测试矩阵从提交到完成的全过程：
//! 并发刷新状态、轮询详细进度、取消进行中的任务以及下载结果产物。
//!
//! ## Modules / 模块
//!
//! - `core` - Matrix lifecycle model, refresh/cancel/fetch passes, and polling
//! - `infra` - Infrastructure services like process execution, persistence, and the service backends
//! - `reporting` - Run summary reporting
//! - `cli` - Command-line interface
//! - `commands` - Top-level operations behind the CLI subcommands
//!
//! - `core` - 矩阵生命周期模型、刷新/取消/获取阶段以及轮询
//! - `infra` - 基础设施服务，如进程执行、持久化和服务后端
//! - `reporting` - 运行摘要报告
//! - `cli` - 命令行接口
//! - `commands` - CLI 子命令背后的顶层操作

pub mod cli;
pub mod commands;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use crate::core::args;
pub use crate::core::models;
pub use crate::core::poller;
pub use rust_i18n::t;

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
