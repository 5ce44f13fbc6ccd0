//! # Core Module / 核心模块
//!
//! This module contains the core functionality of the matrix orchestrator:
//! the lifecycle state model, the concurrent refresh/cancel/fetch passes,
//! the detail polling state machine, and run resolution.
//!
//! 此模块包含矩阵编排器的核心功能：
//! 生命周期状态模型、并发的刷新/取消/获取阶段、详细轮询状态机以及运行解析。

pub mod args;
pub mod fetch;
pub mod models;
pub mod poller;
pub mod refresh;
pub mod resolver;

// Re-exports
pub use args::RunArgs;
pub use models::{MatrixMap, MatrixRecord, MatrixState};
pub use poller::PollState;
