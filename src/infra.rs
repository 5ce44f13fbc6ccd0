//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for the matrix orchestrator,
//! including process execution, file system persistence, the remote
//! collaborator contracts, and i18n support.
//!
//! 此模块为矩阵编排器提供基础设施服务，
//! 包括进程执行、文件系统持久化、远程协作者契约和国际化支持。

pub mod command;
pub mod fs;
pub mod gcloud;
pub mod remote;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
