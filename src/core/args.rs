//! # Run Arguments Module / 运行参数模块
//!
//! Platform-specific run arguments, loaded from a JSON config file at submission
//! time and persisted next to `matrix_ids.json` so a later invocation can
//! resume or cancel the run with the same settings.
//!
//! 平台特定的运行参数，在提交时从 JSON 配置文件加载，并与 `matrix_ids.json`
//! 一同持久化，以便后续调用可以使用相同的设置恢复或取消该运行。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name for persisted Android run arguments inside a run directory.
pub const ANDROID_ARGS_FILE: &str = "android_args.json";
/// File name for persisted iOS run arguments inside a run directory.
pub const IOS_ARGS_FILE: &str = "ios_args.json";

/// A single device configuration inside an Android matrix.
/// 安卓矩阵中的单个设备配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device model identifier as known to the remote service.
    /// 远程服务已知的设备型号标识符。
    pub model: String,
    /// OS version to run on.
    /// 要运行的操作系统版本。
    pub version: String,
    /// Device locale, e.g. "en" or "zh_CN".
    /// 设备语言区域，例如 "en" 或 "zh_CN"。
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Screen orientation, "portrait" or "landscape".
    /// 屏幕方向，"portrait" 或 "landscape"。
    #[serde(default = "default_orientation")]
    pub orientation: String,
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_orientation() -> String {
    "portrait".to_string()
}

/// Run arguments for an Android test matrix.
/// 安卓测试矩阵的运行参数。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AndroidArgs {
    /// Remote-service project the matrices are billed to.
    /// 矩阵计费所属的远程服务项目。
    pub project: String,
    /// Path or storage URL of the application under test.
    /// 被测应用的路径或存储 URL。
    pub app: String,
    /// Path or storage URL of the instrumentation test package.
    /// 仪器化测试包的路径或存储 URL。
    pub test: String,
    /// Devices to fan the matrix out across.
    /// 矩阵要分布到的设备列表。
    #[serde(default)]
    pub device: Vec<DeviceConfig>,
    /// When `true`, submit and exit without polling, fetching or reporting.
    /// 为 `true` 时，仅提交后退出，不进行轮询、获取或报告。
    #[serde(default)]
    pub async_run: bool,
    /// How many times the remote service may retry a flaky test execution.
    /// 远程服务可以重试不稳定测试执行的次数。
    #[serde(default)]
    pub flaky_test_attempts: u32,
    /// Substring patterns selecting which result objects to download.
    /// 选择要下载哪些结果对象的子串模式。
    #[serde(default = "default_artifact_patterns")]
    pub artifact_patterns: Vec<String>,
}

/// Run arguments for an iOS test matrix.
/// iOS 测试矩阵的运行参数。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IosArgs {
    /// Remote-service project the matrices are billed to.
    /// 矩阵计费所属的远程服务项目。
    pub project: String,
    /// Path or storage URL of the zipped test bundle.
    /// 压缩测试包的路径或存储 URL。
    pub test: String,
    /// Path or storage URL of the `.xctestrun` file describing the bundle.
    /// 描述测试包的 `.xctestrun` 文件的路径或存储 URL。
    pub xctestrun_file: String,
    /// Devices to fan the matrix out across.
    /// 矩阵要分布到的设备列表。
    #[serde(default)]
    pub device: Vec<DeviceConfig>,
    /// When `true`, submit and exit without polling, fetching or reporting.
    /// 为 `true` 时，仅提交后退出，不进行轮询、获取或报告。
    #[serde(default)]
    pub async_run: bool,
    /// Substring patterns selecting which result objects to download.
    /// 选择要下载哪些结果对象的子串模式。
    #[serde(default = "default_artifact_patterns")]
    pub artifact_patterns: Vec<String>,
}

fn default_artifact_patterns() -> Vec<String> {
    vec![".xml".to_string(), ".log".to_string()]
}

/// The platform-tagged run arguments for one orchestrator invocation.
/// Dispatch is always on the tag; no open-ended type inspection happens
/// anywhere downstream of this enum.
///
/// 一次编排器调用的带平台标签的运行参数。
/// 调度始终基于标签进行；此枚举下游的任何地方都不会进行开放式类型检查。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum RunArgs {
    Android(AndroidArgs),
    Ios(IosArgs),
}

impl RunArgs {
    /// Reads and parses a run-arguments config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read run config: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse run config: {}", path.display()))
    }

    /// The platform keyword the remote service CLI expects.
    pub fn platform(&self) -> &'static str {
        match self {
            RunArgs::Android(_) => "android",
            RunArgs::Ios(_) => "ios",
        }
    }

    /// Fixed, per-platform file name under which the arguments are persisted.
    /// The run resolver detects the platform of an old run by which of these
    /// files is present in its directory.
    ///
    /// 参数持久化所用的、按平台固定的文件名。运行解析器通过运行目录中
    /// 存在哪一个文件来检测旧运行的平台。
    pub fn config_file_name(&self) -> &'static str {
        match self {
            RunArgs::Android(_) => ANDROID_ARGS_FILE,
            RunArgs::Ios(_) => IOS_ARGS_FILE,
        }
    }

    pub fn project(&self) -> &str {
        match self {
            RunArgs::Android(a) => &a.project,
            RunArgs::Ios(i) => &i.project,
        }
    }

    /// Whether the invocation should stop right after submission.
    pub fn async_run(&self) -> bool {
        match self {
            RunArgs::Android(a) => a.async_run,
            RunArgs::Ios(i) => i.async_run,
        }
    }

    /// The artifact-name pattern set used by the artifact fetcher.
    pub fn artifact_patterns(&self) -> &[String] {
        match self {
            RunArgs::Android(a) => &a.artifact_patterns,
            RunArgs::Ios(i) => &i.artifact_patterns,
        }
    }

    /// Persists the arguments into a run directory under the platform-specific
    /// file name, so the run can be resumed or cancelled later.
    pub fn save(&self, run_path: &Path) -> Result<()> {
        fs::create_dir_all(run_path).with_context(|| {
            format!("Failed to create run directory: {}", run_path.display())
        })?;
        let path = run_path.join(self.config_file_name());
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write run config: {}", path.display()))?;
        Ok(())
    }
}
