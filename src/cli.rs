// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::{env, path::PathBuf};

use crate::{commands, t};

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` argument.
fn pre_parse_language() -> String {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        if let Some(lang) = args.get(pos + 1) {
            return lang.clone();
        }
    }
    // Fallback to system language detection
    sys_locale::get_locale().unwrap_or_else(|| "en".to_string())
}

fn build_cli(locale: &str) -> Command {
    Command::new("matrix-orchestrator")
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("results-dir")
                .long("results-dir")
                .help(t!("cli_results_dir", locale = locale).to_string())
                .value_name("RESULTS_DIR")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about", locale = locale).to_string())
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help(t!("arg_config", locale = locale).to_string())
                        .value_name("CONFIG")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(Command::new("refresh").about(t!("cmd_refresh_about", locale = locale).to_string()))
        .subcommand(Command::new("cancel").about(t!("cmd_cancel_about", locale = locale).to_string()))
}

/// Parses the CLI and dispatches to the selected top-level operation.
/// Returns the process exit code of the operation; error mapping to a
/// diagnostic line and a failure code happens in `main`, the single
/// termination point.
///
/// 解析 CLI 并调度到所选的顶层操作。返回该操作的进程退出码；
/// 错误到诊断行和失败退出码的映射发生在唯一的终止点 `main` 中。
pub async fn run() -> Result<i32> {
    // Pre-parse language and initialize i18n first.
    let language = pre_parse_language();
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();
    let results_dir = matches.get_one::<PathBuf>("results-dir").cloned();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let config = run_matches
                .get_one::<PathBuf>("config")
                .expect("required by clap")
                .clone();
            commands::run::execute(config, results_dir.as_deref()).await
        }
        Some(("refresh", _)) => commands::refresh_run::execute(results_dir.as_deref()).await,
        Some(("cancel", _)) => commands::cancel::execute(results_dir.as_deref()).await,
        _ => unreachable!("subcommand_required is set"),
    }
}
