//! zerochecker - 主程序入口
//!
//! 纯流程控制器：解析 → 校验 → 收集文件 → 编排分析/重写 → 退出码。

use std::process;
use zerochecker::{
    audio::{SUPPORTED_FORMATS, UniversalOpener},
    core::RunConfiguration,
    error::{AudioError, ErrorCategory},
    processing::{AnalysisOrchestrator, Confirm, RewriteSummary},
    tools::{self, AppConfig, AutoConfirm, ConsoleReporter, ExportOptions, RewritePolicy, StdinConfirm},
};

/// 错误退出码定义
mod exit_codes {
    /// 通用错误
    pub const GENERAL_ERROR: i32 = 1;
    /// 格式/输入错误
    pub const FORMAT_ERROR: i32 = 2;
    /// 解码失败
    pub const DECODING_ERROR: i32 = 3;
    /// 编码失败（重写阶段）
    pub const ENCODING_ERROR: i32 = 4;
    /// 资源/并发错误
    pub const RESOURCE_ERROR: i32 = 5;
}

/// 获取错误建议文本
fn get_error_suggestion(error: &AudioError) -> &'static str {
    match error {
        AudioError::InvalidInput(_) => {
            "检查命令行参数是否正确（--max 必须大于 --min），使用 --help 查看完整用法 / Check command-line arguments (--max must exceed --min), use --help to see full usage"
        }
        AudioError::ResourceError(_) => {
            "资源不可用，请检查系统资源或重试；若持续失败请降低并发度（--parallel-files 1） / Resource unavailable, retry or reduce parallelism (--parallel-files 1)"
        }
        _ => match ErrorCategory::from_audio_error(error) {
            ErrorCategory::Io => {
                "检查文件路径是否正确，文件是否存在且可读写 / Check if file path is correct, file exists and is readable/writable"
            }
            ErrorCategory::Format => {
                "确保输入文件为支持的格式 / Ensure input file is in a supported format"
            }
            ErrorCategory::Decoding => {
                "文件可能损坏或使用不支持的音频编码 / File may be corrupted or use unsupported audio encoding"
            }
            ErrorCategory::Encoding => {
                "重写失败，原文件可能已被截断，请从备份恢复 / Rewrite failed, the file may be truncated; restore from backup"
            }
            ErrorCategory::Other => {
                "请检查输入文件和参数设置 / Please check input file and parameter settings"
            }
        },
    }
}

/// 错误处理和建议
fn handle_error(error: AudioError) -> ! {
    eprintln!("[ERROR] 错误 / Error: {error}");

    let category = ErrorCategory::from_audio_error(&error);
    eprintln!("[INFO] 建议 / Suggestion: {}", get_error_suggestion(&error));

    if matches!(category, ErrorCategory::Format) {
        let uppercase_formats: Vec<String> = SUPPORTED_FORMATS
            .extensions
            .iter()
            .map(|s| s.to_uppercase())
            .collect();
        eprintln!(
            "   Supported formats / 支持的格式: {}",
            uppercase_formats.join(", ")
        );
    }

    let exit_code = match &error {
        AudioError::InvalidInput(_) => exit_codes::FORMAT_ERROR,
        AudioError::ResourceError(_) => exit_codes::RESOURCE_ERROR,
        _ => match category {
            ErrorCategory::Format => exit_codes::FORMAT_ERROR,
            ErrorCategory::Decoding => exit_codes::DECODING_ERROR,
            ErrorCategory::Encoding => exit_codes::ENCODING_ERROR,
            ErrorCategory::Io | ErrorCategory::Other => exit_codes::GENERAL_ERROR,
        },
    };

    process::exit(exit_code);
}

/// 初始化诊断日志（stderr；`RUST_LOG` 优先）
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_directive = if verbose {
        "zerochecker=debug"
    } else {
        "zerochecker=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // 测试或嵌入场景下可能已初始化，忽略重复初始化
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn show_rewrite_summary(summary: &RewriteSummary) {
    println!(
        "✏️  重写完成 / Rewrite finished: {} 已重写 / rewritten, {} 跳过 / skipped, {} 失败 / failed",
        summary.rewritten,
        summary.skipped,
        summary.failed.len()
    );
    for (path, reason) in &summary.failed {
        println!("   [FAIL] {} - {reason}", path.display());
    }
}

fn build_confirm(config: &AppConfig) -> Box<dyn Confirm> {
    match config.rewrite {
        RewritePolicy::Always => Box::new(AutoConfirm(true)),
        RewritePolicy::Never => Box::new(AutoConfirm(false)),
        RewritePolicy::Ask => Box::new(StdinConfirm::stdin()),
    }
}

/// 应用程序主逻辑（便于测试和复用）
fn run(config: &AppConfig) -> Result<(), AudioError> {
    // 1. 校验配置（任何文件被处理之前）
    let run_config = RunConfiguration::from_settings(&config.run_settings())?;

    // 2. 显示启动信息
    tools::show_startup_info(config);

    // 3. 展开输入
    let inputs = tools::collect_inputs(&config.inputs);
    tools::show_scan_results(&inputs, config.verbose);
    if inputs.files.is_empty() {
        return Ok(());
    }

    // 4. 编排分析与可选重写
    let degree = tools::effective_parallel_degree(config.parallel_files);
    if config.verbose {
        println!("⚡ 多文件并行处理：{degree} 并发度 / parallel files");
    }

    let exports = ExportOptions {
        csv_path: config.csv_path.clone(),
        json_path: config.json_path.clone(),
    };
    let mut reporter = ConsoleReporter::new(run_config.mode, exports, true);
    let mut confirm = build_confirm(config);
    let opener = UniversalOpener;

    let mut orchestrator = AnalysisOrchestrator::new(&run_config, &opener, degree);
    let outcome = orchestrator.run(&inputs.files, &mut reporter, confirm.as_mut())?;

    if let Some(rewrite) = &outcome.rewrite {
        show_rewrite_summary(rewrite);
    }

    tools::show_completion_info(config);
    Ok(())
}

fn main() {
    let config = tools::parse_args();
    init_logging(config.verbose);

    let result = run(&config);

    if let Err(error) = result {
        handle_error(error);
    }
}
