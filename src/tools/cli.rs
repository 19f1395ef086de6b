//! 命令行接口模块
//!
//! 负责命令行参数解析、配置管理和程序信息展示。
//! 解析只产出普通的 `AppConfig`，不触碰任何分析状态。

use super::constants::defaults;
use crate::core::RunSettings;
use clap::{Arg, ArgAction, Command, value_parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// 重写策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewritePolicy {
    /// 交互式询问
    Ask,
    /// `--yes`
    Always,
    /// `--no-rewrite`
    Never,
}

/// 应用程序配置
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// 文件或文件夹参数
    pub inputs: Vec<PathBuf>,
    pub csv_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
    pub offset: i64,
    pub num_samples: i64,
    pub consecutive: i64,
    pub max_magnitude: f64,
    pub min_magnitude: f64,
    pub mono_threshold: Option<f64>,
    pub rewrite: RewritePolicy,
    /// 多文件并发度（`None` 表示自动）
    pub parallel_files: Option<usize>,
    pub verbose: bool,
}

impl AppConfig {
    /// 分析相关的原始设置（尚未校验）
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            offset: self.offset,
            num_samples: self.num_samples,
            min_magnitude: self.min_magnitude,
            max_magnitude: self.max_magnitude,
            consecutive: self.consecutive,
            mono_threshold: self.mono_threshold,
        }
    }
}

/// 构建命令定义
pub fn build_command() -> Command {
    Command::new("zerochecker")
        .version(VERSION)
        .about(DESCRIPTION)
        .disable_version_flag(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("INPUT")
                .help("音频文件或文件夹 (WAV, FLAC)；文件夹会被递归扫描 / audio files or folders")
                .num_args(1..)
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('v')
                .help("显示版本 / print version")
                .action(ArgAction::Version),
        )
        .arg(
            Arg::new("csv")
                .long("csv")
                .short('c')
                .help("导出CSV（自动补全 .csv 扩展名）/ export results as CSV")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .short('j')
                .help("导出JSON报告 / export results as JSON")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("mono")
                .long("mono")
                .short('m')
                .help("单声道兼容模式，报告得分高于阈值的文件 / mono compatibility mode")
                .value_name("THRESHOLD")
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true),
        )
        .arg(
            Arg::new("offset")
                .long("offset")
                .short('o')
                .help("起始偏移（帧）/ start offset in samples")
                .value_name("N")
                .default_value("0")
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true),
        )
        .arg(
            Arg::new("num")
                .long("num")
                .short('n')
                .help("搜索帧数，-1 表示整个文件 / samples to search, -1 = whole file")
                .value_name("N")
                .default_value("-1")
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true),
        )
        .arg(
            Arg::new("consec")
                .long("consec")
                .short('s')
                .help("最少连续帧数 / minimum consecutive samples")
                .value_name("N")
                .default_value("0")
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true),
        )
        .arg(
            Arg::new("max")
                .long("max")
                .short('x')
                .help("接受带上限 0..1 / maximum magnitude")
                .value_name("VALUE")
                .default_value("1.0")
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true),
        )
        .arg(
            Arg::new("min")
                .long("min")
                .short('y')
                .help("接受带下限 0..1 / minimum magnitude")
                .value_name("VALUE")
                .default_value("0.003")
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true),
        )
        .arg(
            Arg::new("yes")
                .long("yes")
                .help("不询问，直接重写 / rewrite without asking")
                .action(ArgAction::SetTrue)
                .conflicts_with("no-rewrite"),
        )
        .arg(
            Arg::new("no-rewrite")
                .long("no-rewrite")
                .help("只分析，不重写 / analyze only")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("parallel-files")
                .long("parallel-files")
                .short('p')
                .help("并行处理的文件数（默认自动，最多16）/ files processed in parallel")
                .value_name("N")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("显示详细处理信息 / verbose output")
                .action(ArgAction::SetTrue),
        )
}

/// 解析进程参数；出错时由clap打印帮助/错误并退出
pub fn parse_args() -> AppConfig {
    match parse_args_from(std::env::args_os()) {
        Ok(config) => config,
        Err(e) => e.exit(),
    }
}

/// 从给定参数解析（便于测试）
pub fn parse_args_from<I, T>(args: I) -> Result<AppConfig, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().try_get_matches_from(args)?;

    let rewrite = if matches.get_flag("yes") {
        RewritePolicy::Always
    } else if matches.get_flag("no-rewrite") {
        RewritePolicy::Never
    } else {
        RewritePolicy::Ask
    };

    Ok(AppConfig {
        inputs: matches
            .get_many::<PathBuf>("INPUT")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        csv_path: matches.get_one::<PathBuf>("csv").cloned(),
        json_path: matches.get_one::<PathBuf>("json").cloned(),
        offset: matches.get_one::<i64>("offset").copied().unwrap_or(defaults::OFFSET),
        num_samples: matches
            .get_one::<i64>("num")
            .copied()
            .unwrap_or(defaults::NUM_SAMPLES),
        consecutive: matches
            .get_one::<i64>("consec")
            .copied()
            .unwrap_or(defaults::CONSECUTIVE),
        max_magnitude: matches
            .get_one::<f64>("max")
            .copied()
            .unwrap_or(defaults::DEFAULT_MAX_MAGNITUDE),
        min_magnitude: matches
            .get_one::<f64>("min")
            .copied()
            .unwrap_or(defaults::DEFAULT_MIN_MAGNITUDE),
        mono_threshold: matches.get_one::<f64>("mono").copied(),
        rewrite,
        parallel_files: matches.get_one::<usize>("parallel-files").copied(),
        verbose: matches.get_flag("verbose"),
    })
}

/// 显示程序启动信息
pub fn show_startup_info(config: &AppConfig) {
    println!("🚀 zerochecker v{VERSION} 启动");
    println!("📝 {DESCRIPTION}");
    if config.verbose {
        let settings = config.run_settings();
        println!(
            "⚙️  offset={} num={} consec={} min={} max={} mono={:?}",
            settings.offset,
            settings.num_samples,
            settings.consecutive,
            settings.min_magnitude,
            settings.max_magnitude,
            settings.mono_threshold
        );
    }
    println!();
}

/// 显示程序完成信息
pub fn show_completion_info(config: &AppConfig) {
    if config.verbose {
        println!("✅ 所有任务处理完成！");
    }
}
