//! 工具模块集合
//!
//! 包含CLI、输入扫描、报告输出、重写确认等工具模块，支持main.rs的流程控制。

pub mod cli;
pub mod confirm;
pub mod constants;
pub mod reporter;
pub mod scanner;
pub mod utils;

// 重新导出主要的公共接口
pub use cli::{
    AppConfig, RewritePolicy, build_command, parse_args, parse_args_from, show_completion_info,
    show_startup_info,
};
pub use confirm::{AutoConfirm, StdinConfirm};
pub use reporter::{ConsoleReporter, ExportOptions};
pub use scanner::{InputSet, collect_inputs, show_scan_results};
pub use utils::effective_parallel_degree;
