//! 常量和默认配置集中管理
//!
//! 将所有重要常量集中定义，避免"默认值漂移"和重复定义

/// 默认配置值
pub mod defaults {
    pub use crate::core::run_config::{DEFAULT_MAX_MAGNITUDE, DEFAULT_MIN_MAGNITUDE};

    /// 默认最小连续帧数（0 与 1 等价：单个候选帧即被接受）
    pub const CONSECUTIVE: i64 = 0;

    /// 默认搜索预算（负数表示整个文件）
    pub const NUM_SAMPLES: i64 = -1;

    /// 默认起始偏移
    pub const OFFSET: i64 = 0;
}

/// 并发度限制常量
pub mod parallel_limits {
    /// 最小并发度
    ///
    /// 任何并行处理至少需要1个线程/工作单元
    pub const MIN_PARALLEL_DEGREE: usize = 1;

    /// 最大并发度
    ///
    /// 限制最大并发度为16，避免过度并发导致的：
    /// - 同时打开的文件句柄过多
    /// - 重写阶段的内存占用过高（每个文件的保留区间整体驻留内存）
    pub const MAX_PARALLEL_DEGREE: usize = 16;
}

/// 报告输出常量
pub mod report {
    /// 单声道得分显示的小数位数（截断）
    pub const SCORE_DECIMALS: u32 = 4;

    /// 进度条样式，例如 `[=========>          ] 5/12 (42%)`
    pub const PROGRESS_TEMPLATE: &str = "[{bar:40}] {pos}/{len} ({percent}%) {elapsed_precise}";

    /// 缺失边界的显示文本
    pub const NOT_AVAILABLE: &str = "N/A";
}
