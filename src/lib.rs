//! zerochecker - 首尾静音边界检测与单声道兼容性检查工具
//!
//! 在任意长度的音频流上以固定窗口进行双向扫描，定位首个/末个落入幅度接受带
//! 且持续足够帧数的样本；另对多声道素材评估折叠为单声道的兼容性，
//! 并可选地原地重写文件（裁切静音或只保留声道0）。
//!
//! ## 核心特性
//! - 正向返回绝对帧位置，反向返回距文件末尾的帧数
//! - 内存占用与文件长度无关（O(窗口 × 声道)）
//! - rayon 文件级并行，报告调用通过单一互斥锁串行化
//! - WAV（hound）与 FLAC（symphonia 解码 / flacenc 编码）

pub mod audio;
pub mod core;
pub mod error;
pub mod processing;
pub mod tools;

// 重新导出核心类型
pub use audio::{AudioFormat, SampleSource, SourceOpener, UniversalOpener};
pub use core::{
    AnalysisMode, BoundaryScanner, CompatibilityScorer, FileRecord, RunConfiguration, RunSettings,
};
pub use error::{AudioError, AudioResult};
pub use processing::{AnalysisOrchestrator, ReportingSink, RewriteEngine, RunOutcome};
