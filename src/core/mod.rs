//! 核心算法模块
//!
//! 边界扫描、单声道兼容性评分、运行配置与单文件记录。

pub mod boundary_scanner;
pub mod compatibility;
pub mod file_record;
pub mod run_config;

// 重新导出公共接口
pub use boundary_scanner::{BoundaryScanner, MagnitudeBand, SearchDirection, WINDOW_SIZE};
pub use compatibility::{CompatibilityScore, CompatibilityScorer, MONO_EPSILON};
pub use file_record::{FileRecord, RecordAnalysis};
pub use run_config::{AnalysisMode, RunConfiguration, RunSettings, SearchBudget};
