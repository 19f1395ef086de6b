//! 多文件处理模块
//!
//! 并行分析编排、串行化的报告汇以及破坏性的原地重写。

pub mod orchestrator;
pub mod reporting;
pub mod rewrite;

pub use orchestrator::{AnalysisOrchestrator, Confirm, RunOutcome, RunPhase};
pub use reporting::{FailureGroup, Progress, ReportingSink, RunSummary, SharedSink};
pub use rewrite::{RewriteAction, RewriteEngine, RewriteOutcome, RewriteSummary};
