//! 报告接口与共享汇
//!
//! `ReportingSink` 由具体的报告器实现（表格、CSV、进度条），本身不是线程安全的。
//! 编排器只通过 `SharedSink` 访问它：所有调用都经过同一把互斥锁，
//! 每次加锁只覆盖一次调用。分析工作本身不持锁。

use crate::core::{AnalysisMode, FileRecord};
use crate::error::{AudioError, ErrorCategory};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// 进度快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// 完成比例 `[0, 1]`；空文件集视为已完成
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            (self.completed as f32 / self.total as f32).min(1.0)
        }
    }
}

/// 某一类错误导致被丢弃的文件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureGroup {
    pub category: String,
    pub files: Vec<String>,
}

/// 一次运行的汇总统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub mode: AnalysisMode,
    /// 进入工作集的文件数
    pub files_scanned: usize,
    /// 成功分析的文件数
    pub files_analyzed: usize,
    /// 交给报告器的文件数
    pub files_reported: usize,
    /// 无法读取而被丢弃的文件数
    pub files_dropped: usize,
    /// 边界模式：存在可裁切首尾静音的文件数
    pub files_with_silence: usize,
    /// 兼容模式：得分超过阈值的文件数
    pub mono_compatible_files: usize,
    /// 已报告文件的预计可节省字节数
    pub projected_savings_bytes: u64,
    pub elapsed_seconds: f64,
    pub failures: Vec<FailureGroup>,
}

impl RunSummary {
    /// 由已报告的记录汇总
    pub fn from_records(
        mode: AnalysisMode,
        files_scanned: usize,
        files_analyzed: usize,
        reported: &[FileRecord],
        failures: Vec<FailureGroup>,
        elapsed: Duration,
    ) -> Self {
        let files_with_silence = match mode {
            AnalysisMode::Boundary => reported
                .iter()
                .filter(|r| {
                    r.retained_range()
                        .is_some_and(|range| range.end - range.start < r.length())
                })
                .count(),
            AnalysisMode::MonoCompatibility { .. } => 0,
        };
        let mono_compatible_files = match mode {
            AnalysisMode::MonoCompatibility { .. } => reported.len(),
            AnalysisMode::Boundary => 0,
        };
        let files_dropped = failures.iter().map(|g| g.files.len()).sum();

        Self {
            mode,
            files_scanned,
            files_analyzed,
            files_reported: reported.len(),
            files_dropped,
            files_with_silence,
            mono_compatible_files,
            projected_savings_bytes: reported.iter().map(FileRecord::projected_savings_bytes).sum(),
            elapsed_seconds: elapsed.as_secs_f64(),
            failures,
        }
    }
}

/// 报告汇
///
/// 实现不需要自行同步，编排器保证同一时刻最多一个调用者。
pub trait ReportingSink: Send {
    /// 追加一条结果（按完成顺序，而非输入顺序）
    fn append_result(&mut self, record: &FileRecord);

    /// 每完成一个文件调用一次
    fn tick(&mut self, progress: Progress);

    /// 全部文件完成后调用一次
    fn finalize(&mut self, summary: &RunSummary);
}

struct SinkState<'a> {
    sink: &'a mut dyn ReportingSink,
    completed: usize,
    total: usize,
    failures: HashMap<ErrorCategory, Vec<String>>,
}

/// 互斥保护的报告汇（运行期间唯一的共享可变资源）
pub struct SharedSink<'a> {
    state: Mutex<SinkState<'a>>,
}

impl<'a> SharedSink<'a> {
    pub fn new(sink: &'a mut dyn ReportingSink, total: usize) -> Self {
        Self {
            state: Mutex::new(SinkState {
                sink,
                completed: 0,
                total,
                failures: HashMap::new(),
            }),
        }
    }

    // 工作线程panic时仍继续报告其余文件
    fn lock(&self) -> MutexGuard<'_, SinkState<'a>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, record: &FileRecord) {
        self.lock().sink.append_result(record);
    }

    /// 标记一个文件完成并推进进度
    pub fn tick(&self) {
        let mut state = self.lock();
        state.completed += 1;
        let progress = Progress {
            completed: state.completed,
            total: state.total,
        };
        state.sink.tick(progress);
    }

    /// 记录一个被丢弃的文件
    pub fn record_failure(&self, path: &Path, error: &AudioError) {
        let category = ErrorCategory::from_audio_error(error);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.lock().failures.entry(category).or_default().push(name);
    }

    /// 结束并行阶段，取回报告汇与失败统计
    pub fn into_parts(self) -> (&'a mut dyn ReportingSink, Vec<FailureGroup>) {
        let state = self.state.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut failures: Vec<FailureGroup> = state
            .failures
            .into_iter()
            .map(|(category, mut files)| {
                files.sort();
                FailureGroup {
                    category: category.display_name().to_string(),
                    files,
                }
            })
            .collect();
        failures.sort_by(|a, b| a.category.cmp(&b.category));
        (state.sink, failures)
    }
}
