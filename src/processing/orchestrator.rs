//! 分析编排器
//!
//! 在固定大小的rayon线程池上对文件集并行执行边界扫描或兼容性评分，
//! 通过 `SharedSink` 串行化报告调用；分析与报告全部完成后才询问是否重写，
//! 重写阶段是对筛选后文件集的第二次独立并行映射。
//!
//! 运行状态：`Idle → Scanning → Reporting → [Confirm → Rewriting] → Done`

use super::reporting::{ReportingSink, RunSummary, SharedSink};
use super::rewrite::{RewriteAction, RewriteEngine, RewriteSummary};
use crate::audio::SourceOpener;
use crate::core::{
    AnalysisMode, BoundaryScanner, CompatibilityScorer, FileRecord, MagnitudeBand,
    RunConfiguration, SearchDirection,
};
use crate::error::{AudioError, AudioResult};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// 运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Scanning,
    Reporting,
    Confirm,
    Rewriting,
    Done,
}

/// 重写确认
pub trait Confirm {
    /// 返回 `true` 时对 `count` 个文件执行 `action`
    fn confirm(&mut self, action: RewriteAction, count: usize) -> bool;
}

/// 一次运行的结果
#[derive(Debug)]
pub struct RunOutcome {
    /// 交给报告器的记录（完成顺序）
    pub records: Vec<FileRecord>,
    pub summary: RunSummary,
    /// 未执行重写时为 `None`
    pub rewrite: Option<RewriteSummary>,
}

/// 分析编排器
pub struct AnalysisOrchestrator<'a> {
    config: &'a RunConfiguration,
    opener: &'a dyn SourceOpener,
    parallel_degree: usize,
    phase: RunPhase,
}

impl<'a> AnalysisOrchestrator<'a> {
    pub fn new(
        config: &'a RunConfiguration,
        opener: &'a dyn SourceOpener,
        parallel_degree: usize,
    ) -> Self {
        Self {
            config,
            opener,
            parallel_degree: parallel_degree.max(1),
            phase: RunPhase::Idle,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn enter(&mut self, next: RunPhase) {
        tracing::info!(from = ?self.phase, to = ?next, "运行阶段切换");
        self.phase = next;
    }

    /// 执行完整运行：分析 → 报告 → 确认 → 重写
    pub fn run(
        &mut self,
        files: &[PathBuf],
        sink: &mut dyn ReportingSink,
        confirm: &mut dyn Confirm,
    ) -> AudioResult<RunOutcome> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallel_degree)
            .thread_name(|i| format!("zc-worker-{i}"))
            .build()
            .map_err(|e| AudioError::ResourceError(format!("线程池创建失败: {e}")))?;

        let scanner = BoundaryScanner::new(
            MagnitudeBand::new(self.config.min_magnitude, self.config.max_magnitude)?,
            self.config.min_run,
        );

        // 1. 并行分析
        self.enter(RunPhase::Scanning);
        let started = Instant::now();
        let shared = SharedSink::new(sink, files.len());
        let analyzed: Vec<(FileRecord, bool)> = pool.install(|| {
            files
                .par_iter()
                .filter_map(|path| {
                    let result = self.analyze_file(&scanner, path);
                    let outcome = match result {
                        Ok(record) => {
                            let reported = self.should_report(&record);
                            if reported {
                                shared.append(&record);
                            } else {
                                tracing::debug!(
                                    path = %path.display(),
                                    score = record.mono_compatibility(),
                                    "得分未超过阈值，不报告"
                                );
                            }
                            Some((record, reported))
                        }
                        Err(e) => {
                            tracing::warn!(path = %path.display(), error = %e, "无法分析，已跳过");
                            shared.record_failure(path, &e);
                            None
                        }
                    };
                    shared.tick();
                    outcome
                })
                .collect()
        });

        // 2. 汇总报告（并行阶段已结束）
        self.enter(RunPhase::Reporting);
        let (sink, failures) = shared.into_parts();
        let files_analyzed = analyzed.len();
        let records: Vec<FileRecord> = analyzed
            .into_iter()
            .filter_map(|(record, reported)| reported.then_some(record))
            .collect();
        let summary = RunSummary::from_records(
            self.config.mode,
            files.len(),
            files_analyzed,
            &records,
            failures,
            started.elapsed(),
        );
        sink.finalize(&summary);

        // 3. 确认并重写
        let action = RewriteAction::for_mode(&self.config.mode);
        let mut rewrite = None;
        if !records.is_empty() {
            self.enter(RunPhase::Confirm);
            if confirm.confirm(action, records.len()) {
                self.enter(RunPhase::Rewriting);
                rewrite = Some(self.rewrite_all(&pool, &records, action));
            } else {
                tracing::info!("用户拒绝重写");
            }
        }

        self.enter(RunPhase::Done);
        Ok(RunOutcome {
            records,
            summary,
            rewrite,
        })
    }

    /// 分析单个文件（在工作线程上运行，不持锁）
    fn analyze_file(&self, scanner: &BoundaryScanner, path: &Path) -> AudioResult<FileRecord> {
        let mut source = self.opener.open(path)?;
        let file_size = std::fs::metadata(path)?.len();
        let mut record = FileRecord::new(path, source.format(), file_size);

        let offset = self.config.start_offset;
        let budget = self.config.search_budget.resolve(source.length_in_samples());

        match self.config.mode {
            AnalysisMode::Boundary => {
                let first = scanner.scan(source.as_mut(), SearchDirection::Forward, offset, budget)?;
                let last = scanner.scan(source.as_mut(), SearchDirection::Reverse, offset, budget)?;
                tracing::debug!(path = %path.display(), ?first, ?last, "边界扫描完成");
                record.set_boundaries(first, last)?;
            }
            AnalysisMode::MonoCompatibility { .. } => {
                let score = CompatibilityScorer.score(source.as_mut(), offset, budget)?;
                tracing::debug!(path = %path.display(), score = score.score, "兼容性评分完成");
                record.set_compatibility(score)?;
            }
        }
        Ok(record)
    }

    /// 边界模式报告全部；兼容模式仅报告得分严格大于阈值的文件
    fn should_report(&self, record: &FileRecord) -> bool {
        match self.config.mode {
            AnalysisMode::Boundary => true,
            AnalysisMode::MonoCompatibility { threshold } => {
                record.mono_compatibility() as f64 > threshold
            }
        }
    }

    fn rewrite_all(
        &self,
        pool: &rayon::ThreadPool,
        records: &[FileRecord],
        action: RewriteAction,
    ) -> RewriteSummary {
        let engine = RewriteEngine::new(self.opener);
        let outcomes: Vec<_> = pool.install(|| {
            records
                .par_iter()
                .map(|record| engine.rewrite(record, action))
                .collect()
        });

        let mut summary = RewriteSummary::default();
        for (record, outcome) in records.iter().zip(&outcomes) {
            summary.add(record, outcome);
        }
        summary
    }
}
