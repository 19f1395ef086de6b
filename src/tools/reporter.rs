//! 控制台报告器
//!
//! `ReportingSink` 的具体实现：进度条、结果表格、统计表格，
//! 以及可选的 CSV / JSON 导出。行按完成顺序输出。

use super::constants::report::{NOT_AVAILABLE, PROGRESS_TEMPLATE, SCORE_DECIMALS};
use super::utils::{ensure_extension, format_bytes, format_seconds, truncate_decimals};
use crate::core::{AnalysisMode, FileRecord};
use crate::processing::{Progress, ReportingSink, RunSummary};
use anyhow::Context;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const BOUNDARY_BANNER: &str = r"
 _____                  ____ _               _
|__  /___ _ __ ___     / ___| |__   ___  ___| | __
  / // _ \ '__/ _ \   | |   | '_ \ / _ \/ __| |/ /
 / /|  __/ | | (_) |  | |___| | | |  __/ (__|   <
/____\___|_|  \___/    \____|_| |_|\___|\___|_|\_\
";

const MONO_BANNER: &str = r"
 __  __                      ____ _               _
|  \/  | ___  _ __   ___    / ___| |__   ___  ___| | __
| |\/| |/ _ \| '_ \ / _ \  | |   | '_ \ / _ \/ __| |/ /
| |  | | (_) | | | | (_) | | |___| | | |  __/ (__|   <
|_|  |_|\___/|_| |_|\___/   \____|_| |_|\___|\___|_|\_\
";

const DIVIDER: &str = "════════════════════════════════════════════════════════════";

/// 导出选项
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub csv_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
}

/// 控制台报告器
pub struct ConsoleReporter {
    mode: AnalysisMode,
    exports: ExportOptions,
    show_progress: bool,
    records: Vec<FileRecord>,
    /// 首次 tick 时创建
    progress: Option<ProgressBar>,
    started_at: chrono::DateTime<chrono::Local>,
}

impl ConsoleReporter {
    pub fn new(mode: AnalysisMode, exports: ExportOptions, show_progress: bool) -> Self {
        Self {
            mode,
            exports,
            show_progress,
            records: Vec::new(),
            progress: None,
            started_at: chrono::Local::now(),
        }
    }

    /// 已收到的记录（完成顺序）
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// 进度条当前位置（未显示进度时为 `None`）
    pub fn progress_position(&self) -> Option<u64> {
        self.progress.as_ref().map(ProgressBar::position)
    }

    fn export(&self, summary: &RunSummary) {
        if let Some(path) = &self.exports.csv_path {
            match write_csv(path, self.mode, &self.records) {
                Ok(written) => println!("📄 CSV已保存 / CSV written: {}", written.display()),
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "CSV导出失败");
                    println!("⚠️  CSV导出失败 / CSV export failed: {e:#}");
                }
            }
        }
        if let Some(path) = &self.exports.json_path {
            let report = JsonReport {
                generated_at: self.started_at.to_rfc3339(),
                tool_version: VERSION,
                summary,
                records: &self.records,
            };
            match write_json(path, &report) {
                Ok(()) => println!("📄 JSON已保存 / JSON written: {}", path.display()),
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "JSON导出失败");
                    println!("⚠️  JSON导出失败 / JSON export failed: {e:#}");
                }
            }
        }
    }
}

impl ReportingSink for ConsoleReporter {
    fn append_result(&mut self, record: &FileRecord) {
        self.records.push(record.clone());
    }

    fn tick(&mut self, progress: Progress) {
        if !self.show_progress {
            return;
        }
        let bar = self
            .progress
            .get_or_insert_with(|| progress_bar(progress.total));
        bar.set_position(progress.completed as u64);
        if progress.completed >= progress.total {
            bar.finish();
        }
    }

    fn finalize(&mut self, summary: &RunSummary) {
        let banner = match self.mode {
            AnalysisMode::Boundary => BOUNDARY_BANNER,
            AnalysisMode::MonoCompatibility { .. } => MONO_BANNER,
        };
        println!("{banner}");
        println!(
            "🕒 {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S")
        );

        if self.records.is_empty() {
            println!("（没有需要报告的文件 / nothing to report）");
        } else {
            println!("{}", results_table(self.mode, &self.records));
        }
        println!("{}", stats_table(summary));

        for group in &summary.failures {
            println!("❌ {} ({}): {}", group.category, group.files.len(), group.files.join(", "));
        }

        self.export(summary);
        println!("{DIVIDER}");
    }
}

/// 文件级进度条（绘制到 stderr，非终端时自动隐藏）
fn progress_bar(total: usize) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    let bar = ProgressBar::new(total as u64);
    bar.set_style(style);
    bar
}

fn headers(mode: AnalysisMode) -> Vec<&'static str> {
    match mode {
        AnalysisMode::Boundary => vec![
            "File Name",
            "First Non-Zero (smpls)",
            "First Non-Zero (sec)",
            "Last Non-Zero (smpls)",
            "Last Non-Zero (sec)",
        ],
        AnalysisMode::MonoCompatibility { .. } => vec!["File Name", "Mono Compatibility"],
    }
}

/// 单条记录的数值列（不含文件名）
fn value_columns(mode: AnalysisMode, record: &FileRecord) -> Vec<String> {
    let or_na = |v: Option<String>| v.unwrap_or_else(|| NOT_AVAILABLE.to_string());
    match mode {
        AnalysisMode::Boundary => vec![
            or_na(record.first_boundary().map(|v| v.to_string())),
            or_na(record.first_boundary_time().map(format_seconds)),
            or_na(record.last_boundary().map(|v| v.to_string())),
            or_na(record.last_boundary_time().map(format_seconds)),
        ],
        AnalysisMode::MonoCompatibility { .. } => vec![truncate_decimals(
            record.mono_compatibility() as f64,
            SCORE_DECIMALS,
        )],
    }
}

/// 结果表格
pub fn results_table(mode: AnalysisMode, records: &[FileRecord]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(headers(mode));

    for record in records {
        let mut row = vec![Cell::new(record.file_name())];
        row.extend(
            value_columns(mode, record)
                .into_iter()
                .map(|v| Cell::new(v).set_alignment(CellAlignment::Right)),
        );
        table.add_row(row);
    }
    table
}

/// 统计表格
pub fn stats_table(summary: &RunSummary) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Statistic / 统计", "Value / 值"]);

    let mut rows = vec![
        (
            "Total Number of Files Scanned".to_string(),
            summary.files_scanned.to_string(),
        ),
        (
            "Execution Time".to_string(),
            format!("{} s", format_seconds(summary.elapsed_seconds)),
        ),
    ];
    match summary.mode {
        AnalysisMode::MonoCompatibility { threshold } => {
            rows.push((
                format!("Mono-Compatible Files (> {threshold})"),
                summary.mono_compatible_files.to_string(),
            ));
            rows.push((
                "Potential Space Savings".to_string(),
                format_bytes(summary.projected_savings_bytes),
            ));
        }
        AnalysisMode::Boundary => {
            rows.push((
                "Files With Silence Found".to_string(),
                summary.files_with_silence.to_string(),
            ));
            rows.push((
                "Potential Savings by Trimming".to_string(),
                format_bytes(summary.projected_savings_bytes),
            ));
        }
    }
    if summary.files_dropped > 0 {
        rows.push((
            "Unreadable Files Skipped".to_string(),
            summary.files_dropped.to_string(),
        ));
    }

    for (name, value) in rows {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

fn csv_header(mode: AnalysisMode) -> Vec<&'static str> {
    std::iter::once("Full Path").chain(headers(mode)).collect()
}

fn csv_row(mode: AnalysisMode, record: &FileRecord) -> Vec<String> {
    [record.path().display().to_string(), record.file_name()]
        .into_iter()
        .chain(value_columns(mode, record))
        .collect()
}

/// 写出CSV行（首列为完整路径，引号转义由 csv 处理）
fn write_csv_rows<W: Write>(
    writer: &mut csv::Writer<W>,
    mode: AnalysisMode,
    records: &[FileRecord],
) -> csv::Result<()> {
    writer.write_record(csv_header(mode))?;
    for record in records {
        writer.write_record(csv_row(mode, record))?;
    }
    writer.flush()?;
    Ok(())
}

/// 生成CSV内容
pub fn csv_content(mode: AnalysisMode, records: &[FileRecord]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_csv_rows(&mut writer, mode, records).context("CSV序列化失败")?;
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("CSV缓冲失败: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// 写出CSV（强制 `.csv` 扩展名），返回实际路径
pub fn write_csv(path: &Path, mode: AnalysisMode, records: &[FileRecord]) -> anyhow::Result<PathBuf> {
    let path = ensure_extension(path, "csv");
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("无法写入CSV文件 / cannot write {}", path.display()))?;
    write_csv_rows(&mut writer, mode, records)
        .with_context(|| format!("无法写入CSV文件 / cannot write {}", path.display()))?;
    Ok(path)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    tool_version: &'static str,
    summary: &'a RunSummary,
    records: &'a [FileRecord],
}

fn write_json(path: &Path, report: &JsonReport<'_>) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("无法创建JSON文件 / cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report).context("JSON序列化失败")?;
    writer.flush().context("JSON写入失败")?;
    Ok(())
}
