//! 单文件分析记录
//!
//! 每个输入文件对应一条记录；分析结果在一次运行中只写入一次。
//! 尾部边界以“距文件末尾的帧数”存储，而非绝对位置。

use super::compatibility::CompatibilityScore;
use crate::audio::AudioFormat;
use crate::error::{AudioError, AudioResult};
use serde::Serialize;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// 记录中的分析结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "analysis", rename_all = "snake_case")]
pub enum RecordAnalysis {
    /// 尚未分析
    Pending,
    /// 边界模式结果；`None` 表示未找到
    Boundary {
        first: Option<u64>,
        last: Option<u64>,
    },
    /// 单声道兼容模式结果
    Compatibility(CompatibilityScore),
}

/// 单文件分析记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    path: PathBuf,
    sample_rate: u32,
    channel_count: u16,
    /// 文件总帧数
    length: u64,
    file_size: u64,
    #[serde(flatten)]
    analysis: RecordAnalysis,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>, format: &AudioFormat, file_size: u64) -> Self {
        Self {
            path: path.into(),
            sample_rate: format.sample_rate,
            channel_count: format.channels,
            length: format.sample_count,
            file_size,
            analysis: RecordAnalysis::Pending,
        }
    }

    /// 写入边界结果（每条记录仅允许一次）
    pub fn set_boundaries(&mut self, first: Option<u64>, last: Option<u64>) -> AudioResult<()> {
        self.write_once(RecordAnalysis::Boundary { first, last })
    }

    /// 写入兼容性评分（每条记录仅允许一次）
    pub fn set_compatibility(&mut self, score: CompatibilityScore) -> AudioResult<()> {
        self.channel_count = score.channel_count;
        self.write_once(RecordAnalysis::Compatibility(score))
    }

    fn write_once(&mut self, analysis: RecordAnalysis) -> AudioResult<()> {
        if self.analysis != RecordAnalysis::Pending {
            return Err(AudioError::InvalidInput(format!(
                "分析结果已写入 / record already analyzed: {}",
                self.path.display()
            )));
        }
        self.analysis = analysis;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 文件名（用于表格显示）
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn analysis(&self) -> &RecordAnalysis {
        &self.analysis
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// 首个非静音帧位置
    pub fn first_boundary(&self) -> Option<u64> {
        match self.analysis {
            RecordAnalysis::Boundary { first, .. } => first,
            _ => None,
        }
    }

    /// 尾部静音帧数（距文件末尾）
    pub fn last_boundary(&self) -> Option<u64> {
        match self.analysis {
            RecordAnalysis::Boundary { last, .. } => last,
            _ => None,
        }
    }

    /// 兼容的哨兵表示：未找到时为 `-1`
    pub fn first_boundary_or_sentinel(&self) -> i64 {
        self.first_boundary().map_or(-1, |v| v as i64)
    }

    pub fn last_boundary_or_sentinel(&self) -> i64 {
        self.last_boundary().map_or(-1, |v| v as i64)
    }

    pub fn first_boundary_time(&self) -> Option<f64> {
        self.first_boundary().map(|s| self.to_seconds(s))
    }

    pub fn last_boundary_time(&self) -> Option<f64> {
        self.last_boundary().map(|s| self.to_seconds(s))
    }

    /// 帧数换算为秒，截断到3位小数
    fn to_seconds(&self, samples: u64) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        let seconds = samples as f64 / self.sample_rate as f64;
        (seconds * 1000.0).trunc() / 1000.0
    }

    /// 兼容性得分；未评分时为 `0.0`，单声道为 `-1.0`
    pub fn mono_compatibility(&self) -> f32 {
        match self.analysis {
            RecordAnalysis::Compatibility(score) => score.score,
            _ => 0.0,
        }
    }

    /// 参与评分的帧数（仅兼容模式）
    pub fn sample_count(&self) -> Option<u64> {
        match self.analysis {
            RecordAnalysis::Compatibility(score) => Some(score.sample_count),
            _ => None,
        }
    }

    /// 裁切后保留的帧区间 `[first, length - last)`
    ///
    /// 任一边界未找到或区间为空时返回 `None`，此时文件不应被改写。
    pub fn retained_range(&self) -> Option<Range<u64>> {
        let first = self.first_boundary()?;
        let end = self.length.checked_sub(self.last_boundary()?)?;
        (first < end).then_some(first..end)
    }

    /// 预计可节省的字节数
    ///
    /// 边界模式按裁切帧数占比估算；兼容模式按丢弃的声道占比估算。
    pub fn projected_savings_bytes(&self) -> u64 {
        match self.analysis {
            RecordAnalysis::Boundary { .. } => match self.retained_range() {
                Some(range) if self.length > 0 => {
                    let trimmed = self.length - (range.end - range.start);
                    (self.file_size as u128 * trimmed as u128 / self.length as u128) as u64
                }
                _ => 0,
            },
            RecordAnalysis::Compatibility(score) if score.channel_count > 1 => {
                self.file_size - self.file_size / score.channel_count as u64
            }
            _ => 0,
        }
    }
}
