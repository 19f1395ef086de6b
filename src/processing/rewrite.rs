//! 原地重写引擎
//!
//! 解码源文件 → 计算保留区间（或保留声道）→ 截断文件 → 重新编码。
//!
//! 注意：重写是破坏性的且非原子：写入过程中崩溃会留下损坏的文件。

use crate::audio::{
    AudioFormat, OutputContainer, PcmWindow, SourceOpener, create_writer, ensure_encodable,
};
use crate::core::{AnalysisMode, FileRecord};
use crate::error::{self, AudioError, AudioResult};
use std::ops::Range;
use std::path::PathBuf;

/// 重写时的解码块大小（帧）
const REWRITE_CHUNK: usize = 65_536;

/// 重写动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteAction {
    /// 裁切到 `[first, length - last)`
    Trim,
    /// 只保留声道0
    Downmix,
}

impl RewriteAction {
    pub fn for_mode(mode: &AnalysisMode) -> Self {
        match mode {
            AnalysisMode::Boundary => RewriteAction::Trim,
            AnalysisMode::MonoCompatibility { .. } => RewriteAction::Downmix,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            RewriteAction::Trim => "裁切首尾静音 / trim silence",
            RewriteAction::Downmix => "转换为单声道 / fold down to mono",
        }
    }
}

/// 单个文件的重写结果
#[derive(Debug)]
pub enum RewriteOutcome {
    Rewritten { frames: u64, channels: u16 },
    /// 文件未被触碰
    Skipped(String),
    /// 重写中途失败；文件可能已被截断
    Failed(AudioError),
}

/// 重写阶段汇总
#[derive(Debug, Default)]
pub struct RewriteSummary {
    pub rewritten: usize,
    pub skipped: usize,
    pub failed: Vec<(PathBuf, String)>,
}

impl RewriteSummary {
    pub fn add(&mut self, record: &FileRecord, outcome: &RewriteOutcome) {
        match outcome {
            RewriteOutcome::Rewritten { .. } => self.rewritten += 1,
            RewriteOutcome::Skipped(_) => self.skipped += 1,
            RewriteOutcome::Failed(e) => self.failed.push((record.path().to_path_buf(), e.to_string())),
        }
    }

    pub fn total(&self) -> usize {
        self.rewritten + self.skipped + self.failed.len()
    }
}

/// 原地重写引擎
pub struct RewriteEngine<'a> {
    opener: &'a dyn SourceOpener,
}

impl<'a> RewriteEngine<'a> {
    pub fn new(opener: &'a dyn SourceOpener) -> Self {
        Self { opener }
    }

    /// 重写单个文件；任何失败都只影响该文件
    pub fn rewrite(&self, record: &FileRecord, action: RewriteAction) -> RewriteOutcome {
        let result = self.try_rewrite(record, action);
        match result {
            Ok(outcome) => {
                match &outcome {
                    RewriteOutcome::Rewritten { frames, channels } => tracing::info!(
                        path = %record.path().display(),
                        frames,
                        channels,
                        "文件已重写"
                    ),
                    RewriteOutcome::Skipped(reason) => tracing::debug!(
                        path = %record.path().display(),
                        reason = %reason,
                        "跳过重写"
                    ),
                    RewriteOutcome::Failed(_) => {}
                }
                outcome
            }
            Err(e) => {
                tracing::warn!(path = %record.path().display(), error = %e, "重写失败");
                RewriteOutcome::Failed(e)
            }
        }
    }

    fn try_rewrite(&self, record: &FileRecord, action: RewriteAction) -> AudioResult<RewriteOutcome> {
        let path = record.path();
        let Some(container) = OutputContainer::for_path(path) else {
            return Ok(RewriteOutcome::Skipped(
                "无对应的写出格式 / no writer for extension".to_string(),
            ));
        };

        let planned = match plan_range(record, action) {
            Ok(range) => range,
            Err(reason) => return Ok(RewriteOutcome::Skipped(reason.to_string())),
        };

        // 1. 解码保留区域到内存
        let mut source = self.opener.open(path)?;
        let format = source.format().clone();
        if let Err(e) = ensure_encodable(container, &format) {
            return Ok(RewriteOutcome::Skipped(e.to_string()));
        }
        let range = match planned {
            Some(range) => range,
            None => 0..format.sample_count,
        };
        if range.end > format.sample_count || range.is_empty() {
            return Ok(RewriteOutcome::Skipped(format!(
                "保留区间与文件长度不符 / retained range {range:?} outside {} frames",
                format.sample_count
            )));
        }

        let mut retained = PcmWindow::new(format.sample_kind, format.channels_usize());
        let mut chunk = PcmWindow::new(format.sample_kind, format.channels_usize());
        let mut start = range.start;
        while start < range.end {
            let want = ((range.end - start) as usize).min(REWRITE_CHUNK);
            let got = source.read_window(start, want, &mut chunk)?;
            if got < want {
                return Err(error::decoding_error(
                    "重写前解码不完整",
                    format!("位置 {start} 期望 {want} 帧, 实际 {got} 帧"),
                ));
            }
            retained.append_range(&chunk, 0, got)?;
            start += got as u64;
        }
        drop(source);

        if action == RewriteAction::Downmix {
            retained.retain_channel(0)?;
        }

        // 2. 截断并重新编码
        let frames = retained.frames();
        let output = AudioFormat::new(
            format.sample_rate,
            retained.channels() as u16,
            format.bits_per_sample,
            frames as u64,
            format.sample_kind,
        )
        .with_encoding(format.encoding);
        let Some(mut writer) = create_writer(path, &output)? else {
            return Ok(RewriteOutcome::Skipped(
                "无对应的写出格式 / no writer for extension".to_string(),
            ));
        };
        writer.write(&retained, 0, frames)?;
        writer.finalize()?;

        Ok(RewriteOutcome::Rewritten {
            frames: frames as u64,
            channels: output.channels,
        })
    }
}

/// 根据记录计算保留区间；`Ok(None)` 表示整个文件
fn plan_range(record: &FileRecord, action: RewriteAction) -> Result<Option<Range<u64>>, &'static str> {
    match action {
        RewriteAction::Trim => record
            .retained_range()
            .map(Some)
            .ok_or("边界未找到或保留区间为空 / boundary not found or empty range"),
        RewriteAction::Downmix if record.channel_count() >= 2 && record.mono_compatibility() >= 0.0 => {
            Ok(None)
        }
        RewriteAction::Downmix => Err("已是单声道 / already mono"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SampleKind;
    use crate::core::CompatibilityScore;

    fn format(channels: u16) -> AudioFormat {
        AudioFormat::new(44100, channels, 16, 1000, SampleKind::Int)
    }

    #[test]
    fn test_trim_plan_requires_both_boundaries() {
        let mut r = FileRecord::new("a.wav", &format(2), 0);
        r.set_boundaries(Some(10), None).unwrap();
        assert!(plan_range(&r, RewriteAction::Trim).is_err());

        let mut r = FileRecord::new("a.wav", &format(2), 0);
        r.set_boundaries(Some(10), Some(90)).unwrap();
        assert_eq!(plan_range(&r, RewriteAction::Trim), Ok(Some(10..910)));
    }

    #[test]
    fn test_downmix_plan_requires_multichannel() {
        let mut r = FileRecord::new("a.wav", &format(1), 0);
        r.set_compatibility(CompatibilityScore {
            score: -1.0,
            channel_count: 1,
            sample_count: 1000,
        })
        .unwrap();
        assert!(plan_range(&r, RewriteAction::Downmix).is_err());

        let mut r = FileRecord::new("a.wav", &format(2), 0);
        r.set_compatibility(CompatibilityScore {
            score: 1.0,
            channel_count: 2,
            sample_count: 1000,
        })
        .unwrap();
        assert_eq!(plan_range(&r, RewriteAction::Downmix), Ok(None));
    }

    #[test]
    fn test_summary_counts() {
        let r = FileRecord::new("a.wav", &format(2), 0);
        let mut summary = RewriteSummary::default();
        summary.add(&r, &RewriteOutcome::Rewritten { frames: 1, channels: 1 });
        summary.add(&r, &RewriteOutcome::Skipped("x".into()));
        summary.add(&r, &RewriteOutcome::Failed(AudioError::EncodingError("y".into())));
        assert_eq!(summary.rewritten, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.total(), 3);
    }
}
