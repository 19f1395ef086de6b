//! 单声道兼容性评分
//!
//! 统计所有声道与声道0在误差范围内相等的帧所占比例。
//! 与边界扫描相反，这里是 AND：一帧中任一声道偏离声道0即不计分。

use crate::audio::{PcmWindow, SampleSource};
use crate::error::AudioResult;
use serde::Serialize;

/// 声道相等判定的误差（浮点满幅单位）
pub const MONO_EPSILON: f32 = 0.0005;

/// 评分时的读取窗口（帧）
pub const SCORE_WINDOW: usize = 65_536;

/// 单声道文件的得分哨兵值
pub const NOT_APPLICABLE: f32 = -1.0;

/// 兼容性评分结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompatibilityScore {
    /// `-1.0` 表示单声道（不适用），否则为 `[0, 1]`
    pub score: f32,
    pub channel_count: u16,
    /// 参与评分的帧数
    pub sample_count: u64,
}

impl CompatibilityScore {
    pub fn is_applicable(&self) -> bool {
        self.score >= 0.0
    }
}

/// 单声道兼容性评分器
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityScorer;

impl CompatibilityScorer {
    /// 在 `[offset, offset + min(budget, length - offset))` 上评分
    ///
    /// 单声道源直接返回 `-1.0`，不读取样本；空区间得分为 `0.0`。
    pub fn score(
        &self,
        source: &mut dyn SampleSource,
        offset: u64,
        budget: u64,
    ) -> AudioResult<CompatibilityScore> {
        let channel_count = source.channel_count();
        let length = source.length_in_samples();
        let sample_count = budget.min(length.saturating_sub(offset));

        if channel_count == 1 {
            return Ok(CompatibilityScore {
                score: NOT_APPLICABLE,
                channel_count,
                sample_count,
            });
        }
        if sample_count == 0 {
            return Ok(CompatibilityScore {
                score: 0.0,
                channel_count,
                sample_count,
            });
        }

        let mut window = PcmWindow::new(
            source.format().sample_kind,
            source.format().channels_usize(),
        );
        let end = offset + sample_count;
        let mut start = offset;
        let mut equal_frames = 0u64;

        while start < end {
            let want = ((end - start) as usize).min(SCORE_WINDOW);
            let got = source.read_window(start, want, &mut window)?;
            equal_frames += count_equal_frames(&window, got) as u64;
            if got < want {
                // 读取不足的帧按不相等处理
                break;
            }
            start += want as u64;
        }

        let score = (equal_frames as f64 / sample_count as f64).min(1.0) as f32;
        Ok(CompatibilityScore {
            score,
            channel_count,
            sample_count,
        })
    }
}

/// 统计窗口前 `frames` 帧中所有声道都与声道0相等的帧数
fn count_equal_frames(window: &PcmWindow, frames: usize) -> usize {
    let channels = window.channels();
    (0..frames)
        .filter(|&frame| {
            let reference = window.sample_f32(0, frame);
            (1..channels).all(|ch| (window.sample_f32(ch, frame) - reference).abs() < MONO_EPSILON)
        })
        .count()
}
