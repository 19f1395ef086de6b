//! 样本源接口模块
//!
//! 定义按窗口读取PCM数据的 `SampleSource` trait、平面样本缓冲 `PcmWindow`，
//! 以及按路径打开样本源的 `SourceOpener`。

use super::format::{AudioFormat, SUPPORTED_FORMATS, SampleKind};
use super::symphonia_source::SymphoniaSource;
use super::wav_source::HoundSource;
use crate::error::{AudioError, AudioResult};
use std::path::Path;

/// 整数PCM（左对齐 i32）到浮点满幅的换算因子
pub const INT_FULL_SCALE: f32 = 2_147_483_648.0;

/// 平面（按声道分离）的PCM样本窗口
///
/// 窗口在扫描过程中被重复使用，容量只增不减，保证内存为 O(窗口 × 声道)。
#[derive(Debug, Clone, PartialEq)]
pub enum PcmWindow {
    /// 左对齐到 i32 满幅的整数样本
    Int(Vec<Vec<i32>>),
    /// 归一化到 [-1, 1] 的浮点样本
    Float(Vec<Vec<f32>>),
}

impl PcmWindow {
    /// 创建指定类型与声道数的空窗口
    pub fn new(kind: SampleKind, channels: usize) -> Self {
        match kind {
            SampleKind::Int => PcmWindow::Int(vec![Vec::new(); channels]),
            SampleKind::Float => PcmWindow::Float(vec![Vec::new(); channels]),
        }
    }

    pub fn kind(&self) -> SampleKind {
        match self {
            PcmWindow::Int(_) => SampleKind::Int,
            PcmWindow::Float(_) => SampleKind::Float,
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            PcmWindow::Int(chs) => chs.len(),
            PcmWindow::Float(chs) => chs.len(),
        }
    }

    /// 当前窗口中的帧数（以声道0为准）
    pub fn frames(&self) -> usize {
        match self {
            PcmWindow::Int(chs) => chs.first().map_or(0, Vec::len),
            PcmWindow::Float(chs) => chs.first().map_or(0, Vec::len),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// 确保窗口布局与格式一致（不一致时重建），并清空内容
    pub fn reset_for(&mut self, format: &AudioFormat) {
        if self.kind() != format.sample_kind || self.channels() != format.channels_usize() {
            *self = PcmWindow::new(format.sample_kind, format.channels_usize());
        } else {
            self.clear();
        }
    }

    /// 清空所有声道（保留容量）
    pub fn clear(&mut self) {
        match self {
            PcmWindow::Int(chs) => chs.iter_mut().for_each(Vec::clear),
            PcmWindow::Float(chs) => chs.iter_mut().for_each(Vec::clear),
        }
    }

    /// 以浮点满幅读取单个样本（整数按 2^31 归一化）
    #[inline]
    pub fn sample_f32(&self, channel: usize, frame: usize) -> f32 {
        match self {
            PcmWindow::Int(chs) => chs[channel][frame] as f32 / INT_FULL_SCALE,
            PcmWindow::Float(chs) => chs[channel][frame],
        }
    }

    /// 将 `other` 中 `[offset, offset + count)` 的帧追加到本窗口末尾
    ///
    /// 两个窗口的样本类型与声道数必须一致。
    pub fn append_range(
        &mut self,
        other: &PcmWindow,
        offset: usize,
        count: usize,
    ) -> AudioResult<()> {
        if self.channels() != other.channels() {
            return Err(AudioError::InvalidInput(format!(
                "声道数不匹配: {} vs {}",
                self.channels(),
                other.channels()
            )));
        }
        match (self, other) {
            (PcmWindow::Int(dst), PcmWindow::Int(src)) => {
                for (d, s) in dst.iter_mut().zip(src) {
                    d.extend_from_slice(&s[offset..offset + count]);
                }
            }
            (PcmWindow::Float(dst), PcmWindow::Float(src)) => {
                for (d, s) in dst.iter_mut().zip(src) {
                    d.extend_from_slice(&s[offset..offset + count]);
                }
            }
            _ => {
                return Err(AudioError::InvalidInput(
                    "样本类型不匹配（整数/浮点）".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// 仅保留指定声道，其余声道丢弃
    pub fn retain_channel(&mut self, channel: usize) -> AudioResult<()> {
        if channel >= self.channels() {
            return Err(AudioError::InvalidInput(format!(
                "声道索引越界: {channel} >= {}",
                self.channels()
            )));
        }
        match self {
            PcmWindow::Int(chs) => {
                let kept = std::mem::take(&mut chs[channel]);
                *chs = vec![kept];
            }
            PcmWindow::Float(chs) => {
                let kept = std::mem::take(&mut chs[channel]);
                *chs = vec![kept];
            }
        }
        Ok(())
    }
}

/// 按窗口提供PCM数据的样本源
///
/// 抽象具体编解码器；实现需支持任意起点的随机读取，
/// 以便 `BoundaryScanner` 从文件尾部反向扫描。
pub trait SampleSource {
    /// 音频格式信息（声道数、总帧数、采样率、位深）
    fn format(&self) -> &AudioFormat;

    /// 从 `start` 帧开始读取最多 `count` 帧到 `window`（先清空）
    ///
    /// 返回实际读取的帧数；到达文件尾时可能小于 `count`。
    fn read_window(&mut self, start: u64, count: usize, window: &mut PcmWindow)
    -> AudioResult<usize>;

    fn channel_count(&self) -> u16 {
        self.format().channels
    }

    fn length_in_samples(&self) -> u64 {
        self.format().sample_count
    }

    fn sample_rate(&self) -> u32 {
        self.format().sample_rate
    }
}

/// 按路径打开样本源
///
/// 打开失败（头损坏、扩展名不支持）时返回错误，由调用方决定丢弃该文件。
pub trait SourceOpener: Sync {
    fn open(&self, path: &Path) -> AudioResult<Box<dyn SampleSource>>;
}

/// 统一样本源打开器
///
/// WAV 优先使用 hound（更快、精确定位），失败时回退到 symphonia；
/// FLAC 使用 symphonia。
#[derive(Debug, Default, Clone, Copy)]
pub struct UniversalOpener;

impl SourceOpener for UniversalOpener {
    fn open(&self, path: &Path) -> AudioResult<Box<dyn SampleSource>> {
        if !SUPPORTED_FORMATS.accepts(path) {
            return Err(AudioError::FormatError(format!(
                "不支持的文件格式 / Unsupported file: {}",
                path.display()
            )));
        }

        let is_wav = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

        if is_wav {
            match HoundSource::open(path) {
                Ok(source) => return Ok(Box::new(source)),
                Err(e) => {
                    tracing::debug!(
                        path = %path.display(),
                        error = %e,
                        "hound解码失败，使用symphonia后备解码器"
                    );
                }
            }
        }

        Ok(Box::new(SymphoniaSource::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_append_and_frames() {
        let src = PcmWindow::Int(vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]]);
        let mut dst = PcmWindow::new(SampleKind::Int, 2);
        assert!(dst.is_empty());

        dst.append_range(&src, 1, 2).unwrap();
        dst.append_range(&src, 0, 1).unwrap();
        assert_eq!(dst, PcmWindow::Int(vec![vec![2, 3, 1], vec![6, 7, 5]]));
        assert_eq!(dst.frames(), 3);

        dst.clear();
        assert_eq!(dst.frames(), 0);
        assert_eq!(dst.channels(), 2);
    }

    #[test]
    fn test_window_append_rejects_mismatch() {
        let src = PcmWindow::Float(vec![vec![0.0]]);
        let mut dst = PcmWindow::new(SampleKind::Int, 1);
        assert!(dst.append_range(&src, 0, 1).is_err());

        let mut dst = PcmWindow::new(SampleKind::Float, 2);
        assert!(dst.append_range(&src, 0, 1).is_err());
    }

    #[test]
    fn test_sample_f32_normalizes_int() {
        let w = PcmWindow::Int(vec![vec![i32::MIN, 0, 1 << 30]]);
        assert_eq!(w.sample_f32(0, 0), -1.0);
        assert_eq!(w.sample_f32(0, 1), 0.0);
        assert_eq!(w.sample_f32(0, 2), 0.5);
    }

    #[test]
    fn test_retain_channel() {
        let mut w = PcmWindow::Float(vec![vec![0.1, 0.2], vec![0.3, 0.4], vec![0.5, 0.6]]);
        w.retain_channel(0).unwrap();
        assert_eq!(w, PcmWindow::Float(vec![vec![0.1, 0.2]]));
        assert!(w.retain_channel(3).is_err());
    }

    #[test]
    fn test_opener_rejects_unknown_extension() {
        let result = UniversalOpener.open(Path::new("does_not_matter.mp3"));
        assert!(matches!(result, Err(AudioError::FormatError(_))));
    }
}
