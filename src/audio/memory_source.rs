//! 内存样本源
//!
//! 将已解码（或合成）的平面样本包装为 `SampleSource`，
//! 用于合成信号分析以及不依赖文件系统的测试。

use super::format::{AudioFormat, SampleKind};
use super::source::{PcmWindow, SampleSource};
use crate::error::{AudioError, AudioResult};

/// 内存中的平面样本源
#[derive(Debug, Clone)]
pub struct MemorySource {
    format: AudioFormat,
    data: PcmWindow,
}

impl MemorySource {
    /// 由归一化浮点样本创建（每个 Vec 为一个声道）
    pub fn from_float(sample_rate: u32, channels: Vec<Vec<f32>>) -> AudioResult<Self> {
        let frames = Self::check_lengths(channels.iter().map(Vec::len))?;
        let format = AudioFormat::new(
            sample_rate,
            channels.len() as u16,
            32,
            frames as u64,
            SampleKind::Float,
        );
        format.validate()?;
        Ok(Self {
            format,
            data: PcmWindow::Float(channels),
        })
    }

    /// 由原生位深的整数样本创建（如16位样本取值 -32768..=32767）
    ///
    /// 样本在内部左对齐到 i32 满幅，与文件样本源的表示一致。
    pub fn from_int(
        sample_rate: u32,
        bits_per_sample: u16,
        channels: Vec<Vec<i32>>,
    ) -> AudioResult<Self> {
        let frames = Self::check_lengths(channels.iter().map(Vec::len))?;
        let format = AudioFormat::new(
            sample_rate,
            channels.len() as u16,
            bits_per_sample,
            frames as u64,
            SampleKind::Int,
        );
        format.validate()?;
        let shift = format.left_justify_shift();
        let justified = channels
            .into_iter()
            .map(|ch| ch.into_iter().map(|s| s << shift).collect())
            .collect();
        Ok(Self {
            format,
            data: PcmWindow::Int(justified),
        })
    }

    fn check_lengths(mut lengths: impl Iterator<Item = usize>) -> AudioResult<usize> {
        let first = lengths
            .next()
            .ok_or_else(|| AudioError::InvalidInput("至少需要一个声道".to_string()))?;
        if lengths.any(|len| len != first) {
            return Err(AudioError::InvalidInput("各声道长度不一致".to_string()));
        }
        Ok(first)
    }
}

impl SampleSource for MemorySource {
    fn format(&self) -> &AudioFormat {
        &self.format
    }

    fn read_window(
        &mut self,
        start: u64,
        count: usize,
        window: &mut PcmWindow,
    ) -> AudioResult<usize> {
        window.reset_for(&self.format);
        let total = self.format.sample_count;
        if start >= total {
            return Ok(0);
        }
        let available = ((total - start) as usize).min(count);
        window.append_range(&self.data, start as usize, available)?;
        Ok(available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_int_left_justifies() {
        let mut source = MemorySource::from_int(44100, 16, vec![vec![1, -32768]]).unwrap();
        let mut window = PcmWindow::new(SampleKind::Int, 1);
        assert_eq!(source.read_window(0, 8, &mut window).unwrap(), 2);
        assert_eq!(window, PcmWindow::Int(vec![vec![1 << 16, i32::MIN]]));
    }

    #[test]
    fn test_read_window_clamps_at_end() {
        let mut source =
            MemorySource::from_float(48000, vec![vec![0.0, 0.1, 0.2], vec![0.3, 0.4, 0.5]])
                .unwrap();
        let mut window = PcmWindow::new(SampleKind::Float, 2);

        assert_eq!(source.read_window(1, 10, &mut window).unwrap(), 2);
        assert_eq!(
            window,
            PcmWindow::Float(vec![vec![0.1, 0.2], vec![0.4, 0.5]])
        );
        assert_eq!(source.read_window(3, 10, &mut window).unwrap(), 0);
        assert!(window.is_empty());
    }

    #[test]
    fn test_rejects_ragged_channels() {
        assert!(MemorySource::from_float(48000, vec![vec![0.0; 3], vec![0.0; 2]]).is_err());
        assert!(MemorySource::from_float(48000, vec![]).is_err());
    }
}
