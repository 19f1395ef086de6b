//! WAV样本源
//!
//! 基于hound库实现可随机定位的窗口读取。

use super::format::{AudioFormat, SampleKind};
use super::source::{PcmWindow, SampleSource};
use crate::error::{AudioError, AudioResult};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// hound WAV样本源
///
/// 支持8-32位整数PCM与32位浮点PCM；整数样本左对齐到 i32。
pub struct HoundSource {
    reader: hound::WavReader<BufReader<File>>,
    format: AudioFormat,
    /// 交错读取的中间缓冲（复用，避免每窗口分配）
    interleaved_int: Vec<i32>,
    interleaved_float: Vec<f32>,
}

impl HoundSource {
    /// 打开WAV文件并读取头信息
    pub fn open(path: &Path) -> AudioResult<Self> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let sample_kind = match spec.sample_format {
            hound::SampleFormat::Int => SampleKind::Int,
            hound::SampleFormat::Float => SampleKind::Float,
        };
        if sample_kind == SampleKind::Float && spec.bits_per_sample != 32 {
            return Err(AudioError::FormatError(format!(
                "hound仅支持32位浮点WAV，实际: {}位",
                spec.bits_per_sample
            )));
        }

        let format = AudioFormat::new(
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample,
            reader.duration() as u64,
            sample_kind,
        );
        format.validate()?;

        Ok(Self {
            reader,
            format,
            interleaved_int: Vec::new(),
            interleaved_float: Vec::new(),
        })
    }
}

impl SampleSource for HoundSource {
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
        if start >= total || count == 0 {
            return Ok(0);
        }

        let frames = ((total - start) as usize).min(count);
        let channels = self.format.channels_usize();
        let start = u32::try_from(start)
            .map_err(|_| AudioError::FormatError(format!("WAV定位越界: {start}")))?;
        self.reader.seek(start)?;

        match window {
            PcmWindow::Int(chs) => {
                let shift = self.format.left_justify_shift();
                self.interleaved_int.clear();
                for sample in self.reader.samples::<i32>().take(frames * channels) {
                    self.interleaved_int.push(sample? << shift);
                }
                deinterleave(&self.interleaved_int, chs);
            }
            PcmWindow::Float(chs) => {
                self.interleaved_float.clear();
                for sample in self.reader.samples::<f32>().take(frames * channels) {
                    self.interleaved_float.push(sample?);
                }
                deinterleave(&self.interleaved_float, chs);
            }
        }

        Ok(window.frames())
    }
}

/// 交错样本拆分为平面声道（不完整的尾帧被丢弃）
fn deinterleave<T: Copy>(interleaved: &[T], channels: &mut [Vec<T>]) {
    let channel_count = channels.len();
    for frame in interleaved.chunks_exact(channel_count) {
        for (ch, &sample) in channels.iter_mut().zip(frame) {
            ch.push(sample);
        }
    }
}
