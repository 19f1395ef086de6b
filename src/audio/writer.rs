//! 音频写出模块
//!
//! 重写阶段使用的编码器：WAV 通过 hound，FLAC 通过 flacenc。
//! 写出器在创建时即以截断方式打开目标文件。

use super::format::{AudioFormat, SampleEncoding, SampleKind};
use super::source::PcmWindow;
use crate::error::{self, AudioError, AudioResult};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// 写出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContainer {
    Wav,
    Flac,
}

impl OutputContainer {
    /// 根据扩展名选择容器；未知扩展名返回 `None`
    pub fn for_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "wav" => Some(Self::Wav),
            "flac" => Some(Self::Flac),
            _ => None,
        }
    }
}

/// 流式音频写出器
pub trait AudioWriter {
    /// 写出窗口中 `[start, start + count)` 的帧
    fn write(&mut self, window: &PcmWindow, start: usize, count: usize) -> AudioResult<()>;

    /// 完成编码并刷新到磁盘
    fn finalize(self: Box<Self>) -> AudioResult<()>;
}

/// 为 `path` 创建写出器（截断已有内容）
///
/// 扩展名不受支持时返回 `Ok(None)`，且不会触碰文件。
pub fn create_writer(path: &Path, format: &AudioFormat) -> AudioResult<Option<Box<dyn AudioWriter>>> {
    let Some(container) = OutputContainer::for_path(path) else {
        return Ok(None);
    };
    ensure_encodable(container, format)?;

    let writer: Box<dyn AudioWriter> = match container {
        OutputContainer::Wav => Box::new(WavFileWriter::create(path, format)?),
        OutputContainer::Flac => Box::new(FlacFileWriter::create(path, format)?),
    };
    Ok(Some(writer))
}

/// 检查 `format` 能否按原样写回 `container`（在触碰文件之前调用）
///
/// 只接受能逐样本无损写回的组合：WAV 为线性整数PCM或32位浮点，
/// FLAC 为24位及以下的线性整数PCM。
pub fn ensure_encodable(container: OutputContainer, format: &AudioFormat) -> AudioResult<()> {
    if format.encoding != SampleEncoding::Linear {
        return Err(AudioError::EncodingError(format!(
            "无法按原编码写回 {:?} 样本 / cannot re-encode {:?} samples",
            format.encoding, format.encoding
        )));
    }
    let supported = match (container, format.sample_kind) {
        (OutputContainer::Wav, SampleKind::Int) => true,
        (OutputContainer::Wav, SampleKind::Float) => format.bits_per_sample == 32,
        (OutputContainer::Flac, SampleKind::Int) => format.bits_per_sample <= 24,
        (OutputContainer::Flac, SampleKind::Float) => false,
    };
    if !supported {
        return Err(AudioError::EncodingError(format!(
            "{container:?} 无法无损写回 {}位 {:?} 样本 / lossless rewrite unsupported",
            format.bits_per_sample, format.sample_kind
        )));
    }
    Ok(())
}

fn open_truncated(path: &Path) -> AudioResult<File> {
    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}

// ==================== WAV ====================

struct WavFileWriter {
    writer: hound::WavWriter<BufWriter<File>>,
    shift: u32,
    channels: usize,
}

impl WavFileWriter {
    fn create(path: &Path, format: &AudioFormat) -> AudioResult<Self> {
        let spec = hound::WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: format.bits_per_sample,
            sample_format: match format.sample_kind {
                SampleKind::Int => hound::SampleFormat::Int,
                SampleKind::Float => hound::SampleFormat::Float,
            },
        };
        let file = open_truncated(path)?;
        let writer = hound::WavWriter::new(BufWriter::new(file), spec)
            .map_err(|e| error::encoding_error("创建WAV写出器失败", e))?;
        Ok(Self {
            writer,
            shift: format.left_justify_shift(),
            channels: format.channels_usize(),
        })
    }
}

impl AudioWriter for WavFileWriter {
    fn write(&mut self, window: &PcmWindow, start: usize, count: usize) -> AudioResult<()> {
        check_layout(window, self.channels)?;
        match window {
            PcmWindow::Int(chs) => {
                for frame in start..start + count {
                    for ch in chs {
                        self.writer
                            .write_sample(ch[frame] >> self.shift)
                            .map_err(|e| error::encoding_error("写入WAV样本失败", e))?;
                    }
                }
            }
            PcmWindow::Float(chs) => {
                for frame in start..start + count {
                    for ch in chs {
                        self.writer
                            .write_sample(ch[frame])
                            .map_err(|e| error::encoding_error("写入WAV样本失败", e))?;
                    }
                }
            }
        }
        Ok(())
    }

    fn finalize(self: Box<Self>) -> AudioResult<()> {
        self.writer
            .finalize()
            .map_err(|e| error::encoding_error("完成WAV写出失败", e))
    }
}

// ==================== FLAC ====================

/// FLAC 写出器
///
/// flacenc 需要完整的样本序列才能编码，因此先缓冲交错样本，
/// 在 `finalize` 时一次性编码并写入。
struct FlacFileWriter {
    file: File,
    interleaved: Vec<i32>,
    shift: u32,
    channels: usize,
    bits_per_sample: usize,
    sample_rate: usize,
}

impl FlacFileWriter {
    fn create(path: &Path, format: &AudioFormat) -> AudioResult<Self> {
        Ok(Self {
            file: open_truncated(path)?,
            interleaved: Vec::new(),
            shift: format.left_justify_shift(),
            channels: format.channels_usize(),
            bits_per_sample: format.bits_per_sample as usize,
            sample_rate: format.sample_rate as usize,
        })
    }
}

impl AudioWriter for FlacFileWriter {
    fn write(&mut self, window: &PcmWindow, start: usize, count: usize) -> AudioResult<()> {
        check_layout(window, self.channels)?;
        let PcmWindow::Int(chs) = window else {
            return Err(AudioError::EncodingError(
                "FLAC写出器只接受整数样本".to_string(),
            ));
        };
        self.interleaved.reserve(count * self.channels);
        for frame in start..start + count {
            for ch in chs {
                self.interleaved.push(ch[frame] >> self.shift);
            }
        }
        Ok(())
    }

    fn finalize(mut self: Box<Self>) -> AudioResult<()> {
        use flacenc::component::BitRepr;
        use flacenc::error::Verify;

        let config = flacenc::config::Encoder::default()
            .into_verified()
            .map_err(|(_, e)| error::encoding_error("FLAC编码配置无效", e))?;
        let source = flacenc::source::MemSource::from_samples(
            &self.interleaved,
            self.channels,
            self.bits_per_sample,
            self.sample_rate,
        );
        let stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
            .map_err(|e| error::encoding_error("FLAC编码失败", e))?;

        let mut sink = flacenc::bitsink::ByteSink::new();
        stream
            .write(&mut sink)
            .map_err(|_| AudioError::EncodingError("FLAC比特流输出失败".to_string()))?;

        self.file.write_all(sink.as_slice())?;
        self.file.flush()?;
        Ok(())
    }
}

fn check_layout(window: &PcmWindow, channels: usize) -> AudioResult<()> {
    if window.channels() != channels {
        return Err(AudioError::EncodingError(format!(
            "声道数不匹配: 写出器 {channels}, 窗口 {}",
            window.channels()
        )));
    }
    Ok(())
}
