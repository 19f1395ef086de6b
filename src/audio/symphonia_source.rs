//! symphonia样本源
//!
//! 为 FLAC（以及 hound 无法处理的 WAV 变体）提供可随机定位的窗口读取。
//! 解码后的最近一个包缓存在 `carry` 中，顺序读取时无需重复定位；
//! 反向扫描时每个窗口都会触发一次精确定位（`SeekMode::Accurate`）。

use super::error_handling::handle_symphonia_error;
use super::format::{AudioFormat, SampleEncoding, SampleKind};
use super::source::{PcmWindow, SampleSource};
use crate::error::{self, AudioError, AudioResult};
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, SampleBuffer, SignalSpec};
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions};
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::conv::ConvertibleSample;
use symphonia::core::sample::Sample;

/// symphonia 样本源
pub struct SymphoniaSource {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    format: AudioFormat,
    /// 最近一次解码的包（平面格式）
    carry: PcmWindow,
    /// `carry` 首帧的绝对位置
    carry_start: u64,
    /// `carry` 末帧之后的绝对位置（下一个包的预期起点）
    cursor: u64,
    int_scratch: Option<Scratch<i32>>,
    float_scratch: Option<Scratch<f32>>,
}

impl SymphoniaSource {
    /// 打开文件、探测格式并创建解码器
    pub fn open(path: &Path) -> AudioResult<Self> {
        let (reader, track_id, codec_params) = probe(path)?;

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| error::format_error("创建解码器失败", e))?;

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| AudioError::FormatError("无法获取采样率信息".to_string()))?;
        let channels = codec_params
            .channels
            .map(|ch| ch.count())
            .ok_or_else(|| AudioError::FormatError("无法获取声道数信息".to_string()))?
            as u16;
        let (sample_kind, bits_per_sample) = detect_sample_layout(&codec_params);

        // FLAC STREAMINFO 中总帧数可能为0（未知），此时完整遍历一次计数
        let sample_count = match codec_params.n_frames {
            Some(n) if n > 0 => n,
            _ => count_frames(path)?,
        };

        let format = AudioFormat::new(
            sample_rate,
            channels,
            bits_per_sample,
            sample_count,
            sample_kind,
        )
        .with_encoding(detect_encoding(&codec_params));
        format.validate()?;

        Ok(Self {
            reader,
            decoder,
            track_id,
            carry: PcmWindow::new(sample_kind, channels as usize),
            carry_start: 0,
            cursor: 0,
            format,
            int_scratch: None,
            float_scratch: None,
        })
    }

    /// 精确定位到 `ts`，清空包缓存
    fn seek_to(&mut self, ts: u64) -> AudioResult<()> {
        let seeked = self
            .reader
            .seek(
                SeekMode::Accurate,
                SeekTo::TimeStamp {
                    ts,
                    track_id: self.track_id,
                },
            )
            .map_err(|e| error::decoding_error("定位失败", e))?;
        self.decoder.reset();
        self.carry.clear();
        self.carry_start = seeked.actual_ts;
        self.cursor = seeked.actual_ts;
        Ok(())
    }

    /// 解码下一个属于本轨道的包到 `carry`
    ///
    /// 返回 `Ok(None)` 表示文件结束。
    fn decode_next(&mut self) -> AudioResult<Option<usize>> {
        loop {
            let packet = match handle_symphonia_error!(self.reader.next_packet(), self.decoder) {
                Some(packet) => packet,
                None => continue,
            };
            if packet.track_id() != self.track_id {
                continue;
            }

            let ts = packet.ts();
            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let frames = decoded.frames();
                    fill_carry(
                        decoded,
                        &mut self.int_scratch,
                        &mut self.float_scratch,
                        &mut self.carry,
                    );
                    self.carry_start = ts;
                    self.cursor = ts + frames as u64;
                    return Ok(Some(frames));
                }
                Err(symphonia::core::errors::Error::DecodeError(msg)) => {
                    tracing::debug!("跳过无法解码的包 (ts={ts}): {msg}");
                    continue;
                }
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(AudioError::from(e)),
            }
        }
    }
}

impl SampleSource for SymphoniaSource {
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
        let end = start + (count as u64).min(total - start);

        // 目标不在缓存包内且不是顺序续读时才定位
        if start < self.carry_start || start > self.cursor {
            self.seek_to(start)?;
        }

        let mut pos = start;
        while pos < end {
            if pos >= self.carry_start && pos < self.cursor {
                let offset = (pos - self.carry_start) as usize;
                let n = (self.cursor.min(end) - pos) as usize;
                window.append_range(&self.carry, offset, n)?;
                pos += n as u64;
                continue;
            }
            if pos < self.carry_start {
                return Err(error::decoding_error(
                    "定位后首包越过目标位置",
                    format!("目标 {pos}, 包起点 {}", self.carry_start),
                ));
            }
            if self.decode_next()?.is_none() {
                break;
            }
        }

        Ok(window.frames())
    }
}

/// 探测容器并返回首个音频轨道
fn probe(path: &Path) -> AudioResult<(Box<dyn FormatReader>, u32, CodecParameters)> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension() {
        hint.with_extension(&extension.to_string_lossy());
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| error::format_error("格式探测失败", e))?;

    let reader = probed.format;
    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::FormatError("未找到音频轨道".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    Ok((reader, track_id, codec_params))
}

/// 容器未声明总帧数时，遍历所有包累计时长
fn count_frames(path: &Path) -> AudioResult<u64> {
    let (mut reader, track_id, _) = probe(path)?;
    let mut frames = 0u64;
    loop {
        match reader.next_packet() {
            Ok(packet) if packet.track_id() == track_id => frames += packet.dur(),
            Ok(_) => continue,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(error::decoding_error("统计帧数失败", e)),
        }
    }
    Ok(frames)
}

/// 根据编解码器推断样本类型与位深
fn detect_sample_layout(codec_params: &CodecParameters) -> (SampleKind, u16) {
    use symphonia::core::codecs::{
        CODEC_TYPE_PCM_F32BE, CODEC_TYPE_PCM_F32LE, CODEC_TYPE_PCM_F64BE, CODEC_TYPE_PCM_F64LE,
        CODEC_TYPE_PCM_S16BE, CODEC_TYPE_PCM_S16LE, CODEC_TYPE_PCM_S24BE, CODEC_TYPE_PCM_S24LE,
    };

    match codec_params.codec {
        CODEC_TYPE_PCM_F32LE | CODEC_TYPE_PCM_F32BE => (SampleKind::Float, 32),
        CODEC_TYPE_PCM_F64LE | CODEC_TYPE_PCM_F64BE => (SampleKind::Float, 64),
        codec => {
            let bits = codec_params.bits_per_sample.map(|b| b as u16).unwrap_or(
                match codec {
                    CODEC_TYPE_PCM_S16LE | CODEC_TYPE_PCM_S16BE => 16,
                    CODEC_TYPE_PCM_S24LE | CODEC_TYPE_PCM_S24BE => 24,
                    _ => 32,
                },
            );
            (SampleKind::Int, bits)
        }
    }
}

/// A-law / μ-law 在解码时已展开，原编码无法按线性PCM写回
fn detect_encoding(codec_params: &CodecParameters) -> SampleEncoding {
    use symphonia::core::codecs::{CODEC_TYPE_PCM_ALAW, CODEC_TYPE_PCM_MULAW};

    match codec_params.codec {
        CODEC_TYPE_PCM_ALAW | CODEC_TYPE_PCM_MULAW => SampleEncoding::Companded,
        _ => SampleEncoding::Linear,
    }
}

/// 把解码缓冲转换为本源的样本类型并写入 `carry`
///
/// symphonia 的整数转换是左对齐的（i16 → i32 即 `<< 16`），与窗口约定一致。
fn fill_carry(
    decoded: AudioBufferRef<'_>,
    int_scratch: &mut Option<Scratch<i32>>,
    float_scratch: &mut Option<Scratch<f32>>,
    carry: &mut PcmWindow,
) {
    carry.clear();
    let frames = decoded.frames();
    let spec = *decoded.spec();
    let capacity = decoded.capacity() as u64;

    match carry {
        PcmWindow::Int(chs) => {
            let buf = scratch_for(int_scratch, capacity, spec);
            buf.copy_planar_ref(decoded);
            split_planar(buf.samples(), frames, chs);
        }
        PcmWindow::Float(chs) => {
            let buf = scratch_for(float_scratch, capacity, spec);
            buf.copy_planar_ref(decoded);
            split_planar(buf.samples(), frames, chs);
        }
    }
}

/// 平面排列的样本按声道拆开
fn split_planar<T: Copy>(planar: &[T], frames: usize, channels: &mut [Vec<T>]) {
    for (ch, samples) in channels.iter_mut().zip(planar.chunks_exact(frames.max(1))) {
        ch.extend_from_slice(samples);
    }
}

/// 转换缓冲及其对应的信号规格
type Scratch<T> = (SignalSpec, SampleBuffer<T>);

/// 复用转换缓冲；容量不足或信号规格变化时重建
fn scratch_for<T: Sample + ConvertibleSample>(
    slot: &mut Option<Scratch<T>>,
    capacity: u64,
    spec: SignalSpec,
) -> &mut SampleBuffer<T> {
    let needed = capacity as usize * spec.channels.count();
    let stale = slot
        .as_ref()
        .is_none_or(|(old, buf)| buf.capacity() < needed || *old != spec);
    if stale {
        *slot = None;
    }
    &mut slot.get_or_insert_with(|| (spec, SampleBuffer::new(capacity, spec))).1
}
