//! 音频格式信息模块
//!
//! 定义音频格式相关的数据结构和格式支持信息

use crate::error::{self, AudioResult};
use serde::Serialize;

/// 样本存储类型
///
/// 整数PCM在窗口中以左对齐的 `i32` 表示（满幅 = 2^31），
/// 浮点PCM以 `f32` 表示（满幅 = 1.0）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SampleKind {
    Int,
    Float,
}

/// 源文件中样本的编码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SampleEncoding {
    /// 线性PCM（含FLAC）
    #[default]
    Linear,
    /// A-law / μ-law 压扩编码，解码后已展开为线性PCM
    Companded,
}

/// 音频格式信息
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    /// 源音频的位深度（来自解码器/容器元数据）
    pub bits_per_sample: u16,
    /// 每声道样本数（帧数）
    pub sample_count: u64,
    pub sample_kind: SampleKind,
    pub encoding: SampleEncoding,
}

impl AudioFormat {
    /// 创建新的音频格式
    pub fn new(
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
        sample_count: u64,
        sample_kind: SampleKind,
    ) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
            sample_count,
            sample_kind,
            encoding: SampleEncoding::Linear,
        }
    }

    /// 指定源编码方式
    pub fn with_encoding(mut self, encoding: SampleEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// 验证格式参数的有效性
    pub fn validate(&self) -> AudioResult<()> {
        if self.sample_rate == 0 {
            return Err(error::format_error("采样率不能为0", ""));
        }
        if self.channels == 0 {
            return Err(error::format_error("声道数不能为0", ""));
        }
        let supported = match self.sample_kind {
            SampleKind::Int => (8..=32).contains(&self.bits_per_sample),
            SampleKind::Float => matches!(self.bits_per_sample, 32 | 64),
        };
        if !supported {
            return Err(error::format_error(
                "不支持的位深度",
                format!("{}位 ({:?})", self.bits_per_sample, self.sample_kind),
            ));
        }
        Ok(())
    }

    /// 整数PCM左对齐到 i32 所需的移位数
    #[inline]
    pub fn left_justify_shift(&self) -> u32 {
        32u32.saturating_sub(self.bits_per_sample as u32)
    }

    /// 获取声道数（usize类型）
    ///
    /// 辅助方法，用于数组索引和循环边界，避免重复的类型转换
    pub fn channels_usize(&self) -> usize {
        self.channels as usize
    }
}

/// 格式支持信息
#[derive(Debug, Clone)]
pub struct FormatSupport {
    /// 支持的文件扩展名
    pub extensions: &'static [&'static str],
}

/// 本工具接受的容器扩展名
pub const SUPPORTED_FORMATS: FormatSupport = FormatSupport {
    extensions: &["wav", "flac"],
};

impl FormatSupport {
    /// 判断路径扩展名是否受支持（大小写不敏感）
    pub fn accepts(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.contains(&ext.as_str()))
    }
}
