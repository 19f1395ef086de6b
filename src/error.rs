//! 统一错误处理框架
//!
//! 单文件失败（解码、重写）只影响该文件，不会中止整个批次；
//! 只有配置校验错误会在任何扫描开始前返回给用户。

use std::fmt;
use std::io;
use thiserror::Error;

/// 音频处理相关的统一错误类型
#[derive(Debug, Error)]
pub enum AudioError {
    /// 输入验证错误（命令行参数、配置范围）
    #[error("输入验证失败 / Invalid input: {0}")]
    InvalidInput(String),

    /// 文件I/O错误
    #[error("文件I/O错误 / I/O error: {0}")]
    IoError(#[from] io::Error),

    /// 音频格式错误（容器头损坏、扩展名不受支持）
    #[error("音频格式错误 / Format error: {0}")]
    FormatError(String),

    /// 解码错误
    #[error("音频解码失败 / Decoding error: {0}")]
    DecodingError(String),

    /// 编码错误（重写阶段）
    #[error("音频编码失败 / Encoding error: {0}")]
    EncodingError(String),

    /// 资源访问错误（线程池等）
    #[error("资源访问错误 / Resource error: {0}")]
    ResourceError(String),
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => AudioError::IoError(e),
            other => AudioError::DecodingError(format!("WAV解码错误: {other}")),
        }
    }
}

impl From<symphonia::core::errors::Error> for AudioError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        use symphonia::core::errors::Error as SymphoniaError;
        match err {
            SymphoniaError::IoError(e) => AudioError::IoError(e),
            SymphoniaError::Unsupported(what) => {
                AudioError::FormatError(format!("不支持的格式特性: {what}"))
            }
            other => AudioError::DecodingError(format!("symphonia错误: {other}")),
        }
    }
}

/// 音频处理操作的标准Result类型
pub type AudioResult<T> = Result<T, AudioError>;

// ==================== 错误转换Helper函数 ====================
// 消除重复的 .map_err(|e| AudioError::XXX(format!(...))) 模式

/// 创建格式错误的helper函数
#[inline]
pub fn format_error<E: fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::FormatError(format!("{context}: {err}"))
}

/// 创建解码错误的helper函数
#[inline]
pub fn decoding_error<E: fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::DecodingError(format!("{context}: {err}"))
}

/// 创建编码错误的helper函数
#[inline]
pub fn encoding_error<E: fmt::Debug>(context: &str, err: E) -> AudioError {
    AudioError::EncodingError(format!("{context}: {err:?}"))
}

// ==================== 错误分类系统 ====================
// 用于批量处理中的错误统计和退出码映射

/// 错误类别枚举
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum ErrorCategory {
    /// 格式相关错误（不支持的格式、格式损坏等）
    Format,
    /// 解码相关错误
    Decoding,
    /// 编码相关错误
    Encoding,
    /// I/O相关错误（文件不存在、权限不足等）
    Io,
    /// 其他未分类错误
    Other,
}

impl ErrorCategory {
    /// 从AudioError提取错误类别
    pub fn from_audio_error(e: &AudioError) -> Self {
        match e {
            AudioError::FormatError(_) => Self::Format,
            AudioError::DecodingError(_) => Self::Decoding,
            AudioError::EncodingError(_) => Self::Encoding,
            AudioError::IoError(_) => Self::Io,
            AudioError::InvalidInput(_) | AudioError::ResourceError(_) => Self::Other,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Format => "格式错误 / Format",
            Self::Decoding => "解码错误 / Decoding",
            Self::Encoding => "编码错误 / Encoding",
            Self::Io => "I/O错误 / I/O",
            Self::Other => "其他错误 / Other",
        }
    }
}
