//! 音频I/O模块
//!
//! 提供按窗口随机读取PCM的样本源（WAV: hound，FLAC: symphonia）
//! 以及重写阶段使用的写出器（WAV: hound，FLAC: flacenc）。

// 内部子模块（仅供symphonia样本源使用）
mod error_handling;

pub mod format;
pub mod memory_source;
pub mod source;
pub mod symphonia_source;
pub mod wav_source;
pub mod writer;

pub use format::{AudioFormat, FormatSupport, SUPPORTED_FORMATS, SampleEncoding, SampleKind};
pub use memory_source::MemorySource;
pub use source::{PcmWindow, SampleSource, SourceOpener, UniversalOpener};
pub use writer::{AudioWriter, OutputContainer, create_writer, ensure_encodable};
