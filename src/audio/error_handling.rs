//! 错误处理模块
//!
//! 提供统一的symphonia包读取错误处理宏
//! 注意：此模块仅供symphonia样本源内部使用

/// 🔧 统一的symphonia包读取错误处理宏
///
/// - `ResetRequired`：重置解码器后继续读取（返回 `None`）
/// - `UnexpectedEof`：文件结束，使所在函数返回 `Ok(None)`
/// - `DecodeError`：跳过损坏的包（返回 `None`）
/// - 其他错误：转换为 `AudioError` 并返回
macro_rules! handle_symphonia_error {
    ($result:expr, $decoder:expr) => {
        match $result {
            Ok(value) => Some(value),
            Err(symphonia::core::errors::Error::ResetRequired) => {
                $decoder.reset();
                None
            }
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                return Ok(None);
            }
            Err(symphonia::core::errors::Error::DecodeError(msg)) => {
                tracing::debug!("跳过损坏的音频包: {msg}");
                None
            }
            Err(e) => return Err(AudioError::from(e)),
        }
    };
}

// 使宏在当前模块可见，但不对外暴露
pub(super) use handle_symphonia_error;
