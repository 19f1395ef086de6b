//! 工具函数模块
//!
//! 提供并发度计算、字节/时长格式化、文件路径处理等通用工具函数。

use super::constants::parallel_limits::{MAX_PARALLEL_DEGREE, MIN_PARALLEL_DEGREE};

/// 计算有效的并行度
///
/// 未指定时使用可用并行度；结果钳制到 `[1, 16]`。
pub fn effective_parallel_degree(requested: Option<usize>) -> usize {
    let degree = requested.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(MIN_PARALLEL_DEGREE)
    });
    degree.clamp(MIN_PARALLEL_DEGREE, MAX_PARALLEL_DEGREE)
}

/// 格式化工具函数
pub mod format {
    /// 字节数转换为人类可读格式（B / KB / MB / GB）
    pub fn format_bytes(bytes: u64) -> String {
        const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
        if bytes < 1024 {
            return format!("{bytes} B");
        }
        let mut value = bytes as f64 / 1024.0;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        format!("{value:.2} {}", UNITS[unit])
    }

    /// 秒数格式化（毫秒精度）
    pub fn format_seconds(seconds: f64) -> String {
        format!("{seconds:.3}")
    }

    /// 截断（而非四舍五入）到指定小数位
    pub fn truncate_decimals(value: f64, decimals: u32) -> String {
        let factor = 10f64.powi(decimals as i32);
        let truncated = (value * factor).trunc() / factor;
        format!("{truncated:.prec$}", prec = decimals as usize)
    }
}

/// 文件路径处理工具函数
pub mod path {
    use std::path::{Path, PathBuf};

    /// 提取文件名（返回String，用于日志显示）
    #[inline]
    pub fn extract_filename_lossy(path: &Path) -> String {
        path.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    /// 确保导出路径带有指定扩展名（大小写不敏感），缺失时追加
    pub fn ensure_extension(path: &Path, extension: &str) -> PathBuf {
        let has_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if has_extension {
            path.to_path_buf()
        } else {
            let mut name = path.as_os_str().to_os_string();
            name.push(".");
            name.push(extension);
            PathBuf::from(name)
        }
    }
}

// 重新导出为平级函数
pub use format::{format_bytes, format_seconds, truncate_decimals};
pub use path::{ensure_extension, extract_filename_lossy};
