//! 输入扫描模块
//!
//! 把命令行中的文件/文件夹参数展开为工作集：
//! 文件夹递归遍历，只接受存在的 WAV/FLAC 文件，按首次出现去重。

use super::utils;
use crate::audio::SUPPORTED_FORMATS;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 展开结果
#[derive(Debug, Default)]
pub struct InputSet {
    /// 被接受的音频文件（保持参数顺序，文件夹内按路径排序）
    pub files: Vec<PathBuf>,
    /// 不存在的路径
    pub missing: Vec<PathBuf>,
    /// 存在但扩展名不受支持的文件
    pub unsupported: Vec<PathBuf>,
}

/// 展开输入参数
pub fn collect_inputs(inputs: &[PathBuf]) -> InputSet {
    let mut set = InputSet::default();
    let mut seen = HashSet::new();

    for input in inputs {
        if !input.exists() {
            tracing::warn!(path = %input.display(), "输入路径不存在");
            set.missing.push(input.clone());
            continue;
        }

        if input.is_dir() {
            for file in scan_directory(input) {
                admit(&mut set, &mut seen, file);
            }
        } else if SUPPORTED_FORMATS.accepts(input) {
            admit(&mut set, &mut seen, input.clone());
        } else {
            tracing::debug!(path = %input.display(), "扩展名不受支持，已忽略");
            set.unsupported.push(input.clone());
        }
    }

    set
}

fn admit(set: &mut InputSet, seen: &mut HashSet<PathBuf>, file: PathBuf) {
    // 以规范化路径去重（"a/../a/x.wav" 与 "a/x.wav" 视为同一文件）
    let key = file.canonicalize().unwrap_or_else(|_| file.clone());
    if seen.insert(key) {
        set.files.push(file);
    }
}

/// 递归扫描目录中的音频文件（按路径排序）
pub fn scan_directory(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "目录遍历失败，已跳过");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| SUPPORTED_FORMATS.accepts(path))
        .collect();
    files.sort();
    files
}

/// 显示文件扫描结果
pub fn show_scan_results(set: &InputSet, verbose: bool) {
    for path in &set.missing {
        println!("⚠️  路径不存在 / Path not found: {}", path.display());
    }

    if set.files.is_empty() {
        println!("⚠️  没有找到支持的音频文件 / No supported audio files found");
        println!("   支持的格式 / Supported: WAV, FLAC");
        return;
    }

    println!("🎵 找到 {} 个音频文件 / audio files found", set.files.len());
    if verbose {
        for (i, file) in set.files.iter().enumerate() {
            println!("   {}. {}", i + 1, utils::extract_filename_lossy(file));
        }
        for file in &set.unsupported {
            println!("   - 忽略 / skipped: {}", file.display());
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_walks_folders_and_dedupes() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("disc 2");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("b.wav"), b"").unwrap();
        fs::write(dir.path().join("a.FLAC"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::write(nested.join("c.wav"), b"").unwrap();

        let inputs = vec![
            dir.path().join("b.wav"),
            dir.path().to_path_buf(),
            dir.path().join("missing.wav"),
            dir.path().join("notes.txt"),
        ];
        let set = collect_inputs(&inputs);

        let names: Vec<String> = set.files.iter().map(|p| utils::extract_filename_lossy(p)).collect();
        assert_eq!(names, vec!["b.wav", "a.FLAC", "c.wav"]);
        assert_eq!(set.missing, vec![dir.path().join("missing.wav")]);
        assert_eq!(set.unsupported, vec![dir.path().join("notes.txt")]);
    }
}
