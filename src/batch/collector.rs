//! # 文件收集器
//!
//! 根据输入路径和模式收集待处理文件列表。
//!
//! ## 功能
//! - 支持单文件和目录输入
//! - glob 模式匹配（逗号分隔多个模式）
//! - 递归目录搜索
//! - 排除已生成的 `.grd` 文件
//!
//! ## 依赖关系
//! - 被 `commands/grd.rs` 调用
//! - 使用 `walkdir` 遍历目录, `glob` 匹配文件名

use crate::error::{Result, VaspGridError};

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 文件收集器
pub struct FileCollector {
    /// 输入路径
    input: PathBuf,
    /// 匹配模式列表
    patterns: Vec<Pattern>,
    /// 排除的扩展名
    exclude_extensions: Vec<String>,
    /// 是否递归
    recursive: bool,
}

impl FileCollector {
    /// 创建新的文件收集器，默认匹配所有文件
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: Vec::new(),
            exclude_extensions: Vec::new(),
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.patterns = pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Pattern::new(s).map_err(|e| {
                    VaspGridError::InvalidArgument(format!("Invalid pattern '{}': {}", s, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self)
    }

    /// 排除某个扩展名（不含点）
    pub fn exclude_extension(mut self, ext: &str) -> Self {
        self.exclude_extensions.push(ext.to_lowercase());
        self
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 收集所有匹配的文件（按路径排序）
    pub fn collect(&self) -> Vec<PathBuf> {
        if self.input.is_file() {
            return vec![self.input.clone()];
        }

        if !self.input.is_dir() {
            return vec![];
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|entry| self.matches(entry.path()))
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        files
    }

    /// 检查文件是否匹配任一模式且未被排除
    fn matches(&self, path: &Path) -> bool {
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };

        let excluded = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.exclude_extensions.contains(&e.to_lowercase()))
            .unwrap_or(false);
        if excluded {
            return false;
        }

        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_with_patterns() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["CHGCAR", "CHGCAR_mag", "CHGCAR.grd", "AECCAR0", "DOSCAR"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("CHGCAR"), "").unwrap();

        let files = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("CHGCAR*, AECCAR?")
            .unwrap()
            .exclude_extension("grd")
            .collect();
        let names: Vec<&str> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["AECCAR0", "CHGCAR", "CHGCAR_mag"]);

        let recursive = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("CHGCAR")
            .unwrap()
            .recursive(true)
            .collect();
        assert_eq!(recursive.len(), 2);
    }

    #[test]
    fn test_single_file_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DOSCAR");
        fs::write(&path, "").unwrap();
        let files = FileCollector::new(path.clone())
            .with_pattern("CHGCAR*")
            .unwrap()
            .collect();
        assert_eq!(files, vec![path]);
    }

    #[test]
    fn test_invalid_pattern() {
        let result = FileCollector::new(PathBuf::from(".")).with_pattern("CHG[");
        assert!(matches!(result, Err(VaspGridError::InvalidArgument(_))));
    }
}
