//! # 统一错误处理模块
//!
//! 定义 vaspgrid 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - I/O 错误：文件不存在、不可读、不可写
//! - 格式错误：由头部推导出的偏移与文件实际内容不一致（解析后校验时抛出）
//! - 数值错误：仅在严格模式下抛出，默认宽松模式将非法数字视为 0
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// vaspgrid 统一错误类型
#[derive(Error, Debug)]
pub enum VaspGridError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Malformed {format} file: {path}\nReason: {reason}")]
    MalformedInput {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Invalid number '{token}' in {format} file {path} (line {line})")]
    NumericParse {
        format: String,
        path: String,
        line: usize,
        token: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 数据组合错误
    // ─────────────────────────────────────────────────────────────
    #[error("Grid dimensions differ: {left} vs {right}")]
    GridMismatch { left: String, right: String },

    #[error("Structures differ between '{left}' and '{right}'")]
    StructureMismatch { left: String, right: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },

    #[error("{0}")]
    Other(String),
}

impl VaspGridError {
    /// 构造格式错误
    pub fn malformed(format: &str, path: &str, reason: impl Into<String>) -> Self {
        VaspGridError::MalformedInput {
            format: format.to_string(),
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// 是否为格式错误（头部偏移与文件长度不一致）
    pub fn is_malformed(&self) -> bool {
        matches!(self, VaspGridError::MalformedInput { .. })
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, VaspGridError>;
