//! # 统一错误处理模块
//!
//! 定义 DDB 解析、结构构建、网格推断与外部任务的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 使用 `anaddb::JobReport` 携带外部任务诊断信息

use crate::anaddb::JobReport;
use thiserror::Error;

/// DDB 工具统一错误类型
#[derive(Error, Debug)]
pub enum DdbError {
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

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Parse error at line {line}: {reason}\n  > {content}")]
    ParseError {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("Missing mandatory header field: {field}")]
    MissingField { field: String },

    // ─────────────────────────────────────────────────────────────
    // 形状与数值校验错误
    // ─────────────────────────────────────────────────────────────
    #[error("Shape mismatch for '{field}': expected {expected}, found {found}")]
    ShapeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("Validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // q 点选择与网格推断
    // ─────────────────────────────────────────────────────────────
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("DDB contains {count} q-points and the choice is ambiguous, please specify the q-point")]
    AmbiguousSelection { count: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ─────────────────────────────────────────────────────────────
    // 外部任务错误
    // ─────────────────────────────────────────────────────────────
    #[error("Post-processing task failed:\n{0}")]
    TaskFailed(JobReport),

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

impl DdbError {
    /// 构造带行号与原始内容的解析错误
    pub fn parse(line: usize, content: &str, reason: impl Into<String>) -> Self {
        DdbError::ParseError {
            line,
            content: content.to_string(),
            reason: reason.into(),
        }
    }

    /// 构造形状不匹配错误
    pub fn shape(field: &str, expected: impl ToString, found: impl ToString) -> Self {
        DdbError::ShapeMismatch {
            field: field.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, DdbError>;
