//! # 解析器模块
//!
//! 读取 ABINIT DDB 文本格式：逐行分类、头部解析与重排、q 点提取，
//! 以及把它们组合起来的文件会话 `DdbFile`。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块与库调用者使用
//! - 使用 `models/` 数据模型
//! - 子模块: tokens, options, header, qpoints, ddb

pub mod ddb;
pub mod header;
pub mod options;
pub mod qpoints;
pub mod tokens;

pub use ddb::{DdbFile, DdbSummary};
pub use header::{DdbHeader, HeaderValue};
pub use options::{ParseOptions, ZnuclPolicy};
