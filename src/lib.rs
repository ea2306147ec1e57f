//! # ddbtool - ABINIT DDB 文件读取库
//!
//! 解析 ABINIT 导数数据库 (DDB) 文本文件，构建晶体结构、q 点列表，
//! 推断 q 网格，并定义与外部后处理程序 anaddb 的接口。
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── parsers/   (逐行分类、头部、q 点、DdbFile 会话)
//!   ├── models/    (晶体结构、对称操作、q 点列表)
//!   ├── phonon/    (q 网格推断、Born 有效电荷)
//!   ├── anaddb/    (外部后处理接口)
//!   ├── batch/     (批量文件收集与并行执行)
//!   ├── utils/     (终端输出、进度条)
//!   └── error.rs   (错误处理)
//! ```

pub mod anaddb;
pub mod batch;
pub mod error;
pub mod models;
pub mod parsers;
pub mod phonon;
pub mod utils;

pub use error::{DdbError, Result};
pub use parsers::{DdbFile, ParseOptions};
