//! # 批量处理模块
//!
//! 对目录中的多个 DDB 文件并行执行同一操作。
//!
//! ## 功能
//! - 按 glob 模式收集文件
//! - 并行处理，每个文件独立打开
//! - 进度反馈与失败汇总
//!
//! ## 依赖关系
//! - 被 `commands/summary.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchResult, BatchRunner, ProcessResult};
