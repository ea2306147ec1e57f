//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `inspect`: 查看单个 DDB 文件的头部、结构与 q 点
//! - `qpoints`: 导出 q 点列表
//! - `summary`: 批量汇总目录下的 DDB 文件
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: inspect, qpoints, summary

pub mod inspect;
pub mod qpoints;
pub mod summary;

use clap::{Args, Parser, Subcommand};

/// ddbtool - ABINIT DDB 文件检查工具
#[derive(Parser)]
#[command(name = "ddbtool")]
#[command(version)]
#[command(about = "Inspect ABINIT derivative database (DDB) files", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Show header parameters, structure, q-points and the guessed q-mesh
    Inspect(inspect::InspectArgs),

    /// List the q-points stored in a DDB file
    Qpoints(qpoints::QpointsArgs),

    /// Summarize every DDB file found in a directory
    Summary(summary::SummaryArgs),
}

/// 所有子命令共享的解析参数
#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    /// Truncate non-integral atomic numbers (znucl) instead of failing
    #[arg(long, default_value_t = false)]
    pub truncate_znucl: bool,

    /// Leading token of q-point records
    #[arg(long, default_value = "qpt")]
    pub qpoint_marker: String,
}
