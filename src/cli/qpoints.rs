//! # qpoints 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/qpoints.rs`

use super::ParseArgs;
use clap::Args;
use std::path::PathBuf;

/// qpoints 子命令参数
#[derive(Args, Debug)]
pub struct QpointsArgs {
    /// Path to the DDB file
    pub ddb: PathBuf,

    /// Write the q-points to a CSV file instead of the terminal
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub parse: ParseArgs,
}
