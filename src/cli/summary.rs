//! # summary 子命令 CLI 定义
//!
//! 批量读取目录中的 DDB 文件并汇总为 CSV。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/summary.rs`

use super::ParseArgs;
use clap::Args;
use std::path::PathBuf;

/// summary 子命令参数
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Directory containing DDB files (a single file is also accepted)
    pub input: PathBuf,

    /// Glob pattern for DDB files (comma separated, e.g. "*_DDB,*.ddb")
    #[arg(long, default_value = "*_DDB")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Filename for the CSV summary
    #[arg(short, long, default_value = "ddb_summary.csv")]
    pub output: PathBuf,

    #[command(flatten)]
    pub parse: ParseArgs,
}
