//! # inspect 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/inspect.rs`

use super::ParseArgs;
use clap::Args;
use std::path::PathBuf;

/// inspect 子命令参数
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the DDB file
    pub ddb: PathBuf,

    /// Also print header keys without a typed field
    #[arg(long, default_value_t = false)]
    pub all_keys: bool,

    #[command(flatten)]
    pub parse: ParseArgs,
}
