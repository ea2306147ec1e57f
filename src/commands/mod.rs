//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `ddbtool::parsers`, `ddbtool::utils`
//! - 子模块: inspect, qpoints, summary

pub mod inspect;
pub mod qpoints;
pub mod summary;

use crate::cli::{Commands, ParseArgs};
use ddbtool::error::Result;
use ddbtool::parsers::{ParseOptions, ZnuclPolicy};

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Inspect(args) => inspect::execute(args),
        Commands::Qpoints(args) => qpoints::execute(args),
        Commands::Summary(args) => summary::execute(args),
    }
}

/// 命令行参数 → 解析选项
pub(crate) fn parse_options(args: &ParseArgs) -> ParseOptions {
    let policy = if args.truncate_znucl {
        ZnuclPolicy::Truncate
    } else {
        ZnuclPolicy::Strict
    };
    ParseOptions::default()
        .with_znucl_policy(policy)
        .with_qpoint_marker(args.qpoint_marker.clone())
}

/// 三维向量的固定宽度格式
pub(crate) fn fmt_vec3(v: &[f64; 3]) -> String {
    format!("{:10.6} {:10.6} {:10.6}", v[0], v[1], v[2])
}
