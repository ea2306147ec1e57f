//! # ddbtool - ABINIT DDB 文件检查工具
//!
//! 基于 `ddbtool` 库的命令行入口。
//!
//! ## 子命令
//! - `inspect` - 查看单个 DDB 文件
//! - `qpoints` - 导出 q 点
//! - `summary` - 批量汇总目录中的 DDB 文件
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   └── commands/   (命令执行逻辑)
//!         └── ddbtool (库：解析器、数据模型、批量处理、输出工具)
//! ```
//!
//! 日志级别由 `RUST_LOG` 控制，例如 `RUST_LOG=debug ddbtool inspect out_DDB`。

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use ddbtool::utils::output;

fn main() {
    env_logger::init();

    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
