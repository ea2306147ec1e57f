//! # 解析配置
//!
//! 控制 DDB 解析行为的选项：前导行数、q 点标记以及原子序数的整数化策略。
//!
//! ## 依赖关系
//! - 被 `parsers/header.rs`, `parsers/qpoints.rs`, `parsers/ddb.rs` 使用
//! - 由 `commands/` 根据命令行参数构造

use serde::{Deserialize, Serialize};

/// 非整数原子序数 (znucl) 的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZnuclPolicy {
    /// 遇到非整数值直接报错
    #[default]
    Strict,
    /// 向零截断，并输出警告
    Truncate,
}

/// DDB 解析选项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseOptions {
    /// 文件开头固定格式的前导行数
    pub preamble_lines: usize,

    /// q 点记录行的标记 token
    pub qpoint_marker: String,

    /// 原子序数整数化策略
    pub znucl_policy: ZnuclPolicy,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            preamble_lines: 6,
            qpoint_marker: "qpt".to_string(),
            znucl_policy: ZnuclPolicy::Strict,
        }
    }
}

impl ParseOptions {
    pub fn with_znucl_policy(mut self, policy: ZnuclPolicy) -> Self {
        self.znucl_policy = policy;
        self
    }

    pub fn with_qpoint_marker(mut self, marker: impl Into<String>) -> Self {
        self.qpoint_marker = marker.into();
        self
    }
}
