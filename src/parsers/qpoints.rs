//! # DDB q 点提取器
//!
//! 扫描整个 DDB 文件，收集以 `qpt` 开头的记录行。
//!
//! ## 记录格式
//! ```text
//!  2nd derivatives (non-stat.)  - # elements :      36
//!  qpt  2.50000000E-01  0.00000000E+00  0.00000000E+00   1.0
//! ```
//! 同一个 q 点会在每个导数块中重复出现，按去掉标记后的原始文本去重
//! （文本不同但数值相同的两行会被当作两个 q 点，这是与旧格式保持一致的行为）。
//! 末尾的权重会被解析但不保留。
//!
//! ## 依赖关系
//! - 被 `parsers/ddb.rs` 使用
//! - 使用 `parsers/tokens.rs`, `models/qpoints.rs`

use super::tokens::parse_number;
use crate::error::{DdbError, Result};
use crate::models::QPointList;

use log::debug;
use std::collections::HashSet;

/// 从文件内容中提取 q 点
pub fn extract_qpoints(content: &str, marker: &str) -> Result<QPointList> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut points = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some(marker) {
            continue;
        }

        let record = line[marker.len()..].trim();
        if !seen.insert(record) {
            continue;
        }

        let (coords, _weight) =
            parse_record(record).map_err(|reason| DdbError::parse(idx + 1, line, reason))?;
        points.push(coords);
    }

    debug!("extracted {} unique q-points", points.len());
    Ok(QPointList::new(points))
}

/// 解析 `x y z w` 四个数值
fn parse_record(record: &str) -> std::result::Result<([f64; 3], f64), String> {
    let values = record
        .split_whitespace()
        .map(|tok| {
            parse_number(tok)
                .map(|n| n.as_f64())
                .ok_or_else(|| format!("non-numeric token '{}' in q-point record", tok))
        })
        .collect::<std::result::Result<Vec<f64>, String>>()?;

    if values.len() != 4 {
        return Err(format!(
            "q-point record must have 4 values (3 coordinates + weight), found {}",
            values.len()
        ));
    }

    Ok(([values[0], values[1], values[2]], values[3]))
}
