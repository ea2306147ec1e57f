//! # DDB 行分类器
//!
//! 将 DDB 文件的一行划分为新键、续行数值、头部结束标记或空行。
//!
//! ## 数值格式
//! DDB 由 Fortran 程序写出，指数部分使用 `D` 而不是 `E`：
//! ```text
//! kpt  0.00000000000000D+00  0.25000000000000D+00  0.00000000000000D+00
//! ```
//! 解析前先把 `D+` / `D-` 改写为 `E+` / `E-`。
//!
//! ## 依赖关系
//! - 被 `parsers/header.rs`, `parsers/qpoints.rs` 使用
//! - 无外部模块依赖

use std::fmt;

/// 头部结束标记（赝势信息段的起始行）
pub const HEADER_END_SENTINELS: [&str; 2] = [
    "Description of the potentials (KB energies)",
    "No information on the potentials yet",
];

/// 单个数值 token
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(x) => x,
        }
    }

    pub fn is_int(self) -> bool {
        matches!(self, Number::Int(_))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

/// 行分类结果
#[derive(Debug, Clone, PartialEq)]
pub enum LineRecord {
    /// 新键及其数值
    Key { key: String, values: Vec<Number> },
    /// 追加到上一个键的数值
    Continuation(Vec<Number>),
    /// 头部段结束
    HeaderEnd,
    /// 空行
    Blank,
}

/// 行分类失败的原因（行号由调用方补充）
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifyError {
    pub reason: String,
}

/// 将 Fortran `D` 指数改写为标准 `E` 指数
pub fn normalize_exponent(token: &str) -> String {
    token.replace("D+", "E+").replace("D-", "E-")
}

/// 解析单个数值 token
///
/// 不含小数点的 token 先按整数解析，失败再回退到浮点数。
pub fn parse_number(token: &str) -> Option<Number> {
    let token = normalize_exponent(token);
    if !token.contains('.') {
        if let Ok(i) = token.parse::<i64>() {
            return Some(Number::Int(i));
        }
    }
    token.parse::<f64>().ok().map(Number::Float)
}

/// 解析一组数值 token，遇到非数值即返回该 token
fn parse_numbers<'a>(tokens: &[&'a str]) -> std::result::Result<Vec<Number>, &'a str> {
    tokens
        .iter()
        .map(|tok| parse_number(tok).ok_or(*tok))
        .collect()
}

/// 对单行进行分类
pub fn classify_line(line: &str) -> std::result::Result<LineRecord, ClassifyError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(LineRecord::Blank);
    }
    if HEADER_END_SENTINELS.contains(&line) {
        return Ok(LineRecord::HeaderEnd);
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();

    if parse_number(tokens[0]).is_some() {
        return parse_numbers(&tokens)
            .map(LineRecord::Continuation)
            .map_err(|tok| ClassifyError {
                reason: format!("non-numeric token '{}' in continuation line", tok),
            });
    }

    let key = tokens[0].to_string();
    if tokens.len() == 1 {
        return Err(ClassifyError {
            reason: format!("key '{}' has no values", key),
        });
    }

    let values = parse_numbers(&tokens[1..]).map_err(|tok| ClassifyError {
        reason: format!("non-numeric token '{}' for key '{}'", tok, key),
    })?;

    Ok(LineRecord::Key { key, values })
}
