//! # DDB 头部解析器
//!
//! 解析 DDB 文件开头的头部段，生成带类型的 `DdbHeader`。
//!
//! ## 头部格式说明
//! ```text
//!  **** DERIVATIVE DATABASE ****
//! +DDB, Version number    100401
//! ...                                  (前 6 行为固定前导)
//!             natom         2
//!               kpt  0.00000000000000D+00  0.00000000000000D+00  0.00000000000000D+00
//!                    0.25000000000000D+00  0.00000000000000D+00  0.00000000000000D+00
//!  No information on the potentials yet
//! ```
//!
//! 解析分两步：
//! 1. 逐行分类，得到扁平的 键 → 数值列表 映射 (`FlatHeader`)
//! 2. 按 `nkpt` / `nsym` / `natom` 将指定字段重排为定长数组 (`DdbHeader`)
//!
//! ## 依赖关系
//! - 被 `parsers/ddb.rs` 使用
//! - 使用 `parsers/tokens.rs` 分类单行

use super::options::{ParseOptions, ZnuclPolicy};
use super::tokens::{classify_line, LineRecord, Number, HEADER_END_SENTINELS};
use crate::error::{DdbError, Result};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 头部字段的值：长度为 1 时折叠为标量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HeaderValue {
    Int(i64),
    Float(f64),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
}

impl HeaderValue {
    /// 由累计的数值列表构造；只要有一个浮点数，整体存为浮点
    fn from_numbers(values: &[Number]) -> Self {
        let all_int = values.iter().all(|v| v.is_int());
        match (all_int, values.len()) {
            (true, 1) => HeaderValue::Int(as_i64(values[0])),
            (false, 1) => HeaderValue::Float(values[0].as_f64()),
            (true, _) => HeaderValue::IntArray(values.iter().map(|v| as_i64(*v)).collect()),
            (false, _) => HeaderValue::FloatArray(values.iter().map(|v| v.as_f64()).collect()),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, HeaderValue::Int(_) | HeaderValue::Float(_))
    }

    pub fn len(&self) -> usize {
        match self {
            HeaderValue::Int(_) | HeaderValue::Float(_) => 1,
            HeaderValue::IntArray(v) => v.len(),
            HeaderValue::FloatArray(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 整数标量
    pub fn as_int(&self) -> Option<i64> {
        match self {
            HeaderValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// 任意数值标量
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Int(i) => Some(*i as f64),
            HeaderValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// 展平为浮点列表
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            HeaderValue::Int(i) => vec![*i as f64],
            HeaderValue::Float(x) => vec![*x],
            HeaderValue::IntArray(v) => v.iter().map(|&i| i as f64).collect(),
            HeaderValue::FloatArray(v) => v.clone(),
        }
    }
}

impl std::fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderValue::Int(i) => write!(f, "{}", i),
            HeaderValue::Float(x) => write!(f, "{}", x),
            HeaderValue::IntArray(v) => {
                let parts: Vec<String> = v.iter().map(|i| i.to_string()).collect();
                write!(f, "{}", parts.join(" "))
            }
            HeaderValue::FloatArray(v) => {
                let parts: Vec<String> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "{}", parts.join(" "))
            }
        }
    }
}

fn as_i64(n: Number) -> i64 {
    match n {
        Number::Int(i) => i,
        Number::Float(x) => x as i64,
    }
}

/// 字段首次出现的位置，用于重排阶段的错误定位
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOrigin {
    pub line: usize,
    pub content: String,
}

/// 扁平头部：版本号 + 键值映射
#[derive(Debug, Clone)]
pub struct FlatHeader {
    pub version: i64,
    pub fields: BTreeMap<String, HeaderValue>,
    pub origins: BTreeMap<String, FieldOrigin>,
}

impl FlatHeader {
    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.fields.get(key)
    }

    fn origin_error(&self, key: &str, reason: String) -> DdbError {
        match self.origins.get(key) {
            Some(o) => DdbError::parse(o.line, &o.content, reason),
            None => DdbError::parse(0, key, reason),
        }
    }

    /// 必需的非负整数标量
    fn require_count(&self, key: &str) -> Result<usize> {
        let value = self.fields.get(key).ok_or_else(|| DdbError::MissingField {
            field: key.to_string(),
        })?;
        match value.as_int() {
            Some(n) if n >= 0 => Ok(n as usize),
            _ => Err(self.origin_error(
                key,
                format!("'{}' must be a non-negative integer scalar", key),
            )),
        }
    }

    fn optional_int(&self, key: &str) -> Result<Option<i64>> {
        match self.fields.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_int()
                .map(Some)
                .ok_or_else(|| {
                    self.origin_error(key, format!("'{}' must be an integer scalar", key))
                }),
        }
    }

    fn optional_f64(&self, key: &str) -> Result<Option<f64>> {
        match self.fields.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.origin_error(key, format!("'{}' must be a scalar", key))),
        }
    }

    /// 读取整数数组；整值浮点数也接受
    fn int_values(&self, key: &str) -> Result<Option<Vec<i64>>> {
        let value = match self.fields.get(key) {
            Some(v) => v,
            None => return Ok(None),
        };
        match value {
            HeaderValue::Int(i) => Ok(Some(vec![*i])),
            HeaderValue::IntArray(v) => Ok(Some(v.clone())),
            other => {
                let floats = other.to_f64_vec();
                if floats.iter().all(|x| x.fract() == 0.0) {
                    Ok(Some(floats.iter().map(|&x| x as i64).collect()))
                } else {
                    Err(self.origin_error(key, format!("'{}' must contain integer values", key)))
                }
            }
        }
    }
}

/// 逐行解析头部段，得到扁平映射
pub fn parse_flat_header(content: &str, options: &ParseOptions) -> Result<FlatHeader> {
    let mut version: Option<i64> = None;
    // (键, 累计数值, 所在行)
    let mut keyvals: Vec<(String, Vec<Number>, FieldOrigin)> = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if line.contains("Version") {
            let last = line.split_whitespace().last().unwrap_or_default();
            let v = last
                .parse::<i64>()
                .map_err(|_| DdbError::parse(lineno, line, "version number is not an integer"))?;
            version = Some(v);
            continue;
        }

        if HEADER_END_SENTINELS.contains(&line) {
            debug!("header section ends at line {}", lineno);
            break;
        }

        if idx < options.preamble_lines {
            continue;
        }

        match classify_line(line) {
            Ok(LineRecord::Key { key, values }) => {
                let origin = FieldOrigin {
                    line: lineno,
                    content: line.to_string(),
                };
                keyvals.push((key, values, origin));
            }
            Ok(LineRecord::Continuation(values)) => match keyvals.last_mut() {
                Some((_, acc, _)) => acc.extend(values),
                None => {
                    return Err(DdbError::parse(
                        lineno,
                        line,
                        "numeric continuation before any key",
                    ))
                }
            },
            Ok(LineRecord::HeaderEnd) => break,
            Ok(LineRecord::Blank) => {}
            Err(e) => return Err(DdbError::parse(lineno, line, e.reason)),
        }
    }

    let version = version.ok_or_else(|| DdbError::MissingField {
        field: "version".to_string(),
    })?;

    let mut fields = BTreeMap::new();
    let mut origins = BTreeMap::new();
    for (key, values, origin) in keyvals {
        fields.insert(key.clone(), HeaderValue::from_numbers(&values));
        origins.insert(key, origin);
    }

    debug!("parsed {} header keys (DDB version {})", fields.len(), version);

    Ok(FlatHeader {
        version,
        fields,
        origins,
    })
}

/// 带类型的 DDB 头部
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdbHeader {
    /// DDB 格式版本号
    pub version: i64,

    /// 原子数
    pub natom: usize,

    /// k 点数
    pub nkpt: usize,

    /// 对称操作数
    pub nsym: usize,

    /// 原子种类数
    pub ntypat: Option<usize>,

    /// 自旋极化数
    pub nsppol: Option<i64>,

    /// 是否为 PAW 计算
    pub usepaw: Option<i64>,

    /// 交换关联泛函编号
    pub ixc: Option<i64>,

    /// 平面波截断能 (Ha)
    pub ecut: Option<f64>,

    /// 展宽 (Ha)
    pub tsmear: Option<f64>,

    /// 晶格尺度 (Bohr)
    pub acell: [f64; 3],

    /// 原始晶格向量（行向量）
    pub rprim: [[f64; 3]; 3],

    /// k 点约化坐标 (nkpt × 3)
    pub kpt: Vec<[f64; 3]>,

    /// 对称旋转矩阵 (nsym × 3 × 3)，已按消费约定转置
    pub symrel: Vec<[[i32; 3]; 3]>,

    /// 分数平移 (nsym × 3)
    pub tnons: Vec<[f64; 3]>,

    /// 反铁磁符号 (nsym)
    pub symafm: Vec<i32>,

    /// 原子约化坐标 (natom × 3)
    pub xred: Vec<[f64; 3]>,

    /// 每个原子的种类编号，从 1 开始 (natom)
    pub typat: Vec<usize>,

    /// 每种原子的原子序数
    pub znucl: Vec<u32>,

    /// 其余未建模的字段
    pub extra: BTreeMap<String, HeaderValue>,
}

/// 类型化阶段显式消费的字段
const TYPED_KEYS: [&str; 19] = [
    "natom", "nkpt", "nsym", "ntypat", "nsppol", "usepaw", "ixc", "ecut", "tsmear", "acell",
    "rprim", "kpt", "symrel", "tnons", "symafm", "xred", "typat", "znucl", "version",
];

impl DdbHeader {
    /// 从文件内容解析头部
    pub fn parse(content: &str, options: &ParseOptions) -> Result<Self> {
        let flat = parse_flat_header(content, options)?;
        Self::from_flat(&flat, options)
    }

    /// 从扁平映射构造，并完成重排
    pub fn from_flat(flat: &FlatHeader, options: &ParseOptions) -> Result<Self> {
        let natom = flat.require_count("natom")?;
        let nkpt = flat.require_count("nkpt")?;
        let nsym = flat.require_count("nsym")?;
        let ntypat = flat.optional_int("ntypat")?.map(|n| n.max(0) as usize);

        let kpt = match flat.get("kpt") {
            Some(v) => reshape_rows("kpt", v.to_f64_vec(), nkpt)?,
            None => return Err(missing("kpt")),
        };

        let acell = match flat.get("acell") {
            Some(v) => fixed3("acell", v.to_f64_vec())?,
            None => [1.0; 3],
        };

        let rprim = match flat.get("rprim") {
            Some(v) => {
                let rows = reshape_rows("rprim", v.to_f64_vec(), 3)?;
                [rows[0], rows[1], rows[2]]
            }
            None => [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        };

        let symrel = match flat.int_values("symrel")? {
            Some(values) => {
                let values = values
                    .into_iter()
                    .map(|v| {
                        i32::try_from(v).map_err(|_| {
                            flat.origin_error("symrel", format!("symrel entry {} out of range", v))
                        })
                    })
                    .collect::<Result<Vec<i32>>>()?;
                reshape_matrices("symrel", values, nsym)?
                    .iter()
                    .map(transpose)
                    .collect()
            }
            None => return Err(missing("symrel")),
        };

        let tnons = match flat.get("tnons") {
            Some(v) => reshape_rows("tnons", v.to_f64_vec(), nsym)?,
            None => vec![[0.0; 3]; nsym],
        };

        let symafm = match flat.int_values("symafm")? {
            Some(values) => {
                check_len("symafm", values.len(), nsym)?;
                values
                    .into_iter()
                    .map(|v| {
                        i32::try_from(v).map_err(|_| {
                            flat.origin_error("symafm", format!("symafm entry {} out of range", v))
                        })
                    })
                    .collect::<Result<Vec<i32>>>()?
            }
            None => vec![1; nsym],
        };

        let xred = match flat.get("xred") {
            Some(v) => reshape_rows("xred", v.to_f64_vec(), natom)?,
            None => return Err(missing("xred")),
        };

        let znucl = match flat.get("znucl") {
            Some(v) => integral_znucl(&v.to_f64_vec(), options.znucl_policy)?,
            None => return Err(missing("znucl")),
        };

        let typat = match flat.int_values("typat")? {
            Some(values) => {
                check_len("typat", values.len(), natom)?;
                values
                    .into_iter()
                    .map(|t| {
                        usize::try_from(t).map_err(|_| {
                            flat.origin_error("typat", format!("negative type index {}", t))
                        })
                    })
                    .collect::<Result<Vec<usize>>>()?
            }
            None if ntypat.unwrap_or(1) <= 1 => vec![1; natom],
            None => return Err(missing("typat")),
        };

        let extra = flat
            .fields
            .iter()
            .filter(|(k, _)| !TYPED_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(DdbHeader {
            version: flat.version,
            natom,
            nkpt,
            nsym,
            ntypat,
            nsppol: flat.optional_int("nsppol")?,
            usepaw: flat.optional_int("usepaw")?,
            ixc: flat.optional_int("ixc")?,
            ecut: flat.optional_f64("ecut")?,
            tsmear: flat.optional_f64("tsmear")?,
            acell,
            rprim,
            kpt,
            symrel,
            tnons,
            symafm,
            xred,
            typat,
            znucl,
            extra,
        })
    }

    /// 常用于收敛测试的参数
    pub fn params(&self) -> BTreeMap<String, HeaderValue> {
        let mut params = BTreeMap::new();
        params.insert("nkpt".to_string(), HeaderValue::Int(self.nkpt as i64));
        if let Some(v) = self.nsppol {
            params.insert("nsppol".to_string(), HeaderValue::Int(v));
        }
        if let Some(v) = self.ecut {
            params.insert("ecut".to_string(), HeaderValue::Float(v));
        }
        if let Some(v) = self.tsmear {
            params.insert("tsmear".to_string(), HeaderValue::Float(v));
        }
        if let Some(v) = self.ixc {
            params.insert("ixc".to_string(), HeaderValue::Int(v));
        }
        params
    }
}

fn missing(field: &str) -> DdbError {
    DdbError::MissingField {
        field: field.to_string(),
    }
}

fn check_len(field: &str, found: usize, expected: usize) -> Result<()> {
    if found != expected {
        return Err(DdbError::shape(field, expected, found));
    }
    Ok(())
}

fn fixed3(field: &str, values: Vec<f64>) -> Result<[f64; 3]> {
    check_len(field, values.len(), 3)?;
    Ok([values[0], values[1], values[2]])
}

/// 计数来自文件，乘积溢出时按形状不匹配处理
fn element_count(field: &str, shape: &str, count: usize, per: usize, found: usize) -> Result<usize> {
    count.checked_mul(per).ok_or_else(|| {
        DdbError::shape(
            field,
            format!("{} with {} = {} (overflows)", shape, count, count as u128 * per as u128),
            format!("{} values", found),
        )
    })
}

/// 重排为 (rows, 3)
fn reshape_rows<T: Copy>(field: &str, values: Vec<T>, rows: usize) -> Result<Vec<[T; 3]>> {
    let expected = element_count(field, "(rows, 3)", rows, 3, values.len())?;
    if values.len() != expected {
        return Err(DdbError::shape(
            field,
            format!("({}, 3) = {} values", rows, expected),
            format!("{} values", values.len()),
        ));
    }
    Ok(values
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect())
}

/// 重排为 (n, 3, 3)
fn reshape_matrices<T: Copy>(field: &str, values: Vec<T>, n: usize) -> Result<Vec<[[T; 3]; 3]>> {
    let expected = element_count(field, "(n, 3, 3)", n, 9, values.len())?;
    if values.len() != expected {
        return Err(DdbError::shape(
            field,
            format!("({}, 3, 3) = {} values", n, expected),
            format!("{} values", values.len()),
        ));
    }
    Ok(values
        .chunks_exact(9)
        .map(|c| {
            [
                [c[0], c[1], c[2]],
                [c[3], c[4], c[5]],
                [c[6], c[7], c[8]],
            ]
        })
        .collect())
}

/// 3x3 矩阵转置
pub fn transpose<T: Copy>(m: &[[T; 3]; 3]) -> [[T; 3]; 3] {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}

/// 将 znucl 转为整数原子序数
///
/// 不支持非整数原子序数（虚晶近似混合）。
fn integral_znucl(values: &[f64], policy: ZnuclPolicy) -> Result<Vec<u32>> {
    values
        .iter()
        .map(|&z| {
            if z < 0.0 || !z.is_finite() {
                return Err(DdbError::Validation {
                    field: "znucl".to_string(),
                    reason: format!("invalid atomic number {}", z),
                });
            }
            if z.fract() != 0.0 {
                match policy {
                    ZnuclPolicy::Strict => {
                        return Err(DdbError::Validation {
                            field: "znucl".to_string(),
                            reason: format!(
                                "non-integral atomic number {} (alchemical mixing is not supported)",
                                z
                            ),
                        })
                    }
                    ZnuclPolicy::Truncate => {
                        warn!("truncating non-integral znucl {} to {}", z, z.trunc());
                    }
                }
            }
            Ok(z.trunc() as u32)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SI_HEADER: &str = r#" **** DERIVATIVE DATABASE ****
+DDB, Version number    100401

 Generated for silicon


              usepaw         0
               natom         2
                nkpt         2
              nsppol         1
                nsym         2
              ntypat         1
                 ixc         7
               acell    0.1020000000000000D+02  0.1020000000000000D+02  0.1020000000000000D+02
                ecut    0.6000000000000000D+01
                 kpt    0.00000000000000D+00  0.00000000000000D+00  0.00000000000000D+00
                        0.25000000000000D+00  0.00000000000000D+00  0.00000000000000D+00
               rprim    0.0000000000000000D+00  0.5000000000000000D+00  0.5000000000000000D+00
                        0.5000000000000000D+00  0.0000000000000000D+00  0.5000000000000000D+00
                        0.5000000000000000D+00  0.5000000000000000D+00  0.0000000000000000D+00
              symrel     1  0  0   0  1  0   0  0  1
                         0  1  0   0  0  1   1  0  0
               tnons    0.0000000000000000D+00  0.0000000000000000D+00  0.0000000000000000D+00
                        0.0000000000000000D+00  0.0000000000000000D+00  0.0000000000000000D+00
              tsmear    0.1000000000000000D-01
               typat     1  1
                xred    0.0000000000000000D+00  0.0000000000000000D+00  0.0000000000000000D+00
                        0.2500000000000000D+00  0.2500000000000000D+00  0.2500000000000000D+00
               znucl    0.1400000000000000D+02

 No information on the potentials yet
               natom         99
"#;

    #[test]
    fn test_flat_header_scalars_and_arrays() {
        let flat = parse_flat_header(SI_HEADER, &ParseOptions::default()).unwrap();

        assert_eq!(flat.version, 100401);
        assert_eq!(flat.get("natom"), Some(&HeaderValue::Int(2)));
        assert_eq!(flat.get("ixc"), Some(&HeaderValue::Int(7)));
        assert_eq!(flat.get("ecut"), Some(&HeaderValue::Float(6.0)));
        assert_eq!(flat.get("kpt").map(|v| v.len()), Some(6));

        // 所有长度为 1 的字段都是标量
        for value in flat.fields.values() {
            assert_eq!(value.len() == 1, value.is_scalar());
        }
    }

    #[test]
    fn test_header_stops_at_sentinel() {
        let flat = parse_flat_header(SI_HEADER, &ParseOptions::default()).unwrap();
        assert_eq!(flat.get("natom"), Some(&HeaderValue::Int(2)));
    }

    #[test]
    fn test_typed_header_reshape() {
        let header = DdbHeader::parse(SI_HEADER, &ParseOptions::default()).unwrap();

        assert_eq!(header.natom, 2);
        assert_eq!(header.nkpt, 2);
        assert_eq!(header.nsym, 2);
        assert_eq!(header.kpt.len(), 2);
        assert!((header.kpt[1][0] - 0.25).abs() < 1e-12);
        assert!((header.acell[0] - 10.2).abs() < 1e-12);
        assert!((header.rprim[0][1] - 0.5).abs() < 1e-12);
        assert_eq!(header.xred.len(), 2);
        assert_eq!(header.typat, vec![1, 1]);
        assert_eq!(header.znucl, vec![14]);
        assert_eq!(header.symafm, vec![1, 1]);
        assert_eq!(header.extra.get("usepaw"), None);
        assert_eq!(header.usepaw, Some(0));
        assert!((header.tsmear.unwrap() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_symrel_is_transposed() {
        let header = DdbHeader::parse(SI_HEADER, &ParseOptions::default()).unwrap();
        // 磁盘上按列存储: [[0,1,0],[0,0,1],[1,0,0]]
        assert_eq!(header.symrel[1], [[0, 0, 1], [1, 0, 0], [0, 1, 0]]);
        assert_eq!(transpose(&header.symrel[1]), [[0, 1, 0], [0, 0, 1], [1, 0, 0]]);
    }

    #[test]
    fn test_transpose_round_trip_restores_disk_order() {
        let header = DdbHeader::parse(SI_HEADER, &ParseOptions::default()).unwrap();
        let flat = parse_flat_header(SI_HEADER, &ParseOptions::default()).unwrap();

        for m in &header.symrel {
            assert_eq!(transpose(&transpose(m)), *m);
        }

        let restored: Vec<i64> = header
            .symrel
            .iter()
            .flat_map(transpose)
            .flat_map(|row| row.into_iter().map(i64::from))
            .collect();
        assert_eq!(Some(&HeaderValue::IntArray(restored)), flat.get("symrel"));

        let kpt: Vec<f64> = header.kpt.iter().flatten().copied().collect();
        assert_eq!(flat.get("kpt").unwrap().to_f64_vec(), kpt);
    }

    #[test]
    fn test_missing_version() {
        let content = "a\nb\nc\nd\ne\nf\nnatom 1\n";
        let err = parse_flat_header(content, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, DdbError::MissingField { ref field } if field == "version"));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let content = "x\n+DDB, Version number 100401\nx\nx\nx\nx\nnatom 1\nnsym one 1\n";
        let err = parse_flat_header(content, &ParseOptions::default()).unwrap_err();
        match err {
            DdbError::ParseError { line, content, .. } => {
                assert_eq!(line, 8);
                assert_eq!(content, "nsym one 1");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_continuation_without_key() {
        let content = "x\n+DDB, Version number 100401\nx\nx\nx\nx\n 1.0 2.0 3.0\n";
        let err = parse_flat_header(content, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, DdbError::ParseError { line: 7, .. }));
    }

    #[test]
    fn test_shape_mismatch_on_xred() {
        let content = SI_HEADER.replace("natom         2", "natom         3");
        let err = DdbHeader::parse(&content, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, DdbError::ShapeMismatch { ref field, .. } if field == "xred"));
    }

    #[test]
    fn test_huge_counts_are_shape_errors() {
        let content = SI_HEADER.replace("natom         2", "natom         6148914691236517206");
        let err = DdbHeader::parse(&content, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, DdbError::ShapeMismatch { ref field, .. } if field == "xred"));

        let content = SI_HEADER.replace("nsym         2", "nsym         4611686018427387904");
        let err = DdbHeader::parse(&content, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, DdbError::ShapeMismatch { ref field, .. } if field == "symrel"));
    }

    #[test]
    fn test_non_integral_symrel() {
        let content = SI_HEADER.replace("symrel     1  0  0", "symrel     1.5  0  0");
        let err = DdbHeader::parse(&content, &ParseOptions::default()).unwrap_err();
        match err {
            DdbError::ParseError { line, content, .. } => {
                assert_eq!(line, 21);
                assert!(content.starts_with("symrel"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_symafm_out_of_range() {
        let content = SI_HEADER.replace(
            "              tsmear",
            "              symafm     1  4294967297\n              tsmear",
        );
        let err = DdbHeader::parse(&content, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, DdbError::ParseError { ref content, .. } if content.starts_with("symafm")));
    }

    #[test]
    fn test_non_integer_version() {
        let content = SI_HEADER.replace("Version number    100401", "Version number    1004.01");
        let err = parse_flat_header(&content, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, DdbError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_sentinel_inside_preamble_stops_parsing() {
        let content = "x\n+DDB, Version number 100401\n No information on the potentials yet\nx\nx\nx\nnatom 1\n";
        let flat = parse_flat_header(content, &ParseOptions::default()).unwrap();
        assert_eq!(flat.version, 100401);
        assert!(flat.fields.is_empty());
    }

    #[test]
    fn test_non_integral_znucl_policy() {
        let content = SI_HEADER.replace("0.1400000000000000D+02", "0.1450000000000000D+02");

        let err = DdbHeader::parse(&content, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, DdbError::Validation { ref field, .. } if field == "znucl"));

        let options = ParseOptions::default().with_znucl_policy(ZnuclPolicy::Truncate);
        let header = DdbHeader::parse(&content, &options).unwrap();
        assert_eq!(header.znucl, vec![14]);
    }

    #[test]
    fn test_params_subset() {
        let header = DdbHeader::parse(SI_HEADER, &ParseOptions::default()).unwrap();
        let params = header.params();
        let keys: Vec<&str> = params.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["ecut", "ixc", "nkpt", "nsppol", "tsmear"]);
    }
}
