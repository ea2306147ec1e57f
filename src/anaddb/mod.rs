//! # anaddb 后处理接口
//!
//! 描述与外部后处理程序 anaddb 的边界：本模块只负责整理输入参数
//! （结构、q 点、控制变量），以及接收运行结果或诊断报告。
//! 进程管理、输入文件生成与输出文件读取由 `PostProcessor` 的实现负责。
//!
//! ## 依赖关系
//! - 被 `parsers/ddb.rs` 使用
//! - 使用 `models/structure.rs`, `phonon/becs.rs`

use crate::error::Result;
use crate::models::Crystal;
use crate::phonon::becs::BecsLayout;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// 控制变量取值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlValue {
    Int(i64),
    Float(f64),
    Text(String),
    IntVec(Vec<i64>),
    FloatVec(Vec<f64>),
}

impl fmt::Display for ControlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlValue::Int(i) => write!(f, "{}", i),
            ControlValue::Float(x) => write!(f, "{}", x),
            ControlValue::Text(s) => write!(f, "{}", s),
            ControlValue::IntVec(v) => {
                let parts: Vec<String> = v.iter().map(|i| i.to_string()).collect();
                write!(f, "{}", parts.join(" "))
            }
            ControlValue::FloatVec(v) => {
                let parts: Vec<String> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "{}", parts.join(" "))
            }
        }
    }
}

/// 通用 anaddb 选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnaddbOptions {
    /// 声学求和规则
    pub asr: i64,
    /// 电荷中性化
    pub chneut: i64,
    /// 偶极-偶极相互作用
    pub dipdip: i64,
}

impl Default for AnaddbOptions {
    fn default() -> Self {
        AnaddbOptions {
            asr: 2,
            chneut: 1,
            dipdip: 1,
        }
    }
}

/// 声子态密度计算方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DosMethod {
    #[default]
    Tetra,
    Gaussian,
}

impl fmt::Display for DosMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DosMethod::Tetra => write!(f, "tetra"),
            DosMethod::Gaussian => write!(f, "gaussian"),
        }
    }
}

/// 声子能带与态密度的网格参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhbandsDosParams {
    /// 高对称路径上最小线段的分割数
    pub ndivsm: i64,
    /// DOS 网格相对 q 网格的细分数
    pub nqsmall: i64,
    /// q 网格平移
    pub q1shft: [f64; 3],
    pub dos_method: DosMethod,
}

impl Default for PhbandsDosParams {
    fn default() -> Self {
        PhbandsDosParams {
            ndivsm: 20,
            nqsmall: 10,
            q1shft: [0.0; 3],
            dos_method: DosMethod::Tetra,
        }
    }
}

/// 提交给 anaddb 的输入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnaddbInput {
    pub structure: Crystal,
    pub qpoint: Option<[f64; 3]>,
    pub ngqpt: Option<[i64; 3]>,
    pub vars: BTreeMap<String, ControlValue>,
}

impl AnaddbInput {
    pub fn new(structure: &Crystal) -> Self {
        AnaddbInput {
            structure: structure.clone(),
            qpoint: None,
            ngqpt: None,
            vars: BTreeMap::new(),
        }
    }

    pub fn set(mut self, name: &str, value: ControlValue) -> Self {
        self.vars.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ControlValue> {
        self.vars.get(name)
    }

    fn with_options(self, opts: AnaddbOptions) -> Self {
        self.set("asr", ControlValue::Int(opts.asr))
            .set("chneut", ControlValue::Int(opts.chneut))
            .set("dipdip", ControlValue::Int(opts.dipdip))
    }

    /// 计算单个 q 点的声子模式
    pub fn modes_at_qpoint(structure: &Crystal, qpoint: [f64; 3], opts: AnaddbOptions) -> Self {
        let mut inp = AnaddbInput::new(structure)
            .with_options(opts)
            .set("ifcflag", ControlValue::Int(0))
            .set("nph1l", ControlValue::Int(1))
            .set("qph1l", ControlValue::FloatVec(vec![qpoint[0], qpoint[1], qpoint[2], 1.0]));
        inp.qpoint = Some(qpoint);
        inp
    }

    /// 计算声子能带与态密度
    pub fn phbands_and_dos(
        structure: &Crystal,
        ngqpt: [i64; 3],
        params: PhbandsDosParams,
        opts: AnaddbOptions,
    ) -> Self {
        let prtdos = match params.dos_method {
            DosMethod::Gaussian => 1,
            DosMethod::Tetra => 2,
        };
        let mut inp = AnaddbInput::new(structure)
            .with_options(opts)
            .set("ifcflag", ControlValue::Int(1))
            .set("ngqpt", ControlValue::IntVec(ngqpt.to_vec()))
            .set("nqshft", ControlValue::Int(1))
            .set("q1shft", ControlValue::FloatVec(params.q1shft.to_vec()))
            .set("ndivsm", ControlValue::Int(params.ndivsm))
            .set("prtdos", ControlValue::Int(prtdos))
            .set(
                "ng2qpt",
                ControlValue::IntVec(ngqpt.iter().map(|n| n * params.nqsmall).collect()),
            );
        inp.ngqpt = Some(ngqpt);
        inp
    }

    /// 计算宏观介电张量与 Born 有效电荷
    pub fn emacro_and_becs(structure: &Crystal, chneut: i64) -> Self {
        AnaddbInput::new(structure)
            .set("chneut", ControlValue::Int(chneut))
            .set("dieflag", ControlValue::Int(1))
    }
}

/// 诊断信息级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Comment,
    Warning,
    Error,
    Bug,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Comment => write!(f, "COMMENT"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Bug => write!(f, "BUG"),
        }
    }
}

/// 单条诊断信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// 外部任务失败时的报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    pub workdir: Option<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl JobReport {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.severity, Severity::Error | Severity::Bug))
    }
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.workdir {
            Some(dir) => writeln!(f, "workdir = {}", dir.display())?,
            None => writeln!(f, "workdir = <none>")?,
        }
        let errors: Vec<&Diagnostic> = self.errors().collect();
        if !errors.is_empty() {
            writeln!(f, "Found {} errors", errors.len())?;
        }
        for d in &self.diagnostics {
            writeln!(f, "[{}] {}", d.severity, d.message)?;
        }
        Ok(())
    }
}

/// 外部后处理程序
///
/// 同步执行，阻塞直到完成；成功返回结果句柄，失败返回诊断报告。
pub trait PostProcessor {
    type Output;

    fn run(&self, ddb_path: &Path, input: &AnaddbInput) -> std::result::Result<Self::Output, JobReport>;
}

/// `emacro_and_becs` 任务的结果读取接口
pub trait TensorSource {
    /// 宏观介电张量
    fn emacro(&self) -> Result<[[f64; 3]; 3]>;

    /// Born 有效电荷原始数据块及其存储顺序
    fn becs(&self) -> Result<(Vec<[[f64; 3]; 3]>, BecsLayout)>;
}
