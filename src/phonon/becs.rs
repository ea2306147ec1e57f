//! # Born 有效电荷张量
//!
//! 将外部后处理程序给出的 (natom, 3, 3) 数值块整理为逐原子的 3x3 张量，
//! 并绑定到晶体结构上。
//!
//! ## 依赖关系
//! - 被 `parsers/ddb.rs` (`anaget_emacro_and_becs`) 使用
//! - 使用 `models/structure.rs`

use crate::error::{DdbError, Result};
use crate::models::Crystal;
use crate::parsers::header::transpose;

use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 原始数据块中每个原子子块的存储顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BecsLayout {
    /// 与消费约定一致
    #[default]
    RowMajor,
    /// 按列存储（Fortran 顺序），每个子块需要转置
    Transposed,
}

/// 逐原子的 Born 有效电荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Becs {
    structure: Crystal,
    values: Vec<[[f64; 3]; 3]>,
}

impl Becs {
    pub fn new(raw: Vec<[[f64; 3]; 3]>, structure: &Crystal, layout: BecsLayout) -> Result<Self> {
        if raw.len() != structure.num_sites() {
            return Err(DdbError::shape(
                "becs",
                format!("{} atoms", structure.num_sites()),
                format!("{} tensors", raw.len()),
            ));
        }

        let values = match layout {
            BecsLayout::RowMajor => raw,
            BecsLayout::Transposed => raw.iter().map(transpose).collect(),
        };

        Ok(Becs {
            structure: structure.clone(),
            values,
        })
    }

    /// 从长度为 9 * natom 的扁平缓冲区构造
    pub fn from_flat(flat: &[f64], structure: &Crystal, layout: BecsLayout) -> Result<Self> {
        let natom = structure.num_sites();
        if flat.len() != 9 * natom {
            return Err(DdbError::shape(
                "becs",
                format!("({}, 3, 3) = {} values", natom, 9 * natom),
                format!("{} values", flat.len()),
            ));
        }

        let raw = flat
            .chunks_exact(9)
            .map(|c| [[c[0], c[1], c[2]], [c[3], c[4], c[5]], [c[6], c[7], c[8]]])
            .collect();

        Self::new(raw, structure, layout)
    }

    pub fn structure(&self) -> &Crystal {
        &self.structure
    }

    pub fn values(&self) -> &[[[f64; 3]; 3]] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 电中性求和规则：所有原子张量之和，理想情况下为零
    pub fn neutrality_sum(&self) -> [[f64; 3]; 3] {
        let mut sum = [[0.0; 3]; 3];
        for bec in &self.values {
            for (i, row) in bec.iter().enumerate() {
                for (j, v) in row.iter().enumerate() {
                    sum[i][j] += v;
                }
            }
        }
        sum
    }

    /// 输出电中性求和结果；只报告，不做判断
    pub fn check_sumrule(&self) -> [[f64; 3]; 3] {
        let sum = self.neutrality_sum();
        info!("Born effective charge neutrality sum-rule:");
        for row in &sum {
            info!("  {:12.6} {:12.6} {:12.6}", row[0], row[1], row[2]);
        }
        sum
    }
}

impl fmt::Display for Becs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.structure)?;
        for (atom, bec) in self.structure.atoms.iter().zip(self.values.iter()) {
            let p = atom.position;
            writeln!(
                f,
                "\nbec at site: {} [{:.6}, {:.6}, {:.6}]",
                atom.element, p[0], p[1], p[2]
            )?;
            for row in bec {
                writeln!(f, "  {:12.6} {:12.6} {:12.6}", row[0], row[1], row[2])?;
            }
        }
        Ok(())
    }
}
