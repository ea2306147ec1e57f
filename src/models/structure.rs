//! # 晶体结构数据模型
//!
//! 由 DDB 头部构建晶体结构：晶格、原子种类、分数坐标与对称操作。
//!
//! ## 晶格约定
//! 第 i 个原胞基矢为 `acell[i] * rprim[i]`（Bohr），存储时换算为 Å。
//!
//! ## 依赖关系
//! - 被 `parsers/ddb.rs`, `phonon/`, `anaddb/` 使用
//! - 使用 `parsers/header.rs` 的 `DdbHeader`, `models/symmetry.rs`

use super::symmetry::SpaceGroup;
use crate::error::{DdbError, Result};
use crate::parsers::header::DdbHeader;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bohr → Å
pub const BOHR_TO_ANG: f64 = 0.52917721067;

/// 元素符号表，下标为原子序数
const ELEMENT_SYMBOLS: [&str; 119] = [
    "X", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// 原子序数 → 元素符号
pub fn element_symbol(z: u32) -> &'static str {
    ELEMENT_SYMBOLS.get(z as usize).copied().unwrap_or("X")
}

/// 晶格参数表示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3, Å)，行向量表示 a, b, c
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 从 Abinit 变量 acell / rprim (Bohr) 创建
    pub fn from_abivars(acell: &[f64; 3], rprim: &[[f64; 3]; 3]) -> Self {
        let mut matrix = [[0.0; 3]; 3];
        for (i, row) in rprim.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                matrix[i][j] = acell[i] * v * BOHR_TO_ANG;
            }
        }
        Lattice { matrix }
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let [a_vec, b_vec, c_vec] = self.matrix;

        let norm = |v: [f64; 3]| (v[0].powi(2) + v[1].powi(2) + v[2].powi(2)).sqrt();
        let dot = |u: [f64; 3], v: [f64; 3]| -> f64 { u.iter().zip(v.iter()).map(|(x, y)| x * y).sum() };

        let a = norm(a_vec);
        let b = norm(b_vec);
        let c = norm(c_vec);

        let alpha = (dot(b_vec, c_vec) / (b * c)).acos().to_degrees();
        let beta = (dot(a_vec, c_vec) / (a * c)).acos().to_degrees();
        let gamma = (dot(a_vec, b_vec) / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 计算晶格体积
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.matrix;
        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }
}

/// 原子信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 原子序数（仅支持整数）
    pub atomic_number: u32,

    /// 分数坐标 [x, y, z]
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(atomic_number: u32, position: [f64; 3]) -> Self {
        Atom {
            element: element_symbol(atomic_number).to_string(),
            atomic_number,
            position,
        }
    }
}

/// 晶体结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crystal {
    /// 晶格
    pub lattice: Lattice,

    /// 原子列表
    pub atoms: Vec<Atom>,

    /// 空间群（对称操作）
    pub spacegroup: SpaceGroup,
}

impl Crystal {
    pub fn new(lattice: Lattice, atoms: Vec<Atom>, spacegroup: SpaceGroup) -> Self {
        Crystal {
            lattice,
            atoms,
            spacegroup,
        }
    }

    /// 从 DDB 头部构建结构
    ///
    /// 时间反演对称性总是设为 true，这只是近似。
    pub fn from_header(header: &DdbHeader) -> Result<Self> {
        let lattice = Lattice::from_abivars(&header.acell, &header.rprim);

        let atoms = header
            .xred
            .iter()
            .zip(header.typat.iter())
            .map(|(pos, &itype)| {
                let z = itype
                    .checked_sub(1)
                    .and_then(|i| header.znucl.get(i))
                    .ok_or_else(|| {
                        DdbError::shape(
                            "typat",
                            format!("type index in 1..={}", header.znucl.len()),
                            itype,
                        )
                    })?;
                Ok(Atom::new(*z, *pos))
            })
            .collect::<Result<Vec<_>>>()?;

        let spacegroup = SpaceGroup::from_symrel(&header.symrel, &header.tnons, &header.symafm)?;

        Ok(Crystal::new(lattice, atoms, spacegroup))
    }

    pub fn num_sites(&self) -> usize {
        self.atoms.len()
    }

    /// 原子序数列表
    pub fn atomic_numbers(&self) -> Vec<u32> {
        self.atoms.iter().map(|a| a.atomic_number).collect()
    }

    /// 分数坐标列表
    pub fn frac_coords(&self) -> Vec<[f64; 3]> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    /// 计算化学式
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for atom in &self.atoms {
            *counts.entry(atom.element.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

impl fmt::Display for Crystal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Full Formula ({})", self.formula())?;
        for row in &self.lattice.matrix {
            writeln!(f, "  {:12.6} {:12.6} {:12.6}", row[0], row[1], row[2])?;
        }
        write!(f, "Sites ({})", self.atoms.len())?;
        for (i, atom) in self.atoms.iter().enumerate() {
            let p = atom.position;
            write!(
                f,
                "\n  {:>3} {:<3} {:10.6} {:10.6} {:10.6}",
                i, atom.element, p[0], p[1], p[2]
            )?;
        }
        Ok(())
    }
}
