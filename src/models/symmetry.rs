//! # 对称操作数据模型
//!
//! 保存从 DDB 头部读出的对称操作，只提供网格推断所需的最小接口：
//! 对约化倒空间坐标施加旋转。
//!
//! ## 依赖关系
//! - 被 `models/structure.rs` 使用
//! - 被 `phonon/mesh.rs` 使用

use crate::error::{DdbError, Result};
use serde::{Deserialize, Serialize};

/// 单个对称操作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymmOp {
    /// 实空间旋转（约化坐标，已转置为消费约定）
    pub rot_r: [[i32; 3]; 3],

    /// 分数平移
    pub tau: [f64; 3],

    /// 反铁磁符号 (+1 / -1)
    pub afm_sign: i32,

    /// 倒空间旋转 (R^-1)^T
    rot_g: [[i32; 3]; 3],
}

impl SymmOp {
    pub fn new(rot_r: [[i32; 3]; 3], tau: [f64; 3], afm_sign: i32) -> Result<Self> {
        let rot_g = inverse_transpose(&rot_r)?;
        Ok(SymmOp {
            rot_r,
            tau,
            afm_sign,
            rot_g,
        })
    }

    pub fn identity() -> Self {
        let eye = [[1, 0, 0], [0, 1, 0], [0, 0, 1]];
        SymmOp {
            rot_r: eye,
            tau: [0.0; 3],
            afm_sign: 1,
            rot_g: eye,
        }
    }

    /// 倒空间旋转矩阵
    pub fn rot_g(&self) -> &[[i32; 3]; 3] {
        &self.rot_g
    }

    pub fn is_identity(&self) -> bool {
        self.rot_r == [[1, 0, 0], [0, 1, 0], [0, 0, 1]]
    }

    /// 旋转约化倒空间坐标，不折回 [0, 1)
    pub fn rotate_k(&self, frac_coords: &[f64; 3]) -> [f64; 3] {
        let g = &self.rot_g;
        let mut out = [0.0; 3];
        for (i, row) in g.iter().enumerate() {
            out[i] = row
                .iter()
                .zip(frac_coords.iter())
                .map(|(&m, &k)| m as f64 * k)
                .sum();
        }
        out
    }
}

/// 整数矩阵行列式；i32 元素的三重乘积需要 i128
fn det3(m: &[[i128; 3]; 3]) -> i128 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn rotation_error(m: &[[i32; 3]; 3], reason: String) -> DdbError {
    DdbError::Validation {
        field: "symrel".to_string(),
        reason: format!("rotation {:?} {}", m, reason),
    }
}

/// 计算 (R^-1)^T；旋转矩阵行列式必须为 ±1，逆矩阵仍为整数
fn inverse_transpose(rot: &[[i32; 3]; 3]) -> Result<[[i32; 3]; 3]> {
    let m = rot.map(|row| row.map(i128::from));
    let det = det3(&m);
    if det != 1 && det != -1 {
        return Err(rotation_error(
            rot,
            format!("has determinant {}, expected +1 or -1", det),
        ));
    }

    // 伴随矩阵的转置即余子式矩阵，(R^-1)^T = cof(R) / det
    let cof = [
        [
            m[1][1] * m[2][2] - m[1][2] * m[2][1],
            m[1][2] * m[2][0] - m[1][0] * m[2][2],
            m[1][0] * m[2][1] - m[1][1] * m[2][0],
        ],
        [
            m[0][2] * m[2][1] - m[0][1] * m[2][2],
            m[0][0] * m[2][2] - m[0][2] * m[2][0],
            m[0][1] * m[2][0] - m[0][0] * m[2][1],
        ],
        [
            m[0][1] * m[1][2] - m[0][2] * m[1][1],
            m[0][2] * m[1][0] - m[0][0] * m[1][2],
            m[0][0] * m[1][1] - m[0][1] * m[1][0],
        ],
    ];

    let mut out = [[0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = i32::try_from(cof[i][j] * det).map_err(|_| {
                rotation_error(rot, "has an inverse outside the i32 range".to_string())
            })?;
        }
    }
    Ok(out)
}

/// 空间群：对称操作集合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceGroup {
    /// 空间群编号，0 表示未知
    pub spgid: u32,

    /// 是否具有时间反演对称性
    pub has_timerev: bool,

    /// 对称操作
    pub ops: Vec<SymmOp>,
}

impl SpaceGroup {
    /// 由 DDB 头部数据构造；DDB 不记录空间群编号与时间反演，分别取 0 和 true
    pub fn from_symrel(
        symrel: &[[[i32; 3]; 3]],
        tnons: &[[f64; 3]],
        symafm: &[i32],
    ) -> Result<Self> {
        if tnons.len() != symrel.len() || symafm.len() != symrel.len() {
            return Err(DdbError::shape(
                "symmetry",
                format!("{} rotations, translations and afm signs", symrel.len()),
                format!("{} / {} / {}", symrel.len(), tnons.len(), symafm.len()),
            ));
        }

        let ops = symrel
            .iter()
            .zip(tnons.iter())
            .zip(symafm.iter())
            .map(|((rot, tau), &afm)| SymmOp::new(*rot, *tau, afm))
            .collect::<Result<Vec<_>>>()?;

        Ok(SpaceGroup {
            spgid: 0,
            has_timerev: true,
            ops,
        })
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SymmOp> {
        self.ops.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rotation() {
        let op = SymmOp::identity();
        assert!(op.is_identity());
        assert_eq!(op.rotate_k(&[0.25, -0.5, 0.0]), [0.25, -0.5, 0.0]);
    }

    #[test]
    fn test_inverse_transpose_of_cyclic_permutation() {
        // 置换矩阵是正交的，(R^-1)^T = R
        let rot = [[0, 0, 1], [1, 0, 0], [0, 1, 0]];
        let op = SymmOp::new(rot, [0.0; 3], 1).unwrap();
        assert_eq!(op.rot_g(), &rot);
        assert_eq!(op.rotate_k(&[0.25, 0.0, 0.0]), [0.0, 0.25, 0.0]);
    }

    #[test]
    fn test_inverse_transpose_of_shear() {
        let rot = [[1, 1, 0], [0, 1, 0], [0, 0, 1]];
        let op = SymmOp::new(rot, [0.0; 3], 1).unwrap();
        assert_eq!(op.rot_g(), &[[1, 0, 0], [-1, 1, 0], [0, 0, 1]]);
    }

    #[test]
    fn test_inversion() {
        let rot = [[-1, 0, 0], [0, -1, 0], [0, 0, -1]];
        let op = SymmOp::new(rot, [0.0; 3], 1).unwrap();
        assert_eq!(op.rotate_k(&[0.5, 0.25, 0.0]), [-0.5, -0.25, 0.0]);
    }

    #[test]
    fn test_singular_rotation_is_rejected() {
        let rot = [[1, 0, 0], [0, 1, 0], [0, 0, 0]];
        assert!(matches!(
            SymmOp::new(rot, [0.0; 3], 1),
            Err(DdbError::Validation { .. })
        ));
    }

    #[test]
    fn test_huge_entries_are_rejected() {
        let rot = [[2_000_000_000, 0, 0], [0, 2_000_000_000, 0], [0, 0, 2_000_000_000]];
        assert!(matches!(
            SymmOp::new(rot, [0.0; 3], 1),
            Err(DdbError::Validation { .. })
        ));

        let rot = [[i32::MIN, i32::MAX, 0], [i32::MAX, i32::MIN, 0], [0, 0, i32::MIN]];
        assert!(matches!(
            SymmOp::new(rot, [0.0; 3], 1),
            Err(DdbError::Validation { .. })
        ));
    }

    #[test]
    fn test_space_group_defaults() {
        let sg = SpaceGroup::from_symrel(&[[[1, 0, 0], [0, 1, 0], [0, 0, 1]]], &[[0.0; 3]], &[1])
            .unwrap();
        assert_eq!(sg.spgid, 0);
        assert!(sg.has_timerev);
        assert_eq!(sg.len(), 1);
    }
}
