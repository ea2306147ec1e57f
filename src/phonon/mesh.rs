//! # q 网格推断
//!
//! 根据 DDB 中的 q 点及其星，猜测生成这些 q 点的规则网格 `ngqpt`。
//!
//! ## 算法
//! 1. 对每个 q 点施加全部旋转，得到星（不折回 [0, 1)）
//! 2. 将恰好为 0 的分量替换为 +inf
//! 3. 取绝对值后按轴求最小值 `smalls`
//! 4. `smalls` 中的 0 替换为 1
//! 5. `ngqpt = rint(1 / smalls)`，结果为 0 时取 1
//!
//! 若 DDB 中的 q 点来自多个网格，或网格带有平移，结果不正确但不会报错。
//! 某一轴的最小非零分量不小于 2 时该轴四舍五入为 0，回退为 1 并输出警告。
//!
//! ## 依赖关系
//! - 被 `parsers/ddb.rs` 使用
//! - 使用 `models/qpoints.rs`, `models/symmetry.rs`

use crate::error::{DdbError, Result};
use crate::models::{QPointList, SpaceGroup};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 推断出的 q 网格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshGuess(pub [i64; 3]);

impl MeshGuess {
    pub fn as_array(&self) -> [i64; 3] {
        self.0
    }

    /// 网格总点数
    pub fn num_points(&self) -> i64 {
        self.0.iter().product()
    }
}

impl fmt::Display for MeshGuess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.0[0], self.0[1], self.0[2])
    }
}

/// 所有 q 点的星的并集
pub fn star_union(qpoints: &QPointList, spacegroup: &SpaceGroup) -> Vec<[f64; 3]> {
    qpoints
        .iter()
        .flat_map(|q| spacegroup.iter().map(move |op| op.rotate_k(q)))
        .collect()
}

/// 推断 q 网格
pub fn guess_ngqpt(qpoints: &QPointList, spacegroup: &SpaceGroup) -> Result<MeshGuess> {
    if qpoints.is_empty() {
        return Err(DdbError::InvalidInput(
            "cannot guess the q-mesh from an empty list of q-points".to_string(),
        ));
    }
    if spacegroup.is_empty() {
        return Err(DdbError::InvalidInput(
            "cannot guess the q-mesh without symmetry operations".to_string(),
        ));
    }

    let mut smalls = [f64::INFINITY; 3];
    for q in star_union(qpoints, spacegroup) {
        for (axis, &c) in q.iter().enumerate() {
            let c = if c == 0.0 { f64::INFINITY } else { c.abs() };
            smalls[axis] = smalls[axis].min(c);
        }
    }

    let mut ngqpt = [1_i64; 3];
    for (axis, small) in smalls.iter_mut().enumerate() {
        if *small == 0.0 {
            *small = 1.0;
        }
        let n = (1.0 / *small).round_ties_even();
        if n == 0.0 && small.is_finite() {
            warn!(
                "q-mesh guess degenerate along axis {}: smallest |q| = {} gives no divisions, using 1",
                axis, small
            );
        }
        ngqpt[axis] = if n == 0.0 { 1 } else { n as i64 };
    }

    debug!("q-mesh guess: smalls = {:?}, ngqpt = {:?}", smalls, ngqpt);
    Ok(MeshGuess(ngqpt))
}
