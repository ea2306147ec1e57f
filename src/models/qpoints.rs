//! # q 点列表数据模型
//!
//! 存储从 DDB 中提取的 q 点（约化倒空间坐标），并提供按序号或坐标的查找与选择。
//!
//! ## 依赖关系
//! - 被 `parsers/qpoints.rs` 构造
//! - 被 `phonon/mesh.rs`, `parsers/ddb.rs` 使用

use crate::error::{DdbError, Result};
use serde::{Deserialize, Serialize};

/// 判断两个 q 点是否等价的容差
pub const QPOINT_ATOL: f64 = 1e-8;

/// q 点选择方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QSelector {
    /// 列表中的序号
    Index(usize),
    /// 约化坐标
    Coords([f64; 3]),
}

impl From<usize> for QSelector {
    fn from(index: usize) -> Self {
        QSelector::Index(index)
    }
}

impl From<[f64; 3]> for QSelector {
    fn from(coords: [f64; 3]) -> Self {
        QSelector::Coords(coords)
    }
}

/// 两个约化坐标相差一个倒格矢时视为同一 q 点
pub fn is_same_q(a: &[f64; 3], b: &[f64; 3]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| {
        let d = x - y;
        (d - d.round()).abs() < QPOINT_ATOL
    })
}

/// 有序、去重后的 q 点列表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QPointList {
    points: Vec<[f64; 3]>,
}

impl QPointList {
    pub fn new(points: Vec<[f64; 3]>) -> Self {
        QPointList { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[f64; 3]> {
        self.points.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, [f64; 3]> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// 查找 q 点在列表中的序号
    pub fn index_of(&self, q: &[f64; 3]) -> Option<usize> {
        self.points.iter().position(|p| is_same_q(p, q))
    }

    /// 将选择器解析为列表中的序号
    pub fn qindex(&self, selector: QSelector) -> Result<usize> {
        match selector {
            QSelector::Index(i) if i < self.points.len() => Ok(i),
            QSelector::Index(i) => Err(DdbError::NotFound(format!(
                "q-point index {} out of range ({} q-points)",
                i,
                self.points.len()
            ))),
            QSelector::Coords(q) => self.index_of(&q).ok_or_else(|| {
                DdbError::NotFound(format!(
                    "input q-point {:?} not in DDB q-points {:?}",
                    q, self.points
                ))
            }),
        }
    }

    /// 选择单个 q 点
    ///
    /// 未指定时仅当列表恰有一个 q 点才成功。
    pub fn select(&self, selector: Option<QSelector>) -> Result<[f64; 3]> {
        match selector {
            Some(sel) => Ok(self.points[self.qindex(sel)?]),
            None => match self.points.len() {
                0 => Err(DdbError::NotFound("DDB contains no q-points".to_string())),
                1 => Ok(self.points[0]),
                count => Err(DdbError::AmbiguousSelection { count }),
            },
        }
    }
}

impl std::ops::Index<usize> for QPointList {
    type Output = [f64; 3];

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<'a> IntoIterator for &'a QPointList {
    type Item = &'a [f64; 3];
    type IntoIter = std::slice::Iter<'a, [f64; 3]>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
