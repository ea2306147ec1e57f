//! # 数据模型模块
//!
//! 定义晶体结构、对称操作与 q 点列表。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `phonon/`, `anaddb/` 和 `commands/` 使用
//! - 子模块: structure, symmetry, qpoints

pub mod qpoints;
pub mod structure;
pub mod symmetry;

pub use qpoints::{QPointList, QSelector};
pub use structure::{Atom, Crystal, Lattice};
pub use symmetry::{SpaceGroup, SymmOp};
