//! # 声子相关的派生量
//!
//! - `mesh`: 由 q 点与对称操作推断 q 网格
//! - `becs`: 整理外部程序给出的 Born 有效电荷
//!
//! ## 依赖关系
//! - 被 `parsers/ddb.rs` 使用
//! - 使用 `models/`

pub mod becs;
pub mod mesh;

pub use becs::{Becs, BecsLayout};
pub use mesh::{guess_ngqpt, MeshGuess};
