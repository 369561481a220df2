//! # 数据模型模块
//!
//! 定义电荷密度与态密度的解析结果数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `writers/`, `dos/` 和 `commands/` 使用
//! - 子模块: lattice, density, dos

pub mod density;
pub mod dos;
pub mod lattice;

pub use density::{ChargeDensity, GridDimensions};
pub use dos::{AtomDos, DosData, OrbitalChannel};
pub use lattice::LatticeGeometry;
