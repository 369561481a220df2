//! # 电荷密度数据模型
//!
//! CHGCAR 类文件的解析结果：晶格几何 + 网格维度 + 展平的密度数组。
//! 密度数组保持源文件顺序，不做 reshape。
//!
//! ## 依赖关系
//! - 被 `parsers/chgcar.rs`, `writers/` 使用
//! - 使用 `models/lattice.rs`

use crate::error::{Result, VaspGridError};
use crate::models::LatticeGeometry;
use serde::{Deserialize, Serialize};

/// 网格维度 (NGX, NGY, NGZ)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub ngx: usize,
    pub ngy: usize,
    pub ngz: usize,
}

impl GridDimensions {
    pub fn new(ngx: usize, ngy: usize, ngz: usize) -> Self {
        GridDimensions { ngx, ngy, ngz }
    }

    /// 网格点总数，乘积溢出时为 None
    pub fn total(&self) -> Option<usize> {
        self.ngx.checked_mul(self.ngy)?.checked_mul(self.ngz)
    }

    /// 格子数（.grd 文件使用的 N-1 约定）
    pub fn cells(&self) -> [usize; 3] {
        [
            self.ngx.saturating_sub(1),
            self.ngy.saturating_sub(1),
            self.ngz.saturating_sub(1),
        ]
    }
}

impl std::fmt::Display for GridDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.ngx, self.ngy, self.ngz)
    }
}

/// 电荷密度记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeDensity {
    /// 来源名称（文件路径）
    pub name: String,

    /// 晶格几何
    pub geometry: LatticeGeometry,

    /// 每种元素的原子数（第 7 行）
    pub atom_counts: Vec<i64>,

    /// 网格维度
    pub grid: GridDimensions,

    /// 展平的密度数组，长度 NGX*NGY*NGZ
    pub density: Vec<f64>,

    /// 网格行之前的原始头部（标题、晶格、元素、坐标、空行）
    pub header: Vec<String>,
}

impl ChargeDensity {
    /// 总原子数，求和溢出时为 None
    pub fn total_atoms(&self) -> Option<i64> {
        checked_count_sum(&self.atom_counts)
    }

    /// 密度最小值与最大值
    pub fn density_range(&self) -> Option<(f64, f64)> {
        if self.density.is_empty() {
            return None;
        }
        let min = self.density.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self
            .density
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }

    /// 两个密度逐点相加（AECCAR0 + AECCAR2 -> CHGCAR_sum）
    ///
    /// 网格维度不同返回 `GridMismatch`，晶格或原子数不同返回 `StructureMismatch`。
    /// 结果沿用左操作数的头部。
    pub fn try_add(&self, other: &ChargeDensity, name: impl Into<String>) -> Result<ChargeDensity> {
        if self.grid != other.grid {
            return Err(VaspGridError::GridMismatch {
                left: format!("{} ({})", self.name, self.grid),
                right: format!("{} ({})", other.name, other.grid),
            });
        }

        if self.atom_counts != other.atom_counts || !self.geometry.approx_eq(&other.geometry, 1e-6)
        {
            return Err(VaspGridError::StructureMismatch {
                left: self.name.clone(),
                right: other.name.clone(),
            });
        }

        let density = self
            .density
            .iter()
            .zip(other.density.iter())
            .map(|(a, b)| a + b)
            .collect();

        Ok(ChargeDensity {
            name: name.into(),
            geometry: self.geometry.clone(),
            atom_counts: self.atom_counts.clone(),
            grid: self.grid,
            density,
            header: self.header.clone(),
        })
    }
}

/// 第 7 行原子数之和
pub fn checked_count_sum(counts: &[i64]) -> Option<i64> {
    counts.iter().try_fold(0i64, |acc, &n| acc.checked_add(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, grid: GridDimensions, value: f64) -> ChargeDensity {
        ChargeDensity {
            name: name.to_string(),
            geometry: LatticeGeometry::from_vectors([
                [2.0, 0.0, 0.0],
                [0.0, 2.0, 0.0],
                [0.0, 0.0, 2.0],
            ]),
            atom_counts: vec![1],
            grid,
            density: vec![value; grid.total().unwrap()],
            header: vec!["title".to_string()],
        }
    }

    #[test]
    fn test_grid_cells() {
        let grid = GridDimensions::new(4, 5, 6);
        assert_eq!(grid.total(), Some(120));
        assert_eq!(grid.cells(), [3, 4, 5]);
        assert_eq!(grid.to_string(), "4x5x6");
    }

    #[test]
    fn test_grid_total_overflow() {
        let grid = GridDimensions::new(3_000_000, 3_000_000, 3_000_000);
        assert_eq!(grid.total(), None);
    }

    #[test]
    fn test_count_sum_overflow() {
        assert_eq!(checked_count_sum(&[3, 4]), Some(7));
        assert_eq!(checked_count_sum(&[i64::MAX, i64::MAX]), None);
    }

    #[test]
    fn test_try_add() {
        let grid = GridDimensions::new(2, 2, 2);
        let a = sample("AECCAR0", grid, 1.5);
        let b = sample("AECCAR2", grid, 2.0);
        let sum = a.try_add(&b, "CHGCAR_sum").unwrap();

        assert_eq!(sum.name, "CHGCAR_sum");
        assert_eq!(sum.density.len(), 8);
        assert!(sum.density.iter().all(|&v| (v - 3.5).abs() < 1e-12));
        assert_eq!(sum.header, a.header);
    }

    #[test]
    fn test_try_add_grid_mismatch() {
        let a = sample("A", GridDimensions::new(2, 2, 2), 1.0);
        let b = sample("B", GridDimensions::new(2, 2, 3), 1.0);
        let err = a.try_add(&b, "sum").unwrap_err();
        assert!(matches!(err, VaspGridError::GridMismatch { .. }));
    }

    #[test]
    fn test_try_add_structure_mismatch() {
        let grid = GridDimensions::new(2, 2, 2);
        let a = sample("A", grid, 1.0);
        let mut b = sample("B", grid, 1.0);
        b.atom_counts = vec![2];
        let err = a.try_add(&b, "sum").unwrap_err();
        assert!(matches!(err, VaspGridError::StructureMismatch { .. }));
    }

    #[test]
    fn test_density_range() {
        let mut rho = sample("A", GridDimensions::new(1, 1, 3), 0.0);
        rho.density = vec![-1.0, 4.0, 2.0];
        assert_eq!(rho.density_range(), Some((-1.0, 4.0)));
    }
}
