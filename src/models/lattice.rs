//! # 晶格几何模型
//!
//! 保存 CHGCAR 第 3–5 行读出的三个晶格基矢，并派生出长度与夹角。
//!
//! 夹角顺序固定：先 2&3，再 1&3，最后 1&2（即 alpha, beta, gamma），
//! 下游 .grd 文件依赖该顺序，不可调换。
//!
//! ## 依赖关系
//! - 被 `parsers/chgcar.rs`, `writers/grd.rs` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};

/// 三维向量点积
#[inline]
pub fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// 晶格几何
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeGeometry {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    pub vectors: [[f64; 3]; 3],
}

impl LatticeGeometry {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(vectors: [[f64; 3]; 3]) -> Self {
        LatticeGeometry { vectors }
    }

    /// 三个基矢长度
    pub fn lengths(&self) -> [f64; 3] {
        let v = &self.vectors;
        [
            (v[0][0].powi(2) + v[0][1].powi(2) + v[0][2].powi(2)).sqrt(),
            (v[1][0].powi(2) + v[1][1].powi(2) + v[1][2].powi(2)).sqrt(),
            (v[2][0].powi(2) + v[2][1].powi(2) + v[2][2].powi(2)).sqrt(),
        ]
    }

    /// 三个夹角（度）：[∠(b,c), ∠(a,c), ∠(a,b)]
    pub fn angles(&self) -> [f64; 3] {
        let [a, b, c] = &self.vectors;
        let [la, lb, lc] = self.lengths();

        let alpha = (dot(b, c) / (lb * lc)).acos().to_degrees();
        let beta = (dot(a, c) / (la * lc)).acos().to_degrees();
        let gamma = (dot(a, b) / (lb * la)).acos().to_degrees();

        [alpha, beta, gamma]
    }

    /// 晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let [a, b, c] = self.lengths();
        let [alpha, beta, gamma] = self.angles();
        (a, b, c, alpha, beta, gamma)
    }

    /// 晶胞体积
    pub fn volume(&self) -> f64 {
        let [a, b, c] = &self.vectors;
        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }

    /// 两个晶格在给定容差内是否相同
    pub fn approx_eq(&self, other: &LatticeGeometry, tol: f64) -> bool {
        self.vectors
            .iter()
            .flatten()
            .zip(other.vectors.iter().flatten())
            .all(|(x, y)| (x - y).abs() <= tol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_orthogonal_unit_lattice_angles() {
        let lattice =
            LatticeGeometry::from_vectors([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        for angle in lattice.angles() {
            assert!((angle - 90.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_lengths() {
        let lattice =
            LatticeGeometry::from_vectors([[3.0, 4.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 5.0]]);
        let [a, b, c] = lattice.lengths();
        assert_relative_eq!(a, 5.0, epsilon = 1e-12);
        assert_relative_eq!(b, 2.0, epsilon = 1e-12);
        assert_relative_eq!(c, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hexagonal_angle_order() {
        // a, b 夹角 120°，c 垂直于 ab 平面
        let half_sqrt3 = 3.0_f64.sqrt() / 2.0;
        let lattice = LatticeGeometry::from_vectors([
            [3.0, 0.0, 0.0],
            [-1.5, 3.0 * half_sqrt3, 0.0],
            [0.0, 0.0, 5.0],
        ]);
        let [alpha, beta, gamma] = lattice.angles();
        assert_relative_eq!(alpha, 90.0, epsilon = 1e-9);
        assert_relative_eq!(beta, 90.0, epsilon = 1e-9);
        assert_relative_eq!(gamma, 120.0, epsilon = 1e-9);
    }

    #[test]
    fn test_monoclinic_beta_is_second() {
        let beta_rad = 100.0_f64.to_radians();
        let lattice = LatticeGeometry::from_vectors([
            [4.0, 0.0, 0.0],
            [0.0, 5.0, 0.0],
            [6.0 * beta_rad.cos(), 0.0, 6.0 * beta_rad.sin()],
        ]);
        let (_, _, _, alpha, beta, gamma) = lattice.parameters();
        assert_relative_eq!(alpha, 90.0, epsilon = 1e-9);
        assert_relative_eq!(beta, 100.0, epsilon = 1e-9);
        assert_relative_eq!(gamma, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_volume_cubic() {
        let lattice =
            LatticeGeometry::from_vectors([[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]]);
        assert_relative_eq!(lattice.volume(), 125.0, epsilon = 1e-9);
    }
}
