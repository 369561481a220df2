//! # 态密度数据模型
//!
//! DOSCAR 的解析结果：能量轴（已减去费米能）、总态密度上下自旋、
//! 每个原子的分轨道投影态密度。
//!
//! 投影态密度每一列按列号交替取正负（第一列为正），因此自旋极化计算中
//! down 分量为负值，便于直接作图。
//!
//! ## 依赖关系
//! - 被 `parsers/doscar.rs`, `dos/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};

/// lm 分解轨道名称（VASP LORBIT=11 顺序）
const LM_ORBITALS: [&str; 16] = [
    "s", "py", "pz", "px", "dxy", "dyz", "dz2", "dxz", "dx2", "f1", "f2", "f3", "f4", "f5", "f6",
    "f7",
];

/// 角动量通道
const CHANNELS: [&str; 4] = ["s", "p", "d", "f"];

/// 单个原子的投影态密度表 (NEDOS x 轨道列数)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtomDos {
    pub rows: Vec<Vec<f64>>,
}

/// 按角动量合并后的通道
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalChannel {
    pub name: &'static str,
    pub up: Vec<f64>,
    /// 非自旋极化时为 None
    pub down: Option<Vec<f64>>,
}

impl AtomDos {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        AtomDos { rows }
    }

    /// 能量点数
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 轨道列数（取第一行）
    pub fn orbital_count(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    /// 取出某一轨道列的能量序列（已带符号）
    pub fn orbital_series(&self, column: usize) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.get(column).copied().unwrap_or(0.0))
            .collect()
    }

    /// 各轨道列的名称
    pub fn column_names(&self, spin_polarized: bool) -> Vec<String> {
        let ncol = self.orbital_count();
        let per_spin = if spin_polarized { ncol / 2 } else { ncol };
        let names = orbital_names(per_spin);

        if spin_polarized {
            names
                .iter()
                .flat_map(|n| [format!("{}_up", n), format!("{}_down", n)])
                .collect()
        } else {
            names
        }
    }

    /// 按 s/p/d/f 合并轨道
    ///
    /// 非自旋极化时撤销交替符号，得到原始值。
    pub fn channels(&self, spin_polarized: bool) -> Vec<OrbitalChannel> {
        let ncol = self.orbital_count();
        let nedos = self.len();
        let per_spin = if spin_polarized { ncol / 2 } else { ncol };
        let names = orbital_names(per_spin);

        let mut channels: Vec<OrbitalChannel> = Vec::new();
        for (k, orbital) in names.iter().enumerate() {
            let channel_name = channel_of(orbital);
            let idx = match channels.iter().position(|c| c.name == channel_name) {
                Some(i) => i,
                None => {
                    channels.push(OrbitalChannel {
                        name: channel_name,
                        up: vec![0.0; nedos],
                        down: spin_polarized.then(|| vec![0.0; nedos]),
                    });
                    channels.len() - 1
                }
            };
            let channel = &mut channels[idx];

            if spin_polarized {
                let (up_col, down_col) = (2 * k, 2 * k + 1);
                for (e, row) in self.rows.iter().enumerate() {
                    channel.up[e] += row.get(up_col).copied().unwrap_or(0.0);
                    if let Some(down) = channel.down.as_mut() {
                        down[e] += row.get(down_col).copied().unwrap_or(0.0);
                    }
                }
            } else {
                let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                for (e, row) in self.rows.iter().enumerate() {
                    channel.up[e] += sign * row.get(k).copied().unwrap_or(0.0);
                }
            }
        }

        channels
    }
}

/// 每个自旋分量的轨道名
fn orbital_names(per_spin: usize) -> Vec<String> {
    if per_spin <= CHANNELS.len() {
        CHANNELS[..per_spin].iter().map(|s| s.to_string()).collect()
    } else {
        (0..per_spin)
            .map(|i| {
                LM_ORBITALS
                    .get(i)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("orb{}", i + 1))
            })
            .collect()
    }
}

/// 轨道所属角动量通道
fn channel_of(orbital: &str) -> &'static str {
    match orbital.chars().next() {
        Some('s') => "s",
        Some('p') => "p",
        Some('d') => "d",
        Some('f') => "f",
        _ => "other",
    }
}

/// DOSCAR 解析结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DosData {
    /// 来源名称
    pub name: String,

    /// 第 1 行声明的原子数
    pub declared_atoms: usize,

    /// 第 6 行: Emax, Emin
    pub emax: f64,
    pub emin: f64,

    /// 能量采样点数
    pub nedos: usize,

    /// 费米能 (eV)
    pub fermi: f64,

    /// 总态密度行是否含上下自旋（5 列）
    pub spin_polarized: bool,

    /// 能量轴 E - E_fermi
    pub energy: Vec<f64>,

    /// 总态密度 up
    pub total_up: Vec<f64>,

    /// 总态密度 down（已取负）
    pub total_down: Vec<f64>,

    /// 每个原子的投影态密度
    pub atoms: Vec<AtomDos>,

    /// 投影态密度的轨道列数
    pub orbital_count: usize,
}

impl DosData {
    /// 是否包含投影态密度
    pub fn has_projections(&self) -> bool {
        !self.atoms.is_empty()
    }

    /// 费米能处（最接近 0 的能量点）的索引
    pub fn fermi_index(&self) -> Option<usize> {
        self.energy
            .iter()
            .enumerate()
            .min_by(|a, b| {
                a.1.abs()
                    .partial_cmp(&b.1.abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
    }
}
