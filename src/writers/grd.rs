//! # .grd 网格文件写出
//!
//! 将电荷密度写为 Materials Studio 可读的 `.grd` 格式。
//!
//! ## 文件格式
//! ```text
//! VASP charge density
//! (1p,e12.5)
//!   a  b  c  alpha  beta  gamma          # 保留 3 位小数
//!   NGX-1  NGY-1  NGZ-1
//!     1    0 NGX-1    0 NGY-1    0 NGZ-1   # 每个整数占 5 列
//!  1.23456E+02                           # 每行一个值
//! 0
//! ```
//!
//! 绝对值不超过 1e-5 的值写作 `0`（负值写作 `-0`），其余按 `%12.5E` 写出。
//!
//! ## 依赖关系
//! - 被 `commands/grd.rs` 调用
//! - 使用 `models/density.rs`

use crate::error::{Result, VaspGridError};
use crate::models::ChargeDensity;
use crate::writers::format_scientific;

use log::debug;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// 默认每写入多少个值刷新一次缓冲
pub const DEFAULT_FLUSH_EVERY: usize = 1000;

/// 截断阈值相对于用户输入的固定偏移
pub const CUTOFF_OFFSET: f64 = 100.0;

/// 关闭截断的哨兵值
pub const CUTOFF_DISABLED: f64 = -1.0;

/// 小于等于该绝对值的密度写作整数 0
const ZERO_THRESHOLD: f64 = 1e-5;

/// `%12.5E` 的字段宽度
const FIELD_WIDTH: usize = 12;

/// .grd 写出器
#[derive(Debug, Clone, Copy)]
pub struct GrdWriter {
    cutoff: Option<f64>,
    flush_every: usize,
}

impl Default for GrdWriter {
    fn default() -> Self {
        GrdWriter {
            cutoff: None,
            flush_every: DEFAULT_FLUSH_EVERY,
        }
    }
}

impl GrdWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置截断值：`|v| < cutoff - 100` 的值被置零
    pub fn cutoff(mut self, cutoff: Option<f64>) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// 按命令行约定解释截断值，-1 表示关闭
    pub fn with_cli_cutoff(self, cutoff: f64) -> Self {
        if cutoff == CUTOFF_DISABLED {
            self.cutoff(None)
        } else {
            self.cutoff(Some(cutoff))
        }
    }

    /// 设置刷新间隔（至少为 1）
    pub fn flush_every(mut self, n: usize) -> Self {
        self.flush_every = n.max(1);
        self
    }

    /// 写入文件
    pub fn write(&self, path: &Path, record: &ChargeDensity) -> Result<()> {
        let write_err = |e: io::Error| VaspGridError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        };

        let mut file = File::create(path).map_err(write_err)?;
        self.write_to(&mut file, record).map_err(write_err)?;

        debug!(
            "{}: wrote {} values ({} grid)",
            path.display(),
            record.density.len(),
            record.grid
        );
        Ok(())
    }

    /// 写入任意输出流
    pub fn write_to<W: Write>(&self, out: &mut W, record: &ChargeDensity) -> io::Result<()> {
        out.write_all(grd_header(record).as_bytes())?;

        let threshold = self.cutoff.map(|c| c - CUTOFF_OFFSET);
        let mut buffer = String::with_capacity(self.flush_every * (FIELD_WIDTH + 1));

        for (i, &raw) in record.density.iter().enumerate() {
            let value = match threshold {
                Some(t) if raw.abs() < t => 0.0,
                _ => raw,
            };
            buffer.push_str(&format_grd_value(value));
            buffer.push('\n');

            if (i + 1) % self.flush_every == 0 {
                out.write_all(buffer.as_bytes())?;
                buffer.clear();
            }
        }

        out.write_all(buffer.as_bytes())?;
        out.flush()
    }
}

/// 写出 .grd 文件，`cutoff == -1` 时不做截断
pub fn write_grd(path: &Path, record: &ChargeDensity, cutoff: f64) -> Result<()> {
    GrdWriter::new().with_cli_cutoff(cutoff).write(path, record)
}

/// 文件头五行
pub fn grd_header(record: &ChargeDensity) -> String {
    let [a, b, c] = record.geometry.lengths();
    let [alpha, beta, gamma] = record.geometry.angles();
    let [nx, ny, nz] = record.grid.cells();

    let mut header = String::new();
    header.push_str("VASP charge density\n");
    header.push_str("(1p,e12.5)\n");
    header.push_str(&format!(
        "  {:.3}  {:.3}  {:.3}  {:.3}  {:.3}  {:.3}\n",
        a, b, c, alpha, beta, gamma
    ));
    header.push_str(&format!("  {}  {}  {}\n", nx, ny, nz));
    header.push_str(&format!(
        "{:>5}{:>5}{:>5}{:>5}{:>5}{:>5}{:>5}\n",
        1, 0, nx, 0, ny, 0, nz
    ));
    header
}

/// 单个密度值的文本
pub fn format_grd_value(value: f64) -> String {
    if value.abs() > ZERO_THRESHOLD {
        let mut text = format_scientific(value, 5, FIELD_WIDTH);
        text.truncate(FIELD_WIDTH);
        text
    } else if value.is_nan() {
        if value.is_sign_negative() {
            "-nan".to_string()
        } else {
            "nan".to_string()
        }
    } else if value.is_sign_negative() {
        "-0".to_string()
    } else {
        "0".to_string()
    }
}
