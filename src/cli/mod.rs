//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `grd`: CHGCAR 类文件转换为 .grd（支持目录批量）
//! - `dos`: DOSCAR 解析、导出与作图
//! - `split`: 自旋极化 CHGCAR 拆分为 CHGCAR_tot / CHGCAR_mag
//! - `sum`: AECCAR0 + AECCAR2 求和为 CHGCAR_sum
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: grd, dos, chgcar

pub mod chgcar;
pub mod dos;
pub mod grd;

use clap::{ArgAction, Parser, Subcommand};
use vaspgrid::parsers::{NumericMode, ParseOptions};

/// vaspgrid - VASP 电荷密度与态密度处理工具
#[derive(Parser)]
#[command(name = "vaspgrid")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Parse VASP CHGCAR/DOSCAR files and convert charge densities to .grd", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reject malformed numbers instead of reading them as 0
    #[arg(long, global = true, env = "VASPGRID_STRICT", default_value_t = false)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// 由全局参数构造解析选项
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            numeric: if self.strict {
                NumericMode::Strict
            } else {
                NumericMode::Permissive
            },
        }
    }
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Convert CHGCAR-like files to the .grd grid format
    Grd(grd::GrdArgs),

    /// Parse a DOSCAR file, export CSV and plot
    Dos(dos::DosArgs),

    /// Split a spin-polarized CHGCAR into CHGCAR_tot and CHGCAR_mag
    Split(chgcar::SplitArgs),

    /// Sum two charge densities (AECCAR0 + AECCAR2 -> CHGCAR_sum)
    Sum(chgcar::SumArgs),
}
