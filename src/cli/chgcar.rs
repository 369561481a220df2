//! # split / sum 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/chgcar.rs`

use clap::Args;
use std::path::PathBuf;

/// split 子命令参数
#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Spin-polarized CHGCAR to split
    #[arg(default_value = "CHGCAR")]
    pub input: PathBuf,

    /// Directory for CHGCAR_tot and CHGCAR_mag
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Overwrite existing output files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

/// sum 子命令参数
#[derive(Args, Debug)]
pub struct SumArgs {
    /// First density (core charge)
    #[arg(default_value = "AECCAR0")]
    pub first: PathBuf,

    /// Second density (valence charge)
    #[arg(default_value = "AECCAR2")]
    pub second: PathBuf,

    /// Output CHGCAR file
    #[arg(short, long, default_value = "CHGCAR_sum")]
    pub output: PathBuf,

    /// Overwrite existing output file
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}
