//! # grd 子命令 CLI 定义
//!
//! CHGCAR 类文件转换为 .grd，输入为目录时批量并行转换。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/grd.rs`

use clap::Args;
use std::path::PathBuf;

/// grd 子命令参数
#[derive(Args, Debug)]
pub struct GrdArgs {
    /// Input CHGCAR-like file, or a directory for batch conversion
    #[arg(default_value = "CHGCAR_mag")]
    pub input: PathBuf,

    /// Output .grd file (single file) or output directory (batch)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Zero densities with |v| < cutoff - 100 (-1 disables)
    #[arg(short = 'd', long, default_value_t = -1.0, allow_negative_numbers = true)]
    pub cutoff: f64,

    /// Glob pattern(s) for batch mode, comma separated
    #[arg(short, long, default_value = "CHGCAR*")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, env = "VASPGRID_JOBS", default_value_t = 0)]
    pub jobs: usize,

    /// Values buffered between writes
    #[arg(long, default_value_t = 1000)]
    pub flush_every: usize,

    /// Overwrite existing output files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Hide the batch progress bar
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}
