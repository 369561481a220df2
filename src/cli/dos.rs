//! # dos 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/dos.rs`

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 图片格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PlotFormat {
    /// PNG image
    Png,
    /// SVG vector image
    Svg,
}

/// dos 子命令参数
#[derive(Args, Debug)]
pub struct DosArgs {
    /// Path to the DOSCAR file
    #[arg(default_value = "DOSCAR")]
    pub input: PathBuf,

    /// Atoms to export/plot (1-based, e.g. '1,3-5')
    #[arg(short, long)]
    pub atoms: Option<String>,

    /// Directory for CSV export (total DOS and selected atoms)
    #[arg(long)]
    pub csv_dir: Option<PathBuf>,

    /// Write a DOS plot to this file
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Plot format (inferred from --plot extension when omitted)
    #[arg(long, value_enum)]
    pub format: Option<PlotFormat>,

    /// Energy window relative to E_fermi, e.g. '-5:5'
    #[arg(short, long, allow_hyphen_values = true)]
    pub window: Option<String>,

    /// Only read the header and report dimensions
    #[arg(long, default_value_t = false)]
    pub scan: bool,
}

/// 解析原子选择 "1,3-5" -> [0, 2, 3, 4]
pub fn parse_atom_selection(input: &str) -> Result<Vec<usize>, String> {
    let mut atoms = Vec::new();

    for part in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (parse_index(a)?, parse_index(b)?),
            None => {
                let i = parse_index(part)?;
                (i, i)
            }
        };
        if end < start {
            return Err(format!("Invalid atom range '{}'", part));
        }
        atoms.extend((start..=end).map(|i| i - 1));
    }

    if atoms.is_empty() {
        return Err(format!("No atoms selected by '{}'", input));
    }
    atoms.sort_unstable();
    atoms.dedup();
    Ok(atoms)
}

fn parse_index(token: &str) -> Result<usize, String> {
    match token.trim().parse::<usize>() {
        Ok(i) if i >= 1 => Ok(i),
        _ => Err(format!("Invalid atom index '{}' (atoms are 1-based)", token)),
    }
}

/// 解析能量窗口 "-5:5"
pub fn parse_window(input: &str) -> Result<(f64, f64), String> {
    let (lo, hi) = input
        .split_once(':')
        .ok_or_else(|| format!("Invalid energy window '{}', expected MIN:MAX", input))?;
    let lo: f64 = lo
        .trim()
        .parse()
        .map_err(|_| format!("Invalid energy '{}'", lo))?;
    let hi: f64 = hi
        .trim()
        .parse()
        .map_err(|_| format!("Invalid energy '{}'", hi))?;

    if hi <= lo {
        return Err(format!("Energy window '{}' must satisfy MIN < MAX", input));
    }
    Ok((lo, hi))
}
