//! # vaspgrid - VASP 电荷密度与态密度处理工具
//!
//! 将 CHGCAR / DOSCAR 解析与 .grd 转换整合为单一可执行文件。
//!
//! ## 子命令
//! - `grd`   - CHGCAR 类文件转换为 .grd（支持目录批量）
//! - `dos`   - DOSCAR 解析、CSV 导出与作图
//! - `split` - 拆分自旋极化 CHGCAR
//! - `sum`   - AECCAR0 + AECCAR2 求和
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   └── commands/   (命令执行逻辑)
//!         └── vaspgrid (库: parsers/ writers/ dos/ batch/ models/ utils/)
//! ```

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use vaspgrid::utils::output;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    if let Err(e) = commands::run(cli) {
        output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
