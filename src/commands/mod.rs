//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `writers/`, `dos/`, `utils/`
//! - 子模块: grd, dos, chgcar

pub mod chgcar;
pub mod dos;
pub mod grd;

use crate::cli::{Cli, Commands};
use vaspgrid::error::Result;
use vaspgrid::utils::output;

use tabled::{Table, Tabled};

/// 执行命令
pub fn run(cli: Cli) -> Result<()> {
    let options = cli.parse_options();
    match cli.command {
        Commands::Grd(args) => grd::execute(args, options),
        Commands::Dos(args) => dos::execute(args, options),
        Commands::Split(args) => chgcar::execute_split(args),
        Commands::Sum(args) => chgcar::execute_sum(args, options),
    }
}

/// 两列摘要表的一行
#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// 打印带标题的摘要表
pub(crate) fn print_summary(title: &str, rows: Vec<(&str, String)>) {
    let rows: Vec<SummaryRow> = rows
        .into_iter()
        .map(|(field, value)| SummaryRow {
            field: field.to_string(),
            value,
        })
        .collect();

    output::print_header(title);
    println!("{}", Table::new(&rows));
}
