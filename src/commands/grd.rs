//! # grd 命令实现
//!
//! CHGCAR 类文件转换为 .grd 网格文件。
//!
//! ## 功能
//! - 单文件模式：默认输出 `vasp.grd`
//! - 目录模式：按 glob 模式收集文件，并行转换，输出 `<name>.grd`
//! - 可选截断（`--cutoff`，-1 关闭）
//!
//! ## 依赖关系
//! - 使用 `cli/grd.rs` 定义的参数
//! - 使用 `parsers/chgcar.rs`, `writers/grd.rs`
//! - 使用 `batch/` 模块进行批量处理

use crate::cli::grd::GrdArgs;
use crate::commands::print_summary;
use vaspgrid::batch::{BatchRunner, FileCollector, ProcessResult};
use vaspgrid::error::{Result, VaspGridError};
use vaspgrid::models::ChargeDensity;
use vaspgrid::parsers::{parse_chgcar_file, ParseOptions};
use vaspgrid::utils::{output, progress};
use vaspgrid::writers::grd::{CUTOFF_DISABLED, CUTOFF_OFFSET};
use vaspgrid::writers::GrdWriter;

use std::fs;
use std::path::{Path, PathBuf};

/// 单文件模式的默认输出名
const DEFAULT_GRD_NAME: &str = "vasp.grd";

/// 执行 grd 命令
pub fn execute(args: GrdArgs, options: ParseOptions) -> Result<()> {
    output::print_header("Charge density -> .grd");

    if args.input.is_file() {
        execute_single_file(&args, options)
    } else if args.input.is_dir() {
        execute_batch(&args, options)
    } else {
        Err(VaspGridError::FileNotFound {
            path: args.input.display().to_string(),
        })
    }
}

fn writer_for(args: &GrdArgs) -> GrdWriter {
    GrdWriter::new()
        .with_cli_cutoff(args.cutoff)
        .flush_every(args.flush_every)
}

/// 单文件模式
fn execute_single_file(args: &GrdArgs, options: ParseOptions) -> Result<()> {
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_GRD_NAME));

    if output_path.exists() && !args.overwrite {
        output::print_skip(&format!(
            "'{}' exists (use --overwrite to replace)",
            output_path.display()
        ));
        return Ok(());
    }

    let spinner = progress::create_spinner(&format!("Reading {}", args.input.display()));
    let parsed = parse_chgcar_file(&args.input, options);
    spinner.finish_and_clear();
    let record = parsed?;

    print_density_summary(&record, args.cutoff);

    writer_for(args).write(&output_path, &record)?;
    output::print_conversion(
        &args.input.display().to_string(),
        &output_path.display().to_string(),
    );
    Ok(())
}

/// 批量处理模式
fn execute_batch(args: &GrdArgs, options: ParseOptions) -> Result<()> {
    output::print_info(&format!("Batch mode: directory '{}'", args.input.display()));

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .exclude_extension("grd")
        .recursive(args.recursive)
        .collect();

    if files.is_empty() {
        return Err(VaspGridError::NoFilesFound {
            pattern: args.pattern.clone(),
        });
    }
    output::print_info(&format!("Found {} density files", files.len()));

    if let Some(dir) = &args.output {
        fs::create_dir_all(dir).map_err(|e| VaspGridError::FileWriteError {
            path: dir.display().to_string(),
            source: e,
        })?;
    }

    let writer = writer_for(args);
    let mut runner = BatchRunner::new(args.jobs);
    if args.quiet {
        runner = runner.quiet();
    }
    let result = runner.run(files, |file| {
        let target = output_path_for(file, &args.input, args.output.as_deref());
        convert_one(file, &target, writer, options, args.overwrite)
    })?;

    output::print_separator();
    output::print_success(&format!(
        "Batch complete: {} success, {} skipped, {} failed",
        result.success, result.skipped, result.failed
    ));

    output::print_failures(&result.failures, 10);

    Ok(())
}

/// 转换单个文件（批量模式）
fn convert_one(
    input: &Path,
    target: &Path,
    writer: GrdWriter,
    options: ParseOptions,
    overwrite: bool,
) -> ProcessResult {
    if target.exists() && !overwrite {
        return ProcessResult::Skipped(target.display().to_string());
    }

    let converted = parse_chgcar_file(input, options).and_then(|record| writer.write(target, &record));
    match converted {
        Ok(()) => ProcessResult::Success(format!("{} -> {}", input.display(), target.display())),
        Err(e) => ProcessResult::Failed(input.display().to_string(), e.to_string()),
    }
}

/// 批量模式的输出路径
///
/// 未指定输出目录时写在输入文件旁；指定时用相对路径各段以 `_` 连接，
/// 避免递归模式下同名文件互相覆盖。
fn output_path_for(input: &Path, root: &Path, output_dir: Option<&Path>) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "density".to_string());

    match output_dir {
        None => input.with_file_name(format!("{}.grd", file_name)),
        Some(dir) => {
            let relative = input.strip_prefix(root).unwrap_or(input);
            let flat: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            let name = if flat.is_empty() {
                file_name
            } else {
                flat.join("_")
            };
            dir.join(format!("{}.grd", name))
        }
    }
}

/// 打印密度摘要
fn print_density_summary(record: &ChargeDensity, cutoff: f64) {
    let (a, b, c, alpha, beta, gamma) = record.geometry.parameters();
    let range = record
        .density_range()
        .map(|(lo, hi)| format!("{:.5E} .. {:.5E}", lo, hi))
        .unwrap_or_else(|| "-".to_string());
    let cutoff = if cutoff == CUTOFF_DISABLED {
        "disabled".to_string()
    } else {
        format!("|v| < {}", cutoff - CUTOFF_OFFSET)
    };

    print_summary(
        &record.name,
        vec![
            ("Lattice (Å)", format!("{:.3}  {:.3}  {:.3}", a, b, c)),
            ("Angles (°)", format!("{:.3}  {:.3}  {:.3}", alpha, beta, gamma)),
            ("Volume (Å³)", format!("{:.3}", record.geometry.volume().abs())),
            (
                "Atoms",
                record
                    .total_atoms()
                    .map_or_else(|| "-".to_string(), |n| n.to_string()),
            ),
            ("Grid", record.grid.to_string()),
            ("Values", record.density.len().to_string()),
            ("Range", range),
            ("Cutoff", cutoff),
        ],
    );
}
