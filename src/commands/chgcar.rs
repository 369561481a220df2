//! # split / sum 命令实现
//!
//! - `split`: 将自旋极化 CHGCAR 拆分为 CHGCAR_tot 与 CHGCAR_mag
//! - `sum`: AECCAR0 + AECCAR2 求和，写出 CHGCAR_sum
//!
//! ## 依赖关系
//! - 使用 `cli/chgcar.rs` 定义的参数
//! - 使用 `parsers/chgcar.rs`, `writers/chgcar.rs`

use crate::cli::chgcar::{SplitArgs, SumArgs};
use vaspgrid::error::{Result, VaspGridError};
use vaspgrid::parsers::{parse_chgcar_file, split_chgcar, ParseOptions};
use vaspgrid::utils::output;
use vaspgrid::writers::write_chgcar;

use std::fs;
use std::path::Path;

/// 执行 split 命令
pub fn execute_split(args: SplitArgs) -> Result<()> {
    output::print_header("Split CHGCAR");

    if !args.input.is_file() {
        return Err(VaspGridError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let bytes = fs::read(&args.input).map_err(|e| VaspGridError::FileReadError {
        path: args.input.display().to_string(),
        source: e,
    })?;
    let content = String::from_utf8_lossy(&bytes);
    let split = split_chgcar(&content, &args.input.display().to_string())?;

    fs::create_dir_all(&args.output_dir).map_err(|e| VaspGridError::FileWriteError {
        path: args.output_dir.display().to_string(),
        source: e,
    })?;

    for (name, text) in [("CHGCAR_tot", &split.total), ("CHGCAR_mag", &split.magnetization)] {
        let path = args.output_dir.join(name);
        write_text(&path, text, args.overwrite)?;
    }

    output::print_done(&format!(
        "Split '{}' into CHGCAR_tot and CHGCAR_mag",
        args.input.display()
    ));
    Ok(())
}

/// 执行 sum 命令
pub fn execute_sum(args: SumArgs, options: ParseOptions) -> Result<()> {
    output::print_header("Sum charge densities");

    for path in [&args.first, &args.second] {
        if !path.is_file() {
            return Err(VaspGridError::FileNotFound {
                path: path.display().to_string(),
            });
        }
    }

    if args.output.exists() && !args.overwrite {
        output::print_skip(&format!(
            "'{}' exists (use --overwrite to replace)",
            args.output.display()
        ));
        return Ok(());
    }

    // 两个文件互相独立，并行读取
    let (first, second) = rayon::join(
        || parse_chgcar_file(&args.first, options),
        || parse_chgcar_file(&args.second, options),
    );
    let (first, second) = (first?, second?);

    let sum = first.try_add(&second, args.output.display().to_string())?;
    write_chgcar(&args.output, &sum)?;

    output::print_conversion(
        &format!("{} + {}", args.first.display(), args.second.display()),
        &args.output.display().to_string(),
    );
    Ok(())
}

/// 写出文本，已存在且不允许覆盖时跳过
fn write_text(path: &Path, text: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        output::print_skip(&format!(
            "'{}' exists (use --overwrite to replace)",
            path.display()
        ));
        return Ok(());
    }

    fs::write(path, text).map_err(|e| VaspGridError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    output::print_success(&format!("Wrote '{}'", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const AECCAR: &str = "\
H
   1.0
     3.0 0.0 0.0
     0.0 3.0 0.0
     0.0 0.0 3.0
   H
     1
Direct
  0.0 0.0 0.0

    1    1    2
 0.5 1.5
";

    #[test]
    fn test_sum_writes_chgcar() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("AECCAR0");
        let second = dir.path().join("AECCAR2");
        fs::write(&first, AECCAR).unwrap();
        fs::write(&second, AECCAR).unwrap();

        let output = dir.path().join("CHGCAR_sum");
        execute_sum(
            SumArgs {
                first,
                second,
                output: output.clone(),
                overwrite: false,
            },
            ParseOptions::default(),
        )
        .unwrap();

        let sum = parse_chgcar_file(&output, ParseOptions::default()).unwrap();
        assert_eq!(sum.density, vec![1.0, 3.0]);
    }

    #[test]
    fn test_split_latin1_title() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("CHGCAR");
        let mut raw = b"Fe \xC5\n".to_vec();
        raw.extend_from_slice(b"1.0\n2.8 0 0\n0 2.8 0\n0 0 2.8\nFe\n1\nDirect\n0 0 0\n\n    1    1    2\n");
        raw.extend_from_slice(b" 1.0 1.0\n    1    1    2\n -2.0 -2.0\n");
        fs::write(&input, raw).unwrap();

        let output_dir = dir.path().join("out");
        execute_split(SplitArgs {
            input,
            output_dir: output_dir.clone(),
            overwrite: false,
        })
        .unwrap();

        let mag = parse_chgcar_file(&output_dir.join("CHGCAR_mag"), ParseOptions::default())
            .unwrap();
        assert_eq!(mag.density, vec![-2.0, -2.0]);
    }

    #[test]
    fn test_split_requires_input() {
        let err = execute_split(SplitArgs {
            input: PathBuf::from("/nonexistent/CHGCAR"),
            output_dir: PathBuf::from("."),
            overwrite: false,
        })
        .unwrap_err();
        assert!(matches!(err, VaspGridError::FileNotFound { .. }));
    }
}
