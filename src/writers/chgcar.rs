//! # CHGCAR 格式写出
//!
//! 将电荷密度（例如 AECCAR0 + AECCAR2 的求和结果）重新写为 CHGCAR 格式。
//! 头部沿用解析时保存的原始行，网格行按 `{:>5}` 对齐，
//! 密度每行 5 个值，每个值按 `%18.11E` 格式化。
//!
//! ## 依赖关系
//! - 被 `commands/chgcar.rs` 调用
//! - 使用 `models/density.rs`

use crate::error::{Result, VaspGridError};
use crate::models::ChargeDensity;
use crate::writers::format_scientific;

use std::fs;
use std::path::Path;

/// 每行密度值个数
pub const VALUES_PER_LINE: usize = 5;

/// 转换为 CHGCAR 文本
pub fn to_chgcar_string(record: &ChargeDensity) -> String {
    let mut result = String::new();

    for line in &record.header {
        result.push_str(line);
        result.push('\n');
    }

    result.push_str(&format!(
        "{:>5}{:>5}{:>5}\n",
        record.grid.ngx, record.grid.ngy, record.grid.ngz
    ));

    for chunk in record.density.chunks(VALUES_PER_LINE) {
        let line: Vec<String> = chunk
            .iter()
            .map(|v| format_scientific(*v, 11, 18))
            .collect();
        result.push_str(&line.join(" "));
        result.push('\n');
    }

    result
}

/// 写出 CHGCAR 文件
pub fn write_chgcar(path: &Path, record: &ChargeDensity) -> Result<()> {
    fs::write(path, to_chgcar_string(record)).map_err(|e| VaspGridError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::chgcar::parse_chgcar_content;
    use crate::parsers::ParseOptions;

    const SAMPLE: &str = "\
Si
   1.0
     5.0 0.0 0.0
     0.0 5.0 0.0
     0.0 0.0 5.0
   Si
     1
Direct
  0.0 0.0 0.0

    2    2    2
 1.0 2.0 3.0 4.0 5.0
 6.0 7.0 8.0
";

    #[test]
    fn test_layout() {
        let record = parse_chgcar_content(SAMPLE, "CHGCAR", ParseOptions::default()).unwrap();
        let text = to_chgcar_string(&record);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 10 + 1 + 2);
        assert_eq!(lines[0], "Si");
        assert_eq!(lines[10], "    2    2    2");
        assert_eq!(
            lines[11],
            " 1.00000000000E+00  2.00000000000E+00  3.00000000000E+00  4.00000000000E+00  5.00000000000E+00"
        );
        assert_eq!(
            lines[12],
            " 6.00000000000E+00  7.00000000000E+00  8.00000000000E+00"
        );
    }

    #[test]
    fn test_reparse_written_file() {
        let record = parse_chgcar_content(SAMPLE, "CHGCAR", ParseOptions::default()).unwrap();
        let sum = record.try_add(&record, "CHGCAR_sum").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CHGCAR_sum");
        write_chgcar(&path, &sum).unwrap();

        let reread = crate::parsers::parse_chgcar_file(&path, ParseOptions::default()).unwrap();
        assert_eq!(reread.grid, sum.grid);
        assert_eq!(reread.density, vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0]);
    }
}
