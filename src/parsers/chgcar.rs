//! # VASP CHGCAR 解析器
//!
//! 解析 CHGCAR / CHGCAR_mag / CHGCAR_tot / AECCAR* 等电荷密度文件。
//!
//! ## CHGCAR 格式说明
//! ```text
//! Comment line                          # line 1
//! 1.0                                   # line 2  scaling factor (未使用)
//! a1 a2 a3                              # line 3  lattice vector a
//! b1 b2 b3                              # line 4  lattice vector b
//! c1 c2 c3                              # line 5  lattice vector c
//! Element1 Element2 ...                 # line 6  (触发夹角计算)
//! n1 n2 ...                             # line 7  每种元素原子数
//! Direct                                # line 8
//! x y z                                 # line 9 .. 8+N
//! (blank)                               # line 9+N
//! NGX NGY NGZ                           # line 10+N  网格维度
//! rho rho rho rho rho                   # 之后全部为密度值
//! ```
//!
//! 网格行的位置由第 7 行原子数之和推得，逐行状态机见 [`ChgcarState`]。
//! 状态机本身不检查数据完整性，`parse_*` 入口在结束后校验
//! `len(density) == NGX*NGY*NGZ`，不一致时返回 `MalformedInput`。
//!
//! ## 依赖关系
//! - 被 `commands/grd.rs`, `commands/chgcar.rs` 使用
//! - 使用 `parsers/tokens.rs`, `models/density.rs`

use crate::error::{Result, VaspGridError};
use crate::models::density::checked_count_sum;
use crate::models::{ChargeDensity, GridDimensions, LatticeGeometry};
use crate::parsers::tokens::{lossy_lines, LineTokenizer, ParseOptions};

use log::{debug, warn};
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const FORMAT: &str = "CHGCAR";

/// 网格维度行：三个正整数
const GRID_LINE_PATTERN: &str = r"^\s*(\d+)\s+(\d+)\s+(\d+)\s*$";

/// 逐行解析状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChgcarState {
    /// 第 1–2 行：标题与缩放因子
    ReadingTitle,
    /// 第 3–5 行：晶格向量，`row` 为 0..3
    ReadingLattice { row: usize },
    /// 第 6 行：内容忽略，仅触发夹角计算
    ReadingSpecies,
    /// 第 7 行：各元素原子数
    ReadingElementCounts,
    /// 等待网格维度行（行号 `at` = 原子数之和 + 10）
    ReadingGridHeader { at: usize },
    /// 网格行之后：全部为密度值
    ReadingDensityBody,
}

/// 给定原子总数时网格维度行的行号（1 起）
pub fn grid_header_line(sum_elements: usize) -> usize {
    sum_elements.saturating_add(10)
}

/// 第 7 行原子数之和，溢出或为负时返回 `MalformedInput`
fn total_atom_count(counts: &[i64], source: &str) -> Result<usize> {
    let sum = checked_count_sum(counts).ok_or_else(|| {
        VaspGridError::malformed(FORMAT, source, "total atom count on line 7 overflows")
    })?;
    usize::try_from(sum).map_err(|_| {
        VaspGridError::malformed(
            FORMAT,
            source,
            format!("negative total atom count {} on line 7", sum),
        )
    })
}

/// 状态机累积的中间结果
#[derive(Debug)]
struct ChgcarScanner<'a> {
    tokenizer: LineTokenizer<'a>,
    state: ChgcarState,
    vectors: [[f64; 3]; 3],
    angles_ready: bool,
    atom_counts: Vec<i64>,
    grid: Option<[i64; 3]>,
    density: Vec<f64>,
    header: Vec<String>,
}

impl<'a> ChgcarScanner<'a> {
    fn new(tokenizer: LineTokenizer<'a>) -> Self {
        ChgcarScanner {
            tokenizer,
            state: ChgcarState::ReadingTitle,
            vectors: [[0.0; 3]; 3],
            angles_ready: false,
            atom_counts: Vec::new(),
            grid: None,
            density: Vec::new(),
            header: Vec::new(),
        }
    }

    /// 处理第 `lineno` 行（1 起）
    fn feed(&mut self, lineno: usize, line: &str) -> Result<()> {
        if self.state != ChgcarState::ReadingDensityBody
            && !matches!(self.state, ChgcarState::ReadingGridHeader { at } if at == lineno)
        {
            self.header.push(line.to_string());
        }

        match self.state {
            ChgcarState::ReadingTitle => {
                if lineno == 2 {
                    self.state = ChgcarState::ReadingLattice { row: 0 };
                }
            }
            ChgcarState::ReadingLattice { row } => {
                let values = self.tokenizer.floats(line, lineno)?;
                for (j, v) in values.into_iter().take(3).enumerate() {
                    self.vectors[row][j] = v;
                }
                self.state = if row == 2 {
                    ChgcarState::ReadingSpecies
                } else {
                    ChgcarState::ReadingLattice { row: row + 1 }
                };
            }
            ChgcarState::ReadingSpecies => {
                self.angles_ready = true;
                self.state = ChgcarState::ReadingElementCounts;
            }
            ChgcarState::ReadingElementCounts => {
                self.atom_counts = self.tokenizer.ints(line, lineno)?;
                let sum = total_atom_count(&self.atom_counts, self.tokenizer.source)?;
                let at = grid_header_line(sum);
                debug!(
                    "{}: {} atoms declared, grid header expected on line {}",
                    self.tokenizer.source, sum, at
                );
                self.state = ChgcarState::ReadingGridHeader { at };
            }
            ChgcarState::ReadingGridHeader { at } => {
                if lineno == at {
                    let dims = self.tokenizer.ints(line, lineno)?;
                    if dims.len() < 3 {
                        return Err(VaspGridError::malformed(
                            FORMAT,
                            self.tokenizer.source,
                            format!("grid header on line {} has {} values", lineno, dims.len()),
                        ));
                    }
                    debug!(
                        "{}: grid {}x{}x{}",
                        self.tokenizer.source, dims[0], dims[1], dims[2]
                    );
                    self.grid = Some([dims[0], dims[1], dims[2]]);
                    self.state = ChgcarState::ReadingDensityBody;
                }
            }
            ChgcarState::ReadingDensityBody => {
                let values = self.tokenizer.floats(line, lineno)?;
                self.density.extend(values);
            }
        }

        Ok(())
    }

    /// 校验并生成最终记录
    fn finish(self) -> Result<ChargeDensity> {
        let source = self.tokenizer.source;

        if !self.angles_ready {
            return Err(VaspGridError::malformed(
                FORMAT,
                source,
                "file ends before the lattice block is complete",
            ));
        }

        let dims = match self.grid {
            Some(d) => d,
            None => {
                let reason = match self.state {
                    ChgcarState::ReadingGridHeader { at } => {
                        format!("grid header line {} not reached", at)
                    }
                    _ => "atom counts on line 7 never read".to_string(),
                };
                warn!("{}: {}", source, reason);
                return Err(VaspGridError::malformed(FORMAT, source, reason));
            }
        };

        if dims.iter().any(|&n| n <= 0) {
            return Err(VaspGridError::malformed(
                FORMAT,
                source,
                format!(
                    "non-positive grid dimensions {} {} {}",
                    dims[0], dims[1], dims[2]
                ),
            ));
        }

        let grid = GridDimensions::new(dims[0] as usize, dims[1] as usize, dims[2] as usize);
        let expected = grid.total().ok_or_else(|| {
            VaspGridError::malformed(
                FORMAT,
                source,
                format!("grid {} has more points than can be addressed", grid),
            )
        })?;
        if self.density.len() != expected {
            warn!(
                "{}: expected {} density values, found {}",
                source,
                expected,
                self.density.len()
            );
            return Err(VaspGridError::malformed(
                FORMAT,
                source,
                format!(
                    "grid {} needs {} density values but {} were read",
                    grid,
                    expected,
                    self.density.len()
                ),
            ));
        }

        Ok(ChargeDensity {
            name: source.to_string(),
            geometry: LatticeGeometry::from_vectors(self.vectors),
            atom_counts: self.atom_counts,
            grid,
            density: self.density,
            header: self.header,
        })
    }
}

/// 解析 CHGCAR 类文件
pub fn parse_chgcar_file(path: &Path, options: ParseOptions) -> Result<ChargeDensity> {
    let file = File::open(path).map_err(|e| VaspGridError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_chgcar_reader(
        BufReader::new(file),
        &path.display().to_string(),
        options,
    )
}

/// 从任意 `BufRead` 解析
pub fn parse_chgcar_reader<R: BufRead>(
    reader: R,
    source: &str,
    options: ParseOptions,
) -> Result<ChargeDensity> {
    let tokenizer = LineTokenizer::new(FORMAT, source, options.numeric);
    let mut scanner = ChgcarScanner::new(tokenizer);

    for (idx, line) in lossy_lines(reader).enumerate() {
        let line = line.map_err(|e| VaspGridError::FileReadError {
            path: source.to_string(),
            source: e,
        })?;
        scanner.feed(idx + 1, &line)?;
    }

    scanner.finish()
}

/// 从字符串内容解析
pub fn parse_chgcar_content(
    content: &str,
    source: &str,
    options: ParseOptions,
) -> Result<ChargeDensity> {
    parse_chgcar_reader(content.as_bytes(), source, options)
}

// ─────────────────────────────────────────────────────────────
// 自旋极化 CHGCAR 拆分
// ─────────────────────────────────────────────────────────────

/// 拆分结果：总密度块与磁化密度块，各自带完整头部
#[derive(Debug, Clone)]
pub struct ChgcarSplit {
    pub total: String,
    pub magnetization: String,
}

/// 将自旋极化 CHGCAR 拆分为 CHGCAR_tot 与 CHGCAR_mag
///
/// 网格行必须恰好出现两次；每个块取网格行之后 `ceil(NGX*NGY*NGZ/5)` 行。
pub fn split_chgcar(content: &str, source: &str) -> Result<ChgcarSplit> {
    let lines: Vec<&str> = content.lines().collect();
    let tokenizer = LineTokenizer::new(FORMAT, source, Default::default());

    let counts_line = lines.get(6).ok_or_else(|| {
        VaspGridError::malformed(FORMAT, source, "file has fewer than 7 lines")
    })?;
    let sum = total_atom_count(&tokenizer.ints(counts_line, 7)?, source)?;

    // 0 起下标
    let start = grid_header_line(sum) - 1;
    let grid_line = *lines.get(start).ok_or_else(|| {
        VaspGridError::malformed(
            FORMAT,
            source,
            format!("grid header line {} is past end of file", start + 1),
        )
    })?;

    let grid_re = Regex::new(GRID_LINE_PATTERN).map_err(|e| VaspGridError::Other(e.to_string()))?;
    let caps = grid_re.captures(grid_line).ok_or_else(|| {
        VaspGridError::malformed(
            FORMAT,
            source,
            format!("line {} is not a grid header: '{}'", start + 1, grid_line.trim()),
        )
    })?;

    let mut ngrid: usize = 1;
    for i in 1..=3 {
        let n: usize = caps[i]
            .parse()
            .map_err(|_| VaspGridError::malformed(FORMAT, source, "grid dimension overflow"))?;
        ngrid = ngrid.checked_mul(n).ok_or_else(|| {
            VaspGridError::malformed(FORMAT, source, "grid dimension overflow")
        })?;
    }
    let block_lines = ngrid.div_ceil(5);

    let markers: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| **l == grid_line)
        .map(|(i, _)| i)
        .collect();

    if markers.len() != 2 {
        return Err(VaspGridError::malformed(
            FORMAT,
            source,
            format!(
                "expected the grid line to appear twice (total + magnetization), found {}",
                markers.len()
            ),
        ));
    }

    let head = &lines[..=start];
    let mut blocks = Vec::with_capacity(2);
    for &marker in &markers {
        let begin = marker + 1;
        let end = begin.saturating_add(block_lines);
        if end > lines.len() {
            return Err(VaspGridError::malformed(
                FORMAT,
                source,
                format!(
                    "density block after line {} is truncated ({} of {} lines)",
                    marker + 1,
                    lines.len() - begin,
                    block_lines
                ),
            ));
        }

        let mut text = String::new();
        for line in head.iter().chain(lines[begin..end].iter()) {
            text.push_str(line);
            text.push('\n');
        }
        blocks.push(text);
    }

    debug!(
        "{}: split at lines {} and {}, {} lines per block",
        source,
        markers[0] + 1,
        markers[1] + 1,
        block_lines
    );

    let magnetization = blocks.pop().unwrap_or_default();
    let total = blocks.pop().unwrap_or_default();
    Ok(ChgcarSplit {
        total,
        magnetization,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::tokens::NumericMode;
    use approx::assert_relative_eq;

    /// 2 个原子, 网格 2x2x3 (12 个值)
    fn sample_chgcar() -> String {
        let mut s = String::from(
            "NaCl test\n\
             1.0\n\
             4.0 0.0 0.0\n\
             0.0 4.0 0.0\n\
             0.0 0.0 6.0\n\
             Na Cl\n\
             1 1\n\
             Direct\n\
             0.0 0.0 0.0\n\
             0.5 0.5 0.5\n\
             \n\
             \x20\x20\x202\x20\x20\x202\x20\x20\x203\n",
        );
        s.push_str(" 1.0 2.0 3.0 4.0 5.0\n");
        s.push_str(" 6.0 7.0 8.0 9.0 10.0\n");
        s.push_str(" 11.0 12.0\n");
        s
    }

    #[test]
    fn test_grid_header_offset() {
        assert_eq!(grid_header_line(0), 10);
        assert_eq!(grid_header_line(2), 12);
        assert_eq!(grid_header_line(64), 74);
    }

    #[test]
    fn test_parse_sample() {
        let rho = parse_chgcar_content(&sample_chgcar(), "sample", ParseOptions::default())
            .unwrap();

        assert_eq!(rho.grid, GridDimensions::new(2, 2, 3));
        assert_eq!(Some(rho.density.len()), rho.grid.total());
        assert_eq!(rho.density[0], 1.0);
        assert_eq!(rho.density[11], 12.0);
        assert_eq!(rho.atom_counts, vec![1, 1]);
        assert_eq!(rho.total_atoms(), Some(2));

        let [a, b, c] = rho.geometry.lengths();
        assert_relative_eq!(a, 4.0);
        assert_relative_eq!(b, 4.0);
        assert_relative_eq!(c, 6.0);
        for angle in rho.geometry.angles() {
            assert!((angle - 90.0).abs() < 1e-9);
        }

        // 头部为网格行之前的 11 行
        assert_eq!(rho.header.len(), 11);
        assert_eq!(rho.header[0], "NaCl test");
    }

    #[test]
    fn test_density_order_preserved() {
        let rho = parse_chgcar_content(&sample_chgcar(), "sample", ParseOptions::default())
            .unwrap();
        let expected: Vec<f64> = (1..=12).map(|i| i as f64).collect();
        assert_eq!(rho.density, expected);
    }

    #[test]
    fn test_truncated_density_is_malformed() {
        let content = sample_chgcar().replace(" 11.0 12.0\n", "");
        let err = parse_chgcar_content(&content, "short", ParseOptions::default()).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_missing_counts_is_malformed() {
        let content = "title\n1.0\n1 0 0\n0 1 0\n0 0 1\n";
        let err = parse_chgcar_content(content, "tiny", ParseOptions::default()).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_grid_header_never_reached() {
        let content = "t\n1.0\n1 0 0\n0 1 0\n0 0 1\nH\n5\nDirect\n0 0 0\n";
        let err = parse_chgcar_content(content, "tiny", ParseOptions::default()).unwrap_err();
        match err {
            VaspGridError::MalformedInput { reason, .. } => assert!(reason.contains("15")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_density_token_permissive() {
        let content = sample_chgcar().replace(" 11.0 12.0", " abc 12.0");
        let rho = parse_chgcar_content(&content, "sample", ParseOptions::default()).unwrap();
        assert_eq!(rho.density[10], 0.0);
    }

    #[test]
    fn test_malformed_density_token_strict() {
        let content = sample_chgcar().replace(" 11.0 12.0", " abc 12.0");
        let options = ParseOptions {
            numeric: NumericMode::Strict,
        };
        let err = parse_chgcar_content(&content, "sample", options).unwrap_err();
        match err {
            VaspGridError::NumericParse { line, token, .. } => {
                assert_eq!(line, 15);
                assert_eq!(token, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_huge_grid_is_malformed() {
        let content = sample_chgcar().replace("   2   2   3\n", "3000000 3000000 3000000\n");
        let err = parse_chgcar_content(&content, "huge", ParseOptions::default()).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_atom_count_overflow_is_malformed() {
        let content = sample_chgcar().replace(
            "\n1 1\n",
            "\n9223372036854775807 9223372036854775807\n",
        );
        let err = parse_chgcar_content(&content, "huge", ParseOptions::default()).unwrap_err();
        assert!(err.is_malformed());

        let err = split_chgcar(&content, "huge").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_latin1_title_is_ignored() {
        let mut raw = b"Cu \xC5 cell\n".to_vec();
        raw.extend_from_slice(
            b"1.0\n2 0 0\n0 2 0\n0 0 2\nCu\n1\nDirect\n0 0 0\n\n 1 1 2\n 0.5 1.5\n",
        );
        let rho = parse_chgcar_reader(raw.as_slice(), "latin1", ParseOptions::default()).unwrap();
        assert_eq!(rho.density, vec![0.5, 1.5]);
        assert_eq!(rho.header[0], "Cu \u{FFFD} cell");
    }

    #[test]
    fn test_parse_file_missing() {
        let err = parse_chgcar_file(Path::new("/nonexistent/CHGCAR"), ParseOptions::default())
            .unwrap_err();
        assert!(matches!(err, VaspGridError::FileReadError { .. }));
    }

    fn spin_chgcar() -> String {
        let head = "Fe\n1.0\n2.8 0 0\n0 2.8 0\n0 0 2.8\nFe\n1\nDirect\n0 0 0\n\n    1    2    3\n";
        let mut s = String::from(head);
        s.push_str(" 1.0 1.0 1.0 1.0 1.0\n 1.0\n");
        s.push_str("augmentation occupancies 1 4\n 0.1 0.2 0.3 0.4\n");
        s.push_str("    1    2    3\n");
        s.push_str(" 2.0 2.0 2.0 2.0 2.0\n 2.0\n");
        s.push_str("augmentation occupancies 1 4\n 0.5 0.6 0.7 0.8\n");
        s
    }

    #[test]
    fn test_split_chgcar() {
        let split = split_chgcar(&spin_chgcar(), "CHGCAR").unwrap();

        let tot = parse_chgcar_content(&split.total, "CHGCAR_tot", ParseOptions::default())
            .unwrap();
        let mag = parse_chgcar_content(&split.magnetization, "CHGCAR_mag", ParseOptions::default())
            .unwrap();

        assert_eq!(tot.grid, GridDimensions::new(1, 2, 3));
        assert!(tot.density.iter().all(|&v| v == 1.0));
        assert!(mag.density.iter().all(|&v| v == 2.0));
        assert_eq!(tot.header, mag.header);
    }

    #[test]
    fn test_split_requires_two_blocks() {
        let err = split_chgcar(&sample_chgcar(), "CHGCAR").unwrap_err();
        assert!(err.is_malformed());
    }
}
