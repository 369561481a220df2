//! # VASP DOSCAR 解析器
//!
//! 解析态密度文件 DOSCAR，得到总态密度与每个原子的投影态密度。
//!
//! ## DOSCAR 格式说明
//! ```text
//! NIONS NIONS 1 0                      # line 1  原子数
//! ...                                  # line 2-5
//! Emax Emin NEDOS E_fermi 1.0          # line 6
//! E  up  down  int_up  int_down        # line 7 .. 6+NEDOS  总态密度
//! Emax Emin NEDOS E_fermi 1.0          # line 7+NEDOS  原子块分隔行
//! E  s_up s_down p_up p_down ...       # NEDOS 行，每个原子一块
//! ...
//! ```
//!
//! 分隔行满足 `(line - 6) % (NEDOS + 1) == 0`，据此区分各原子块。
//!
//! ## 依赖关系
//! - 被 `commands/dos.rs` 使用
//! - 使用 `parsers/tokens.rs`, `models/dos.rs`

use crate::error::{Result, VaspGridError};
use crate::models::{AtomDos, DosData};
use crate::parsers::tokens::{lossy_lines, tokenize, LineTokenizer, ParseOptions};

use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const FORMAT: &str = "DOSCAR";

/// 头部所在行（1 起）
const HEADER_LINE: usize = 6;

/// 逐行解析状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoscarState {
    /// 第 1–6 行
    ReadingHeader,
    /// 第 7 .. 6+NEDOS 行：总态密度
    ReadingTotalDos,
    /// 之后：投影态密度与分隔行
    ReadingProjectedDos,
}

/// 第 `lineno` 行在投影区是否为原子块分隔行
pub fn is_block_separator(lineno: usize, nedos: usize) -> bool {
    (lineno - HEADER_LINE) % (nedos + 1) == 0
}

#[derive(Debug)]
struct DoscarScanner<'a> {
    tokenizer: LineTokenizer<'a>,
    state: DoscarState,
    declared_atoms: usize,
    emax: f64,
    emin: f64,
    nedos: usize,
    fermi: f64,
    spin_polarized: bool,
    energy: Vec<f64>,
    total_up: Vec<f64>,
    total_down: Vec<f64>,
    atoms: Vec<AtomDos>,
    current: Vec<Vec<f64>>,
    orbital_count: usize,
    first_width: Option<usize>,
    inconsistent_row: Option<usize>,
}

impl<'a> DoscarScanner<'a> {
    fn new(tokenizer: LineTokenizer<'a>) -> Self {
        DoscarScanner {
            tokenizer,
            state: DoscarState::ReadingHeader,
            declared_atoms: 0,
            emax: 0.0,
            emin: 0.0,
            nedos: 0,
            fermi: 0.0,
            spin_polarized: false,
            energy: Vec::new(),
            total_up: Vec::new(),
            total_down: Vec::new(),
            atoms: Vec::new(),
            current: Vec::new(),
            orbital_count: 0,
            first_width: None,
            inconsistent_row: None,
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> VaspGridError {
        VaspGridError::malformed(FORMAT, self.tokenizer.source, reason)
    }

    fn feed(&mut self, lineno: usize, line: &str) -> Result<()> {
        match self.state {
            DoscarState::ReadingHeader => {
                if lineno == 1 {
                    let first = tokenize(line)
                        .first()
                        .copied()
                        .ok_or_else(|| self.malformed("line 1 is empty"))?;
                    let atoms = self.tokenizer.int(first, lineno)?;
                    self.declared_atoms = atoms.max(0) as usize;
                } else if lineno == HEADER_LINE {
                    self.read_header(line, lineno)?;
                    self.state = if self.nedos > 0 {
                        DoscarState::ReadingTotalDos
                    } else {
                        DoscarState::ReadingProjectedDos
                    };
                }
            }
            DoscarState::ReadingTotalDos => {
                let values = self.tokenizer.floats(line, lineno)?;
                if values.len() < 3 {
                    return Err(self.malformed(format!(
                        "total DOS row on line {} has {} columns, need at least 3",
                        lineno,
                        values.len()
                    )));
                }
                if self.energy.is_empty() {
                    self.spin_polarized = values.len() >= 5;
                }
                self.energy.push(values[0] - self.fermi);
                self.total_up.push(values[1]);
                self.total_down.push(-values[2]);

                if lineno == HEADER_LINE + self.nedos {
                    self.state = DoscarState::ReadingProjectedDos;
                }
            }
            DoscarState::ReadingProjectedDos => {
                if is_block_separator(lineno, self.nedos) {
                    return Ok(());
                }
                let values = self.tokenizer.floats(line, lineno)?;
                let width = values.len().saturating_sub(1);
                self.orbital_count = width;
                match self.first_width {
                    None => self.first_width = Some(width),
                    Some(w) if w != width && self.inconsistent_row.is_none() => {
                        self.inconsistent_row = Some(lineno);
                    }
                    _ => {}
                }

                let row: Vec<f64> = values
                    .iter()
                    .skip(1)
                    .enumerate()
                    .map(|(k, v)| if k % 2 == 0 { *v } else { -*v })
                    .collect();
                self.current.push(row);

                if self.current.len() == self.nedos {
                    self.atoms
                        .push(AtomDos::new(std::mem::take(&mut self.current)));
                }
            }
        }
        Ok(())
    }

    fn read_header(&mut self, line: &str, lineno: usize) -> Result<()> {
        let tokens = tokenize(line);
        if tokens.len() < 4 {
            return Err(self.malformed(format!(
                "line {} needs Emax Emin NEDOS E_fermi, found {} values",
                lineno,
                tokens.len()
            )));
        }

        self.emax = self.tokenizer.float(tokens[0], lineno)?;
        self.emin = self.tokenizer.float(tokens[1], lineno)?;
        let nedos = self.tokenizer.int(tokens[2], lineno)?;
        if nedos < 0 {
            return Err(self.malformed(format!("negative NEDOS {}", nedos)));
        }
        self.nedos = nedos as usize;
        self.fermi = self.tokenizer.float(tokens[3], lineno)?;

        debug!(
            "{}: NEDOS = {}, E_fermi = {}, atom blocks start after line {}",
            self.tokenizer.source,
            self.nedos,
            self.fermi,
            HEADER_LINE + self.nedos
        );
        Ok(())
    }

    fn finish(self) -> Result<DosData> {
        if self.state == DoscarState::ReadingHeader {
            return Err(self.malformed("file ends before the NEDOS header on line 6"));
        }

        if self.energy.len() != self.nedos {
            warn!(
                "{}: {} total DOS rows for NEDOS = {}",
                self.tokenizer.source,
                self.energy.len(),
                self.nedos
            );
            return Err(self.malformed(format!(
                "expected {} total DOS rows, found {}",
                self.nedos,
                self.energy.len()
            )));
        }

        if !self.current.is_empty() {
            return Err(self.malformed(format!(
                "last atom block is incomplete ({} of {} rows)",
                self.current.len(),
                self.nedos
            )));
        }

        if let Some(lineno) = self.inconsistent_row {
            return Err(self.malformed(format!(
                "projected DOS row on line {} has a different column count than earlier rows",
                lineno
            )));
        }

        if !self.atoms.is_empty() && self.atoms.len() != self.declared_atoms {
            return Err(self.malformed(format!(
                "line 1 declares {} atoms but {} projected blocks were read",
                self.declared_atoms,
                self.atoms.len()
            )));
        }

        Ok(DosData {
            name: self.tokenizer.source.to_string(),
            declared_atoms: self.declared_atoms,
            emax: self.emax,
            emin: self.emin,
            nedos: self.nedos,
            fermi: self.fermi,
            spin_polarized: self.spin_polarized,
            energy: self.energy,
            total_up: self.total_up,
            total_down: self.total_down,
            atoms: self.atoms,
            orbital_count: self.orbital_count,
        })
    }
}

/// 解析 DOSCAR 文件
pub fn parse_doscar_file(path: &Path, options: ParseOptions) -> Result<DosData> {
    let file = File::open(path).map_err(|e| VaspGridError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_doscar_reader(
        BufReader::new(file),
        &path.display().to_string(),
        options,
    )
}

/// 从任意 `BufRead` 解析
pub fn parse_doscar_reader<R: BufRead>(
    reader: R,
    source: &str,
    options: ParseOptions,
) -> Result<DosData> {
    let tokenizer = LineTokenizer::new(FORMAT, source, options.numeric);
    let mut scanner = DoscarScanner::new(tokenizer);

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
pub fn parse_doscar_content(content: &str, source: &str, options: ParseOptions) -> Result<DosData> {
    parse_doscar_reader(content.as_bytes(), source, options)
}

/// DOSCAR 维度信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDimensions {
    pub atoms: usize,
    pub nedos: usize,
    /// 第一原子块的轨道列数，无投影态密度时为 None
    pub orbitals: Option<usize>,
}

/// 只读取头部和第一行投影数据，快速获取维度
pub fn scan_doscar_dimensions(path: &Path) -> Result<DosDimensions> {
    let file = File::open(path).map_err(|e| VaspGridError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    let source = path.display().to_string();
    let tokenizer = LineTokenizer::new(FORMAT, &source, Default::default());

    let mut dims = DosDimensions {
        atoms: 0,
        nedos: 0,
        orbitals: None,
    };
    let mut header_seen = false;

    for (idx, line) in lossy_lines(BufReader::new(file)).enumerate() {
        let lineno = idx + 1;
        let line = line.map_err(|e| VaspGridError::FileReadError {
            path: source.clone(),
            source: e,
        })?;
        let tokens = tokenize(&line);

        if lineno == 1 {
            dims.atoms = tokens
                .first()
                .map(|t| tokenizer.int(t, lineno))
                .transpose()?
                .unwrap_or(0)
                .max(0) as usize;
        } else if lineno == HEADER_LINE {
            let nedos = tokens
                .get(2)
                .map(|t| tokenizer.int(t, lineno))
                .transpose()?
                .ok_or_else(|| VaspGridError::malformed(FORMAT, &source, "missing NEDOS"))?;
            dims.nedos = nedos.max(0) as usize;
            header_seen = true;
        } else if header_seen && lineno == dims.nedos + 8 {
            dims.orbitals = Some(tokens.len().saturating_sub(1));
            break;
        }
    }

    if !header_seen {
        return Err(VaspGridError::malformed(
            FORMAT,
            &source,
            "file ends before the NEDOS header on line 6",
        ));
    }

    Ok(dims)
}
