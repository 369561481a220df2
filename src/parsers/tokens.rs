//! # 行分词器
//!
//! 将一行以分隔符隔开的字段拆分为字符串、整数或浮点数 token。
//! 连续分隔符视为一个，不产生空 token。
//!
//! ## 数值解析模式
//! - `Permissive`（默认）：沿用 C `atoi`/`atof` 的行为，取最长的合法数字前缀，
//!   完全无法解析时得到 0 / 0.0，永不报错
//! - `Strict`：整个 token 必须是合法数字，否则返回 `NumericParse` 错误
//!
//! 读取行时按字节切分，非 UTF-8 字节（如 Latin-1 标题）替换为 U+FFFD，不报错。
//!
//! ## 依赖关系
//! - 被 `parsers/chgcar.rs`, `parsers/doscar.rs` 使用
//! - 无外部模块依赖

use crate::error::{Result, VaspGridError};
use std::io::{self, BufRead};

/// 默认分隔符：空格、制表符以及 Windows 行尾残留的回车
pub const DEFAULT_DELIMITERS: &[char] = &[' ', '\t', '\r'];

/// 数值解析模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericMode {
    /// 非法数字按前缀解析，无前缀时为 0
    #[default]
    Permissive,
    /// 非法数字直接报错
    Strict,
}

/// 解析选项
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub numeric: NumericMode,
}

impl ParseOptions {
    pub fn strict() -> Self {
        ParseOptions {
            numeric: NumericMode::Strict,
        }
    }
}

/// 按分隔符拆分一行，返回非空 token 迭代器
pub fn split_tokens<'a>(line: &'a str, delimiters: &'a [char]) -> impl Iterator<Item = &'a str> + 'a {
    line.split(move |c: char| delimiters.contains(&c))
        .filter(|t| !t.is_empty())
}

/// 拆分为字符串 token
pub fn tokenize(line: &str) -> Vec<&str> {
    split_tokens(line, DEFAULT_DELIMITERS).collect()
}

/// 行级分词器，携带行号用于严格模式下的错误定位
#[derive(Debug, Clone, Copy)]
pub struct LineTokenizer<'a> {
    pub format: &'a str,
    pub source: &'a str,
    pub mode: NumericMode,
}

impl<'a> LineTokenizer<'a> {
    pub fn new(format: &'a str, source: &'a str, mode: NumericMode) -> Self {
        LineTokenizer {
            format,
            source,
            mode,
        }
    }

    /// 拆分为整数
    pub fn ints(&self, line: &str, lineno: usize) -> Result<Vec<i64>> {
        split_tokens(line, DEFAULT_DELIMITERS)
            .map(|t| self.int(t, lineno))
            .collect()
    }

    /// 拆分为浮点数
    pub fn floats(&self, line: &str, lineno: usize) -> Result<Vec<f64>> {
        split_tokens(line, DEFAULT_DELIMITERS)
            .map(|t| self.float(t, lineno))
            .collect()
    }

    /// 解析单个整数 token
    pub fn int(&self, token: &str, lineno: usize) -> Result<i64> {
        match self.mode {
            NumericMode::Permissive => Ok(parse_int_lossy(token)),
            NumericMode::Strict => token.parse().map_err(|_| self.numeric_error(token, lineno)),
        }
    }

    /// 解析单个浮点 token
    pub fn float(&self, token: &str, lineno: usize) -> Result<f64> {
        match self.mode {
            NumericMode::Permissive => Ok(parse_float_lossy(token)),
            NumericMode::Strict => token.parse().map_err(|_| self.numeric_error(token, lineno)),
        }
    }

    fn numeric_error(&self, token: &str, lineno: usize) -> VaspGridError {
        VaspGridError::NumericParse {
            format: self.format.to_string(),
            path: self.source.to_string(),
            line: lineno,
            token: token.to_string(),
        }
    }
}

/// 逐行读取，容忍非 UTF-8 字节
///
/// 与 `BufRead::lines` 一样去掉行尾的 `\n` / `\r\n`。
pub struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

pub fn lossy_lines<R: BufRead>(reader: R) -> LossyLines<R> {
    LossyLines {
        reader,
        buf: Vec::new(),
    }
}

/// 宽松整数解析（`atoi` 语义）
pub fn parse_int_lossy(token: &str) -> i64 {
    let bytes = token.trim_start().as_bytes();
    let (negative, start) = match bytes.first() {
        Some(b'-') => (true, 1),
        Some(b'+') => (false, 1),
        _ => (false, 0),
    };

    let mut value: i64 = 0;
    for &b in &bytes[start..] {
        if !b.is_ascii_digit() {
            break;
        }
        value = value.saturating_mul(10).saturating_add((b - b'0') as i64);
    }

    if negative {
        -value
    } else {
        value
    }
}

/// 宽松浮点解析（`atof` 语义）
pub fn parse_float_lossy(token: &str) -> f64 {
    let token = token.trim_start();
    if let Ok(v) = token.parse::<f64>() {
        return v;
    }
    let end = float_prefix_len(token.as_bytes());
    token[..end].parse().unwrap_or(0.0)
}

/// 最长合法浮点前缀的字节长度
fn float_prefix_len(bytes: &[u8]) -> usize {
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
        if digits > 0 {
            i = j;
        }
    }

    if digits == 0 {
        return 0;
    }

    // 指数部分后面必须至少有一位数字
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    i
}
