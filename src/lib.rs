//! # vaspgrid
//!
//! VASP 输出文件解析库：
//! - CHGCAR 类电荷密度文件 -> 晶格几何 + 网格维度 + 展平密度
//! - DOSCAR -> 总态密度与原子投影态密度
//! - 电荷密度写出为 `.grd` 或 CHGCAR 格式
//!
//! ```no_run
//! use std::path::Path;
//! use vaspgrid::parsers::{parse_chgcar_file, ParseOptions};
//! use vaspgrid::writers::write_grd;
//!
//! let record = parse_chgcar_file(Path::new("CHGCAR_mag"), ParseOptions::default())?;
//! write_grd(Path::new("vasp.grd"), &record, -1.0)?;
//! # Ok::<(), vaspgrid::error::VaspGridError>(())
//! ```

pub mod batch;
pub mod dos;
pub mod error;
pub mod models;
pub mod parsers;
pub mod utils;
pub mod writers;

pub use error::{Result, VaspGridError};
