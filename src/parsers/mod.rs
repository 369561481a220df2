//! # 解析器模块
//!
//! 提供 VASP 电荷密度 (CHGCAR 类) 与态密度 (DOSCAR) 文件的解析器。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: tokens, chgcar, doscar

pub mod chgcar;
pub mod doscar;
pub mod tokens;

pub use chgcar::{parse_chgcar_file, split_chgcar, ChgcarSplit};
pub use doscar::{parse_doscar_file, scan_doscar_dimensions, DosDimensions};
pub use tokens::{NumericMode, ParseOptions};
