//! # 态密度后处理模块
//!
//! 对解析后的 DOSCAR 数据进行导出和作图。
//!
//! ## 子模块
//! - `export`: CSV 导出
//! - `plot`: 图表生成
//!
//! ## 依赖关系
//! - 被 `commands/dos.rs` 使用
//! - 使用 `models/dos.rs`

pub mod export;
pub mod plot;

pub use plot::{generate_dos_plot, DosPlotOptions};
