//! # 写出模块
//!
//! 将解析后的电荷密度写为 `.grd` 网格文件或 CHGCAR 格式文件。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/density.rs`
//! - 子模块: grd, chgcar

pub mod chgcar;
pub mod grd;

pub use chgcar::{to_chgcar_string, write_chgcar};
pub use grd::{write_grd, GrdWriter};

/// C 风格 `%{width}.{precision}E` 格式化
///
/// 指数至少两位并带符号，结果右对齐到 `width` 个字符。
/// 无穷大输出 `INF` / `-INF`，NaN 输出 `NAN` / `-NAN`。
pub fn format_scientific(value: f64, precision: usize, width: usize) -> String {
    let body = if value.is_nan() {
        if value.is_sign_negative() {
            "-NAN".to_string()
        } else {
            "NAN".to_string()
        }
    } else if value.is_infinite() {
        if value < 0.0 {
            "-INF".to_string()
        } else {
            "INF".to_string()
        }
    } else {
        let rust = format!("{:.*E}", precision, value);
        match rust.split_once('E') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(d) => ('-', d),
                    None => ('+', exponent),
                };
                format!("{}E{}{:0>2}", mantissa, sign, digits)
            }
            None => rust,
        }
    };

    format!("{:>width$}", body, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_scientific_positive_exponent() {
        assert_eq!(format_scientific(123.456, 5, 12), " 1.23456E+02");
    }

    #[test]
    fn test_format_scientific_negative() {
        assert_eq!(format_scientific(-0.00012345, 5, 12), "-1.23450E-04");
        assert_eq!(format_scientific(1.0, 11, 18), " 1.00000000000E+00");
    }

    #[test]
    fn test_format_scientific_three_digit_exponent() {
        assert_eq!(format_scientific(1.5e-300, 5, 12), "1.50000E-300");
        assert_eq!(format_scientific(1.5e100, 5, 12), "1.50000E+100");
    }

    #[test]
    fn test_format_scientific_non_finite() {
        assert_eq!(format_scientific(f64::INFINITY, 5, 12), "         INF");
        assert_eq!(format_scientific(f64::NEG_INFINITY, 5, 12), "        -INF");
    }
}
