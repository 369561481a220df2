//! # 态密度图表生成
//!
//! 使用 `plotters` 绘制总态密度（up 在上、down 在下）以及选定原子的
//! s/p/d/f 通道曲线，费米能处画竖直参考线。支持 PNG 和 SVG 输出。
//!
//! ## 依赖关系
//! - 被 `commands/dos.rs` 调用
//! - 使用 `models/dos.rs`
//! - 使用 `plotters` 渲染图表

use crate::error::{Result, VaspGridError};
use crate::models::DosData;

use plotters::prelude::*;
use std::path::Path;

/// 图表参数
#[derive(Debug, Clone)]
pub struct DosPlotOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// 额外绘制通道曲线的原子（0 起）
    pub atoms: Vec<usize>,
    /// 能量窗口 (E - E_fermi)，None 表示全部
    pub energy_window: Option<(f64, f64)>,
    pub use_svg: bool,
}

impl Default for DosPlotOptions {
    fn default() -> Self {
        DosPlotOptions {
            title: "Density of States".to_string(),
            width: 1200,
            height: 800,
            atoms: Vec::new(),
            energy_window: None,
            use_svg: false,
        }
    }
}

/// 通道配色 (s, p, d, f, other)
const CHANNEL_COLORS: [RGBColor; 5] = [
    RGBColor(214, 39, 40),
    RGBColor(44, 160, 44),
    RGBColor(31, 119, 180),
    RGBColor(148, 103, 189),
    RGBColor(127, 127, 127),
];

/// 生成态密度图
pub fn generate_dos_plot(dos: &DosData, output_path: &Path, options: &DosPlotOptions) -> Result<()> {
    if dos.energy.is_empty() {
        return Err(VaspGridError::Other("No DOS data to plot".to_string()));
    }

    if options.use_svg {
        let root =
            SVGBackend::new(output_path, (options.width, options.height)).into_drawing_area();
        draw_dos_chart(&root, dos, options)?;
        root.present()
            .map_err(|e| VaspGridError::Other(e.to_string()))?;
    } else {
        let root =
            BitMapBackend::new(output_path, (options.width, options.height)).into_drawing_area();
        draw_dos_chart(&root, dos, options)?;
        root.present()
            .map_err(|e| VaspGridError::Other(e.to_string()))?;
    }
    Ok(())
}

/// 一条待绘制的曲线
struct Curve {
    label: String,
    color: RGBColor,
    points: Vec<(f64, f64)>,
}

/// 收集所有曲线
fn collect_curves(dos: &DosData, options: &DosPlotOptions) -> Vec<Curve> {
    let in_window = |e: f64| match options.energy_window {
        Some((lo, hi)) => e >= lo && e <= hi,
        None => true,
    };
    let series = |values: &[f64]| -> Vec<(f64, f64)> {
        dos.energy
            .iter()
            .zip(values.iter())
            .filter(|(e, _)| in_window(**e))
            .map(|(e, v)| (*e, *v))
            .collect()
    };

    let mut curves = vec![Curve {
        label: "Total".to_string(),
        color: BLACK,
        points: series(&dos.total_up),
    }];
    if dos.spin_polarized {
        curves.push(Curve {
            label: String::new(),
            color: BLACK,
            points: series(&dos.total_down),
        });
    }

    for &index in &options.atoms {
        let Some(atom) = dos.atoms.get(index) else {
            continue;
        };
        for channel in atom.channels(dos.spin_polarized) {
            let color = match channel.name {
                "s" => CHANNEL_COLORS[0],
                "p" => CHANNEL_COLORS[1],
                "d" => CHANNEL_COLORS[2],
                "f" => CHANNEL_COLORS[3],
                _ => CHANNEL_COLORS[4],
            };
            curves.push(Curve {
                label: format!("Atom {} {}", index + 1, channel.name),
                color,
                points: series(&channel.up),
            });
            if let Some(down) = &channel.down {
                curves.push(Curve {
                    label: String::new(),
                    color,
                    points: series(down),
                });
            }
        }
    }

    curves
}

/// 绘制图表的核心逻辑
fn draw_dos_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    dos: &DosData,
    options: &DosPlotOptions,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| VaspGridError::Other(format!("{:?}", e)))?;

    let curves = collect_curves(dos, options);

    let (x_min, x_max) = match options.energy_window {
        Some(window) => window,
        None => (
            dos.energy.iter().copied().fold(f64::INFINITY, f64::min),
            dos.energy.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        ),
    };
    let y_values = curves.iter().flat_map(|c| c.points.iter().map(|(_, y)| *y));
    let (y_min, y_max) = y_values.fold((0.0f64, 0.0f64), |(lo, hi), y| (lo.min(y), hi.max(y)));
    let y_margin = ((y_max - y_min).abs() * 0.05).max(1e-3);

    let mut chart = ChartBuilder::on(root)
        .caption(&options.title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, (y_min - y_margin)..(y_max + y_margin))
        .map_err(|e| VaspGridError::Other(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .x_desc("E - E_f (eV)")
        .y_desc("DOS (states/eV)")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| VaspGridError::Other(format!("{:?}", e)))?;

    for curve in &curves {
        let color = curve.color;
        let series = chart
            .draw_series(LineSeries::new(
                curve.points.iter().copied(),
                color.stroke_width(2),
            ))
            .map_err(|e| VaspGridError::Other(format!("{:?}", e)))?;

        if !curve.label.is_empty() {
            series
                .label(curve.label.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
    }

    // 费米能
    chart
        .draw_series(LineSeries::new(
            vec![(0.0, y_min - y_margin), (0.0, y_max + y_margin)],
            RGBColor(160, 160, 160).stroke_width(1),
        ))
        .map_err(|e| VaspGridError::Other(format!("{:?}", e)))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| VaspGridError::Other(format!("{:?}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AtomDos;

    fn sample_dos() -> DosData {
        DosData {
            name: "DOSCAR".into(),
            declared_atoms: 1,
            emax: 2.0,
            emin: -2.0,
            nedos: 3,
            fermi: 0.0,
            spin_polarized: true,
            energy: vec![-1.0, 0.0, 1.0],
            total_up: vec![0.1, 0.2, 0.3],
            total_down: vec![-0.1, -0.2, -0.3],
            atoms: vec![AtomDos::new(vec![vec![1.0, -1.0, 0.5, -0.5]; 3])],
            orbital_count: 4,
        }
    }

    #[test]
    fn test_collect_curves() {
        let options = DosPlotOptions {
            atoms: vec![0, 5],
            ..Default::default()
        };
        let curves = collect_curves(&sample_dos(), &options);

        // total up/down + s up/down + p up/down; 越界原子被忽略
        assert_eq!(curves.len(), 6);
        assert_eq!(curves[2].label, "Atom 1 s");
        assert_eq!(curves[3].points[0], (-1.0, -1.0));
    }

    #[test]
    fn test_energy_window() {
        let options = DosPlotOptions {
            energy_window: Some((-0.5, 1.5)),
            ..Default::default()
        };
        let curves = collect_curves(&sample_dos(), &options);
        assert_eq!(curves[0].points, vec![(0.0, 0.2), (1.0, 0.3)]);
    }
}
