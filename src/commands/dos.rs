//! # dos 命令实现
//!
//! 解析 DOSCAR，打印摘要，可选导出 CSV 与作图。
//!
//! ## 依赖关系
//! - 使用 `cli/dos.rs` 定义的参数
//! - 使用 `parsers/doscar.rs`, `dos/`

use crate::cli::dos::{parse_atom_selection, parse_window, DosArgs, PlotFormat};
use crate::commands::print_summary;
use vaspgrid::dos::{export, generate_dos_plot, DosPlotOptions};
use vaspgrid::error::{Result, VaspGridError};
use vaspgrid::models::DosData;
use vaspgrid::parsers::{parse_doscar_file, scan_doscar_dimensions, ParseOptions};
use vaspgrid::utils::{output, progress};

use std::fs;
use std::path::Path;
use tabled::{Table, Tabled};

/// 执行 dos 命令
pub fn execute(args: DosArgs, options: ParseOptions) -> Result<()> {
    output::print_header("Density of states");

    if !args.input.is_file() {
        return Err(VaspGridError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    if args.scan {
        let dims = scan_doscar_dimensions(&args.input)?;
        print_summary(
            &args.input.display().to_string(),
            vec![
                ("Atoms", dims.atoms.to_string()),
                ("NEDOS", dims.nedos.to_string()),
                (
                    "Orbital columns",
                    dims.orbitals
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "none".to_string()),
                ),
            ],
        );
        return Ok(());
    }

    let spinner = progress::create_spinner(&format!("Reading {}", args.input.display()));
    let parsed = parse_doscar_file(&args.input, options);
    spinner.finish_and_clear();
    let dos = parsed?;

    print_dos_summary(&dos);

    let atoms = match &args.atoms {
        Some(selection) => {
            let atoms = parse_atom_selection(selection).map_err(VaspGridError::InvalidArgument)?;
            if let Some(&last) = atoms.last() {
                if last >= dos.atoms.len() {
                    return Err(VaspGridError::InvalidArgument(format!(
                        "atom {} out of range ({} projected atoms in {})",
                        last + 1,
                        dos.atoms.len(),
                        args.input.display()
                    )));
                }
            }
            print_channel_table(&dos, &atoms);
            atoms
        }
        None => Vec::new(),
    };

    if let Some(dir) = &args.csv_dir {
        export_csv(&dos, &atoms, dir)?;
    }

    if let Some(plot_path) = &args.plot {
        let energy_window = args
            .window
            .as_deref()
            .map(parse_window)
            .transpose()
            .map_err(VaspGridError::InvalidArgument)?;

        let use_svg = match args.format {
            Some(format) => format == PlotFormat::Svg,
            None => plot_path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("svg"))
                .unwrap_or(false),
        };

        let plot_options = DosPlotOptions {
            title: format!("DOS: {}", args.input.display()),
            atoms: atoms.clone(),
            energy_window,
            use_svg,
            ..Default::default()
        };
        generate_dos_plot(&dos, plot_path, &plot_options)?;
        output::print_success(&format!("DOS plot saved to '{}'", plot_path.display()));
    }

    Ok(())
}

/// 导出 CSV
fn export_csv(dos: &DosData, atoms: &[usize], dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| VaspGridError::FileWriteError {
        path: dir.display().to_string(),
        source: e,
    })?;

    let total = dir.join("total_dos.csv");
    export::total_to_csv(dos, &total)?;
    output::print_success(&format!("Total DOS saved to '{}'", total.display()));

    for path in export::atoms_to_csv(dos, atoms, dir)? {
        output::print_success(&format!("Projected DOS saved to '{}'", path.display()));
    }
    Ok(())
}

/// 打印 DOSCAR 摘要
fn print_dos_summary(dos: &DosData) {
    let mut rows = vec![
        ("Declared atoms", dos.declared_atoms.to_string()),
        ("NEDOS", dos.nedos.to_string()),
        ("E_fermi (eV)", format!("{:.4}", dos.fermi)),
        ("Emin .. Emax (eV)", format!("{:.4} .. {:.4}", dos.emin, dos.emax)),
        ("Spin polarized", dos.spin_polarized.to_string()),
        ("Projected atoms", dos.atoms.len().to_string()),
        ("Orbital columns", dos.orbital_count.to_string()),
    ];

    if let Some(i) = dos.fermi_index() {
        rows.push((
            "DOS at E_fermi",
            format!("{:.4} / {:.4}", dos.total_up[i], dos.total_down[i]),
        ));
    }

    print_summary(&dos.name, rows);
}

/// 通道积分表中的一行
#[derive(Tabled)]
struct ChannelRow {
    #[tabled(rename = "Atom")]
    atom: usize,
    #[tabled(rename = "Channel")]
    channel: String,
    #[tabled(rename = "Max up")]
    max_up: String,
    #[tabled(rename = "Max down")]
    max_down: String,
}

/// 打印所选原子各通道的峰值
fn print_channel_table(dos: &DosData, atoms: &[usize]) {
    let peak = |values: &[f64]| values.iter().fold(0.0f64, |m, v| m.max(v.abs()));

    let rows: Vec<ChannelRow> = atoms
        .iter()
        .filter_map(|&i| dos.atoms.get(i).map(|atom| (i, atom)))
        .flat_map(|(i, atom)| {
            atom.channels(dos.spin_polarized)
                .into_iter()
                .map(move |c| ChannelRow {
                    atom: i + 1,
                    channel: c.name.to_string(),
                    max_up: format!("{:.4}", peak(&c.up)),
                    max_down: c
                        .down
                        .as_deref()
                        .map(|d| format!("{:.4}", peak(d)))
                        .unwrap_or_else(|| "-".to_string()),
                })
        })
        .collect();

    if !rows.is_empty() {
        output::print_header("Orbital channels");
        println!("{}", Table::new(&rows));
    }
}
