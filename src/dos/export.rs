//! # 态密度数据导出
//!
//! 导出总态密度和原子投影态密度为 CSV。
//!
//! ## 支持格式
//! - 总态密度: energy, total_up, total_down
//! - 原子投影: energy + 各轨道列（带符号，列名见 `AtomDos::column_names`）
//!
//! ## 依赖关系
//! - 被 `commands/dos.rs` 调用
//! - 使用 `models/dos.rs`
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{Result, VaspGridError};
use crate::models::DosData;

use serde::Serialize;
use std::path::{Path, PathBuf};

/// 总态密度 CSV 行
#[derive(Debug, Serialize)]
struct TotalDosRow {
    energy: f64,
    total_up: f64,
    total_down: f64,
}

/// 导出总态密度
pub fn total_to_csv(dos: &DosData, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for ((energy, up), down) in dos
        .energy
        .iter()
        .zip(dos.total_up.iter())
        .zip(dos.total_down.iter())
    {
        wtr.serialize(TotalDosRow {
            energy: *energy,
            total_up: *up,
            total_down: *down,
        })?;
    }

    wtr.flush().map_err(|e| VaspGridError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 导出选定原子的投影态密度，每个原子一个文件
///
/// `atoms` 为 0 起的原子序号；返回写出的文件路径。
pub fn atoms_to_csv(dos: &DosData, atoms: &[usize], output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(atoms.len());

    for &index in atoms {
        let atom = dos.atoms.get(index).ok_or_else(|| {
            VaspGridError::InvalidArgument(format!(
                "atom {} out of range (DOSCAR has {} atoms)",
                index + 1,
                dos.atoms.len()
            ))
        })?;

        let path = output_dir.join(format!("atom_{}_dos.csv", index + 1));
        let mut wtr = csv::Writer::from_path(&path)?;

        let mut header = vec!["energy".to_string()];
        header.extend(atom.column_names(dos.spin_polarized));
        wtr.write_record(&header)?;

        for (energy, row) in dos.energy.iter().zip(atom.rows.iter()) {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(energy.to_string());
            record.extend(row.iter().map(|v| v.to_string()));
            wtr.write_record(&record)?;
        }

        wtr.flush().map_err(|e| VaspGridError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AtomDos;
    use std::fs;

    fn sample_dos() -> DosData {
        DosData {
            name: "DOSCAR".into(),
            declared_atoms: 1,
            emax: 3.0,
            emin: 1.0,
            nedos: 2,
            fermi: 0.5,
            spin_polarized: false,
            energy: vec![-0.5, 0.5],
            total_up: vec![0.1, 0.2],
            total_down: vec![-0.3, -0.4],
            atoms: vec![AtomDos::new(vec![vec![1.0, -2.0], vec![3.0, -4.0]])],
            orbital_count: 2,
        }
    }

    #[test]
    fn test_total_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("total.csv");
        total_to_csv(&sample_dos(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "energy,total_up,total_down");
        assert_eq!(lines[1], "-0.5,0.1,-0.3");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_atoms_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let paths = atoms_to_csv(&sample_dos(), &[0], dir.path()).unwrap();
        assert_eq!(paths.len(), 1);

        let text = fs::read_to_string(&paths[0]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "energy,s,p");
        assert_eq!(lines[2], "0.5,3,-4");
    }

    #[test]
    fn test_atoms_to_csv_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let err = atoms_to_csv(&sample_dos(), &[3], dir.path()).unwrap_err();
        assert!(matches!(err, VaspGridError::InvalidArgument(_)));
    }
}
