use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("File I/O error for '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
}

/// Relative energies of one molecule, one column per method.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyTable<'a> {
    pub title: &'a str,
    /// Conformer position whose energy is zero in every column.
    pub reference_conformer: usize,
    pub methods: &'a [String],
    pub rms_errors: Vec<f64>,
    pub columns: Vec<&'a [f64]>,
}

impl EnergyTable<'_> {
    pub fn num_conformers(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    pub fn value(&self, method: usize, conformer: usize) -> f64 {
        self.columns
            .get(method)
            .and_then(|c| c.get(conformer))
            .copied()
            .unwrap_or(f64::NAN)
    }
}

/// Formats a value with four decimals, writing missing values as `nan`.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{:.4}", value)
    }
}

/// Makes a molecule title usable as part of a file name.
pub fn file_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

/// Hands out one distinct file stem per molecule title.
///
/// Titles that sanitize to the same stem, such as `a b` and `a_b`, get a
/// `_2`, `_3`, ... suffix in the order they are assigned. Stems are compared
/// case-insensitively.
#[derive(Debug, Default)]
pub struct FileStems {
    used: HashSet<String>,
}

impl FileStems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, title: &str) -> String {
        let base = file_stem(title);
        let mut stem = base.clone();
        let mut n = 1;
        while !self.used.insert(stem.to_lowercase()) {
            n += 1;
            stem = format!("{}_{}", base, n);
        }
        stem
    }
}

/// Path of the per-molecule report: `<dir>/<prefix>_<stem>.dat`.
pub fn report_path(directory: &Path, prefix: &str, stem: &str) -> PathBuf {
    directory.join(format!("{}_{}.dat", prefix, stem))
}

/// Writes the per-molecule relative energy report.
///
/// Rows are reference conformer positions and columns are methods, in the
/// configured order. The header lists every method with its RMS error
/// against the first method.
pub fn write_molecule_report<W: Write>(table: &EnergyTable, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "# Molecule {}", table.title)?;
    writeln!(
        writer,
        "# Energies (kcal/mol) for conformers matched to first method."
    )?;
    writeln!(
        writer,
        "# Energies are relative to conformer {}.",
        table.reference_conformer
    )?;
    writeln!(writer, "# Rows represent conformers; columns represent methods.")?;
    writeln!(writer)?;

    let mut rms_line = String::from("# ");
    let mut column_line = String::from("# ");
    for (i, method) in table.methods.iter().enumerate() {
        writeln!(writer, "# {} {}", i + 1, method)?;
        let rms = table.rms_errors.get(i).copied().unwrap_or(f64::NAN);
        rms_line.push('\t');
        rms_line.push_str(&format_value(rms));
        column_line.push_str(&format!("\t\t{}", i + 1));
    }

    writeln!(writer)?;
    writeln!(
        writer,
        "# RMS errors by method, with respect to the first method listed:"
    )?;
    writeln!(writer, "{}", rms_line)?;
    writeln!(writer)?;
    writeln!(writer, "{}", column_line)?;

    for row in 0..table.num_conformers() {
        let values: Vec<String> = (0..table.columns.len())
            .map(|m| format_value(table.value(m, row)))
            .collect();
        writeln!(writer, "{}\t{}", row, values.join("\t"))?;
    }
    Ok(())
}

/// Writes the report of one molecule to `path`, creating its directory.
pub fn save_molecule_report(table: &EnergyTable, path: &Path) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    write_molecule_report(table, &mut writer).map_err(io_err)?;
    writer.flush().map_err(io_err)
}

/// Writes one CSV row per molecule with its zero conformer and the RMS error of every method.
pub fn write_summary<W: Write>(
    tables: &[EnergyTable],
    methods: &[String],
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    let mut header = vec!["molecule".to_string(), "reference_conformer".to_string()];
    header.extend(methods.iter().cloned());
    csv.write_record(&header)?;

    for table in tables {
        let mut row = vec![table.title.to_string(), table.reference_conformer.to_string()];
        row.extend(
            (0..methods.len())
                .map(|i| format_value(table.rms_errors.get(i).copied().unwrap_or(f64::NAN))),
        );
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn save_summary(
    tables: &[EnergyTable],
    methods: &[String],
    path: &Path,
) -> Result<(), ReportError> {
    let file = File::create(path).map_err(|e| ReportError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    write_summary(tables, methods, BufWriter::new(file)).map_err(|e| ReportError::Csv {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}
