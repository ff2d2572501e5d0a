use crate::core::io::traits::MoleculeFile;
use crate::core::models::atom::{Atom, Element};
use crate::core::models::conformer::{Conformer, DataItem};
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::{Bond, BondOrder};
use nalgebra::Point3;
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SdfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {details}")]
    Parse { line: usize, details: String },
}

impl SdfError {
    fn parse(line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            line,
            details: details.into(),
        }
    }
}

/// One record between `$$$$` delimiters, before conformers are grouped.
#[derive(Debug)]
struct Record {
    title: String,
    atoms: Vec<Atom>,
    positions: Vec<Point3<f64>>,
    bonds: Vec<Bond>,
    data: Vec<DataItem>,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_field<T: std::str::FromStr>(
    line: &str,
    start: usize,
    end: usize,
    line_no: usize,
    what: &str,
) -> Result<T, SdfError> {
    let raw = slice_and_trim(line, start, end);
    raw.parse()
        .map_err(|_| SdfError::parse(line_no, format!("invalid {} '{}'", what, raw)))
}

fn charge_from_ctfile(code: i32) -> i8 {
    match code {
        1 => 3,
        2 => 2,
        3 => 1,
        5 => -1,
        6 => -2,
        7 => -3,
        _ => 0,
    }
}

fn parse_record(lines: &[(usize, String)]) -> Result<Record, SdfError> {
    let first_line = lines.first().map(|(ln, _)| *ln).unwrap_or(1);
    if lines.len() < 4 {
        return Err(SdfError::parse(
            first_line,
            "record must contain a header block and a counts line",
        ));
    }

    let title = lines[0].1.trim().to_string();
    let (counts_no, counts) = (&lines[3].0, &lines[3].1);
    if counts.contains("V3000") {
        return Err(SdfError::parse(*counts_no, "V3000 is not supported"));
    }
    let atom_count: usize = parse_field(counts, 0, 3, *counts_no, "atom count")?;
    let bond_count: usize = parse_field(counts, 3, 6, *counts_no, "bond count")?;

    let atom_start = 4;
    let bond_start = atom_start + atom_count;
    if lines.len() < bond_start + bond_count {
        return Err(SdfError::parse(
            lines.last().map(|(ln, _)| *ln).unwrap_or(*counts_no),
            "record ended before atoms/bonds were fully specified",
        ));
    }

    let mut atoms = Vec::with_capacity(atom_count);
    let mut positions = Vec::with_capacity(atom_count);
    for (ln, line) in &lines[atom_start..bond_start] {
        let x: f64 = parse_field(line, 0, 10, *ln, "x coordinate")?;
        let y: f64 = parse_field(line, 10, 20, *ln, "y coordinate")?;
        let z: f64 = parse_field(line, 20, 30, *ln, "z coordinate")?;
        let symbol = slice_and_trim(line, 31, 34);
        let element: Element = symbol
            .parse()
            .map_err(|e| SdfError::parse(*ln, format!("{}", e)))?;
        let charge_code: i32 = slice_and_trim(line, 36, 39).parse().unwrap_or(0);
        atoms.push(Atom::with_charge(element, charge_from_ctfile(charge_code)));
        positions.push(Point3::new(x, y, z));
    }

    let mut bonds = Vec::with_capacity(bond_count);
    for (ln, line) in &lines[bond_start..bond_start + bond_count] {
        let a1: usize = parse_field(line, 0, 3, *ln, "first bond atom")?;
        let a2: usize = parse_field(line, 3, 6, *ln, "second bond atom")?;
        let code: u8 = parse_field(line, 6, 9, *ln, "bond type")?;
        let order = BondOrder::from_ctfile(code)
            .ok_or_else(|| SdfError::parse(*ln, format!("unsupported bond type {}", code)))?;
        if a1 == 0 || a2 == 0 || a1 > atom_count || a2 > atom_count || a1 == a2 {
            return Err(SdfError::parse(
                *ln,
                "bond references atom outside declared range",
            ));
        }
        bonds.push(Bond::new(a1 - 1, a2 - 1, order));
    }

    let mut data = Vec::new();
    let mut rest = lines[bond_start + bond_count..].iter().peekable();
    while let Some((ln, line)) = rest.next() {
        if line.starts_with("M  END") {
            continue;
        }
        if line.starts_with("M  CHG") {
            let tokens: Vec<&str> = line.split_whitespace().skip(3).collect();
            for pair in tokens.chunks(2) {
                if let [idx, chg] = pair {
                    let idx: usize = idx
                        .parse()
                        .map_err(|_| SdfError::parse(*ln, "invalid atom index in M  CHG"))?;
                    let chg: i8 = chg
                        .parse()
                        .map_err(|_| SdfError::parse(*ln, "invalid charge in M  CHG"))?;
                    if let Some(atom) = idx.checked_sub(1).and_then(|i| atoms.get_mut(i)) {
                        atom.formal_charge = chg;
                    }
                }
            }
            continue;
        }
        if line.starts_with('>') {
            let tag = match (line.find('<'), line.rfind('>')) {
                (Some(open), Some(close)) if close > open => line[open + 1..close].to_string(),
                _ => {
                    warn!("Skipping malformed data header on line {}: '{}'", ln, line);
                    continue;
                }
            };
            let mut value_lines = Vec::new();
            while let Some((_, value)) = rest.peek() {
                if value.trim().is_empty() {
                    rest.next();
                    break;
                }
                if value.starts_with('>') {
                    break;
                }
                value_lines.push(value.trim_end().to_string());
                rest.next();
            }
            data.push(DataItem::new(tag, value_lines.join("\n")));
        }
    }

    Ok(Record {
        title,
        atoms,
        positions,
        bonds,
        data,
    })
}

pub struct SdfFile;

impl MoleculeFile for SdfFile {
    type Error = SdfError;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Molecule>, Self::Error> {
        let mut molecules: Vec<Molecule> = Vec::new();
        let mut block: Vec<(usize, String)> = Vec::new();

        let mut flush = |block: &mut Vec<(usize, String)>| -> Result<(), SdfError> {
            if block.iter().all(|(_, l)| l.trim().is_empty()) {
                block.clear();
                return Ok(());
            }
            let record = parse_record(block)?;
            block.clear();

            let conformer = Conformer {
                index: 0,
                positions: record.positions,
                data: record.data,
            };
            let candidate = Molecule::new(record.title, record.atoms, record.bonds);
            let same_title = molecules
                .last()
                .is_some_and(|last| last.title == candidate.title);
            let same_molecule = same_title
                && molecules
                    .last()
                    .is_some_and(|last| last.same_connectivity(&candidate));

            match molecules.last_mut() {
                Some(last) if same_molecule => last.push_conformer(conformer),
                _ => {
                    if same_title {
                        warn!(
                            "Molecule '{}' changes connectivity between consecutive records; starting a new molecule.",
                            candidate.title
                        );
                    }
                    let mut molecule = candidate;
                    molecule.push_conformer(conformer);
                    molecules.push(molecule);
                }
            }
            Ok(())
        };

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim() == "$$$$" {
                flush(&mut block)?;
                continue;
            }
            block.push((i + 1, line));
        }
        flush(&mut block)?;

        debug!(
            molecules = molecules.len(),
            conformers = molecules.iter().map(Molecule::num_conformers).sum::<usize>(),
            "SDF stream parsed."
        );
        Ok(molecules)
    }
}
