use super::outcome::MatchOutcome;
use super::state::{MatchState, MethodRecord, MoleculeRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Version of the on-disk layout written by [`save`].
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Malformed checkpoint: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Checkpoint schema version {found} is not supported (expected {expected})")]
    SchemaVersion { found: u32, expected: u32 },
    #[error("Checkpoint was written for methods {found:?}, but the current methods are {expected:?}")]
    MethodMismatch {
        found: Vec<String>,
        expected: Vec<String>,
    },
    #[error("Checkpoint entry for molecule '{title}' is inconsistent: {details}")]
    Inconsistent { title: String, details: String },
}

#[derive(Deserialize)]
struct VersionHeader {
    schema_version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    schema_version: u32,
    method_labels: Vec<String>,
    rmsd_cutoff: f64,
    molecules: Vec<MoleculeEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MoleculeEntry {
    title: String,
    reference_conformer_count: usize,
    methods: Vec<MethodEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MethodEntry {
    /// Missing energies are stored as `null`.
    raw_energies: Vec<Option<f64>>,
    mapping: Vec<MatchOutcome>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    connectivity_differs: bool,
}

impl MethodEntry {
    fn from_record(record: &MethodRecord) -> Self {
        Self {
            raw_energies: record
                .raw_energies
                .iter()
                .map(|&e| (!e.is_nan()).then_some(e))
                .collect(),
            mapping: record.mapping.clone(),
            connectivity_differs: record.connectivity_differs,
        }
    }

    fn into_record(self) -> MethodRecord {
        let raw = self
            .raw_energies
            .into_iter()
            .map(|e| e.unwrap_or(f64::NAN))
            .collect();
        let mut record = MethodRecord::new(raw, self.mapping);
        record.connectivity_differs = self.connectivity_differs;
        record
    }
}

/// Serializes the matched, pre-analysis state of a run.
pub fn encode(state: &MatchState, rmsd_cutoff: f64) -> Result<String, CheckpointError> {
    let file = CheckpointFile {
        schema_version: SCHEMA_VERSION,
        method_labels: state.method_labels().to_vec(),
        rmsd_cutoff,
        molecules: state
            .records()
            .iter()
            .map(|r| MoleculeEntry {
                title: r.title.clone(),
                reference_conformer_count: r.reference_conformer_count,
                methods: r.methods.iter().map(MethodEntry::from_record).collect(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Rebuilds a [`MatchState`] from checkpoint text.
///
/// The checkpoint must have the current schema version and exactly the
/// method labels in `method_labels`. A differing cutoff is only reported.
pub fn decode(
    content: &str,
    method_labels: &[String],
    rmsd_cutoff: f64,
) -> Result<MatchState, CheckpointError> {
    let header: VersionHeader = serde_json::from_str(content)?;
    if header.schema_version != SCHEMA_VERSION {
        return Err(CheckpointError::SchemaVersion {
            found: header.schema_version,
            expected: SCHEMA_VERSION,
        });
    }

    let file: CheckpointFile = serde_json::from_str(content)?;
    if file.method_labels != method_labels {
        return Err(CheckpointError::MethodMismatch {
            found: file.method_labels,
            expected: method_labels.to_vec(),
        });
    }
    if file.rmsd_cutoff != rmsd_cutoff {
        warn!(
            "Checkpoint was matched with an RMSD cutoff of {}, but {} is configured; the stored matches are used as-is.",
            file.rmsd_cutoff, rmsd_cutoff
        );
    }

    let mut state = MatchState::new(file.method_labels);
    for entry in file.molecules {
        let record = validate_entry(entry, method_labels.len())?;
        if let Err(dup) = state.insert(record) {
            return Err(CheckpointError::Inconsistent {
                title: dup.title,
                details: "the molecule appears more than once".to_string(),
            });
        }
    }
    Ok(state)
}

fn validate_entry(entry: MoleculeEntry, num_methods: usize) -> Result<MoleculeRecord, CheckpointError> {
    let inconsistent = |details: String| CheckpointError::Inconsistent {
        title: entry.title.clone(),
        details,
    };
    if entry.methods.len() != num_methods {
        return Err(inconsistent(format!(
            "{} method entries for {} methods",
            entry.methods.len(),
            num_methods
        )));
    }
    for (i, method) in entry.methods.iter().enumerate() {
        if method.mapping.len() != entry.reference_conformer_count {
            return Err(inconsistent(format!(
                "method {} maps {} positions, expected {}",
                i + 1,
                method.mapping.len(),
                entry.reference_conformer_count
            )));
        }
        let available = method.raw_energies.len();
        let out_of_range = method.mapping.iter().enumerate().find(|(position, outcome)| {
            available > 0
                && outcome
                    .source_index(*position)
                    .is_some_and(|idx| idx >= available)
        });
        if let Some((position, _)) = out_of_range {
            return Err(inconsistent(format!(
                "method {} position {} points past its {} energies",
                i + 1,
                position,
                available
            )));
        }
    }

    let mut record = MoleculeRecord::new(entry.title, entry.reference_conformer_count);
    record.methods = entry.methods.into_iter().map(MethodEntry::into_record).collect();
    Ok(record)
}

/// Writes a checkpoint file.
pub fn save(state: &MatchState, rmsd_cutoff: f64, path: &Path) -> Result<(), CheckpointError> {
    let content = encode(state, rmsd_cutoff)?;
    fs::write(path, content).map_err(|e| CheckpointError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    info!(
        path = %path.display(),
        molecules = state.len(),
        "Checkpoint written."
    );
    Ok(())
}

/// Reads a checkpoint file written by [`save`].
pub fn load(
    path: &Path,
    method_labels: &[String],
    rmsd_cutoff: f64,
) -> Result<MatchState, CheckpointError> {
    let content = fs::read_to_string(path).map_err(|e| CheckpointError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    let state = decode(&content, method_labels, rmsd_cutoff)?;
    info!(
        path = %path.display(),
        molecules = state.len(),
        "Checkpoint loaded; skipping conformer matching."
    );
    Ok(state)
}
