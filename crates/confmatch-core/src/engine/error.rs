use thiserror::Error;

use super::checkpoint::CheckpointError;
use crate::core::io::plot::PlotError;
use crate::core::io::report::ReportError;
use crate::core::io::sdf::SdfError;

/// Failures of a comparison run.
///
/// Configuration and method-list problems are caught before a run starts,
/// so they have no variant here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to read structure file '{path}': {source}")]
    Structure { path: String, source: SdfError },

    #[error("Checkpoint error: {source}")]
    Checkpoint {
        #[from]
        source: CheckpointError,
    },

    #[error("Failed to write report: {source}")]
    Report {
        #[from]
        source: ReportError,
    },

    #[error("Failed to draw plot: {source}")]
    Plot {
        #[from]
        source: PlotError,
    },

    #[error("Reference method '{label}' has no molecules in '{path}'")]
    EmptyReference { label: String, path: String },
}
