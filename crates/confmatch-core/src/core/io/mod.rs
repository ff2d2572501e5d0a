//! Provides input/output functionality for comparing conformer sets.
//!
//! This module reads multi-conformer structure files and the method list that
//! names them, and writes the per-molecule energy reports, the RMS summary, and
//! optional plots.

pub mod methods;
pub mod plot;
pub mod report;
pub mod sdf;
pub mod slice;
pub mod traits;
