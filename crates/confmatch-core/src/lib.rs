//! # confmatch Core Library
//!
//! Matches conformational minima of the same molecules across computational
//! methods and compares the methods by their relative conformer energies.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`, `Conformer`), SDF and
//!   method-list readers, report writers, and geometric utilities such as symmetry-aware RMSD.
//!
//! - **[`engine`]: The Logic Core.** The matching pipeline: conformer matching under an RMSD
//!   cutoff, resolution of matches into aligned energies, zero-conformer selection, relative
//!   energies, and RMS errors, plus the versioned checkpoint of the matched state.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures that load the configured
//!   methods, run or restore matching, analyze every molecule, and write the reports.

pub mod core;
pub mod engine;
pub mod workflows;
