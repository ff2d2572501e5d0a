//! # Engine Module
//!
//! The comparative-energetics pipeline: matching conformer minima between
//! methods, realigning their energies, and scoring each method against the
//! reference.
//!
//! ## Overview
//!
//! Data flows strictly forward through the stages:
//!
//! 1. **Matching** ([`matcher`], [`orchestrator`]) - For every reference molecule and every
//!    method, find the molecule with the same title and map each reference conformer onto
//!    the geometrically closest query conformer, recording a [`outcome::MatchOutcome`].
//! 2. **Resolution** ([`resolver`]) - Turn outcomes and raw energies into energies aligned
//!    with reference conformer positions, with NaN wherever no value exists.
//! 3. **Relative energies** ([`relative`]) - Pick the zero-energy conformer of each molecule
//!    and subtract it from every method row.
//! 4. **Error analysis** ([`rms`]) - Population RMS deviation of each method from the reference.
//!
//! The matched state ([`state`]) can be persisted and restored with [`checkpoint`], which
//! lets later runs skip the expensive matching stage.
//!
//! Per-molecule anomalies (absent molecules, rejected matches, missing energies) never
//! abort a run. They degrade to missing values and are logged through `tracing`.

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod matcher;
pub mod orchestrator;
pub mod outcome;
pub mod progress;
pub mod relative;
pub mod resolver;
pub mod rms;
pub mod state;
