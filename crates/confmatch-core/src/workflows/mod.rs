//! # Workflows Module
//!
//! High-level entry points that tie [`crate::core`] and [`crate::engine`] together.
//!
//! - **Comparison Workflow** ([`compare`]) - Loads every configured structure file once,
//!   matches conformers (or restores a checkpoint), computes relative energies and RMS
//!   errors, and writes reports.

pub mod compare;
