//! # Core Module
//!
//! Stateless building blocks for conformer comparison: molecule models, file
//! I/O, and geometric utilities.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, bonds, conformers, and titled molecules
//! - **File I/O** ([`io`]) - SDF reading, method lists, molecule slicing, reports, and plots
//! - **Geometry** ([`utils`]) - Optimal superposition RMSD and graph automorphisms

pub mod io;
pub mod models;
pub mod utils;
