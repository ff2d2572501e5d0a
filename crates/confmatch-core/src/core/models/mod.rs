//! # Core Models Module
//!
//! Data structures describing small molecules and their conformers as read from
//! multi-conformer structure files.
//!
//! ## Key Components
//!
//! - [`atom`] - Elements and atoms
//! - [`topology`] - Bonds and bond orders
//! - [`conformer`] - A single geometry with its tagged data items
//! - [`molecule`] - A titled molecule owning its connectivity and conformers

pub mod atom;
pub mod conformer;
pub mod molecule;
pub mod topology;
