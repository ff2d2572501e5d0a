pub mod geometry;
pub mod symmetry;
