use confmatch::engine::config::{DEFAULT_MAX_AUTOMORPHISMS, DEFAULT_RMSD_CUTOFF};

pub struct DefaultsConfig {
    pub rmsd_cutoff: f64,
    pub max_automorphisms: usize,
    pub skip_single_conformer: bool,
    pub output_directory: &'static str,
    pub prefix: &'static str,
    pub checkpoint: &'static str,
    pub plot: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            rmsd_cutoff: DEFAULT_RMSD_CUTOFF,
            max_automorphisms: DEFAULT_MAX_AUTOMORPHISMS,
            skip_single_conformer: false,
            output_directory: ".",
            prefix: "relene",
            checkpoint: "match.json",
            plot: false,
        }
    }
}
