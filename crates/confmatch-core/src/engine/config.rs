use thiserror::Error;

pub const DEFAULT_RMSD_CUTOFF: f64 = 0.5;
pub const DEFAULT_MAX_AUTOMORPHISMS: usize = 10_000;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Maximum RMSD for two conformers to count as the same minimum.
    pub rmsd_cutoff: f64,
    pub max_automorphisms: usize,
    /// Drop molecules whose reference method has a single conformer before analysis.
    pub skip_single_conformer: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rmsd_cutoff: DEFAULT_RMSD_CUTOFF,
            max_automorphisms: DEFAULT_MAX_AUTOMORPHISMS,
            skip_single_conformer: false,
        }
    }
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    rmsd_cutoff: Option<f64>,
    max_automorphisms: Option<usize>,
    skip_single_conformer: Option<bool>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rmsd_cutoff(mut self, cutoff: f64) -> Self {
        self.rmsd_cutoff = Some(cutoff);
        self
    }
    pub fn max_automorphisms(mut self, limit: usize) -> Self {
        self.max_automorphisms = Some(limit);
        self
    }
    pub fn skip_single_conformer(mut self, skip: bool) -> Self {
        self.skip_single_conformer = Some(skip);
        self
    }

    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let rmsd_cutoff = self
            .rmsd_cutoff
            .ok_or(ConfigError::MissingParameter("rmsd_cutoff"))?;
        if !rmsd_cutoff.is_finite() || rmsd_cutoff < 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "rmsd_cutoff",
                reason: format!("expected a finite, non-negative distance, got {}", rmsd_cutoff),
            });
        }
        let max_automorphisms = self.max_automorphisms.unwrap_or(DEFAULT_MAX_AUTOMORPHISMS);
        if max_automorphisms == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "max_automorphisms",
                reason: "at least the identity permutation is required".to_string(),
            });
        }
        Ok(AnalysisConfig {
            rmsd_cutoff,
            max_automorphisms,
            skip_single_conformer: self.skip_single_conformer.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_cutoff() {
        let err = AnalysisConfigBuilder::new().build().unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("rmsd_cutoff"));
    }

    #[test]
    fn builder_fills_optional_defaults() {
        let config = AnalysisConfigBuilder::new().rmsd_cutoff(0.3).build().unwrap();
        assert_eq!(config.rmsd_cutoff, 0.3);
        assert_eq!(config.max_automorphisms, DEFAULT_MAX_AUTOMORPHISMS);
        assert!(!config.skip_single_conformer);
    }

    #[test]
    fn builder_rejects_negative_and_nan_cutoffs() {
        for bad in [-0.1, f64::NAN, f64::INFINITY] {
            let err = AnalysisConfigBuilder::new().rmsd_cutoff(bad).build().unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue {
                    parameter: "rmsd_cutoff",
                    ..
                }
            ));
        }
    }

    #[test]
    fn zero_cutoff_is_allowed() {
        let config = AnalysisConfigBuilder::new()
            .rmsd_cutoff(0.0)
            .max_automorphisms(1)
            .skip_single_conformer(true)
            .build()
            .unwrap();
        assert_eq!(config.rmsd_cutoff, 0.0);
        assert_eq!(config.max_automorphisms, 1);
        assert!(config.skip_single_conformer);
    }

    #[test]
    fn zero_automorphism_limit_is_rejected() {
        let err = AnalysisConfigBuilder::new()
            .rmsd_cutoff(0.5)
            .max_automorphisms(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
