mod defaults;

use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use confmatch::engine::config::AnalysisConfigBuilder;
use confmatch::workflows::compare::{CompareConfig, OutputConfig};
use defaults::DefaultsConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialMatchingConfig {
    #[serde(rename = "rmsd-cutoff")]
    rmsd_cutoff: Option<f64>,
    #[serde(rename = "max-automorphisms")]
    max_automorphisms: Option<usize>,
    #[serde(rename = "skip-single-conformer")]
    skip_single_conformer: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialOutputConfig {
    directory: Option<PathBuf>,
    prefix: Option<String>,
    checkpoint: Option<PathBuf>,
    summary: Option<PathBuf>,
    plot: Option<bool>,
}

/// Settings as read from the optional TOML file; every field may be absent.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialSettings {
    matching: Option<PartialMatchingConfig>,
    output: Option<PartialOutputConfig>,
}

/// Fully merged settings of a `run` invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub methods_path: PathBuf,
    pub compare: CompareConfig,
}

impl PartialSettings {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading settings from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads the settings file if one was given, otherwise starts from nothing.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Merges file settings, `--set` overrides, and CLI flags (highest priority) over the defaults.
    pub fn merge_with_cli(mut self, args: &RunArgs) -> Result<AppConfig> {
        self.apply_set_values(&args.set_values)?;
        let defaults = DefaultsConfig::default();
        let matching = self.matching.unwrap_or_default();
        let mut output = self.output.unwrap_or_default();
        let checkpoint = args
            .checkpoint
            .clone()
            .or(output.checkpoint.take())
            .unwrap_or_else(|| PathBuf::from(defaults.checkpoint));

        let analysis = AnalysisConfigBuilder::new()
            .rmsd_cutoff(
                args.cutoff
                    .or(matching.rmsd_cutoff)
                    .unwrap_or(defaults.rmsd_cutoff),
            )
            .max_automorphisms(
                args.max_automorphisms
                    .or(matching.max_automorphisms)
                    .unwrap_or(defaults.max_automorphisms),
            )
            .skip_single_conformer(
                args.skip_single_conformer
                    || matching
                        .skip_single_conformer
                        .unwrap_or(defaults.skip_single_conformer),
            )
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let output = OutputConfig {
            directory: args
                .output_dir
                .clone()
                .or(output.directory)
                .unwrap_or_else(|| PathBuf::from(defaults.output_directory)),
            prefix: args
                .prefix
                .clone()
                .or(output.prefix)
                .unwrap_or_else(|| defaults.prefix.to_string()),
            summary: args.summary.clone().or(output.summary),
            plot: args.plot || output.plot.unwrap_or(defaults.plot),
        };
        if output.prefix.is_empty() {
            return Err(CliError::Config(
                "`output.prefix` cannot be empty.".to_string(),
            ));
        }

        Ok(AppConfig {
            methods_path: args.input.clone(),
            compare: CompareConfig {
                analysis,
                slice: args.slice,
                checkpoint: Some(checkpoint),
                reuse_checkpoint: args.reuse_checkpoint,
                output: Some(output),
            },
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();
            let value_str = value_str.trim();
            let invalid = |kind: &str| {
                CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value_str))
            };

            match key {
                "matching.rmsd-cutoff" => {
                    self.matching
                        .get_or_insert_with(Default::default)
                        .rmsd_cutoff = Some(value_str.parse().map_err(|_| invalid("float"))?);
                }
                "matching.max-automorphisms" => {
                    self.matching
                        .get_or_insert_with(Default::default)
                        .max_automorphisms =
                        Some(value_str.parse().map_err(|_| invalid("integer"))?);
                }
                "matching.skip-single-conformer" => {
                    self.matching
                        .get_or_insert_with(Default::default)
                        .skip_single_conformer =
                        Some(value_str.parse().map_err(|_| invalid("boolean"))?);
                }
                "output.directory" => {
                    self.output.get_or_insert_with(Default::default).directory =
                        Some(PathBuf::from(value_str));
                }
                "output.prefix" => {
                    self.output.get_or_insert_with(Default::default).prefix =
                        Some(value_str.to_string());
                }
                "output.checkpoint" => {
                    self.output.get_or_insert_with(Default::default).checkpoint =
                        Some(PathBuf::from(value_str));
                }
                "output.summary" => {
                    self.output.get_or_insert_with(Default::default).summary =
                        Some(PathBuf::from(value_str));
                }
                "output.plot" => {
                    self.output.get_or_insert_with(Default::default).plot =
                        Some(value_str.parse().map_err(|_| invalid("boolean"))?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use confmatch::core::io::slice::MolSlice;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["confmatch", "run", "-i", "methods.txt"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            _ => panic!("expected run command"),
        }
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = PartialSettings::load(None)
            .unwrap()
            .merge_with_cli(&run_args(&[]))
            .unwrap();
        let defaults = DefaultsConfig::default();

        assert_eq!(config.methods_path, PathBuf::from("methods.txt"));
        assert_eq!(config.compare.analysis.rmsd_cutoff, defaults.rmsd_cutoff);
        assert!(!config.compare.analysis.skip_single_conformer);
        assert_eq!(
            config.compare.checkpoint,
            Some(PathBuf::from(defaults.checkpoint))
        );
        let output = config.compare.output.unwrap();
        assert_eq!(output.prefix, "relene");
        assert_eq!(output.directory, PathBuf::from("."));
        assert!(output.summary.is_none());
        assert!(!output.plot);
    }

    #[test]
    fn file_values_override_defaults() {
        let file = write_config(
            r#"
[matching]
rmsd-cutoff = 0.25
skip-single-conformer = true

[output]
directory = "reports"
prefix = "dE"
checkpoint = "state.json"
plot = true
"#,
        );
        let config = PartialSettings::load(Some(file.path()))
            .unwrap()
            .merge_with_cli(&run_args(&[]))
            .unwrap();

        assert_eq!(config.compare.analysis.rmsd_cutoff, 0.25);
        assert!(config.compare.analysis.skip_single_conformer);
        assert_eq!(config.compare.checkpoint, Some(PathBuf::from("state.json")));
        let output = config.compare.output.unwrap();
        assert_eq!(output.directory, PathBuf::from("reports"));
        assert_eq!(output.prefix, "dE");
        assert!(output.plot);
    }

    #[test]
    fn cli_flags_override_file_values() {
        let file = write_config("[matching]\nrmsd-cutoff = 0.25\n[output]\nprefix = \"dE\"\n");
        let args = run_args(&["--cutoff", "0.75", "--prefix", "rel", "--slice", "0:4"]);
        let config = PartialSettings::load(Some(file.path()))
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();

        assert_eq!(config.compare.analysis.rmsd_cutoff, 0.75);
        assert_eq!(config.compare.output.unwrap().prefix, "rel");
        assert_eq!(config.compare.slice, Some(MolSlice::new(0, 4, 1).unwrap()));
    }

    #[test]
    fn set_values_override_file_but_not_flags() {
        let file = write_config("[matching]\nmax-automorphisms = 12\n");
        let args = run_args(&[
            "-S",
            "matching.max-automorphisms=64",
            "-S",
            "output.summary=summary.csv",
            "-S",
            "matching.rmsd-cutoff=0.3",
            "--cutoff",
            "0.6",
        ]);
        let config = PartialSettings::load(Some(file.path()))
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();

        assert_eq!(config.compare.analysis.max_automorphisms, 64);
        assert_eq!(config.compare.analysis.rmsd_cutoff, 0.6);
        assert_eq!(
            config.compare.output.unwrap().summary,
            Some(PathBuf::from("summary.csv"))
        );
    }

    #[test]
    fn unsupported_set_key_is_rejected() {
        let args = run_args(&["-S", "matching.unknown=1"]);
        let err = PartialSettings::default().merge_with_cli(&args).unwrap_err();
        assert!(err.to_string().contains("Unsupported configuration key"));
    }

    #[test]
    fn malformed_set_value_is_rejected() {
        let args = run_args(&["-S", "matching.rmsd-cutoff"]);
        assert!(matches!(
            PartialSettings::default().merge_with_cli(&args),
            Err(CliError::Config(_))
        ));

        let args = run_args(&["-S", "output.plot=maybe"]);
        assert!(matches!(
            PartialSettings::default().merge_with_cli(&args),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn negative_cutoff_is_a_config_error() {
        let args = run_args(&["--cutoff=-0.1"]);
        assert!(matches!(
            PartialSettings::default().merge_with_cli(&args),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let file = write_config("[matching]\ncutoff = 0.5\n");
        assert!(matches!(
            PartialSettings::from_file(file.path()),
            Err(CliError::FileParsing { .. })
        ));
    }
}
