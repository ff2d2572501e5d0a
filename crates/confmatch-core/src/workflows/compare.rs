use crate::core::io::methods::MethodList;
use crate::core::io::plot::{plot_molecule, plot_path};
use crate::core::io::report::{
    EnergyTable, FileStems, file_stem, report_path, save_molecule_report, save_summary,
};
use crate::core::io::sdf::SdfFile;
use crate::core::io::slice::MolSlice;
use crate::core::io::traits::MoleculeFile;
use crate::core::models::molecule::Molecule;
use crate::engine::checkpoint;
use crate::engine::config::AnalysisConfig;
use crate::engine::error::EngineError;
use crate::engine::matcher::SymmetryRmsdFactory;
use crate::engine::orchestrator::{MethodMolecules, match_minima};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::relative::apply_relative_energies;
use crate::engine::resolver::resolve_molecule;
use crate::engine::rms::apply_rms_errors;
use crate::engine::state::{MatchState, MoleculeRecord};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Where and what to write once the analysis is done.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// File name prefix of the per-molecule reports.
    pub prefix: String,
    pub summary: Option<PathBuf>,
    pub plot: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompareConfig {
    pub analysis: AnalysisConfig,
    /// Restricts which reference molecules are matched.
    pub slice: Option<MolSlice>,
    /// Written after matching; read instead of matching when `reuse_checkpoint` is set.
    pub checkpoint: Option<PathBuf>,
    pub reuse_checkpoint: bool,
    /// `None` skips writing any files.
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrittenFiles {
    pub reports: Vec<PathBuf>,
    pub plots: Vec<PathBuf>,
    pub summary: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ComparisonResult {
    /// The analyzed state, with relative energies and RMS errors filled in.
    pub state: MatchState,
    /// `true` if the matched state came from a checkpoint.
    pub from_checkpoint: bool,
    pub skipped_single_conformer: Vec<String>,
    pub diagnostics: Vec<String>,
    pub files: WrittenFiles,
}

/// Structure files read for a method list, each file read once.
#[derive(Debug, Clone)]
pub struct LoadedStructures {
    sets: Vec<Vec<Molecule>>,
    set_of_method: Vec<usize>,
}

impl LoadedStructures {
    pub fn molecules(&self, method: usize) -> &[Molecule] {
        self.set_of_method
            .get(method)
            .and_then(|&set| self.sets.get(set))
            .map_or(&[], |v| v.as_slice())
    }
}

/// Reads every distinct structure file of the method list.
#[instrument(skip_all, name = "load_structures")]
pub fn load_structures(
    methods: &MethodList,
    reporter: &ProgressReporter,
) -> Result<LoadedStructures, EngineError> {
    let mut by_path: HashMap<&Path, usize> = HashMap::new();
    let mut unique_paths: Vec<&Path> = Vec::new();
    let set_of_method: Vec<usize> = methods
        .methods()
        .iter()
        .map(|m| {
            *by_path.entry(m.structure_path.as_path()).or_insert_with(|| {
                unique_paths.push(m.structure_path.as_path());
                unique_paths.len() - 1
            })
        })
        .collect();

    reporter.phase("Reading structures", || -> Result<LoadedStructures, EngineError> {
        reporter.report(Progress::TaskStart {
            total_steps: unique_paths.len() as u64,
        });
        let mut sets = Vec::with_capacity(unique_paths.len());
        for path in &unique_paths {
            let molecules =
                SdfFile::read_from_path(path).map_err(|e| EngineError::Structure {
                    path: path.to_string_lossy().to_string(),
                    source: e,
                })?;
            info!(
                path = %path.display(),
                molecules = molecules.len(),
                "Read structure file."
            );
            sets.push(molecules);
            reporter.report(Progress::TaskIncrement);
        }
        reporter.report(Progress::TaskFinish);
        Ok(LoadedStructures {
            sets,
            set_of_method,
        })
    })
}

/// Matches every (sliced) reference molecule against every method.
pub fn match_structures(
    methods: &MethodList,
    structures: &LoadedStructures,
    config: &CompareConfig,
    reporter: &ProgressReporter,
) -> Result<MatchState, EngineError> {
    let reference_method = methods.reference();
    let all = structures.molecules(0);
    if all.is_empty() {
        return Err(EngineError::EmptyReference {
            label: reference_method.label.clone(),
            path: reference_method.structure_path.to_string_lossy().to_string(),
        });
    }

    let sliced: Vec<Molecule>;
    let reference: &[Molecule] = match &config.slice {
        Some(slice) => {
            sliced = slice.apply(all).cloned().collect();
            info!(
                "Slice {} selects {} of {} reference molecules.",
                slice,
                sliced.len(),
                all.len()
            );
            &sliced
        }
        None => all,
    };

    let inputs: Vec<MethodMolecules> = methods
        .methods()
        .iter()
        .enumerate()
        .map(|(i, m)| MethodMolecules {
            label: &m.label,
            energy_tag: &m.energy_tag,
            molecules: structures.molecules(i),
            self_reference: methods.is_self_reference(i),
        })
        .collect();

    let factory = SymmetryRmsdFactory {
        max_automorphisms: config.analysis.max_automorphisms,
    };
    Ok(match_minima(
        reference,
        &inputs,
        config.analysis.rmsd_cutoff,
        &factory,
        reporter,
    ))
}

fn analyze_record(record: &mut MoleculeRecord, labels: &[String]) -> Vec<String> {
    let diagnostics = resolve_molecule(record, labels);
    if apply_relative_energies(record).is_none() {
        warn!(
            "Molecule {} has no reference conformers; it is left out of the analysis.",
            record.title
        );
    }
    apply_rms_errors(record);
    diagnostics
}

/// Resolves matches, selects zero conformers, and computes relative energies and RMS errors.
///
/// Returns the titles dropped as single-conformer molecules and all diagnostics.
#[instrument(skip_all, name = "analyze", fields(molecules = state.len()))]
pub fn analyze(
    state: &mut MatchState,
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> (Vec<String>, Vec<String>) {
    let mut skipped = Vec::new();
    if config.skip_single_conformer {
        state.retain(|r| {
            let keep = r.reference_conformer_count > 1;
            if !keep {
                skipped.push(r.title.clone());
            }
            keep
        });
        if !skipped.is_empty() {
            info!(
                "Skipping {} single-conformer molecule(s): {}",
                skipped.len(),
                skipped.join(", ")
            );
        }
    }

    let labels = state.method_labels().to_vec();
    let diagnostics = reporter.phase("Analyzing energies", || {
        reporter.report(Progress::TaskStart {
            total_steps: state.len() as u64,
        });

        #[cfg(not(feature = "parallel"))]
        let iterator = state.records_mut().iter_mut();

        #[cfg(feature = "parallel")]
        let iterator = state.records_mut().par_iter_mut();

        let per_molecule: Vec<Vec<String>> = iterator
            .map(|record| {
                let messages = analyze_record(record, &labels);
                reporter.report(Progress::TaskIncrement);
                messages
            })
            .collect();

        reporter.report(Progress::TaskFinish);
        per_molecule.into_iter().flatten().collect::<Vec<_>>()
    });

    for message in &diagnostics {
        reporter.report(Progress::Diagnostic(message.clone()));
    }
    (skipped, diagnostics)
}

/// Writes one report (and optionally one plot) per analyzed molecule, plus the summary.
#[instrument(skip_all, name = "write_outputs")]
pub fn write_outputs(
    state: &MatchState,
    output: &OutputConfig,
    reporter: &ProgressReporter,
) -> Result<WrittenFiles, EngineError> {
    reporter.phase("Writing reports", || -> Result<WrittenFiles, EngineError> {
        let labels = state.method_labels();
        let tables: Vec<EnergyTable> = state
            .records()
            .iter()
            .filter_map(|r| r.energy_table(labels))
            .collect();

        reporter.report(Progress::TaskStart {
            total_steps: tables.len() as u64,
        });
        let mut files = WrittenFiles::default();
        let mut stems = FileStems::new();
        for table in &tables {
            let stem = stems.assign(table.title);
            if stem != file_stem(table.title) {
                warn!(
                    "Output name of molecule {} collides with an earlier title; writing it as {}.",
                    table.title, stem
                );
            }
            let report = report_path(&output.directory, &output.prefix, &stem);
            save_molecule_report(table, &report)?;
            files.reports.push(report);
            if output.plot {
                let path = plot_path(&output.directory, &stem);
                plot_molecule(table, &path)?;
                files.plots.push(path);
            }
            reporter.report(Progress::TaskIncrement);
        }
        reporter.report(Progress::TaskFinish);

        if let Some(path) = &output.summary {
            save_summary(&tables, labels, path)?;
            files.summary = Some(path.clone());
        }

        info!(
            reports = files.reports.len(),
            plots = files.plots.len(),
            directory = %output.directory.display(),
            "Reports written."
        );
        Ok(files)
    })
}

/// Runs the whole comparison for an already loaded method list.
#[instrument(skip_all, name = "compare_workflow")]
pub fn run(
    methods: &MethodList,
    config: &CompareConfig,
    reporter: &ProgressReporter,
) -> Result<ComparisonResult, EngineError> {
    let labels = methods.labels();
    let cutoff = config.analysis.rmsd_cutoff;

    let restored = match (&config.checkpoint, config.reuse_checkpoint) {
        (Some(path), true) if path.is_file() => {
            if config.slice.is_some() {
                warn!("A molecule slice has no effect when the checkpoint is reused.");
            }
            Some(checkpoint::load(path, &labels, cutoff)?)
        }
        (Some(path), true) => {
            warn!(
                "Checkpoint '{}' does not exist; matching conformers instead.",
                path.display()
            );
            None
        }
        (None, true) => {
            warn!("Checkpoint reuse requested without a checkpoint path; matching conformers instead.");
            None
        }
        _ => None,
    };
    let from_checkpoint = restored.is_some();

    let mut state = match restored {
        Some(state) => state,
        None => {
            let structures = load_structures(methods, reporter)?;
            let state = match_structures(methods, &structures, config, reporter)?;
            if let Some(path) = &config.checkpoint {
                checkpoint::save(&state, cutoff, path)?;
            }
            state
        }
    };

    let (skipped_single_conformer, diagnostics) = analyze(&mut state, &config.analysis, reporter);

    let files = match &config.output {
        Some(output) => write_outputs(&state, output, reporter)?,
        None => WrittenFiles::default(),
    };

    info!(
        molecules = state.len(),
        diagnostics = diagnostics.len(),
        "Comparison complete."
    );
    Ok(ComparisonResult {
        state,
        from_checkpoint,
        skipped_single_conformer,
        diagnostics,
        files,
    })
}
