use super::matcher::{OracleFactory, match_conformers};
use super::outcome::MatchOutcome;
use super::progress::{Progress, ProgressReporter};
use super::state::{MatchState, MethodRecord, MoleculeRecord};
use crate::core::models::molecule::Molecule;
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One configured method together with the molecules read from its structure file.
#[derive(Debug, Clone, Copy)]
pub struct MethodMolecules<'a> {
    pub label: &'a str,
    pub energy_tag: &'a str,
    pub molecules: &'a [Molecule],
    /// The method reads the same geometries as the reference method.
    pub self_reference: bool,
}

struct TitleIndex<'a> {
    method: MethodMolecules<'a>,
    by_title: HashMap<&'a str, &'a Molecule>,
}

impl<'a> TitleIndex<'a> {
    fn new(method: MethodMolecules<'a>) -> Self {
        let mut by_title = HashMap::new();
        for molecule in method.molecules {
            by_title.entry(molecule.title.as_str()).or_insert(molecule);
        }
        Self { method, by_title }
    }
}

/// Builds the matched state for every reference molecule against every method.
///
/// `reference` holds the molecules to analyze, in report order. Methods are
/// processed in configuration order; the first one is the reference method.
/// Per-molecule anomalies never abort the run; they are recorded as missing
/// outcomes and logged.
#[instrument(skip_all, name = "match_minima", fields(molecules = reference.len(), methods = methods.len()))]
pub fn match_minima<F: OracleFactory>(
    reference: &[Molecule],
    methods: &[MethodMolecules<'_>],
    cutoff: f64,
    factory: &F,
    reporter: &ProgressReporter,
) -> MatchState {
    reporter.report(Progress::PhaseStart {
        name: "Matching conformers",
    });

    let mut seen = HashSet::new();
    let unique: Vec<&Molecule> = reference
        .iter()
        .filter(|mol| {
            let first = seen.insert(mol.title.as_str());
            if !first {
                warn!(
                    "Reference molecule {} appears more than once; keeping the first.",
                    mol.title
                );
            }
            first
        })
        .collect();

    let indices: Vec<TitleIndex> = methods.iter().copied().map(TitleIndex::new).collect();

    reporter.report(Progress::TaskStart {
        total_steps: unique.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = unique.iter();

    #[cfg(feature = "parallel")]
    let iterator = unique.par_iter();

    let records: Vec<MoleculeRecord> = iterator
        .map(|mol| {
            let record = match_molecule(mol, &indices, cutoff, factory);
            reporter.report(Progress::TaskIncrement);
            record
        })
        .collect();

    reporter.report(Progress::TaskFinish);

    let labels = methods.iter().map(|m| m.label.to_string()).collect();
    let mut state = MatchState::new(labels);
    for record in records {
        if let Err(dup) = state.insert(record) {
            warn!("Dropping duplicate record for {}.", dup.title);
        }
    }

    info!(molecules = state.len(), "Conformer matching finished.");
    reporter.report(Progress::PhaseFinish);
    state
}

fn match_molecule<F: OracleFactory>(
    reference: &Molecule,
    indices: &[TitleIndex<'_>],
    cutoff: f64,
    factory: &F,
) -> MoleculeRecord {
    let n = reference.num_conformers();
    let mut record = MoleculeRecord::new(reference.title.clone(), n);

    for index in indices {
        let method = &index.method;
        let Some(query) = index.by_title.get(reference.title.as_str()) else {
            warn!(
                "The entire {} molecule is not found in method {}.",
                reference.title, method.label
            );
            record.methods.push(MethodRecord::absent(n));
            continue;
        };

        let energies = query.energies(method.energy_tag);

        let entry = if method.self_reference {
            MethodRecord::new(energies, vec![MatchOutcome::SelfReference; n])
        } else {
            match factory.prepare(reference, query) {
                Some(oracle) => {
                    let mapping = match_conformers(
                        &reference.title,
                        &reference.conformers,
                        &query.conformers,
                        cutoff,
                        &oracle,
                    )
                    .into_iter()
                    .map(MatchOutcome::from_match)
                    .collect();
                    MethodRecord::new(energies, mapping)
                }
                None => MethodRecord::connectivity_mismatch(energies, n),
            }
        };

        record.methods.push(entry);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::conformer::Conformer;
    use crate::core::models::topology::{Bond, BondOrder};
    use crate::engine::matcher::GeometryOracle;
    use nalgebra::Point3;

    struct AxisOracle;

    impl GeometryOracle for AxisOracle {
        fn distance(&self, reference: &Conformer, query: &Conformer) -> Option<f64> {
            Some((reference.positions[0].x - query.positions[0].x).abs())
        }
    }

    struct AxisFactory;

    impl OracleFactory for AxisFactory {
        type Oracle = AxisOracle;

        fn prepare(&self, reference: &Molecule, query: &Molecule) -> Option<AxisOracle> {
            reference.same_connectivity(query).then_some(AxisOracle)
        }
    }

    fn diatomic(title: &str, xs: &[f64], energies: &[f64]) -> Molecule {
        let atom = |s: &str| Atom::new(s.parse().unwrap());
        let mut mol = Molecule::new(
            title,
            vec![atom("C"), atom("O")],
            vec![Bond::new(0, 1, BondOrder::Double)],
        );
        for (x, e) in xs.iter().zip(energies) {
            mol.push_conformer(
                Conformer::new(
                    0,
                    vec![Point3::new(*x, 0.0, 0.0), Point3::new(*x + 1.2, 0.0, 0.0)],
                )
                .with_data("Energy", e.to_string()),
            );
        }
        mol
    }

    fn method<'a>(label: &'a str, molecules: &'a [Molecule], self_reference: bool) -> MethodMolecules<'a> {
        MethodMolecules {
            label,
            energy_tag: "energy",
            molecules,
            self_reference,
        }
    }

    #[test]
    fn every_mapping_has_one_entry_per_reference_conformer() {
        let reference = vec![
            diatomic("a", &[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0]),
            diatomic("b", &[0.0, 5.0], &[3.0, 4.0]),
        ];
        let query = vec![diatomic("a", &[2.0, 0.0, 1.0, 9.0], &[12.0, 10.0, 11.0, 99.0])];
        let methods = [method("QM", &reference, true), method("MM", &query, false)];

        let state = match_minima(&reference, &methods, 0.5, &AxisFactory, &ProgressReporter::new());

        assert_eq!(state.method_labels(), &["QM".to_string(), "MM".to_string()]);
        for record in state.records() {
            for m in &record.methods {
                assert_eq!(m.mapping.len(), record.reference_conformer_count);
            }
        }

        let a = state.get("a").unwrap();
        assert_eq!(a.methods[0].mapping, vec![MatchOutcome::SelfReference; 3]);
        assert_eq!(
            a.methods[1].mapping,
            vec![
                MatchOutcome::Matched(1),
                MatchOutcome::Matched(2),
                MatchOutcome::Matched(0)
            ]
        );
        assert_eq!(a.methods[1].raw_energies, vec![12.0, 10.0, 11.0, 99.0]);

        let b = state.get("b").unwrap();
        assert_eq!(b.methods[1].mapping, vec![MatchOutcome::MoleculeAbsent; 2]);
        assert_eq!(b.methods[1].raw_energies.len(), 2);
        assert!(b.methods[1].raw_energies.iter().all(|e| e.is_nan()));
        assert!(!b.methods[1].connectivity_differs);
    }

    #[test]
    fn records_follow_reference_order_and_skip_duplicate_titles() {
        let reference = vec![
            diatomic("z", &[0.0], &[0.0]),
            diatomic("y", &[0.0], &[0.0]),
            diatomic("z", &[3.0], &[1.0]),
        ];
        let methods = [method("QM", &reference, true)];
        let state = match_minima(&reference, &methods, 0.5, &AxisFactory, &ProgressReporter::new());
        let titles: Vec<_> = state.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["z", "y"]);
    }

    #[test]
    fn first_query_molecule_with_the_title_wins() {
        let reference = vec![diatomic("a", &[0.0], &[1.0])];
        let query = vec![diatomic("a", &[0.1], &[5.0]), diatomic("a", &[0.0], &[7.0])];
        let methods = [method("QM", &reference, true), method("MM", &query, false)];
        let state = match_minima(&reference, &methods, 0.5, &AxisFactory, &ProgressReporter::new());
        assert_eq!(state.get("a").unwrap().methods[1].raw_energies, vec![5.0]);
    }

    #[test]
    fn different_connectivity_rejects_every_position() {
        let reference = vec![diatomic("a", &[0.0, 1.0], &[1.0, 2.0])];
        let mut other = diatomic("a", &[0.0, 1.0], &[1.0, 2.0]);
        other.atoms[0] = Atom::new("N".parse().unwrap());
        let query = vec![other];
        let methods = [method("QM", &reference, true), method("MM", &query, false)];
        let state = match_minima(&reference, &methods, 10.0, &AxisFactory, &ProgressReporter::new());
        let mm = &state.get("a").unwrap().methods[1];
        assert_eq!(mm.mapping, vec![MatchOutcome::NoMatchWithinCutoff; 2]);
        assert!(mm.connectivity_differs);
        assert_eq!(mm.raw_energies, vec![1.0, 2.0]);
    }

    #[test]
    fn reports_one_increment_per_molecule() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let increments = AtomicUsize::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|e| {
            if e == Progress::TaskIncrement {
                increments.fetch_add(1, Ordering::SeqCst);
            }
        }));
        let reference = vec![diatomic("a", &[0.0], &[0.0]), diatomic("b", &[0.0], &[0.0])];
        let methods = [method("QM", &reference, true)];
        match_minima(&reference, &methods, 0.5, &AxisFactory, &reporter);
        drop(reporter);
        assert_eq!(increments.into_inner(), 2);
    }
}
