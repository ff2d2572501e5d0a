use super::outcome::MatchOutcome;
use super::state::{MethodRecord, MoleculeRecord};
use tracing::warn;

/// Realigns raw energies into reference-conformer order.
///
/// The output has one entry per element of `mapping`. Missing molecules,
/// rejected matches and an empty energy sequence all resolve to NaN.
pub fn resolve(mapping: &[MatchOutcome], raw_energies: &[f64]) -> Vec<f64> {
    mapping
        .iter()
        .enumerate()
        .map(|(position, outcome)| match outcome {
            MatchOutcome::MoleculeAbsent | MatchOutcome::NoMatchWithinCutoff => f64::NAN,
            _ if raw_energies.is_empty() => f64::NAN,
            _ => outcome
                .source_index(position)
                .and_then(|idx| raw_energies.get(idx).copied())
                .unwrap_or(f64::NAN),
        })
        .collect()
}

/// Resolves one method of a molecule, reporting each anomaly once.
///
/// Returns the diagnostics that were emitted.
pub fn resolve_method(title: &str, label: &str, record: &mut MethodRecord) -> Vec<String> {
    let mut diagnostics = Vec::new();

    if record
        .mapping
        .iter()
        .any(|o| *o == MatchOutcome::MoleculeAbsent)
    {
        diagnostics.push(format!("Molecule {} is not found in method {}.", title, label));
    } else if record.connectivity_differs {
        diagnostics.push(format!(
            "Molecule {} in method {} has a different connectivity than the reference; none of its conformers can be matched.",
            title, label
        ));
    } else if record.raw_energies.is_empty()
        && record
            .mapping
            .iter()
            .any(|o| matches!(o, MatchOutcome::Matched(_) | MatchOutcome::SelfReference))
    {
        diagnostics.push(format!(
            "Molecule {} was matched in method {} but it has no energies.",
            title, label
        ));
    }
    for (position, outcome) in record.mapping.iter().enumerate() {
        if *outcome == MatchOutcome::NoMatchWithinCutoff && !record.connectivity_differs {
            diagnostics.push(format!(
                "No matching conformer within RMSD cutoff for conformer {} of {} in method {}.",
                position, title, label
            ));
        }
    }

    for message in &diagnostics {
        warn!("{}", message);
    }
    record.matched_energies = resolve(&record.mapping, &record.raw_energies);
    diagnostics
}

/// Resolves every method of a molecule in place.
pub fn resolve_molecule(record: &mut MoleculeRecord, labels: &[String]) -> Vec<String> {
    let title = record.title.clone();
    record
        .methods
        .iter_mut()
        .zip(labels)
        .flat_map(|(method, label)| resolve_method(&title, label, method))
        .collect()
}
