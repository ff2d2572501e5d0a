use super::state::MoleculeRecord;

/// Chooses the conformer position that serves as zero energy.
///
/// Positions with the fewest missing values across methods are candidates;
/// among them the one with the lowest energy in the first (reference) row
/// wins, the earliest position on ties. Returns `None` for an empty table.
pub fn select_reference_conformer(matched: &[Vec<f64>]) -> Option<usize> {
    let reference = matched.first()?;
    let positions = reference.len();
    if positions == 0 {
        return None;
    }

    let missing: Vec<usize> = (0..positions)
        .map(|j| {
            matched
                .iter()
                .filter(|row| row.get(j).is_none_or(|e| e.is_nan()))
                .count()
        })
        .collect();

    for threshold in 0..positions {
        let candidates: Vec<usize> = (0..positions)
            .filter(|&j| missing[j] == threshold)
            .collect();
        if candidates.is_empty() {
            continue;
        }
        let lowest = candidates
            .iter()
            .copied()
            .filter(|&j| !reference[j].is_nan())
            .fold(None::<usize>, |best, j| match best {
                Some(b) if reference[b] <= reference[j] => Some(b),
                _ => Some(j),
            });
        return Some(lowest.unwrap_or(candidates[0]));
    }

    // Every position is missing in at least `positions` methods.
    let fewest = missing.iter().copied().min()?;
    missing.iter().position(|&m| m == fewest)
}

/// Subtracts each row's value at `zero` from the whole row.
pub fn relative_energies(matched: &[Vec<f64>], zero: usize) -> Vec<Vec<f64>> {
    matched
        .iter()
        .map(|row| {
            let base = row.get(zero).copied().unwrap_or(f64::NAN);
            row.iter().map(|e| e - base).collect()
        })
        .collect()
}

/// Selects the zero conformer of a resolved molecule and fills in relative energies.
pub fn apply_relative_energies(record: &mut MoleculeRecord) -> Option<usize> {
    let matched = record.matched_table();
    let zero = select_reference_conformer(&matched)?;
    for (method, relative) in record
        .methods
        .iter_mut()
        .zip(relative_energies(&matched, zero))
    {
        method.relative_energies = relative;
    }
    record.reference_conformer = Some(zero);
    Some(zero)
}
