use super::state::MoleculeRecord;

/// Population RMS deviation of `method` from `reference`, both relative energies.
///
/// Position `zero` and any position where either value is missing are
/// excluded. An empty remainder yields NaN.
pub fn rms_error(method: &[f64], reference: &[f64], zero: usize) -> f64 {
    let (sum, count) = method
        .iter()
        .zip(reference)
        .enumerate()
        .filter(|&(j, _)| j != zero)
        .map(|(_, (m, r))| (m - r).powi(2))
        .filter(|sq| !sq.is_nan())
        .fold((0.0, 0usize), |(sum, count), sq| (sum + sq, count + 1));

    if count == 0 {
        f64::NAN
    } else {
        (sum / count as f64).sqrt()
    }
}

/// Computes the RMS error of every method row against the first row.
pub fn rms_errors(relative: &[Vec<f64>], zero: usize) -> Vec<f64> {
    let Some(reference) = relative.first() else {
        return Vec::new();
    };
    relative
        .iter()
        .map(|row| rms_error(row, reference, zero))
        .collect()
}

/// Fills in `rms_error` for every method of an analyzed molecule.
pub fn apply_rms_errors(record: &mut MoleculeRecord) {
    let Some(zero) = record.reference_conformer else {
        return;
    };
    let relative: Vec<Vec<f64>> = record
        .methods
        .iter()
        .map(|m| m.relative_energies.clone())
        .collect();
    for (method, error) in record.methods.iter_mut().zip(rms_errors(&relative, zero)) {
        method.rms_error = error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAN: f64 = f64::NAN;

    #[test]
    fn reproduces_three_conformer_example() {
        let reference = [0.0, 1.0, 2.0];
        let method = [0.0, -2.0, -1.0];
        assert_eq!(rms_error(&method, &reference, 0), 3.0);
    }

    #[test]
    fn method_against_itself_is_exactly_zero() {
        let rows = vec![vec![0.0, 1.3, 2.7, NAN]];
        assert_eq!(rms_errors(&rows, 0), vec![0.0]);
    }

    #[test]
    fn zero_position_is_excluded() {
        // A deviation at the zero position would otherwise dominate.
        assert_eq!(rms_error(&[100.0, 1.0], &[0.0, 1.0], 0), 0.0);
    }

    #[test]
    fn missing_pairs_are_ignored() {
        let reference = [0.0, 1.0, NAN, 3.0];
        let method = [0.0, 2.0, 5.0, NAN];
        assert_eq!(rms_error(&method, &reference, 0), 1.0);
    }

    #[test]
    fn empty_filtered_set_is_nan() {
        assert!(rms_error(&[0.0], &[0.0], 0).is_nan());
        assert!(rms_error(&[0.0, NAN], &[0.0, 1.0], 0).is_nan());
    }

    #[test]
    fn uses_population_mean() {
        // Deviations 1 and 3: population RMS is sqrt(5).
        let value = rms_error(&[0.0, 1.0, 3.0], &[0.0, 0.0, 0.0], 0);
        assert!((value - 5.0f64.sqrt()).abs() < 1e-12);
    }
}
