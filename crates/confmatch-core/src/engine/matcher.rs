use crate::core::models::conformer::Conformer;
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::{Superposition, superposed_rmsd};
use crate::core::utils::symmetry::{enumerate_automorphisms, reduce_automorphisms};
use nalgebra::Point3;
use tracing::{debug, warn};

/// Measures the geometric distance between two conformers of the same molecule.
///
/// `None` means the pair cannot be compared; such candidates never match.
pub trait GeometryOracle: Sync {
    fn distance(&self, reference: &Conformer, query: &Conformer) -> Option<f64>;
}

/// Builds a [`GeometryOracle`] for one reference/query molecule pair.
pub trait OracleFactory: Sync {
    type Oracle: GeometryOracle;

    /// Returns `None` when the molecules cannot be compared at all
    /// (for example, when their connectivity differs).
    fn prepare(&self, reference: &Molecule, query: &Molecule) -> Option<Self::Oracle>;
}

/// Largest automorphism count that is searched exhaustively, without
/// factoring out terminal groups.
pub const EXACT_AUTOMORPHISM_LIMIT: usize = 1024;

const MAX_REFINEMENT_ROUNDS: usize = 8;

/// All-atom RMSD after optimal overlay, minimized over graph automorphisms.
///
/// With terminal groups, every permutation is a class representative and the
/// order inside each group is chosen by optimal assignment against the overlay,
/// alternating with refitting until the assignment is stable.
#[derive(Debug, Clone)]
pub struct SymmetryRmsd {
    automorphisms: Vec<Vec<usize>>,
    terminal_groups: Vec<Vec<usize>>,
    anchors: Vec<usize>,
}

impl SymmetryRmsd {
    pub fn new(automorphisms: Vec<Vec<usize>>) -> Self {
        Self::with_terminal_groups(automorphisms, Vec::new())
    }

    pub fn with_terminal_groups(
        automorphisms: Vec<Vec<usize>>,
        terminal_groups: Vec<Vec<usize>>,
    ) -> Self {
        let n = automorphisms.first().map_or(0, |p| p.len());
        let mut grouped = vec![false; n];
        for &atom in terminal_groups.iter().flatten() {
            if let Some(flag) = grouped.get_mut(atom) {
                *flag = true;
            }
        }
        let anchors = (0..n).filter(|&i| !grouped[i]).collect();
        Self {
            automorphisms,
            terminal_groups,
            anchors,
        }
    }

    pub fn num_automorphisms(&self) -> usize {
        self.automorphisms.len()
    }

    fn permuted(query: &Conformer, perm: &[usize]) -> Vec<Point3<f64>> {
        perm.iter().map(|&j| query.positions[j]).collect()
    }

    /// First overlay of a representative: fitted on the atoms outside terminal
    /// groups when they can define an orientation, otherwise on every atom.
    fn initial_overlay(
        &self,
        reference: &Conformer,
        query: &Conformer,
        perm: &[usize],
    ) -> Option<Superposition> {
        if self.anchors.len() >= 3 {
            let target: Vec<_> = self.anchors.iter().map(|&i| reference.positions[i]).collect();
            let mobile: Vec<_> = self.anchors.iter().map(|&i| query.positions[perm[i]]).collect();
            Superposition::fit(&target, &mobile)
        } else {
            Superposition::fit(&reference.positions, &Self::permuted(query, perm))
        }
    }

    /// Reorders the images inside every terminal group to minimize the
    /// squared deviation under `overlay`. Returns `true` if anything moved.
    fn reassign_groups(
        &self,
        reference: &Conformer,
        query: &Conformer,
        overlay: &Superposition,
        perm: &mut [usize],
    ) -> bool {
        let mut changed = false;
        for group in &self.terminal_groups {
            let images: Vec<usize> = group.iter().map(|&a| perm[a]).collect();
            let cost: Vec<Vec<f64>> = group
                .iter()
                .map(|&a| {
                    images
                        .iter()
                        .map(|&j| {
                            (reference.positions[a] - overlay.apply(&query.positions[j]))
                                .norm_squared()
                        })
                        .collect()
                })
                .collect();
            let assignment = best_assignment(&cost);
            for (slot, &a) in group.iter().enumerate() {
                let image = images[assignment[slot]];
                if perm[a] != image {
                    perm[a] = image;
                    changed = true;
                }
            }
        }
        changed
    }

    fn refined_rmsd(&self, reference: &Conformer, query: &Conformer, base: &[usize]) -> Option<f64> {
        let mut perm = base.to_vec();
        let mut overlay = self.initial_overlay(reference, query, &perm)?;
        for _ in 0..MAX_REFINEMENT_ROUNDS {
            if !self.reassign_groups(reference, query, &overlay, &mut perm) {
                break;
            }
            overlay = Superposition::fit(&reference.positions, &Self::permuted(query, &perm))?;
        }
        superposed_rmsd(&reference.positions, &Self::permuted(query, &perm))
    }
}

/// Minimum-cost assignment of rows to columns by branch and bound.
///
/// Keeps the identity unless another assignment is strictly cheaper.
fn best_assignment(cost: &[Vec<f64>]) -> Vec<usize> {
    fn descend(
        cost: &[Vec<f64>],
        used: &mut [bool],
        current: &mut Vec<usize>,
        partial: f64,
        best: &mut (f64, Vec<usize>),
    ) {
        if partial >= best.0 {
            return;
        }
        let row = current.len();
        if row == cost.len() {
            *best = (partial, current.clone());
            return;
        }
        for col in 0..cost.len() {
            if used[col] {
                continue;
            }
            used[col] = true;
            current.push(col);
            descend(cost, used, current, partial + cost[row][col], best);
            current.pop();
            used[col] = false;
        }
    }

    let identity: Vec<usize> = (0..cost.len()).collect();
    let identity_cost: f64 = identity.iter().map(|&i| cost[i][i]).sum();
    let mut best = (identity_cost, identity);
    descend(
        cost,
        &mut vec![false; cost.len()],
        &mut Vec::with_capacity(cost.len()),
        0.0,
        &mut best,
    );
    best.1
}

impl GeometryOracle for SymmetryRmsd {
    fn distance(&self, reference: &Conformer, query: &Conformer) -> Option<f64> {
        let n = reference.num_atoms();
        if n == 0 || query.num_atoms() != n {
            return None;
        }
        let mut best: Option<f64> = None;
        for perm in &self.automorphisms {
            if perm.len() != n {
                continue;
            }
            let rmsd = if self.terminal_groups.is_empty() {
                superposed_rmsd(&reference.positions, &Self::permuted(query, perm))
            } else {
                self.refined_rmsd(reference, query, perm)
            };
            if let Some(rmsd) = rmsd {
                if best.is_none_or(|b| rmsd < b) {
                    best = Some(rmsd);
                }
            }
        }
        best
    }
}

/// Prepares [`SymmetryRmsd`] oracles, enumerating automorphisms once per pair.
///
/// Small symmetry groups are enumerated in full. Larger ones are reduced to
/// one representative per arrangement of terminal groups, and
/// `max_automorphisms` only bounds that reduced search.
#[derive(Debug, Clone, Copy)]
pub struct SymmetryRmsdFactory {
    pub max_automorphisms: usize,
}

impl OracleFactory for SymmetryRmsdFactory {
    type Oracle = SymmetryRmsd;

    fn prepare(&self, reference: &Molecule, query: &Molecule) -> Option<SymmetryRmsd> {
        if !reference.same_connectivity(query) {
            return None;
        }
        let reduced = reduce_automorphisms(reference, self.max_automorphisms);
        if reduced.truncated {
            warn!(
                "Automorphism enumeration for {} stopped at {} permutations; symmetry-equivalent overlays may be missed.",
                reference.title,
                reduced.permutations.len()
            );
        }

        let exact_limit = EXACT_AUTOMORPHISM_LIMIT.min(self.max_automorphisms);
        let oracle = if !reduced.truncated && reduced.represented() <= exact_limit {
            SymmetryRmsd::new(enumerate_automorphisms(reference, exact_limit).permutations)
        } else {
            SymmetryRmsd::with_terminal_groups(reduced.permutations, reduced.terminal_groups)
        };
        debug!(
            molecule = %reference.title,
            automorphisms = oracle.num_automorphisms(),
            terminal_groups = oracle.terminal_groups.len(),
            "Prepared symmetry-aware RMSD."
        );
        Some(oracle)
    }
}

/// Maps every reference conformer onto the closest query conformer.
///
/// For each reference conformer the query with the smallest distance wins, the
/// lowest query index on ties. If that distance exceeds `cutoff` (or no query is
/// comparable) the entry is `None`; rejections are only logged at debug level
/// here and reported when the matches are resolved.
pub fn match_conformers<O: GeometryOracle + ?Sized>(
    title: &str,
    reference: &[Conformer],
    query: &[Conformer],
    cutoff: f64,
    oracle: &O,
) -> Vec<Option<usize>> {
    reference
        .iter()
        .map(|ref_conf| {
            debug!(
                "Matching {} conformers to minimum {}.",
                title,
                ref_conf.index + 1
            );
            let mut best: Option<(usize, f64)> = None;
            for (q_idx, que_conf) in query.iter().enumerate() {
                let Some(distance) = oracle.distance(ref_conf, que_conf) else {
                    continue;
                };
                if distance.is_nan() {
                    continue;
                }
                if best.is_none_or(|(_, d)| distance < d) {
                    best = Some((q_idx, distance));
                }
            }

            match best {
                Some((q_idx, distance)) if distance <= cutoff => Some(q_idx),
                Some((_, distance)) => {
                    debug!(
                        "Conformer {} of {}: lowest RMSD {:.4} exceeds cutoff {}.",
                        ref_conf.index, title, distance, cutoff
                    );
                    None
                }
                None => {
                    debug!(
                        "Conformer {} of {}: no comparable query conformer.",
                        ref_conf.index, title
                    );
                    None
                }
            }
        })
        .collect()
}
