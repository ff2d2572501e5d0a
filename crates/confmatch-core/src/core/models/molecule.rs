use super::atom::Atom;
use super::conformer::Conformer;
use super::topology::Bond;
use tracing::warn;

/// A molecule with a fixed connectivity and one or more conformers.
///
/// Identity between molecules of different structure files is decided by the
/// title string alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub title: String,
    pub atoms: Vec<Atom>,
    /// Bonds kept sorted so that connectivity comparisons are order-independent.
    bonds: Vec<Bond>,
    pub conformers: Vec<Conformer>,
}

impl Molecule {
    pub fn new(title: impl Into<String>, atoms: Vec<Atom>, mut bonds: Vec<Bond>) -> Self {
        bonds.sort_unstable();
        bonds.dedup();
        Self {
            title: title.into(),
            atoms,
            bonds,
            conformers: Vec::new(),
        }
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn num_conformers(&self) -> usize {
        self.conformers.len()
    }

    /// Appends a conformer, renumbering it to its position in this molecule.
    pub fn push_conformer(&mut self, mut conformer: Conformer) {
        conformer.index = self.conformers.len();
        self.conformers.push(conformer);
    }

    pub fn conformer(&self, index: usize) -> Option<&Conformer> {
        self.conformers.get(index)
    }

    /// Returns `true` if both molecules have the same atoms in the same order
    /// and the same bond table.
    pub fn same_connectivity(&self, other: &Molecule) -> bool {
        self.atoms == other.atoms && self.bonds == other.bonds
    }

    /// Adjacency lists indexed by atom, each holding `(neighbor, bond)` pairs.
    pub fn adjacency(&self) -> Vec<Vec<(usize, Bond)>> {
        let mut adjacency = vec![Vec::new(); self.atoms.len()];
        for bond in &self.bonds {
            if bond.atom2 < adjacency.len() {
                adjacency[bond.atom1].push((bond.atom2, *bond));
                adjacency[bond.atom2].push((bond.atom1, *bond));
            }
        }
        adjacency
    }

    /// Extracts one energy per conformer from the data item matching `tag`.
    ///
    /// Conformers without the tag, or with a non-numeric value, contribute NaN.
    /// When no conformer carries the tag at all the result is empty.
    pub fn energies(&self, tag: &str) -> Vec<f64> {
        let mut found_any = false;
        let energies: Vec<f64> = self
            .conformers
            .iter()
            .map(|conf| match conf.find_tag(tag) {
                Some(item) => {
                    found_any = true;
                    item.value.trim().parse::<f64>().unwrap_or_else(|_| {
                        warn!(
                            "Non-numeric value '{}' for tag '{}' in conformer {} of {}.",
                            item.value, item.tag, conf.index, self.title
                        );
                        f64::NAN
                    })
                }
                None => {
                    warn!(
                        "No data tag matching '{}' in conformer {} of {}.",
                        tag, conf.index, self.title
                    );
                    f64::NAN
                }
            })
            .collect();

        if found_any { energies } else { Vec::new() }
    }
}
