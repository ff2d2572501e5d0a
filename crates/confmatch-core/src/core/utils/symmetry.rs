use crate::core::models::atom::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use std::collections::{BTreeMap, VecDeque};

/// Result of an automorphism enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automorphisms {
    /// Each permutation maps atom `i` onto atom `perm[i]`. The identity is always first.
    pub permutations: Vec<Vec<usize>>,
    /// `true` if enumeration stopped at the requested limit.
    pub truncated: bool,
}

/// Automorphisms with interchangeable terminal atoms factored out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedAutomorphisms {
    /// One permutation per class: within every terminal group the images
    /// appear in increasing atom order. The identity is always first.
    pub permutations: Vec<Vec<usize>>,
    /// Degree-one atoms sharing parent, element, charge and bond order.
    /// Every group has at least two members, listed in increasing order.
    pub terminal_groups: Vec<Vec<usize>>,
    /// `true` if enumeration stopped at the requested limit.
    pub truncated: bool,
}

impl ReducedAutomorphisms {
    /// Number of full automorphisms the reduced set stands for (saturating).
    pub fn represented(&self) -> usize {
        self.terminal_groups
            .iter()
            .fold(self.permutations.len(), |acc, group| {
                acc.saturating_mul((1..=group.len()).fold(1usize, |f, k| f.saturating_mul(k)))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AtomLabel {
    element: Element,
    formal_charge: i8,
    degree: usize,
}

struct Search<'a> {
    labels: Vec<AtomLabel>,
    neighbors: Vec<Vec<(usize, BondOrder)>>,
    order: Vec<usize>,
    limit: usize,
    group_prev: Vec<Option<usize>>,
    group_next: Vec<Option<usize>>,
    mapping: Vec<Option<usize>>,
    used: Vec<bool>,
    found: &'a mut Vec<Vec<usize>>,
    truncated: bool,
}

impl Search<'_> {
    fn bond_order(&self, a: usize, b: usize) -> Option<BondOrder> {
        self.neighbors[a]
            .iter()
            .find(|(n, _)| *n == b)
            .map(|(_, order)| *order)
    }

    fn is_compatible(&self, atom: usize, image: usize) -> bool {
        if self.used[image] || self.labels[atom] != self.labels[image] {
            return false;
        }
        let before = self.group_prev[atom].and_then(|prev| self.mapping[prev]);
        let after = self.group_next[atom].and_then(|next| self.mapping[next]);
        if before.is_some_and(|b| image <= b) || after.is_some_and(|a| image >= a) {
            return false;
        }
        self.neighbors[atom].iter().all(|&(neighbor, order)| {
            match self.mapping[neighbor] {
                Some(neighbor_image) => self.bond_order(image, neighbor_image) == Some(order),
                None => true,
            }
        })
    }

    fn candidates(&self, atom: usize) -> Vec<usize> {
        let anchored = self.neighbors[atom]
            .iter()
            .find_map(|&(neighbor, _)| self.mapping[neighbor]);
        match anchored {
            Some(anchor_image) => self.neighbors[anchor_image]
                .iter()
                .map(|&(n, _)| n)
                .collect(),
            None => (0..self.labels.len()).collect(),
        }
    }

    fn extend(&mut self, depth: usize) {
        if self.found.len() >= self.limit {
            self.truncated = true;
            return;
        }
        if depth == self.order.len() {
            self.found
                .push(self.mapping.iter().map(|m| m.unwrap_or_default()).collect());
            return;
        }

        let atom = self.order[depth];
        let mut candidates = self.candidates(atom);
        // Visiting the atom itself first makes the identity the first permutation.
        candidates.sort_unstable_by_key(|&c| (c != atom, c));
        for image in candidates {
            if !self.is_compatible(atom, image) {
                continue;
            }
            self.mapping[atom] = Some(image);
            self.used[image] = true;
            self.extend(depth + 1);
            self.mapping[atom] = None;
            self.used[image] = false;
            if self.truncated {
                return;
            }
        }
    }
}

/// Breadth-first atom order so that every atom after a component root has an
/// already-placed neighbor, which keeps the candidate lists short.
fn search_order(neighbors: &[Vec<(usize, BondOrder)>]) -> Vec<usize> {
    let mut visited = vec![false; neighbors.len()];
    let mut order = Vec::with_capacity(neighbors.len());
    for root in 0..neighbors.len() {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        let mut queue = VecDeque::from([root]);
        while let Some(atom) = queue.pop_front() {
            order.push(atom);
            for &(n, _) in &neighbors[atom] {
                if !visited[n] {
                    visited[n] = true;
                    queue.push_back(n);
                }
            }
        }
    }
    order
}

fn neighbor_lists(molecule: &Molecule) -> Vec<Vec<(usize, BondOrder)>> {
    molecule
        .adjacency()
        .into_iter()
        .map(|list| list.into_iter().map(|(n, bond)| (n, bond.order)).collect())
        .collect()
}

/// Groups degree-one atoms that can swap places without changing the graph.
fn terminal_groups(molecule: &Molecule, neighbors: &[Vec<(usize, BondOrder)>]) -> Vec<Vec<usize>> {
    let mut groups: BTreeMap<(usize, Element, i8, BondOrder), Vec<usize>> = BTreeMap::new();
    for (atom, list) in neighbors.iter().enumerate() {
        if let [(parent, order)] = list.as_slice() {
            let a = &molecule.atoms[atom];
            groups
                .entry((*parent, a.element, a.formal_charge, *order))
                .or_default()
                .push(atom);
        }
    }
    groups.into_values().filter(|g| g.len() > 1).collect()
}

fn search(
    molecule: &Molecule,
    neighbors: Vec<Vec<(usize, BondOrder)>>,
    groups: &[Vec<usize>],
    limit: usize,
) -> (Vec<Vec<usize>>, bool) {
    let n = molecule.num_atoms();
    let labels = molecule
        .atoms
        .iter()
        .zip(&neighbors)
        .map(|(atom, list)| AtomLabel {
            element: atom.element,
            formal_charge: atom.formal_charge,
            degree: list.len(),
        })
        .collect();

    let mut group_prev = vec![None; n];
    let mut group_next = vec![None; n];
    for group in groups {
        for pair in group.windows(2) {
            group_next[pair[0]] = Some(pair[1]);
            group_prev[pair[1]] = Some(pair[0]);
        }
    }

    let mut found = Vec::new();
    let truncated = {
        let mut search = Search {
            labels,
            order: search_order(&neighbors),
            neighbors,
            limit: limit.max(1),
            group_prev,
            group_next,
            mapping: vec![None; n],
            used: vec![false; n],
            found: &mut found,
            truncated: false,
        };
        search.extend(0);
        search.truncated
    };
    (found, truncated)
}

/// Enumerates the graph automorphisms of a molecule.
///
/// Atoms are matched by element, formal charge and degree; bonds must be
/// preserved together with their bond order. At most `limit` permutations are
/// returned (at least the identity).
pub fn enumerate_automorphisms(molecule: &Molecule, limit: usize) -> Automorphisms {
    let neighbors = neighbor_lists(molecule);
    let (permutations, truncated) = search(molecule, neighbors, &[], limit);
    Automorphisms {
        permutations,
        truncated,
    }
}

/// Enumerates automorphisms up to permutations inside terminal groups.
///
/// Methyl hydrogens and similar sets multiply the automorphism count by
/// `k!` per group; here each group contributes a single representative, so
/// a neopentane yields 24 permutations instead of 31 104. Callers resolve
/// the order within each group geometrically.
pub fn reduce_automorphisms(molecule: &Molecule, limit: usize) -> ReducedAutomorphisms {
    let neighbors = neighbor_lists(molecule);
    let groups = terminal_groups(molecule, &neighbors);
    let (permutations, truncated) = search(molecule, neighbors, &groups, limit);
    ReducedAutomorphisms {
        permutations,
        terminal_groups: groups,
        truncated,
    }
}
