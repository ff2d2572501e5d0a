use super::outcome::MatchOutcome;
use crate::core::io::report::EnergyTable;
use std::collections::HashMap;

/// Everything recorded for one method of one molecule.
///
/// Not `PartialEq`: missing values are NaN, so field-wise equality would
/// never hold for them.
#[derive(Debug, Clone)]
pub struct MethodRecord {
    /// Energies in the method's own conformer order (NaN-filled when the molecule is absent).
    pub raw_energies: Vec<f64>,
    /// One outcome per reference conformer.
    pub mapping: Vec<MatchOutcome>,
    /// Energies realigned to reference conformer positions.
    pub matched_energies: Vec<f64>,
    pub relative_energies: Vec<f64>,
    pub rms_error: f64,
    /// The molecule exists in the method but with a different connectivity,
    /// so none of its conformers could be compared.
    pub connectivity_differs: bool,
}

impl MethodRecord {
    pub fn new(raw_energies: Vec<f64>, mapping: Vec<MatchOutcome>) -> Self {
        Self {
            raw_energies,
            mapping,
            matched_energies: Vec::new(),
            relative_energies: Vec::new(),
            rms_error: f64::NAN,
            connectivity_differs: false,
        }
    }

    /// A molecule whose connectivity does not match the reference.
    pub fn connectivity_mismatch(raw_energies: Vec<f64>, reference_conformer_count: usize) -> Self {
        Self {
            connectivity_differs: true,
            ..Self::new(
                raw_energies,
                vec![MatchOutcome::NoMatchWithinCutoff; reference_conformer_count],
            )
        }
    }

    pub fn absent(reference_conformer_count: usize) -> Self {
        Self::new(
            vec![f64::NAN; reference_conformer_count],
            vec![MatchOutcome::MoleculeAbsent; reference_conformer_count],
        )
    }
}

/// Per-molecule state, keyed by title in [`MatchState`].
#[derive(Debug, Clone)]
pub struct MoleculeRecord {
    pub title: String,
    pub reference_conformer_count: usize,
    /// One record per configured method, in method order.
    pub methods: Vec<MethodRecord>,
    /// Position used as the zero of relative energies, once selected.
    pub reference_conformer: Option<usize>,
}

impl MoleculeRecord {
    pub fn new(title: impl Into<String>, reference_conformer_count: usize) -> Self {
        Self {
            title: title.into(),
            reference_conformer_count,
            methods: Vec::new(),
            reference_conformer: None,
        }
    }

    pub fn matched_table(&self) -> Vec<Vec<f64>> {
        self.methods
            .iter()
            .map(|m| m.matched_energies.clone())
            .collect()
    }

    pub fn rms_errors(&self) -> Vec<f64> {
        self.methods.iter().map(|m| m.rms_error).collect()
    }

    /// Returns `true` once relative energies have been computed.
    pub fn is_analyzed(&self) -> bool {
        self.reference_conformer.is_some()
    }

    /// A report view over the relative energies of this molecule.
    pub fn energy_table<'a>(&'a self, methods: &'a [String]) -> Option<EnergyTable<'a>> {
        Some(EnergyTable {
            title: &self.title,
            reference_conformer: self.reference_conformer?,
            methods,
            rms_errors: self.rms_errors(),
            columns: self
                .methods
                .iter()
                .map(|m| m.relative_energies.as_slice())
                .collect(),
        })
    }
}

/// The matched state of a whole run: molecule records in reference-file order.
#[derive(Debug, Clone, Default)]
pub struct MatchState {
    method_labels: Vec<String>,
    records: Vec<MoleculeRecord>,
    index: HashMap<String, usize>,
}

impl MatchState {
    pub fn new(method_labels: Vec<String>) -> Self {
        Self {
            method_labels,
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn method_labels(&self) -> &[String] {
        &self.method_labels
    }

    /// Inserts a record; a record whose title is already present is returned back.
    pub fn insert(&mut self, record: MoleculeRecord) -> Result<(), MoleculeRecord> {
        if self.index.contains_key(&record.title) {
            return Err(record);
        }
        self.index.insert(record.title.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    pub fn get(&self, title: &str) -> Option<&MoleculeRecord> {
        self.index.get(title).map(|&i| &self.records[i])
    }

    pub fn get_mut(&mut self, title: &str) -> Option<&mut MoleculeRecord> {
        self.index.get(title).map(|&i| &mut self.records[i])
    }

    pub fn records(&self) -> &[MoleculeRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [MoleculeRecord] {
        &mut self.records
    }

    /// Drops records for which `keep` returns `false`, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&MoleculeRecord) -> bool) {
        self.records.retain(|r| keep(r));
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.title.clone(), i))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["QM".to_string(), "MM".to_string()]
    }

    #[test]
    fn absent_record_is_full_length_and_missing() {
        let record = MethodRecord::absent(3);
        assert_eq!(record.mapping, vec![MatchOutcome::MoleculeAbsent; 3]);
        assert_eq!(record.raw_energies.len(), 3);
        assert!(record.raw_energies.iter().all(|e| e.is_nan()));
        assert!(record.rms_error.is_nan());
    }

    #[test]
    fn connectivity_mismatch_rejects_every_position_and_keeps_energies() {
        let record = MethodRecord::connectivity_mismatch(vec![1.0, 2.0], 3);
        assert!(record.connectivity_differs);
        assert_eq!(record.raw_energies, vec![1.0, 2.0]);
        assert_eq!(record.mapping, vec![MatchOutcome::NoMatchWithinCutoff; 3]);
        assert!(!MethodRecord::absent(3).connectivity_differs);
    }

    #[test]
    fn insert_rejects_duplicate_titles_and_keeps_order() {
        let mut state = MatchState::new(labels());
        state.insert(MoleculeRecord::new("b", 1)).unwrap();
        state.insert(MoleculeRecord::new("a", 2)).unwrap();
        let dup = state.insert(MoleculeRecord::new("b", 5)).unwrap_err();
        assert_eq!(dup.reference_conformer_count, 5);

        let titles: Vec<_> = state.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a"]);
        assert_eq!(state.get("a").unwrap().reference_conformer_count, 2);
        assert!(state.get("c").is_none());
    }

    #[test]
    fn retain_rebuilds_title_index() {
        let mut state = MatchState::new(labels());
        for (title, n) in [("a", 1), ("b", 3), ("c", 2)] {
            state.insert(MoleculeRecord::new(title, n)).unwrap();
        }
        state.retain(|r| r.reference_conformer_count > 1);
        assert_eq!(state.len(), 2);
        assert!(state.get("a").is_none());
        assert_eq!(state.get("c").unwrap().reference_conformer_count, 2);
        state.get_mut("b").unwrap().reference_conformer = Some(1);
        assert!(state.records()[0].is_analyzed());
    }

    #[test]
    fn energy_table_requires_selected_reference_conformer() {
        let mut record = MoleculeRecord::new("mol", 2);
        let mut method = MethodRecord::new(vec![0.0, 1.0], vec![MatchOutcome::SelfReference; 2]);
        method.relative_energies = vec![0.0, 1.0];
        method.rms_error = 0.0;
        record.methods.push(method);

        let methods = vec!["QM".to_string()];
        assert!(record.energy_table(&methods).is_none());

        record.reference_conformer = Some(0);
        let table = record.energy_table(&methods).unwrap();
        assert_eq!(table.columns[0], &[0.0, 1.0]);
        assert_eq!(table.rms_errors, vec![0.0]);
    }
}
