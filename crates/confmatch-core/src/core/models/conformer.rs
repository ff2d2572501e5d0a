use nalgebra::Point3;

/// A tagged data item attached to a conformer (an SD data field).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataItem {
    pub tag: String,
    pub value: String,
}

impl DataItem {
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
        }
    }
}

/// One geometric instance of a molecule.
///
/// Coordinates are in Angstroms and are stored in the atom order of the owning
/// [`Molecule`](super::molecule::Molecule).
#[derive(Debug, Clone, PartialEq)]
pub struct Conformer {
    /// Position of this conformer within its molecule.
    pub index: usize,
    pub positions: Vec<Point3<f64>>,
    pub data: Vec<DataItem>,
}

impl Conformer {
    pub fn new(index: usize, positions: Vec<Point3<f64>>) -> Self {
        Self {
            index,
            positions,
            data: Vec::new(),
        }
    }

    pub fn with_data(mut self, tag: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.push(DataItem::new(tag, value));
        self
    }

    pub fn num_atoms(&self) -> usize {
        self.positions.len()
    }

    /// Finds the first data item whose tag contains `name`, ignoring case.
    pub fn find_tag(&self, name: &str) -> Option<&DataItem> {
        let needle = name.to_lowercase();
        self.data
            .iter()
            .find(|item| item.tag.to_lowercase().contains(&needle))
    }
}
