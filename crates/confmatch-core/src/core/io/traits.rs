use crate::core::models::molecule::Molecule;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Defines the interface for reading multi-conformer molecule files.
///
/// Implementors yield one [`Molecule`] per logical molecule, with all of its
/// conformers attached, in file order.
pub trait MoleculeFile {
    /// The error type for I/O and parse failures.
    type Error: Error + From<io::Error>;

    /// Reads every molecule from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Molecule>, Self::Error>;

    /// Reads every molecule from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Molecule>, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}
