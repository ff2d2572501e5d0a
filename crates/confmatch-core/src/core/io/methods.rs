use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// A named source of conformer geometries and energies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub label: String,
    pub structure_path: PathBuf,
    /// Name (or substring of the name) of the data tag holding the energy.
    pub energy_tag: String,
}

#[derive(Debug, Error)]
pub enum MethodListError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Malformed method line {line}: '{content}' (expected 'label, structure_file, energy_tag')")]
    Malformed { line: usize, content: String },
    #[error("Duplicate method label '{label}' on line {line}")]
    DuplicateLabel { line: usize, label: String },
    #[error("Method list contains no methods")]
    Empty,
    #[error("One or more listed structure files not found:\n{}", format_listing(.listing))]
    MissingFiles { listing: Vec<(PathBuf, bool)> },
}

fn format_listing(listing: &[(PathBuf, bool)]) -> String {
    let mut out = String::new();
    for (path, found) in listing {
        let _ = writeln!(
            out,
            "  [{}] {}",
            if *found { "found" } else { "MISSING" },
            path.display()
        );
    }
    out
}

/// The ordered list of methods to compare. The first method is the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodList {
    methods: Vec<Method>,
}

impl MethodList {
    pub fn new(methods: Vec<Method>) -> Result<Self, MethodListError> {
        if methods.is_empty() {
            return Err(MethodListError::Empty);
        }
        Ok(Self { methods })
    }

    /// Parses the line-oriented method list format.
    ///
    /// Each non-blank line not starting with `#` holds
    /// `label, structure_file, energy_tag`; fields are whitespace-trimmed.
    pub fn parse(content: &str) -> Result<Self, MethodListError> {
        let mut methods: Vec<Method> = Vec::new();
        for (i, raw) in content.lines().enumerate() {
            let line_no = i + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
            if fields.len() < 3 || fields[..3].iter().any(|f| f.is_empty()) {
                return Err(MethodListError::Malformed {
                    line: line_no,
                    content: raw.to_string(),
                });
            }
            if methods.iter().any(|m| m.label == fields[0]) {
                return Err(MethodListError::DuplicateLabel {
                    line: line_no,
                    label: fields[0].to_string(),
                });
            }
            methods.push(Method {
                label: fields[0].to_string(),
                structure_path: PathBuf::from(fields[1]),
                energy_tag: fields[2].to_string(),
            });
        }
        debug!("Parsed {} method(s) from method list.", methods.len());
        Self::new(methods)
    }

    /// Reads a method list from disk and checks that every structure file exists.
    pub fn from_path(path: &Path) -> Result<Self, MethodListError> {
        let content = std::fs::read_to_string(path).map_err(|e| MethodListError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let list = Self::parse(&content)?;
        list.verify_files()?;
        info!(
            "Loaded {} method(s); reference method is '{}'.",
            list.len(),
            list.reference().label
        );
        Ok(list)
    }

    /// Lists every structure file together with whether it exists.
    pub fn file_listing(&self) -> Vec<(PathBuf, bool)> {
        self.methods
            .iter()
            .map(|m| (m.structure_path.clone(), m.structure_path.is_file()))
            .collect()
    }

    pub fn verify_files(&self) -> Result<(), MethodListError> {
        let listing = self.file_listing();
        if listing.iter().all(|(_, found)| *found) {
            Ok(())
        } else {
            Err(MethodListError::MissingFiles { listing })
        }
    }

    pub fn reference(&self) -> &Method {
        &self.methods[0]
    }

    /// Returns `true` if the method at `index` reads the reference geometries.
    pub fn is_self_reference(&self, index: usize) -> bool {
        self.methods
            .get(index)
            .is_some_and(|m| m.structure_path == self.reference().structure_path)
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn labels(&self) -> Vec<String> {
        self.methods.iter().map(|m| m.label.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let content = "# label, file, tag\n\nQM,  qm.sdf , QM Energy\n  MM ,mm.sdf,MM Energy\n";
        let list = MethodList::parse(content).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.reference().label, "QM");
        assert_eq!(list.reference().structure_path, PathBuf::from("qm.sdf"));
        assert_eq!(list.methods()[1].energy_tag, "MM Energy");
        assert_eq!(list.labels(), vec!["QM".to_string(), "MM".to_string()]);
    }

    #[test]
    fn parse_rejects_lines_with_too_few_fields() {
        let result = MethodList::parse("QM, qm.sdf\n");
        assert!(matches!(result, Err(MethodListError::Malformed { line: 1, .. })));
    }

    #[test]
    fn parse_rejects_empty_fields() {
        let result = MethodList::parse("QM, qm.sdf, QM Energy\nMM, , MM Energy\n");
        assert!(matches!(result, Err(MethodListError::Malformed { line: 2, .. })));
    }

    #[test]
    fn parse_rejects_duplicate_labels() {
        let result = MethodList::parse("QM, a.sdf, E\nQM, b.sdf, E\n");
        assert!(matches!(
            result,
            Err(MethodListError::DuplicateLabel { line: 2, .. })
        ));
    }

    #[test]
    fn parse_of_comment_only_content_is_empty_error() {
        assert!(matches!(
            MethodList::parse("# nothing\n\n"),
            Err(MethodListError::Empty)
        ));
    }

    #[test]
    fn is_self_reference_compares_structure_paths() {
        let list =
            MethodList::parse("QM, qm.sdf, QM Energy\nQM-SP, qm.sdf, SP Energy\nMM, mm.sdf, E\n")
                .unwrap();
        assert!(list.is_self_reference(0));
        assert!(list.is_self_reference(1));
        assert!(!list.is_self_reference(2));
        assert!(!list.is_self_reference(9));
    }

    #[test]
    fn from_path_reports_missing_files() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("present.sdf");
        fs::write(&present, "").unwrap();
        let missing = dir.path().join("missing.sdf");
        let list_path = dir.path().join("methods.txt");
        fs::write(
            &list_path,
            format!(
                "QM, {}, E\nMM, {}, E\n",
                present.display(),
                missing.display()
            ),
        )
        .unwrap();

        let err = MethodList::from_path(&list_path).unwrap_err();
        match &err {
            MethodListError::MissingFiles { listing } => {
                assert_eq!(listing.len(), 2);
                assert!(listing[0].1);
                assert!(!listing[1].1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("MISSING"));
    }

    #[test]
    fn from_path_fails_for_missing_list() {
        let dir = tempdir().unwrap();
        let result = MethodList::from_path(&dir.path().join("nope.txt"));
        assert!(matches!(result, Err(MethodListError::Io { .. })));
    }
}
