use serde::{Deserialize, Serialize};

/// How one reference conformer position was resolved for one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "kebab-case")]
pub enum MatchOutcome {
    /// The query conformer with this index is the same minimum.
    Matched(usize),
    /// The method reads the reference geometries; the position maps onto itself.
    SelfReference,
    /// No molecule with this title exists in the method's structure file.
    MoleculeAbsent,
    /// The closest query conformer was farther than the rejection threshold.
    NoMatchWithinCutoff,
}

impl MatchOutcome {
    /// Converts a matcher result, where `None` is a rejected match.
    pub fn from_match(index: Option<usize>) -> Self {
        match index {
            Some(i) => Self::Matched(i),
            None => Self::NoMatchWithinCutoff,
        }
    }

    /// Index into the method's own energy list for reference position `position`.
    pub fn source_index(&self, position: usize) -> Option<usize> {
        match self {
            Self::Matched(i) => Some(*i),
            Self::SelfReference => Some(position),
            Self::MoleculeAbsent | Self::NoMatchWithinCutoff => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_match_maps_none_to_rejection() {
        assert_eq!(MatchOutcome::from_match(Some(3)), MatchOutcome::Matched(3));
        assert_eq!(
            MatchOutcome::from_match(None),
            MatchOutcome::NoMatchWithinCutoff
        );
    }

    #[test]
    fn source_index_follows_outcome() {
        assert_eq!(MatchOutcome::Matched(4).source_index(1), Some(4));
        assert_eq!(MatchOutcome::SelfReference.source_index(1), Some(1));
        assert_eq!(MatchOutcome::MoleculeAbsent.source_index(1), None);
        assert_eq!(MatchOutcome::NoMatchWithinCutoff.source_index(1), None);
    }

    #[test]
    fn serializes_with_explicit_kind_tag() {
        let json = serde_json::to_string(&vec![
            MatchOutcome::Matched(2),
            MatchOutcome::SelfReference,
            MatchOutcome::NoMatchWithinCutoff,
        ])
        .unwrap();
        assert_eq!(
            json,
            r#"[{"kind":"matched","index":2},{"kind":"self-reference"},{"kind":"no-match-within-cutoff"}]"#
        );
        let back: Vec<MatchOutcome> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0], MatchOutcome::Matched(2));
        assert_eq!(back[1], MatchOutcome::SelfReference);
    }
}
