use phf::phf_map;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static ATOMIC_NUMBERS: phf::Map<&'static str, u8> = phf_map! {
    "H" => 1, "He" => 2, "Li" => 3, "Be" => 4, "B" => 5, "C" => 6, "N" => 7, "O" => 8,
    "F" => 9, "Ne" => 10, "Na" => 11, "Mg" => 12, "Al" => 13, "Si" => 14, "P" => 15,
    "S" => 16, "Cl" => 17, "Ar" => 18, "K" => 19, "Ca" => 20, "Sc" => 21, "Ti" => 22,
    "V" => 23, "Cr" => 24, "Mn" => 25, "Fe" => 26, "Co" => 27, "Ni" => 28, "Cu" => 29,
    "Zn" => 30, "Ga" => 31, "Ge" => 32, "As" => 33, "Se" => 34, "Br" => 35, "Kr" => 36,
    "Rb" => 37, "Sr" => 38, "Y" => 39, "Zr" => 40, "Nb" => 41, "Mo" => 42, "Tc" => 43,
    "Ru" => 44, "Rh" => 45, "Pd" => 46, "Ag" => 47, "Cd" => 48, "In" => 49, "Sn" => 50,
    "Sb" => 51, "Te" => 52, "I" => 53, "Xe" => 54, "Cs" => 55, "Ba" => 56, "La" => 57,
    "Ce" => 58, "Pr" => 59, "Nd" => 60, "Pm" => 61, "Sm" => 62, "Eu" => 63, "Gd" => 64,
    "Tb" => 65, "Dy" => 66, "Ho" => 67, "Er" => 68, "Tm" => 69, "Yb" => 70, "Lu" => 71,
    "Hf" => 72, "Ta" => 73, "W" => 74, "Re" => 75, "Os" => 76, "Ir" => 77, "Pt" => 78,
    "Au" => 79, "Hg" => 80, "Tl" => 81, "Pb" => 82, "Bi" => 83, "Po" => 84, "At" => 85,
    "Rn" => 86, "Fr" => 87, "Ra" => 88, "Ac" => 89, "Th" => 90, "Pa" => 91, "U" => 92,
    "Np" => 93, "Pu" => 94, "Am" => 95, "Cm" => 96, "Bk" => 97, "Cf" => 98, "Es" => 99,
    "Fm" => 100, "Md" => 101, "No" => 102, "Lr" => 103, "Rf" => 104, "Db" => 105,
    "Sg" => 106, "Bh" => 107, "Hs" => 108, "Mt" => 109, "Ds" => 110, "Rg" => 111,
    "Cn" => 112, "Nh" => 113, "Fl" => 114, "Mc" => 115, "Lv" => 116, "Ts" => 117,
    "Og" => 118,
};

/// A chemical element identified by its atomic number.
///
/// Only the atomic number takes part in equality, so element labels compare
/// cheaply during automorphism searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element(u8);

impl Element {
    pub fn atomic_number(&self) -> u8 {
        self.0
    }

    pub fn symbol(&self) -> &'static str {
        ATOMIC_NUMBERS
            .entries()
            .find(|(_, z)| **z == self.0)
            .map(|(symbol, _)| *symbol)
            .unwrap_or("?")
    }

    pub fn is_hydrogen(&self) -> bool {
        self.0 == 1
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown element symbol: '{0}'")]
pub struct ParseElementError(pub String);

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let normalized: String = match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(|c| c.to_lowercase()))
                .collect(),
            None => return Err(ParseElementError(s.to_string())),
        };
        // Deuterium and tritium are hydrogens for symmetry purposes.
        let lookup = match normalized.as_str() {
            "D" | "T" => "H",
            other => other,
        };
        ATOMIC_NUMBERS
            .get(lookup)
            .map(|&z| Element(z))
            .ok_or_else(|| ParseElementError(s.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// An atom of a small molecule as read from a structure file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Atom {
    pub element: Element,
    /// Formal charge taken from the atom block charge field.
    pub formal_charge: i8,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            formal_charge: 0,
        }
    }

    pub fn with_charge(element: Element, formal_charge: i8) -> Self {
        Self {
            element,
            formal_charge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_from_str_is_case_insensitive() {
        assert_eq!("C".parse::<Element>().unwrap().atomic_number(), 6);
        assert_eq!("cl".parse::<Element>().unwrap().atomic_number(), 17);
        assert_eq!("BR".parse::<Element>().unwrap().atomic_number(), 35);
        assert_eq!(" n ".parse::<Element>().unwrap().atomic_number(), 7);
    }

    #[test]
    fn table_covers_lanthanides_and_heavy_transition_metals() {
        let expected = [
            ("La", 57),
            ("Gd", 64),
            ("Lu", 71),
            ("Hf", 72),
            ("W", 74),
            ("Ir", 77),
            ("Rn", 86),
            ("U", 92),
        ];
        for (symbol, z) in expected {
            let element: Element = symbol.parse().unwrap();
            assert_eq!(element.atomic_number(), z);
            assert_eq!(element.symbol(), symbol);
        }
    }

    #[test]
    fn element_from_str_maps_isotopes_to_hydrogen() {
        assert!("D".parse::<Element>().unwrap().is_hydrogen());
        assert!("T".parse::<Element>().unwrap().is_hydrogen());
    }

    #[test]
    fn element_from_str_rejects_unknown_symbols() {
        assert!("Xx".parse::<Element>().is_err());
        assert!("".parse::<Element>().is_err());
    }

    #[test]
    fn element_display_round_trips_symbol() {
        let oxygen: Element = "O".parse().unwrap();
        assert_eq!(oxygen.to_string(), "O");
        let chlorine: Element = "CL".parse().unwrap();
        assert_eq!(chlorine.to_string(), "Cl");
    }

    #[test]
    fn atom_new_has_zero_formal_charge() {
        let atom = Atom::new("N".parse().unwrap());
        assert_eq!(atom.formal_charge, 0);
        let charged = Atom::with_charge("N".parse().unwrap(), 1);
        assert_ne!(atom, charged);
    }
}
