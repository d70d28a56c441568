//! Canonical 54-facelet cube state.
//!
//! Facelets are stored in six 9-cell blocks in `U R F D L B` order, each block
//! read row by row as seen when looking straight at that face (the layout used
//! by Kociemba-style solvers). Index 4 of every block is the face center.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::CubeError;

pub const FACELET_COUNT: usize = 54;
pub const FACE_SIZE: usize = 9;

/// Face-identity symbols.
pub const POSITIONAL_ALPHABET: [u8; 6] = *b"UDLRBF";
/// Color-letter symbols.
pub const COLOR_ALPHABET: [u8; 6] = *b"YWGBOR";

/// One of the six faces, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Face {
    U,
    R,
    F,
    D,
    L,
    B,
}

impl Face {
    pub const ALL: [Face; 6] = [Face::U, Face::R, Face::F, Face::D, Face::L, Face::B];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn letter(self) -> u8 {
        match self {
            Face::U => b'U',
            Face::R => b'R',
            Face::F => b'F',
            Face::D => b'D',
            Face::L => b'L',
            Face::B => b'B',
        }
    }

    pub fn from_letter(letter: u8) -> Option<Face> {
        match letter {
            b'U' => Some(Face::U),
            b'R' => Some(Face::R),
            b'F' => Some(Face::F),
            b'D' => Some(Face::D),
            b'L' => Some(Face::L),
            b'B' => Some(Face::B),
            _ => None,
        }
    }

    /// Facelet index of this face's center (4, 13, 22, 31, 40, 49).
    pub fn center(self) -> usize {
        self.index() * FACE_SIZE + 4
    }

    pub fn cells(self) -> Range<usize> {
        let start = self.index() * FACE_SIZE;
        start..start + FACE_SIZE
    }
}

/// Which alphabet a state string is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    Positional,
    Color,
    Invalid,
}

impl Notation {
    pub fn as_str(self) -> &'static str {
        match self {
            Notation::Positional => "positional",
            Notation::Color => "color",
            Notation::Invalid => "invalid",
        }
    }
}

/// Strip all whitespace and uppercase, so `"uuu uuu"` and `"UUUUUU"` compare equal.
pub fn normalize(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<String>()
        .to_ascii_uppercase()
}

/// True iff `cells` has exactly 54 symbols drawn from `alphabet`, nine of each.
pub(crate) fn has_nine_of_each(cells: &[u8], alphabet: &[u8; 6]) -> bool {
    if cells.len() != FACELET_COUNT {
        return false;
    }
    let mut counts = [0usize; 6];
    for cell in cells {
        match alphabet.iter().position(|symbol| symbol == cell) {
            Some(slot) => counts[slot] += 1,
            None => return false,
        }
    }
    counts.iter().all(|&count| count == FACE_SIZE)
}

/// A 54-symbol cube state. Value type: every move produces a new state.
///
/// The container only enforces length and ASCII; alphabet and count checks
/// are exposed through [`FaceletState::notation`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceletState([u8; FACELET_COUNT]);

impl FaceletState {
    /// The solved cube in positional notation.
    pub fn solved() -> Self {
        let mut cells = [0u8; FACELET_COUNT];
        for face in Face::ALL {
            cells[face.cells()].fill(face.letter());
        }
        Self(cells)
    }

    /// Parse a state string after whitespace removal and uppercasing.
    pub fn parse(input: &str) -> Result<Self, CubeError> {
        let normalized = normalize(input);
        if let Some(bad) = normalized.chars().find(|ch| !ch.is_ascii_graphic()) {
            return Err(CubeError::Format(format!("unexpected character '{bad}'")));
        }
        let bytes = normalized.as_bytes();
        let cells: [u8; FACELET_COUNT] = bytes.try_into().map_err(|_| {
            CubeError::Format(format!(
                "expected {FACELET_COUNT} facelets, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(cells))
    }

    pub fn from_cells(cells: [u8; FACELET_COUNT]) -> Self {
        Self(cells)
    }

    pub fn cells(&self) -> &[u8; FACELET_COUNT] {
        &self.0
    }

    pub fn get(&self, index: usize) -> u8 {
        self.0[index]
    }

    pub fn center(&self, face: Face) -> u8 {
        self.0[face.center()]
    }

    pub fn face(&self, face: Face) -> &[u8] {
        &self.0[face.cells()]
    }

    pub fn notation(&self) -> Notation {
        if has_nine_of_each(&self.0, &POSITIONAL_ALPHABET) {
            Notation::Positional
        } else if has_nine_of_each(&self.0, &COLOR_ALPHABET) {
            Notation::Color
        } else {
            Notation::Invalid
        }
    }

    /// Occurrences of `symbol` across all 54 cells.
    pub fn count(&self, symbol: u8) -> usize {
        self.0.iter().filter(|&&cell| cell == symbol).count()
    }
}

impl fmt::Display for FaceletState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &cell in &self.0 {
            write!(f, "{}", cell as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FaceletState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FaceletState({self})")
    }
}

impl FromStr for FaceletState {
    type Err = CubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FaceletState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FaceletState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLVED: &str = "UUUUUUUUURRRRRRRRRFFFFFFFFFDDDDDDDDDLLLLLLLLLBBBBBBBBB";

    #[test]
    fn solved_state_renders_in_block_order() {
        assert_eq!(FaceletState::solved().to_string(), SOLVED);
        assert_eq!(FaceletState::solved().notation(), Notation::Positional);
    }

    #[test]
    fn parse_tolerates_whitespace_and_case() {
        let spaced = "uuuuuuuuu rrrrrrrrr fffffffff\nddddddddd lllllllll bbbbbbbbb";
        let state = FaceletState::parse(spaced).expect("parse");
        assert_eq!(state, FaceletState::solved());
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = FaceletState::parse(&SOLVED[..53]).unwrap_err();
        assert_eq!(
            err,
            CubeError::Format("expected 54 facelets, got 53".to_string())
        );
        assert!(FaceletState::parse(&format!("{SOLVED}U")).is_err());
    }

    #[test]
    fn parse_rejects_non_ascii() {
        let input = format!("{}é", &SOLVED[..53]);
        assert!(matches!(
            FaceletState::parse(&input),
            Err(CubeError::Format(_))
        ));
    }

    #[test]
    fn centers_follow_fixed_offsets() {
        let offsets: Vec<usize> = Face::ALL.iter().map(|face| face.center()).collect();
        assert_eq!(offsets, vec![4, 13, 22, 31, 40, 49]);
        let solved = FaceletState::solved();
        for face in Face::ALL {
            assert_eq!(solved.center(face), face.letter());
        }
    }

    #[test]
    fn notation_detects_counts() {
        let mut cells = *FaceletState::solved().cells();
        cells[0] = b'R';
        assert_eq!(FaceletState::from_cells(cells).notation(), Notation::Invalid);
    }

    #[test]
    fn serde_uses_plain_string() {
        let json = serde_json::to_string(&FaceletState::solved()).expect("serialize");
        assert_eq!(json, format!("\"{SOLVED}\""));
        let back: FaceletState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, FaceletState::solved());
    }
}
