//! Conversion between positional (face-letter) and color-letter notation.
//!
//! Both directions key off the six face centers. Color to positional derives
//! a proper face/color mapping and rejects repeated centers. Positional to
//! color substitutes each face letter with whatever symbol sits at that
//! face's center in the *same* input, which for an ordinary positional string
//! is the face letter itself; both behaviors are kept as they are.

use serde::Serialize;

use crate::core::error::CubeError;
use crate::core::facelet::{
    COLOR_ALPHABET, FACELET_COUNT, Face, FaceletState, POSITIONAL_ALPHABET, has_nine_of_each,
    normalize,
};

pub fn is_valid_positional(state: &str) -> bool {
    has_nine_of_each(normalize(state).as_bytes(), &POSITIONAL_ALPHABET)
}

pub fn is_valid_color(state: &str) -> bool {
    has_nine_of_each(normalize(state).as_bytes(), &COLOR_ALPHABET)
}

/// Face -> color read from the centers of a color-notation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CenterMapping {
    colors: [u8; 6],
}

impl CenterMapping {
    pub fn color_of(&self, face: Face) -> u8 {
        self.colors[face.index()]
    }

    pub fn face_of(&self, color: u8) -> Option<Face> {
        Face::ALL
            .into_iter()
            .find(|face| self.colors[face.index()] == color)
    }

    /// Pairs in `U R F D L B` order.
    pub fn pairs(&self) -> impl Iterator<Item = (Face, char)> + '_ {
        Face::ALL
            .into_iter()
            .map(|face| (face, self.colors[face.index()] as char))
    }
}

/// Read the six centers in `U R F D L B` order.
///
/// Fails with [`CubeError::InvalidCenters`] unless all six are distinct.
pub fn derive_center_mapping(state: &FaceletState) -> Result<CenterMapping, CubeError> {
    let mut colors = [0u8; 6];
    for face in Face::ALL {
        colors[face.index()] = state.center(face);
    }
    let mut distinct = colors.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() != colors.len() {
        return Err(CubeError::InvalidCenters {
            centers: colors.iter().map(|&c| c as char).collect(),
        });
    }
    Ok(CenterMapping { colors })
}

/// Substitute every face letter with the symbol at that face's center.
pub fn positional_to_color(state: &str) -> Result<FaceletState, CubeError> {
    let input = FaceletState::parse(state)?;
    let mut out = [0u8; FACELET_COUNT];
    for (slot, &cell) in out.iter_mut().zip(input.cells()) {
        let face = Face::from_letter(cell).ok_or_else(|| {
            CubeError::Format(format!(
                "unexpected character in positional input: {}",
                cell as char
            ))
        })?;
        *slot = input.center(face);
    }
    Ok(FaceletState::from_cells(out))
}

/// Replace every color with the letter of the face whose center shows it.
pub fn color_to_pos(state: &str) -> Result<FaceletState, CubeError> {
    let input = FaceletState::parse(state)?;
    if !has_nine_of_each(input.cells(), &COLOR_ALPHABET) {
        return Err(CubeError::Format(
            "input is not a valid color string (invalid chars/counts)".to_string(),
        ));
    }
    let mapping = derive_center_mapping(&input)?;
    let mut out = [0u8; FACELET_COUNT];
    for (slot, &cell) in out.iter_mut().zip(input.cells()) {
        let face = mapping.face_of(cell).ok_or_else(|| {
            CubeError::Format(format!(
                "unexpected character in color input: {}",
                cell as char
            ))
        })?;
        *slot = face.letter();
    }
    Ok(FaceletState::from_cells(out))
}

/// Positional input converts to color, color input passes through
/// (normalized), anything else is rejected.
pub fn to_color(state: &str) -> Result<FaceletState, CubeError> {
    if is_valid_positional(state) {
        positional_to_color(state)
    } else if is_valid_color(state) {
        FaceletState::parse(state)
    } else {
        Err(CubeError::Format(
            "input state is neither a valid positional nor color-letter string \
             (54 characters of UDLRBF or YWGBOR required)"
                .to_string(),
        ))
    }
}

/// Bring either notation into positional form for the move engine.
pub fn to_positional(state: &str) -> Result<FaceletState, CubeError> {
    if is_valid_positional(state) {
        FaceletState::parse(state)
    } else {
        color_to_pos(state)
    }
}
