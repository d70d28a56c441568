//! Subgoal masks and the ordered strategy that a solve walks through.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::CubeError;
use crate::core::facelet::{FACELET_COUNT, Face, FaceletState, normalize};

/// Text form of a cell the subgoal does not care about.
pub const WILDCARD: u8 = b'.';

/// A partial target: each cell is either a fixed symbol or a wildcard.
#[derive(Clone, PartialEq, Eq)]
pub struct SubgoalMask([Option<u8>; FACELET_COUNT]);

impl SubgoalMask {
    pub fn wildcard() -> Self {
        Self([None; FACELET_COUNT])
    }

    /// Fix every cell to `state`.
    pub fn fixed(state: &FaceletState) -> Self {
        Self((*state.cells()).map(Some))
    }

    /// Fix `cells` to their values in the solved cube; everything else is a wildcard.
    pub fn solved_at(cells: impl IntoIterator<Item = usize>) -> Self {
        let solved = FaceletState::solved();
        let mut mask = Self::wildcard();
        for index in cells {
            mask.0[index] = Some(solved.get(index));
        }
        mask
    }

    /// Parse 54 cells where `.` is a wildcard and anything else must be a
    /// face letter. Whitespace is ignored.
    pub fn parse(text: &str) -> Result<Self, CubeError> {
        let normalized = normalize(text);
        let bytes = normalized.as_bytes();
        if bytes.len() != FACELET_COUNT {
            return Err(CubeError::Format(format!(
                "mask must have {FACELET_COUNT} cells, got {}",
                bytes.len()
            )));
        }
        let mut mask = Self::wildcard();
        for (slot, &cell) in mask.0.iter_mut().zip(bytes) {
            if cell == WILDCARD {
                continue;
            }
            if Face::from_letter(cell).is_none() {
                return Err(CubeError::Format(format!(
                    "mask cell '{}' is neither a face letter nor '{}'",
                    cell as char, WILDCARD as char
                )));
            }
            *slot = Some(cell);
        }
        Ok(mask)
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.0[index]
    }

    pub fn fixed_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| cell.map(|_| index))
    }

    pub fn fixed_count(&self) -> usize {
        self.fixed_indices().count()
    }

    /// Masked cells where `state` and `goal` disagree.
    pub fn mismatches(&self, state: &FaceletState, goal: &FaceletState) -> usize {
        self.fixed_indices()
            .filter(|&index| state.get(index) != goal.get(index))
            .count()
    }

    pub fn is_satisfied_by(&self, state: &FaceletState) -> bool {
        self.0
            .iter()
            .zip(state.cells())
            .all(|(target, &cell)| target.is_none_or(|symbol| symbol == cell))
    }
}

impl fmt::Display for SubgoalMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.0 {
            write!(f, "{}", cell.unwrap_or(WILDCARD) as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for SubgoalMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubgoalMask({self})")
    }
}

impl Serialize for SubgoalMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SubgoalMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Take the mask's symbol where fixed, the current state's symbol elsewhere.
pub fn create_goal_state(mask: &SubgoalMask, current: &FaceletState) -> FaceletState {
    let mut cells = *current.cells();
    for (slot, target) in cells.iter_mut().zip(&mask.0) {
        if let Some(symbol) = target {
            *slot = *symbol;
        }
    }
    FaceletState::from_cells(cells)
}

/// A named stage of a solve strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subgoal {
    pub name: String,
    pub mask: SubgoalMask,
}

impl Subgoal {
    pub fn new(name: impl Into<String>, mask: SubgoalMask) -> Self {
        Self {
            name: name.into(),
            mask,
        }
    }
}

/// Ordered, read-only list of subgoals. Solve outcomes never feed back into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubgoalPlanner {
    subgoals: Vec<Subgoal>,
}

impl SubgoalPlanner {
    pub fn new(subgoals: Vec<Subgoal>) -> Self {
        Self { subgoals }
    }

    /// Beginner's method, U layer first: cross, first-layer corners, second
    /// layer, then everything else. Centers are fixed in every stage.
    pub fn layer_by_layer() -> Self {
        const SIDES: [Face; 4] = [Face::R, Face::F, Face::L, Face::B];
        let centers = Face::ALL.map(Face::center);
        let side_rows = |rows: std::ops::Range<usize>| {
            SIDES.into_iter().flat_map(move |face| {
                let start = face.cells().start;
                rows.clone().flat_map(move |row| start + row * 3..start + row * 3 + 3)
            })
        };

        let u_edges = [1, 3, 5, 7];
        let side_top_edges = SIDES.map(|face| face.cells().start + 1);
        let cross = centers
            .into_iter()
            .chain(u_edges)
            .chain(side_top_edges);

        let first_layer = centers
            .into_iter()
            .chain(Face::U.cells())
            .chain(side_rows(0..1));
        let second_layer = centers
            .into_iter()
            .chain(Face::U.cells())
            .chain(side_rows(0..2));

        Self::new(vec![
            Subgoal::new("cross", SubgoalMask::solved_at(cross)),
            Subgoal::new("first-layer corners", SubgoalMask::solved_at(first_layer)),
            Subgoal::new("second layer", SubgoalMask::solved_at(second_layer)),
            Subgoal::new("last layer", SubgoalMask::fixed(&FaceletState::solved())),
        ])
    }

    pub fn subgoals(&self) -> &[Subgoal] {
        &self.subgoals
    }

    pub fn get(&self, index: usize) -> Option<&Subgoal> {
        self.subgoals.get(index)
    }

    pub fn len(&self) -> usize {
        self.subgoals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subgoals.is_empty()
    }
}

impl Default for SubgoalPlanner {
    fn default() -> Self {
        Self::layer_by_layer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moves::apply_sequence;

    fn scrambled() -> FaceletState {
        apply_sequence(&FaceletState::solved(), "R U2 F' L D B2 R' U").expect("scramble")
    }

    #[test]
    fn wildcard_mask_returns_current_state() {
        for state in [FaceletState::solved(), scrambled()] {
            assert_eq!(create_goal_state(&SubgoalMask::wildcard(), &state), state);
        }
    }

    #[test]
    fn fixed_mask_ignores_current_state() {
        let target = scrambled();
        let mask = SubgoalMask::fixed(&target);
        for state in [FaceletState::solved(), scrambled()] {
            assert_eq!(create_goal_state(&mask, &state), target);
        }
    }

    #[test]
    fn partial_mask_merges_cells() {
        let current = scrambled();
        let mask = SubgoalMask::solved_at([0, 13, 53]);
        let goal = create_goal_state(&mask, &current);
        assert_eq!(goal.get(0), b'U');
        assert_eq!(goal.get(13), b'R');
        assert_eq!(goal.get(53), b'B');
        for index in (1..FACELET_COUNT).filter(|i| ![13, 53].contains(i)) {
            assert_eq!(goal.get(index), current.get(index));
        }
    }

    #[test]
    fn mismatches_count_only_masked_cells() {
        let mask = SubgoalMask::solved_at([0, 1, 2]);
        let goal = FaceletState::solved();
        let mut cells = *goal.cells();
        cells[1] = b'F';
        cells[40] = b'F';
        let state = FaceletState::from_cells(cells);
        assert_eq!(mask.mismatches(&state, &goal), 1);
        assert!(!mask.is_satisfied_by(&state));
        assert!(SubgoalMask::solved_at([0, 2]).is_satisfied_by(&state));
    }

    #[test]
    fn parse_round_trips_through_display() {
        let text = format!("U{}", ".".repeat(FACELET_COUNT - 1));
        let mask = SubgoalMask::parse(&text).expect("parse");
        assert_eq!(mask.fixed_count(), 1);
        assert_eq!(mask.to_string(), text);
    }

    #[test]
    fn parse_rejects_bad_cells() {
        assert!(SubgoalMask::parse("U.").is_err());
        let text = format!("W{}", ".".repeat(FACELET_COUNT - 1));
        assert!(matches!(
            SubgoalMask::parse(&text),
            Err(CubeError::Format(_))
        ));
    }

    #[test]
    fn layer_by_layer_stages_grow_and_end_solved() {
        let planner = SubgoalPlanner::layer_by_layer();
        let names: Vec<&str> = planner.subgoals().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["cross", "first-layer corners", "second layer", "last layer"]
        );

        let counts: Vec<usize> = planner
            .subgoals()
            .iter()
            .map(|s| s.mask.fixed_count())
            .collect();
        assert_eq!(counts, vec![14, 26, 34, 54]);

        for pair in planner.subgoals().windows(2) {
            let earlier: Vec<usize> = pair[0].mask.fixed_indices().collect();
            assert!(earlier.iter().all(|&i| pair[1].mask.get(i).is_some()));
        }

        let last = planner.get(planner.len() - 1).expect("last");
        assert_eq!(
            create_goal_state(&last.mask, &scrambled()),
            FaceletState::solved()
        );
    }

    #[test]
    fn solved_cube_satisfies_every_stage() {
        let solved = FaceletState::solved();
        for subgoal in SubgoalPlanner::default().subgoals() {
            assert!(subgoal.mask.is_satisfied_by(&solved), "{}", subgoal.name);
        }
    }
}
