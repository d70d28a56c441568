//! Face turns as facelet permutations.
//!
//! The six clockwise quarter turns are derived once from cube geometry: every
//! sticker gets a point in a doubled integer lattice (`2 * cubie + normal`),
//! the stickers of the turning layer are rotated a quarter turn about the
//! face normal, and the landing point is looked up again. Counterclockwise
//! turns are inverses and half turns are squares, giving an 18-entry table
//! built on first use and shared afterwards.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize, Serializer};

use crate::core::error::CubeError;
use crate::core::facelet::{FACE_SIZE, FACELET_COUNT, Face, FaceletState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Turn {
    Clockwise,
    CounterClockwise,
    Half,
}

impl Turn {
    pub const ALL: [Turn; 3] = [Turn::Clockwise, Turn::CounterClockwise, Turn::Half];

    fn index(self) -> usize {
        self as usize
    }

    pub fn inverse(self) -> Turn {
        match self {
            Turn::Clockwise => Turn::CounterClockwise,
            Turn::CounterClockwise => Turn::Clockwise,
            Turn::Half => Turn::Half,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Turn::Clockwise => "",
            Turn::CounterClockwise => "'",
            Turn::Half => "2",
        }
    }
}

/// One of the 18 face turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub face: Face,
    pub turn: Turn,
}

impl Move {
    pub fn new(face: Face, turn: Turn) -> Self {
        Self { face, turn }
    }

    /// All 18 moves, grouped by face in `U R F D L B` order.
    pub fn all() -> impl Iterator<Item = Move> {
        Face::ALL
            .into_iter()
            .flat_map(|face| Turn::ALL.into_iter().map(move |turn| Move::new(face, turn)))
    }

    pub fn inverse(self) -> Move {
        Move::new(self.face, self.turn.inverse())
    }

    pub fn permutation(self) -> &'static Permutation {
        &MOVE_TABLE[self.face.index() * Turn::ALL.len() + self.turn.index()]
    }

    pub fn apply(self, state: &FaceletState) -> FaceletState {
        self.permutation().apply(state)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.face.letter() as char, self.turn.suffix())
    }
}

impl Serialize for Move {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for Move {
    type Err = CubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_moves(s)?.as_slice() {
            [single] => Ok(*single),
            _ => Err(CubeError::InvalidMoveToken(s.to_string())),
        }
    }
}

/// A facelet permutation stored as "destination takes from source".
#[derive(Clone, PartialEq, Eq)]
pub struct Permutation([u8; FACELET_COUNT]);

impl Permutation {
    pub fn identity() -> Self {
        let mut sources = [0u8; FACELET_COUNT];
        for (dest, slot) in sources.iter_mut().enumerate() {
            *slot = dest as u8;
        }
        Self(sources)
    }

    pub fn apply(&self, state: &FaceletState) -> FaceletState {
        let cells = state.cells();
        let mut out = [0u8; FACELET_COUNT];
        for (slot, &source) in out.iter_mut().zip(&self.0) {
            *slot = cells[source as usize];
        }
        FaceletState::from_cells(out)
    }

    /// Permutation equivalent to applying `self` and then `next`.
    pub fn then(&self, next: &Permutation) -> Permutation {
        let mut sources = [0u8; FACELET_COUNT];
        for (slot, &via) in sources.iter_mut().zip(&next.0) {
            *slot = self.0[via as usize];
        }
        Self(sources)
    }

    pub fn inverse(&self) -> Permutation {
        let mut sources = [0u8; FACELET_COUNT];
        for (dest, &source) in self.0.iter().enumerate() {
            sources[source as usize] = dest as u8;
        }
        Self(sources)
    }

    /// Indices that this permutation leaves in place.
    pub fn fixed_points(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|&(dest, &source)| dest == source as usize)
            .map(|(dest, _)| dest)
    }
}

impl fmt::Debug for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Permutation").field(&&self.0[..]).finish()
    }
}

static MOVE_TABLE: LazyLock<Vec<Permutation>> = LazyLock::new(|| {
    let points: Vec<Point> = (0..FACELET_COUNT).map(sticker_point).collect();
    let mut table = Vec::with_capacity(Face::ALL.len() * Turn::ALL.len());
    for face in Face::ALL {
        let clockwise = quarter_turn(face, &points);
        let counter = clockwise.inverse();
        let half = clockwise.then(&clockwise);
        table.extend([clockwise, counter, half]);
    }
    table
});

type Point = [i8; 3];

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
    Z,
}

/// Outward normal of a face as (axis, sign).
fn face_normal(face: Face) -> (Axis, i8) {
    match face {
        Face::U => (Axis::Y, 1),
        Face::D => (Axis::Y, -1),
        Face::R => (Axis::X, 1),
        Face::L => (Axis::X, -1),
        Face::F => (Axis::Z, 1),
        Face::B => (Axis::Z, -1),
    }
}

/// Lattice point of a sticker: x to the right, y up, z toward the viewer of F.
fn sticker_point(index: usize) -> Point {
    let face = Face::ALL[index / FACE_SIZE];
    let row = (index % FACE_SIZE / 3) as i8;
    let col = (index % 3) as i8;
    let (cubie, normal): (Point, Point) = match face {
        Face::U => ([col - 1, 1, row - 1], [0, 1, 0]),
        Face::R => ([1, 1 - row, 1 - col], [1, 0, 0]),
        Face::F => ([col - 1, 1 - row, 1], [0, 0, 1]),
        Face::D => ([col - 1, -1, 1 - row], [0, -1, 0]),
        Face::L => ([-1, 1 - row, col - 1], [-1, 0, 0]),
        Face::B => ([1 - col, 1 - row, -1], [0, 0, -1]),
    };
    [
        2 * cubie[0] + normal[0],
        2 * cubie[1] + normal[1],
        2 * cubie[2] + normal[2],
    ]
}

/// Quarter turn clockwise as seen from outside the face whose normal is
/// `(axis, sign)`; that is a -90 degree rotation about the outward normal.
fn rotate_clockwise([x, y, z]: Point, axis: Axis, sign: i8) -> Point {
    match (axis, sign > 0) {
        (Axis::X, true) => [x, z, -y],
        (Axis::X, false) => [x, -z, y],
        (Axis::Y, true) => [-z, y, x],
        (Axis::Y, false) => [z, y, -x],
        (Axis::Z, true) => [y, -x, z],
        (Axis::Z, false) => [-y, x, z],
    }
}

fn quarter_turn(face: Face, points: &[Point]) -> Permutation {
    let (axis, sign) = face_normal(face);
    let mut sources = Permutation::identity().0;
    for (source, &point) in points.iter().enumerate() {
        // Stickers of the turning layer sit at +-2 or +-3 along the normal.
        if sign * point[axis as usize] < 2 {
            continue;
        }
        let moved = rotate_clockwise(point, axis, sign);
        let dest = points
            .iter()
            .position(|&candidate| candidate == moved)
            .expect("rotated sticker lands on another sticker");
        sources[dest] = source as u8;
    }
    Permutation(sources)
}

/// Parse face turns such as `R U' F2`, also accepting them concatenated
/// (`RU'F2`) and the half-turn spellings `2'` and `'2`.
pub fn parse_moves(sequence: &str) -> Result<Vec<Move>, CubeError> {
    let mut moves = Vec::new();
    for chunk in sequence.split_whitespace() {
        let bytes = chunk.as_bytes();
        let mut pos = 0;
        while pos < bytes.len() {
            let face = Face::from_letter(bytes[pos])
                .ok_or_else(|| CubeError::InvalidMoveToken(chunk.to_string()))?;
            pos += 1;
            let turn = match (bytes.get(pos), bytes.get(pos + 1)) {
                (Some(b'2'), Some(b'\'')) | (Some(b'\''), Some(b'2')) => {
                    pos += 2;
                    Turn::Half
                }
                (Some(b'2'), _) => {
                    pos += 1;
                    Turn::Half
                }
                (Some(b'\''), _) => {
                    pos += 1;
                    Turn::CounterClockwise
                }
                _ => Turn::Clockwise,
            };
            moves.push(Move::new(face, turn));
        }
    }
    Ok(moves)
}

/// Apply moves strictly left to right.
pub fn apply_moves(state: &FaceletState, moves: &[Move]) -> FaceletState {
    moves.iter().fold(*state, |current, mv| mv.apply(&current))
}

/// Parse then apply; any unrecognized token fails the whole sequence.
pub fn apply_sequence(state: &FaceletState, sequence: &str) -> Result<FaceletState, CubeError> {
    let moves = parse_moves(sequence)?;
    Ok(apply_moves(state, &moves))
}

pub fn invert_moves(moves: &[Move]) -> Vec<Move> {
    moves.iter().rev().map(|mv| mv.inverse()).collect()
}

pub fn format_moves(moves: &[Move]) -> String {
    moves
        .iter()
        .map(Move::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
