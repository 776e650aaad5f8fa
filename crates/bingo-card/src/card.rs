//! Cards, cells, and the card generator.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::CardError;

/// A bingo number. Numbers run from 1 to the configured range maximum.
pub type Number = u32;

/// Cells per card.
pub const CARD_CELLS: usize = 25;

/// Width and height of the card grid.
pub const GRID_SIDE: usize = 5;

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// One cell of a card.
///
/// Marking changes the tag, never the number. On the wire a cell is
/// `{"state": "unmarked", "number": 7}` or `{"state": "marked", "number": 7}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "number", rename_all = "snake_case")]
pub enum Cell {
    Unmarked(Number),
    Marked(Number),
}

impl Cell {
    /// The number printed on this cell.
    pub fn number(&self) -> Number {
        match *self {
            Self::Unmarked(n) | Self::Marked(n) => n,
        }
    }

    pub fn is_marked(&self) -> bool {
        matches!(self, Self::Marked(_))
    }
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// A 5×5 card of distinct numbers, stored row by row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Card {
    cells: Vec<Cell>,
}

impl Card {
    /// Builds an unmarked card from a fixed layout.
    ///
    /// Used where the layout must be known in advance (tests, replays of a
    /// seeded game). Rejects zeros and repeated numbers.
    pub fn from_numbers(numbers: [Number; CARD_CELLS]) -> Result<Self, CardError> {
        let mut seen = HashSet::with_capacity(CARD_CELLS);
        for &n in &numbers {
            if n == 0 {
                return Err(CardError::InvalidNumber(n));
            }
            if !seen.insert(n) {
                return Err(CardError::DuplicateNumber(n));
            }
        }
        Ok(Self {
            cells: numbers.into_iter().map(Cell::Unmarked).collect(),
        })
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// The card's numbers in cell order, marked or not.
    pub fn numbers(&self) -> impl Iterator<Item = Number> + '_ {
        self.cells.iter().map(Cell::number)
    }

    /// The cell index holding `number`, if it is on this card.
    pub fn position(&self, number: Number) -> Option<usize> {
        self.cells.iter().position(|c| c.number() == number)
    }

    pub fn contains(&self, number: Number) -> bool {
        self.position(number).is_some()
    }

    /// Whether the cell at `index` is marked. Out-of-range indices are not.
    pub fn is_marked(&self, index: usize) -> bool {
        self.cells.get(index).is_some_and(Cell::is_marked)
    }

    /// Marks `number` if it is on the card.
    ///
    /// Returns `true` only if a cell changed. Absent or already-marked
    /// numbers leave the card untouched.
    pub fn mark(&mut self, number: Number) -> bool {
        match self.position(number) {
            Some(i) if !self.cells[i].is_marked() => {
                self.cells[i] = Cell::Marked(number);
                true
            }
            _ => false,
        }
    }

    pub fn marked_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_marked()).count()
    }
}

// ---------------------------------------------------------------------------
// CardSpec (the generator)
// ---------------------------------------------------------------------------

/// A validated number range that cards and draw orders are built from.
///
/// Construction is the only fallible step. Once a `CardSpec` exists every
/// call to [`generate`](Self::generate) succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardSpec {
    range_max: Number,
}

impl CardSpec {
    /// Range used by classic 75-ball bingo.
    pub const REFERENCE_RANGE: Number = 75;

    /// Largest supported range.
    pub const MAX_RANGE: Number = 10_000;

    pub fn new(range_max: Number) -> Result<Self, CardError> {
        if (range_max as usize) < CARD_CELLS {
            return Err(CardError::RangeTooSmall {
                range_max,
                cells: CARD_CELLS,
            });
        }
        if range_max > Self::MAX_RANGE {
            return Err(CardError::RangeTooLarge {
                range_max,
                max: Self::MAX_RANGE,
            });
        }
        Ok(Self { range_max })
    }

    pub fn range_max(&self) -> Number {
        self.range_max
    }

    /// Whether `number` lies in `1..=range_max`.
    pub fn contains(&self, number: Number) -> bool {
        (1..=self.range_max).contains(&number)
    }

    /// Deals a fresh card: a uniform permutation of the range, first 25 kept.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Card {
        let mut numbers = shuffled_range(self.range_max, rng);
        numbers.truncate(CARD_CELLS);
        Card {
            cells: numbers.into_iter().map(Cell::Unmarked).collect(),
        }
    }
}

impl Default for CardSpec {
    fn default() -> Self {
        Self {
            range_max: Self::REFERENCE_RANGE,
        }
    }
}

/// Returns `1..=range_max` in uniformly random order (Fisher–Yates).
pub fn shuffled_range<R: Rng + ?Sized>(range_max: Number, rng: &mut R) -> Vec<Number> {
    let mut numbers: Vec<Number> = (1..=range_max).collect();
    numbers.shuffle(rng);
    numbers
}
