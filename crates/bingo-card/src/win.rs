//! Win evaluation.

use crate::{Card, GRID_SIDE};

/// Every winning line as cell indices: five rows, five columns, two diagonals.
pub static WIN_LINES: [[usize; GRID_SIDE]; 12] = [
    [0, 1, 2, 3, 4],
    [5, 6, 7, 8, 9],
    [10, 11, 12, 13, 14],
    [15, 16, 17, 18, 19],
    [20, 21, 22, 23, 24],
    [0, 5, 10, 15, 20],
    [1, 6, 11, 16, 21],
    [2, 7, 12, 17, 22],
    [3, 8, 13, 18, 23],
    [4, 9, 14, 19, 24],
    [0, 6, 12, 18, 24],
    [4, 8, 12, 16, 20],
];

/// The first line whose cells are all marked, if any.
pub fn winning_line(card: &Card) -> Option<&'static [usize; GRID_SIDE]> {
    WIN_LINES
        .iter()
        .find(|line| line.iter().all(|&i| card.is_marked(i)))
}

/// Returns `true` if any line on the card is fully marked.
///
/// Cheap enough to run after every mark; nothing is cached.
pub fn has_won(card: &Card) -> bool {
    winning_line(card).is_some()
}
