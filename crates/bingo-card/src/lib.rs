//! Bingo cards: generation and win evaluation.
//!
//! This crate is pure and synchronous. A [`CardSpec`] is validated once
//! at start-up and then produces cards infallibly; [`has_won`] inspects a
//! card against the fixed [`WIN_LINES`].
//!
//! ```text
//!  0  1  2  3  4
//!  5  6  7  8  9
//! 10 11 12 13 14      cell indices; a card is read row by row
//! 15 16 17 18 19
//! 20 21 22 23 24
//! ```

mod card;
mod error;
mod win;

pub use card::{CARD_CELLS, Card, CardSpec, Cell, GRID_SIDE, Number, shuffled_range};
pub use error::CardError;
pub use win::{WIN_LINES, has_won, winning_line};
