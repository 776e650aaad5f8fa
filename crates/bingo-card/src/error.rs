//! Error types for card construction.

use crate::Number;

/// Errors raised when a card or card range is built from bad input.
///
/// None of these can happen per game: [`CardSpec::new`](crate::CardSpec::new)
/// is checked once at start-up and [`Card::from_numbers`](crate::Card::from_numbers)
/// is only fed fixed layouts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardError {
    /// The number range cannot fill a card with distinct values.
    #[error("range 1..={range_max} is too small for a {cells}-cell card")]
    RangeTooSmall { range_max: Number, cells: usize },

    /// The number range is larger than the server supports.
    #[error("range 1..={range_max} exceeds the maximum of {max}")]
    RangeTooLarge { range_max: Number, max: Number },

    /// A layout repeats a number.
    #[error("number {0} appears more than once on the card")]
    DuplicateNumber(Number),

    /// A layout contains 0; numbers start at 1.
    #[error("card numbers start at 1, got {0}")]
    InvalidNumber(Number),
}
