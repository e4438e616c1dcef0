//! Error types for the ShuffleCipher library.

use thiserror::Error;

/// Errors surfaced by the ShuffleCipher public API.
///
/// Invalid key symbols are deliberately absent: the key scheduler drops
/// them and keeps going, so they are reported through the log instead of
/// aborting the operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShuffleError {
    #[error("alphabet must contain at least one symbol")]
    EmptyAlphabet,

    #[error("duplicate symbol {symbol:?} in alphabet")]
    DuplicateSymbol { symbol: char },

    #[error("symbol {symbol:?} is not defined in the alphabet")]
    UndefinedSymbol { symbol: char },

    #[error("lexical value {value} is outside the alphabet range 0..{klen}")]
    ValueOutOfRange { value: usize, klen: usize },

    #[error("duplicate main offset {offset} in metacipher configuration")]
    DuplicateMainOffset { offset: i64 },
}
