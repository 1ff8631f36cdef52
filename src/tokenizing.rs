//! Line tokenization: the core engine and its token types.

pub mod line;
pub mod token;

pub use line::{Tokenizer, DEFAULT_MAX_DEPTH};
pub use token::{LineTokens, SimpleToken, Token};
