//! Grammar loading: raw serde structures, the compiled model, and the
//! compiler between them.

pub mod compiling;
pub mod model;
pub mod raw;

pub use compiling::{compile, parse_grammar, parse_raw, GrammarParseError};
pub use model::{CaptureMap, Grammar, Pattern, PatternId, Terminator};
