//! Raw grammar structures
//!
//! This module is the serde-facing half of grammar loading: it mirrors the
//! on-the-wire shape of a TextMate-style grammar (JSON or YAML) without
//! interpreting it. Everything here is permissive on purpose: real grammars
//! carry fields this crate does not act on (`fileTypes`, `uuid`, comments),
//! and those must deserialize without error. Interpretation and validation
//! happen in [`compiling`](super::compiling).

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// A whole grammar definition as found in a `.tmLanguage.json` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGrammar {
    /// Root scope of the grammar, e.g. `source.c`.
    pub scope_name: String,
    /// Top-level pattern list, tried in order.
    #[serde(default)]
    pub patterns: Vec<RawPattern>,
    /// Named reusable patterns, referenced with `"include": "#name"`.
    #[serde(default)]
    pub repository: BTreeMap<String, RawPattern>,
}

/// One rule declaration. Which fields are set decides the rule kind:
/// `include` wins, then `match`, then `begin` + (`end` | `while`), then a
/// bare `patterns` list (a grouping rule).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPattern {
    pub include: Option<String>,
    #[serde(rename = "match")]
    pub match_: Option<String>,
    pub begin: Option<String>,
    pub end: Option<String>,
    #[serde(rename = "while")]
    pub while_: Option<String>,
    /// Scope name assigned to the matched text.
    pub name: Option<String>,
    #[serde(default)]
    pub captures: BTreeMap<String, RawCapture>,
    #[serde(default)]
    pub begin_captures: BTreeMap<String, RawCapture>,
    #[serde(default)]
    pub end_captures: BTreeMap<String, RawCapture>,
    #[serde(default)]
    pub while_captures: BTreeMap<String, RawCapture>,
    #[serde(default)]
    pub patterns: Vec<RawPattern>,
    /// Flips the tie-break between a span's end pattern and its children.
    /// Grammars in the wild write this as a bool or as 0/1.
    #[serde(default, deserialize_with = "bool_or_int")]
    pub apply_end_pattern_last: bool,
}

/// A capture-group entry: `{ "1": { "name": "keyword.control" } }`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCapture {
    pub name: Option<String>,
}

fn bool_or_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
    })
}
