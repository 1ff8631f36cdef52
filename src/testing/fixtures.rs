//! Verified grammar fixtures
//!
//! Each constant is one grammar shape the engine must handle, named for
//! what it exercises. [`grammar`] compiles one into the shared `Arc` form
//! tests hand to a tokenizer.

use crate::grammar::{parse_grammar, Grammar};
use std::sync::Arc;

/// Compile a fixture, panicking loudly on a broken fixture.
pub fn grammar(source: &str) -> Arc<Grammar> {
    match parse_grammar(source) {
        Ok(grammar) => Arc::new(grammar),
        Err(err) => panic!("fixture grammar failed to compile: {}", err),
    }
}

/// One keyword match rule. Line `int x;` tokenizes as `int` under
/// `keyword` and ` x;` unscoped.
pub const KEYWORD: &str = r#"{
    "scopeName": "source.demo",
    "patterns": [
        { "match": "\\bint\\b", "name": "keyword" }
    ]
}"#;

/// A `/* ... */` block comment span, no children.
pub const BLOCK_COMMENT: &str = r#"{
    "scopeName": "source.demo",
    "patterns": [
        { "begin": "/\\*", "end": "\\*/", "name": "comment" }
    ]
}"#;

/// Two rules that both match `foo` at the same offset; the first listed
/// must win.
pub const AMBIGUOUS_PAIR: &str = r#"{
    "scopeName": "source.demo",
    "patterns": [
        { "match": "foo", "name": "first" },
        { "match": "foo(bar)?", "name": "second" }
    ]
}"#;

/// A match rule whose capture groups carry their own scopes.
pub const CAPTURES: &str = r#"{
    "scopeName": "source.demo",
    "patterns": [
        {
            "match": "(\\w+)(=)(\\w+)",
            "name": "meta.assignment",
            "captures": {
                "1": { "name": "variable" },
                "2": { "name": "operator" },
                "3": { "name": "value" }
            }
        }
    ]
}"#;

/// A small C-like grammar wired through the repository: block comments
/// with a TODO child, double-quoted strings with an escape child, and a
/// keyword match.
pub const C_LIKE: &str = r##"{
    "scopeName": "source.clike",
    "patterns": [
        { "include": "#comment" },
        { "include": "#string" },
        { "include": "#keyword" }
    ],
    "repository": {
        "comment": {
            "begin": "/\\*",
            "end": "\\*/",
            "name": "comment.block",
            "patterns": [
                { "match": "TODO", "name": "keyword.todo" }
            ]
        },
        "string": {
            "begin": "\"",
            "end": "\"",
            "name": "string.quoted",
            "patterns": [
                { "match": "\\\\.", "name": "constant.escape" }
            ]
        },
        "keyword": {
            "match": "\\b(if|else|while|return|int)\\b",
            "name": "keyword.control"
        }
    }
}"##;

/// Nested spans: parentheses groups that may contain themselves via
/// `$self`, plus a word match.
pub const NESTED_GROUPS: &str = r#"{
    "scopeName": "source.demo",
    "patterns": [
        {
            "begin": "\\(",
            "end": "\\)",
            "name": "group",
            "patterns": [ { "include": "$self" } ]
        },
        { "match": "\\w+", "name": "word" }
    ]
}"#;

/// A begin/while quote block in the markdown style: lines stay in the
/// span only while they keep starting with `>`.
pub const WHILE_QUOTE: &str = r#"{
    "scopeName": "text.demo",
    "patterns": [
        {
            "begin": "^> ",
            "while": "^> ",
            "name": "quote",
            "patterns": [ { "match": "\\bbold\\b", "name": "emphasis" } ]
        }
    ]
}"#;

/// A string span whose end pattern back-references the quote the begin
/// captured.
pub const BACKREF_STRING: &str = r#"{
    "scopeName": "source.demo",
    "patterns": [
        { "begin": "(['\"])", "end": "\\1", "name": "string.quoted" }
    ]
}"#;

/// Mutually recursive repository entries; compiles because includes are
/// references.
pub const CYCLIC_REPOSITORY: &str = r##"{
    "scopeName": "source.demo",
    "patterns": [ { "include": "#a" } ],
    "repository": {
        "a": { "patterns": [ { "include": "#b" }, { "match": "x", "name": "letter" } ] },
        "b": { "patterns": [ { "include": "#a" } ] }
    }
}"##;

/// An include of another grammar's scope; out of scope, never matches.
pub const EXTERNAL_INCLUDE: &str = r#"{
    "scopeName": "source.demo",
    "patterns": [
        { "include": "source.other" },
        { "match": "x", "name": "letter" }
    ]
}"#;

/// An end pattern that can match at the begin offset: the span closes
/// immediately and must not consume the begin twice.
pub const EMPTY_SPAN: &str = r#"{
    "scopeName": "source.demo",
    "patterns": [
        { "begin": "<", "end": ">|(?:)", "name": "angle" }
    ]
}"#;

/// A rule that only ever matches the empty string; the tokenizer must
/// still advance and terminate.
pub const ZERO_WIDTH: &str = r#"{
    "scopeName": "source.demo",
    "patterns": [
        { "match": "(?:)", "name": "zero" }
    ]
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_fixtures_compile() {
        for source in [
            KEYWORD,
            BLOCK_COMMENT,
            AMBIGUOUS_PAIR,
            CAPTURES,
            C_LIKE,
            NESTED_GROUPS,
            WHILE_QUOTE,
            BACKREF_STRING,
            CYCLIC_REPOSITORY,
            EXTERNAL_INCLUDE,
            EMPTY_SPAN,
            ZERO_WIDTH,
        ] {
            grammar(source);
        }
    }
}
