//! Compiled grammar model
//!
//! The in-memory, immutable form of a grammar. Patterns live in a single
//! arena and refer to each other by [`PatternId`], so self-referential and
//! mutually recursive grammars are representable without recursive ownership.
//! Includes do not survive compilation: an `"include"` in the raw grammar
//! becomes a plain `PatternId` wherever it was referenced.
//!
//! A [`Grammar`] is `Send + Sync` and is shared read-only (`Arc<Grammar>`)
//! by every tokenization session that uses it.

use std::collections::BTreeMap;

/// Index of a pattern in its grammar's arena.
pub type PatternId = usize;

/// Capture-group number to scope name, in group order.
pub type CaptureMap = BTreeMap<usize, String>;

/// How a span ends.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    /// Span ends when this regex matches (begin/end span).
    End(String),
    /// Span persists across lines only while this regex matches at the
    /// start of each continuation line (begin/while span).
    While(String),
}

impl Terminator {
    /// The terminator's regex source, regardless of kind.
    pub fn source(&self) -> &str {
        match self {
            Terminator::End(s) | Terminator::While(s) => s,
        }
    }
}

/// One compiled rule. The variant set is closed; the tokenizer matches on
/// it exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Single-line rule: one regex, one optional scope, capture scopes.
    Match {
        regex: String,
        scope: Option<String>,
        captures: CaptureMap,
    },
    /// Multi-line rule delimited by a begin regex and a terminator.
    /// `children` are tried only while the span is open.
    Span {
        begin: String,
        terminator: Terminator,
        scope: Option<String>,
        begin_captures: CaptureMap,
        terminator_captures: CaptureMap,
        children: Vec<PatternId>,
        /// Tie-break override: when set, children win over the end pattern
        /// at equal start offsets.
        end_last: bool,
        /// Whether the terminator source contains `\1`..`\9` and needs
        /// per-instance resolution against the begin match.
        end_has_backrefs: bool,
    },
    /// A rule that only groups other rules. Also the compiled form of an
    /// external include we cannot resolve: an empty group never matches.
    Group { children: Vec<PatternId> },
}

/// A compiled, immutable grammar: root pattern list plus the arena every
/// `PatternId` indexes into.
#[derive(Debug)]
pub struct Grammar {
    scope_name: String,
    root: Vec<PatternId>,
    arena: Vec<Pattern>,
}

impl Grammar {
    pub(crate) fn new(scope_name: String, root: Vec<PatternId>, arena: Vec<Pattern>) -> Self {
        Grammar {
            scope_name,
            root,
            arena,
        }
    }

    /// The grammar's root scope name, e.g. `source.c`.
    pub fn scope_name(&self) -> &str {
        &self.scope_name
    }

    /// Top-level patterns, in priority order.
    pub fn root(&self) -> &[PatternId] {
        &self.root
    }

    /// Look up a pattern by id. Ids handed out by this grammar are always
    /// valid; passing an id from a different grammar is a logic error.
    pub fn pattern(&self, id: PatternId) -> &Pattern {
        &self.arena[id]
    }

    /// Number of patterns in the arena.
    pub fn pattern_count(&self) -> usize {
        self.arena.len()
    }
}
