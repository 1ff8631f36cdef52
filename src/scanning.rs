//! Pattern scanning
//!
//! The adapter boundary between the tokenizer and a regular-expression
//! primitive. The tokenizer never talks to a regex crate directly: it
//! compiles candidate lists through a [`ScannerFactory`] and asks the
//! resulting [`PatternScanner`] for the earliest match at or after an
//! offset, ties broken by list order. That keeps the concrete engine
//! swappable: the default backend wraps the `regex` crate, and the
//! `oniguruma` feature adds an Oniguruma-compatible backend for grammars
//! that use look-around or named groups.
//!
//! Budgets: a backtracking engine can be handed a per-pattern step budget.
//! Exhausting it is reported per pattern ([`ScanError::BudgetExceeded`])
//! and treated by callers as "no match for that pattern only"; it never
//! aborts a line. The default engine is linear-time and ignores the budget.

use std::fmt;

pub mod regex_backend;

#[cfg(feature = "oniguruma")]
pub mod onig_backend;

#[cfg(feature = "oniguruma")]
pub use onig_backend::OnigFactory;
pub use regex_backend::RegexFactory;

/// A successful match of one candidate pattern within a line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanMatch {
    /// Index of the pattern in the candidate list it was compiled from.
    pub index: usize,
    /// Byte offset where the match starts.
    pub start: usize,
    /// Byte offset one past the end of the match.
    pub end: usize,
    /// Byte spans per capture group, group 0 (the whole match) first.
    /// `None` for groups that did not participate.
    pub captures: Vec<Option<(usize, usize)>>,
}

/// Per-pattern evaluation budget for backtracking engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchBudget {
    steps: Option<u32>,
}

impl MatchBudget {
    /// No budget; evaluation may take as long as the engine needs.
    pub fn unlimited() -> Self {
        MatchBudget { steps: None }
    }

    /// Cap evaluation of a single pattern at roughly `steps` engine steps.
    pub fn steps(steps: u32) -> Self {
        MatchBudget { steps: Some(steps) }
    }

    pub fn limit(&self) -> Option<u32> {
        self.steps
    }
}

impl Default for MatchBudget {
    fn default() -> Self {
        MatchBudget::unlimited()
    }
}

/// Scan failures. The only variant is budget exhaustion; engines must not
/// fail a scan for any other reason (patterns they cannot compile simply
/// never match).
#[derive(Debug, Clone, PartialEq)]
pub enum ScanError {
    /// Evaluating one pattern exceeded the configured budget.
    BudgetExceeded { pattern: usize },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::BudgetExceeded { pattern } => {
                write!(f, "Match budget exceeded evaluating pattern {}", pattern)
            }
        }
    }
}

impl std::error::Error for ScanError {}

/// A compiled candidate list over one engine.
pub trait PatternScanner {
    /// Number of patterns this scanner was compiled from.
    fn pattern_count(&self) -> usize;

    /// Match one pattern by index at or after `offset`, reporting capture
    /// spans. Budget exhaustion surfaces as an error here.
    fn match_pattern(
        &self,
        index: usize,
        line: &str,
        offset: usize,
    ) -> Result<Option<ScanMatch>, ScanError>;

    /// The match with the smallest start offset at or after `offset`;
    /// among equal starts, the pattern earliest in the list. A pattern
    /// that exhausts its budget contributes no match.
    fn find_next(&self, line: &str, offset: usize) -> Option<ScanMatch> {
        let mut best: Option<ScanMatch> = None;
        for index in 0..self.pattern_count() {
            let found = match self.match_pattern(index, line, offset) {
                Ok(Some(found)) => found,
                Ok(None) | Err(ScanError::BudgetExceeded { .. }) => continue,
            };
            if best.as_ref().map_or(true, |b| found.start < b.start) {
                let at_offset = found.start == offset;
                best = Some(found);
                if at_offset {
                    // Nothing can start earlier, and later patterns lose
                    // the tie anyway.
                    break;
                }
            }
        }
        best
    }
}

/// Compiles candidate lists for a concrete engine. Compilation is
/// infallible by contract: a pattern the engine rejects becomes a slot
/// that never matches.
pub trait ScannerFactory {
    type Scanner: PatternScanner;

    fn compile(&self, patterns: &[String], budget: MatchBudget) -> Self::Scanner;
}
