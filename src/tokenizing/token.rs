//! Token types
//!
//! A token is a maximal span of line text carrying one scope path. Tokens
//! for a line are contiguous, non-overlapping, and cover the whole line;
//! concatenating their texts reconstructs the line exactly.

use crate::stack::RuleStack;
use serde::{Deserialize, Serialize};

/// A span of a line with its full scope path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Byte offset where the span starts.
    pub start: usize,
    /// Byte offset one past the end of the span.
    pub end: usize,
    /// Scope names, outermost first, innermost last. Empty for text no
    /// pattern claimed outside any span.
    pub scopes: Vec<String>,
}

impl Token {
    /// The token's text within its line.
    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        &line[self.start..self.end]
    }

    /// The innermost scope name, if any.
    pub fn innermost_scope(&self) -> Option<&str> {
        self.scopes.last().map(|s| s.as_str())
    }

    /// Reduce to the innermost scope only, for consumers that don't need
    /// the nesting.
    pub fn simplified(&self) -> SimpleToken {
        SimpleToken {
            start: self.start,
            end: self.end,
            scope: self.scopes.last().cloned(),
        }
    }
}

/// A token reduced to its innermost scope, the shape simple editor
/// integrations consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleToken {
    pub start: usize,
    pub end: usize,
    pub scope: Option<String>,
}

/// Result of tokenizing one line: the tokens plus the rule stack to thread
/// into the next line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineTokens {
    pub tokens: Vec<Token>,
    pub end_stack: RuleStack,
}
