//! Grammar registry and editor surface
//!
//! Where grammar text comes from and how editors consume tokens. The
//! [`GrammarSource`] trait abstracts fetching raw grammar text by scope
//! name. A directory, an HTTP cache, a test map: the registry does not
//! care. The [`Registry`] caches raw text and compiled grammars per scope
//! name for the process lifetime and hands out [`Session`]s: the thin
//! surface an editor integration drives one line at a time.
//!
//! Error policy follows the taxonomy: an unknown scope name surfaces as
//! [`SourceError::NotFound`] with no token stream; a grammar that fails to
//! compile degrades to a *plain* session where every line is one unscoped
//! token.

use crate::grammar::{parse_grammar, Grammar, GrammarParseError};
use crate::stack::RuleStack;
use crate::tokenizing::{SimpleToken, Tokenizer};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Errors fetching raw grammar text.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// No grammar is known under this scope name.
    NotFound { scope_name: String },
    /// The source exists but could not be read.
    Io { scope_name: String, detail: String },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NotFound { scope_name } => {
                write!(f, "No grammar found for scope '{}'", scope_name)
            }
            SourceError::Io { scope_name, detail } => {
                write!(f, "Failed reading grammar for scope '{}': {}", scope_name, detail)
            }
        }
    }
}

impl std::error::Error for SourceError {}

/// Errors loading a compiled grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    Source(SourceError),
    Parse(GrammarParseError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Source(err) => write!(f, "{}", err),
            RegistryError::Parse(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<SourceError> for RegistryError {
    fn from(err: SourceError) -> Self {
        RegistryError::Source(err)
    }
}

impl From<GrammarParseError> for RegistryError {
    fn from(err: GrammarParseError) -> Self {
        RegistryError::Parse(err)
    }
}

/// Provider of raw grammar text by scope name. Fetching happens once per
/// scope; the registry caches the result for the process lifetime.
pub trait GrammarSource {
    fn fetch(&self, scope_name: &str) -> Result<String, SourceError>;
}

/// Source over an in-memory map, for tests and embedded grammars.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    grammars: HashMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        MapSource::default()
    }

    pub fn insert(&mut self, scope_name: impl Into<String>, text: impl Into<String>) {
        self.grammars.insert(scope_name.into(), text.into());
    }
}

impl GrammarSource for MapSource {
    fn fetch(&self, scope_name: &str) -> Result<String, SourceError> {
        self.grammars
            .get(scope_name)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                scope_name: scope_name.to_string(),
            })
    }
}

/// Source over a directory of grammar files. A scope `source.c` is looked
/// up as `source.c.json`, `source.c.tmLanguage.json`, `source.c.yaml`,
/// then `source.c.yml`.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileSource { root: root.into() }
    }
}

impl GrammarSource for FileSource {
    fn fetch(&self, scope_name: &str) -> Result<String, SourceError> {
        const SUFFIXES: [&str; 4] = [".json", ".tmLanguage.json", ".yaml", ".yml"];
        for suffix in SUFFIXES {
            let path = self.root.join(format!("{}{}", scope_name, suffix));
            if !path.is_file() {
                continue;
            }
            return fs::read_to_string(&path).map_err(|err| SourceError::Io {
                scope_name: scope_name.to_string(),
                detail: err.to_string(),
            });
        }
        Err(SourceError::NotFound {
            scope_name: scope_name.to_string(),
        })
    }
}

/// Per-process grammar cache plus the session handout.
pub struct Registry<S: GrammarSource> {
    source: S,
    raw_cache: HashMap<String, String>,
    grammars: HashMap<String, Arc<Grammar>>,
}

impl<S: GrammarSource> Registry<S> {
    pub fn new(source: S) -> Self {
        Registry {
            source,
            raw_cache: HashMap::new(),
            grammars: HashMap::new(),
        }
    }

    /// Raw grammar text for a scope, fetched at most once.
    pub fn raw(&mut self, scope_name: &str) -> Result<&str, SourceError> {
        if !self.raw_cache.contains_key(scope_name) {
            let text = self.source.fetch(scope_name)?;
            self.raw_cache.insert(scope_name.to_string(), text);
        }
        Ok(&self.raw_cache[scope_name])
    }

    /// Compiled grammar for a scope, compiled at most once and shared.
    pub fn load(&mut self, scope_name: &str) -> Result<Arc<Grammar>, RegistryError> {
        if let Some(grammar) = self.grammars.get(scope_name) {
            return Ok(Arc::clone(grammar));
        }
        let grammar = Arc::new(parse_grammar(self.raw(scope_name)?)?);
        self.grammars
            .insert(scope_name.to_string(), Arc::clone(&grammar));
        Ok(grammar)
    }

    /// A tokenization session for a scope. An unknown scope is an error;
    /// a grammar that fails to compile yields the plain fallback session.
    pub fn session(&mut self, scope_name: &str) -> Result<Session, SourceError> {
        match self.load(scope_name) {
            Ok(grammar) => Ok(Session::Grammar {
                tokenizer: Box::new(Tokenizer::new(grammar)),
            }),
            Err(RegistryError::Source(err)) => Err(err),
            Err(RegistryError::Parse(_err)) => {
                #[cfg(feature = "debug")]
                log::debug!(
                    "grammar '{}' failed to compile, using plain session: {}",
                    scope_name,
                    _err
                );
                Ok(Session::Plain)
            }
        }
    }
}

/// The editor-facing callback surface: initial state plus a line
/// tokenizer whose tokens carry only the innermost scope.
pub enum Session {
    /// A real grammar drives tokenization.
    Grammar { tokenizer: Box<Tokenizer> },
    /// Fallback when the grammar failed to load: each line is one
    /// unscoped token.
    Plain,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Session::Grammar { .. } => f.write_str("Session::Grammar"),
            Session::Plain => f.write_str("Session::Plain"),
        }
    }
}

impl Session {
    /// The state to feed the first line: the empty stack.
    pub fn initial_state(&self) -> RuleStack {
        RuleStack::empty()
    }

    /// Tokenize one line, reducing scope paths to the innermost name.
    /// Thread the returned stack into the next line's call.
    pub fn tokenize_line(&mut self, line: &str, state: &RuleStack) -> (Vec<SimpleToken>, RuleStack) {
        match self {
            Session::Grammar { tokenizer } => {
                let result = tokenizer.tokenize_line(line, state);
                let tokens = result.tokens.iter().map(|t| t.simplified()).collect();
                (tokens, result.end_stack)
            }
            Session::Plain => {
                let tokens = if line.is_empty() {
                    Vec::new()
                } else {
                    vec![SimpleToken {
                        start: 0,
                        end: line.len(),
                        scope: None,
                    }]
                };
                (tokens, state.clone())
            }
        }
    }
}
