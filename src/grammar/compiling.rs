//! Grammar compilation
//!
//! Turns raw grammar text into a [`Grammar`]: parse with serde, allocate
//! one arena slot per repository entry (order-independent, single pass),
//! then compile every declaration, resolving includes to arena indices.
//!
//! Includes resolve to *references*, never to copies, so mutually recursive
//! repository entries compile fine; only an unresolved internal name is an
//! error. External includes (`source.other`) compile to an empty group that
//! never matches. Regex sources are not validated here; the scanner
//! backend decides what it can compile, and rejects per pattern (see
//! [`scanning`](crate::scanning)).

use crate::grammar::model::{CaptureMap, Grammar, Pattern, PatternId, Terminator};
use crate::grammar::raw::{RawCapture, RawGrammar, RawPattern};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Errors that make a grammar unusable. Fatal to loading that grammar;
/// the registry falls back to plain tokenization (see
/// [`registry`](crate::registry)).
#[derive(Debug, Clone, PartialEq)]
pub enum GrammarParseError {
    /// The text is not well-formed in any accepted format.
    Malformed { detail: String },
    /// The text is a format this crate does not parse (plist/XML).
    UnsupportedFormat { detail: String },
    /// A declaration is missing a required field.
    MissingField {
        context: String,
        field: &'static str,
    },
    /// A declaration has no body at all (no match, begin, include or
    /// patterns).
    EmptyPattern { context: String },
    /// An internal `#name` include has no repository entry.
    UnresolvedInclude { context: String, reference: String },
}

impl fmt::Display for GrammarParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarParseError::Malformed { detail } => {
                write!(f, "Malformed grammar: {}", detail)
            }
            GrammarParseError::UnsupportedFormat { detail } => {
                write!(f, "Unsupported grammar format: {}", detail)
            }
            GrammarParseError::MissingField { context, field } => {
                write!(f, "Missing field '{}' in {}", field, context)
            }
            GrammarParseError::EmptyPattern { context } => {
                write!(
                    f,
                    "Pattern in {} has no match, begin, include or patterns",
                    context
                )
            }
            GrammarParseError::UnresolvedInclude { context, reference } => {
                write!(
                    f,
                    "Include '{}' in {} has no repository entry",
                    reference, context
                )
            }
        }
    }
}

impl std::error::Error for GrammarParseError {}

/// Parse raw grammar text (JSON primary, YAML accepted) and compile it.
pub fn parse_grammar(text: &str) -> Result<Grammar, GrammarParseError> {
    compile(parse_raw(text)?)
}

/// Deserialize grammar text without compiling it.
pub fn parse_raw(text: &str) -> Result<RawGrammar, GrammarParseError> {
    let head = text.trim_start();
    if head.starts_with("<?xml") || head.starts_with("<!DOCTYPE") || head.starts_with("<plist") {
        return Err(GrammarParseError::UnsupportedFormat {
            detail: "plist grammars are not parsed; convert to JSON first".to_string(),
        });
    }

    match serde_json::from_str(text) {
        Ok(raw) => Ok(raw),
        Err(json_err) => serde_yaml::from_str(text).map_err(|yaml_err| {
            GrammarParseError::Malformed {
                detail: format!("not valid JSON ({}) nor YAML ({})", json_err, yaml_err),
            }
        }),
    }
}

/// Compile a deserialized grammar into its arena form.
pub fn compile(raw: RawGrammar) -> Result<Grammar, GrammarParseError> {
    let mut compiler = Compiler::new();

    // One slot per repository entry up front, so includes can reference
    // entries that compile later.
    for name in raw.repository.keys() {
        let slot = compiler.reserve();
        compiler.repository.insert(name.clone(), slot);
    }

    for (name, declaration) in &raw.repository {
        let context = format!("repository.{}", name);
        let slot = compiler.repository[name];
        let node = compiler.compile_body(declaration, &context)?;
        compiler.arena[slot] = node;
    }

    let mut root = Vec::with_capacity(raw.patterns.len());
    for (index, declaration) in raw.patterns.iter().enumerate() {
        let context = format!("patterns[{}]", index);
        root.push(compiler.compile_pattern(declaration, &context)?);
    }

    // `$self` was reserved before anything else; it becomes the root list.
    compiler.arena[compiler.self_slot] = Pattern::Group {
        children: root.clone(),
    };

    #[cfg(feature = "debug")]
    log::debug!(
        "compiled grammar '{}': {} patterns, {} root rules",
        raw.scope_name,
        compiler.arena.len(),
        root.len()
    );

    Ok(Grammar::new(raw.scope_name, root, compiler.arena))
}

struct Compiler {
    arena: Vec<Pattern>,
    repository: HashMap<String, PatternId>,
    self_slot: PatternId,
}

impl Compiler {
    fn new() -> Self {
        let mut compiler = Compiler {
            arena: Vec::new(),
            repository: HashMap::new(),
            self_slot: 0,
        };
        compiler.self_slot = compiler.reserve();
        compiler
    }

    /// Allocate an arena slot with a placeholder that never matches.
    fn reserve(&mut self) -> PatternId {
        self.arena.push(Pattern::Group {
            children: Vec::new(),
        });
        self.arena.len() - 1
    }

    /// Compile one declaration, returning the id to reference it by.
    /// Includes resolve to existing slots and allocate nothing.
    fn compile_pattern(
        &mut self,
        declaration: &RawPattern,
        context: &str,
    ) -> Result<PatternId, GrammarParseError> {
        if let Some(reference) = &declaration.include {
            return self.resolve_include(reference, context);
        }
        let node = self.compile_body(declaration, context)?;
        self.arena.push(node);
        Ok(self.arena.len() - 1)
    }

    fn resolve_include(
        &mut self,
        reference: &str,
        context: &str,
    ) -> Result<PatternId, GrammarParseError> {
        if reference == "$self" || reference == "$base" {
            return Ok(self.self_slot);
        }
        if let Some(name) = reference.strip_prefix('#') {
            return self.repository.get(name).copied().ok_or_else(|| {
                GrammarParseError::UnresolvedInclude {
                    context: context.to_string(),
                    reference: reference.to_string(),
                }
            });
        }
        // Cross-grammar include: out of scope, compiles to a group that
        // never matches.
        #[cfg(feature = "debug")]
        log::debug!("external include '{}' in {} compiled as no-op", reference, context);
        Ok(self.reserve())
    }

    /// Compile a declaration that has a body (everything but a bare
    /// include) into a pattern node.
    fn compile_body(
        &mut self,
        declaration: &RawPattern,
        context: &str,
    ) -> Result<Pattern, GrammarParseError> {
        if let Some(reference) = &declaration.include {
            // A repository entry that is itself an include becomes a group
            // around the target.
            let target = self.resolve_include(reference, context)?;
            return Ok(Pattern::Group {
                children: vec![target],
            });
        }

        if let Some(regex) = &declaration.match_ {
            return Ok(Pattern::Match {
                regex: regex.clone(),
                scope: declaration.name.clone(),
                captures: convert_captures(&declaration.captures),
            });
        }

        if let Some(begin) = &declaration.begin {
            let terminator = if let Some(end) = &declaration.end {
                Terminator::End(end.clone())
            } else if let Some(while_) = &declaration.while_ {
                Terminator::While(while_.clone())
            } else {
                return Err(GrammarParseError::MissingField {
                    context: context.to_string(),
                    field: "end",
                });
            };

            // `captures` stands in for begin/end captures when the specific
            // tables are absent.
            let begin_captures = pick_captures(&declaration.begin_captures, &declaration.captures);
            let specific = match terminator {
                Terminator::End(_) => &declaration.end_captures,
                Terminator::While(_) => &declaration.while_captures,
            };
            let terminator_captures = pick_captures(specific, &declaration.captures);

            let mut children = Vec::with_capacity(declaration.patterns.len());
            for (index, child) in declaration.patterns.iter().enumerate() {
                let child_context = format!("{}.patterns[{}]", context, index);
                children.push(self.compile_pattern(child, &child_context)?);
            }

            let end_has_backrefs = has_backrefs(terminator.source());
            return Ok(Pattern::Span {
                begin: begin.clone(),
                terminator,
                scope: declaration.name.clone(),
                begin_captures,
                terminator_captures,
                children,
                end_last: declaration.apply_end_pattern_last,
                end_has_backrefs,
            });
        }

        if !declaration.patterns.is_empty() {
            let mut children = Vec::with_capacity(declaration.patterns.len());
            for (index, child) in declaration.patterns.iter().enumerate() {
                let child_context = format!("{}.patterns[{}]", context, index);
                children.push(self.compile_pattern(child, &child_context)?);
            }
            return Ok(Pattern::Group { children });
        }

        Err(GrammarParseError::EmptyPattern {
            context: context.to_string(),
        })
    }
}

fn convert_captures(raw: &BTreeMap<String, RawCapture>) -> CaptureMap {
    let mut captures = CaptureMap::new();
    for (key, capture) in raw {
        let (Ok(group), Some(name)) = (key.parse::<usize>(), &capture.name) else {
            continue;
        };
        captures.insert(group, name.clone());
    }
    captures
}

fn pick_captures(
    specific: &BTreeMap<String, RawCapture>,
    general: &BTreeMap<String, RawCapture>,
) -> CaptureMap {
    if specific.is_empty() {
        convert_captures(general)
    } else {
        convert_captures(specific)
    }
}

/// True when the pattern contains a `\1`..`\9` back-reference, skipping
/// escaped backslashes.
fn has_backrefs(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'\\' {
            if bytes[i + 1].is_ascii_digit() && bytes[i + 1] != b'0' {
                return true;
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    false
}
