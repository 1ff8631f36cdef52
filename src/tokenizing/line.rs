//! Line tokenization
//!
//! The core engine: one line of text in, an ordered token list and the
//! next line's rule stack out. The tokenizer walks the line left to right,
//! asking the scanner for the earliest candidate match, emitting a token
//! for any gap, then applying the winning rule: plain matches emit and
//! advance, span begins push a frame, span ends pop one. Reaching the end
//! of the line inside a span is normal; the frame rides out in the
//! returned stack.
//!
//! Tie-breaks: among candidates matching at the same offset, the pattern
//! earlier in its list wins. The enclosing span's own end pattern is tried
//! *before* the children (it wins ties) unless the span sets
//! `applyEndPatternLast`.
//!
//! Tokenization never fails: text no pattern claims gets the enclosing
//! scope path, pathological grammars degrade to coarser tokens, and a
//! per-pattern match budget (on backtracking backends) turns runaway
//! regexes into "no match" instead of a hang.
//!
//! A tokenizer is cheap to create and single-threaded by design (scanner
//! caches are not shared); the [`Grammar`] behind it is the shared,
//! immutable piece.

use crate::grammar::{CaptureMap, Grammar, Pattern, PatternId, Terminator};
use crate::scanning::{MatchBudget, PatternScanner, RegexFactory, ScannerFactory};
use crate::stack::{Frame, RuleStack};
use crate::tokenizing::token::{LineTokens, Token};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

/// Default cap on rule-stack depth; begin matches past it are consumed as
/// plain matches.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// The line tokenizer for one grammar.
pub struct Tokenizer<F: ScannerFactory = RegexFactory> {
    grammar: Arc<Grammar>,
    factory: F,
    budget: MatchBudget,
    max_depth: usize,
    candidates: HashMap<Option<PatternId>, Rc<CandidateSet<F::Scanner>>>,
    terminators: HashMap<String, Rc<F::Scanner>>,
}

impl Tokenizer {
    /// Tokenizer over the default `regex` backend.
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Tokenizer::with_factory(grammar, RegexFactory)
    }
}

impl<F: ScannerFactory> Tokenizer<F> {
    /// Tokenizer over a specific scanner backend.
    pub fn with_factory(grammar: Arc<Grammar>, factory: F) -> Self {
        Tokenizer {
            grammar,
            factory,
            budget: MatchBudget::unlimited(),
            max_depth: DEFAULT_MAX_DEPTH,
            candidates: HashMap::new(),
            terminators: HashMap::new(),
        }
    }

    /// Per-pattern step budget handed to the scanner backend.
    pub fn with_budget(mut self, budget: MatchBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Rule-stack depth cap.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    /// Tokenize one line (no embedded line terminators), threading the
    /// rule stack from the previous line. An empty line yields zero tokens
    /// and an unchanged stack.
    pub fn tokenize_line(&mut self, line: &str, initial: &RuleStack) -> LineTokens {
        if line.is_empty() {
            return LineTokens {
                tokens: Vec::new(),
                end_stack: initial.clone(),
            };
        }

        let mut acc = TokenAccumulator::default();
        let mut pos = 0usize;
        let mut stack = self.check_while_frames(line, initial, &mut pos, &mut acc);

        // Backstop against grammars that push and pop without consuming
        // anything; generous enough that real grammars never hit it.
        let max_iterations = (line.len() + 1) * 8 + 32;
        let mut iterations = 0usize;

        while pos < line.len() {
            iterations += 1;
            if iterations > max_iterations {
                #[cfg(feature = "debug")]
                log::debug!("iteration cap hit at offset {}; emitting remainder", pos);
                break;
            }

            let Some(found) = self.next_match(line, pos, &stack) else {
                break;
            };

            #[cfg(feature = "debug")]
            log::debug!(
                "matched {:?} at {}..{} (depth {})",
                found.action,
                found.start,
                found.end,
                stack.depth()
            );

            // The gap before the match keeps the enclosing scope path.
            acc.produce(found.start, stack.scope_path());

            let depth_before = stack.depth();
            match found.action {
                FoundAction::Single(id) => {
                    let Pattern::Match { scope, captures, .. } = self.grammar.pattern(id) else {
                        unreachable!("candidate actions only reference matches and spans");
                    };
                    let scopes = extend_path(stack.scope_path(), scope.as_deref());
                    emit_with_captures(&mut acc, &found, captures, &scopes);
                }
                FoundAction::Begin(id) => {
                    let Pattern::Span {
                        scope,
                        begin_captures,
                        terminator,
                        end_has_backrefs,
                        ..
                    } = self.grammar.pattern(id)
                    else {
                        unreachable!("candidate actions only reference matches and spans");
                    };
                    let scopes = extend_path(stack.scope_path(), scope.as_deref());
                    emit_with_captures(&mut acc, &found, begin_captures, &scopes);

                    if stack.depth() < self.max_depth {
                        let resolved_end = if *end_has_backrefs {
                            let resolved =
                                resolve_backrefs(terminator.source(), line, &found.captures);
                            Some(Arc::from(resolved.as_str()))
                        } else {
                            None
                        };
                        stack = stack.push(Frame {
                            pattern: id,
                            scopes: Arc::from(scopes),
                            resolved_end,
                        });
                    }
                    // At the depth cap the begin was consumed as a plain
                    // match; no frame.
                }
                FoundAction::Close => {
                    // The closing delimiter is still inside the span: emit
                    // with the path including the scope being closed.
                    let frame = stack
                        .top()
                        .expect("a close is only found with a frame on top")
                        .clone();
                    let Pattern::Span {
                        terminator_captures,
                        ..
                    } = self.grammar.pattern(frame.pattern)
                    else {
                        unreachable!("frames only reference spans");
                    };
                    emit_with_captures(&mut acc, &found, terminator_captures, &frame.scopes);
                    stack = stack.pop().expect("frame on top").1;
                }
            }

            if found.end > pos {
                pos = found.end;
            } else if stack.depth() == depth_before {
                // Zero-width match with no stack movement: consume one
                // character so the loop terminates.
                let step = next_char_boundary(line, pos);
                acc.produce(step, stack.scope_path());
                pos = step;
            }
        }

        // Whatever is left matched nothing; it keeps the enclosing scope.
        acc.produce(line.len(), stack.scope_path());

        LineTokens {
            tokens: acc.finish(),
            end_stack: stack,
        }
    }

    /// Line-start handling for begin/while frames: each one, outermost
    /// first, must re-match its `while` regex at the current offset or it
    /// pops together with everything above it.
    fn check_while_frames(
        &mut self,
        line: &str,
        initial: &RuleStack,
        pos: &mut usize,
        acc: &mut TokenAccumulator,
    ) -> RuleStack {
        if initial.is_empty() {
            return initial.clone();
        }

        let frames: Vec<Frame> = initial.frames().cloned().collect();
        let mut keep = frames.len();

        for (index, frame) in frames.iter().rev().enumerate() {
            let source = match self.grammar.pattern(frame.pattern) {
                Pattern::Span {
                    terminator: Terminator::While(src),
                    ..
                } => frame.resolved_end.as_deref().unwrap_or(src.as_str()).to_string(),
                // End-type spans are not tested at line start.
                _ => continue,
            };

            let scanner = self.terminator_scanner(&source);
            let matched = scanner
                .match_pattern(0, line, *pos)
                .ok()
                .flatten()
                .filter(|m| m.start == *pos);

            match matched {
                Some(m) => {
                    let captures = {
                        let Pattern::Span {
                            terminator_captures,
                            ..
                        } = self.grammar.pattern(frame.pattern)
                        else {
                            unreachable!("frames only reference spans");
                        };
                        terminator_captures.clone()
                    };
                    let found = Found {
                        action: FoundAction::Close,
                        start: m.start,
                        end: m.end,
                        captures: m.captures,
                    };
                    emit_with_captures(acc, &found, &captures, &frame.scopes);
                    *pos = m.end;
                }
                None => {
                    keep = index;
                    break;
                }
            }
        }

        let mut stack = initial.clone();
        for _ in keep..frames.len() {
            stack = stack.pop().expect("popping counted frames").1;
        }
        stack
    }

    /// Best candidate at or after `pos`: the top span's children (or the
    /// root patterns) combined with the span's own end pattern under the
    /// documented tie rule.
    fn next_match(&mut self, line: &str, pos: usize, stack: &RuleStack) -> Option<Found> {
        let key = stack.top().map(|frame| frame.pattern);

        let set = self.candidate_set(key);
        let child = set.scanner.find_next(line, pos).map(|m| Found {
            action: set.actions[m.index].into(),
            start: m.start,
            end: m.end,
            captures: m.captures,
        });

        let (close, end_last) = match stack.top() {
            Some(frame) => self.match_terminator(line, pos, frame),
            None => (None, false),
        };

        match (child, close) {
            (None, None) => None,
            (Some(c), None) => Some(c),
            (None, Some(e)) => Some(e),
            (Some(c), Some(e)) => {
                if c.start < e.start || (c.start == e.start && end_last) {
                    Some(c)
                } else {
                    Some(e)
                }
            }
        }
    }

    fn match_terminator(
        &mut self,
        line: &str,
        pos: usize,
        frame: &Frame,
    ) -> (Option<Found>, bool) {
        let (source, end_last) = {
            let Pattern::Span {
                terminator,
                end_last,
                ..
            } = self.grammar.pattern(frame.pattern)
            else {
                return (None, false);
            };
            // While spans only close at line start, handled before the scan.
            let Terminator::End(source) = terminator else {
                return (None, false);
            };
            (
                frame
                    .resolved_end
                    .as_deref()
                    .unwrap_or(source.as_str())
                    .to_string(),
                *end_last,
            )
        };

        let scanner = self.terminator_scanner(&source);
        // Budget exhaustion means no end match on this line.
        let found = scanner
            .match_pattern(0, line, pos)
            .ok()
            .flatten()
            .map(|m| Found {
                action: FoundAction::Close,
                start: m.start,
                end: m.end,
                captures: m.captures,
            });
        (found, end_last)
    }

    fn candidate_set(&mut self, key: Option<PatternId>) -> Rc<CandidateSet<F::Scanner>> {
        if let Some(set) = self.candidates.get(&key) {
            return Rc::clone(set);
        }

        let ids: Vec<PatternId> = match key {
            None => self.grammar.root().to_vec(),
            Some(id) => match self.grammar.pattern(id) {
                Pattern::Span { children, .. } => children.clone(),
                _ => Vec::new(),
            },
        };

        let mut sources = Vec::new();
        let mut actions = Vec::new();
        let mut visited = HashSet::new();
        self.collect_candidates(&ids, &mut sources, &mut actions, &mut visited);

        let set = Rc::new(CandidateSet {
            scanner: self.factory.compile(&sources, self.budget),
            actions,
        });
        self.candidates.insert(key, Rc::clone(&set));
        set
    }

    /// Flatten a pattern list into scannable candidates, walking through
    /// groups. The visited set makes cyclic include chains terminate;
    /// matches and spans are leaves here (a span's children only become
    /// candidates once it is on the stack).
    fn collect_candidates(
        &self,
        ids: &[PatternId],
        sources: &mut Vec<String>,
        actions: &mut Vec<CandidateAction>,
        visited: &mut HashSet<PatternId>,
    ) {
        for &id in ids {
            match self.grammar.pattern(id) {
                Pattern::Match { regex, .. } => {
                    sources.push(regex.clone());
                    actions.push(CandidateAction::Single(id));
                }
                Pattern::Span { begin, .. } => {
                    sources.push(begin.clone());
                    actions.push(CandidateAction::Begin(id));
                }
                Pattern::Group { children } => {
                    if visited.insert(id) {
                        self.collect_candidates(children, sources, actions, visited);
                    }
                }
            }
        }
    }

    fn terminator_scanner(&mut self, source: &str) -> Rc<F::Scanner> {
        if let Some(scanner) = self.terminators.get(source) {
            return Rc::clone(scanner);
        }
        let scanner = Rc::new(self.factory.compile(&[source.to_string()], self.budget));
        self.terminators.insert(source.to_string(), Rc::clone(&scanner));
        scanner
    }
}

struct CandidateSet<S> {
    scanner: S,
    actions: Vec<CandidateAction>,
}

#[derive(Debug, Clone, Copy)]
enum CandidateAction {
    Begin(PatternId),
    Single(PatternId),
}

#[derive(Debug)]
struct Found {
    action: FoundAction,
    start: usize,
    end: usize,
    captures: Vec<Option<(usize, usize)>>,
}

#[derive(Debug, Clone, Copy)]
enum FoundAction {
    Close,
    Begin(PatternId),
    Single(PatternId),
}

impl From<CandidateAction> for FoundAction {
    fn from(action: CandidateAction) -> Self {
        match action {
            CandidateAction::Begin(id) => FoundAction::Begin(id),
            CandidateAction::Single(id) => FoundAction::Single(id),
        }
    }
}

/// Builds the line's token list while guaranteeing the coverage invariant:
/// tokens are contiguous, non-overlapping, and adjacent tokens with the
/// same scope path merge into one maximal span.
#[derive(Debug, Default)]
struct TokenAccumulator {
    tokens: Vec<Token>,
    last_end: usize,
}

impl TokenAccumulator {
    /// Extend coverage to `end` under `scopes`. No-op when `end` is not
    /// past what is already covered (zero-width matches).
    fn produce(&mut self, end: usize, scopes: &[String]) {
        if end <= self.last_end {
            return;
        }
        if let Some(last) = self.tokens.last_mut() {
            if last.end == self.last_end && last.scopes == scopes {
                last.end = end;
                self.last_end = end;
                return;
            }
        }
        self.tokens.push(Token {
            start: self.last_end,
            end,
            scopes: scopes.to_vec(),
        });
        self.last_end = end;
    }

    fn finish(self) -> Vec<Token> {
        self.tokens
    }
}

/// Emit the matched region `[found.start, found.end)`, split into
/// sub-tokens where capture groups carry their own scopes. Groups are
/// processed in index order with a small stack so nested captures
/// concatenate scopes; group 0 scopes the whole match.
fn emit_with_captures(
    acc: &mut TokenAccumulator,
    found: &Found,
    captures: &CaptureMap,
    base: &[String],
) {
    if found.end <= found.start {
        return;
    }
    if captures.is_empty() {
        acc.produce(found.end, base);
        return;
    }

    let mut nested: Vec<(Vec<String>, usize)> = Vec::new();
    for (&group, scope) in captures {
        let Some(Some((start, end))) = found.captures.get(group).copied() else {
            continue;
        };
        let start = start.max(found.start);
        let end = end.min(found.end);
        if start >= end {
            continue;
        }

        // Close capture scopes that ended before this one starts.
        loop {
            let Some((scopes, open_end)) = nested.last() else {
                break;
            };
            if *open_end > start {
                break;
            }
            acc.produce(*open_end, scopes);
            nested.pop();
        }

        match nested.last() {
            Some((scopes, _)) => acc.produce(start, scopes),
            None => acc.produce(start, base),
        }

        let mut scopes = nested
            .last()
            .map(|(scopes, _)| scopes.clone())
            .unwrap_or_else(|| base.to_vec());
        scopes.push(scope.clone());
        nested.push((scopes, end));
    }

    while let Some((scopes, open_end)) = nested.pop() {
        acc.produce(open_end, &scopes);
    }
    acc.produce(found.end, base);
}

fn extend_path(base: &[String], scope: Option<&str>) -> Vec<String> {
    let mut path = base.to_vec();
    if let Some(scope) = scope {
        path.push(scope.to_string());
    }
    path
}

fn next_char_boundary(line: &str, pos: usize) -> usize {
    line[pos..]
        .chars()
        .next()
        .map_or(line.len(), |c| pos + c.len_utf8())
}

/// Substitute `\1`..`\9` in a terminator source with the text the begin
/// match captured, escaping regex metacharacters in the substituted text.
fn resolve_backrefs(pattern: &str, line: &str, captures: &[Option<(usize, usize)>]) -> String {
    let mut result = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some(d) if d.is_ascii_digit() && d != '0' => {
                let group = d.to_digit(10).unwrap() as usize;
                if let Some(Some((start, end))) = captures.get(group) {
                    for sub in line[*start..*end].chars() {
                        if "\\^$.|?*+()[]{}".contains(sub) {
                            result.push('\\');
                        }
                        result.push(sub);
                    }
                }
                // An unparticipating group substitutes as empty.
            }
            Some(d) => {
                result.push('\\');
                result.push(d);
            }
            None => result.push('\\'),
        }
    }
    result
}
