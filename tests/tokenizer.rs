//! Integration tests for the line tokenizer.
//!
//! Grammars come from the verified fixtures in `scopeline::testing`; each
//! test threads rule stacks across lines exactly the way an editor
//! integration would.

use rstest::rstest;
use scopeline::stack::RuleStack;
use scopeline::testing::fixtures;
use scopeline::tokenizing::{LineTokens, Token, Tokenizer};

fn tokenizer(source: &str) -> Tokenizer {
    Tokenizer::new(fixtures::grammar(source))
}

fn scopes(token: &Token) -> Vec<&str> {
    token.scopes.iter().map(|s| s.as_str()).collect()
}

/// Every token list must be contiguous, non-overlapping and cover the
/// whole line.
fn assert_coverage(line: &str, result: &LineTokens) {
    let mut expected_start = 0;
    for token in &result.tokens {
        assert_eq!(token.start, expected_start, "tokens must be contiguous");
        assert!(token.end > token.start, "tokens must not be empty");
        expected_start = token.end;
    }
    assert_eq!(expected_start, line.len(), "tokens must cover the line");
}

#[test]
fn test_keyword_match_splits_line() {
    // Scenario A: `int` is a keyword, the remainder is unscoped.
    let mut tokenizer = tokenizer(fixtures::KEYWORD);
    let result = tokenizer.tokenize_line("int x;", &RuleStack::empty());

    assert_coverage("int x;", &result);
    assert_eq!(result.tokens.len(), 2);
    assert_eq!(result.tokens[0].text("int x;"), "int");
    assert_eq!(scopes(&result.tokens[0]), ["keyword"]);
    assert_eq!(result.tokens[1].text("int x;"), " x;");
    assert!(result.tokens[1].scopes.is_empty());
    assert!(result.end_stack.is_empty());
}

#[test]
fn test_unmatched_line_is_one_unscoped_token() {
    let mut tokenizer = tokenizer(fixtures::KEYWORD);
    let result = tokenizer.tokenize_line("nothing here", &RuleStack::empty());

    assert_coverage("nothing here", &result);
    assert_eq!(result.tokens.len(), 1);
    assert!(result.tokens[0].scopes.is_empty());
    assert!(result.end_stack.is_empty());
}

#[test]
fn test_block_comment_spans_two_lines() {
    // Scenario B: the span opens on line 1 and closes on line 2; the
    // closing delimiter is still inside the comment scope.
    let mut tokenizer = tokenizer(fixtures::BLOCK_COMMENT);

    let line1 = tokenizer.tokenize_line("/* start", &RuleStack::empty());
    assert_coverage("/* start", &line1);
    assert_eq!(line1.end_stack.depth(), 1);
    assert_eq!(line1.tokens.len(), 1);
    assert_eq!(scopes(&line1.tokens[0]), ["comment"]);

    let line2 = tokenizer.tokenize_line("end */ tail", &line1.end_stack);
    assert_coverage("end */ tail", &line2);
    assert!(line2.end_stack.is_empty());
    assert_eq!(line2.tokens.len(), 2);
    assert_eq!(line2.tokens[0].text("end */ tail"), "end */");
    assert_eq!(scopes(&line2.tokens[0]), ["comment"]);
    assert!(line2.tokens[1].scopes.is_empty());
}

#[rstest]
#[case("end */")]
#[case("*/")]
#[case("middle */ and int after")]
fn test_block_comment_close_variants(#[case] line2: &str) {
    let mut tokenizer = tokenizer(fixtures::BLOCK_COMMENT);
    let opened = tokenizer.tokenize_line("/* open", &RuleStack::empty());

    let closed = tokenizer.tokenize_line(line2, &opened.end_stack);
    assert_coverage(line2, &closed);
    assert!(closed.end_stack.is_empty());
    // Everything up to and including `*/` is comment-scoped.
    let close_end = line2.find("*/").unwrap() + 2;
    for token in &closed.tokens {
        if token.end <= close_end {
            assert_eq!(scopes(token), ["comment"]);
        }
    }
}

#[test]
fn test_comment_still_open_at_eof_keeps_frame() {
    let mut tokenizer = tokenizer(fixtures::BLOCK_COMMENT);
    let first = tokenizer.tokenize_line("/* one", &RuleStack::empty());
    let second = tokenizer.tokenize_line("two", &first.end_stack);
    let third = tokenizer.tokenize_line("three", &second.end_stack);

    assert_eq!(third.end_stack.depth(), 1);
    assert_eq!(scopes(&third.tokens[0]), ["comment"]);
}

#[test]
fn test_ambiguous_patterns_resolve_by_list_order() {
    // Scenario C: both rules match `foo` at offset 0; the first wins.
    let mut tokenizer = tokenizer(fixtures::AMBIGUOUS_PAIR);
    let result = tokenizer.tokenize_line("foobar", &RuleStack::empty());

    assert_coverage("foobar", &result);
    assert_eq!(scopes(&result.tokens[0]), ["first"]);
    assert_eq!(result.tokens[0].text("foobar"), "foo");
}

#[test]
fn test_empty_line_with_open_span() {
    // Scenario D: zero tokens, stack unchanged.
    let mut tokenizer = tokenizer(fixtures::BLOCK_COMMENT);
    let opened = tokenizer.tokenize_line("/* open", &RuleStack::empty());

    let empty = tokenizer.tokenize_line("", &opened.end_stack);
    assert!(empty.tokens.is_empty());
    assert_eq!(empty.end_stack, opened.end_stack);
}

#[test]
fn test_empty_line_with_empty_stack() {
    let mut tokenizer = tokenizer(fixtures::KEYWORD);
    let result = tokenizer.tokenize_line("", &RuleStack::empty());
    assert!(result.tokens.is_empty());
    assert!(result.end_stack.is_empty());
}

#[test]
fn test_capture_groups_split_into_sub_tokens() {
    let mut tokenizer = tokenizer(fixtures::CAPTURES);
    let line = "x=1;";
    let result = tokenizer.tokenize_line(line, &RuleStack::empty());

    assert_coverage(line, &result);
    assert_eq!(result.tokens.len(), 4);
    assert_eq!(scopes(&result.tokens[0]), ["meta.assignment", "variable"]);
    assert_eq!(scopes(&result.tokens[1]), ["meta.assignment", "operator"]);
    assert_eq!(scopes(&result.tokens[2]), ["meta.assignment", "value"]);
    assert!(result.tokens[3].scopes.is_empty());
}

#[test]
fn test_span_children_match_before_end() {
    let mut tokenizer = tokenizer(fixtures::C_LIKE);
    let line = "/* TODO x */ int y;";
    let result = tokenizer.tokenize_line(line, &RuleStack::empty());

    assert_coverage(line, &result);
    let todo = result
        .tokens
        .iter()
        .find(|t| t.text(line) == "TODO")
        .expect("TODO must be its own token");
    assert_eq!(scopes(todo), ["comment.block", "keyword.todo"]);

    let int = result
        .tokens
        .iter()
        .find(|t| t.text(line) == "int")
        .expect("int must be its own token");
    assert_eq!(scopes(int), ["keyword.control"]);
    assert!(result.end_stack.is_empty());
}

#[test]
fn test_string_escape_child() {
    let mut tokenizer = tokenizer(fixtures::C_LIKE);
    let line = "\"a\\\"b\" x";
    let result = tokenizer.tokenize_line(line, &RuleStack::empty());

    assert_coverage(line, &result);
    let escape = result
        .tokens
        .iter()
        .find(|t| t.text(line) == "\\\"")
        .expect("the escaped quote must be its own token");
    assert_eq!(scopes(escape), ["string.quoted", "constant.escape"]);
    // The string closed at the real quote; the tail is unscoped.
    assert!(result.end_stack.is_empty());
    assert!(result.tokens.last().unwrap().scopes.is_empty());
}

#[test]
fn test_nested_spans_stack_scopes() {
    let mut tokenizer = tokenizer(fixtures::NESTED_GROUPS);
    let line = "(a(b)c)";
    let result = tokenizer.tokenize_line(line, &RuleStack::empty());

    assert_coverage(line, &result);
    assert!(result.end_stack.is_empty());

    let b = result
        .tokens
        .iter()
        .find(|t| t.text(line) == "b")
        .expect("b must be its own token");
    assert_eq!(scopes(b), ["group", "group", "word"]);

    let a = result.tokens.iter().find(|t| t.text(line) == "a").unwrap();
    assert_eq!(scopes(a), ["group", "word"]);
}

#[test]
fn test_while_span_continues_and_breaks() {
    let mut tokenizer = tokenizer(fixtures::WHILE_QUOTE);

    let first = tokenizer.tokenize_line("> hello bold", &RuleStack::empty());
    assert_eq!(first.end_stack.depth(), 1);
    let bold = first
        .tokens
        .iter()
        .find(|t| t.text("> hello bold") == "bold")
        .unwrap();
    assert_eq!(scopes(bold), ["quote", "emphasis"]);

    // The next line keeps matching the while pattern: frame survives.
    let second = tokenizer.tokenize_line("> more", &first.end_stack);
    assert_coverage("> more", &second);
    assert_eq!(second.end_stack.depth(), 1);
    assert!(second.tokens.iter().all(|t| scopes(t) == ["quote"]));

    // A line that stops matching pops the frame before scanning.
    let third = tokenizer.tokenize_line("plain text", &second.end_stack);
    assert_coverage("plain text", &third);
    assert!(third.end_stack.is_empty());
    assert!(third.tokens[0].scopes.is_empty());
}

#[test]
fn test_backref_end_pattern_matches_opening_quote() {
    let mut tokenizer = tokenizer(fixtures::BACKREF_STRING);

    // Single-quoted: only a single quote closes it.
    let opened = tokenizer.tokenize_line("'abc", &RuleStack::empty());
    assert_eq!(opened.end_stack.depth(), 1);

    let unclosed = tokenizer.tokenize_line("has \" inside", &opened.end_stack);
    assert_eq!(unclosed.end_stack.depth(), 1, "a double quote must not close it");

    let closed = tokenizer.tokenize_line("done' tail", &unclosed.end_stack);
    assert!(closed.end_stack.is_empty());
    assert_eq!(closed.tokens[0].text("done' tail"), "done'");
    assert_eq!(scopes(&closed.tokens[0]), ["string.quoted"]);
}

#[test]
fn test_empty_span_closes_immediately() {
    let mut tokenizer = tokenizer(fixtures::EMPTY_SPAN);
    let line = "<x>";
    let result = tokenizer.tokenize_line(line, &RuleStack::empty());

    assert_coverage(line, &result);
    assert!(result.end_stack.is_empty());
    // The begin token appears exactly once.
    assert_eq!(result.tokens[0].text(line), "<");
    assert_eq!(scopes(&result.tokens[0]), ["angle"]);
    assert!(result.tokens[1].scopes.is_empty());
}

#[test]
fn test_zero_width_matches_terminate() {
    let mut tokenizer = tokenizer(fixtures::ZERO_WIDTH);
    let line = "abc";
    let result = tokenizer.tokenize_line(line, &RuleStack::empty());

    assert_coverage(line, &result);
    assert!(result.end_stack.is_empty());
}

#[test]
fn test_zero_width_matches_terminate_on_multibyte_text() {
    let mut tokenizer = tokenizer(fixtures::ZERO_WIDTH);
    let line = "a\u{2192}b";
    let result = tokenizer.tokenize_line(line, &RuleStack::empty());

    assert_coverage(line, &result);
}

#[test]
fn test_depth_cap_stops_pushing_frames() {
    let mut tokenizer =
        Tokenizer::new(fixtures::grammar(fixtures::NESTED_GROUPS)).with_max_depth(2);
    let result = tokenizer.tokenize_line("((((", &RuleStack::empty());

    assert_coverage("((((", &result);
    assert_eq!(result.end_stack.depth(), 2);
}

#[test]
fn test_stack_conservation_on_balanced_line() {
    let mut tokenizer = tokenizer(fixtures::C_LIKE);
    let initial = RuleStack::empty();
    let result = tokenizer.tokenize_line("int x; /* done */ \"s\"", &initial);

    assert_eq!(result.end_stack, initial);
}

#[test]
fn test_determinism_same_input_same_output() {
    let mut tokenizer = tokenizer(fixtures::C_LIKE);
    let initial = RuleStack::empty();
    let line = "/* TODO */ int \"str\" y";

    let first = tokenizer.tokenize_line(line, &initial);
    let second = tokenizer.tokenize_line(line, &initial);

    assert_eq!(first.tokens, second.tokens);
    assert_eq!(first.end_stack, second.end_stack);
}

#[test]
fn test_initial_stack_is_reusable_after_tokenizing() {
    // Persistence: tokenizing must not disturb a stack the caller kept.
    let mut tokenizer = tokenizer(fixtures::BLOCK_COMMENT);
    let opened = tokenizer.tokenize_line("/* open", &RuleStack::empty());
    let snapshot = opened.end_stack.clone();

    // Close the comment from the snapshot twice; both runs agree.
    let once = tokenizer.tokenize_line("a */", &snapshot);
    let twice = tokenizer.tokenize_line("a */", &snapshot);

    assert_eq!(snapshot.depth(), 1);
    assert_eq!(once.tokens, twice.tokens);
    assert!(once.end_stack.is_empty());
}

#[test]
fn test_cyclic_repository_tokenizes_and_terminates() {
    let mut tokenizer = tokenizer(fixtures::CYCLIC_REPOSITORY);
    let result = tokenizer.tokenize_line("xy", &RuleStack::empty());

    assert_coverage("xy", &result);
    assert_eq!(scopes(&result.tokens[0]), ["letter"]);
    assert!(result.tokens[1].scopes.is_empty());
}

#[test]
fn test_external_include_never_matches() {
    let mut tokenizer = tokenizer(fixtures::EXTERNAL_INCLUDE);
    let result = tokenizer.tokenize_line("x y", &RuleStack::empty());

    assert_coverage("x y", &result);
    assert_eq!(scopes(&result.tokens[0]), ["letter"]);
}
