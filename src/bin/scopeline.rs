//! Command-line interface for scopeline
//! This binary tokenizes a file with a TextMate-style grammar and prints the
//! scoped tokens in one of several formats.
//!
//! Usage:
//!   scopeline `<grammar>` `<path>` [--format `<format>`] [--config `<config>`]

use clap::{Arg, Command};
use scopeline::config::Loader;
use scopeline::grammar::parse_grammar;
use scopeline::stack::RuleStack;
use scopeline::tokenizing::{Token, Tokenizer};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

fn main() {
    let matches = Command::new("scopeline")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tokenize a file with a TextMate-style grammar")
        .arg_required_else_help(true)
        .arg(
            Arg::new("grammar")
                .help("Path to the grammar file (JSON or YAML)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("path")
                .help("Path to the file to tokenize")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format: token-json, token-simple or scope-table")
                .default_value("token-json"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the built-in defaults"),
        )
        .get_matches();

    let grammar_path = matches.get_one::<String>("grammar").expect("required");
    let input_path = matches.get_one::<String>("path").expect("required");
    let format = matches.get_one::<String>("format").expect("defaulted");
    let config_path = matches.get_one::<String>("config");

    handle_tokenize_command(grammar_path, input_path, format, config_path.map(|s| s.as_str()));
}

#[derive(Serialize)]
struct LineRecord {
    line: usize,
    tokens: Vec<Token>,
}

fn handle_tokenize_command(
    grammar_path: &str,
    input_path: &str,
    format: &str,
    config_path: Option<&str>,
) {
    let mut loader = Loader::new();
    if let Some(path) = config_path {
        loader = loader.with_file(Path::new(path));
    }
    let config = loader.load().unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    let grammar_text = std::fs::read_to_string(grammar_path).unwrap_or_else(|e| {
        eprintln!("Failed reading grammar '{}': {}", grammar_path, e);
        std::process::exit(1);
    });
    let grammar = parse_grammar(&grammar_text).unwrap_or_else(|e| {
        eprintln!("Failed parsing grammar '{}': {}", grammar_path, e);
        std::process::exit(1);
    });

    let source = std::fs::read_to_string(input_path).unwrap_or_else(|e| {
        eprintln!("Failed reading '{}': {}", input_path, e);
        std::process::exit(1);
    });

    let mut tokenizer = Tokenizer::new(Arc::new(grammar))
        .with_budget(config.budget())
        .with_max_depth(config.tokenizing.max_depth);

    let mut stack = RuleStack::empty();
    let mut records = Vec::new();
    for (number, line) in source.lines().enumerate() {
        let result = tokenizer.tokenize_line(line, &stack);
        stack = result.end_stack;
        records.push((number, line, result.tokens));
    }

    match format {
        "token-json" => {
            let out: Vec<LineRecord> = records
                .into_iter()
                .map(|(line, _, tokens)| LineRecord { line, tokens })
                .collect();
            let formatted = serde_json::to_string_pretty(&out).unwrap_or_else(|e| {
                eprintln!("Error formatting tokens: {}", e);
                std::process::exit(1);
            });
            println!("{}", formatted);
        }
        "token-simple" => {
            for (number, line, tokens) in &records {
                for token in tokens {
                    let scope = token.innermost_scope().unwrap_or("-");
                    println!(
                        "{}:{}-{} {} {:?}",
                        number,
                        token.start,
                        token.end,
                        scope,
                        token.text(line)
                    );
                }
            }
        }
        "scope-table" => {
            for (_, line, tokens) in &records {
                println!("{}", line);
                for token in tokens {
                    println!("  {:?}  {}", token.text(line), token.scopes.join(" > "));
                }
            }
        }
        other => {
            eprintln!("Format '{}' not supported", other);
            eprintln!("Available formats: token-json, token-simple, scope-table");
            std::process::exit(1);
        }
    }
}
