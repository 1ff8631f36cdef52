//! # scopeline
//!
//! A grammar-driven line tokenizer for TextMate-style grammars.
//!
//! A grammar (JSON or YAML) compiles once into an immutable
//! [`Grammar`](grammar::Grammar); a [`Tokenizer`](tokenizing::Tokenizer)
//! then turns one line of text at a time into scoped tokens, threading a
//! persistent [`RuleStack`](stack::RuleStack) from each line into the next
//! so multi-line constructs (block comments, strings, quote blocks)
//! resume correctly.
//!
//! Module layout follows the data flow:
//!
//! src/
//!   ├── grammar      raw grammar text -> compiled pattern arena
//!   ├── scanning     the regex-engine boundary (default + oniguruma backends)
//!   ├── stack        the persistent rule stack carried across lines
//!   ├── tokenizing   the line tokenizer and token types
//!   ├── registry     grammar sources, caching, the editor session surface
//!   └── config       settings layered over embedded defaults
//!
//! For testing guidelines, see the [testing module](testing): tests pull
//! shared, verified grammar fixtures rather than inlining grammar text.

pub mod config;
pub mod grammar;
pub mod registry;
pub mod scanning;
pub mod stack;
pub mod testing;
pub mod tokenizing;
