//! Default scanner backend over the `regex` crate
//!
//! The `regex` engine is linear-time, so the match budget never trips; the
//! trade-off is syntax coverage. Grammars written against Oniguruma use
//! look-around and back-references this engine rejects; those patterns
//! compile to never-matching slots and the grammar degrades to coarser
//! tokens instead of failing to load. Build with the `oniguruma` feature
//! for full syntax support.

use crate::scanning::{MatchBudget, PatternScanner, ScanError, ScanMatch, ScannerFactory};
use regex::Regex;

/// Factory for [`RegexScanner`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexFactory;

/// A candidate list compiled with the `regex` crate.
#[derive(Debug)]
pub struct RegexScanner {
    slots: Vec<Option<Regex>>,
}

impl ScannerFactory for RegexFactory {
    type Scanner = RegexScanner;

    fn compile(&self, patterns: &[String], _budget: MatchBudget) -> RegexScanner {
        let slots = patterns
            .iter()
            .map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(_error) => {
                    #[cfg(feature = "debug")]
                    log::debug!("pattern {:?} rejected by regex engine: {}", pattern, _error);
                    None
                }
            })
            .collect();
        RegexScanner { slots }
    }
}

impl PatternScanner for RegexScanner {
    fn pattern_count(&self) -> usize {
        self.slots.len()
    }

    fn match_pattern(
        &self,
        index: usize,
        line: &str,
        offset: usize,
    ) -> Result<Option<ScanMatch>, ScanError> {
        let Some(regex) = self.slots.get(index).and_then(|slot| slot.as_ref()) else {
            return Ok(None);
        };
        let Some(caps) = regex.captures_at(line, offset) else {
            return Ok(None);
        };

        let full = caps.get(0).expect("group 0 always participates");
        let captures = (0..caps.len())
            .map(|group| caps.get(group).map(|m| (m.start(), m.end())))
            .collect();

        Ok(Some(ScanMatch {
            index,
            start: full.start(),
            end: full.end(),
            captures,
        }))
    }
}
