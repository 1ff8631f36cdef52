//! Oniguruma scanner backend
//!
//! Wraps the `onig` crate for grammars that rely on Oniguruma syntax
//! (look-ahead/behind, named groups, back-references). Oniguruma
//! backtracks, so the [`MatchBudget`] is real here: it maps onto the
//! engine's retry limit and exhaustion surfaces as
//! [`ScanError::BudgetExceeded`].
//!
//! Behind the `oniguruma` cargo feature because the crate compiles C.

use crate::scanning::{MatchBudget, PatternScanner, ScanError, ScanMatch, ScannerFactory};
use onig::{MatchParam, Region, Regex, SearchOptions};

/// Factory for [`OnigScanner`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnigFactory;

/// A candidate list compiled with Oniguruma.
pub struct OnigScanner {
    slots: Vec<Option<Regex>>,
    budget: MatchBudget,
}

impl ScannerFactory for OnigFactory {
    type Scanner = OnigScanner;

    fn compile(&self, patterns: &[String], budget: MatchBudget) -> OnigScanner {
        let slots = patterns
            .iter()
            .map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(_error) => {
                    #[cfg(feature = "debug")]
                    log::debug!("pattern {:?} rejected by oniguruma: {}", pattern, _error);
                    None
                }
            })
            .collect();
        OnigScanner { slots, budget }
    }
}

impl PatternScanner for OnigScanner {
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

        let mut region = Region::new();
        let mut param = MatchParam::default();
        if let Some(limit) = self.budget.limit() {
            param.set_retry_limit_in_match(limit);
        }

        let searched = regex.search_with_param(
            line,
            offset,
            line.len(),
            SearchOptions::SEARCH_OPTION_NONE,
            Some(&mut region),
            param,
        );

        match searched {
            Ok(Some(_)) => {
                let Some((start, end)) = region.pos(0) else {
                    return Ok(None);
                };
                let captures = (0..region.len()).map(|group| region.pos(group)).collect();
                Ok(Some(ScanMatch {
                    index,
                    start,
                    end,
                    captures,
                }))
            }
            Ok(None) => Ok(None),
            // Oniguruma reports retry-limit exhaustion as a search error.
            Err(_) => Err(ScanError::BudgetExceeded { pattern: index }),
        }
    }
}
