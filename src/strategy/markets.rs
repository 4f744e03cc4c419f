//! Market filter.
//!
//! Looks up specific markets in an odds snapshot and extracts the odds of a
//! named outcome. Candidates are accepted only inside a fixed inclusive
//! odds range.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{MarketKind, MarketSnapshot};

/// Inclusive decimal-odds range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl OddsRange {
    pub const fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, odds: Decimal) -> bool {
        odds >= self.min && odds <= self.max
    }

    pub fn midpoint(&self) -> Decimal {
        (self.min + self.max) / dec!(2)
    }

    pub fn width(&self) -> Decimal {
        self.max - self.min
    }
}

impl fmt::Display for OddsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Normalise an outcome name for comparison.
fn normalise(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Odds of `outcome` in `market`, if listed and playable.
///
/// Matching is case-insensitive and ignores surrounding/repeated
/// whitespace. Odds of 1.0 or below are treated as absent (suspended or
/// placeholder lines).
pub fn odds_for(snapshot: &MarketSnapshot, market: MarketKind, outcome: &str) -> Option<Decimal> {
    let wanted = normalise(outcome);
    snapshot
        .outcomes(market.id())
        .iter()
        .find(|o| normalise(&o.name) == wanted)
        .map(|o| o.odds)
        .filter(|odds| *odds > Decimal::ONE)
}

/// Odds of `outcome` in `market`, only if they fall inside `range`.
pub fn odds_in_range(
    snapshot: &MarketSnapshot,
    market: MarketKind,
    outcome: &str,
    range: OddsRange,
) -> Option<Decimal> {
    odds_for(snapshot, market, outcome).filter(|odds| range.contains(*odds))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
