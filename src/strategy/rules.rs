//! Rule priority list.
//!
//! Each rule targets one outcome of one market and fires when the listed
//! odds sit inside its range. The league category decides the order the
//! rules are tried in and nudges the confidence score.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use tracing::debug;

use super::markets::{odds_in_range, OddsRange};
use crate::types::{LeagueCategory, MarketKind, MarketSnapshot};

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// A single selection rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub name: &'static str,
    pub market: MarketKind,
    pub outcome: &'static str,
    pub range: OddsRange,
    /// Confidence (0–100) when the odds sit exactly mid-range.
    pub base_confidence: u8,
}

/// A rule that fired on a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub rule: &'static str,
    pub market: MarketKind,
    pub outcome: String,
    pub odds: Decimal,
    pub confidence: u8,
}

impl Candidate {
    /// Same format as `Prediction::label`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.market, self.outcome)
    }
}

pub const BUILTIN_RULES: &[Rule] = &[
    Rule {
        name: "double_chance_home",
        market: MarketKind::DoubleChance,
        outcome: "1X",
        range: OddsRange::new(dec!(1.20), dec!(1.55)),
        base_confidence: 78,
    },
    Rule {
        name: "double_chance_away",
        market: MarketKind::DoubleChance,
        outcome: "X2",
        range: OddsRange::new(dec!(1.20), dec!(1.55)),
        base_confidence: 74,
    },
    Rule {
        name: "under_3_5",
        market: MarketKind::TotalGoals,
        outcome: "Under 3.5",
        range: OddsRange::new(dec!(1.25), dec!(1.60)),
        base_confidence: 72,
    },
    Rule {
        name: "over_2_5",
        market: MarketKind::TotalGoals,
        outcome: "Over 2.5",
        range: OddsRange::new(dec!(1.50), dec!(2.00)),
        base_confidence: 60,
    },
    Rule {
        name: "btts_yes",
        market: MarketKind::BothTeamsScore,
        outcome: "Yes",
        range: OddsRange::new(dec!(1.55), dec!(1.95)),
        base_confidence: 58,
    },
    Rule {
        name: "btts_no",
        market: MarketKind::BothTeamsScore,
        outcome: "No",
        range: OddsRange::new(dec!(1.55), dec!(1.95)),
        base_confidence: 56,
    },
    Rule {
        name: "home_win",
        market: MarketKind::MatchResult,
        outcome: "1",
        range: OddsRange::new(dec!(1.40), dec!(1.90)),
        base_confidence: 62,
    },
    Rule {
        name: "away_win",
        market: MarketKind::MatchResult,
        outcome: "2",
        range: OddsRange::new(dec!(1.40), dec!(1.90)),
        base_confidence: 55,
    },
    Rule {
        name: "home_handicap",
        market: MarketKind::Handicap,
        outcome: "1 (+1.5)",
        range: OddsRange::new(dec!(1.15), dec!(1.45)),
        base_confidence: 76,
    },
    Rule {
        name: "away_handicap",
        market: MarketKind::Handicap,
        outcome: "2 (+1.5)",
        range: OddsRange::new(dec!(1.15), dec!(1.45)),
        base_confidence: 73,
    },
];

/// Rule order per league category, by rule name.
fn order_for(category: LeagueCategory) -> &'static [&'static str] {
    match category {
        LeagueCategory::Elite => &[
            "double_chance_home", "under_3_5", "home_win", "btts_yes", "over_2_5",
            "double_chance_away", "home_handicap", "away_handicap", "btts_no", "away_win",
        ],
        LeagueCategory::Continental => &[
            "double_chance_home", "double_chance_away", "home_handicap", "away_handicap",
            "under_3_5", "home_win", "away_win", "btts_yes", "over_2_5", "btts_no",
        ],
        LeagueCategory::Attacking => &[
            "over_2_5", "btts_yes", "double_chance_home", "home_win", "home_handicap",
            "double_chance_away", "away_win", "away_handicap", "under_3_5", "btts_no",
        ],
        LeagueCategory::Tight => &[
            "under_3_5", "btts_no", "double_chance_home", "double_chance_away",
            "home_handicap", "away_handicap", "home_win", "away_win", "over_2_5", "btts_yes",
        ],
    }
}

/// Confidence adjustment for a rule in a league category.
fn category_bonus(category: LeagueCategory, rule: &Rule) -> i32 {
    let goals_for = matches!(rule.name, "over_2_5" | "btts_yes");
    let goals_against = matches!(rule.name, "under_3_5" | "btts_no");
    match category {
        LeagueCategory::Elite => 0,
        LeagueCategory::Continental => -4,
        LeagueCategory::Attacking if goals_for => 6,
        LeagueCategory::Attacking if goals_against => -6,
        LeagueCategory::Tight if goals_against => 6,
        LeagueCategory::Tight if goals_for => -6,
        LeagueCategory::Attacking | LeagueCategory::Tight => 0,
    }
}

/// Maximum confidence lost when the odds sit on a range boundary.
const EDGE_PENALTY: Decimal = dec!(15);

impl Rule {
    /// Fire this rule against a snapshot.
    pub fn evaluate(&self, snapshot: &MarketSnapshot, category: LeagueCategory) -> Option<Candidate> {
        let odds = odds_in_range(snapshot, self.market, self.outcome, self.range)?;
        Some(Candidate {
            rule: self.name,
            market: self.market,
            outcome: self.outcome.to_string(),
            odds,
            confidence: self.confidence(odds, category),
        })
    }

    /// Base confidence, plus category bonus, minus distance from mid-range.
    fn confidence(&self, odds: Decimal, category: LeagueCategory) -> u8 {
        let half_width = self.range.width() / dec!(2);
        let penalty = if half_width.is_zero() {
            Decimal::ZERO
        } else {
            ((odds - self.range.midpoint()).abs() / half_width) * EDGE_PENALTY
        };
        let penalty = penalty.round().to_i32().unwrap_or(0);
        let score = self.base_confidence as i32 + category_bonus(category, self) - penalty;
        score.clamp(0, 100) as u8
    }
}

// ---------------------------------------------------------------------------
// Rule book
// ---------------------------------------------------------------------------

/// An ordered set of rules.
#[derive(Debug, Clone)]
pub struct RuleBook {
    rules: Vec<Rule>,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::new(BUILTIN_RULES.to_vec())
    }
}

impl RuleBook {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Rules in the priority order of a league category.
    ///
    /// Rules the category order does not name are appended in book order.
    pub fn ordered(&self, category: LeagueCategory) -> Vec<&Rule> {
        let order = order_for(category);
        let mut ranked: Vec<&Rule> = order
            .iter()
            .filter_map(|name| self.rules.iter().find(|r| r.name == *name))
            .collect();
        ranked.extend(self.rules.iter().filter(|r| !order.contains(&r.name)));
        ranked
    }

    /// Every rule that fires on `snapshot`, in priority order.
    pub fn candidates(&self, snapshot: &MarketSnapshot, category: LeagueCategory) -> Vec<Candidate> {
        let found: Vec<Candidate> = self
            .ordered(category)
            .into_iter()
            .filter_map(|rule| rule.evaluate(snapshot, category))
            .collect();
        debug!(
            category = %category,
            markets = snapshot.market_count(),
            candidates = found.len(),
            "Rules evaluated"
        );
        found
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
