//! Shared types for the TIPSTER bot.
//!
//! These types form the data model used across all modules.
//! Everything here is transient: values are rebuilt on every cycle,
//! except for the pending coupon which `storage` writes to disk.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// An upcoming football match as listed by the odds provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub league_name: String,
    pub league_category: LeagueCategory,
    pub kickoff: DateTime<Utc>,
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vs {} [{}] {}",
            self.home_team,
            self.away_team,
            self.league_name,
            self.kickoff.format("%d/%m/%Y %H:%M UTC"),
        )
    }
}

impl Match {
    /// Helper to build a test/sample match with sensible defaults.
    #[cfg(test)]
    pub fn sample(id: &str) -> Self {
        use chrono::TimeZone;
        Match {
            id: id.to_string(),
            home_team: "Lyon".to_string(),
            away_team: "Nantes".to_string(),
            league_name: "Ligue 1".to_string(),
            league_category: LeagueCategory::Elite,
            kickoff: Utc.with_ymd_and_hms(2026, 10, 20, 3, 0, 0).unwrap(),
        }
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Coarse playing-style class of a league.
///
/// Used by the rule engine to reorder rules and nudge confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeagueCategory {
    /// Top-five domestic leagues.
    #[default]
    Elite,
    /// UEFA club competitions.
    Continental,
    /// Open, high-scoring leagues (MLS, J League, ...).
    Attacking,
    /// Low-scoring, cagey leagues.
    Tight,
}

impl fmt::Display for LeagueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeagueCategory::Elite => write!(f, "elite"),
            LeagueCategory::Continental => write!(f, "continental"),
            LeagueCategory::Attacking => write!(f, "attacking"),
            LeagueCategory::Tight => write!(f, "tight"),
        }
    }
}

impl std::str::FromStr for LeagueCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "elite" | "top" => Ok(LeagueCategory::Elite),
            "continental" | "uefa" => Ok(LeagueCategory::Continental),
            "attacking" | "open" => Ok(LeagueCategory::Attacking),
            "tight" | "defensive" => Ok(LeagueCategory::Tight),
            _ => Err(anyhow::anyhow!("Unknown league category: {s}")),
        }
    }
}

/// Betting markets the bot knows how to read and grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketKind {
    /// 1X2 full-time result.
    MatchResult,
    /// Asian-style handicap on either team.
    Handicap,
    /// Both teams to score.
    BothTeamsScore,
    DoubleChance,
    /// Total goals over/under.
    TotalGoals,
}

impl MarketKind {
    pub const ALL: &'static [MarketKind] = &[
        MarketKind::MatchResult,
        MarketKind::Handicap,
        MarketKind::BothTeamsScore,
        MarketKind::DoubleChance,
        MarketKind::TotalGoals,
    ];

    /// Market identifier used by the odds provider.
    pub fn id(&self) -> &'static str {
        match self {
            MarketKind::MatchResult => "1",
            MarketKind::Handicap => "2",
            MarketKind::BothTeamsScore => "9",
            MarketKind::DoubleChance => "12",
            MarketKind::TotalGoals => "17",
        }
    }

    /// Reverse lookup from a provider market identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.id() == id)
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketKind::MatchResult => write!(f, "1X2"),
            MarketKind::Handicap => write!(f, "Handicap"),
            MarketKind::BothTeamsScore => write!(f, "Both Teams To Score"),
            MarketKind::DoubleChance => write!(f, "Double Chance"),
            MarketKind::TotalGoals => write!(f, "Total"),
        }
    }
}

// ---------------------------------------------------------------------------
// Market snapshot
// ---------------------------------------------------------------------------

/// A named outcome with decimal odds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub name: String,
    pub odds: Decimal,
}

/// Odds for one match at one point in time, keyed by provider market id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    markets: HashMap<String, Vec<Outcome>>,
}

impl MarketSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add outcomes under a market id (appends if the market already exists).
    pub fn insert(&mut self, market_id: impl Into<String>, outcomes: Vec<Outcome>) {
        self.markets.entry(market_id.into()).or_default().extend(outcomes);
    }

    /// Builder-style variant of [`insert`](Self::insert) for a known market.
    pub fn with_market(mut self, kind: MarketKind, outcomes: &[(&str, Decimal)]) -> Self {
        self.insert(
            kind.id(),
            outcomes
                .iter()
                .map(|(name, odds)| Outcome { name: name.to_string(), odds: *odds })
                .collect(),
        );
        self
    }

    /// Outcomes listed under a market id.
    pub fn outcomes(&self, market_id: &str) -> &[Outcome] {
        self.markets.get(market_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.markets.values().all(Vec::is_empty)
    }

    pub fn market_count(&self) -> usize {
        self.markets.len()
    }
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

/// One leg of a coupon: a chosen outcome on a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "match")]
    pub fixture: Match,
    pub market: MarketKind,
    /// Outcome name as listed by the provider ("1X", "Over 2.5", ...).
    pub outcome: String,
    pub odds: Decimal,
    /// Ad hoc confidence score, 0–100.
    pub confidence: u8,
    /// Name of the rule that produced this pick.
    pub rule: String,
}

impl Prediction {
    /// Label used for de-duplication across legs ("Double Chance - 1X").
    pub fn label(&self) -> String {
        format!("{} - {}", self.market, self.outcome)
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vs {}: {} @ {} (conf {}%, rule {})",
            self.fixture.home_team,
            self.fixture.away_team,
            self.label(),
            self.odds,
            self.confidence,
            self.rule,
        )
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Final score of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub fn total(&self) -> u32 {
        self.home + self.away
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.home, self.away)
    }
}

/// Match state as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Not started or still in play.
    Pending,
    Finished(Score),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_market_kind_id_roundtrip() {
        for kind in MarketKind::ALL {
            assert_eq!(MarketKind::from_id(kind.id()), Some(*kind));
        }
        assert_eq!(MarketKind::from_id("999"), None);
    }

    #[test]
    fn test_league_category_from_str() {
        assert_eq!("Elite".parse::<LeagueCategory>().unwrap(), LeagueCategory::Elite);
        assert_eq!("uefa".parse::<LeagueCategory>().unwrap(), LeagueCategory::Continental);
        assert_eq!("defensive".parse::<LeagueCategory>().unwrap(), LeagueCategory::Tight);
        assert!("bogus".parse::<LeagueCategory>().is_err());
    }

    #[test]
    fn test_snapshot_insert_and_lookup() {
        let snap = MarketSnapshot::new()
            .with_market(MarketKind::DoubleChance, &[("1X", dec!(1.30)), ("X2", dec!(2.10))]);
        assert_eq!(snap.outcomes("12").len(), 2);
        assert!(snap.outcomes("17").is_empty());
        assert!(!snap.is_empty());
        assert_eq!(snap.market_count(), 1);
    }

    #[test]
    fn test_empty_snapshot() {
        let mut snap = MarketSnapshot::new();
        assert!(snap.is_empty());
        snap.insert("9", Vec::new());
        assert!(snap.is_empty());
    }

    #[test]
    fn test_prediction_label() {
        let p = Prediction {
            fixture: Match::sample("42"),
            market: MarketKind::TotalGoals,
            outcome: "Under 3.5".into(),
            odds: dec!(1.40),
            confidence: 70,
            rule: "under_3_5".into(),
        };
        assert_eq!(p.label(), "Total - Under 3.5");
        assert!(p.to_string().contains("Lyon vs Nantes"));
    }

    #[test]
    fn test_score_total_and_display() {
        let s = Score { home: 2, away: 1 };
        assert_eq!(s.total(), 3);
        assert_eq!(s.to_string(), "2 - 1");
    }
}
