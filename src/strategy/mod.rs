//! Prediction selection: rule priority list and de-duplication across
//! the legs of a coupon.

pub mod markets;
pub mod rules;

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::types::{Match, MarketSnapshot, Prediction};
use rules::{Candidate, RuleBook};

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Picks one prediction per match, avoiding repeated labels on a coupon.
///
/// Instantiate once per coupon; feed matches in leg order with `pick`.
pub struct PredictionSelector {
    book: RuleBook,
    used_labels: HashSet<String>,
}

impl PredictionSelector {
    pub fn new(book: RuleBook) -> Self {
        Self {
            book,
            used_labels: HashSet::new(),
        }
    }

    /// Choose a prediction for `fixture` given its odds snapshot.
    ///
    /// Takes the highest-priority candidate whose label is not already on
    /// the coupon; if every candidate label is taken, falls back to the
    /// highest-priority candidate. Returns `None` when no rule fires.
    pub fn pick(&mut self, fixture: &Match, snapshot: &MarketSnapshot) -> Option<Prediction> {
        let candidates = self.book.candidates(snapshot, fixture.league_category);

        let Some(first) = candidates.first() else {
            warn!(match_id = %fixture.id, fixture = %fixture, "No rule matched, skipping match");
            return None;
        };

        let chosen = match candidates.iter().find(|c| !self.used_labels.contains(&c.label())) {
            Some(c) => c,
            None => {
                debug!(
                    match_id = %fixture.id,
                    label = %first.label(),
                    "All candidate labels already used, reusing top candidate"
                );
                first
            }
        };

        self.used_labels.insert(chosen.label());
        let prediction = to_prediction(fixture, chosen);
        info!(
            match_id = %fixture.id,
            rule = chosen.rule,
            label = %prediction.label(),
            odds = %prediction.odds,
            confidence = prediction.confidence,
            alternatives = candidates.len() - 1,
            "Prediction selected"
        );
        Some(prediction)
    }

    /// Run `pick` over every (match, snapshot) pair in order.
    pub fn pick_all(&mut self, legs: &[(Match, MarketSnapshot)]) -> Vec<Prediction> {
        legs.iter()
            .filter_map(|(fixture, snapshot)| self.pick(fixture, snapshot))
            .collect()
    }
}

impl Default for PredictionSelector {
    fn default() -> Self {
        Self::new(RuleBook::default())
    }
}

fn to_prediction(fixture: &Match, candidate: &Candidate) -> Prediction {
    Prediction {
        fixture: fixture.clone(),
        market: candidate.market,
        outcome: candidate.outcome.clone(),
        odds: candidate.odds,
        confidence: candidate.confidence,
        rule: candidate.rule.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LeagueCategory, MarketKind};
    use rust_decimal_macros::dec;

    fn favourite_snapshot() -> MarketSnapshot {
        MarketSnapshot::new()
            .with_market(MarketKind::DoubleChance, &[("1X", dec!(1.30)), ("X2", dec!(2.60))])
            .with_market(MarketKind::TotalGoals, &[("Under 3.5", dec!(1.40))])
    }

    #[test]
    fn test_pick_takes_top_priority() {
        let mut sel = PredictionSelector::default();
        let p = sel.pick(&Match::sample("1"), &favourite_snapshot()).unwrap();
        assert_eq!(p.rule, "double_chance_home");
        assert_eq!(p.label(), "Double Chance - 1X");
        assert_eq!(p.odds, dec!(1.30));
    }

    #[test]
    fn test_pick_skips_used_label() {
        let mut sel = PredictionSelector::default();
        let a = sel.pick(&Match::sample("1"), &favourite_snapshot()).unwrap();
        let b = sel.pick(&Match::sample("2"), &favourite_snapshot()).unwrap();
        assert_eq!(a.rule, "double_chance_home");
        assert_eq!(b.rule, "under_3_5");
    }

    #[test]
    fn test_pick_reuses_label_without_alternative() {
        let only_dc = MarketSnapshot::new()
            .with_market(MarketKind::DoubleChance, &[("1X", dec!(1.30))]);
        let mut sel = PredictionSelector::default();
        let a = sel.pick(&Match::sample("1"), &only_dc).unwrap();
        let b = sel.pick(&Match::sample("2"), &only_dc).unwrap();
        assert_eq!(a.label(), b.label());
    }

    #[test]
    fn test_new_selector_starts_without_used_labels() {
        let mut first = PredictionSelector::default();
        first.pick(&Match::sample("1"), &favourite_snapshot());
        let mut next = PredictionSelector::default();
        let p = next.pick(&Match::sample("2"), &favourite_snapshot()).unwrap();
        assert_eq!(p.rule, "double_chance_home");
    }

    #[test]
    fn test_pick_none_without_candidates() {
        let mut sel = PredictionSelector::default();
        assert!(sel.pick(&Match::sample("1"), &MarketSnapshot::new()).is_none());
    }

    #[test]
    fn test_pick_all_uses_league_category() {
        let mut attacking = Match::sample("2");
        attacking.league_category = LeagueCategory::Attacking;
        let snap = MarketSnapshot::new()
            .with_market(MarketKind::DoubleChance, &[("1X", dec!(1.30))])
            .with_market(MarketKind::TotalGoals, &[("Over 2.5", dec!(1.70))]);

        let mut sel = PredictionSelector::default();
        let picks = sel.pick_all(&[
            (Match::sample("1"), snap.clone()),
            (attacking, snap.clone()),
            (Match::sample("3"), MarketSnapshot::new()),
        ]);
        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0].rule, "double_chance_home");
        assert_eq!(picks[1].rule, "over_2_5");
    }
}
