//! Coupon aggregation and grading report.
//!
//! A coupon is an ordered list of predictions whose combined odds are the
//! product of the leg odds, rounded to two decimals.

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Prediction, Score};

/// Decimal places kept on the combined odds.
const ODDS_DP: u32 = 2;

// ---------------------------------------------------------------------------
// Coupon
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    /// Creation stamp, `YYYYmmddHHMM` in local time.
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub legs: Vec<Prediction>,
    pub total_odds: Decimal,
}

impl Coupon {
    /// Build a coupon from its legs. Total odds are recomputed here.
    pub fn new(id: impl Into<String>, legs: Vec<Prediction>) -> Self {
        let total_odds = combined_odds(legs.iter().map(|p| p.odds));
        Self {
            id: id.into(),
            created_at: Utc::now(),
            legs,
            total_odds,
        }
    }

    /// Coupon id stamped with `now` on the bot's local clock.
    pub fn next_id(now: DateTime<Utc>, offset: FixedOffset) -> String {
        now.with_timezone(&offset).format("%Y%m%d%H%M").to_string()
    }

    /// Latest kickoff among the legs.
    pub fn last_kickoff(&self) -> Option<DateTime<Utc>> {
        self.legs.iter().map(|p| p.fixture.kickoff).max()
    }
}

impl fmt::Display for Coupon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "coupon {} ({} legs @ {})",
            self.id,
            self.legs.len(),
            self.total_odds,
        )
    }
}

/// Product of the given odds, rounded half away from zero to 2 dp.
///
/// The result always carries two decimals, so it prints as `1.00`, `3.00`.
pub fn combined_odds(odds: impl IntoIterator<Item = Decimal>) -> Decimal {
    let mut total = odds
        .into_iter()
        .fold(Decimal::ONE, |acc, o| acc * o)
        .round_dp_with_strategy(ODDS_DP, RoundingStrategy::MidpointAwayFromZero);
    total.rescale(ODDS_DP);
    total
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// A graded leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegResult {
    pub prediction: Prediction,
    pub score: Score,
    pub won: bool,
}

/// Outcome of a fully finished coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponReport {
    pub coupon_id: String,
    pub legs: Vec<LegResult>,
    pub total_odds: Decimal,
}

impl CouponReport {
    /// A coupon wins only when every leg wins.
    pub fn is_winner(&self) -> bool {
        !self.legs.is_empty() && self.legs.iter().all(|l| l.won)
    }

    pub fn legs_won(&self) -> usize {
        self.legs.iter().filter(|l| l.won).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Match, MarketKind};
    use rust_decimal_macros::dec;

    fn leg(id: &str, odds: Decimal) -> Prediction {
        Prediction {
            fixture: Match::sample(id),
            market: MarketKind::DoubleChance,
            outcome: "1X".into(),
            odds,
            confidence: 60,
            rule: "double_chance_home".into(),
        }
    }

    #[test]
    fn test_total_odds_is_rounded_product() {
        let c = Coupon::new("1", vec![leg("a", dec!(1.35)), leg("b", dec!(1.47)), leg("c", dec!(1.62))]);
        // 1.35 * 1.47 * 1.62 = 3.214890
        assert_eq!(c.total_odds, dec!(3.21));
    }

    #[test]
    fn test_rounding_midpoint_goes_up() {
        // 1.5 * 1.25 = 1.875 -> 1.88
        assert_eq!(combined_odds([dec!(1.5), dec!(1.25)]), dec!(1.88));
    }

    #[test]
    fn test_empty_coupon_odds_is_one() {
        let c = Coupon::new("empty", Vec::new());
        assert!(c.legs.is_empty());
        assert_eq!(c.total_odds.to_string(), "1.00");
        assert!(c.last_kickoff().is_none());
    }

    #[test]
    fn test_total_odds_always_two_decimals() {
        assert_eq!(combined_odds([dec!(2), dec!(1.5)]).to_string(), "3.00");
        assert_eq!(combined_odds([dec!(1.25), dec!(1.2)]).to_string(), "1.50");
    }

    #[test]
    fn test_next_id_uses_bot_offset() {
        use chrono::TimeZone;
        // 23:30 UTC on the 19th is 00:30 on the 20th at UTC+1.
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 23, 30, 0).unwrap();
        let plus1 = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(Coupon::next_id(now, plus1), "202610200030");
        assert_eq!(Coupon::next_id(now, FixedOffset::east_opt(0).unwrap()), "202610192330");
    }

    #[test]
    fn test_report_winner_requires_all_legs() {
        let score = Score { home: 1, away: 0 };
        let mut report = CouponReport {
            coupon_id: "1".into(),
            legs: vec![
                LegResult { prediction: leg("a", dec!(1.3)), score, won: true },
                LegResult { prediction: leg("b", dec!(1.4)), score, won: false },
            ],
            total_odds: dec!(1.82),
        };
        assert!(!report.is_winner());
        assert_eq!(report.legs_won(), 1);

        report.legs[1].won = true;
        assert!(report.is_winner());
    }

    #[test]
    fn test_empty_report_is_not_winner() {
        let report = CouponReport { coupon_id: "x".into(), legs: Vec::new(), total_odds: dec!(1) };
        assert!(!report.is_winner());
    }
}
