//! Result checking.
//!
//! Polls the provider for the final score of every leg, grades each
//! prediction, and produces a report once all legs are finished.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::VerificationConfig;
use crate::coupon::{combined_odds, Coupon, CouponReport, LegResult};
use crate::provider::OddsProvider;
use crate::types::{MarketKind, MatchStatus, Prediction, Score};

// ---------------------------------------------------------------------------
// Grading
// ---------------------------------------------------------------------------

/// Goal line of a total-goals outcome ("Over 2.5" → ("over", 2.5)).
fn parse_total(outcome: &str) -> Option<(String, Decimal)> {
    let mut parts = outcome.split_whitespace();
    let side = parts.next()?.to_lowercase();
    let line = parts.next()?.parse::<Decimal>().ok()?;
    Some((side, line))
}

/// Side and handicap of a handicap outcome ("1 (+1.5)" → ("1", 1.5)).
fn parse_handicap(outcome: &str) -> Option<(String, Decimal)> {
    let (side, rest) = outcome.trim().split_once(' ')?;
    let inner = rest.trim().strip_prefix('(')?.strip_suffix(')')?;
    let line = inner.trim().trim_start_matches('+').parse::<Decimal>().ok()?;
    Some((side.to_string(), line))
}

/// Whether `prediction` won given the final `score`.
///
/// Unknown outcome labels grade as lost.
pub fn grade(prediction: &Prediction, score: Score) -> bool {
    let (home, away) = (score.home, score.away);
    let outcome = prediction.outcome.trim();

    let won = match prediction.market {
        MarketKind::MatchResult => match outcome {
            "1" => home > away,
            "X" | "x" => home == away,
            "2" => home < away,
            _ => unknown(prediction),
        },
        MarketKind::TotalGoals => match parse_total(outcome) {
            Some((side, line)) if side == "over" => Decimal::from(score.total()) > line,
            Some((side, line)) if side == "under" => Decimal::from(score.total()) < line,
            _ => unknown(prediction),
        },
        MarketKind::DoubleChance => match outcome {
            "1X" | "1x" => home >= away,
            "12" => home != away,
            "X2" | "x2" => home <= away,
            _ => unknown(prediction),
        },
        MarketKind::BothTeamsScore => match outcome.to_lowercase().as_str() {
            "yes" => home > 0 && away > 0,
            "no" => home == 0 || away == 0,
            _ => unknown(prediction),
        },
        MarketKind::Handicap => match parse_handicap(outcome) {
            Some((side, h)) if side == "1" => Decimal::from(home) + h > Decimal::from(away),
            Some((side, h)) if side == "2" => Decimal::from(away) + h > Decimal::from(home),
            _ => unknown(prediction),
        },
    };

    debug!(
        match_id = %prediction.fixture.id,
        label = %prediction.label(),
        score = %score,
        won,
        "Leg graded"
    );
    won
}

fn unknown(prediction: &Prediction) -> bool {
    warn!(label = %prediction.label(), "Cannot grade unknown outcome, counting as lost");
    false
}

// ---------------------------------------------------------------------------
// Verifier
// ---------------------------------------------------------------------------

/// When to poll for the results of a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckPlan {
    pub first_check: DateTime<Utc>,
    pub interval: std::time::Duration,
    pub give_up_at: DateTime<Utc>,
}

impl CheckPlan {
    /// First check after the last leg's estimated final whistle plus grace.
    pub fn for_coupon(coupon: &Coupon, cfg: &VerificationConfig) -> Self {
        let last = coupon.last_kickoff().unwrap_or(coupon.created_at);
        let first_check =
            last + Duration::minutes(cfg.match_duration_mins) + Duration::minutes(cfg.grace_mins);
        Self {
            first_check,
            interval: std::time::Duration::from_secs(cfg.recheck_interval_mins * 60),
            give_up_at: first_check + Duration::hours(cfg.max_wait_hours),
        }
    }
}

/// Fetch every leg's status; grade the coupon if all legs are finished.
///
/// Returns `None` while at least one leg is pending or unavailable.
pub async fn check_coupon(provider: &dyn OddsProvider, coupon: &Coupon) -> Option<CouponReport> {
    let mut legs = Vec::with_capacity(coupon.legs.len());
    let mut pending = 0usize;

    for prediction in &coupon.legs {
        match provider.match_status(&prediction.fixture.id).await {
            Ok(MatchStatus::Finished(score)) => {
                let won = grade(prediction, score);
                legs.push(LegResult { prediction: prediction.clone(), score, won });
            }
            Ok(MatchStatus::Pending) => pending += 1,
            Err(e) => {
                warn!(match_id = %prediction.fixture.id, error = %e, "Result unavailable");
                pending += 1;
            }
        }
    }

    if pending > 0 {
        info!(coupon_id = %coupon.id, pending, finished = legs.len(), "Some matches not finished yet");
        return None;
    }

    let report = CouponReport {
        coupon_id: coupon.id.clone(),
        legs,
        // Reloaded coupons lose the trailing zeros through the float encoding.
        total_odds: combined_odds([coupon.total_odds]),
    };
    info!(
        coupon_id = %report.coupon_id,
        won = report.is_winner(),
        legs_won = report.legs_won(),
        legs = report.legs.len(),
        "All matches finished"
    );
    Some(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ApiError, MockOddsProvider};
    use crate::types::Match;
    use rust_decimal_macros::dec;

    fn pred(market: MarketKind, outcome: &str) -> Prediction {
        Prediction {
            fixture: Match::sample("1"),
            market,
            outcome: outcome.into(),
            odds: dec!(1.50),
            confidence: 50,
            rule: "test".into(),
        }
    }

    fn s(home: u32, away: u32) -> Score {
        Score { home, away }
    }

    #[test]
    fn test_grade_match_result() {
        assert!(grade(&pred(MarketKind::MatchResult, "1"), s(2, 1)));
        assert!(!grade(&pred(MarketKind::MatchResult, "1"), s(1, 1)));
        assert!(grade(&pred(MarketKind::MatchResult, "X"), s(0, 0)));
        assert!(grade(&pred(MarketKind::MatchResult, "2"), s(0, 3)));
    }

    #[test]
    fn test_grade_totals() {
        assert!(grade(&pred(MarketKind::TotalGoals, "Over 2.5"), s(2, 1)));
        assert!(!grade(&pred(MarketKind::TotalGoals, "Over 2.5"), s(1, 1)));
        assert!(grade(&pred(MarketKind::TotalGoals, "Under 3.5"), s(2, 1)));
        assert!(!grade(&pred(MarketKind::TotalGoals, "Under 3.5"), s(3, 1)));
        assert!(!grade(&pred(MarketKind::TotalGoals, "Over"), s(3, 1)));
    }

    #[test]
    fn test_grade_double_chance() {
        assert!(grade(&pred(MarketKind::DoubleChance, "1X"), s(1, 1)));
        assert!(!grade(&pred(MarketKind::DoubleChance, "1X"), s(0, 1)));
        assert!(grade(&pred(MarketKind::DoubleChance, "12"), s(0, 1)));
        assert!(!grade(&pred(MarketKind::DoubleChance, "12"), s(2, 2)));
        assert!(grade(&pred(MarketKind::DoubleChance, "X2"), s(2, 2)));
    }

    #[test]
    fn test_grade_btts() {
        assert!(grade(&pred(MarketKind::BothTeamsScore, "Yes"), s(1, 2)));
        assert!(!grade(&pred(MarketKind::BothTeamsScore, "Yes"), s(0, 2)));
        assert!(grade(&pred(MarketKind::BothTeamsScore, "No"), s(0, 2)));
        assert!(!grade(&pred(MarketKind::BothTeamsScore, "No"), s(1, 1)));
    }

    #[test]
    fn test_grade_handicap() {
        assert!(grade(&pred(MarketKind::Handicap, "1 (+1.5)"), s(0, 1)));
        assert!(!grade(&pred(MarketKind::Handicap, "1 (+1.5)"), s(0, 2)));
        assert!(grade(&pred(MarketKind::Handicap, "2 (+1.5)"), s(2, 1)));
        assert!(!grade(&pred(MarketKind::Handicap, "2 (+1.5)"), s(3, 1)));
        assert!(!grade(&pred(MarketKind::Handicap, "garbage"), s(0, 0)));
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_total("Over 2.5"), Some(("over".to_string(), dec!(2.5))));
        assert_eq!(parse_handicap("2 (+1.5)"), Some(("2".to_string(), dec!(1.5))));
        assert_eq!(parse_handicap("1 (-0.5)"), Some(("1".to_string(), dec!(-0.5))));
    }

    #[test]
    fn test_check_plan() {
        let coupon = Coupon::new("c", vec![pred(MarketKind::MatchResult, "1")]);
        let plan = CheckPlan::for_coupon(&coupon, &VerificationConfig::default());
        let kickoff = coupon.legs[0].fixture.kickoff;
        assert_eq!(plan.first_check, kickoff + Duration::minutes(125));
        assert_eq!(plan.interval, std::time::Duration::from_secs(600));
        assert_eq!(plan.give_up_at, plan.first_check + Duration::hours(12));
    }

    #[tokio::test]
    async fn test_check_coupon_pending_then_finished() {
        let coupon = Coupon::new(
            "c",
            vec![pred(MarketKind::MatchResult, "1"), {
                let mut p = pred(MarketKind::BothTeamsScore, "Yes");
                p.fixture.id = "2".into();
                p
            }],
        );

        let mut pending = MockOddsProvider::new();
        pending.expect_match_status().returning(|id| match id {
            "1" => Ok(MatchStatus::Finished(Score { home: 1, away: 0 })),
            _ => Err(ApiError::Unsuccessful("error".into())),
        });
        assert!(check_coupon(&pending, &coupon).await.is_none());

        let mut done = MockOddsProvider::new();
        done.expect_match_status()
            .returning(|_| Ok(MatchStatus::Finished(Score { home: 1, away: 0 })));
        let report = check_coupon(&done, &coupon).await.unwrap();
        assert_eq!(report.legs.len(), 2);
        assert!(report.legs[0].won);
        assert!(!report.legs[1].won);
        assert!(!report.is_winner());
    }
}
