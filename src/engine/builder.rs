//! Coupon construction.
//!
//! Fetches the odds of each selected match, runs the prediction selector
//! and aggregates the picks into a coupon.

use tracing::{info, warn};

use crate::coupon::Coupon;
use crate::provider::OddsProvider;
use crate::strategy::rules::RuleBook;
use crate::strategy::PredictionSelector;
use crate::types::{MarketSnapshot, Match};

pub struct CouponBuilder<'a> {
    provider: &'a dyn OddsProvider,
    book: RuleBook,
}

impl<'a> CouponBuilder<'a> {
    pub fn new(provider: &'a dyn OddsProvider, book: RuleBook) -> Self {
        Self { provider, book }
    }

    /// Odds snapshots for `matches`; matches without usable odds are dropped.
    pub async fn snapshots(&self, matches: &[Match]) -> Vec<(Match, MarketSnapshot)> {
        let mut out = Vec::with_capacity(matches.len());
        for m in matches {
            match self.provider.match_markets(&m.id).await {
                Ok(snapshot) if snapshot.is_empty() => {
                    warn!(match_id = %m.id, fixture = %m, "No odds listed, skipping match");
                }
                Ok(snapshot) => out.push((m.clone(), snapshot)),
                Err(e) => {
                    warn!(match_id = %m.id, fixture = %m, error = %e, "Odds unavailable, skipping match");
                }
            }
        }
        out
    }

    /// Build a coupon from `matches`. Returns `None` when no leg survives.
    pub async fn build(&self, id: String, matches: &[Match]) -> Option<Coupon> {
        let snapshots = self.snapshots(matches).await;
        let mut selector = PredictionSelector::new(self.book.clone());
        let legs = selector.pick_all(&snapshots);

        if legs.is_empty() {
            warn!(matches = matches.len(), "No prediction could be made for any match");
            return None;
        }

        let coupon = Coupon::new(id, legs);
        info!(
            coupon_id = %coupon.id,
            legs = coupon.legs.len(),
            dropped = matches.len() - coupon.legs.len(),
            total_odds = %coupon.total_odds,
            "Coupon built"
        );
        Some(coupon)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
