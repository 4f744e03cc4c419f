//! One daily cycle: scan → select → build → publish → verify → report.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use super::builder::CouponBuilder;
use super::scanner::{select_matches, KickoffWindow, MatchScanner};
use super::verifier::{check_coupon, CheckPlan};
use crate::config::AppConfig;
use crate::coupon::{Coupon, CouponReport};
use crate::notify::format::{coupon_message, report_message};
use crate::notify::Notifier;
use crate::provider::OddsProvider;
use crate::schedule::wait_until;
use crate::storage::CouponStore;
use crate::strategy::rules::RuleBook;

/// Runs cycles against a provider and a notifier.
pub struct CycleRunner {
    cfg: AppConfig,
    offset: FixedOffset,
    provider: Arc<dyn OddsProvider>,
    notifier: Arc<dyn Notifier>,
    book: RuleBook,
    store: CouponStore,
}

impl CycleRunner {
    pub fn new(
        cfg: AppConfig,
        provider: Arc<dyn OddsProvider>,
        notifier: Arc<dyn Notifier>,
        book: RuleBook,
    ) -> Result<Self> {
        let offset = cfg.utc_offset()?;
        let store = CouponStore::new(&cfg.storage.pending_coupon_path);
        Ok(Self { cfg, offset, provider, notifier, book, store })
    }

    /// Publish a coupon and wait for its results.
    pub async fn run(&self) -> Result<Option<CouponReport>> {
        match self.publish(Utc::now()).await? {
            Some(coupon) => self.await_results(&coupon).await,
            None => Ok(None),
        }
    }

    /// Scan, pick, send and persist a new coupon.
    ///
    /// Returns `None` when no match or no prediction was found; nothing is
    /// sent in that case.
    pub async fn publish(&self, now: DateTime<Utc>) -> Result<Option<Coupon>> {
        let window = KickoffWindow::upcoming(
            now,
            self.offset,
            self.cfg.window.start_hour,
            self.cfg.window.end_hour,
        );

        let scanner = MatchScanner::new(
            self.provider.as_ref(),
            &self.cfg.leagues,
            self.cfg.api.league_pause(),
        );
        let found = scanner.scan(&window).await;
        if found.is_empty() {
            warn!("No match found in the kickoff window, nothing to publish");
            return Ok(None);
        }

        let selected = select_matches(
            found,
            self.cfg.coupon.min_legs,
            self.cfg.coupon.max_legs,
            &mut rand::thread_rng(),
        );

        let builder = CouponBuilder::new(self.provider.as_ref(), self.book.clone());
        let Some(coupon) = builder.build(Coupon::next_id(now, self.offset), &selected).await else {
            return Ok(None);
        };

        self.notifier
            .send(&coupon_message(&coupon, now, self.offset))
            .await
            .context("Failed to publish coupon")?;
        self.store.save(&coupon)?;

        info!(coupon = %coupon, "Coupon published");
        Ok(Some(coupon))
    }

    /// Single verification pass. Sends the report and clears the pending
    /// coupon file once every leg is finished.
    pub async fn verify_once(&self, coupon: &Coupon) -> Result<Option<CouponReport>> {
        let Some(report) = check_coupon(self.provider.as_ref(), coupon).await else {
            return Ok(None);
        };

        self.notifier
            .send(&report_message(&report, Utc::now(), self.offset))
            .await
            .context("Failed to publish results")?;
        self.store.clear()?;

        info!(
            coupon_id = %report.coupon_id,
            won = report.is_winner(),
            "Results published"
        );
        Ok(Some(report))
    }

    /// Wait for the planned first check, then poll until the coupon is
    /// graded or the plan gives up.
    pub async fn await_results(&self, coupon: &Coupon) -> Result<Option<CouponReport>> {
        let plan = CheckPlan::for_coupon(coupon, &self.cfg.verification);
        let wait = wait_until(Utc::now(), plan.first_check);
        info!(
            coupon_id = %coupon.id,
            first_check = %plan.first_check.format("%d/%m/%Y %H:%M UTC"),
            wait_mins = wait.as_secs() / 60,
            "Result verification scheduled"
        );
        tokio::time::sleep(wait).await;

        loop {
            if let Some(report) = self.verify_once(coupon).await? {
                return Ok(Some(report));
            }
            if Utc::now() >= plan.give_up_at {
                warn!(coupon_id = %coupon.id, "Results still incomplete, giving up on this coupon");
                self.store.clear()?;
                return Ok(None);
            }
            info!(
                coupon_id = %coupon.id,
                retry_mins = plan.interval.as_secs() / 60,
                "Rechecking results later"
            );
            tokio::time::sleep(plan.interval).await;
        }
    }

    /// Resume verification of a coupon left on disk by a previous run.
    pub async fn resume_pending(&self) -> Result<Option<CouponReport>> {
        match self.store.load()? {
            Some(coupon) => self.await_results(&coupon).await,
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
