//! Match discovery and selection.
//!
//! Lists the matches of every configured league, keeps those kicking off
//! inside the target window, and draws the coupon's legs at random.

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, NaiveTime, Timelike, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::LeagueConfig;
use crate::provider::OddsProvider;
use crate::types::Match;

// ---------------------------------------------------------------------------
// Kickoff window
// ---------------------------------------------------------------------------

/// Inclusive kickoff window in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KickoffWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl KickoffWindow {
    /// Window `[start_hour, end_hour]` of today's local date, or of
    /// tomorrow's once the local clock has reached `start_hour`.
    pub fn upcoming(now: DateTime<Utc>, offset: FixedOffset, start_hour: u32, end_hour: u32) -> Self {
        let local = now.with_timezone(&offset);
        let mut date = local.date_naive();
        if local.hour() >= start_hour {
            date = date.succ_opt().unwrap_or(date);
        }

        let to_utc = |hour: u32| {
            let naive = date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN));
            (naive - ChronoDuration::seconds(offset.local_minus_utc() as i64)).and_utc()
        };

        Self {
            start: to_utc(start_hour),
            end: to_utc(end_hour),
        }
    }

    pub fn contains(&self, kickoff: DateTime<Utc>) -> bool {
        kickoff >= self.start && kickoff <= self.end
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

pub struct MatchScanner<'a> {
    provider: &'a dyn OddsProvider,
    leagues: &'a [LeagueConfig],
    /// Pause between league requests (provider rate limit).
    pause: Duration,
}

impl<'a> MatchScanner<'a> {
    pub fn new(provider: &'a dyn OddsProvider, leagues: &'a [LeagueConfig], pause: Duration) -> Self {
        Self { provider, leagues, pause }
    }

    /// All matches of all leagues kicking off inside `window`.
    ///
    /// A league that fails to load is logged and skipped.
    pub async fn scan(&self, window: &KickoffWindow) -> Vec<Match> {
        info!(
            from = %window.start.format("%d/%m/%Y %H:%M UTC"),
            to = %window.end.format("%d/%m/%Y %H:%M UTC"),
            leagues = self.leagues.len(),
            "Scanning leagues for matches"
        );

        let mut found = Vec::new();
        for (i, league) in self.leagues.iter().enumerate() {
            if i > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }

            match self.provider.league_matches(league).await {
                Ok(matches) => {
                    let before = found.len();
                    found.extend(matches.into_iter().filter(|m| window.contains(m.kickoff)));
                    debug!(league = %league.name, in_window = found.len() - before, "League scanned");
                }
                Err(e) => {
                    warn!(league = %league.name, league_id = league.id, error = %e, "League unavailable, continuing");
                }
            }
        }

        info!(count = found.len(), "Matches found in window");
        found
    }
}

/// Draw between `min_legs` and `max_legs` matches at random, sorted by kickoff.
///
/// When fewer matches exist than the drawn count, all of them are kept.
pub fn select_matches<R: Rng + ?Sized>(
    matches: Vec<Match>,
    min_legs: usize,
    max_legs: usize,
    rng: &mut R,
) -> Vec<Match> {
    if matches.is_empty() {
        return matches;
    }
    let count = rng.gen_range(min_legs..=max_legs.max(min_legs));
    let mut picked: Vec<Match> = if matches.len() <= count {
        matches
    } else {
        matches.choose_multiple(rng, count).cloned().collect()
    };
    picked.sort_by_key(|m| m.kickoff);

    for (i, m) in picked.iter().enumerate() {
        info!(leg = i + 1, match_id = %m.id, fixture = %m, "Match selected");
    }
    picked
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ApiError, MockOddsProvider};
    use crate::types::LeagueCategory;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn at(id: &str, kickoff: DateTime<Utc>) -> Match {
        let mut m = Match::sample(id);
        m.kickoff = kickoff;
        m
    }

    #[test]
    fn test_window_before_start_hour_is_today() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let w = KickoffWindow::upcoming(utc(2026, 10, 20, 0, 30), offset, 1, 7);
        assert_eq!(w.start, utc(2026, 10, 20, 1, 0));
        assert_eq!(w.end, utc(2026, 10, 20, 7, 0));
    }

    #[test]
    fn test_window_after_start_hour_moves_to_tomorrow() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let w = KickoffWindow::upcoming(utc(2026, 10, 19, 1, 0), offset, 1, 7);
        assert_eq!(w.start, utc(2026, 10, 20, 1, 0));
    }

    #[test]
    fn test_window_respects_offset() {
        // 23:30 UTC is 00:30 local at UTC+1, so the window is local 01:00–07:00 the 20th.
        let offset = FixedOffset::east_opt(3600).unwrap();
        let w = KickoffWindow::upcoming(utc(2026, 10, 19, 23, 30), offset, 1, 7);
        assert_eq!(w.start, utc(2026, 10, 20, 0, 0));
        assert_eq!(w.end, utc(2026, 10, 20, 6, 0));
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let w = KickoffWindow::upcoming(utc(2026, 10, 20, 0, 0), offset, 1, 7);
        assert!(w.contains(w.start));
        assert!(w.contains(w.end));
        assert!(!w.contains(w.end + ChronoDuration::seconds(1)));
    }

    #[test]
    fn test_select_takes_all_when_few() {
        let mut rng = StdRng::seed_from_u64(7);
        let ms = vec![at("b", utc(2026, 10, 20, 5, 0)), at("a", utc(2026, 10, 20, 2, 0))];
        let picked = select_matches(ms, 2, 3, &mut rng);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].id, "a");
    }

    #[test]
    fn test_select_count_in_bounds_and_sorted() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let ms: Vec<Match> = (0..10).map(|i| at(&i.to_string(), utc(2026, 10, 20, 1, i))).collect();
            let picked = select_matches(ms, 2, 3, &mut rng);
            assert!((2..=3).contains(&picked.len()));
            assert!(picked.windows(2).all(|w| w[0].kickoff <= w[1].kickoff));
        }
    }

    #[test]
    fn test_select_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select_matches(Vec::new(), 2, 3, &mut rng).is_empty());
    }

    #[tokio::test]
    async fn test_scan_filters_window_and_skips_failed_league() {
        let leagues = vec![
            LeagueConfig { id: 1, name: "Broken".into(), category: LeagueCategory::Elite },
            LeagueConfig { id: 2, name: "MLS".into(), category: LeagueCategory::Attacking },
        ];
        let mut provider = MockOddsProvider::new();
        provider.expect_league_matches().returning(|league| {
            if league.id == 1 {
                Err(ApiError::Unsuccessful("error".into()))
            } else {
                Ok(vec![
                    at("in", utc(2026, 10, 20, 3, 0)),
                    at("late", utc(2026, 10, 20, 9, 0)),
                ])
            }
        });

        let window = KickoffWindow::upcoming(utc(2026, 10, 20, 0, 0), FixedOffset::east_opt(0).unwrap(), 1, 7);
        let scanner = MatchScanner::new(&provider, &leagues, Duration::ZERO);
        let found = scanner.scan(&window).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "in");
    }
}
