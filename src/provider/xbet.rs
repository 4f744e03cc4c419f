//! 1xBet odds feed via RapidAPI.
//!
//! API host: `1xbet-api.p.rapidapi.com` (overridable)
//! Auth: `x-rapidapi-key` / `x-rapidapi-host` headers.
//! Every payload is wrapped in `{"status": "success", "data": ...}`.
//!
//! Requests are retried a fixed number of times with a fixed delay on
//! transport errors and non-200 responses. Decode errors are not retried.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::prelude::*;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ApiError, OddsProvider};
use crate::config::LeagueConfig;
use crate::types::{MarketKind, MarketSnapshot, Match, MatchStatus, Outcome, Score};

/// Football in the provider's sport numbering.
const SPORT_ID: u32 = 1;

// ---------------------------------------------------------------------------
// API response types (1xBet JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    /// Numeric on most endpoints, string on some.
    #[serde(default)]
    id: serde_json::Value,
    #[serde(default)]
    home_team: Option<String>,
    #[serde(default)]
    away_team: Option<String>,
    #[serde(default)]
    start_timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct RawMarket {
    #[serde(default)]
    outcomes: Vec<RawOutcome>,
}

#[derive(Debug, Deserialize)]
struct RawOutcome {
    #[serde(default)]
    name: serde_json::Value,
    /// Number on most markets, quoted string on a few.
    #[serde(default)]
    odds: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawMatchDetail {
    #[serde(default)]
    status: String,
    #[serde(default)]
    score_home: serde_json::Value,
    #[serde(default)]
    score_away: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Unwrap the envelope, requiring `status == "success"`.
fn unwrap_envelope<T: DeserializeOwned + Default>(body: &str) -> Result<T, ApiError> {
    let env: Envelope<T> = serde_json::from_str(body)?;
    if env.status != "success" {
        return Err(ApiError::Unsuccessful(env.status));
    }
    Ok(env.data.unwrap_or_default())
}

fn id_to_string(id: &serde_json::Value) -> Option<String> {
    match id {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn value_to_odds(v: &serde_json::Value) -> Option<Decimal> {
    let odds = match v {
        serde_json::Value::Number(n) => Decimal::from_f64(n.as_f64()?)?,
        serde_json::Value::String(s) => s.trim().parse::<Decimal>().ok()?,
        _ => return None,
    };
    Some(odds.round_dp(3))
}

fn value_to_goals(v: &serde_json::Value) -> Option<u32> {
    match v {
        serde_json::Value::Number(n) => n.as_u64().and_then(|g| u32::try_from(g).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decode a league listing into matches tagged with the league.
pub fn parse_matches(body: &str, league: &LeagueConfig) -> Result<Vec<Match>, ApiError> {
    let raw: Vec<RawMatch> = unwrap_envelope(body)?;
    let matches = raw
        .into_iter()
        .filter_map(|m| {
            let id = id_to_string(&m.id)?;
            let (Some(home_team), Some(away_team)) = (
                m.home_team.filter(|t| !t.trim().is_empty()),
                m.away_team.filter(|t| !t.trim().is_empty()),
            ) else {
                debug!(match_id = %id, league = %league.name, "Match without team names, skipping");
                return None;
            };
            let kickoff = Utc.timestamp_opt(m.start_timestamp, 0).single()?;
            Some(Match {
                id,
                home_team,
                away_team,
                league_name: league.name.clone(),
                league_category: league.category,
                kickoff,
            })
        })
        .collect();
    Ok(matches)
}

/// Decode a markets payload into a snapshot.
///
/// Only markets the rules know are kept. Outcomes without a readable name
/// or odds are dropped one by one.
pub fn parse_markets(body: &str) -> Result<MarketSnapshot, ApiError> {
    let raw: HashMap<String, RawMarket> = unwrap_envelope(body)?;
    let mut snapshot = MarketSnapshot::new();
    for (market_id, market) in raw {
        if MarketKind::from_id(&market_id).is_none() {
            continue;
        }
        let outcomes = market
            .outcomes
            .into_iter()
            .filter_map(|o| {
                let name = id_to_string(&o.name)?;
                let odds = value_to_odds(&o.odds)?;
                Some(Outcome { name, odds })
            })
            .collect();
        snapshot.insert(market_id, outcomes);
    }
    Ok(snapshot)
}

/// Decode a match detail payload.
///
/// A match only counts as finished once both scores are readable.
pub fn parse_status(body: &str) -> Result<MatchStatus, ApiError> {
    let detail: Option<RawMatchDetail> = unwrap_envelope(body)?;
    let Some(detail) = detail else {
        return Ok(MatchStatus::Pending);
    };
    if detail.status != "finished" {
        return Ok(MatchStatus::Pending);
    }
    match (value_to_goals(&detail.score_home), value_to_goals(&detail.score_away)) {
        (Some(home), Some(away)) => Ok(MatchStatus::Finished(Score { home, away })),
        _ => Ok(MatchStatus::Pending),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// RapidAPI 1xBet client.
pub struct XbetClient {
    http: Client,
    host: String,
    base_url: String,
    api_key: Secret<String>,
    max_retries: u32,
    retry_delay: Duration,
}

impl XbetClient {
    pub fn new(
        host: String,
        api_key: Secret<String>,
        max_retries: u32,
        retry_delay: Duration,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("TIPSTER/0.1.0")
            .build()?;
        Ok(Self {
            http,
            base_url: format!("https://{host}"),
            host,
            api_key,
            max_retries: max_retries.max(1),
            retry_delay,
        })
    }

    /// Point the client at another base URL (local mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// GET `path` with fixed-delay retries; returns the body of the first
    /// 200 response.
    async fn get(&self, path: &str) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            if attempt > 1 {
                debug!(attempt, delay_ms = self.retry_delay.as_millis() as u64, "Retrying odds API call");
                tokio::time::sleep(self.retry_delay).await;
            }

            let resp = self
                .http
                .get(&url)
                .header("x-rapidapi-key", self.api_key.expose_secret())
                .header("x-rapidapi-host", &self.host)
                .send()
                .await;

            match resp {
                Ok(response) if response.status() == StatusCode::OK => {
                    return Ok(response.text().await?);
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    warn!(
                        status = %status,
                        attempt,
                        max = self.max_retries,
                        path,
                        "Odds API returned an error status"
                    );
                    last_error = ApiError::Status { status: status.as_u16(), body }.to_string();
                }
                Err(e) => {
                    warn!(attempt, max = self.max_retries, path, error = %e, "Odds API request failed");
                    last_error = e.to_string();
                }
            }
        }

        Err(ApiError::Exhausted {
            attempts: self.max_retries,
            last: last_error,
        })
    }
}

#[async_trait]
impl OddsProvider for XbetClient {
    async fn league_matches(&self, league: &LeagueConfig) -> Result<Vec<Match>, ApiError> {
        let path = format!(
            "/matches?sport_id={SPORT_ID}&league_id={}&mode=line&lng=en",
            league.id
        );
        let body = self.get(&path).await?;
        let matches = parse_matches(&body, league)?;
        info!(league = %league.name, league_id = league.id, count = matches.len(), "League matches fetched");
        Ok(matches)
    }

    async fn match_markets(&self, match_id: &str) -> Result<MarketSnapshot, ApiError> {
        let body = self.get(&format!("/matches/{match_id}/markets?mode=line&lng=en")).await?;
        let snapshot = parse_markets(&body)?;
        debug!(match_id, markets = snapshot.market_count(), "Markets fetched");
        Ok(snapshot)
    }

    async fn match_status(&self, match_id: &str) -> Result<MatchStatus, ApiError> {
        let body = self.get(&format!("/matches/{match_id}?mode=line&lng=en")).await?;
        parse_status(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
