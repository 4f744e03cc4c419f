//! Odds provider integration.
//!
//! Defines the `OddsProvider` trait and the error type shared by its
//! implementations. The only live implementation is the 1xBet feed
//! served through RapidAPI (`xbet`).

pub mod xbet;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LeagueConfig;
use crate::types::{MarketSnapshot, Match, MatchStatus};

/// Errors raised while talking to an odds provider.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection, TLS or timeout failure.
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-200 response.
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Body did not have the expected shape.
    #[error("failed to decode provider payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Envelope decoded but reported a non-success status.
    #[error("provider reported status {0:?}")]
    Unsuccessful(String),

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

/// Abstraction over football odds feeds.
///
/// Implementors list upcoming matches per league, expose the current odds
/// snapshot of a match, and report final scores.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OddsProvider: Send + Sync {
    /// All listed matches of a league (pre-match line).
    async fn league_matches(&self, league: &LeagueConfig) -> Result<Vec<Match>, ApiError>;

    /// Current odds for a match.
    async fn match_markets(&self, match_id: &str) -> Result<MarketSnapshot, ApiError>;

    /// Current state of a match, with the score once finished.
    async fn match_status(&self, match_id: &str) -> Result<MatchStatus, ApiError>;
}
