//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API key, bot token, channel id) are referenced by env-var name
//! in the config and resolved once at startup into [`Secrets`].

use anyhow::{bail, Context, Result};
use chrono::{FixedOffset, NaiveTime};
use secrecy::Secret;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::types::LeagueCategory;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub bot: BotConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub coupon: CouponConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub leagues: Vec<LeagueConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    pub name: String,
    /// Daily trigger, local `HH:MM`.
    pub run_at: String,
    /// Offset of the local clock from UTC, in hours.
    #[serde(default)]
    pub utc_offset_hours: i32,
    /// Log messages instead of posting them.
    #[serde(default)]
    pub dry_run: bool,
}

/// Kickoff window, in local hours of the target day.
#[derive(Debug, Deserialize, Clone)]
pub struct WindowConfig {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { start_hour: 1, end_hour: 7 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CouponConfig {
    pub min_legs: usize,
    pub max_legs: usize,
}

impl Default for CouponConfig {
    fn default() -> Self {
        Self { min_legs: 2, max_legs: 3 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub host: String,
    /// Env var holding the RapidAPI key.
    pub key_env: String,
    /// Env var that may override `host`.
    #[serde(default)]
    pub host_env: Option<String>,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    pub league_pause_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "1xbet-api.p.rapidapi.com".to_string(),
            key_env: "RAPIDAPI_KEY".to_string(),
            host_env: Some("RAPIDAPI_HOST".to_string()),
            max_retries: 3,
            retry_delay_secs: 2,
            league_pause_ms: 500,
            timeout_secs: 20,
        }
    }
}

impl ApiConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn league_pause(&self) -> Duration {
        Duration::from_millis(self.league_pause_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token_env: String,
    pub channel_id_env: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token_env: "TELEGRAM_BOT_TOKEN".to_string(),
            channel_id_env: "TELEGRAM_CHANNEL_ID".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VerificationConfig {
    /// Assumed length of a match, kickoff to final whistle.
    pub match_duration_mins: i64,
    pub grace_mins: i64,
    pub recheck_interval_mins: u64,
    /// Give up on results this long after the first check.
    pub max_wait_hours: i64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            match_duration_mins: 120,
            grace_mins: 5,
            recheck_interval_mins: 10,
            max_wait_hours: 12,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub pending_coupon_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { pending_coupon_path: "pending_coupon.json".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LeagueConfig {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub category: LeagueCategory,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Invalid config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.run_at()?;
        self.utc_offset()?;
        if self.coupon.min_legs == 0 {
            bail!("coupon.min_legs must be at least 1");
        }
        if self.coupon.min_legs > self.coupon.max_legs {
            bail!(
                "coupon.min_legs ({}) exceeds coupon.max_legs ({})",
                self.coupon.min_legs,
                self.coupon.max_legs
            );
        }
        if self.window.start_hour >= self.window.end_hour || self.window.end_hour > 23 {
            bail!(
                "window must satisfy start_hour < end_hour <= 23 (got {}..{})",
                self.window.start_hour,
                self.window.end_hour
            );
        }
        if self.leagues.is_empty() {
            bail!("at least one [[leagues]] entry is required");
        }
        if self.api.max_retries == 0 {
            bail!("api.max_retries must be at least 1");
        }
        Ok(())
    }

    /// Daily trigger time.
    pub fn run_at(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.bot.run_at, "%H:%M")
            .with_context(|| format!("bot.run_at must be HH:MM, got {:?}", self.bot.run_at))
    }

    /// Local clock offset.
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.bot.utc_offset_hours * 3600)
            .with_context(|| format!("bot.utc_offset_hours out of range: {}", self.bot.utc_offset_hours))
    }
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// Credentials resolved from the environment.
pub struct Secrets {
    pub api_key: Secret<String>,
    pub api_host: String,
    /// Absent only in dry-run mode.
    pub telegram: Option<TelegramSecrets>,
}

pub struct TelegramSecrets {
    pub bot_token: Secret<String>,
    pub channel_id: String,
}

impl Secrets {
    /// Read every referenced variable, reporting all missing ones together.
    ///
    /// Telegram credentials are only required when `dry_run` is false.
    pub fn from_env(cfg: &AppConfig, dry_run: bool) -> Result<Self> {
        let lookup = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let mut missing = Vec::new();

        let api_key = lookup(&cfg.api.key_env);
        if api_key.is_none() {
            missing.push(cfg.api.key_env.clone());
        }

        let bot_token = lookup(&cfg.telegram.bot_token_env);
        let channel_id = lookup(&cfg.telegram.channel_id_env);
        if !dry_run {
            if bot_token.is_none() {
                missing.push(cfg.telegram.bot_token_env.clone());
            }
            if channel_id.is_none() {
                missing.push(cfg.telegram.channel_id_env.clone());
            }
        }

        if !missing.is_empty() {
            bail!("Missing environment variables: {}", missing.join(", "));
        }

        let api_host = cfg
            .api
            .host_env
            .as_deref()
            .and_then(lookup)
            .unwrap_or_else(|| cfg.api.host.clone());

        let telegram = match (bot_token, channel_id) {
            (Some(token), Some(channel_id)) => Some(TelegramSecrets {
                bot_token: Secret::new(token),
                channel_id,
            }),
            _ => None,
        };

        Ok(Self {
            api_key: Secret::new(api_key.unwrap_or_default()),
            api_host,
            telegram,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const SAMPLE: &str = r#"
        [bot]
        name = "TIPSTER-TEST"
        run_at = "00:30"
        utc_offset_hours = 1

        [coupon]
        min_legs = 2
        max_legs = 3

        [[leagues]]
        id = 148
        name = "Ligue 1"
        category = "elite"

        [[leagues]]
        id = 88
        name = "MLS"
        category = "attacking"
    "#;

    #[test]
    fn test_parse_sample_with_defaults() {
        let cfg = AppConfig::parse(SAMPLE).unwrap();
        assert_eq!(cfg.bot.name, "TIPSTER-TEST");
        assert!(!cfg.bot.dry_run);
        assert_eq!(cfg.window.start_hour, 1);
        assert_eq!(cfg.window.end_hour, 7);
        assert_eq!(cfg.api.max_retries, 3);
        assert_eq!(cfg.api.retry_delay(), Duration::from_secs(2));
        assert_eq!(cfg.verification.recheck_interval_mins, 10);
        assert_eq!(cfg.leagues.len(), 2);
        assert_eq!(cfg.leagues[1].category, LeagueCategory::Attacking);
        assert_eq!(cfg.run_at().unwrap(), NaiveTime::from_hms_opt(0, 30, 0).unwrap());
        assert_eq!(cfg.utc_offset().unwrap().local_minus_utc(), 3600);
    }

    #[test]
    fn test_load_repo_config() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml");
        let cfg = AppConfig::load(path).unwrap();
        assert_eq!(cfg.leagues.len(), 14);
        assert!(cfg.coupon.min_legs <= cfg.coupon.max_legs);
        assert_eq!(cfg.api.key_env, "RAPIDAPI_KEY");
        assert!(cfg
            .leagues
            .iter()
            .any(|l| l.name == "MLS" && l.category == LeagueCategory::Attacking));
    }

    #[test]
    fn test_rejects_inverted_legs() {
        let bad = SAMPLE.replace("min_legs = 2", "min_legs = 4");
        let err = AppConfig::parse(&bad).unwrap_err();
        assert!(err.to_string().contains("min_legs"));
    }

    #[test]
    fn test_rejects_bad_run_at() {
        let bad = SAMPLE.replace("\"00:30\"", "\"half past midnight\"");
        assert!(AppConfig::parse(&bad).is_err());
    }

    #[test]
    fn test_rejects_empty_leagues() {
        let head = SAMPLE.split("[[leagues]]").next().unwrap();
        let bad = format!("leagues = []\n{head}");
        let err = AppConfig::parse(&bad).unwrap_err();
        assert!(err.to_string().contains("leagues"));
    }

    #[test]
    fn test_rejects_bad_window() {
        let bad = format!("{SAMPLE}\n[window]\nstart_hour = 7\nend_hour = 1\n");
        assert!(AppConfig::parse(&bad).is_err());
    }

    fn isolated_config(tag: &str) -> AppConfig {
        let mut cfg = AppConfig::parse(SAMPLE).unwrap();
        cfg.api.key_env = format!("TIPSTER_TEST_{tag}_KEY");
        cfg.api.host_env = Some(format!("TIPSTER_TEST_{tag}_HOST"));
        cfg.telegram.bot_token_env = format!("TIPSTER_TEST_{tag}_TOKEN");
        cfg.telegram.channel_id_env = format!("TIPSTER_TEST_{tag}_CHANNEL");
        cfg
    }

    #[test]
    fn test_secrets_report_all_missing() {
        let cfg = isolated_config("MISSING");
        let err = Secrets::from_env(&cfg, false).err().unwrap().to_string();
        assert!(err.contains("TIPSTER_TEST_MISSING_KEY"));
        assert!(err.contains("TIPSTER_TEST_MISSING_TOKEN"));
        assert!(err.contains("TIPSTER_TEST_MISSING_CHANNEL"));
    }

    #[test]
    fn test_secrets_dry_run_needs_only_api_key() {
        let cfg = isolated_config("DRY");
        std::env::set_var("TIPSTER_TEST_DRY_KEY", "k-123");
        let secrets = Secrets::from_env(&cfg, true).unwrap();
        assert_eq!(secrets.api_key.expose_secret(), "k-123");
        assert_eq!(secrets.api_host, "1xbet-api.p.rapidapi.com");
        assert!(secrets.telegram.is_none());
    }

    #[test]
    fn test_secrets_full_with_host_override() {
        let cfg = isolated_config("FULL");
        std::env::set_var("TIPSTER_TEST_FULL_KEY", "k");
        std::env::set_var("TIPSTER_TEST_FULL_HOST", "odds.example.com");
        std::env::set_var("TIPSTER_TEST_FULL_TOKEN", "t");
        std::env::set_var("TIPSTER_TEST_FULL_CHANNEL", "@channel");
        let secrets = Secrets::from_env(&cfg, false).unwrap();
        assert_eq!(secrets.api_host, "odds.example.com");
        let tg = secrets.telegram.unwrap();
        assert_eq!(tg.bot_token.expose_secret(), "t");
        assert_eq!(tg.channel_id, "@channel");
    }
}
