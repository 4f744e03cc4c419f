//! TIPSTER: daily football coupon picker and Telegram publisher
//!
//! Entry point. Loads configuration, initialises structured logging,
//! resumes any coupon still awaiting results, and runs the daily
//! scan→pick→publish→verify cycle with graceful shutdown.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use tipster::config::{self, Secrets};
use tipster::engine::cycle::CycleRunner;
use tipster::notify::telegram::TelegramNotifier;
use tipster::notify::{LogNotifier, Notifier};
use tipster::provider::xbet::XbetClient;
use tipster::schedule;
use tipster::strategy::rules::RuleBook;

const BANNER: &str = r#"
 _____ ___ ____  ____ _____ _____ ____
|_   _|_ _|  _ \/ ___|_   _| ____|  _ \
  | |  | || |_) \___ \ | | |  _| | |_) |
  | |  | ||  __/ ___) || | | |___|  _ <
  |_| |___|_|   |____/ |_| |_____|_| \_\

  Daily football coupons v0.1.0
"#;

#[derive(Debug, Parser)]
#[command(name = "tipster", version, about = "Daily football coupon picker and publisher")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "TIPSTER_CONFIG", default_value = "config.toml")]
    config: String,

    /// Run a single cycle now instead of waiting for the daily trigger.
    #[arg(long)]
    once: bool,

    /// Log messages instead of posting them to Telegram.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    let cfg = config::AppConfig::load(&cli.config)?;
    let dry_run = cli.dry_run || cfg.bot.dry_run;

    init_logging();

    println!("{BANNER}");
    info!(
        bot_name = %cfg.bot.name,
        run_at = %cfg.bot.run_at,
        utc_offset_hours = cfg.bot.utc_offset_hours,
        leagues = cfg.leagues.len(),
        dry_run,
        "TIPSTER starting up"
    );

    // -- Initialise components -------------------------------------------

    let secrets = Secrets::from_env(&cfg, dry_run)?;

    let provider = Arc::new(XbetClient::new(
        secrets.api_host.clone(),
        secrets.api_key,
        cfg.api.max_retries,
        cfg.api.retry_delay(),
        std::time::Duration::from_secs(cfg.api.timeout_secs),
    )?);

    let notifier: Arc<dyn Notifier> = match secrets.telegram {
        Some(tg) if !dry_run => Arc::new(TelegramNotifier::new(tg.bot_token, tg.channel_id)?),
        _ => {
            info!("Dry run: messages will be logged, not sent");
            Arc::new(LogNotifier)
        }
    };

    let run_at = cfg.run_at()?;
    let offset = cfg.utc_offset()?;
    let runner = CycleRunner::new(cfg, provider, notifier, RuleBook::default())?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // -- Resume a coupon left by a previous run --------------------------

    tokio::select! {
        res = runner.resume_pending() => {
            if let Err(e) = res {
                error!(error = %e, "Failed to resume pending coupon");
            }
        }
        _ = &mut shutdown => {
            info!("Shutdown signal received.");
            return Ok(());
        }
    }

    if cli.once {
        tokio::select! {
            res = runner.run() => log_cycle_outcome(res),
            _ = &mut shutdown => info!("Shutdown signal received."),
        }
        info!("TIPSTER shut down cleanly.");
        return Ok(());
    }

    // -- Main loop -------------------------------------------------------

    loop {
        let next = schedule::next_run(Utc::now(), run_at, offset);
        info!(next_run = %next.format("%d/%m/%Y %H:%M UTC"), "Waiting for next cycle. Press Ctrl+C to stop.");

        tokio::select! {
            _ = tokio::time::sleep(schedule::wait_until(Utc::now(), next)) => {}
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }

        tokio::select! {
            res = runner.run() => log_cycle_outcome(res),
            _ = &mut shutdown => {
                info!("Shutdown signal received during cycle; pending coupon kept on disk.");
                break;
            }
        }
    }

    info!("TIPSTER shut down cleanly.");
    Ok(())
}

/// Log how a cycle ended. Errors never stop the scheduler.
fn log_cycle_outcome(res: Result<Option<tipster::coupon::CouponReport>>) {
    match res {
        Ok(Some(report)) => info!(
            coupon_id = %report.coupon_id,
            won = report.is_winner(),
            legs_won = report.legs_won(),
            legs = report.legs.len(),
            total_odds = %report.total_odds,
            "Cycle complete"
        ),
        Ok(None) => info!("Cycle complete without a graded coupon"),
        Err(e) => error!(error = %e, "Cycle failed, continuing to next"),
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tipster=info"));

    let json_logging = std::env::var("TIPSTER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
