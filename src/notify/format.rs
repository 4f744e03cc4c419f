//! Chat message rendering (Telegram legacy Markdown).

use chrono::{DateTime, FixedOffset, Utc};
use std::fmt::Write;

use crate::coupon::{Coupon, CouponReport};

/// Escape characters that legacy Markdown treats as markup.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Announcement posted when a coupon is published.
pub fn coupon_message(coupon: &Coupon, now: DateTime<Utc>, offset: FixedOffset) -> String {
    let mut msg = String::new();
    let date = now.with_timezone(&offset).format("%d/%m/%Y");

    let _ = writeln!(msg, "🔮 *PREDICTION COUPON - {date}* 🔮\n");
    let _ = writeln!(msg, "📝 *Coupon ID:* {}\n", coupon.id);

    for (i, leg) in coupon.legs.iter().enumerate() {
        let kickoff = leg.fixture.kickoff.with_timezone(&offset).format("%H:%M");
        let _ = writeln!(msg, "*MATCH {}:*", i + 1);
        let _ = writeln!(msg, "🏆 {}", escape_markdown(&leg.fixture.league_name));
        let _ = writeln!(
            msg,
            "⚽ {} vs {} ({kickoff})",
            escape_markdown(&leg.fixture.home_team),
            escape_markdown(&leg.fixture.away_team),
        );
        let _ = writeln!(msg, "🎯 *Prediction:* {}", escape_markdown(&leg.label()));
        let _ = writeln!(msg, "💰 *Odds:* {}\n", leg.odds);
    }

    let _ = writeln!(msg, "*📈 TOTAL ODDS: {}*\n", coupon.total_odds);
    msg.push_str("⏳ _Results will be checked automatically after the matches_");
    msg
}

/// Report posted once every leg has a final score.
pub fn report_message(report: &CouponReport, now: DateTime<Utc>, offset: FixedOffset) -> String {
    let mut msg = String::new();
    let date = now.with_timezone(&offset).format("%d/%m/%Y");
    let won = report.is_winner();

    if won {
        let _ = writeln!(msg, "🏆 *WINNING COUPON - {date}* 🏆\n");
    } else {
        let _ = writeln!(msg, "❌ *LOSING COUPON - {date}* ❌\n");
    }
    let _ = writeln!(msg, "📝 *Coupon ID:* {}\n", report.coupon_id);

    for (i, leg) in report.legs.iter().enumerate() {
        let p = &leg.prediction;
        let _ = writeln!(msg, "*MATCH {}:*", i + 1);
        let _ = writeln!(msg, "🏆 {}", escape_markdown(&p.fixture.league_name));
        let _ = writeln!(
            msg,
            "⚽ {} vs {}",
            escape_markdown(&p.fixture.home_team),
            escape_markdown(&p.fixture.away_team),
        );
        let _ = writeln!(msg, "📊 *Final score:* {}", leg.score);
        let _ = writeln!(msg, "🎯 *Prediction:* {} (Odds: {})", escape_markdown(&p.label()), p.odds);
        if leg.won {
            let _ = writeln!(msg, "✅ *CORRECT*\n");
        } else {
            let _ = writeln!(msg, "❌ *INCORRECT*\n");
        }
    }

    let _ = writeln!(msg, "*📈 TOTAL ODDS: {}*\n", report.total_odds);
    if won {
        msg.push_str("🎉 *CONGRATULATIONS! EVERY PREDICTION WAS CORRECT* 🎉");
    } else {
        let _ = write!(
            msg,
            "😔 *{} OF {} PREDICTIONS CORRECT* 😔",
            report.legs_won(),
            report.legs.len()
        );
    }
    msg
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
