//! Journal report
//!
//! Prints the per-token journal summary and the last fills.
//!
//! Usage:
//!   cargo run --bin journal_report
//!
//! Environment:
//!   JOURNAL_PATH - journal file (default: memory/ai_brain.json)
//!   HISTORY_PATH - fill log (default: memory/trade_history.json)

use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

use stripe_tiger::core::journal::{selectivity, summarize, TradeHistory, TradeJournal};
use stripe_tiger::models::BotConfig;
use stripe_tiger::utils::format::{mask, round_to};

const RECENT_FILLS: usize = 10;

fn main() -> eyre::Result<()> {
    let _ = dotenvy::dotenv();
    FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_target(false)
        .compact()
        .init();

    let config = BotConfig::from_env()?;
    let journal = TradeJournal::new(&config.storage.journal_path);
    let history = TradeHistory::new(&config.storage.history_path);

    println!("📊 Journal: {}", journal.path().display());
    let book = journal.load()?;
    let summary = summarize(&book);
    if summary.is_empty() {
        println!("   (no journaled trades)");
    } else {
        println!(
            "   {:<16} {:>7} {:>9} {:>12}",
            "token", "trades", "win %", "profit $"
        );
        for (token, row) in &summary {
            println!(
                "   {:<16} {:>7} {:>9.2} {:>12.2}",
                mask(token),
                row.trades,
                row.win_rate,
                row.profit
            );
        }
        let total: f64 = summary.values().map(|r| r.profit).sum();
        println!("   total profit: ${}", round_to(total, 2));
    }
    println!("   selectivity threshold: {}", selectivity(&book));

    println!();
    println!("🧾 Last {} fills: {}", RECENT_FILLS, history.path().display());
    match history.recent(RECENT_FILLS) {
        Ok(fills) if fills.is_empty() => println!("   (no fills)"),
        Ok(fills) => {
            for f in fills {
                // full-balance live sells carry no amounts
                let amounts = match (f.units, f.usd) {
                    (Some(units), Some(usd)) => {
                        format!("units={:.6} usd=${}", units, round_to(usd, 2))
                    }
                    _ => "full balance".to_string(),
                };
                println!(
                    "   {} {} {:<4} {} {} {} @ ${} {}",
                    f.timestamp,
                    f.mode,
                    f.side,
                    f.chain,
                    mask(&f.token),
                    amounts,
                    round_to(f.price, 6),
                    f.note
                );
            }
        }
        Err(e) => warn!(code = e.code_str(), "⚠️ {}", e.message),
    }

    Ok(())
}
