//! Journal Module - Persistent trade memory
//!
//! Two JSON files:
//! - `TradeJournal`: per-token outcome tally (`{trades, success, failure, total_profit}`)
//! - `TradeHistory`: append-only log of every fill
//!
//! A missing file reads as empty. A corrupt file is an error, never
//! silently overwritten. Each store serializes its read-modify-write behind
//! a lock shared by all clones, so concurrent writers never drop entries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{Chain, Side, TradeMode};
use crate::utils::format::{now_iso, round_to};

/// Neutral selectivity when there is nothing to learn from
pub const DEFAULT_SELECTIVITY: u8 = 60;
const STRICT_SELECTIVITY: u8 = 70;
const LOOSE_SELECTIVITY: u8 = 50;

// ============================================
// File helpers
// ============================================

fn read_json<T>(path: &Path) -> AppResult<T>
where
    T: Default + for<'de> Deserialize<'de>,
{
    match std::fs::read_to_string(path) {
        Ok(raw) if raw.trim().is_empty() => Ok(T::default()),
        Ok(raw) => serde_json::from_str(&raw).map_err(|e| AppError::store_corrupt(path, e)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(AppError::store_read(path, e)),
    }
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| AppError::store_write(path, e))?;
    }
    let body = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::internal(format!("serialize {}: {}", path.display(), e)))?;
    // atomic replace; one temp file per write
    let tmp = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
    std::fs::write(&tmp, body).map_err(|e| AppError::store_write(path, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(AppError::store_write(path, e));
    }
    debug!(path = %path.display(), "💾 saved");
    Ok(())
}

/// Write lock shared by every clone of a store
#[derive(Debug, Clone, Default)]
struct WriteLock(Arc<Mutex<()>>);

impl WriteLock {
    fn acquire(&self) -> MutexGuard<'_, ()> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ============================================
// Trade journal
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// Profitable closes count as success
    pub fn from_profit(profit: f64) -> Self {
        if profit > 0.0 {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalTrade {
    pub timestamp: String,
    pub profit: f64,
    pub outcome: Outcome,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(default)]
    pub trades: Vec<JournalTrade>,
    #[serde(default)]
    pub success: u64,
    #[serde(default)]
    pub failure: u64,
    #[serde(default)]
    pub total_profit: f64,
}

impl TokenRecord {
    /// Fraction of closed trades that were successful, `None` with no outcomes
    pub fn win_ratio(&self) -> Option<f64> {
        let total = self.success + self.failure;
        (total > 0).then(|| self.success as f64 / total as f64)
    }
}

/// Per-token summary row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSummary {
    /// Percent, 2 decimals
    pub win_rate: f64,
    pub trades: usize,
    pub profit: f64,
}

pub type JournalBook = BTreeMap<String, TokenRecord>;

#[derive(Debug, Clone)]
pub struct TradeJournal {
    path: PathBuf,
    write_lock: WriteLock,
}

impl TradeJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: WriteLock::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> AppResult<JournalBook> {
        read_json(&self.path)
    }

    pub fn record_trade(
        &self,
        token: &str,
        profit: f64,
        outcome: Outcome,
        notes: &str,
    ) -> AppResult<()> {
        let _guard = self.write_lock.acquire();
        let mut book = self.load()?;
        let rec = book.entry(token.to_string()).or_default();
        rec.trades.push(JournalTrade {
            timestamp: now_iso(),
            profit,
            outcome,
            notes: notes.to_string(),
        });
        rec.total_profit += profit;
        match outcome {
            Outcome::Success => rec.success += 1,
            Outcome::Failure => rec.failure += 1,
        }
        write_json(&self.path, &book)
    }

    pub fn summary(&self) -> AppResult<BTreeMap<String, TokenSummary>> {
        Ok(summarize(&self.load()?))
    }

    pub fn selectivity_threshold(&self) -> AppResult<u8> {
        Ok(selectivity(&self.load()?))
    }
}

pub fn summarize(book: &JournalBook) -> BTreeMap<String, TokenSummary> {
    book.iter()
        .map(|(token, rec)| {
            let win_rate = rec.win_ratio().map(|r| round_to(r * 100.0, 2)).unwrap_or(0.0);
            (
                token.clone(),
                TokenSummary {
                    win_rate,
                    trades: rec.trades.len(),
                    profit: rec.total_profit,
                },
            )
        })
        .collect()
}

/// Screening score cut-off learned from past outcomes:
/// winning streaks make the bot pickier, losing ones looser.
pub fn selectivity(book: &JournalBook) -> u8 {
    if book.is_empty() {
        return DEFAULT_SELECTIVITY;
    }
    let ratios: Vec<f64> = book.values().filter_map(TokenRecord::win_ratio).collect();
    let avg = if ratios.is_empty() {
        0.0
    } else {
        ratios.iter().sum::<f64>() / ratios.len() as f64
    };
    if avg > 0.8 {
        STRICT_SELECTIVITY
    } else if avg < 0.5 {
        LOOSE_SELECTIVITY
    } else {
        DEFAULT_SELECTIVITY
    }
}

// ============================================
// Trade history
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: String,
    pub chain: Chain,
    pub token: String,
    pub side: Side,
    pub mode: TradeMode,
    /// `None` for full-balance live sells, where the amount is on-chain only
    #[serde(default)]
    pub units: Option<f64>,
    pub price: f64,
    #[serde(default)]
    pub usd: Option<f64>,
    #[serde(default)]
    pub note: String,
}

impl HistoryEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain: Chain,
        token: &str,
        side: Side,
        mode: TradeMode,
        units: Option<f64>,
        price: f64,
        usd: Option<f64>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: now_iso(),
            chain,
            token: token.to_string(),
            side,
            mode,
            units,
            price,
            usd,
            note: note.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TradeHistory {
    path: PathBuf,
    write_lock: WriteLock,
}

impl TradeHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: WriteLock::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: HistoryEntry) -> AppResult<()> {
        let _guard = self.write_lock.acquire();
        let mut all: Vec<HistoryEntry> = read_json(&self.path)?;
        all.push(entry);
        write_json(&self.path, &all)
    }

    pub fn entries(&self) -> AppResult<Vec<HistoryEntry>> {
        read_json(&self.path)
    }

    /// Last `n` fills, oldest first
    pub fn recent(&self, n: usize) -> AppResult<Vec<HistoryEntry>> {
        let all = self.entries()?;
        let skip = all.len().saturating_sub(n);
        Ok(all.into_iter().skip(skip).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;
    use tempfile::tempdir;

    #[test]
    fn test_missing_journal_is_empty() {
        let dir = tempdir().unwrap();
        let j = TradeJournal::new(dir.path().join("memory/ai_brain.json"));
        assert!(j.load().unwrap().is_empty());
        assert_eq!(j.selectivity_threshold().unwrap(), 60);
    }

    #[test]
    fn test_record_and_summary() {
        let dir = tempdir().unwrap();
        let j = TradeJournal::new(dir.path().join("memory/ai_brain.json"));
        j.record_trade("0xabc", 10.0, Outcome::Success, "").unwrap();
        j.record_trade("0xabc", -4.0, Outcome::Failure, "stop").unwrap();
        j.record_trade("0xabc", 3.0, Outcome::Success, "").unwrap();

        let s = j.summary().unwrap();
        let row = &s["0xabc"];
        assert_eq!(row.trades, 3);
        assert_eq!(row.win_rate, 66.67);
        assert!((row.profit - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_selectivity_bands() {
        let mut book = JournalBook::new();
        book.insert(
            "a".into(),
            TokenRecord {
                success: 9,
                failure: 1,
                ..Default::default()
            },
        );
        assert_eq!(selectivity(&book), 70);

        book.insert(
            "b".into(),
            TokenRecord {
                success: 0,
                failure: 10,
                ..Default::default()
            },
        );
        // average of 0.9 and 0.0
        assert_eq!(selectivity(&book), 50);

        book.insert(
            "c".into(),
            TokenRecord {
                success: 7,
                failure: 3,
                ..Default::default()
            },
        );
        // (0.9 + 0.0 + 0.7) / 3 ≈ 0.53
        assert_eq!(selectivity(&book), 60);
    }

    #[test]
    fn test_tokens_without_outcomes_read_as_loose() {
        let mut book = JournalBook::new();
        book.insert("a".into(), TokenRecord::default());
        assert_eq!(selectivity(&book), 50);
    }

    #[test]
    fn test_corrupt_journal_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ai_brain.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = TradeJournal::new(&path).load().unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreCorrupt);
    }

    #[test]
    fn test_history_append_and_recent() {
        let dir = tempdir().unwrap();
        let h = TradeHistory::new(dir.path().join("trade_history.json"));
        for i in 0..5 {
            h.append(HistoryEntry::new(
                Chain::Eth,
                "0xabc",
                Side::Buy,
                TradeMode::Mock,
                Some(i as f64),
                1.0,
                Some(50.0),
                "",
            ))
            .unwrap();
        }
        assert_eq!(h.entries().unwrap().len(), 5);
        let last = h.recent(2).unwrap();
        assert_eq!(last.len(), 2);
        assert_eq!(last[1].units, Some(4.0));
        assert_ne!(last[0].id, last[1].id);
    }

    #[test]
    fn test_concurrent_appends_keep_every_fill() {
        let dir = tempdir().unwrap();
        let h = TradeHistory::new(dir.path().join("trade_history.json"));

        let workers: Vec<_> = (0..8)
            .map(|w| {
                let h = h.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        h.append(HistoryEntry::new(
                            Chain::Bsc,
                            "0xabc",
                            Side::Buy,
                            TradeMode::Mock,
                            Some((w * 100 + i) as f64),
                            1.0,
                            Some(1.0),
                            "",
                        ))
                        .unwrap();
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        let all = h.entries().unwrap();
        assert_eq!(all.len(), 200);
        let ids: std::collections::HashSet<_> = all.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 200);
        // no temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_concurrent_journal_writes_keep_every_trade() {
        let dir = tempdir().unwrap();
        let j = TradeJournal::new(dir.path().join("ai_brain.json"));

        let workers: Vec<_> = (0..8)
            .map(|w| {
                let j = j.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let profit = if (w + i) % 2 == 0 { 1.0 } else { -1.0 };
                        j.record_trade("0xabc", profit, Outcome::from_profit(profit), "")
                            .unwrap();
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        let rec = &j.load().unwrap()["0xabc"];
        assert_eq!(rec.trades.len(), 200);
        assert_eq!(rec.success + rec.failure, 200);
    }

    #[test]
    fn test_full_balance_sell_has_no_amounts() {
        let raw = r#"{"id":"6f1c2c1e-8a43-4a53-9d8e-0b7f4d1f2a10","timestamp":"t","chain":"ETH",
            "token":"0xabc","side":"SELL","mode":"live","units":null,"price":1.5,"usd":null}"#;
        let e: HistoryEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(e.units, None);
        assert_eq!(e.usd, None);
        assert_eq!(e.price, 1.5);
    }
}
