//! Auto-tune Module
//!
//! Re-derives per-token buy/sell thresholds from the token's own recent
//! adaptive scores and RSI readings, using configured quantiles.

use serde::{Deserialize, Serialize};

use crate::core::brain::AdaptiveBrain;
use crate::core::indicators::{quantile, PriceWindow};
use crate::models::config::EngineSettings;
use crate::utils::format::round_to;

const AI_GAP: f64 = 0.05;
const AI_CAP: f64 = 0.95;
const RSI_GAP: f64 = 5.0;
const RSI_CAP: f64 = 90.0;
const MIN_LOOKBACK: usize = 180;

/// Buy/sell thresholds for one token
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub ai_buy: f64,
    pub ai_sell: f64,
    pub rsi_buy: f64,
    pub rsi_sell: f64,
}

impl Thresholds {
    /// Baselines from configuration
    pub fn baseline(settings: &EngineSettings) -> Self {
        Self {
            ai_buy: settings.ai_min_prob_buy,
            ai_sell: settings.ai_max_prob_sell,
            rsi_buy: settings.rsi_buy,
            rsi_sell: settings.rsi_sell,
        }
    }
}

/// Whether tuning runs on this cycle for a window of `samples` prices
pub fn is_due(settings: &EngineSettings, samples: usize, cycle: u64) -> bool {
    settings.auto_tune
        && !settings.lock_tuned
        && samples >= settings.tune_warmup
        && cycle % settings.tune_every.max(1) == 0
}

/// Recompute thresholds in place. Returns true when anything changed.
pub fn retune(
    settings: &EngineSettings,
    window: &PriceWindow,
    brain: &AdaptiveBrain,
    current: &mut Thresholds,
) -> bool {
    let warmup = settings.tune_warmup;
    let lookback = (2 * warmup).max(MIN_LOOKBACK);

    let snapshot = window.tail(lookback);
    let mut replay = PriceWindow::new(settings.rsi_len, snapshot.len() + 5);
    let rsi_vals: Vec<f64> = snapshot
        .iter()
        .filter_map(|p| {
            replay.add(*p);
            replay.rsi()
        })
        .collect();

    let ai_vals = brain.tail(lookback);

    let mut changed = false;

    if ai_vals.len() >= warmup {
        if let (Some(mut buy), Some(sell)) = (
            quantile(&ai_vals, settings.ai_buy_q),
            quantile(&ai_vals, settings.ai_sell_q),
        ) {
            if buy < sell + AI_GAP {
                buy = AI_CAP.min(sell + AI_GAP);
            }
            current.ai_buy = round_to(buy, 4);
            current.ai_sell = round_to(sell, 4);
            changed = true;
        }
    }

    if rsi_vals.len() >= warmup {
        if let (Some(mut buy), Some(sell)) = (
            quantile(&rsi_vals, settings.rsi_buy_q),
            quantile(&rsi_vals, settings.rsi_sell_q),
        ) {
            if buy < sell + RSI_GAP {
                buy = RSI_CAP.min(sell + RSI_GAP);
            }
            current.rsi_buy = round_to(buy, 2);
            current.rsi_sell = round_to(sell, 2);
            changed = true;
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EngineSettings {
        EngineSettings {
            tune_warmup: 10,
            tune_every: 5,
            rsi_len: 3,
            ..EngineSettings::default()
        }
    }

    #[test]
    fn test_is_due() {
        let s = settings();
        assert!(is_due(&s, 10, 5));
        assert!(!is_due(&s, 9, 5));
        assert!(!is_due(&s, 10, 6));
        let locked = EngineSettings {
            lock_tuned: true,
            ..settings()
        };
        assert!(!is_due(&locked, 100, 5));
        let off = EngineSettings {
            auto_tune: false,
            ..settings()
        };
        assert!(!is_due(&off, 100, 5));
    }

    #[test]
    fn test_not_enough_samples_leaves_thresholds() {
        let s = settings();
        let window = PriceWindow::new(3, 100);
        let brain = AdaptiveBrain::default();
        let mut t = Thresholds::baseline(&s);
        assert!(!retune(&s, &window, &brain, &mut t));
        assert_eq!(t, Thresholds::baseline(&s));
    }

    #[test]
    fn test_flat_scores_enforce_gap() {
        let s = settings();
        let mut window = PriceWindow::new(3, 100);
        let mut brain = AdaptiveBrain::default();
        for _ in 0..30 {
            window.add(1.0);
            brain.update(0.0);
        }
        let mut t = Thresholds::baseline(&s);
        assert!(retune(&s, &window, &brain, &mut t));
        // all scores 0.5: sell = 0.5, buy lifted to sell + gap
        assert_eq!(t.ai_sell, 0.5);
        assert_eq!(t.ai_buy, 0.55);
        // flat prices read RSI 100 everywhere: buy capped at 90
        assert_eq!(t.rsi_sell, 100.0);
        assert_eq!(t.rsi_buy, 90.0);
    }

    #[test]
    fn test_ai_buy_capped() {
        let s = settings();
        let window = PriceWindow::new(3, 100);
        let mut brain = AdaptiveBrain::default();
        for _ in 0..200 {
            brain.update(1.0);
        }
        let mut t = Thresholds::baseline(&s);
        assert!(retune(&s, &window, &brain, &mut t));
        assert!(t.ai_sell > 0.95);
        assert_eq!(t.ai_buy, 0.95);
    }
}
