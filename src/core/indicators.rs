//! Indicators Module
//! Simple moving average, RSI and quantile over bounded price windows

use std::borrow::Cow;
use std::collections::VecDeque;

use crate::utils::constants::{DEFAULT_RSI_LEN, WINDOW_CAPACITY};

/// Mean of the last `period` values, `None` until enough samples exist
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let tail = &values[values.len() - period..];
    Some(tail.iter().sum::<f64>() / period as f64)
}

/// Relative Strength Index over the last `period` deltas
///
/// Plain averages (no Wilder smoothing). A flat or rising-only series
/// has zero average loss and reads 100.
pub fn rsi(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }
    let n = values.len();
    let mut gain = 0.0;
    let mut loss = 0.0;
    for i in 1..=period {
        let delta = values[n - i] - values[n - i - 1];
        if delta >= 0.0 {
            gain += delta;
        } else {
            loss -= delta;
        }
    }
    let avg_gain = gain / period as f64;
    let avg_loss = loss / period as f64;
    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Lower-index quantile: sorted value at `floor(q * (n - 1))`
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    let raw = (q * (v.len() - 1) as f64).floor();
    let idx = if raw.is_finite() && raw > 0.0 {
        (raw as usize).min(v.len() - 1)
    } else {
        0
    };
    Some(v[idx])
}

/// Bounded ring of recent prices for one token
#[derive(Debug, Clone)]
pub struct PriceWindow {
    prices: VecDeque<f64>,
    capacity: usize,
    rsi_len: usize,
}

impl Default for PriceWindow {
    fn default() -> Self {
        Self::new(DEFAULT_RSI_LEN, WINDOW_CAPACITY)
    }
}

impl PriceWindow {
    pub fn new(rsi_len: usize, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            prices: VecDeque::with_capacity(capacity.min(WINDOW_CAPACITY)),
            capacity,
            rsi_len,
        }
    }

    /// Append a price; zero, negative and non-finite prices are ignored
    pub fn add(&mut self, price: f64) -> bool {
        if !price.is_finite() || price <= 0.0 {
            return false;
        }
        if self.prices.len() == self.capacity {
            self.prices.pop_front();
        }
        self.prices.push_back(price);
        true
    }

    pub fn last(&self) -> Option<f64> {
        self.prices.back().copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn sma(&self, period: usize) -> Option<f64> {
        sma(&self.contiguous(), period)
    }

    pub fn rsi(&self) -> Option<f64> {
        rsi(&self.contiguous(), self.rsi_len)
    }

    fn contiguous(&self) -> Cow<'_, [f64]> {
        match self.prices.as_slices() {
            (a, []) => Cow::Borrowed(a),
            _ => Cow::Owned(self.prices.iter().copied().collect()),
        }
    }

    /// Copy of the most recent `n` prices, oldest first
    pub fn tail(&self, n: usize) -> Vec<f64> {
        let skip = self.prices.len().saturating_sub(n);
        self.prices.iter().skip(skip).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_needs_enough_values() {
        assert_eq!(sma(&[1.0, 2.0], 3), None);
        assert_eq!(sma(&[1.0, 2.0, 3.0, 4.0], 2), Some(3.5));
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let v: Vec<f64> = (1..=15).map(|x| x as f64).collect();
        assert_eq!(rsi(&v, 14), Some(100.0));
        assert_eq!(rsi(&v[..14], 14), None);
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let v: Vec<f64> = (1..=15).rev().map(|x| x as f64).collect();
        assert_eq!(rsi(&v, 14), Some(0.0));
    }

    #[test]
    fn test_rsi_balanced_is_50() {
        // alternating +1 / -1 over an even period
        let v = [10.0, 11.0, 10.0, 11.0, 10.0];
        let r = rsi(&v, 4).unwrap();
        assert!((r - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_quantile_lower_index() {
        let v = [5.0, 1.0, 4.0, 2.0, 3.0];
        assert_eq!(quantile(&v, 0.0), Some(1.0));
        assert_eq!(quantile(&v, 0.5), Some(3.0));
        // floor(0.65 * 4) = 2
        assert_eq!(quantile(&v, 0.65), Some(3.0));
        assert_eq!(quantile(&v, 1.0), Some(5.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_window_ignores_bad_prices() {
        let mut w = PriceWindow::new(14, 10);
        assert!(!w.add(0.0));
        assert!(!w.add(-1.0));
        assert!(!w.add(f64::NAN));
        assert!(w.add(1.5));
        assert_eq!(w.len(), 1);
        assert_eq!(w.last(), Some(1.5));
    }

    #[test]
    fn test_window_is_bounded() {
        let mut w = PriceWindow::new(2, 3);
        for p in [1.0, 2.0, 3.0, 4.0, 5.0] {
            w.add(p);
        }
        assert_eq!(w.len(), 3);
        assert_eq!(w.tail(10), vec![3.0, 4.0, 5.0]);
        assert_eq!(w.sma(3), Some(4.0));
        assert_eq!(w.rsi(), Some(100.0));
    }
}
