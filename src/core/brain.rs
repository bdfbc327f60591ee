//! Adaptive score: an exponential moving average of squashed returns,
//! read as the probability that the next move is up.

use std::collections::VecDeque;

use crate::utils::constants::WINDOW_CAPACITY;

const DEFAULT_ALPHA: f64 = 0.2;
const RETURN_GAIN: f64 = 25.0;

#[derive(Debug, Clone)]
pub struct AdaptiveBrain {
    alpha: f64,
    score: f64,
    history: VecDeque<f64>,
    capacity: usize,
}

impl Default for AdaptiveBrain {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA, WINDOW_CAPACITY)
    }
}

impl AdaptiveBrain {
    pub fn new(alpha: f64, capacity: usize) -> Self {
        Self {
            alpha,
            score: 0.5,
            history: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Fold one fractional return into the score
    pub fn update(&mut self, ret: f64) {
        if !ret.is_finite() {
            return;
        }
        let sig = 0.5 + 0.5 * (RETURN_GAIN * ret).tanh();
        self.score = (1.0 - self.alpha) * self.score + self.alpha * sig;
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(self.score);
    }

    pub fn prob_up(&self) -> f64 {
        self.score
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Most recent `n` scores, oldest first
    pub fn tail(&self, n: usize) -> Vec<f64> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).copied().collect()
    }
}
