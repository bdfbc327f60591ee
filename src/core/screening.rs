//! Screening Module
//! Cheap scam heuristics for a token's best pair
//!
//! Three checks, each carrying a weight of the 0-100 legitimacy score:
//! - name does not contain a known scam marker (40)
//! - pair has at least some liquidity (30)
//! - pair is at least a few days old (30)

use serde::{Deserialize, Serialize};

use crate::models::types::PairQuote;
use crate::utils::constants::{MIN_SCREEN_AGE_DAYS, MIN_SCREEN_LIQUIDITY_USD, SCAM_NAME_MARKERS};

const NAME_WEIGHT: u8 = 40;
const LIQUIDITY_WEIGHT: u8 = 30;
const AGE_WEIGHT: u8 = 30;

/// Hard pass/fail on all three checks
pub fn is_legit_token(name: &str, liquidity_usd: f64, age_days: f64) -> bool {
    scam_marker(name).is_none()
        && liquidity_usd >= MIN_SCREEN_LIQUIDITY_USD
        && age_days >= MIN_SCREEN_AGE_DAYS
}

/// First scam marker found in the (lowercased) name
pub fn scam_marker(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    SCAM_NAME_MARKERS.iter().copied().find(|m| lower.contains(m))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenVerdict {
    pub legit: bool,
    /// 0-100, higher is more trustworthy
    pub score: u8,
    pub reasons: Vec<String>,
}

impl ScreenVerdict {
    /// Dynamic check against a learned selectivity threshold
    pub fn passes(&self, threshold: u8) -> bool {
        self.score >= threshold
    }

    pub fn emoji(&self) -> &'static str {
        match self.score {
            0..=39 => "💀",
            40..=69 => "🟠",
            _ if !self.legit => "🟡",
            _ => "✅",
        }
    }
}

/// Screen a pair snapshot; `now_ms` is wall-clock unix milliseconds
pub fn screen(quote: &PairQuote, now_ms: i64) -> ScreenVerdict {
    let mut score = 0u8;
    let mut reasons = Vec::new();

    match scam_marker(&quote.name) {
        Some(marker) => reasons.push(format!("name contains \"{}\"", marker)),
        None => score += NAME_WEIGHT,
    }

    let liq = quote.liquidity_usd.unwrap_or(0.0);
    if liq >= MIN_SCREEN_LIQUIDITY_USD {
        score += LIQUIDITY_WEIGHT;
    } else {
        reasons.push("no liquidity".to_string());
    }

    match quote.age_days(now_ms) {
        Some(age) if age >= MIN_SCREEN_AGE_DAYS => score += AGE_WEIGHT,
        Some(age) => reasons.push(format!("pair only {:.1} days old", age)),
        None => reasons.push("pair age unknown".to_string()),
    }

    let legit = quote
        .age_days(now_ms)
        .map_or(false, |age| is_legit_token(&quote.name, liq, age));

    ScreenVerdict {
        legit,
        score,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;

    /// Quote whose pair reads `age_days` old when "now" is day 100
    fn quote(name: &str, liq: Option<f64>, age_days: i64) -> PairQuote {
        PairQuote {
            name: name.to_string(),
            liquidity_usd: liq,
            pair_created_at_ms: Some((100 - age_days) * DAY_MS),
            price_usd: Some(1.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_legit_token() {
        assert!(is_legit_token("Pepe", 10_000.0, 30.0));
        assert!(!is_legit_token("SafeMoon", 10_000.0, 30.0));
        assert!(!is_legit_token("ELONDOGE", 10_000.0, 30.0));
        assert!(!is_legit_token("Pepe", 0.5, 30.0));
        assert!(!is_legit_token("Pepe", 10_000.0, 2.9));
    }

    #[test]
    fn test_screen_clean_token() {
        let v = screen(&quote("Pepe", Some(1e6), 10), 100 * DAY_MS);
        assert!(v.legit);
        assert_eq!(v.score, 100);
        assert!(v.reasons.is_empty());
        assert!(v.passes(70));
    }

    #[test]
    fn test_screen_young_token() {
        let v = screen(&quote("Pepe", Some(1e6), 1), 100 * DAY_MS);
        assert!(!v.legit);
        assert_eq!(v.score, 70);
        assert!(v.passes(60));
        assert!(!v.passes(71));
    }

    #[test]
    fn test_screen_scam_name() {
        let v = screen(&quote("BabyRug", None, 1), 100 * DAY_MS);
        assert_eq!(v.score, 0);
        assert_eq!(v.reasons.len(), 3);
        assert!(v.reasons[0].contains("rug"));
    }

    #[test]
    fn test_verdict_follows_legit_rule() {
        for (name, liq, age) in [("Pepe", 1.0, 3), ("Pepe", 0.9, 30), ("MoonCat", 1e6, 30)] {
            let v = screen(&quote(name, Some(liq), age), 100 * DAY_MS);
            assert_eq!(v.legit, is_legit_token(name, liq, age as f64), "{}", name);
        }
    }

    #[test]
    fn test_unknown_age_fails() {
        let q = PairQuote {
            name: "Pepe".into(),
            liquidity_usd: Some(5.0),
            ..Default::default()
        };
        let v = screen(&q, 100 * DAY_MS);
        assert!(!v.legit);
        assert_eq!(v.reasons, vec!["pair age unknown".to_string()]);
    }
}
