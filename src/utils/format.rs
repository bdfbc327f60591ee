//! Text helpers shared by the engine, Telegram replies and logs.

use chrono::{SecondsFormat, Utc};

/// Shorten a token address for chat output: `0x1234...abcd`
pub fn mask(s: &str) -> String {
    let s = s.trim();
    if s.chars().count() > 12 {
        let head: String = s.chars().take(6).collect();
        let tail: String = {
            let chars: Vec<char> = s.chars().collect();
            chars[chars.len() - 4..].iter().collect()
        };
        format!("{}...{}", head, tail)
    } else if s.is_empty() {
        "(none)".to_string()
    } else {
        s.to_string()
    }
}

/// Round to `n` decimals
#[inline]
pub fn round_to(x: f64, n: u32) -> f64 {
    let factor = 10f64.powi(n as i32);
    (x * factor).round() / factor
}

/// Optional value rounded for display, `None` when missing
pub fn fmt_opt(x: Option<f64>, n: u32) -> String {
    match x {
        Some(v) => format!("{}", round_to(v, n)),
        None => "None".to_string(),
    }
}

/// Empty string shown as `(none)`
pub fn or_none(s: &str) -> &str {
    if s.is_empty() {
        "(none)"
    } else {
        s
    }
}

/// UTC timestamp, ISO-8601 with seconds precision
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Thousands separators for whole-dollar amounts: 50000 -> "50,000"
pub fn with_commas(x: f64) -> String {
    let n = x.round() as i64;
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        format!("-{}", out)
    } else {
        out
    }
}
