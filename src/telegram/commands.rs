//! Chat command surface
//!
//! Telegram posts updates to `/webhook`; each text message that starts with `/`
//! is parsed into a [`Command`] and routed to the engine. Replies go back to the
//! sending chat through the [`Notifier`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::engine::TradeMachine;
use crate::telegram::notifier::{send_logged, Notifier};

const HELP_TEXT: &str = "Commands:\n\
/start – hello\n\
/help – this help\n\
/id – show your chat id\n\
/status – engine status\n\
/events [n] – recent engine events\n\
/positions – open positions\n\
/live – live-mode readiness checklist\n\
/profit – realized PnL and journal\n\
/check <token> – scam screen for a token\n\
/mode <mock|live> – switch trading mode (admin)\n\
/buy [token] – manual buy (admin)\n\
/sell [token] – manual sell (admin)\n\
/pause – pause engine (admin)\n\
/resume – resume engine (admin)\n\
/panic – close all positions (admin)\n\
/seteth <addr> – set ETH token (admin)\n\
/setbsc <addr> – set BSC token (admin)\n\
/alloc <usd> – USD per trade (admin)\n\
/poll <secs> – poll period (admin)\n\
/slippage <bps> – swap slippage (admin)\n\
/minliq <usd> – minimum pair liquidity (admin)";

// ============================================
// Webhook payload
// ============================================

/// The subset of a Telegram `Update` the bot reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub message_id: i64,
    pub chat: ChatRef,
    #[serde(default)]
    pub from: Option<Sender>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRef {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

// ============================================
// Parsing
// ============================================

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Help,
    Id,
    Status,
    Events(Option<String>),
    Positions,
    Live,
    Profit,
    Check(Option<String>),
    Mode(Option<String>),
    Buy(Option<String>),
    Sell(Option<String>),
    Pause,
    Resume,
    Panic,
    SetEth(Option<String>),
    SetBsc(Option<String>),
    Alloc(Option<String>),
    Poll(Option<String>),
    Slippage(Option<String>),
    MinLiq(Option<String>),
    Unknown(String),
}

impl Command {
    /// `/name[@bot] args…`; `None` for plain text
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;
        let mut parts = rest.split_whitespace();
        let head = parts.next()?;
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        let arg = parts.next().map(String::from);

        let cmd = match name.as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "id" => Self::Id,
            "status" => Self::Status,
            "events" => Self::Events(arg),
            "positions" => Self::Positions,
            "live" => Self::Live,
            "profit" => Self::Profit,
            "check" => Self::Check(arg),
            "mode" => Self::Mode(arg),
            "buy" => Self::Buy(arg),
            "sell" => Self::Sell(arg),
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "panic" => Self::Panic,
            "seteth" => Self::SetEth(arg),
            "setbsc" => Self::SetBsc(arg),
            "alloc" => Self::Alloc(arg),
            "poll" => Self::Poll(arg),
            "slippage" => Self::Slippage(arg),
            "minliq" => Self::MinLiq(arg),
            _ => Self::Unknown(name),
        };
        Some(cmd)
    }

    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Self::Mode(_)
                | Self::Buy(_)
                | Self::Sell(_)
                | Self::Pause
                | Self::Resume
                | Self::Panic
                | Self::SetEth(_)
                | Self::SetBsc(_)
                | Self::Alloc(_)
                | Self::Poll(_)
                | Self::Slippage(_)
                | Self::MinLiq(_)
        )
    }
}

fn parse_arg<T: std::str::FromStr>(arg: &Option<String>) -> Option<T> {
    arg.as_deref().and_then(|a| a.trim_start_matches('$').replace(',', "").parse().ok())
}

// ============================================
// Dispatch
// ============================================

pub struct CommandHandler {
    engine: Arc<TradeMachine>,
    notifier: Arc<dyn Notifier>,
    admin_chat_id: Option<i64>,
}

impl CommandHandler {
    pub fn new(
        engine: Arc<TradeMachine>,
        notifier: Arc<dyn Notifier>,
        admin_chat_id: Option<i64>,
    ) -> Self {
        Self {
            engine,
            notifier,
            admin_chat_id,
        }
    }

    pub fn is_admin(&self, chat_id: i64) -> bool {
        self.admin_chat_id == Some(chat_id)
    }

    /// Handle one webhook update and send the reply, if any
    pub async fn handle_update(&self, update: &Update) {
        let Some(msg) = &update.message else {
            debug!(update_id = update.update_id, "Update without message ignored");
            return;
        };
        let Some(text) = msg.text.as_deref() else {
            return;
        };
        if let Some(reply) = self.handle_text(msg.chat.id, text).await {
            send_logged(self.notifier.as_ref(), msg.chat.id, &reply).await;
        }
    }

    /// Reply text for a message, `None` when it is not a command
    pub async fn handle_text(&self, chat_id: i64, text: &str) -> Option<String> {
        let cmd = Command::parse(text)?;
        if cmd.requires_admin() && !self.is_admin(chat_id) {
            info!(chat_id, command = ?cmd, "⛔ Admin command refused");
            return Some("Admin only.".to_string());
        }
        debug!(chat_id, command = ?cmd, "📨 Command");
        Some(self.dispatch(chat_id, cmd).await)
    }

    async fn dispatch(&self, chat_id: i64, cmd: Command) -> String {
        let engine = &self.engine;
        match cmd {
            Command::Start => "Stripe Tiger bot is live and hunting.".to_string(),
            Command::Help => HELP_TEXT.to_string(),
            Command::Id => format!("Your chat id: {}", chat_id),
            Command::Status => engine.status_text(),
            Command::Events(n) => match &n {
                None => engine.recent_events_text(None),
                Some(_) => match parse_arg::<usize>(&n) {
                    Some(k) if k > 0 => engine.recent_events_text(Some(k)),
                    _ => "Usage: /events [n]".to_string(),
                },
            },
            Command::Positions => engine.positions_text().await,
            Command::Live => engine.live_ready_report(),
            Command::Profit => engine.profit_text(),
            Command::Check(token) => match token {
                Some(t) => engine.screen_token(&t).await,
                None => "Usage: /check <token_address>".to_string(),
            },
            Command::Mode(m) => match m.as_deref().map(str::to_lowercase).as_deref() {
                None => format!("Current mode: {}", engine.mode()),
                Some(v @ ("mock" | "live")) => engine.set_mode(v).await,
                Some(_) => "Usage: /mode <mock|live>".to_string(),
            },
            Command::Buy(token) => engine.manual_buy(token.as_deref()).await,
            Command::Sell(token) => engine.manual_sell(token.as_deref()).await,
            Command::Pause => engine.pause().await,
            Command::Resume => engine.resume().await,
            Command::Panic => engine.panic_close_all().await,
            Command::SetEth(addr) => match addr {
                Some(a) => engine.set_eth_token(&a),
                None => "Usage: /seteth <token_address>".to_string(),
            },
            Command::SetBsc(addr) => match addr {
                Some(a) => engine.set_bsc_token(&a),
                None => "Usage: /setbsc <token_address>".to_string(),
            },
            Command::Alloc(v) => match parse_arg::<f64>(&v) {
                Some(usd) if usd.is_finite() => engine.set_allocation(usd),
                _ => "Usage: /alloc <usd>".to_string(),
            },
            Command::Poll(v) => match parse_arg::<u64>(&v) {
                Some(secs) => engine.set_poll(secs),
                None => "Usage: /poll <seconds>".to_string(),
            },
            Command::Slippage(v) => match parse_arg::<u32>(&v) {
                Some(bps) => engine.set_slippage(bps),
                None => "Usage: /slippage <bps>".to_string(),
            },
            Command::MinLiq(v) => match parse_arg::<f64>(&v) {
                Some(usd) if usd.is_finite() => engine.set_min_liq(usd),
                _ => "Usage: /minliq <usd>".to_string(),
            },
            Command::Unknown(name) => format!("Unknown command /{}. Try /help", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_text_is_none() {
        assert_eq!(Command::parse("hello there"), None);
        assert_eq!(Command::parse("   "), None);
        assert_eq!(Command::parse("/"), None);
    }

    #[test]
    fn test_parse_strips_bot_suffix_and_case() {
        assert_eq!(Command::parse("/Status@StripeTigerBot"), Some(Command::Status));
        assert_eq!(
            Command::parse("/buy@bot 0xabc extra"),
            Some(Command::Buy(Some("0xabc".to_string())))
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            Command::parse("/moon"),
            Some(Command::Unknown("moon".to_string()))
        );
    }

    #[test]
    fn test_admin_commands() {
        assert!(Command::Panic.requires_admin());
        assert!(Command::Poll(None).requires_admin());
        assert!(!Command::Status.requires_admin());
        assert!(!Command::Check(None).requires_admin());
    }

    #[test]
    fn test_parse_arg_accepts_dollars_and_commas() {
        assert_eq!(parse_arg::<f64>(&Some("$75,000".to_string())), Some(75000.0));
        assert_eq!(parse_arg::<u64>(&Some("abc".to_string())), None);
        assert_eq!(parse_arg::<u32>(&None), None);
    }

    #[test]
    fn test_update_deserializes_minimal_payload() {
        let raw = r#"{"update_id":7,"message":{"message_id":1,"date":0,
            "chat":{"id":42,"type":"private"},"from":{"id":42,"is_bot":false,"first_name":"a"},
            "text":"/id"}}"#;
        let u: Update = serde_json::from_str(raw).unwrap();
        let m = u.message.unwrap();
        assert_eq!(m.chat.id, 42);
        assert_eq!(m.text.as_deref(), Some("/id"));

        let bare: Update = serde_json::from_str(r#"{"update_id":8}"#).unwrap();
        assert!(bare.message.is_none());
    }
}
