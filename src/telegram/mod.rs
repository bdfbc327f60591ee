//! Telegram Module - chat commands in, alerts and replies out

pub mod commands;
pub mod notifier;

pub use commands::{Command, CommandHandler, Update};
pub use notifier::{send_logged, LogNotifier, Notifier, TelegramNotifier};
