//! Core Module - Trading Logic
//!
//! Indicators, the adaptive score, auto-tuning, screening, persistence
//! and the engine that ties them together.

pub mod brain;
pub mod engine;
pub mod indicators;
pub mod journal;
pub mod scheduler;
pub mod screening;
pub mod tuning;

pub use brain::AdaptiveBrain;
pub use engine::{EngineSnapshot, PositionView, TradeMachine};
pub use indicators::PriceWindow;
pub use journal::{HistoryEntry, Outcome, TradeHistory, TradeJournal};
pub use screening::{screen, ScreenVerdict};
pub use tuning::Thresholds;
