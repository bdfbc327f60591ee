//! Utils Module - Helper Functions & Shared Utilities
//!
//! Constants and text formatting shared across the bot.

pub mod constants;
pub mod format;

pub use constants::*;
pub use format::*;
