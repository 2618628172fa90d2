//! Handlers module - organized by functionality

pub mod chat;
pub mod config;
pub mod email;
pub mod evaluation;
pub mod health;
pub mod report;
pub mod session;

// Re-export all handlers for easier importing
pub use chat::*;
pub use config::*;
pub use email::*;
pub use evaluation::*;
pub use health::*;
pub use report::*;
pub use session::*;
