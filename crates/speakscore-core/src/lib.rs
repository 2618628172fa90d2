//! Core services for the speakscore assessment backend
//!
//! Data flows strictly forward: session store -> dialogue driver (loop) ->
//! dual-standard evaluator -> CEFR crosswalk -> report renderer -> email
//! dispatcher. Everything here is process-lifetime state; no persistence
//! guarantee is claimed across restarts.

pub mod crosswalk;
pub mod dialogue;
pub mod email;
pub mod error;
pub mod evaluator;
pub mod report;
pub mod script;
pub mod sessions;
pub mod settings;
pub mod store;

pub use crosswalk::{reconcile, CrosswalkPolicy};
pub use dialogue::DialogueDriver;
pub use email::EmailDispatcher;
pub use error::CoreError;
pub use evaluator::Evaluator;
pub use report::{RenderedReport, ReportService};
pub use sessions::SessionService;
pub use settings::{EmailSettings, OracleSettings, Settings, SharedSettings};
pub use store::{InMemorySessionStore, SessionStore};
