pub mod api;
pub mod evaluation;
pub mod rubric;
pub mod session;

pub use api::*;
pub use evaluation::*;
pub use rubric::*;
pub use session::*;
