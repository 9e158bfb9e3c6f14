//! Observability for backup and restore runs
//!
//! Structured JSON-lines logging with typed lifecycle events. Executors do
//! not log directly; they emit through an [`Output`](crate::output::Output)
//! sink, whose default implementation writes through [`Logger`].

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
