//! Folio Kernel Library
//!
//! Content document store for a personal portfolio, with an event bus,
//! a serialized update queue, a CRUD merge engine, and security bookkeeping.
//! The `folio` binary is a thin CLI over this library.

pub mod clock;
pub mod config;
pub mod content;
pub mod error;
pub mod events;
pub mod security;
pub mod state;
pub mod store;

pub use config::Config;
pub use state::AppState;
