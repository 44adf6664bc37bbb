//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → initial load (fatal on failure) → bind (fatal)
//!     → arm reload triggers → serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → stop accepting → drain connections → remove socket
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown
//!     SIGHUP → prefix list reload
//! ```
//!
//! # Design Decisions
//! - Fail fast: startup errors are fatal
//! - Listener binds only after the first index is in place

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, run_until, ServerError};
