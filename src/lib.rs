//! CIDR membership oracle.
//!
//! Answers "is this address inside any configured prefix?" over a Unix
//! socket, with the prefix list reloadable while queries are in flight.

pub mod config;
pub mod index;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod reload;
pub mod server;

pub use config::ServerConfig;
pub use index::{Prefix, PrefixIndex};
pub use lifecycle::Shutdown;
pub use reload::ReloadController;
pub use server::QueryServer;
