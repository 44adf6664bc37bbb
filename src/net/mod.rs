//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Unix socket connection
//!     → listener.rs (bind, accept)
//!     → connection.rs (id, open-connection tracking)
//!     → handler.rs (line in → lookup → token out, until peer closes)
//! ```
//!
//! # Design Decisions
//! - No connection limit: one task per connection, unbounded
//! - Connection errors are local to the connection
//! - The handler is generic over the stream so tests can use in-memory pipes

pub mod connection;
pub mod handler;
pub mod listener;
pub mod protocol;

pub use connection::{ConnectionId, ConnectionTracker};
pub use handler::{handle_connection, ConnectionError};
pub use listener::{Listener, ListenerError};
pub use protocol::Response;
