//! Reload subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     source.rs (read prefix list) → index (build)
//!     → controller.rs (first snapshot; failure is fatal)
//!
//! On reload trigger (timer, SIGHUP, file change):
//!     controller.rs reads + builds a new index with no lock held
//!     → atomic swap of Arc<Snapshot>
//!     → later queries observe the new snapshot
//!     → in-flight queries finish on whichever snapshot they loaded
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable; a reload always builds a fresh index
//! - A failed reload leaves the published snapshot untouched
//! - Readers never take a lock (ArcSwap)

pub mod controller;
pub mod source;
pub mod watcher;

pub use controller::{ReloadController, Snapshot};
pub use source::{FileSource, LoadError, PrefixSource};
pub use watcher::FileWatcher;
