//! cidrd: CIDR membership oracle over a Unix socket.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────┐
//!                     │                     cidrd                     │
//!                     │                                               │
//!   client line  ─────┼─▶ net::listener ─▶ net::handler ─┐            │
//!   "10.1.2.3\n"      │    (accept)        (per conn)    │ lookup     │
//!                     │                                  ▼            │
//!   "FOUND\n"    ◀────┼──────────────────────────── reload::controller│
//!                     │                              (ArcSwap<Snapshot>)
//!                     │                                  ▲            │
//!                     │   timer / SIGHUP / file watch ───┘ publish    │
//!                     │                   index (IpRange per family)  │
//!                     └───────────────────────────────────────────────┘
//! ```

use clap::{CommandFactory, Parser};

use cidrd::config::{self, CliArgs};
use cidrd::lifecycle;
use cidrd::observability::logging;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    logging::init();

    let config = match config::resolve(&args) {
        Ok(config) => config,
        Err(e) if e.is_missing_required() => {
            eprintln!("error: {}\n", e);
            eprintln!("{}", CliArgs::command().render_help());
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        socket = %config.socket_path.display(),
        cidrs = %config.cidrs_path.display(),
        refresh_secs = config.refresh_interval.map(|d| d.as_secs()),
        watch = config.watch,
        "cidrd starting"
    );

    if lifecycle::run(config).await.is_err() {
        std::process::exit(1);
    }
}
