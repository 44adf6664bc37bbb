//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "cidrd", version)]
#[command(about = "Answers CIDR membership queries over a Unix socket", long_about = None)]
pub struct CliArgs {
    /// Path to the Unix socket to listen on
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Path to the CIDR list, one prefix per line
    #[arg(long, value_name = "PATH")]
    pub cidrs: Option<PathBuf>,

    /// Reload interval in hours (0 disables)
    #[arg(long, value_name = "HOURS")]
    pub refresh: Option<u64>,

    /// Optional TOML config file; command-line flags take precedence
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Reload when the CIDR list file changes
    #[arg(long)]
    pub watch: bool,

    /// Socket file permissions, in octal (e.g. 660)
    #[arg(long, value_name = "OCTAL", value_parser = parse_octal_mode)]
    pub socket_mode: Option<u32>,

    /// Serve Prometheus metrics on this address
    #[arg(long, value_name = "ADDR")]
    pub metrics_address: Option<String>,
}

fn parse_octal_mode(s: &str) -> Result<u32, String> {
    let digits = s.trim_start_matches("0o");
    u32::from_str_radix(digits, 8).map_err(|e| format!("invalid octal mode {s:?}: {e}"))
}
