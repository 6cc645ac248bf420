//! Logging setup for the jvmbudget binary
//!
//! Diagnostics go to stderr through `tracing`; stdout carries only the
//! command output (flags, heap size, exit code) so task scripts can capture it.

use crate::cli::Verbosity;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Build the filter from the configured level, CLI verbosity and `RUST_LOG`
///
/// Verbosity flags replace the configured level; `RUST_LOG` directives are
/// appended last so they take precedence per target.
pub fn env_filter(config_level: &str, verbosity: Verbosity) -> EnvFilter {
    let base = base_directives(config_level, verbosity);

    let directives = match std::env::var("RUST_LOG") {
        Ok(env) if !env.trim().is_empty() => format!("{},{}", base, env.trim()),
        _ => base.to_string(),
    };

    EnvFilter::try_new(&directives)
        .or_else(|_| EnvFilter::try_new(base))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn base_directives(config_level: &str, verbosity: Verbosity) -> &str {
    match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => config_level.trim(),
        Verbosity::Verbose => "info",
        Verbosity::VeryVerbose => "debug",
    }
}

/// Colour only when writing to a terminal, never into captured task logs
fn ansi_for<W: IsTerminal>(stream: &W) -> bool {
    stream.is_terminal()
}

/// Install the global stderr subscriber; later calls are ignored
pub fn init(config_level: &str, verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config_level, verbosity))
        .with_writer(std::io::stderr)
        .with_ansi(ansi_for(&std::io::stderr()))
        .with_target(false)
        .try_init();
}
