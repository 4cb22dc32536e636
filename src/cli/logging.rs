//! cli::logging
//!
//! Installs the global tracing subscriber.
//!
//! Events go to stderr so command output on stdout stays scriptable.
//! `RUST_LOG` directives are honoured; the verbosity flags set the level
//! for everything else.

use std::io::IsTerminal;

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initializes the global tracing subscriber.
///
/// Installing twice (as tests that call [`crate::cli::run`] repeatedly
/// would) is silently ignored.
pub fn init_global_subscriber(verbose: u8, quiet: bool) {
    let env_filter = EnvFilter::from_default_env().add_directive(log_level(verbose, quiet).into());

    let fmt = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .compact();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt)
        .try_init();
}

/// Level selected by the verbosity flags.
fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::WARN;
    }
    match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
