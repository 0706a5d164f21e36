//! Process-level helpers for binaries embedding the pool.

use std::fmt::Display;

/// Prints `"{message}: {err}"` to stderr and terminates the process with status 1.
///
/// Meant for fatal startup errors in `main`, e.g. when [`Pool::run`](crate::Pool::run)
/// fails to subscribe.
pub fn exit(message: &str, err: &dyn Display) -> ! {
    eprintln!("{message}: {err}");
    std::process::exit(1)
}
