//! Tracing setup for the binaries.
//!
//! Output stays plain unless debug mode is on (`UPKEEP_DEBUG` or `RUST_LOG`),
//! in which case a `fmt` subscriber is installed and the message macros
//! route through it.

use super::messages::macros::is_debug_mode;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "upkeep=debug,reqwest=info,hyper=warn";

pub fn init() {
    if !is_debug_mode() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    // A second init (tests, embedding hosts) keeps the first subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}
