//! Process-wide log sink.

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

/// Filter directives for `level`. HTTP internals stay at warn unless
/// `RUST_LOG` says otherwise.
#[must_use]
pub fn filter_directives(level: LogLevel) -> String {
    format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn",
        level.directive()
    )
}

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
