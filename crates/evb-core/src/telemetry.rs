//! Log setup for `version-bump`.
//!
//! Logs go to stderr; stdout carries the status lines and key/value results
//! a pipeline reads. Filtering is taken from `EVB_LOG` when set, otherwise
//! the workspace crates log at the requested level and dependencies such as
//! `reqwest` and `hyper` only report warnings.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding filter directives, e.g. `git_data=trace`.
pub const LOG_ENV: &str = "EVB_LOG";

const WORKSPACE_TARGETS: [&str; 4] = ["evb_core", "git_data", "release_feed", "version_bump"];

/// Filter directives used when [`LOG_ENV`] is unset.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directives = String::from("warn");
    for target in WORKSPACE_TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

/// Install the global subscriber. `json` selects newline-delimited JSON
/// output. Later calls in the same process are ignored.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let layer = fmt::layer().with_writer(std::io::stderr);
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.json().with_current_span(true))
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.with_target(false))
            .try_init()
            .ok();
    }
}
