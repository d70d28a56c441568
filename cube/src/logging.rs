//! Development-time tracing for debugging the solver.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Dev diagnostics via `RUST_LOG`, output to stderr.
//!   Not persisted, not part of the solver's product output.
//!
//! - **Engine logs (`io/plan_log`)**: Per-subgoal engine output in the
//!   configured `log_dir`, unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset or unparsable. Engine kills and
/// truncated output are logged at `warn`, so they stay visible by default.
pub const DEFAULT_FILTER: &str = "cube_solver=warn";

/// Install the stderr subscriber.
///
/// ```bash
/// RUST_LOG=cube_solver::io::process=debug cube-solver solve <STATE>
/// ```
pub fn init() {
    let filter = filter_from(std::env::var("RUST_LOG").ok().as_deref());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
