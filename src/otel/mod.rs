//! Tracing instrumentation for native calls.
//!
//! Follows OpenTelemetry semantic conventions for database client spans:
//! - https://opentelemetry.io/docs/specs/semconv/database/database-spans/
//!
//! **Span naming**: `native`, with `otel.name` set to the operation
//!
//! **Attributes**:
//! - `db.system.name`: Always `"h2gis"`
//! - `db.operation.name`: `connect`, `execute`, `fetch`, ...
//! - `db.query.text`: SQL text for `execute` and `fetch`
//! - `db.response.returned_rows` / `db.response.affected_rows`
//!
//! The library never installs a subscriber; see [`init_logging`] for the
//! one the CLI and the Python module use.

pub mod db;

pub use db::{native_span, record_rows, NativeCall};

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to `default_level`.
///
/// # Returns
///
/// `false` when a global subscriber was already installed (nothing changes)
pub fn init_logging(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
