//! Native call instrumentation.
//!
//! Spans follow the OpenTelemetry database client conventions so they line
//! up with whatever the caller already collects.

use tracing::{field, span, Level, Span};

/// Native operations (maps to `db.operation.name`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeCall {
    /// Create isolate + thread
    CreateIsolate,
    /// Tear down isolate
    TearDownIsolate,
    /// Open connection
    Connect,
    /// Register spatial functions
    LoadFunctions,
    /// Non-query statement
    Execute,
    /// Query with streamed results
    Fetch,
    /// Close connection
    Close,
    /// Drop all objects, delete files, close
    DeleteDatabase,
}

impl NativeCall {
    /// Get operation name as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateIsolate => "create_isolate",
            Self::TearDownIsolate => "tear_down_isolate",
            Self::Connect => "connect",
            Self::LoadFunctions => "load",
            Self::Execute => "execute",
            Self::Fetch => "fetch",
            Self::Close => "close",
            Self::DeleteDatabase => "delete_database",
        }
    }
}

/// Create a span around one native call.
///
/// # Arguments
///
/// * `call` - Native operation
/// * `query_text` - SQL text, when the call carries one
///
/// # Example
///
/// ```rust,ignore
/// let span = native_span(NativeCall::Execute, Some("INSERT INTO T VALUES(1);"));
/// let _guard = span.enter();
/// ```
pub fn native_span(call: NativeCall, query_text: Option<&str>) -> Span {
    let span = span!(
        Level::INFO,
        "native",
        otel.name = call.as_str(),
        otel.kind = "client",
        db.system.name = "h2gis",
        db.operation.name = call.as_str(),
        db.query.text = field::Empty,
        db.response.returned_rows = field::Empty,
        db.response.affected_rows = field::Empty,
    );

    if let Some(sql) = query_text {
        span.record("db.query.text", sql);
    }

    span
}

/// Record row counts on the current span.
pub fn record_rows(rows_returned: Option<usize>, rows_affected: Option<i64>) {
    let span = Span::current();
    if let Some(returned) = rows_returned {
        span.record("db.response.returned_rows", returned);
    }
    if let Some(affected) = rows_affected {
        span.record("db.response.affected_rows", affected);
    }
}
