//! Non-query statements.

use crate::connection::c_string;
use crate::isolate::Isolate;
use crate::native::NativeApi;
use crate::otel::{native_span, record_rows, NativeCall};
use crate::types::{ConnectionHandle, H2gisError, Result};
use tracing::debug;

/// Run `sql` once and return the affected row count.
///
/// DDL reports `0`. There are no retries; the caller owns retry policy.
///
/// # Errors
///
/// `Execution` with the native code when it is negative
pub fn execute<N: NativeApi>(
    isolate: &Isolate<N>,
    connection: ConnectionHandle,
    sql: &str,
) -> Result<i32> {
    let sql_c = c_string("sql", sql)?;
    let thread = isolate.thread()?;

    let span = native_span(NativeCall::Execute, Some(sql));
    let _guard = span.enter();

    let affected = isolate.native().execute(thread, connection.get(), &sql_c);
    if affected < 0 {
        let message = isolate
            .last_error()
            .unwrap_or_else(|| format!("statement failed: {}", sql));
        return Err(H2gisError::Execution {
            code: i64::from(affected),
            message,
        });
    }

    record_rows(None, Some(i64::from(affected)));
    debug!(%connection, affected, "statement executed");
    Ok(affected)
}
