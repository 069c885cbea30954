//! Chunked result streaming.
//!
//! A query is read by calling `h2gis_fetch_rows` until it returns null.
//! Each non-null chunk is one of:
//!
//! - blank text: heartbeat, read again
//! - `Error: <message>`: in-band failure from the engine
//! - a JSON array of row objects (a bare object counts as one row)
//!
//! [`RowStream`] closes the query handle exactly once on every exit path:
//! exhaustion, in-band error, decode error, or being dropped half-read.

use crate::connection::c_string;
use crate::isolate::Isolate;
use crate::native::NativeApi;
use crate::otel::{native_span, record_rows, NativeCall};
use crate::types::{ConnectionHandle, H2gisError, QueryHandle, Result, Row};
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, Span};

/// Prefix of an in-band error chunk.
pub const ERROR_MARKER: &str = "Error:";

/// One decoded `fetch_rows` payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    /// Blank payload; carries nothing
    Heartbeat,
    /// Rows in the order the engine produced them
    Rows(Vec<Row>),
    /// Message following the error marker, with surrounding whitespace
    /// trimmed (`"Error:  boom \n"` carries `"boom"`)
    Failure(String),
}

/// Decode a non-null chunk.
///
/// # Errors
///
/// `ResultDecoding` with the raw text when the payload is not UTF-8, not
/// JSON, or not row-shaped
pub fn decode_chunk(bytes: Vec<u8>) -> Result<Chunk> {
    let text = String::from_utf8(bytes).map_err(|e| {
        let raw = String::from_utf8_lossy(e.as_bytes()).into_owned();
        H2gisError::decoding(raw, e.utf8_error())
    })?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Chunk::Heartbeat);
    }
    if let Some(message) = trimmed.strip_prefix(ERROR_MARKER) {
        return Ok(Chunk::Failure(message.trim().to_string()));
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(H2gisError::decoding(
                    &text,
                    format!("expected a row object, found {}", json_kind(&other)),
                )),
            })
            .collect::<Result<Vec<_>>>()
            .map(Chunk::Rows),
        Ok(Value::Object(row)) => Ok(Chunk::Rows(vec![row])),
        Ok(other) => Err(H2gisError::decoding(
            &text,
            format!("expected an array of rows, found {}", json_kind(&other)),
        )),
        Err(e) => Err(H2gisError::decoding(&text, e)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Start a query and return its lazy row stream.
///
/// # Errors
///
/// - `InvalidArgument` when `sql` contains NUL
/// - `Query` when the native side returns the zero handle
/// - `SessionClosed` after isolate teardown
pub fn fetch<'a, N: NativeApi>(
    isolate: &'a Isolate<N>,
    connection: ConnectionHandle,
    sql: &str,
) -> Result<RowStream<'a, N>> {
    let sql_c = c_string("sql", sql)?;
    let thread = isolate.thread()?;

    let span = native_span(NativeCall::Fetch, Some(sql));
    let raw = span.in_scope(|| isolate.native().fetch(thread, connection.get(), &sql_c));

    let Some(query) = QueryHandle::from_raw(raw) else {
        let detail = isolate
            .last_error()
            .unwrap_or_else(|| "native fetch returned no handle".to_string());
        return Err(H2gisError::Query(detail));
    };
    span.in_scope(|| debug!(%query, %connection, "query opened"));

    Ok(RowStream {
        isolate,
        query,
        pending: VecDeque::new(),
        closed: false,
        returned: 0,
        span,
    })
}

/// Single-pass iterator over the rows of one query.
///
/// Borrows the isolate, so the connection and isolate cannot be closed
/// while the stream is alive. Yields `Err` at most once, after which it is
/// exhausted.
pub struct RowStream<'a, N: NativeApi> {
    isolate: &'a Isolate<N>,
    query: QueryHandle,
    pending: VecDeque<Row>,
    closed: bool,
    returned: usize,
    span: Span,
}

impl<'a, N: NativeApi> RowStream<'a, N> {
    pub fn query_handle(&self) -> QueryHandle {
        self.query
    }

    /// Whether the native query handle has been released.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Drain the stream.
    pub fn collect_rows(self) -> Result<Vec<Row>> {
        self.collect()
    }

    /// Read one chunk; `None` at end of stream.
    fn read_chunk(&self) -> Result<Option<Vec<Row>>> {
        let thread = self.isolate.thread()?;
        let Some(bytes) = self.isolate.native().fetch_rows(thread, self.query.get()) else {
            return Ok(None);
        };

        match decode_chunk(bytes)? {
            Chunk::Heartbeat => Ok(Some(Vec::new())),
            Chunk::Rows(rows) => Ok(Some(rows)),
            Chunk::Failure(message) => Err(H2gisError::QueryExecution(message)),
        }
    }

    /// Release the native handle; later calls do nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.pending.clear();

        let _guard = self.span.enter();
        if let Ok(thread) = self.isolate.thread() {
            self.isolate.native().close_query(thread, self.query.get());
        }
        record_rows(Some(self.returned), None);
        debug!(query = %self.query, rows = self.returned, "query closed");
    }
}

impl<'a, N: NativeApi> Iterator for RowStream<'a, N> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                self.returned += 1;
                return Some(Ok(row));
            }
            if self.closed {
                return None;
            }

            let chunk = {
                let _guard = self.span.enter();
                self.read_chunk()
            };
            match chunk {
                Ok(Some(rows)) => self.pending.extend(rows),
                Ok(None) => {
                    self.close();
                    return None;
                }
                Err(e) => {
                    self.close();
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<'a, N: NativeApi> Drop for RowStream<'a, N> {
    fn drop(&mut self) {
        self.close();
    }
}
