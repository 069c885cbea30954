//! Opaque native handles.
//!
//! The native layer hands out plain `int64` identifiers where `0` means
//! failure. Wrapping them in `NonZeroI64` makes the "no handle" state an
//! `Option::None` instead of a magic number.

use std::fmt;
use std::num::NonZeroI64;

/// A row decoded from a result chunk: column label to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Open database connection, scoped to one isolate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionHandle(NonZeroI64);

impl ConnectionHandle {
    /// Interpret a raw native return value; `0` yields `None`.
    pub fn from_raw(raw: i64) -> Option<Self> {
        NonZeroI64::new(raw).map(Self)
    }

    pub fn get(self) -> i64 {
        self.0.get()
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// In-flight result cursor, scoped to one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryHandle(NonZeroI64);

impl QueryHandle {
    /// Interpret a raw native return value; `0` yields `None`.
    pub fn from_raw(raw: i64) -> Option<Self> {
        NonZeroI64::new(raw).map(Self)
    }

    pub fn get(self) -> i64 {
        self.0.get()
    }
}

impl fmt::Display for QueryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_no_handle() {
        assert!(ConnectionHandle::from_raw(0).is_none());
        assert!(QueryHandle::from_raw(0).is_none());
        assert_eq!(ConnectionHandle::from_raw(7).map(ConnectionHandle::get), Some(7));
        assert_eq!(QueryHandle::from_raw(-2).map(|q| q.to_string()), Some("query#-2".into()));
    }
}
