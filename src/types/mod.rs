//! Core types: errors and native handles.

pub mod error;
pub mod handle;

pub use error::{H2gisError, Result};
pub use handle::{ConnectionHandle, QueryHandle, Row};
