//! H2GIS native bindings - Rust core library
//!
//! Drives the H2GIS spatial database compiled as a GraalVM native image
//! (`h2gis.so` / `h2gis.dll`) through its C entry points:
//! - isolate lifecycle (one isolate per session)
//! - connection lifecycle
//! - statements and chunked JSON result streams
//!
//! Can be used as:
//! - Rust library (`Session`)
//! - Python extension (`maturin develop --features extension-module`)
//!
//! ```rust,ignore
//! use h2gis_native::{Session, SessionConfig};
//!
//! let mut session = Session::open(&SessionConfig::from_env())?;
//! session.connect("/tmp/mydb", "sa", "")?;
//! session.execute("CREATE TABLE T(id INT PRIMARY KEY);")?;
//! let rows = session.fetch("SELECT * FROM T;")?;
//! ```

pub mod config;
pub mod connection;
pub mod isolate;
pub mod native;
pub mod otel;
pub mod session;
pub mod statement;
pub mod stream;
pub mod types;

#[cfg(feature = "python")]
pub mod bindings;

pub use config::SessionConfig;
pub use native::{NativeApi, NativeLibrary};
pub use session::{Session, SessionState};
pub use stream::RowStream;
pub use types::{ConnectionHandle, H2gisError, QueryHandle, Result, Row};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// PyO3 module definition, importable as `h2gis_native`.
///
/// Only available when compiled with the "python" feature.
#[cfg(feature = "python")]
#[pymodule]
fn h2gis_native(py: Python, m: &PyModule) -> PyResult<()> {
    bindings::register_module(py, m)
}
