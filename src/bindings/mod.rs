//! PyO3 bindings.

pub mod session;

use pyo3::prelude::*;

pub use session::PyH2gis;

/// Install the stderr log subscriber (`RUST_LOG` wins over `level`).
///
/// Returns `False` if logging was already initialised.
#[pyfunction]
#[pyo3(signature = (level="info"))]
fn init_logging(level: &str) -> bool {
    crate::otel::init_logging(level)
}

/// Register classes, exceptions and functions on the module.
pub fn register_module(py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyH2gis>()?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;

    m.add("H2GISError", py.get_type::<session::H2GISError>())?;
    m.add("LibraryError", py.get_type::<session::LibraryError>())?;
    m.add("IsolateCreationError", py.get_type::<session::IsolateCreationError>())?;
    m.add("InvalidArgumentError", py.get_type::<session::InvalidArgumentError>())?;
    m.add("ConnectionError", py.get_type::<session::ConnectionError>())?;
    m.add("ExecutionError", py.get_type::<session::ExecutionError>())?;
    m.add("QueryError", py.get_type::<session::QueryError>())?;
    m.add("QueryExecutionError", py.get_type::<session::QueryExecutionError>())?;
    m.add("ResultDecodingError", py.get_type::<session::ResultDecodingError>())?;
    m.add("SessionClosedError", py.get_type::<session::SessionClosedError>())?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
