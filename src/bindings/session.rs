//! `H2GIS` Python class (main API).

use crate::config::{SessionConfig, DEFAULT_USER};
use crate::session::Session;
use crate::types::H2gisError;
use pyo3::create_exception;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyAny;

create_exception!(h2gis_native, H2GISError, PyRuntimeError);
create_exception!(h2gis_native, LibraryError, H2GISError);
create_exception!(h2gis_native, IsolateCreationError, H2GISError);
create_exception!(h2gis_native, InvalidArgumentError, PyValueError);
create_exception!(h2gis_native, ConnectionError, H2GISError);
create_exception!(h2gis_native, ExecutionError, H2GISError);
create_exception!(h2gis_native, QueryError, H2GISError);
create_exception!(h2gis_native, QueryExecutionError, H2GISError);
create_exception!(h2gis_native, ResultDecodingError, H2GISError);
create_exception!(h2gis_native, SessionClosedError, H2GISError);

impl From<H2gisError> for PyErr {
    fn from(err: H2gisError) -> PyErr {
        let message = err.to_string();
        match err {
            H2gisError::Library(_) => LibraryError::new_err(message),
            H2gisError::IsolateCreation { .. } => IsolateCreationError::new_err(message),
            H2gisError::InvalidArgument(_) => InvalidArgumentError::new_err(message),
            H2gisError::Connection(_) => ConnectionError::new_err(message),
            H2gisError::Execution { .. } => ExecutionError::new_err(message),
            H2gisError::Query(_) => QueryError::new_err(message),
            H2gisError::QueryExecution(_) => QueryExecutionError::new_err(message),
            H2gisError::ResultDecoding { .. } => ResultDecodingError::new_err(message),
            H2gisError::SessionClosed => SessionClosedError::new_err(message),
            H2gisError::Config(_) | H2gisError::Json(_) => H2GISError::new_err(message),
            H2gisError::Io(_) => pyo3::exceptions::PyIOError::new_err(message),
        }
    }
}

/// Python wrapper for a native H2GIS session.
///
/// Bound to the creating thread (`unsendable`): the GraalVM isolate thread
/// cannot be used from another OS thread.
///
/// ```python
/// from h2gis_native import H2GIS
///
/// with H2GIS("/tmp/mydb") as db:
///     db.execute("CREATE TABLE test(id INT PRIMARY KEY);")
///     rows = db.fetch("SELECT * FROM test;")
/// ```
#[pyclass(name = "H2GIS", unsendable)]
pub struct PyH2gis {
    inner: Session,
}

#[pymethods]
impl PyH2gis {
    /// Load the native library, create the isolate, optionally connect.
    ///
    /// Library path resolution:
    /// 1. `lib_path` argument
    /// 2. H2GIS_LIB_PATH environment variable
    /// 3. H2GIS_HOME/lib/h2gis.so (h2gis.dll on Windows)
    /// 4. ./lib/h2gis.so
    #[new]
    #[pyo3(signature = (db_path=None, username=DEFAULT_USER, password="", lib_path=None))]
    fn new(
        db_path: Option<&str>,
        username: &str,
        password: &str,
        lib_path: Option<&str>,
    ) -> PyResult<Self> {
        let mut config = SessionConfig::from_env();
        if let Some(lib_path) = lib_path {
            config = config.with_lib_path(lib_path);
        }

        let mut inner = Session::open(&config)?;
        if let Some(db_path) = db_path {
            inner.connect(db_path, username, password)?;
        }
        Ok(Self { inner })
    }

    /// Connect to a database, closing the previous connection if any.
    #[pyo3(signature = (db_path, username=DEFAULT_USER, password=""))]
    fn connect(&mut self, db_path: &str, username: &str, password: &str) -> PyResult<()> {
        Ok(self.inner.connect(db_path, username, password)?)
    }

    /// Execute a non-query statement.
    ///
    /// # Returns
    ///
    /// Number of affected rows
    fn execute(&self, sql: &str) -> PyResult<i32> {
        Ok(self.inner.execute(sql)?)
    }

    /// Execute a query.
    ///
    /// # Returns
    ///
    /// List of row dicts (column label to value)
    fn fetch(&self, py: Python<'_>, sql: &str) -> PyResult<PyObject> {
        let rows = self.inner.fetch(sql)?;
        pythonize::pythonize(py, &rows)
            .map_err(|e| PyErr::new::<PyRuntimeError, _>(format!("Failed to convert rows: {}", e)))
    }

    fn commit(&self) -> PyResult<i32> {
        Ok(self.inner.commit()?)
    }

    fn rollback(&self) -> PyResult<i32> {
        Ok(self.inner.rollback()?)
    }

    /// Register the H2GIS spatial functions on the current connection.
    fn load_spatial_functions(&self) -> PyResult<()> {
        Ok(self.inner.load_spatial_functions()?)
    }

    /// Round-trip `SELECT 1;`. Never raises.
    fn ping(&self) -> bool {
        self.inner.ping()
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    /// Close the connection if one is open.
    fn close(&mut self) {
        self.inner.close();
    }

    /// Drop all objects, delete the database files and close the connection.
    fn delete_database(&mut self) -> PyResult<()> {
        Ok(self.inner.delete_database()?)
    }

    /// Close and destroy the isolate. The object is unusable afterwards.
    fn tear_down(&mut self) {
        self.inner.tear_down();
    }

    /// Lifecycle state name.
    #[getter]
    fn state(&self) -> &'static str {
        self.inner.state().as_str()
    }

    fn __enter__(slf: PyRefMut<'_, Self>) -> PyRefMut<'_, Self> {
        slf
    }

    /// Closes the connection; exceptions propagate.
    fn __exit__(
        &mut self,
        _exc_type: Option<&PyAny>,
        _exc_value: Option<&PyAny>,
        _traceback: Option<&PyAny>,
    ) -> bool {
        self.inner.close();
        false
    }

    fn __repr__(&self) -> String {
        format!("H2GIS(state={})", self.inner.state().as_str())
    }
}
