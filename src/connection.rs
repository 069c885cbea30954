//! Connection lifecycle: open, close, delete, liveness.

use crate::isolate::Isolate;
use crate::native::NativeApi;
use crate::otel::{native_span, NativeCall};
use crate::stream;
use crate::types::{ConnectionHandle, H2gisError, Result};
use std::ffi::CString;
use tracing::{debug, warn};

/// Statement used by [`ping`].
pub const PING_SQL: &str = "SELECT 1;";

/// Encode text for the native string convention (NUL-terminated UTF-8).
pub(crate) fn c_string(what: &str, value: &str) -> Result<CString> {
    CString::new(value).map_err(|_| {
        H2gisError::invalid_argument(format!("{} contains an interior NUL byte", what))
    })
}

/// Connection arguments encoded for the native call.
///
/// Building one performs all argument validation, so a failure here has no
/// native side effects.
#[derive(Debug)]
pub struct ConnectArgs {
    path: CString,
    user: CString,
    password: CString,
}

impl ConnectArgs {
    /// # Arguments
    ///
    /// * `path` - H2 database path, without the `jdbc:h2:` prefix
    /// * `user` - User name (H2 default is `sa`)
    /// * `password` - Password, may be empty
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty path or text containing NUL
    pub fn encode(path: &str, user: &str, password: &str) -> Result<Self> {
        if path.trim().is_empty() {
            return Err(H2gisError::invalid_argument("database path must not be empty"));
        }
        Ok(Self {
            path: c_string("database path", path)?,
            user: c_string("user name", user)?,
            password: c_string("password", password)?,
        })
    }

    fn path_lossy(&self) -> std::borrow::Cow<'_, str> {
        self.path.to_string_lossy()
    }
}

/// Open a connection to the database at `path`.
///
/// # Errors
///
/// - `InvalidArgument` for an empty path or text containing NUL
/// - `Connection` when the native side returns the zero handle
/// - `SessionClosed` after isolate teardown
pub fn connect<N: NativeApi>(
    isolate: &Isolate<N>,
    path: &str,
    user: &str,
    password: &str,
) -> Result<ConnectionHandle> {
    let args = ConnectArgs::encode(path, user, password)?;
    connect_with(isolate, &args)
}

/// Open a connection from already-validated arguments.
pub fn connect_with<N: NativeApi>(isolate: &Isolate<N>, args: &ConnectArgs) -> Result<ConnectionHandle> {
    let thread = isolate.thread()?;
    let path = args.path_lossy();

    let span = native_span(NativeCall::Connect, None);
    let _guard = span.enter();

    let raw = isolate
        .native()
        .connect(thread, &args.path, &args.user, &args.password);
    match ConnectionHandle::from_raw(raw) {
        Some(handle) => {
            debug!(%handle, path = %path, "connection opened");
            Ok(handle)
        }
        None => {
            let detail = isolate
                .last_error()
                .unwrap_or_else(|| "native connect returned no handle".to_string());
            Err(H2gisError::Connection(format!("{}: {}", path, detail)))
        }
    }
}

/// Close the connection held in `slot` and clear it. No-op when empty.
pub fn close<N: NativeApi>(isolate: &Isolate<N>, slot: &mut Option<ConnectionHandle>) {
    let Some(handle) = slot.take() else {
        return;
    };

    let span = native_span(NativeCall::Close, None);
    let _guard = span.enter();

    match isolate.thread() {
        Ok(thread) => {
            isolate.native().close_connection(thread, handle.get());
            debug!(%handle, "connection closed");
        }
        Err(_) => warn!(%handle, "isolate gone before connection close"),
    }
}

/// Drop every object, delete the database files, then close.
///
/// Irreversible. Clears `slot` like [`close`]; no-op when empty.
pub fn delete_database_and_close<N: NativeApi>(
    isolate: &Isolate<N>,
    slot: &mut Option<ConnectionHandle>,
) -> Result<()> {
    let Some(handle) = *slot else {
        return Ok(());
    };
    let thread = isolate.thread()?;

    let span = native_span(NativeCall::DeleteDatabase, None);
    let _guard = span.enter();

    isolate.native().delete_database_and_close(thread, handle.get());
    *slot = None;
    warn!(%handle, "database deleted");
    Ok(())
}

/// Register the H2GIS spatial functions on `connection`.
///
/// # Errors
///
/// - `Library` when the loaded library has no `h2gis_load` entry point
/// - `Execution` when it reports failure
pub fn load_spatial_functions<N: NativeApi>(
    isolate: &Isolate<N>,
    connection: ConnectionHandle,
) -> Result<()> {
    let thread = isolate.thread()?;

    let span = native_span(NativeCall::LoadFunctions, None);
    let _guard = span.enter();

    match isolate.native().load_spatial_functions(thread, connection.get()) {
        None => Err(H2gisError::Library(
            "h2gis_load is not exported by this library".to_string(),
        )),
        Some(1) => {
            debug!(%connection, "spatial functions loaded");
            Ok(())
        }
        Some(code) => Err(H2gisError::Execution {
            code,
            message: isolate
                .last_error()
                .unwrap_or_else(|| "failed to load spatial functions".to_string()),
        }),
    }
}

/// Round-trip a trivial query. Never fails: any error reads as `false`.
pub fn ping<N: NativeApi>(isolate: &Isolate<N>, connection: Option<ConnectionHandle>) -> bool {
    let Some(connection) = connection else {
        return false;
    };

    match stream::fetch(isolate, connection, PING_SQL).and_then(|rows| rows.collect_rows()) {
        Ok(_) => true,
        Err(e) => {
            debug!(error = %e, "ping failed");
            false
        }
    }
}
