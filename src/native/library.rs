//! Dynamic loading of the H2GIS shared object.

use crate::native::{IsolateThread, NativeApi};
use crate::types::{H2gisError, Result};
use libloading::Library;
use std::ffi::{c_char, c_int, c_void, CStr};
use std::path::{Path, PathBuf};
use std::ptr;
use tracing::debug;

/// `graal_create_isolate_params_t` from `graal_isolate.h`.
#[repr(C)]
#[allow(dead_code)]
struct GraalCreateIsolateParams {
    version: c_int,
    reserved_address_space_size: usize,
    auxiliary_image_path: *const c_char,
    auxiliary_image_reserved_space_size: usize,
    _reserved_1: c_int,
    _reserved_2: *mut *mut c_char,
    pkey: c_int,
    _reserved_3: c_char,
    _reserved_4: c_char,
    _reserved_5: c_char,
}

impl GraalCreateIsolateParams {
    fn zeroed() -> Self {
        Self {
            version: 0,
            reserved_address_space_size: 0,
            auxiliary_image_path: ptr::null(),
            auxiliary_image_reserved_space_size: 0,
            _reserved_1: 0,
            _reserved_2: ptr::null_mut(),
            pkey: 0,
            _reserved_3: 0,
            _reserved_4: 0,
            _reserved_5: 0,
        }
    }
}

type CreateIsolateFn = unsafe extern "C" fn(
    *mut GraalCreateIsolateParams,
    *mut *mut c_void,
    *mut *mut c_void,
) -> c_int;
type TearDownIsolateFn = unsafe extern "C" fn(*mut c_void) -> c_int;
type ConnectFn =
    unsafe extern "C" fn(*mut c_void, *const c_char, *const c_char, *const c_char) -> i64;
type LoadFn = unsafe extern "C" fn(*mut c_void, i64) -> i64;
type ExecuteFn = unsafe extern "C" fn(*mut c_void, i64, *const c_char) -> c_int;
type FetchFn = unsafe extern "C" fn(*mut c_void, i64, *const c_char) -> i64;
type FetchRowsFn = unsafe extern "C" fn(*mut c_void, i64) -> *const c_char;
type HandleFn = unsafe extern "C" fn(*mut c_void, i64);
type LastErrorFn = unsafe extern "C" fn(*mut c_void) -> *const c_char;

/// File name of the native library for the current platform.
pub fn default_library_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "h2gis.dll"
    } else if cfg!(target_os = "macos") {
        "h2gis.dylib"
    } else {
        "h2gis.so"
    }
}

/// Loaded H2GIS shared object with its entry points resolved.
///
/// The function pointers are only valid while `_library` is alive; they are
/// private and the struct owns the library, so they cannot escape it.
pub struct NativeLibrary {
    path: PathBuf,
    create_isolate: CreateIsolateFn,
    tear_down_isolate: TearDownIsolateFn,
    connect: ConnectFn,
    load: Option<LoadFn>,
    execute: ExecuteFn,
    fetch: FetchFn,
    fetch_rows: FetchRowsFn,
    close_query: HandleFn,
    close_connection: HandleFn,
    delete_database_and_close: HandleFn,
    last_error: Option<LastErrorFn>,
    _library: Library,
}

impl NativeLibrary {
    /// Load the shared object and bind every entry point.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to `h2gis.so` / `h2gis.dll` / `h2gis.dylib`
    ///
    /// # Errors
    ///
    /// `H2gisError::Library` if the file cannot be loaded or a required
    /// symbol is missing. `h2gis_load` and `h2gis_get_last_error` are optional.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(H2gisError::Library(format!(
                "library not found: {}",
                path.display()
            )));
        }

        // SAFETY: loading runs the library's initialisers; the H2GIS image has
        // no initialisers beyond the GraalVM runtime's own.
        let library = unsafe { Library::new(path) }
            .map_err(|e| H2gisError::Library(format!("{}: {}", path.display(), e)))?;

        // SAFETY: each type alias matches the C prototype of the symbol it binds.
        let native = unsafe {
            Self {
                path: path.to_path_buf(),
                create_isolate: symbol(&library, b"graal_create_isolate\0")?,
                tear_down_isolate: symbol(&library, b"graal_tear_down_isolate\0")?,
                connect: symbol(&library, b"h2gis_connect\0")?,
                load: symbol(&library, b"h2gis_load\0").ok(),
                execute: symbol(&library, b"h2gis_execute\0")?,
                fetch: symbol(&library, b"h2gis_fetch\0")?,
                fetch_rows: symbol(&library, b"h2gis_fetch_rows\0")?,
                close_query: symbol(&library, b"h2gis_close_query\0")?,
                close_connection: symbol(&library, b"h2gis_close_connection\0")?,
                delete_database_and_close: symbol(
                    &library,
                    b"h2gis_delete_database_and_close\0",
                )?,
                last_error: symbol(&library, b"h2gis_get_last_error\0").ok(),
                _library: library,
            }
        };

        debug!(path = %path.display(), "native library loaded");
        Ok(native)
    }

    /// Path the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Resolve `name` and copy the function pointer out of the symbol.
///
/// # Safety
///
/// `T` must be the exact function pointer type of the exported symbol.
unsafe fn symbol<T: Copy>(library: &Library, name: &[u8]) -> Result<T> {
    let sym = library.get::<T>(name).map_err(|e| {
        let name = String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name));
        H2gisError::Library(format!("missing symbol {}: {}", name, e))
    })?;
    Ok(*sym)
}

/// Copy a NUL-terminated string owned by the isolate.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated buffer valid for the
/// duration of the call.
unsafe fn copy_c_string(ptr: *const c_char) -> Option<Vec<u8>> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_bytes().to_vec())
    }
}

// SAFETY (all methods below): `IsolateThread` references are only handed out
// by a live `Isolate`, and every `&CStr` is NUL-terminated by construction.
impl NativeApi for NativeLibrary {
    fn create_isolate(&self) -> std::result::Result<IsolateThread, i32> {
        let mut params = GraalCreateIsolateParams::zeroed();
        let mut isolate: *mut c_void = ptr::null_mut();
        let mut thread: *mut c_void = ptr::null_mut();
        let status = unsafe { (self.create_isolate)(&mut params, &mut isolate, &mut thread) };
        if status != 0 {
            return Err(status);
        }
        Ok(IsolateThread::from_raw(isolate, thread))
    }

    fn tear_down_isolate(&self, thread: &IsolateThread) -> i32 {
        unsafe { (self.tear_down_isolate)(thread.thread_ptr()) }
    }

    fn connect(&self, thread: &IsolateThread, path: &CStr, user: &CStr, password: &CStr) -> i64 {
        unsafe { (self.connect)(thread.thread_ptr(), path.as_ptr(), user.as_ptr(), password.as_ptr()) }
    }

    fn load_spatial_functions(&self, thread: &IsolateThread, connection: i64) -> Option<i64> {
        self.load
            .map(|load| unsafe { load(thread.thread_ptr(), connection) })
    }

    fn execute(&self, thread: &IsolateThread, connection: i64, sql: &CStr) -> i32 {
        unsafe { (self.execute)(thread.thread_ptr(), connection, sql.as_ptr()) }
    }

    fn fetch(&self, thread: &IsolateThread, connection: i64, sql: &CStr) -> i64 {
        unsafe { (self.fetch)(thread.thread_ptr(), connection, sql.as_ptr()) }
    }

    fn fetch_rows(&self, thread: &IsolateThread, query: i64) -> Option<Vec<u8>> {
        unsafe { copy_c_string((self.fetch_rows)(thread.thread_ptr(), query)) }
    }

    fn close_query(&self, thread: &IsolateThread, query: i64) {
        unsafe { (self.close_query)(thread.thread_ptr(), query) }
    }

    fn close_connection(&self, thread: &IsolateThread, connection: i64) {
        unsafe { (self.close_connection)(thread.thread_ptr(), connection) }
    }

    fn delete_database_and_close(&self, thread: &IsolateThread, connection: i64) {
        unsafe { (self.delete_database_and_close)(thread.thread_ptr(), connection) }
    }

    fn last_error(&self, thread: &IsolateThread) -> Option<String> {
        let last_error = self.last_error?;
        let bytes = unsafe { copy_c_string(last_error(thread.thread_ptr())) }?;
        let message = String::from_utf8_lossy(&bytes).trim().to_string();
        (!message.is_empty()).then_some(message)
    }
}
