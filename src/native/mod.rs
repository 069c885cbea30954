//! Native boundary: the C ABI exported by the H2GIS native image.
//!
//! [`NativeApi`] mirrors the exported entry points one-to-one and keeps
//! their raw conventions (status codes, `0` handles, nullable chunk
//! pointers). Interpreting those conventions is the job of the layers above
//! (`isolate`, `connection`, `statement`, `stream`), so they behave the same
//! whether they talk to [`NativeLibrary`] or to the scripted double used in
//! tests.
//!
//! # Threading
//!
//! GraalVM binds an isolate thread to the OS thread that created it. Calls
//! from other threads against the same isolate are undefined behaviour, and
//! this crate does not lock around them: [`IsolateThread`] holds raw
//! pointers and is therefore neither `Send` nor `Sync`. Callers needing
//! parallelism must create one session per thread.

use std::ffi::{c_void, CStr};
use std::fmt;

pub mod library;

#[cfg(test)]
pub(crate) mod mock;

pub use library::{default_library_name, NativeLibrary};

/// Isolate plus the thread handle every native call takes.
///
/// Only [`crate::isolate::Isolate`] holds one, and it stops lending it out
/// once the isolate is torn down, so a reference to an `IsolateThread` is
/// always live.
pub struct IsolateThread {
    // kept for the lifetime of the pair; tear-down only needs the thread
    _isolate: *mut c_void,
    thread: *mut c_void,
}

impl IsolateThread {
    pub(crate) fn from_raw(isolate: *mut c_void, thread: *mut c_void) -> Self {
        Self { _isolate: isolate, thread }
    }

    pub(crate) fn thread_ptr(&self) -> *mut c_void {
        self.thread
    }
}

impl fmt::Debug for IsolateThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsolateThread").finish_non_exhaustive()
    }
}

/// Entry points of the native library.
pub trait NativeApi {
    /// `graal_create_isolate` with a zeroed parameter block.
    ///
    /// # Returns
    ///
    /// The isolate/thread pair, or the non-zero native status
    fn create_isolate(&self) -> std::result::Result<IsolateThread, i32>;

    /// `graal_tear_down_isolate`; returns the native status.
    fn tear_down_isolate(&self, thread: &IsolateThread) -> i32;

    /// `h2gis_connect`; `0` on failure.
    fn connect(&self, thread: &IsolateThread, path: &CStr, user: &CStr, password: &CStr) -> i64;

    /// `h2gis_load`; `None` when the library does not export it.
    fn load_spatial_functions(&self, thread: &IsolateThread, connection: i64) -> Option<i64>;

    /// `h2gis_execute`; affected rows or a negative code.
    fn execute(&self, thread: &IsolateThread, connection: i64, sql: &CStr) -> i32;

    /// `h2gis_fetch`; query handle or `0` on failure.
    fn fetch(&self, thread: &IsolateThread, connection: i64, sql: &CStr) -> i64;

    /// `h2gis_fetch_rows`; `None` for a null pointer, otherwise the chunk bytes.
    fn fetch_rows(&self, thread: &IsolateThread, query: i64) -> Option<Vec<u8>>;

    /// `h2gis_close_query`. Not guaranteed idempotent natively.
    fn close_query(&self, thread: &IsolateThread, query: i64);

    /// `h2gis_close_connection`
    fn close_connection(&self, thread: &IsolateThread, connection: i64);

    /// `h2gis_delete_database_and_close`
    fn delete_database_and_close(&self, thread: &IsolateThread, connection: i64);

    /// `h2gis_get_last_error`; `None` when unsupported or empty.
    fn last_error(&self, thread: &IsolateThread) -> Option<String>;
}
