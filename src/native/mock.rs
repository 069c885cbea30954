//! Scripted stand-in for the native library.
//!
//! Records every call so tests can assert on ordering and on how many times
//! a handle was closed.

use crate::native::{IsolateThread, NativeApi};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::ffi::CStr;
use std::ptr::NonNull;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    CreateIsolate,
    TearDownIsolate,
    Connect { path: String, user: String, password: String },
    Load(i64),
    Execute { connection: i64, sql: String },
    Fetch { connection: i64, sql: String },
    FetchRows(i64),
    CloseQuery(i64),
    CloseConnection(i64),
    DeleteDatabaseAndClose(i64),
    LastError,
}

struct State {
    create_status: Cell<i32>,
    tear_down_status: Cell<i32>,
    connect_result: Cell<i64>,
    load_result: Cell<Option<i64>>,
    execute_result: Cell<i32>,
    fetch_result: Cell<i64>,
    chunks: RefCell<VecDeque<Option<Vec<u8>>>>,
    last_error: RefCell<Option<String>>,
    calls: RefCell<Vec<Call>>,
}

/// Cloning shares the script and the call log.
#[derive(Clone)]
pub(crate) struct MockNative {
    state: Rc<State>,
}

impl MockNative {
    pub(crate) fn new() -> Self {
        Self {
            state: Rc::new(State {
                create_status: Cell::new(0),
                tear_down_status: Cell::new(0),
                connect_result: Cell::new(1),
                load_result: Cell::new(Some(1)),
                execute_result: Cell::new(0),
                fetch_result: Cell::new(100),
                chunks: RefCell::new(VecDeque::new()),
                last_error: RefCell::new(None),
                calls: RefCell::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn set_create_status(&self, status: i32) {
        self.state.create_status.set(status);
    }

    pub(crate) fn set_tear_down_status(&self, status: i32) {
        self.state.tear_down_status.set(status);
    }

    pub(crate) fn set_connect_result(&self, handle: i64) {
        self.state.connect_result.set(handle);
    }

    pub(crate) fn set_load_result(&self, result: Option<i64>) {
        self.state.load_result.set(result);
    }

    pub(crate) fn set_execute_result(&self, affected: i32) {
        self.state.execute_result.set(affected);
    }

    pub(crate) fn set_fetch_result(&self, handle: i64) {
        self.state.fetch_result.set(handle);
    }

    pub(crate) fn set_last_error(&self, message: &str) {
        *self.state.last_error.borrow_mut() = Some(message.to_string());
    }

    /// Queue chunks for `fetch_rows`; `None` is a null pointer. Once the
    /// queue runs dry every read returns null.
    pub(crate) fn push_chunks(&self, chunks: &[Option<&str>]) {
        let mut queue = self.state.chunks.borrow_mut();
        queue.extend(chunks.iter().map(|c| c.map(|s| s.as_bytes().to_vec())));
    }

    pub(crate) fn push_raw_chunk(&self, bytes: &[u8]) {
        self.state.chunks.borrow_mut().push_back(Some(bytes.to_vec()));
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.calls.borrow().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.calls.borrow().iter().filter(|c| pred(*c)).count()
    }

    pub(crate) fn clear_calls(&self) {
        self.state.calls.borrow_mut().clear();
    }

    fn record(&self, call: Call) {
        self.state.calls.borrow_mut().push(call);
    }
}

fn text(s: &CStr) -> String {
    s.to_string_lossy().into_owned()
}

impl NativeApi for MockNative {
    fn create_isolate(&self) -> std::result::Result<IsolateThread, i32> {
        self.record(Call::CreateIsolate);
        match self.state.create_status.get() {
            0 => {
                let dangling = NonNull::<u8>::dangling().as_ptr().cast();
                Ok(IsolateThread::from_raw(dangling, dangling))
            }
            status => Err(status),
        }
    }

    fn tear_down_isolate(&self, _thread: &IsolateThread) -> i32 {
        self.record(Call::TearDownIsolate);
        self.state.tear_down_status.get()
    }

    fn connect(&self, _thread: &IsolateThread, path: &CStr, user: &CStr, password: &CStr) -> i64 {
        self.record(Call::Connect {
            path: text(path),
            user: text(user),
            password: text(password),
        });
        self.state.connect_result.get()
    }

    fn load_spatial_functions(&self, _thread: &IsolateThread, connection: i64) -> Option<i64> {
        self.record(Call::Load(connection));
        self.state.load_result.get()
    }

    fn execute(&self, _thread: &IsolateThread, connection: i64, sql: &CStr) -> i32 {
        self.record(Call::Execute { connection, sql: text(sql) });
        self.state.execute_result.get()
    }

    fn fetch(&self, _thread: &IsolateThread, connection: i64, sql: &CStr) -> i64 {
        self.record(Call::Fetch { connection, sql: text(sql) });
        self.state.fetch_result.get()
    }

    fn fetch_rows(&self, _thread: &IsolateThread, query: i64) -> Option<Vec<u8>> {
        self.record(Call::FetchRows(query));
        self.state.chunks.borrow_mut().pop_front().flatten()
    }

    fn close_query(&self, _thread: &IsolateThread, query: i64) {
        self.record(Call::CloseQuery(query));
    }

    fn close_connection(&self, _thread: &IsolateThread, connection: i64) {
        self.record(Call::CloseConnection(connection));
    }

    fn delete_database_and_close(&self, _thread: &IsolateThread, connection: i64) {
        self.record(Call::DeleteDatabaseAndClose(connection));
    }

    fn last_error(&self, _thread: &IsolateThread) -> Option<String> {
        self.record(Call::LastError);
        self.state.last_error.borrow_mut().take()
    }
}
