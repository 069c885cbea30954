//! Session: the caller-facing owner of isolate, connection and queries.
//!
//! ```text
//! IsolateCreated ──connect──▶ Connected ──close──▶ Closed
//!                              │    ▲                 │
//!                     fetch    ▼    │ stream done     │ connect
//!                            QueryOpen                ▼
//!                                                  Connected
//!
//! any state ──tear_down / drop──▶ IsolateTornDown
//! ```
//!
//! `QueryOpen` is the lifetime of a [`RowStream`]: it borrows the session,
//! so `close`, `delete_database` and `tear_down` (which take `&mut self`)
//! cannot run while a query is open.

use crate::config::SessionConfig;
use crate::connection::{self, ConnectArgs};
use crate::isolate::Isolate;
use crate::native::{NativeApi, NativeLibrary};
use crate::statement;
use crate::stream::{self, RowStream};
use crate::types::{ConnectionHandle, H2gisError, Result, Row};
use tracing::{debug, warn};

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Isolate up, never connected
    IsolateCreated,
    /// Connection open
    Connected,
    /// Connection closed (or deleted), isolate still up
    Closed,
    /// Terminal
    IsolateTornDown,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsolateCreated => "isolate_created",
            Self::Connected => "connected",
            Self::Closed => "closed",
            Self::IsolateTornDown => "isolate_torn_down",
        }
    }
}

/// One isolate and at most one open connection.
///
/// Not `Send`: every call must come from the thread that created the
/// session. Dropping the session closes the connection (it never deletes
/// the database) and tears the isolate down.
pub struct Session<N: NativeApi = NativeLibrary> {
    isolate: Isolate<N>,
    connection: Option<ConnectionHandle>,
    connected_once: bool,
    load_on_connect: bool,
}

impl Session<NativeLibrary> {
    /// Load the library named by `config` and create the isolate.
    pub fn open(config: &SessionConfig) -> Result<Self> {
        let native = NativeLibrary::open(&config.lib_path)?;
        let mut session = Session::new(native)?;
        session.load_on_connect = config.load_spatial_functions;
        Ok(session)
    }

    /// [`Session::open`] followed by a connect with the configured credentials.
    pub fn open_database(config: &SessionConfig, db_path: &str) -> Result<Self> {
        let mut session = Self::open(config)?;
        session.connect(db_path, &config.username, &config.password)?;
        Ok(session)
    }
}

impl<N: NativeApi> Session<N> {
    /// Create the isolate on an already-loaded library.
    pub fn new(native: N) -> Result<Self> {
        Ok(Self {
            isolate: Isolate::create(native)?,
            connection: None,
            connected_once: false,
            load_on_connect: false,
        })
    }

    /// Register spatial functions automatically after each connect.
    pub fn set_load_on_connect(&mut self, enabled: bool) {
        self.load_on_connect = enabled;
    }

    pub fn state(&self) -> SessionState {
        if !self.isolate.is_live() {
            SessionState::IsolateTornDown
        } else if self.connection.is_some() {
            SessionState::Connected
        } else if self.connected_once {
            SessionState::Closed
        } else {
            SessionState::IsolateCreated
        }
    }

    pub fn connection_handle(&self) -> Option<ConnectionHandle> {
        self.connection
    }

    /// Open a connection, closing any previous one first.
    ///
    /// Arguments are validated before the previous connection is touched,
    /// so an `InvalidArgument` error leaves it open.
    ///
    /// # Arguments
    ///
    /// * `path` - H2 database path
    /// * `user` - Database user
    /// * `password` - Database password
    pub fn connect(&mut self, path: &str, user: &str, password: &str) -> Result<()> {
        let args = ConnectArgs::encode(path, user, password)?;
        self.isolate.thread()?;
        if self.connection.is_some() {
            debug!("closing previous connection before reconnecting");
            connection::close(&self.isolate, &mut self.connection);
        }

        let handle = connection::connect_with(&self.isolate, &args)?;
        self.connection = Some(handle);
        self.connected_once = true;

        if self.load_on_connect {
            if let Err(e) = connection::load_spatial_functions(&self.isolate, handle) {
                connection::close(&self.isolate, &mut self.connection);
                return Err(e);
            }
        }
        Ok(())
    }

    fn require_connection(&self) -> Result<ConnectionHandle> {
        self.isolate.thread()?;
        self.connection
            .ok_or_else(|| H2gisError::Connection("no open connection".to_string()))
    }

    /// Run a non-query statement; returns affected rows.
    pub fn execute(&self, sql: &str) -> Result<i32> {
        statement::execute(&self.isolate, self.require_connection()?, sql)
    }

    pub fn commit(&self) -> Result<i32> {
        self.execute("COMMIT;")
    }

    pub fn rollback(&self) -> Result<i32> {
        self.execute("ROLLBACK;")
    }

    /// Run a query and collect every row.
    pub fn fetch(&self, sql: &str) -> Result<Vec<Row>> {
        self.fetch_stream(sql)?.collect_rows()
    }

    /// Run a query and stream its rows lazily.
    pub fn fetch_stream(&self, sql: &str) -> Result<RowStream<'_, N>> {
        stream::fetch(&self.isolate, self.require_connection()?, sql)
    }

    /// Register the H2GIS spatial functions on the open connection.
    pub fn load_spatial_functions(&self) -> Result<()> {
        connection::load_spatial_functions(&self.isolate, self.require_connection()?)
    }

    /// `true` if a trivial query round-trips. Never fails.
    pub fn ping(&self) -> bool {
        if !self.isolate.is_live() {
            return false;
        }
        connection::ping(&self.isolate, self.connection)
    }

    /// A connection is held and answers [`Session::ping`].
    pub fn is_connected(&self) -> bool {
        self.connection.is_some() && self.ping()
    }

    /// Close the connection if one is open. Safe to repeat.
    pub fn close(&mut self) {
        connection::close(&self.isolate, &mut self.connection);
    }

    /// Delete the database files and close the connection. Irreversible.
    pub fn delete_database(&mut self) -> Result<()> {
        if self.connection.is_none() {
            return Ok(());
        }
        connection::delete_database_and_close(&self.isolate, &mut self.connection)
    }

    /// Close the connection and tear the isolate down. Never fails; safe to
    /// repeat from any state.
    pub fn tear_down(&mut self) {
        if !self.isolate.is_live() {
            if self.connection.take().is_some() {
                warn!("dropping connection handle of a torn-down isolate");
            }
            return;
        }
        self.close();
        self.isolate.tear_down();
    }
}

impl<N: NativeApi> Drop for Session<N> {
    fn drop(&mut self) {
        self.tear_down();
    }
}
