//! End-to-end tests against a real H2GIS native library.
//!
//! Skipped unless `H2GIS_LIB_PATH` points at a built `h2gis.so`.

use h2gis_native::{H2gisError, Session, SessionConfig, SessionState};
use serde_json::json;
use std::path::PathBuf;
use tempfile::tempdir;

fn library() -> Option<PathBuf> {
    let path = PathBuf::from(std::env::var("H2GIS_LIB_PATH").ok()?);
    if path.exists() {
        Some(path)
    } else {
        eprintln!("H2GIS_LIB_PATH={} does not exist, skipping", path.display());
        None
    }
}

fn session() -> Option<Session> {
    let lib = library()?;
    let config = SessionConfig::default().with_lib_path(&lib.to_string_lossy());
    Some(Session::open(&config).expect("isolate creation"))
}

#[test]
fn test_create_insert_select() {
    let Some(mut session) = session() else { return };
    let dir = tempdir().unwrap();
    let db = dir.path().join("scenario");

    session.connect(&db.to_string_lossy(), "sa", "sa").unwrap();
    assert_eq!(session.execute("CREATE TABLE T(id INT PRIMARY KEY);").unwrap(), 0);
    assert_eq!(session.execute("INSERT INTO T VALUES(1);").unwrap(), 1);

    let rows = session.fetch("SELECT * FROM T;").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("ID"), Some(&json!(1)));

    session.delete_database().unwrap();
}

#[test]
fn test_missing_table_reports_table() {
    let Some(mut session) = session() else { return };
    let dir = tempdir().unwrap();
    session
        .connect(&dir.path().join("missing").to_string_lossy(), "sa", "sa")
        .unwrap();

    let err = session.fetch("SELECT * FROM NOT_THERE;").unwrap_err();
    assert!(
        matches!(err, H2gisError::QueryExecution(_) | H2gisError::Query(_)),
        "unexpected {err}"
    );
    assert!(err.to_string().to_uppercase().contains("NOT_THERE"));

    // the connection survives a failed query
    assert!(session.ping());
}

#[test]
fn test_ping_after_close() {
    let Some(mut session) = session() else { return };
    let dir = tempdir().unwrap();
    session
        .connect(&dir.path().join("ping").to_string_lossy(), "sa", "sa")
        .unwrap();
    assert!(session.is_connected());

    session.close();
    session.close();
    assert!(!session.ping());
    assert_eq!(session.state(), SessionState::Closed);

    session.tear_down();
    session.tear_down();
    assert_eq!(session.state(), SessionState::IsolateTornDown);
}

#[test]
fn test_missing_library() {
    let config = SessionConfig::default().with_lib_path("/nonexistent/h2gis.so");
    let err = Session::open(&config).err().unwrap();
    assert!(matches!(err, H2gisError::Library(_)));
    assert!(!err.is_recoverable());
}
