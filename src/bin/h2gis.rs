//! H2GIS CLI
//!
//! Runs SQL against an H2GIS database through the native library.

use clap::{Parser, Subcommand};
use h2gis_native::config::{resolve_library_path, SessionConfig, DEFAULT_USER};
use h2gis_native::otel::init_logging;
use h2gis_native::Session;
use std::path::PathBuf;

/// H2GIS CLI - spatial SQL through the GraalVM native image
#[derive(Parser)]
#[command(name = "h2gis")]
#[command(about = "Run SQL against an H2GIS database via the native library", long_about = None)]
#[command(version)]
struct Cli {
    /// Native library path (overrides H2GIS_LIB_PATH)
    #[arg(long, env = "H2GIS_LIB_PATH")]
    lib: Option<String>,

    /// JSON config file (lib_path, username, password, load_spatial_functions)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database path
    #[arg(long, env = "H2GIS_DB_PATH")]
    db: String,

    /// Database user
    #[arg(long, env = "H2GIS_USER")]
    user: Option<String>,

    /// Database password
    #[arg(long, env = "H2GIS_PASSWORD")]
    password: Option<String>,

    /// Register spatial functions after connecting
    #[arg(long)]
    spatial: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a statement and print the affected row count
    Execute {
        /// SQL statement
        sql: String,
    },

    /// Run a query and print rows as JSON
    Query {
        /// SQL query string
        sql: String,

        /// One JSON object per line instead of a pretty array
        #[arg(long)]
        jsonl: bool,
    },

    /// Check the database answers
    Ping,

    /// Drop all objects and delete the database files
    DeleteDatabase {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> anyhow::Result<()> {
    init_logging("warn");
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SessionConfig::from_file(path)?,
        None => SessionConfig::default(),
    };
    if let Some(lib) = cli.lib.as_deref() {
        config.lib_path = resolve_library_path(Some(lib));
    }
    if let Some(user) = cli.user.clone() {
        config.username = user;
    }
    if let Some(password) = cli.password.clone() {
        config.password = password;
    }
    if config.username.is_empty() {
        config.username = DEFAULT_USER.to_string();
    }
    config.load_spatial_functions |= cli.spatial;

    if let Commands::DeleteDatabase { yes: false } = cli.command {
        anyhow::bail!("Refusing to delete {} without --yes", cli.db);
    }

    let mut session = Session::open_database(&config, &cli.db)?;

    match cli.command {
        Commands::Execute { sql } => {
            let affected = session.execute(&sql)?;
            println!("{}", affected);
        }
        Commands::Query { sql, jsonl } => {
            if jsonl {
                for row in session.fetch_stream(&sql)? {
                    println!("{}", serde_json::to_string(&row?)?);
                }
            } else {
                let rows = session.fetch(&sql)?;
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
        }
        Commands::Ping => {
            if session.ping() {
                println!("✓ {} is reachable", cli.db);
            } else {
                anyhow::bail!("{} did not answer", cli.db);
            }
        }
        Commands::DeleteDatabase { .. } => {
            session.delete_database()?;
            println!("✓ Deleted {}", cli.db);
        }
    }

    session.tear_down();
    Ok(())
}
