pub mod models;
pub mod operations;
pub mod schema;

use anyhow::{Context, Result, anyhow};
use diesel::Connection;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
pub use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::{debug, info};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub type SqlitePool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type PooledSqliteConnection = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

/// SQLite leaves foreign keys off unless every connection opts in, so the
/// cascade/set-null rules in the schema only hold with this pragma applied.
#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(r2d2::Error::QueryError)
    }
}

/// Open a single connection with the pragmas applied. Used by the test
/// suite against `:memory:` databases; the CLI goes through the pool.
pub fn establish(database_url: &str) -> Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(database_url)
        .with_context(|| format!("failed to open database at {}", database_url))?;
    conn.batch_execute("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}

pub fn build_pool(database_url: &str, max_size: u32) -> Result<SqlitePool> {
    debug!("Building connection pool for {}", database_url);
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(ConnectionPragmas))
        .build(manager)
        .with_context(|| format!("failed to build connection pool for {}", database_url))?;
    Ok(pool)
}

/// Apply any pending embedded migrations. Safe to call repeatedly: applied
/// migrations are tracked and skipped, and the DDL itself uses IF NOT EXISTS.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!("failed to run migrations: {}", e))?;
    if applied.is_empty() {
        debug!("All migrations already applied, nothing to do");
    }
    for version in &applied {
        info!("Applied migration: {}", version);
    }
    Ok(())
}

/// Build a pool from `database_url` and bring the schema up to date.
pub fn init_database(database_url: &str, max_size: u32) -> Result<SqlitePool> {
    let pool = build_pool(database_url, max_size)?;
    let mut conn = pool.get()?;
    run_migrations(&mut conn)?;
    Ok(pool)
}
