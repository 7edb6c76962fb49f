//! # Database Store
//!
//! SQLite connection pool, migrations and the user repository.

// region: --- Modules
pub mod models;
pub mod user_repository;
// endregion: --- Modules

// region: --- Re-exports
pub use models::{User, UserForCreate};
pub use user_repository::UserRepository;
// endregion: --- Re-exports

// region: --- Types and Functions
use crate::error::Result;
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::path::Path;
use tracing::info;

/// Type alias for SQLite connection pool.
pub type DbPool = SqlitePool;

/// Create a SQLite connection pool, creating the database file (and its
/// parent directory) if missing.
///
/// An in-memory URL gets a single-connection pool: every SQLite `:memory:`
/// connection is its own database.
pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let in_memory = is_memory_url(database_url);

    if let Some(db_path) = database_url.strip_prefix("sqlite:") {
        let db_path = db_path.trim_start_matches("//");
        if !in_memory {
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        crate::AppError::Config(format!("cannot create {}: {e}", parent.display()))
                    })?;
                    info!("Created database directory: {:?}", parent);
                }
            }
        }
    }

    let options = database_url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true);

    let mut pool_options = SqlitePoolOptions::new();
    if in_memory {
        pool_options = pool_options.max_connections(1);
    }
    let pool = pool_options.connect_with(options).await?;

    Ok(pool)
}

fn is_memory_url(database_url: &str) -> bool {
    database_url
        .strip_prefix("sqlite:")
        .map(|rest| rest.trim_start_matches("//").starts_with(":memory:"))
        .unwrap_or(false)
}

/// Apply every migration found in `migrations_path`.
pub async fn run_migrations(pool: &DbPool, migrations_path: impl AsRef<Path>) -> Result<()> {
    let migrator = Migrator::new(migrations_path.as_ref()).await?;
    migrator.run(pool).await?;
    Ok(())
}
// endregion: --- Types and Functions
