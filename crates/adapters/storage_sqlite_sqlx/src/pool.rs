//! Database handle — opens the `SQLite` file behind the automation journal
//! and brings its schema up to date.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;

use crate::error::StorageError;

/// How long a writer waits on a locked database before giving up. The
/// monitors and the HTTP surface share one file.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the journal lives.
pub struct Config {
    /// `SQLite` connection URL, e.g. `sqlite:mistguard.db?mode=rwc` or
    /// `sqlite::memory:` for tests.
    pub database_url: String,
}

impl Config {
    /// Open the database, creating the file on first start, and apply the
    /// embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] for a malformed URL, an unreachable file or
    /// a failing migration.
    pub async fn build(self) -> Result<Database, StorageError> {
        Database::open(&self.database_url).await
    }
}

/// Open database shared by every repository.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn open(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePool::connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!(database_url, "journal database ready");
        Ok(Self { pool })
    }

    /// Pool handed to the repositories.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for in-flight queries, then close every connection. Called once
    /// the background loops have stopped.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory() -> Database {
        Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn should_create_journal_tables() {
        let db = memory().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            r"
            SELECT name FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
              AND name != '_sqlx_migrations'
            ORDER BY name
            ",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|row| row.0.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "bathroom_events",
                "decision_records",
                "device_actions",
                "learned_parameters",
                "measurements",
            ]
        );
    }

    #[tokio::test]
    async fn should_create_missing_file_and_reopen_it() {
        let path = std::env::temp_dir().join(format!("mistguard-{}.db", uuid::Uuid::new_v4()));
        let url = format!("sqlite:{}", path.display());

        let db = Config {
            database_url: url.clone(),
        }
        .build()
        .await
        .unwrap();
        assert!(path.exists());
        db.close().await;

        // Migrations already applied: a second start is a no-op.
        let db = Config { database_url: url }.build().await.unwrap();
        db.close().await;
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn should_close_pool() {
        let db = memory().await;
        db.close().await;
        assert!(db.pool().is_closed());
    }

    #[tokio::test]
    async fn should_fail_when_directory_is_missing() {
        let result = Config {
            database_url: "sqlite:/nonexistent-mistguard-dir/journal.db".to_string(),
        }
        .build()
        .await;
        assert!(matches!(result, Err(StorageError::Database(_))));
    }
}
