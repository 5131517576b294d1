use std::{str::FromStr, time::Duration};

use sqlx::{
    migrate::MigrateError,
    sqlite::{
        SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions,
        SqliteSynchronous,
    },
    SqlitePool,
};
use thiserror::Error;

use glossary_core::types::{NewTerm, Term, TermUpdate};

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens a pool for the provided connection string, creating the database
    /// file when it does not exist yet.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StorageError::Connect)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle to operate on glossary terms.
    pub fn terms(&self) -> TermRepository {
        TermRepository {
            pool: self.pool.clone(),
        }
    }

    /// Issues a trivial query to confirm the store is reachable.
    pub async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Waits for checked-out connections to return and closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository responsible for the `terms` table.
///
/// Every method checks out one pooled connection and runs all of its
/// statements on it. The connection goes back to the pool when the guard is
/// dropped, whichever way the method returns.
#[derive(Clone)]
pub struct TermRepository {
    pool: SqlitePool,
}

impl TermRepository {
    /// Lists every term in insertion order.
    pub async fn list(&self) -> Result<Vec<Term>, TermError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, TermRow>(
            "SELECT id, name, description FROM terms ORDER BY id ASC",
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(TermRow::into_domain).collect())
    }

    /// Loads a single term by its unique name.
    pub async fn fetch_by_name(&self, name: &str) -> Result<Term, TermError> {
        let mut conn = self.pool.acquire().await?;
        find_by_name(&mut conn, name)
            .await?
            .ok_or(TermError::NotFound)
    }

    /// Creates a term, rejecting names that are already taken.
    ///
    /// The existence check and the insert are not wrapped in a transaction.
    /// Two creates racing on the same name are settled by the `UNIQUE`
    /// constraint, and the loser sees [`TermError::Duplicate`].
    pub async fn create(&self, term: &NewTerm) -> Result<Term, TermError> {
        let mut conn = self.pool.acquire().await?;
        if find_by_name(&mut conn, &term.name).await?.is_some() {
            return Err(TermError::Duplicate);
        }
        insert(&mut conn, term).await
    }

    /// Replaces the description of the named term and returns the stored row.
    pub async fn update_description(
        &self,
        name: &str,
        update: &TermUpdate,
    ) -> Result<Term, TermError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, TermRow>(
            "UPDATE terms SET description = ? WHERE name = ? \
             RETURNING id, name, description",
        )
        .bind(&update.description)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(TermRow::into_domain).ok_or(TermError::NotFound)
    }

    /// Permanently removes the named term.
    pub async fn delete(&self, name: &str) -> Result<(), TermError> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query("DELETE FROM terms WHERE name = ?")
            .bind(name)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TermError::NotFound);
        }
        Ok(())
    }

    /// Counts stored terms.
    pub async fn count(&self) -> Result<u64, TermError> {
        let mut conn = self.pool.acquire().await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM terms")
            .fetch_one(&mut *conn)
            .await?;
        Ok(count as u64)
    }
}

async fn find_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<Term>, TermError> {
    let row = sqlx::query_as::<_, TermRow>(
        "SELECT id, name, description FROM terms WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(TermRow::into_domain))
}

async fn insert(conn: &mut SqliteConnection, term: &NewTerm) -> Result<Term, TermError> {
    let row = sqlx::query_as::<_, TermRow>(
        "INSERT INTO terms (name, description) VALUES (?, ?) \
         RETURNING id, name, description",
    )
    .bind(&term.name)
    .bind(&term.description)
    .fetch_one(conn)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some(SQLITE_CONSTRAINT_UNIQUE) {
                TermError::Duplicate
            } else {
                TermError::Database(sqlx::Error::Database(db_err))
            }
        }
        other => TermError::Database(other),
    })?;

    Ok(row.into_domain())
}

/// Raw row shape of the `terms` table.
#[derive(Debug, sqlx::FromRow)]
pub struct TermRow {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl TermRow {
    /// Converts the database row into the domain term.
    pub fn into_domain(self) -> Term {
        Term {
            id: self.id,
            name: self.name,
            description: self.description,
        }
    }
}

/// Errors that can occur while reading or mutating terms.
#[derive(Debug, Error)]
pub enum TermError {
    #[error("term not found")]
    NotFound,
    #[error("term with the same name already exists")]
    Duplicate,
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for TermError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> Database {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect");
        db.run_migrations().await.expect("migrations");
        db
    }

    fn new_term(name: &str, description: &str) -> NewTerm {
        NewTerm {
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    #[tokio::test]
    async fn migrations_apply() {
        let db = setup_db().await;

        let tables: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'terms'",
        )
        .fetch_one(db.pool())
        .await
        .expect("fetch tables");
        assert_eq!(tables.0, 1, "expected terms table to be created");
    }

    #[tokio::test]
    async fn create_then_fetch_returns_same_term() {
        let db = setup_db().await;
        let repo = db.terms();

        let created = repo
            .create(&new_term("latency", "time to respond"))
            .await
            .expect("create");
        assert!(created.id > 0);

        let fetched = repo.fetch_by_name("latency").await.expect("fetch");
        assert_eq!(fetched, created);
        assert_eq!(fetched.description, "time to respond");
    }

    #[tokio::test]
    async fn create_rejects_duplicate_and_keeps_original() {
        let db = setup_db().await;
        let repo = db.terms();

        let original = repo
            .create(&new_term("latency", "time to respond"))
            .await
            .expect("create");
        let err = repo
            .create(&new_term("latency", "something else"))
            .await
            .unwrap_err();
        assert!(matches!(err, TermError::Duplicate));

        let stored = repo.fetch_by_name("latency").await.expect("fetch");
        assert_eq!(stored, original);
        assert_eq!(repo.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn unique_constraint_maps_to_duplicate() {
        let db = setup_db().await;
        db.terms()
            .create(&new_term("jitter", "variance"))
            .await
            .expect("create");

        let mut conn = db.pool().acquire().await.expect("acquire");
        let err = insert(&mut conn, &new_term("jitter", "bypassed check"))
            .await
            .unwrap_err();
        assert!(matches!(err, TermError::Duplicate));
    }

    #[tokio::test]
    async fn missing_term_is_not_found_for_every_operation() {
        let db = setup_db().await;
        let repo = db.terms();
        repo.create(&new_term("kept", "untouched"))
            .await
            .expect("create");

        assert!(matches!(
            repo.fetch_by_name("ghost").await,
            Err(TermError::NotFound)
        ));
        let update = TermUpdate {
            description: "nope".into(),
        };
        assert!(matches!(
            repo.update_description("ghost", &update).await,
            Err(TermError::NotFound)
        ));
        assert!(matches!(repo.delete("ghost").await, Err(TermError::NotFound)));

        let terms = repo.list().await.expect("list");
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].description, "untouched");
    }

    #[tokio::test]
    async fn update_changes_only_description() {
        let db = setup_db().await;
        let repo = db.terms();
        let created = repo
            .create(&new_term("latency", "time to respond"))
            .await
            .expect("create");

        let updated = repo
            .update_description(
                "latency",
                &TermUpdate {
                    description: "response delay".into(),
                },
            )
            .await
            .expect("update");

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.description, "response delay");
    }

    #[tokio::test]
    async fn delete_removes_from_fetch_and_list() {
        let db = setup_db().await;
        let repo = db.terms();
        repo.create(&new_term("a", "first")).await.expect("create a");
        repo.create(&new_term("b", "second")).await.expect("create b");

        repo.delete("a").await.expect("delete");

        assert!(matches!(
            repo.fetch_by_name("a").await,
            Err(TermError::NotFound)
        ));
        let names: Vec<String> = repo
            .list()
            .await
            .expect("list")
            .into_iter()
            .map(|term| term.name)
            .collect();
        assert_eq!(names, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn list_is_empty_on_fresh_store() {
        let db = setup_db().await;
        assert!(db.terms().list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn file_store_persists_across_reconnect() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("glossary.db");
        let url = format!("sqlite://{}", path.display());

        let db = Database::connect(&url).await.expect("connect");
        db.run_migrations().await.expect("migrations");
        let created = db
            .terms()
            .create(&new_term("throughput", "work per unit time"))
            .await
            .expect("create");
        db.close().await;

        let reopened = Database::connect(&url).await.expect("reconnect");
        reopened.run_migrations().await.expect("migrations are idempotent");
        let fetched = reopened
            .terms()
            .fetch_by_name("throughput")
            .await
            .expect("fetch");
        assert_eq!(fetched, created);
        reopened.ping().await.expect("ping");
    }
}
