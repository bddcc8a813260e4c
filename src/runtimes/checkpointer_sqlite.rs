/*!
SQLite Checkpointer

Async implementation of the [`Checkpointer`] trait backed by SQLite via
`sqlx` (runtime queries, no compile-time schema checking).

## Behavior

- The schema is created on connect with `CREATE TABLE IF NOT EXISTS`, so
  no external migration step is required.
- `save` is an upsert keyed on `instance_id`: state and `updated_at` are
  replaced, `created_at` is preserved.
- State is encoded through the persistence models (see
  [`super::persistence`]); this module stays focused on database I/O.

## Database Schema

- `workflow_instances.instance_id` ← `WorkflowInstance.instance_id` (PK)
- `workflow_instances.state_json`  ← serialized [`PersistedState`]
- `workflow_instances.current_step`
- `workflow_instances.created_at` / `updated_at` (RFC3339 strings)
*/

use std::sync::Arc;

use miette::Diagnostic;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use thiserror::Error;
use tracing::instrument;

use crate::runtimes::checkpointer::{
    Checkpointer, CheckpointerError, Result, WorkflowInstance,
};
use crate::runtimes::persistence::{PersistedInstance, PersistedState, PersistenceError};

#[derive(Debug, Error, Diagnostic)]
pub enum SqliteCheckpointerError {
    #[error("SQLx error: {0}")]
    #[diagnostic(
        code(stateloom::sqlite::sqlx),
        help("Ensure the SQLite database URL is valid and accessible.")
    )]
    Sqlx(#[from] sqlx::Error),

    #[error("persistence error: {0}")]
    #[diagnostic(
        code(stateloom::sqlite::persistence),
        help("Check serialized shapes against the Persisted* models.")
    )]
    Persistence(#[from] PersistenceError),
}

impl From<SqliteCheckpointerError> for CheckpointerError {
    fn from(e: SqliteCheckpointerError) -> Self {
        match e {
            SqliteCheckpointerError::Sqlx(err) => CheckpointerError::Backend {
                message: err.to_string(),
            },
            SqliteCheckpointerError::Persistence(err) => CheckpointerError::Corrupt {
                message: err.to_string(),
            },
        }
    }
}

/// Durable SQLite-backed checkpointer.
///
/// Stores one row per workflow instance; re-saving replaces the row in
/// place, so storage grows with the number of instances rather than the
/// number of runs.
pub struct SqliteCheckpointer {
    pool: Arc<SqlitePool>,
}

impl std::fmt::Debug for SqliteCheckpointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCheckpointer").finish()
    }
}

impl SqliteCheckpointer {
    /// Connect (or create) a SQLite database at `database_url` and ensure
    /// the schema exists. Example URL: `sqlite://stateloom.db?mode=rwc`.
    #[must_use = "checkpointer must be used to persist state"]
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> std::result::Result<Self, CheckpointerError> {
        // A single connection keeps in-memory databases coherent and is
        // plenty for the sequential executor.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .map_err(|e| CheckpointerError::Backend {
                message: format!("connect error: {e}"),
            })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflow_instances (
                instance_id  TEXT PRIMARY KEY,
                state_json   TEXT NOT NULL,
                current_step INTEGER NOT NULL,
                created_at   TEXT NOT NULL,
                updated_at   TEXT NOT NULL
            )
        "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| CheckpointerError::Backend {
            message: format!("schema error: {e}"),
        })?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    fn row_to_instance(row: &SqliteRow) -> std::result::Result<WorkflowInstance, SqliteCheckpointerError> {
        let state_json: String = row.try_get("state_json")?;
        let persisted = PersistedInstance {
            instance_id: row.try_get("instance_id")?,
            state: PersistedState::from_json_str(&state_json)?,
            current_step: row.try_get::<i64, _>("current_step")? as u64,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        };
        Ok(WorkflowInstance::try_from(persisted)?)
    }
}

#[async_trait::async_trait]
impl Checkpointer for SqliteCheckpointer {
    #[instrument(skip(self, instance), err)]
    async fn save(&self, instance: WorkflowInstance) -> Result<()> {
        let persisted = PersistedInstance::from(&instance);
        let state_json = persisted
            .state
            .to_json_string()
            .map_err(SqliteCheckpointerError::from)?;

        // Upsert keyed on instance_id; created_at is only written on insert.
        sqlx::query(
            r#"
            INSERT INTO workflow_instances (
                instance_id, state_json, current_step, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(instance_id) DO UPDATE SET
                state_json   = excluded.state_json,
                current_step = excluded.current_step,
                updated_at   = excluded.updated_at
        "#,
        )
        .bind(&persisted.instance_id)
        .bind(&state_json)
        .bind(persisted.current_step as i64)
        .bind(&persisted.created_at)
        .bind(&persisted.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| CheckpointerError::Backend {
            message: format!("save instance: {e}"),
        })?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn load(&self, instance_id: &str) -> Result<Option<WorkflowInstance>> {
        let row = sqlx::query(
            r#"
            SELECT instance_id, state_json, current_step, created_at, updated_at
            FROM workflow_instances
            WHERE instance_id = ?1
        "#,
        )
        .bind(instance_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| CheckpointerError::Backend {
            message: format!("load instance: {e}"),
        })?;

        match row {
            Some(row) => Ok(Some(
                Self::row_to_instance(&row).map_err(CheckpointerError::from)?,
            )),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), err)]
    async fn list_instances(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT instance_id FROM workflow_instances ORDER BY instance_id
        "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| CheckpointerError::Backend {
            message: format!("list instances: {e}"),
        })?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("instance_id")
                    .map_err(|e| CheckpointerError::Backend {
                        message: format!("read instance_id: {e}"),
                    })
            })
            .collect()
    }
}
