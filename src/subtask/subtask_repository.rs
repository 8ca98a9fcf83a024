use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, Transaction};
use uuid::Uuid;

use super::subtask_models::Subtask;
use crate::{db::DbPool, error::Result};

/// Column changes for one subtask; `None` leaves the column alone.
#[derive(Debug, Clone, Default)]
pub struct SubtaskChanges {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub position: Option<i64>,
}

#[derive(Clone)]
pub struct SubtaskRepository {
    pool: DbPool,
}

impl SubtaskRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_todo(&self, todo_id: Uuid) -> Result<Vec<Subtask>> {
        let subtasks = sqlx::query_as::<_, Subtask>(
            "SELECT * FROM subtasks WHERE todo_id = $1 ORDER BY position ASC, created_at ASC",
        )
        .bind(todo_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subtasks)
    }

    pub async fn find_by_todo_ids(&self, todo_ids: &[Uuid]) -> Result<Vec<Subtask>> {
        if todo_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM subtasks WHERE todo_id IN (");
        let mut separated = query.separated(", ");
        for id in todo_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY position ASC, created_at ASC");

        let subtasks = query
            .build_query_as::<Subtask>()
            .fetch_all(&self.pool)
            .await?;
        Ok(subtasks)
    }

    pub async fn find_by_id(&self, id: Uuid, todo_id: Uuid) -> Result<Option<Subtask>> {
        let subtask =
            sqlx::query_as::<_, Subtask>("SELECT * FROM subtasks WHERE id = $1 AND todo_id = $2")
                .bind(id)
                .bind(todo_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(subtask)
    }

    pub async fn create(
        &self,
        todo_id: Uuid,
        title: &str,
        position: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Subtask> {
        insert(&self.pool, todo_id, title, position, now).await
    }

    pub async fn create_with_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        todo_id: Uuid,
        title: &str,
        position: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Subtask> {
        insert(&mut **tx, todo_id, title, position, now).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        todo_id: Uuid,
        changes: &SubtaskChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Subtask>> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE subtasks SET updated_at = ");
        query.push_bind(now);

        if let Some(title) = &changes.title {
            query.push(", title = ").push_bind(title.clone());
        }
        if let Some(completed) = changes.completed {
            query.push(", completed = ").push_bind(completed);
        }
        if let Some(position) = changes.position {
            query.push(", position = ").push_bind(position);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND todo_id = ")
            .push_bind(todo_id)
            .push(" RETURNING *");

        let subtask = query
            .build_query_as::<Subtask>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(subtask)
    }

    pub async fn delete(&self, id: Uuid, todo_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM subtasks WHERE id = $1 AND todo_id = $2")
            .bind(id)
            .bind(todo_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Without an explicit position the subtask goes after the current last one.
async fn insert<'e, E>(
    executor: E,
    todo_id: Uuid,
    title: &str,
    position: Option<i64>,
    now: DateTime<Utc>,
) -> Result<Subtask>
where
    E: SqliteExecutor<'e>,
{
    let subtask = sqlx::query_as::<_, Subtask>(
        "INSERT INTO subtasks (id, todo_id, title, completed, position, created_at, updated_at)
         VALUES ($1, $2, $3, 0,
                 COALESCE($4, (SELECT COALESCE(MAX(position) + 1, 0) FROM subtasks WHERE todo_id = $2)),
                 $5, $5)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(todo_id)
    .bind(title)
    .bind(position)
    .bind(now)
    .fetch_one(executor)
    .await?;
    Ok(subtask)
}
