use std::ops::Range;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, Transaction};
use uuid::Uuid;

use super::todo_dto::TodoPatch;
use super::todo_models::{NewTodo, Priority, PriorityCounts, Todo};
use crate::{db::DbPool, error::Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Incomplete,
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DueFilter {
    #[default]
    Any,
    /// Incomplete and due before the given instant.
    Overdue(DateTime<Utc>),
    Within(Range<DateTime<Utc>>),
    NoDueDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    CreatedAt,
    DueDate,
    Priority,
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TodoFilters {
    pub status: StatusFilter,
    pub priorities: Vec<Priority>,
    pub tag_ids: Vec<Uuid>,
    pub search: Option<String>,
    pub due: DueFilter,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub limit: u32,
    pub offset: u32,
}

impl Default for TodoFilters {
    fn default() -> Self {
        Self {
            status: StatusFilter::default(),
            priorities: Vec::new(),
            tag_ids: Vec::new(),
            search: None,
            due: DueFilter::default(),
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            limit: 50,
            offset: 0,
        }
    }
}

#[derive(Clone)]
pub struct TodoRepository {
    pool: DbPool,
}

impl TodoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// One page of matching todos plus the total match count.
    pub async fn find_all(&self, user_id: Uuid, filters: &TodoFilters) -> Result<(Vec<Todo>, i64)> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM todos t");
        push_filters(&mut count, user_id, filters);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut query = QueryBuilder::<Sqlite>::new("SELECT t.* FROM todos t");
        push_filters(&mut query, user_id, filters);
        push_order(&mut query, filters.sort_by, filters.sort_order);
        query
            .push(" LIMIT ")
            .push_bind(i64::from(filters.limit))
            .push(" OFFSET ")
            .push_bind(i64::from(filters.offset));

        let todos = query
            .build_query_as::<Todo>()
            .fetch_all(&self.pool)
            .await?;

        Ok((todos, total))
    }

    pub async fn find_by_id(&self, id: Uuid, user_id: Uuid) -> Result<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>("SELECT * FROM todos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }

    #[cfg(test)]
    pub async fn create(&self, new: &NewTodo, now: DateTime<Utc>) -> Result<Todo> {
        insert(&self.pool, new, now).await
    }

    pub async fn create_with_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        new: &NewTodo,
        now: DateTime<Utc>,
    ) -> Result<Todo> {
        insert(&mut **tx, new, now).await
    }

    #[cfg(test)]
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: &TodoPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Todo>> {
        apply_patch(&self.pool, id, user_id, patch, now).await
    }

    pub async fn update_with_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        user_id: Uuid,
        patch: &TodoPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Todo>> {
        apply_patch(&mut **tx, id, user_id, patch, now).await
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Incomplete todos that have both a due date and a reminder lead time.
    pub async fn find_reminder_candidates(&self, user_id: Uuid) -> Result<Vec<Todo>> {
        let todos = sqlx::query_as::<_, Todo>(
            "SELECT * FROM todos
             WHERE user_id = $1
               AND completed_at IS NULL
               AND due_date IS NOT NULL
               AND reminder_minutes IS NOT NULL
             ORDER BY due_date ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(todos)
    }

    pub async fn mark_notified(&self, user_id: Uuid, ids: &[Uuid], at: DateTime<Utc>) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE todos SET last_notification_sent = ");
        query
            .push_bind(at)
            .push(" WHERE user_id = ")
            .push_bind(user_id)
            .push(" AND id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Incomplete todos per priority.
    pub async fn priority_counts(&self, user_id: Uuid) -> Result<PriorityCounts> {
        let counts = sqlx::query_as::<_, PriorityCounts>(
            "SELECT
                COALESCE(SUM(CASE WHEN priority = 'high' THEN 1 ELSE 0 END), 0) AS high,
                COALESCE(SUM(CASE WHEN priority = 'medium' THEN 1 ELSE 0 END), 0) AS medium,
                COALESCE(SUM(CASE WHEN priority = 'low' THEN 1 ELSE 0 END), 0) AS low,
                COALESCE(SUM(CASE WHEN priority IS NULL THEN 1 ELSE 0 END), 0) AS none
             FROM todos
             WHERE user_id = $1 AND completed_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }
}

async fn insert<'e, E>(executor: E, new: &NewTodo, now: DateTime<Utc>) -> Result<Todo>
where
    E: SqliteExecutor<'e>,
{
    let todo = sqlx::query_as::<_, Todo>(
        "INSERT INTO todos (id, user_id, title, priority, due_date, recurrence_pattern,
                            reminder_minutes, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(new.user_id)
    .bind(&new.title)
    .bind(new.priority)
    .bind(new.due_date)
    .bind(new.recurrence_pattern)
    .bind(new.reminder_minutes)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(todo)
}

async fn apply_patch<'e, E>(
    executor: E,
    id: Uuid,
    user_id: Uuid,
    patch: &TodoPatch,
    now: DateTime<Utc>,
) -> Result<Option<Todo>>
where
    E: SqliteExecutor<'e>,
{
    let mut query = QueryBuilder::<Sqlite>::new("UPDATE todos SET updated_at = ");
    query.push_bind(now);

    if let Some(title) = &patch.title {
        query.push(", title = ").push_bind(title.clone());
    }
    if let Some(priority) = patch.priority {
        query.push(", priority = ").push_bind(priority);
    }
    if let Some(due_date) = patch.due_date {
        query.push(", due_date = ").push_bind(due_date);
    }
    if let Some(pattern) = patch.recurrence_pattern {
        query.push(", recurrence_pattern = ").push_bind(pattern);
    }
    if let Some(minutes) = patch.reminder_minutes {
        query.push(", reminder_minutes = ").push_bind(minutes);
    }
    if let Some(completed_at) = patch.completed_at {
        query.push(", completed_at = ").push_bind(completed_at);
    }
    if let Some(sent) = patch.last_notification_sent {
        query.push(", last_notification_sent = ").push_bind(sent);
    }

    query
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" AND user_id = ")
        .push_bind(user_id)
        .push(" RETURNING *");

    let todo = query
        .build_query_as::<Todo>()
        .fetch_optional(executor)
        .await?;
    Ok(todo)
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, user_id: Uuid, filters: &TodoFilters) {
    query.push(" WHERE t.user_id = ").push_bind(user_id);

    match filters.status {
        StatusFilter::All => {}
        StatusFilter::Incomplete => {
            query.push(" AND t.completed_at IS NULL");
        }
        StatusFilter::Completed => {
            query.push(" AND t.completed_at IS NOT NULL");
        }
    }

    if !filters.priorities.is_empty() {
        query.push(" AND t.priority IN (");
        let mut separated = query.separated(", ");
        for priority in &filters.priorities {
            separated.push_bind(*priority);
        }
        separated.push_unseparated(")");
    }

    if !filters.tag_ids.is_empty() {
        query.push(
            " AND EXISTS (SELECT 1 FROM todo_tags tt WHERE tt.todo_id = t.id AND tt.tag_id IN (",
        );
        let mut separated = query.separated(", ");
        for tag_id in &filters.tag_ids {
            separated.push_bind(*tag_id);
        }
        separated.push_unseparated("))");
    }

    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
        query
            .push(" AND (LOWER(t.title) LIKE ")
            .push_bind(pattern.clone())
            .push(
                " ESCAPE '\\' OR EXISTS (SELECT 1 FROM todo_tags tt \
                 JOIN tags g ON g.id = tt.tag_id \
                 WHERE tt.todo_id = t.id AND LOWER(g.name) LIKE ",
            )
            .push_bind(pattern)
            .push(" ESCAPE '\\'))");
    }

    match &filters.due {
        DueFilter::Any => {}
        DueFilter::Overdue(now) => {
            query
                .push(" AND t.completed_at IS NULL AND t.due_date IS NOT NULL AND t.due_date < ")
                .push_bind(*now);
        }
        DueFilter::Within(range) => {
            query
                .push(" AND t.due_date >= ")
                .push_bind(range.start)
                .push(" AND t.due_date < ")
                .push_bind(range.end);
        }
        DueFilter::NoDueDate => {
            query.push(" AND t.due_date IS NULL");
        }
    }
}

fn push_order(query: &mut QueryBuilder<'_, Sqlite>, sort_by: SortField, order: SortOrder) {
    let dir = order.as_sql();
    query.push(" ORDER BY ");
    match sort_by {
        SortField::CreatedAt => {
            query.push(format!("t.created_at {dir}"));
        }
        // Undated todos sort last in both directions.
        SortField::DueDate => {
            query.push(format!("t.due_date IS NULL, t.due_date {dir}"));
        }
        SortField::Priority => {
            query.push(format!(
                "CASE t.priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 \
                 WHEN 'low' THEN 2 ELSE 3 END {dir}"
            ));
        }
        SortField::Title => {
            query.push(format!("t.title COLLATE NOCASE {dir}"));
        }
    }
    query.push(", t.created_at DESC, t.id ASC");
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
