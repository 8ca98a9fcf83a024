use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, Transaction};
use uuid::Uuid;

use super::tag_models::{Tag, TagLink};
use crate::{
    db::DbPool,
    error::{AppError, Result},
};

/// Join tables linking tags to their owners.
#[derive(Debug, Clone, Copy)]
pub enum TagOwner {
    Todo,
    Template,
}

impl TagOwner {
    fn table(self) -> &'static str {
        match self {
            TagOwner::Todo => "todo_tags",
            TagOwner::Template => "template_tags",
        }
    }

    fn column(self) -> &'static str {
        match self {
            TagOwner::Todo => "todo_id",
            TagOwner::Template => "template_id",
        }
    }
}

#[derive(Clone)]
pub struct TagRepository {
    pool: DbPool,
}

impl TagRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self, user_id: Uuid) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT * FROM tags WHERE user_id = $1 ORDER BY name COLLATE NOCASE ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    pub async fn find_by_id(&self, id: Uuid, user_id: Uuid) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tag)
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        name: &str,
        color: &str,
        now: DateTime<Utc>,
    ) -> Result<Tag> {
        sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (id, user_id, name, color, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .bind(color)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(duplicate_name)
    }

    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<Option<Tag>> {
        if name.is_none() && color.is_none() {
            return self.find_by_id(id, user_id).await;
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE tags SET ");
        let mut assignments = query.separated(", ");
        if let Some(name) = name {
            assignments.push("name = ").push_bind_unseparated(name.to_string());
        }
        if let Some(color) = color {
            assignments.push("color = ").push_bind_unseparated(color.to_string());
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND user_id = ")
            .push_bind(user_id)
            .push(" RETURNING *");

        query
            .build_query_as::<Tag>()
            .fetch_optional(&self.pool)
            .await
            .map_err(duplicate_name)
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Deduplicates `ids` and checks that every one of them belongs to the user.
    pub async fn verify_owned(&self, user_id: Uuid, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let unique: Vec<Uuid> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if unique.is_empty() {
            return Ok(unique);
        }

        let mut query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tags WHERE user_id = ");
        query.push_bind(user_id).push(" AND id IN (");
        let mut separated = query.separated(", ");
        for id in &unique {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let owned = query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        if owned != unique.len() as i64 {
            return Err(AppError::BadRequest("One or more tags not found".into()));
        }
        Ok(unique)
    }

    /// Tags attached to each of `owner_ids`, ordered by name.
    pub async fn find_links(&self, owner: TagOwner, owner_ids: &[Uuid]) -> Result<Vec<TagLink>> {
        if owner_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT l.{column} AS owner_id, g.* FROM {table} l \
             JOIN tags g ON g.id = l.tag_id WHERE l.{column} IN (",
            column = owner.column(),
            table = owner.table(),
        ));
        let mut separated = query.separated(", ");
        for id in owner_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY g.name COLLATE NOCASE ASC");

        let links = query
            .build_query_as::<TagLink>()
            .fetch_all(&self.pool)
            .await?;
        Ok(links)
    }

    pub async fn tag_ids_with_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        owner: TagOwner,
        owner_id: Uuid,
    ) -> Result<Vec<Uuid>> {
        let sql = format!(
            "SELECT tag_id FROM {} WHERE {} = $1",
            owner.table(),
            owner.column()
        );
        let ids = sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(owner_id)
            .fetch_all(&mut **tx)
            .await?;
        Ok(ids)
    }

    /// Replaces the owner's tag set.
    pub async fn set_links_with_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        owner: TagOwner,
        owner_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<()> {
        clear_links(&mut **tx, owner, owner_id).await?;

        if tag_ids.is_empty() {
            return Ok(());
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "INSERT OR IGNORE INTO {} ({}, tag_id) ",
            owner.table(),
            owner.column()
        ));
        query.push_values(tag_ids, |mut row, tag_id| {
            row.push_bind(owner_id).push_bind(*tag_id);
        });
        query.build().execute(&mut **tx).await?;
        Ok(())
    }
}

async fn clear_links<'e, E>(executor: E, owner: TagOwner, owner_id: Uuid) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("DELETE FROM {} WHERE {} = $1", owner.table(), owner.column());
    sqlx::query(&sql).bind(owner_id).execute(executor).await?;
    Ok(())
}

fn duplicate_name(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::BadRequest("A tag with this name already exists".into())
        }
        _ => AppError::Database(err),
    }
}
