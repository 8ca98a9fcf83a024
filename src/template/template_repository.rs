use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, Transaction};
use uuid::Uuid;

use super::template_models::{NewTemplate, TemplateRow};
use crate::{
    db::DbPool,
    error::Result,
    schedule::RecurrencePattern,
    todo::Priority,
};

/// Column changes for one template; outer `None` leaves the column alone.
#[derive(Debug, Clone, Default)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub priority: Option<Option<Priority>>,
    pub recurrence_pattern: Option<Option<RecurrencePattern>>,
    pub reminder_minutes: Option<Option<i64>>,
    pub due_date_offset_days: Option<Option<i64>>,
    pub subtasks_json: Option<Option<String>>,
}

impl TemplatePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.recurrence_pattern.is_none()
            && self.reminder_minutes.is_none()
            && self.due_date_offset_days.is_none()
            && self.subtasks_json.is_none()
    }
}

#[derive(Clone)]
pub struct TemplateRepository {
    pool: DbPool,
}

impl TemplateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self, user_id: Uuid, category: Option<&str>) -> Result<Vec<TemplateRow>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM templates WHERE user_id = ");
        query.push_bind(user_id);
        if let Some(category) = category {
            query.push(" AND category = ").push_bind(category.to_string());
        }
        query.push(" ORDER BY name COLLATE NOCASE ASC");

        let rows = query
            .build_query_as::<TemplateRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn find_by_id(&self, id: Uuid, user_id: Uuid) -> Result<Option<TemplateRow>> {
        let row = sqlx::query_as::<_, TemplateRow>(
            "SELECT * FROM templates WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create_with_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        new: &NewTemplate,
        now: DateTime<Utc>,
    ) -> Result<TemplateRow> {
        let row = sqlx::query_as::<_, TemplateRow>(
            "INSERT INTO templates (id, user_id, name, description, category, priority,
                                    recurrence_pattern, reminder_minutes, due_date_offset_days,
                                    subtasks_json, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.category)
        .bind(new.priority)
        .bind(new.recurrence_pattern)
        .bind(new.reminder_minutes)
        .bind(new.due_date_offset_days)
        .bind(&new.subtasks_json)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;
        Ok(row)
    }

    pub async fn update_with_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        user_id: Uuid,
        patch: &TemplatePatch,
        now: DateTime<Utc>,
    ) -> Result<Option<TemplateRow>> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE templates SET updated_at = ");
        query.push_bind(now);

        if let Some(name) = &patch.name {
            query.push(", name = ").push_bind(name.clone());
        }
        if let Some(description) = &patch.description {
            query.push(", description = ").push_bind(description.clone());
        }
        if let Some(category) = &patch.category {
            query.push(", category = ").push_bind(category.clone());
        }
        if let Some(priority) = patch.priority {
            query.push(", priority = ").push_bind(priority);
        }
        if let Some(pattern) = patch.recurrence_pattern {
            query.push(", recurrence_pattern = ").push_bind(pattern);
        }
        if let Some(minutes) = patch.reminder_minutes {
            query.push(", reminder_minutes = ").push_bind(minutes);
        }
        if let Some(days) = patch.due_date_offset_days {
            query.push(", due_date_offset_days = ").push_bind(days);
        }
        if let Some(json) = &patch.subtasks_json {
            query.push(", subtasks_json = ").push_bind(json.clone());
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND user_id = ")
            .push_bind(user_id)
            .push(" RETURNING *");

        let row = query
            .build_query_as::<TemplateRow>()
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row)
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
