use std::collections::HashMap;

use chrono::{DateTime, Days, Utc};
use uuid::Uuid;
use validator::Validate;

use super::template_dto::{
    CreateTemplateRequest, SaveAsTemplateRequest, TemplateSubtaskInput, UpdateTemplateRequest,
    CATEGORY_MAX, TEMPLATE_SUBTASKS_MAX, TEMPLATE_SUBTASK_TITLE_MAX,
};
use super::template_models::{NewTemplate, Template, TemplateRow, TemplateSubtask};
use super::template_repository::{TemplatePatch, TemplateRepository};
use crate::{
    db::DbPool,
    error::{AppError, Result},
    schedule::{AppTime, ScheduleError},
    tag::{Tag, TagOwner, TagRepository},
    todo::{
        todo_dto::{check_reminder_minutes, parse_due_date},
        todo_models::{check_schedule_fields, NewTodo},
        todo_service::TodoDraft,
        Priority, TodoDetails, TodoService,
    },
    validation::{require_text, TEMPLATE_NAME_MAX},
};

#[derive(Clone)]
pub struct TemplateService {
    db: DbPool,
    repo: TemplateRepository,
    tag_repo: TagRepository,
    todo_service: TodoService,
    time: AppTime,
}

impl TemplateService {
    pub fn new(
        db: DbPool,
        repo: TemplateRepository,
        tag_repo: TagRepository,
        todo_service: TodoService,
        time: AppTime,
    ) -> Self {
        Self {
            db,
            repo,
            tag_repo,
            todo_service,
            time,
        }
    }

    pub async fn list(&self, user_id: Uuid, category: Option<&str>) -> Result<Vec<Template>> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        let rows = self.repo.find_all(user_id, category).await?;
        self.with_tags(rows).await
    }

    pub async fn get(&self, user_id: Uuid, template_id: Uuid) -> Result<Template> {
        let row = self.find_owned(user_id, template_id).await?;
        self.with_tags_one(row).await
    }

    pub async fn create(&self, user_id: Uuid, payload: CreateTemplateRequest) -> Result<Template> {
        payload.validate()?;
        let name = require_text("Template name", &payload.name, TEMPLATE_NAME_MAX)?;
        let subtasks_json = encode_subtasks(payload.subtasks.unwrap_or_default())?;
        let tag_ids = self
            .tag_repo
            .verify_owned(user_id, payload.tag_ids.as_deref().unwrap_or_default())
            .await?;

        let new = NewTemplate {
            user_id,
            name,
            description: non_blank(payload.description),
            category: non_blank(payload.category),
            priority: Some(payload.priority.unwrap_or(Priority::Medium)),
            recurrence_pattern: payload.recurrence_pattern,
            reminder_minutes: payload.reminder_minutes,
            due_date_offset_days: payload.due_date_offset_days,
            subtasks_json,
        };
        self.insert(new, &tag_ids).await
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        template_id: Uuid,
        mut payload: UpdateTemplateRequest,
    ) -> Result<Template> {
        let current = self.find_owned(user_id, template_id).await?;
        let tag_ids = match payload.tag_ids.take() {
            Some(ids) => Some(self.tag_repo.verify_owned(user_id, &ids).await?),
            None => None,
        };
        let patch = template_patch(payload)?;
        if patch.is_empty() && tag_ids.is_none() {
            return self.with_tags_one(current).await;
        }

        let now = self.time.now_utc();
        let mut tx = self.db.begin().await?;
        let row = self
            .repo
            .update_with_tx(&mut tx, current.id, user_id, &patch, now)
            .await?
            .ok_or_else(template_not_found)?;
        if let Some(tag_ids) = &tag_ids {
            self.tag_repo
                .set_links_with_tx(&mut tx, TagOwner::Template, row.id, tag_ids)
                .await?;
        }
        tx.commit().await?;

        self.with_tags_one(row).await
    }

    pub async fn delete(&self, user_id: Uuid, template_id: Uuid) -> Result<()> {
        if self.repo.delete(template_id, user_id).await? == 0 {
            return Err(template_not_found());
        }
        Ok(())
    }

    /// Creates a todo with the template's subtasks and tags. The due date
    /// is `custom_due_date` when given, else now plus the offset in days.
    pub async fn instantiate(
        &self,
        user_id: Uuid,
        template_id: Uuid,
        custom_due_date: Option<&str>,
    ) -> Result<(TodoDetails, String)> {
        let template = self.get(user_id, template_id).await?;

        let due_date = match (custom_due_date, template.due_date_offset_days) {
            (Some(raw), _) => Some(parse_due_date(&self.time, raw)?),
            (None, Some(days)) => Some(self.offset_from_now(days)?),
            (None, None) => None,
        };
        check_schedule_fields(due_date, template.recurrence_pattern, template.reminder_minutes)?;

        let draft = TodoDraft {
            todo: NewTodo {
                user_id,
                title: template.name.clone(),
                priority: template.priority,
                due_date,
                recurrence_pattern: template.recurrence_pattern,
                reminder_minutes: template.reminder_minutes,
            },
            subtasks: template
                .subtasks
                .iter()
                .map(|s| (s.title.clone(), Some(s.position)))
                .collect(),
            tag_ids: template.tags.iter().map(|t| t.id).collect(),
        };
        let todo = self.todo_service.create_with_children(draft).await?;

        tracing::info!(template_id = %template.id, todo_id = %todo.todo.id, "template used");
        let message = format!("Todo created from template '{}'", template.name);
        Ok((todo, message))
    }

    /// Captures a todo's settings, subtasks and tags as a new template.
    pub async fn save_from_todo(
        &self,
        user_id: Uuid,
        todo_id: Uuid,
        payload: SaveAsTemplateRequest,
    ) -> Result<Template> {
        payload.validate()?;
        let name = require_text("Template name", &payload.name, TEMPLATE_NAME_MAX)?;
        let todo = self.todo_service.get(user_id, todo_id).await?;

        let subtasks = todo
            .subtasks
            .iter()
            .take(TEMPLATE_SUBTASKS_MAX)
            .map(|s| TemplateSubtaskInput {
                title: s.title.chars().take(TEMPLATE_SUBTASK_TITLE_MAX).collect(),
                position: Some(s.position),
            })
            .collect();
        let tag_ids: Vec<Uuid> = todo.tags.iter().map(|t| t.id).collect();

        let new = NewTemplate {
            user_id,
            name,
            description: non_blank(payload.description),
            category: non_blank(payload.category),
            priority: Some(todo.todo.priority.unwrap_or(Priority::Medium)),
            recurrence_pattern: todo.todo.recurrence_pattern,
            reminder_minutes: todo.todo.reminder_minutes,
            due_date_offset_days: payload.due_date_offset_days,
            subtasks_json: encode_subtasks(subtasks)?,
        };
        self.insert(new, &tag_ids).await
    }

    async fn insert(&self, new: NewTemplate, tag_ids: &[Uuid]) -> Result<Template> {
        let mut tx = self.db.begin().await?;
        let row = self
            .repo
            .create_with_tx(&mut tx, &new, self.time.now_utc())
            .await?;
        self.tag_repo
            .set_links_with_tx(&mut tx, TagOwner::Template, row.id, tag_ids)
            .await?;
        tx.commit().await?;

        tracing::debug!(template_id = %row.id, "template created");
        self.with_tags_one(row).await
    }

    async fn find_owned(&self, user_id: Uuid, template_id: Uuid) -> Result<TemplateRow> {
        self.repo
            .find_by_id(template_id, user_id)
            .await?
            .ok_or_else(template_not_found)
    }

    fn offset_from_now(&self, days: i64) -> Result<DateTime<Utc>> {
        let days = u64::try_from(days).map_err(|_| ScheduleError::OutOfRange)?;
        let due = self
            .time
            .now()
            .checked_add_days(Days::new(days))
            .ok_or(ScheduleError::OutOfRange)?;
        Ok(due.with_timezone(&Utc))
    }

    async fn with_tags_one(&self, row: TemplateRow) -> Result<Template> {
        let mut templates = self.with_tags(vec![row]).await?;
        templates.pop().ok_or(AppError::InternalError)
    }

    async fn with_tags(&self, rows: Vec<TemplateRow>) -> Result<Vec<Template>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for link in self.tag_repo.find_links(TagOwner::Template, &ids).await? {
            tags.entry(link.owner_id).or_default().push(link.tag);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let tags = tags.remove(&row.id).unwrap_or_default();
                row.into_template(tags)
            })
            .collect())
    }
}

fn template_patch(req: UpdateTemplateRequest) -> Result<TemplatePatch> {
    let name = req
        .name
        .map(|name| require_text("Template name", &name, TEMPLATE_NAME_MAX))
        .transpose()?;

    if let Some(Some(category)) = &req.category {
        if category.chars().count() > CATEGORY_MAX {
            return Err(AppError::Validation(
                "Category must be 50 characters or less".into(),
            ));
        }
    }
    if let Some(Some(minutes)) = req.reminder_minutes {
        check_reminder_minutes(minutes)?;
    }
    if let Some(Some(days)) = req.due_date_offset_days {
        if days < 0 {
            return Err(AppError::Validation(
                "due_date_offset_days must not be negative".into(),
            ));
        }
    }

    let subtasks_json = match req.subtasks {
        Some(Some(list)) => Some(encode_subtasks(list)?),
        Some(None) => Some(None),
        None => None,
    };

    Ok(TemplatePatch {
        name,
        description: req.description.map(non_blank),
        category: req.category.map(non_blank),
        priority: req.priority,
        recurrence_pattern: req.recurrence_pattern,
        reminder_minutes: req.reminder_minutes,
        due_date_offset_days: req.due_date_offset_days,
        subtasks_json,
    })
}

/// Validates blueprints and serializes them; an empty list stores `NULL`.
fn encode_subtasks(list: Vec<TemplateSubtaskInput>) -> Result<Option<String>> {
    if list.len() > TEMPLATE_SUBTASKS_MAX {
        return Err(AppError::Validation(format!(
            "Maximum {} subtasks allowed",
            TEMPLATE_SUBTASKS_MAX
        )));
    }
    if list.is_empty() {
        return Ok(None);
    }

    let subtasks = list
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            if input.position.is_some_and(|p| p < 0) {
                return Err(AppError::Validation("Subtask position must not be negative".into()));
            }
            Ok(TemplateSubtask {
                title: require_text("Subtask title", &input.title, TEMPLATE_SUBTASK_TITLE_MAX)?,
                position: input.position.unwrap_or(index as i64),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    serde_json::to_string(&subtasks)
        .map(Some)
        .map_err(|_| AppError::InternalError)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn template_not_found() -> AppError {
    AppError::NotFound("Template not found".into())
}
