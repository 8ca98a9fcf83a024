use std::collections::HashMap;

use sqlx::{Sqlite, Transaction};
use uuid::Uuid;
use validator::Validate;

use super::todo_dto::{
    parse_due_date, CreateTodoRequest, PaginatedResponse, TodoListQuery, TodoPatch,
    UpdateTodoRequest,
};
use super::todo_models::{
    check_schedule_fields, NewTodo, Priority, PriorityCounts, Todo, TodoDetails,
};
use super::todo_repository::{
    DueFilter, SortField, SortOrder, StatusFilter, TodoFilters, TodoRepository,
};
use crate::{
    db::DbPool,
    error::{AppError, Result},
    schedule::{next_due_date, AppTime},
    subtask::{Subtask, SubtaskProgress, SubtaskRepository},
    tag::{Tag, TagOwner, TagRepository},
    validation::{require_text, TODO_TITLE_MAX},
};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 200;

/// A todo to insert together with its subtasks and tag links.
#[derive(Debug, Clone)]
pub struct TodoDraft {
    pub todo: NewTodo,
    /// `(title, position)`; a missing position appends.
    pub subtasks: Vec<(String, Option<i64>)>,
    pub tag_ids: Vec<Uuid>,
}

#[derive(Clone)]
pub struct TodoService {
    db: DbPool,
    repo: TodoRepository,
    subtask_repo: SubtaskRepository,
    tag_repo: TagRepository,
    time: AppTime,
}

impl TodoService {
    pub fn new(
        db: DbPool,
        repo: TodoRepository,
        subtask_repo: SubtaskRepository,
        tag_repo: TagRepository,
        time: AppTime,
    ) -> Self {
        Self {
            db,
            repo,
            subtask_repo,
            tag_repo,
            time,
        }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        query: TodoListQuery,
    ) -> Result<PaginatedResponse<TodoDetails>> {
        let filters = self.filters_from_query(&query)?;
        let (todos, total) = self.repo.find_all(user_id, &filters).await?;
        let data = self.details(todos).await?;

        let page = filters.offset / filters.limit + 1;
        let total_pages = (total as f64 / f64::from(filters.limit)).ceil() as u32;

        Ok(PaginatedResponse {
            data,
            total,
            page,
            limit: filters.limit,
            total_pages,
        })
    }

    pub async fn get(&self, user_id: Uuid, todo_id: Uuid) -> Result<TodoDetails> {
        let todo = self.find_owned(user_id, todo_id).await?;
        self.details_one(todo).await
    }

    pub async fn find_owned(&self, user_id: Uuid, todo_id: Uuid) -> Result<Todo> {
        self.repo
            .find_by_id(todo_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Todo not found".into()))
    }

    pub async fn create(&self, user_id: Uuid, payload: CreateTodoRequest) -> Result<TodoDetails> {
        payload.validate()?;
        let title = require_text("Title", &payload.title, TODO_TITLE_MAX)?;
        let due_date = payload
            .due_date
            .as_deref()
            .map(|raw| parse_due_date(&self.time, raw))
            .transpose()?;
        check_schedule_fields(due_date, payload.recurrence_pattern, payload.reminder_minutes)?;

        let tag_ids = self
            .tag_repo
            .verify_owned(user_id, payload.tag_ids.as_deref().unwrap_or_default())
            .await?;

        self.create_with_children(TodoDraft {
            todo: NewTodo {
                user_id,
                title,
                priority: payload.priority,
                due_date,
                recurrence_pattern: payload.recurrence_pattern,
                reminder_minutes: payload.reminder_minutes,
            },
            subtasks: Vec::new(),
            tag_ids,
        })
        .await
    }

    /// Inserts the todo, its subtasks and tag links in one transaction.
    /// Tag ownership must already be checked.
    pub async fn create_with_children(&self, draft: TodoDraft) -> Result<TodoDetails> {
        let now = self.time.now_utc();
        let mut tx = self.db.begin().await?;

        let todo = self.repo.create_with_tx(&mut tx, &draft.todo, now).await?;
        for (title, position) in &draft.subtasks {
            self.subtask_repo
                .create_with_tx(&mut tx, todo.id, title, *position, now)
                .await?;
        }
        self.tag_repo
            .set_links_with_tx(&mut tx, TagOwner::Todo, todo.id, &draft.tag_ids)
            .await?;

        tx.commit().await?;

        tracing::debug!(todo_id = %todo.id, "todo created");
        self.details_one(todo).await
    }

    /// Applies a partial update. Returns the updated todo and, when the
    /// update completed a recurring todo, its next occurrence.
    pub async fn update(
        &self,
        user_id: Uuid,
        todo_id: Uuid,
        payload: UpdateTodoRequest,
    ) -> Result<(TodoDetails, Option<TodoDetails>)> {
        let current = self.find_owned(user_id, todo_id).await?;
        let patch = TodoPatch::from_request(payload, &self.time)?;
        self.apply(current, patch).await
    }

    /// Flips completion; completing a recurring todo schedules the next one.
    pub async fn toggle(
        &self,
        user_id: Uuid,
        todo_id: Uuid,
    ) -> Result<(TodoDetails, Option<TodoDetails>)> {
        let current = self.find_owned(user_id, todo_id).await?;
        let completed_at = if current.is_completed() {
            None
        } else {
            Some(self.time.now_utc())
        };
        self.apply(current, TodoPatch::completion(completed_at)).await
    }

    async fn apply(
        &self,
        current: Todo,
        patch: TodoPatch,
    ) -> Result<(TodoDetails, Option<TodoDetails>)> {
        if patch.is_empty() {
            return Ok((self.details_one(current).await?, None));
        }

        let merged = patch.apply_to(&current);
        check_schedule_fields(
            merged.due_date,
            merged.recurrence_pattern,
            merged.reminder_minutes,
        )?;

        let completing = !current.is_completed() && merged.is_completed();
        let now = self.time.now_utc();
        let mut tx = self.db.begin().await?;

        let updated = self
            .repo
            .update_with_tx(&mut tx, current.id, current.user_id, &patch, now)
            .await?
            .ok_or_else(|| AppError::NotFound("Todo not found".into()))?;

        let next = if completing {
            self.spawn_next_occurrence(&mut tx, &updated).await?
        } else {
            None
        };

        tx.commit().await?;

        let updated = self.details_one(updated).await?;
        let next = match next {
            Some(todo) => Some(self.details_one(todo).await?),
            None => None,
        };
        Ok((updated, next))
    }

    async fn spawn_next_occurrence(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        completed: &Todo,
    ) -> Result<Option<Todo>> {
        let Some(pattern) = completed.recurrence_pattern else {
            return Ok(None);
        };

        let due_date = next_due_date(completed.due_date, pattern, self.time.tz())?;
        let next = NewTodo {
            user_id: completed.user_id,
            title: completed.title.clone(),
            priority: completed.priority,
            due_date: Some(due_date),
            recurrence_pattern: Some(pattern),
            reminder_minutes: completed.reminder_minutes,
        };

        let created = self
            .repo
            .create_with_tx(tx, &next, self.time.now_utc())
            .await?;
        let tag_ids = self
            .tag_repo
            .tag_ids_with_tx(tx, TagOwner::Todo, completed.id)
            .await?;
        self.tag_repo
            .set_links_with_tx(tx, TagOwner::Todo, created.id, &tag_ids)
            .await?;

        tracing::info!(
            todo_id = %completed.id,
            next_id = %created.id,
            next_due = %due_date,
            "scheduled next occurrence"
        );
        Ok(Some(created))
    }

    pub async fn delete(&self, user_id: Uuid, todo_id: Uuid) -> Result<()> {
        if self.repo.delete(todo_id, user_id).await? == 0 {
            return Err(AppError::NotFound("Todo not found".into()));
        }
        Ok(())
    }

    pub async fn priority_counts(&self, user_id: Uuid) -> Result<PriorityCounts> {
        self.repo.priority_counts(user_id).await
    }

    pub async fn set_tags(&self, user_id: Uuid, todo_id: Uuid, tag_ids: &[Uuid]) -> Result<TodoDetails> {
        let todo = self.find_owned(user_id, todo_id).await?;
        let tag_ids = self.tag_repo.verify_owned(user_id, tag_ids).await?;

        let mut tx = self.db.begin().await?;
        self.tag_repo
            .set_links_with_tx(&mut tx, TagOwner::Todo, todo.id, &tag_ids)
            .await?;
        tx.commit().await?;

        self.details_one(todo).await
    }

    pub async fn details_one(&self, todo: Todo) -> Result<TodoDetails> {
        let mut details = self.details(vec![todo]).await?;
        details.pop().ok_or(AppError::InternalError)
    }

    /// Attaches subtasks, progress and tags, loading each in one query.
    pub async fn details(&self, todos: Vec<Todo>) -> Result<Vec<TodoDetails>> {
        let ids: Vec<Uuid> = todos.iter().map(|t| t.id).collect();

        let mut subtasks: HashMap<Uuid, Vec<Subtask>> = HashMap::new();
        for subtask in self.subtask_repo.find_by_todo_ids(&ids).await? {
            subtasks.entry(subtask.todo_id).or_default().push(subtask);
        }

        let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for link in self.tag_repo.find_links(TagOwner::Todo, &ids).await? {
            tags.entry(link.owner_id).or_default().push(link.tag);
        }

        Ok(todos
            .into_iter()
            .map(|todo| {
                let subtasks = subtasks.remove(&todo.id).unwrap_or_default();
                let progress = SubtaskProgress::of(&subtasks);
                let tags = tags.remove(&todo.id).unwrap_or_default();
                TodoDetails {
                    todo,
                    subtasks,
                    progress,
                    tags,
                }
            })
            .collect())
    }

    fn filters_from_query(&self, query: &TodoListQuery) -> Result<TodoFilters> {
        let status = match query.status.as_deref() {
            None | Some("all") => StatusFilter::All,
            Some("incomplete") => StatusFilter::Incomplete,
            Some("completed") => StatusFilter::Completed,
            Some(other) => return Err(invalid_query("status", other)),
        };

        let priorities = split_list(query.priority.as_deref())
            .map(str::parse::<Priority>)
            .collect::<Result<Vec<_>>>()?;

        let tag_ids = split_list(query.tag_ids.as_deref())
            .map(|raw| Uuid::parse_str(raw).map_err(|_| invalid_query("tag_ids", raw)))
            .collect::<Result<Vec<_>>>()?;

        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let now = self.time.now_utc();
        let due = match query.due.as_deref() {
            None | Some("all") => DueFilter::Any,
            Some("overdue") => DueFilter::Overdue(now),
            Some("today") => DueFilter::Within(self.time.day_range(now)),
            Some("this-week") => DueFilter::Within(self.time.week_range(now)),
            Some("this-month") => DueFilter::Within(self.time.month_range(now)),
            Some("no-due-date") => DueFilter::NoDueDate,
            Some(other) => return Err(invalid_query("due", other)),
        };

        let sort_by = match query.sort_by.as_deref() {
            None | Some("created_at") => SortField::CreatedAt,
            Some("due_date") => SortField::DueDate,
            Some("priority") => SortField::Priority,
            Some("title") => SortField::Title,
            Some(other) => return Err(invalid_query("sort_by", other)),
        };

        let sort_order = match query.sort_order.as_deref() {
            None if sort_by == SortField::CreatedAt => SortOrder::Desc,
            None => SortOrder::Asc,
            Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(other) => return Err(invalid_query("sort_order", other)),
        };

        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let page = query.page.unwrap_or(1).max(1);

        Ok(TodoFilters {
            status,
            priorities,
            tag_ids,
            search,
            due,
            sort_by,
            sort_order,
            limit,
            offset: (page - 1).saturating_mul(limit),
        })
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn invalid_query(param: &str, value: &str) -> AppError {
    AppError::Validation(format!("Invalid {} filter: {}", param, value))
}
