use tracing::{debug, info};
use uuid::Uuid;

use super::notification_dto::DueReminder;
use crate::{
    error::Result,
    schedule::{notify_at, AppTime},
    todo::TodoRepository,
};

/// Answers the client's reminder poll. There is no server-side timer; each
/// poll evaluates eligibility at the current instant and stamps what fired.
#[derive(Clone)]
pub struct NotificationService {
    todo_repo: TodoRepository,
    time: AppTime,
}

impl NotificationService {
    pub fn new(todo_repo: TodoRepository, time: AppTime) -> Self {
        Self { todo_repo, time }
    }

    pub async fn check(&self, user_id: Uuid) -> Result<Vec<DueReminder>> {
        let now = self.time.now_utc();
        let candidates = self.todo_repo.find_reminder_candidates(user_id).await?;
        debug!(%user_id, candidates = candidates.len(), "checking reminders");

        let mut due = Vec::new();
        for mut todo in candidates {
            if !todo.reminder_state().is_due(now) {
                continue;
            }
            let (Some(due_date), Some(lead)) = (todo.due_date, todo.reminder_minutes) else {
                continue;
            };

            todo.last_notification_sent = Some(now);
            due.push(DueReminder {
                due_display: self.time.format_display(due_date),
                notify_at: notify_at(due_date, lead),
                todo,
            });
        }

        if !due.is_empty() {
            let ids: Vec<Uuid> = due.iter().map(|r| r.todo.id).collect();
            self.todo_repo.mark_notified(user_id, &ids, now).await?;
            info!(%user_id, count = due.len(), "reminders sent");
        }

        Ok(due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{schedule::clock::testing::ManualClock, test_support::TestApp};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use chrono_tz::Asia::Singapore;
    use serde_json::json;

    fn sgt(d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Singapore
            .with_ymd_and_hms(2025, 3, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn test_poll_fires_once_per_cooldown() {
        let due = sgt(10, 9, 0);
        let clock = ManualClock::new(due - Duration::minutes(45));
        let app = TestApp::with_clock(clock.clone()).await;
        let user = app.user("ivy").await;
        let todo = app
            .state
            .todo_service
            .create(
                user,
                serde_json::from_value(json!({
                    "title": "Dentist",
                    "due_date": "2025-03-10T09:00",
                    "reminder_minutes": 30,
                }))
                .unwrap(),
            )
            .await
            .unwrap();
        let service = &app.state.notification_service;

        // T-45: before the lead window opens.
        assert!(service.check(user).await.unwrap().is_empty());

        // T-29: inside the window.
        clock.set(due - Duration::minutes(29));
        let fired = service.check(user).await.unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].todo.id, todo.todo.id);
        assert_eq!(fired[0].notify_at, due - Duration::minutes(30));
        assert!(fired[0].due_display.starts_with("Mar 10, 2025, 9:00 AM"));
        assert_eq!(fired[0].todo.last_notification_sent, Some(due - Duration::minutes(29)));

        // T-28: still cooling down.
        clock.set(due - Duration::minutes(28));
        assert!(service.check(user).await.unwrap().is_empty());

        // T+31: an hour after the last one, past due but still incomplete.
        clock.set(due + Duration::minutes(31));
        assert_eq!(service.check(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_completed_todos_never_fire() {
        let due = sgt(10, 9, 0);
        let clock = ManualClock::new(due - Duration::minutes(10));
        let app = TestApp::with_clock(clock).await;
        let user = app.user("ivy").await;
        let todo = app
            .state
            .todo_service
            .create(
                user,
                serde_json::from_value(json!({
                    "title": "Dentist",
                    "due_date": "2025-03-10T09:00",
                    "reminder_minutes": 30,
                }))
                .unwrap(),
            )
            .await
            .unwrap();
        app.state.todo_service.toggle(user, todo.todo.id).await.unwrap();

        assert!(app.state.notification_service.check(user).await.unwrap().is_empty());
    }
}
