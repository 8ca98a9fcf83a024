use std::{fmt, str::FromStr};

use chrono::{DateTime, Days, Months, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use super::{clock::resolve_local, ScheduleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrencePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Monthly => "monthly",
            RecurrencePattern::Yearly => "yearly",
        }
    }

    /// Calendar-aware step on a wall-clock time. Month and year steps clamp
    /// to the last valid day of the target month.
    fn advance(self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            RecurrencePattern::Daily => local.checked_add_days(Days::new(1)),
            RecurrencePattern::Weekly => local.checked_add_days(Days::new(7)),
            RecurrencePattern::Monthly => local.checked_add_months(Months::new(1)),
            RecurrencePattern::Yearly => local.checked_add_months(Months::new(12)),
        }
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrencePattern {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(RecurrencePattern::Daily),
            "weekly" => Ok(RecurrencePattern::Weekly),
            "monthly" => Ok(RecurrencePattern::Monthly),
            "yearly" => Ok(RecurrencePattern::Yearly),
            other => Err(ScheduleError::InvalidRecurrencePattern(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for RecurrencePattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Next due date of a recurring todo, stepped on the wall clock of `tz` so
/// the local time of day is kept.
pub fn next_due_date(
    current_due: Option<DateTime<Utc>>,
    pattern: RecurrencePattern,
    tz: Tz,
) -> Result<DateTime<Utc>, ScheduleError> {
    let current_due = current_due.ok_or(ScheduleError::MissingDueDate)?;
    let local = current_due.with_timezone(&tz).naive_local();
    let next = pattern.advance(local).ok_or(ScheduleError::OutOfRange)?;

    Ok(resolve_local(tz, next).with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use chrono_tz::Asia::Singapore;

    /// Parses a Singapore wall-clock time.
    fn sgt(local: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&format!("{}+08:00", local))
            .unwrap()
            .with_timezone(&Utc)
    }

    fn next(local: &str, pattern: RecurrencePattern) -> DateTime<Utc> {
        next_due_date(Some(sgt(local)), pattern, Singapore).unwrap()
    }

    #[test]
    fn test_daily_keeps_wall_clock() {
        assert_eq!(
            next("2025-03-10T09:00:00", RecurrencePattern::Daily),
            sgt("2025-03-11T09:00:00")
        );
        // Crosses a month boundary.
        assert_eq!(
            next("2025-03-31T23:45:00", RecurrencePattern::Daily),
            sgt("2025-04-01T23:45:00")
        );
    }

    #[test]
    fn test_daily_is_always_one_day_in_fixed_offset_zone() {
        let mut due = sgt("2024-12-25T07:15:00");
        for _ in 0..400 {
            let following = next_due_date(Some(due), RecurrencePattern::Daily, Singapore).unwrap();
            assert_eq!(following - due, chrono::Duration::days(1));
            let local = following.with_timezone(&Singapore);
            assert_eq!((local.hour(), local.minute()), (7, 15));
            due = following;
        }
    }

    #[test]
    fn test_weekly() {
        assert_eq!(
            next("2025-03-10T09:00:00", RecurrencePattern::Weekly),
            sgt("2025-03-17T09:00:00")
        );
    }

    #[test]
    fn test_monthly_clamps_to_month_end() {
        assert_eq!(
            next("2024-01-31T10:00:00", RecurrencePattern::Monthly),
            sgt("2024-02-29T10:00:00")
        );
        assert_eq!(
            next("2025-01-31T10:00:00", RecurrencePattern::Monthly),
            sgt("2025-02-28T10:00:00")
        );
        assert_eq!(
            next("2025-03-31T10:00:00", RecurrencePattern::Monthly),
            sgt("2025-04-30T10:00:00")
        );
        assert_eq!(
            next("2025-12-15T10:00:00", RecurrencePattern::Monthly),
            sgt("2026-01-15T10:00:00")
        );
    }

    #[test]
    fn test_yearly_leap_day() {
        assert_eq!(
            next("2024-02-29T10:00:00", RecurrencePattern::Yearly),
            sgt("2025-02-28T10:00:00")
        );
        assert_eq!(
            next("2025-06-01T10:00:00", RecurrencePattern::Yearly),
            sgt("2026-06-01T10:00:00")
        );
    }

    #[test]
    fn test_local_date_not_utc_date_drives_month_end() {
        // 2024-01-31 02:00 in Singapore is still 2024-01-30 in UTC.
        assert_eq!(
            next("2024-01-31T02:00:00", RecurrencePattern::Monthly),
            sgt("2024-02-29T02:00:00")
        );
    }

    #[test]
    fn test_missing_due_date() {
        assert_eq!(
            next_due_date(None, RecurrencePattern::Daily, Singapore),
            Err(ScheduleError::MissingDueDate)
        );
    }

    #[test]
    fn test_unknown_pattern_is_rejected() {
        assert_eq!(
            "hourly".parse::<RecurrencePattern>(),
            Err(ScheduleError::InvalidRecurrencePattern("hourly".to_string()))
        );
        assert_eq!(
            "Weekly".parse::<RecurrencePattern>(),
            Err(ScheduleError::InvalidRecurrencePattern("Weekly".to_string()))
        );
    }

    #[test]
    fn test_json_round_trip_uses_lowercase() {
        let pattern: RecurrencePattern = serde_json::from_str(r#""monthly""#).unwrap();
        assert_eq!(pattern, RecurrencePattern::Monthly);
        assert_eq!(serde_json::to_string(&pattern).unwrap(), r#""monthly""#);

        let err = serde_json::from_str::<RecurrencePattern>(r#""fortnightly""#).unwrap_err();
        assert!(err.to_string().contains("Invalid recurrence pattern: fortnightly"));
    }
}
