use std::{ops::Range, sync::Arc};

use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, Months, NaiveDate, NaiveDateTime,
    NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;

/// Source of "now". Production code uses [`SystemClock`]; tests swap in a
/// clock they can move by hand.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The application's canonical timezone paired with its clock.
#[derive(Clone)]
pub struct AppTime {
    tz: Tz,
    clock: Arc<dyn Clock>,
}

impl AppTime {
    pub fn new(tz: Tz, clock: Arc<dyn Clock>) -> Self {
        Self { tz, clock }
    }

    pub fn system(tz: Tz) -> Self {
        Self::new(tz, Arc::new(SystemClock))
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn now(&self) -> DateTime<Tz> {
        self.localize(self.now_utc())
    }

    pub fn localize(&self, at: DateTime<Utc>) -> DateTime<Tz> {
        at.with_timezone(&self.tz)
    }

    /// Parses user input. Inputs without an offset are read as wall-clock
    /// time in the canonical timezone; a bare date means local midnight.
    pub fn parse(&self, input: &str) -> Option<DateTime<Utc>> {
        let input = input.trim();

        if let Ok(at) = DateTime::parse_from_rfc3339(input) {
            return Some(at.with_timezone(&Utc));
        }

        const NAIVE_FORMATS: [&str; 4] = [
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M",
        ];
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
                return Some(resolve_local(self.tz, naive).with_timezone(&Utc));
            }
        }

        NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .ok()
            .map(|date| self.local_midnight(date))
    }

    /// Human readable form, e.g. `Mar 10, 2025, 9:00 AM +08`.
    pub fn format_display(&self, at: DateTime<Utc>) -> String {
        self.localize(at).format("%b %-d, %Y, %-I:%M %p %Z").to_string()
    }

    /// `[local midnight, next local midnight)` around `at`.
    pub fn day_range(&self, at: DateTime<Utc>) -> Range<DateTime<Utc>> {
        let date = self.localize(at).date_naive();
        let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
        self.local_midnight(date)..self.local_midnight(next)
    }

    /// Monday-to-Monday week containing `at`.
    pub fn week_range(&self, at: DateTime<Utc>) -> Range<DateTime<Utc>> {
        let date = self.localize(at).date_naive();
        let days_from_monday = u64::from(date.weekday().num_days_from_monday());
        let monday = date.checked_sub_days(Days::new(days_from_monday)).unwrap_or(date);
        let next_monday = monday.checked_add_days(Days::new(7)).unwrap_or(monday);
        self.local_midnight(monday)..self.local_midnight(next_monday)
    }

    pub fn month_range(&self, at: DateTime<Utc>) -> Range<DateTime<Utc>> {
        let date = self.localize(at).date_naive();
        let first = date.with_day(1).unwrap_or(date);
        let next = first.checked_add_months(Months::new(1)).unwrap_or(first);
        self.local_midnight(first)..self.local_midnight(next)
    }

    fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        resolve_local(self.tz, date.and_time(NaiveTime::MIN)).with_timezone(&Utc)
    }
}

/// Maps a wall-clock time onto the timezone. Ambiguous times take the
/// earlier instant; times inside a DST gap move forward past the gap.
pub(crate) fn resolve_local(tz: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(at) => at,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;

    fn singapore_at(rfc3339: &str) -> AppTime {
        let now = DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc);
        AppTime::new(chrono_tz::Asia::Singapore, Arc::new(ManualClock::new(now)))
    }

    fn utc(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_now_comes_from_clock() {
        let time = singapore_at("2025-03-10T09:00:00+08:00");
        assert_eq!(time.now_utc(), utc("2025-03-10T01:00:00Z"));
        assert_eq!(time.now().format("%H:%M").to_string(), "09:00");
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(utc("2025-03-10T01:00:00Z"));
        let time = AppTime::new(chrono_tz::Asia::Singapore, Arc::new(clock.clone()));
        clock.advance(Duration::minutes(90));
        assert_eq!(time.now_utc(), utc("2025-03-10T02:30:00Z"));
        clock.set(utc("2026-01-01T00:00:00Z"));
        assert_eq!(time.now_utc(), utc("2026-01-01T00:00:00Z"));
    }

    #[test]
    fn test_parse_accepts_offset_naive_and_date() {
        let time = singapore_at("2025-03-10T09:00:00+08:00");

        assert_eq!(
            time.parse("2025-03-10T09:00:00+08:00"),
            Some(utc("2025-03-10T01:00:00Z"))
        );
        assert_eq!(time.parse("2025-03-10T09:00:00Z"), Some(utc("2025-03-10T09:00:00Z")));
        assert_eq!(time.parse("2025-03-10T09:00"), Some(utc("2025-03-10T01:00:00Z")));
        assert_eq!(time.parse("2025-03-10 09:00:30"), Some(utc("2025-03-10T01:00:30Z")));
        assert_eq!(time.parse("2025-03-10"), Some(utc("2025-03-09T16:00:00Z")));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let time = singapore_at("2025-03-10T09:00:00+08:00");
        assert_eq!(time.parse("not a date"), None);
        assert_eq!(time.parse("2025-02-30"), None);
        assert_eq!(time.parse(""), None);
    }

    #[test]
    fn test_format_display_uses_local_wall_clock() {
        let time = singapore_at("2025-03-10T09:00:00+08:00");
        let text = time.format_display(utc("2025-03-10T05:30:00Z"));
        assert!(text.starts_with("Mar 10, 2025, 1:30 PM"), "{}", text);
    }

    #[test]
    fn test_day_range_follows_local_midnight() {
        let time = singapore_at("2025-03-10T09:00:00+08:00");
        // 23:30 local on the 10th is still 15:30 UTC on the 10th.
        let range = time.day_range(utc("2025-03-10T15:30:00Z"));
        assert_eq!(range.start, utc("2025-03-09T16:00:00Z"));
        assert_eq!(range.end, utc("2025-03-10T16:00:00Z"));
    }

    #[test]
    fn test_week_range_starts_monday() {
        let time = singapore_at("2025-03-10T09:00:00+08:00");
        // Thursday 13 March 2025, local.
        let range = time.week_range(utc("2025-03-13T04:00:00Z"));
        assert_eq!(range.start, utc("2025-03-09T16:00:00Z"));
        assert_eq!(range.end, utc("2025-03-16T16:00:00Z"));
    }

    #[test]
    fn test_month_range_handles_february() {
        let time = singapore_at("2024-02-10T09:00:00+08:00");
        let range = time.month_range(utc("2024-02-10T01:00:00Z"));
        assert_eq!(range.start, utc("2024-01-31T16:00:00Z"));
        assert_eq!(range.end, utc("2024-02-29T16:00:00Z"));
    }

    #[test]
    fn test_resolve_local_skips_dst_gap() {
        let tz = chrono_tz::America::New_York;
        let gap = NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let resolved = resolve_local(tz, gap);
        assert_eq!(resolved.format("%H:%M").to_string(), "03:30");
    }
}
