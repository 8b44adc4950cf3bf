use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};

const SEARCH_HORIZON_DAYS: i64 = 366;

/// Announcement schedule: Sunday to Thursday evenings US Eastern, which is
/// Monday to Friday in UTC. `hour_utc` is the announcement hour while Eastern
/// standard time is in effect; during daylight time it comes an hour earlier.
#[derive(Debug, Clone)]
pub struct PublishSchedule {
    at: NaiveTime,
    skipped: Vec<NaiveDate>,
}

impl PublishSchedule {
    pub fn new(hour_utc: u32, skipped: Vec<NaiveDate>) -> Self {
        Self {
            at: NaiveTime::from_hms_opt(hour_utc, 0, 0).unwrap_or(NaiveTime::MIN),
            skipped,
        }
    }

    /// First announcement strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive();
        (0..=SEARCH_HORIZON_DAYS)
            .map(|offset| today + Duration::days(offset))
            .filter(|day| is_publish_day(*day) && !self.skipped.contains(day))
            .map(|day| self.slot(day))
            .find(|candidate| *candidate > now)
            .unwrap_or_else(|| now + Duration::days(1))
    }

    pub fn next_publish(&self) -> DateTime<Utc> {
        self.next_after(Utc::now())
    }

    fn slot(&self, day: NaiveDate) -> DateTime<Utc> {
        let standard = day.and_time(self.at).and_utc();
        if is_eastern_daylight_time(standard) {
            standard - Duration::hours(1)
        } else {
            standard
        }
    }
}

/// US rule since 2007: from 02:00 EST on the second Sunday of March until
/// 02:00 EDT on the first Sunday of November.
fn is_eastern_daylight_time(at: DateTime<Utc>) -> bool {
    let year = at.year();
    let starts = NaiveDate::from_weekday_of_month_opt(year, 3, Weekday::Sun, 2)
        .and_then(|day| day.and_hms_opt(7, 0, 0));
    let ends = NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Sun, 1)
        .and_then(|day| day.and_hms_opt(6, 0, 0));
    match (starts, ends) {
        (Some(starts), Some(ends)) => (starts.and_utc()..ends.and_utc()).contains(&at),
        _ => false,
    }
}

fn is_publish_day(day: NaiveDate) -> bool {
    !matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// IMF-fixdate, as used by `Expires` and `Last-Modified`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
