use chrono::{DateTime, Datelike as _, Days, FixedOffset, Local, NaiveDate, Timelike as _, Weekday};

pub fn get_today_range(time: &DateTime<FixedOffset>) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let start_of_day = time.with_hour(0).unwrap().with_minute(0).unwrap().with_second(0).unwrap();
    let end_of_day = time.with_hour(23).unwrap().with_minute(59).unwrap().with_second(59).unwrap();

    (start_of_day, end_of_day)
}

/// Parses an API month (`YYYY-MM`) into its first-of-month date.
pub fn parse_month(month: &str) -> Option<NaiveDate> {
    let (year, month) = month.split_once('-')?;
    let year = year.parse().ok()?;
    let month = month.parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, 1)
}

pub fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

pub fn last_of_month(first: NaiveDate) -> NaiveDate {
    let next_month = match first.month() {
        12 => NaiveDate::from_ymd_opt(first.year() + 1, 1, 1),
        m => NaiveDate::from_ymd_opt(first.year(), m + 1, 1),
    };

    next_month.unwrap().pred_opt().unwrap()
}

/// Datetime bounds `[start, end)` covering the whole month, in the local
/// offset time logs are written with.
pub fn month_datetime_range(first: NaiveDate) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let start = first
        .and_hms_opt(0, 0, 0).unwrap()
        .and_local_timezone(Local)
        .earliest().unwrap()
        .fixed_offset();
    let end = last_of_month(first).succ_opt().unwrap()
        .and_hms_opt(0, 0, 0).unwrap()
        .and_local_timezone(Local)
        .earliest().unwrap()
        .fixed_offset();

    (start, end)
}

pub fn count_working_days(mut start: NaiveDate, end: NaiveDate) -> u32 {
    let mut working_days = 0;

    while start <= end {
        if start.weekday() != Weekday::Sat && start.weekday() != Weekday::Sun {
            working_days += 1;
        }

        start = start.checked_add_days(Days::new(1)).unwrap();
    }

    working_days
}

pub fn count_calendar_days(start: NaiveDate, end: NaiveDate) -> u32 {
    (end - start).num_days() as u32 + 1
}

pub fn days_of_month(first: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let last = last_of_month(first);

    first.iter_days().take_while(move |day| *day <= last)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Local, TimeZone as _};

    #[test]
    fn test_get_today_range() {
        let time = Local.with_ymd_and_hms(2023, 10, 10, 8, 30, 0).unwrap().fixed_offset();

        let (start, end) = get_today_range(&time);

        assert_eq!(start, Local.with_ymd_and_hms(2023, 10, 10, 0, 0, 0).unwrap().fixed_offset());
        assert_eq!(end, Local.with_ymd_and_hms(2023, 10, 10, 23, 59, 59).unwrap().fixed_offset());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2024-06"), NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(parse_month("2024-13"), None);
        assert_eq!(parse_month("2024"), None);
        assert_eq!(parse_month("junk-06"), None);
    }

    #[test]
    fn test_last_of_month() {
        assert_eq!(last_of_month(parse_month("2024-02").unwrap()), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(last_of_month(parse_month("2024-12").unwrap()), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_month_datetime_range_covers_local_month_edges() {
        let (start, end) = month_datetime_range(parse_month("2024-06").unwrap());

        assert_eq!(start, Local.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap().fixed_offset());
        assert_eq!(end, Local.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap().fixed_offset());

        // A shift started late on the last local day still falls in the month
        let late_shift = Local.with_ymd_and_hms(2024, 6, 30, 23, 0, 0).unwrap().fixed_offset();
        assert!(late_shift >= start && late_shift < end);
    }

    #[test]
    fn test_count_working_days() {
        let period_start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let period_end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

        assert_eq!(count_working_days(period_start, period_end), 20);
        assert_eq!(count_calendar_days(period_start, period_end), 30);
    }

    #[test]
    fn test_days_of_month() {
        let days: Vec<_> = days_of_month(parse_month("2024-02").unwrap()).collect();

        assert_eq!(days.len(), 29);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(days[28], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}
