use chrono::{Datelike, NaiveDate};
use iplandscape_model::{Granularity, UNKNOWN};

use crate::normalize::parse_calendar_date;

/// Period key for a date at the given granularity.
///
/// Keys are year-prefixed and zero-padded so that lexical order is
/// chronological within a granularity. A missing date gives `"Unknown"`.
pub fn period_key(date: Option<NaiveDate>, granularity: Granularity) -> String {
    let Some(date) = date else {
        return UNKNOWN.to_string();
    };
    let year = date.year();
    let month0 = date.month0();

    match granularity {
        Granularity::Weekly => format!("{}-W{:02}", year, week_of_year(date)),
        Granularity::Monthly => format!("{}-{:02}", year, month0 + 1),
        Granularity::Quarterly => format!("{}-Q{}", year, month0 / 3 + 1),
        Granularity::HalfYearly => {
            let half = if month0 < 6 { "H1" } else { "H2" };
            format!("{}-{}", year, half)
        }
        Granularity::Yearly => year.to_string(),
    }
}

/// Period key for a date string; anything that is not a `YYYY-MM-DD`
/// calendar date gives `"Unknown"`.
pub fn period_key_for_text(text: &str, granularity: Granularity) -> String {
    period_key(parse_calendar_date(text), granularity)
}

/// Week number counted from the week containing January 1st, with weeks
/// starting on Sunday. January 1st is always in week 1.
pub fn week_of_year(date: NaiveDate) -> u32 {
    let day_of_year = date.ordinal0();
    let jan1_weekday = (date.weekday().num_days_from_sunday() + 7 - day_of_year % 7) % 7;
    (day_of_year + jan1_weekday + 1 + 6) / 7
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_yearly_and_monthly() {
        assert_eq!(period_key(ymd(2024, 3, 10), Granularity::Yearly), "2024");
        assert_eq!(period_key(ymd(2024, 3, 10), Granularity::Monthly), "2024-03");
        assert_eq!(period_key(ymd(2024, 12, 31), Granularity::Monthly), "2024-12");
    }

    #[test]
    fn test_quarter_boundaries() {
        assert_eq!(period_key(ymd(2024, 1, 1), Granularity::Quarterly), "2024-Q1");
        assert_eq!(period_key(ymd(2024, 3, 31), Granularity::Quarterly), "2024-Q1");
        assert_eq!(period_key(ymd(2024, 4, 1), Granularity::Quarterly), "2024-Q2");
        assert_eq!(period_key(ymd(2024, 9, 30), Granularity::Quarterly), "2024-Q3");
        assert_eq!(period_key(ymd(2024, 10, 1), Granularity::Quarterly), "2024-Q4");
    }

    #[test]
    fn test_half_year_boundaries() {
        assert_eq!(period_key(ymd(2023, 6, 30), Granularity::HalfYearly), "2023-H1");
        assert_eq!(period_key(ymd(2023, 7, 1), Granularity::HalfYearly), "2023-H2");
    }

    #[test]
    fn test_weekly() {
        // 2024-01-01 is a Monday
        assert_eq!(period_key(ymd(2024, 1, 1), Granularity::Weekly), "2024-W01");
        assert_eq!(period_key(ymd(2024, 1, 6), Granularity::Weekly), "2024-W01");
        assert_eq!(period_key(ymd(2024, 1, 7), Granularity::Weekly), "2024-W02");
        // 2023-01-01 is a Sunday
        assert_eq!(period_key(ymd(2023, 1, 7), Granularity::Weekly), "2023-W01");
        assert_eq!(period_key(ymd(2023, 1, 8), Granularity::Weekly), "2023-W02");
        // Dec 31 2022 (a Saturday, Jan 1 was a Saturday too) lands in week 53
        assert_eq!(period_key(ymd(2022, 12, 31), Granularity::Weekly), "2022-W53");
    }

    #[test]
    fn test_week_of_year_monotonic() {
        let mut date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut last = week_of_year(date);
        assert_eq!(last, 1);
        while date.year() == 2025 {
            let week = week_of_year(date);
            assert!(week == last || week == last + 1);
            last = week;
            date = date.succ_opt().unwrap();
        }
        assert!(last <= 54);
    }

    #[test]
    fn test_unknown_dates() {
        for granularity in Granularity::ALL {
            assert_eq!(period_key(None, granularity), "Unknown");
            assert_eq!(period_key_for_text("not-a-date", granularity), "Unknown");
            assert_eq!(period_key_for_text("2024-02-30", granularity), "Unknown");
            assert_eq!(period_key_for_text(" 2024-03-10", granularity), "Unknown");
        }
    }

    #[test]
    fn test_text_dates() {
        assert_eq!(period_key_for_text("2024-03-10", Granularity::Quarterly), "2024-Q1");
    }
}
