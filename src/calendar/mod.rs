use chrono::{Datelike, Duration, NaiveDate};

/// Days per grid row. `generate_calendar_dates` pads to whole rows of this size.
pub const WEEK_LEN: usize = 7;

/// Inclusive integer sequence `start..=end` (empty when `start > end`).
pub fn range(start: i32, end: i32) -> Vec<i32> {
    (start..=end).collect()
}

/// Split `items` into groups of `size`. The last group may be short.
/// A `size` of 0 keeps everything in one group.
pub fn chunk<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    if items.is_empty() { return Vec::new(); }
    if size == 0 { return vec![items]; }

    let mut out  = Vec::with_capacity(items.len().div_ceil(size));
    let mut iter = items.into_iter().peekable();
    while iter.peek().is_some() {
        out.push(iter.by_ref().take(size).collect());
    }
    out
}

/// First day of the month, normalizing `month0` (0-indexed) into the year.
pub fn first_of_month(year: i32, month0: i32) -> Option<NaiveDate> {
    let y = year + month0.div_euclid(12);
    let m = month0.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(y, m, 1)
}

pub fn days_in_month(year: i32, month0: i32) -> u32 {
    let Some(first) = first_of_month(year, month0) else { return 0 };
    match first_of_month(year, month0 + 1) {
        Some(next) => (next - first).num_days() as u32,
        // December of the last representable year.
        None => (NaiveDate::MAX - first).num_days() as u32 + 1,
    }
}

/// Every day of the month plus the previous month's tail (so the first row
/// starts on Sunday) and the next month's head (so the last row ends on
/// Saturday). The result length is a multiple of [`WEEK_LEN`], except at the
/// ends of chrono's range where the padding cannot be built.
pub fn generate_calendar_dates(year: i32, month0: i32) -> Vec<NaiveDate> {
    let Some(start) = first_of_month(year, month0) else { return Vec::new() };
    let len = days_in_month(year, month0) as i64;
    let end = start + Duration::days(len - 1);

    let lead  = start.weekday().num_days_from_sunday() as i64;
    let trail = 6 - end.weekday().num_days_from_sunday() as i64;

    (-lead..len + trail)
        .filter_map(|offset| start.checked_add_signed(Duration::days(offset)))
        .collect()
}

/// Returns the month grid as rows of [`WEEK_LEN`] days.
pub fn month_weeks(year: i32, month0: i32) -> Vec<Vec<NaiveDate>> {
    chunk(generate_calendar_dates(year, month0), WEEK_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_is_inclusive() {
        assert_eq!(range(1, 5), vec![1, 2, 3, 4, 5]);
        assert_eq!(range(3, 3), vec![3]);
        assert!(range(4, 3).is_empty());
    }

    #[test]
    fn chunk_splits_with_short_tail() {
        let rows = chunk((1..=10).collect(), 4);
        assert_eq!(rows, vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8], vec![9, 10]]);
    }

    #[test]
    fn chunk_edge_sizes() {
        assert_eq!(chunk(vec![1, 2, 3], 0), vec![vec![1, 2, 3]]);
        assert!(chunk(Vec::<u8>::new(), 7).is_empty());
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 1), 29);
        assert_eq!(days_in_month(2023, 1), 28);
        assert_eq!(days_in_month(2024, 11), 31);
        assert_eq!(days_in_month(2024, 3), 30);
    }

    #[test]
    fn month_index_carries_into_year() {
        assert_eq!(first_of_month(2024, 12), Some(ymd(2025, 1, 1)));
        assert_eq!(first_of_month(2024, -1), Some(ymd(2023, 12, 1)));
    }

    #[test]
    fn grid_starts_on_sunday_and_fills_rows() {
        for year in [1999, 2023, 2024, 2025] {
            for month0 in 0..12 {
                let days = generate_calendar_dates(year, month0);
                assert_eq!(days.len() % WEEK_LEN, 0, "{year}-{month0}");
                assert_eq!(days[0].weekday(), Weekday::Sun);
                assert_eq!(days[days.len() - 1].weekday(), Weekday::Sat);
                assert!(days.windows(2).all(|w| w[1] - w[0] == Duration::days(1)));
            }
        }
    }

    #[test]
    fn may_2024_grid() {
        // May 1st 2024 is a Wednesday, May 31st a Friday.
        let days = generate_calendar_dates(2024, 4);
        assert_eq!(days.first(), Some(&ymd(2024, 4, 28)));
        assert_eq!(days.last(), Some(&ymd(2024, 6, 1)));
        assert_eq!(days.len(), 35);
    }

    #[test]
    fn month_starting_sunday_has_no_lead() {
        // September 2024 starts on a Sunday and ends on a Monday.
        let days = generate_calendar_dates(2024, 8);
        assert_eq!(days[0], ymd(2024, 9, 1));
        assert_eq!(days.last(), Some(&ymd(2024, 10, 5)));
    }

    #[test]
    fn last_representable_month_is_whole() {
        let max = NaiveDate::MAX;
        assert_eq!(days_in_month(max.year(), 11), 31);
        let days = generate_calendar_dates(max.year(), 11);
        assert!(days.contains(&ymd(max.year(), 12, 1)));
        assert_eq!(days.last(), Some(&max));
    }

    #[test]
    fn weeks_are_full_rows() {
        let weeks = month_weeks(2026, 1);
        assert!(weeks.iter().all(|w| w.len() == WEEK_LEN));
        // February 2026 starts Sunday and ends Saturday: exactly four rows.
        assert_eq!(weeks.len(), 4);
    }
}
