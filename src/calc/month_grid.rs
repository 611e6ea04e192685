use chrono::{Datelike, Days, NaiveDate};

/// Six full Monday-first weeks.
pub const GRID_CELLS: usize = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// False for the leading/trailing filler days of adjacent months.
    pub in_month: bool,
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
        _ => 0,
    }
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    let last = days_in_month(date.year(), date.month());
    date.with_day(last).unwrap_or(date)
}

/// Shifts by whole months, clamping the day to the target month's length
/// (Mar 31 minus one month is Feb 29 in a leap year, never Mar 2).
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let total = date.month0() as i32 + months;
    let new_year = date.year() + total.div_euclid(12);
    let new_month = total.rem_euclid(12) as u32 + 1;
    let new_day = date.day().min(days_in_month(new_year, new_month));
    NaiveDate::from_ymd_opt(new_year, new_month, new_day).unwrap_or(date)
}

/// Builds the 42-cell grid for the month containing `cursor`.
///
/// Column 0 is Monday. Cells before the first of the month and after its
/// last day belong to the neighbouring months and carry `in_month = false`.
pub fn month_grid(cursor: NaiveDate) -> Vec<CalendarDay> {
    let first = first_of_month(cursor);
    let last = last_of_month(cursor);
    let offset = first.weekday().num_days_from_monday() as u64;

    let mut grid = Vec::with_capacity(GRID_CELLS);
    for back in (1..=offset).rev() {
        if let Some(date) = first.checked_sub_days(Days::new(back)) {
            grid.push(CalendarDay { date, in_month: false });
        }
    }
    for date in first.iter_days().take_while(|d| *d <= last) {
        grid.push(CalendarDay { date, in_month: true });
    }
    let mut next = last;
    while grid.len() < GRID_CELLS {
        next = match next.succ_opt() {
            Some(d) => d,
            None => break,
        };
        grid.push(CalendarDay { date: next, in_month: false });
    }
    grid
}

/// e.g. "March 2024"
pub fn month_label(cursor: NaiveDate) -> String {
    cursor.format("%B %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn in_month_runs(grid: &[CalendarDay]) -> usize {
        grid.windows(2)
            .filter(|w| !w[0].in_month && w[1].in_month)
            .count()
            + usize::from(grid[0].in_month)
    }

    #[test]
    fn test_march_2024_grid() {
        let grid = month_grid(d(2024, 3, 20));
        assert_eq!(grid.len(), GRID_CELLS);
        assert_eq!(grid[0], CalendarDay { date: d(2024, 2, 26), in_month: false });
        assert_eq!(grid[0].date.weekday(), Weekday::Mon);
        assert_eq!(grid[4], CalendarDay { date: d(2024, 3, 1), in_month: true });
        assert_eq!(grid[41], CalendarDay { date: d(2024, 4, 7), in_month: false });
    }

    #[test]
    fn test_first_on_monday_has_no_leading_filler() {
        // 2024-04-01 is a Monday
        let grid = month_grid(d(2024, 4, 1));
        assert_eq!(grid[0], CalendarDay { date: d(2024, 4, 1), in_month: true });
    }

    #[test]
    fn test_first_on_sunday_has_six_leading_fillers() {
        // 2024-09-01 is a Sunday
        let grid = month_grid(d(2024, 9, 15));
        assert!(grid[..6].iter().all(|c| !c.in_month));
        assert_eq!(grid[0].date, d(2024, 8, 26));
        assert_eq!(grid[6], CalendarDay { date: d(2024, 9, 1), in_month: true });
        assert_eq!(grid.len(), GRID_CELLS);
    }

    #[test]
    fn test_every_month_has_42_consecutive_cells_and_one_run() {
        for year in [2023, 2024, 2025] {
            for month in 1..=12 {
                let grid = month_grid(d(year, month, 1));
                assert_eq!(grid.len(), GRID_CELLS, "{year}-{month}");
                assert!(grid.windows(2).all(|w| w[0].date.succ_opt() == Some(w[1].date)));
                assert_eq!(in_month_runs(&grid), 1, "{year}-{month}");
                let count = grid.iter().filter(|c| c.in_month).count() as u32;
                assert_eq!(count, days_in_month(year, month));
                assert_eq!(grid[0].date.weekday(), Weekday::Mon);
            }
        }
    }

    #[test]
    fn test_grid_depends_only_on_cursor_month() {
        assert_eq!(month_grid(d(2025, 2, 1)), month_grid(d(2025, 2, 28)));
    }

    #[test]
    fn test_february_starting_monday_non_leap() {
        // 2021-02-01 is a Monday and February 2021 fills exactly four rows
        let grid = month_grid(d(2021, 2, 10));
        assert_eq!(grid[0].date, d(2021, 2, 1));
        assert_eq!(grid[27], CalendarDay { date: d(2021, 2, 28), in_month: true });
        assert_eq!(grid[41].date, d(2021, 3, 14));
    }

    #[test]
    fn test_add_months_forward_and_back() {
        assert_eq!(add_months(d(2025, 1, 15), 1), d(2025, 2, 15));
        assert_eq!(add_months(d(2025, 3, 10), -2), d(2025, 1, 10));
    }

    #[test]
    fn test_add_months_across_year() {
        assert_eq!(add_months(d(2025, 11, 15), 2), d(2026, 1, 15));
        assert_eq!(add_months(d(2025, 1, 10), -1), d(2024, 12, 10));
    }

    #[test]
    fn test_add_months_clamps_month_end() {
        assert_eq!(add_months(d(2025, 1, 31), 1), d(2025, 2, 28));
        assert_eq!(add_months(d(2024, 3, 31), -1), d(2024, 2, 29));
        assert_eq!(add_months(d(2024, 5, 31), -1), d(2024, 4, 30));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 12), 31);
    }

    #[test]
    fn test_first_and_last_of_month() {
        assert_eq!(first_of_month(d(2024, 2, 17)), d(2024, 2, 1));
        assert_eq!(last_of_month(d(2024, 2, 17)), d(2024, 2, 29));
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label(d(2024, 3, 1)), "March 2024");
        assert_eq!(month_label(d(2023, 12, 31)), "December 2023");
        assert_eq!(month_label(d(2025, 1, 15)), "January 2025");
    }
}
