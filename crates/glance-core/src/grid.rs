use anyhow::bail;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

use crate::date;

/// One slot in the row-major year grid: either real calendar day or
/// alignment padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridCell {
    Blank,
    Day {
        date: NaiveDate,
        day_of_month: u32,
        month0: u32,
        month_start: bool,
        weekend: bool,
    },
}

impl GridCell {
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            GridCell::Blank => None,
            GridCell::Day { date, .. } => Some(*date),
        }
    }
}

/// The padded day grid for one year at a given column count.
///
/// `cells.len() == rows * columns` always; leading cells before
/// January 1st and trailing cells after December 31st are blank so
/// every row is full.
#[derive(Debug, Clone, PartialEq)]
pub struct YearGrid {
    pub year: i32,
    pub columns: u32,
    pub rows: u32,
    /// Weekday index of January 1st, Sunday = 0; also the number of
    /// leading blank cells.
    pub start_offset: u32,
    pub days_in_year: u32,
    pub year_start: NaiveDate,
    pub year_end: NaiveDate,
    pub cells: Vec<GridCell>,
}

impl YearGrid {
    #[tracing::instrument]
    pub fn build(year: i32, columns: u32) -> anyhow::Result<Self> {
        if columns == 0 {
            bail!("column count must be positive");
        }

        let year_start = date::year_start(year)?;
        let year_end = date::year_end(year)?;
        let start_offset = year_start.weekday().num_days_from_sunday();
        let days_in_year = date::days_in_year(year);

        let total_cells = start_offset + days_in_year;
        let trailing = (columns - total_cells % columns) % columns;
        let grid_cells = total_cells + trailing;
        let rows = grid_cells / columns;

        let mut cells = Vec::with_capacity(grid_cells as usize);
        for index in 0..grid_cells {
            let ordinal = i64::from(index) - i64::from(start_offset) + 1;
            if ordinal < 1 || ordinal > i64::from(days_in_year) {
                cells.push(GridCell::Blank);
                continue;
            }
            let date = year_start + Duration::days(ordinal - 1);
            cells.push(GridCell::Day {
                date,
                day_of_month: date.day(),
                month0: date.month0(),
                month_start: date.day() == 1,
                weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
            });
        }

        debug!(rows, columns, grid_cells, trailing, "built year grid");

        Ok(Self {
            year,
            columns,
            rows,
            start_offset,
            days_in_year,
            year_start,
            year_end,
            cells,
        })
    }

    /// (row, column) of a flat cell index.
    #[must_use]
    pub fn position(&self, index: u32) -> (u32, u32) {
        (index / self.columns, index % self.columns)
    }

    /// Flat cell index of a date, or `None` when the date falls
    /// outside the displayed year.
    #[must_use]
    pub fn index_of(&self, date: NaiveDate) -> Option<u32> {
        if date < self.year_start || date > self.year_end {
            return None;
        }
        Some(self.start_offset + date::day_of_year(date) - 1)
    }
}
