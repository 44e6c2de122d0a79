use chrono::{DateTime, Utc};
use glance_shared::Tone;
use tracing::trace;
use uuid::Uuid;

use crate::date::day_of_year;
use crate::event::{Event, ordered_range};
use crate::grid::YearGrid;

/// The slice of one event that falls inside one grid row.
///
/// An event spanning several rows yields one segment per row, emitted
/// in ascending row order. `col_start` is 1-based and
/// `col_start + span - 1 <= columns` always.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub event_id: Uuid,
    pub label: String,
    pub tone: Tone,
    /// 1-based day-of-year covered by this segment, inclusive.
    pub day_start: u32,
    pub day_end: u32,
    pub row: u32,
    pub col_start: u32,
    pub span: u32,
    /// Vertical slot, 0 = topmost; assigned by the stack pass.
    pub stack: u32,
    pub created: DateTime<Utc>,
}

impl Segment {
    #[must_use]
    pub fn col_end(&self) -> u32 {
        self.col_start + self.span - 1
    }
}

/// Clips each event to the grid's year and splits it at row
/// boundaries. Events wholly outside the year are skipped.
#[tracing::instrument(skip_all, fields(events = events.len()))]
pub fn split_events(grid: &YearGrid, events: &[Event]) -> Vec<Segment> {
    let mut segments = Vec::new();

    for event in events {
        let (start, end) = ordered_range(event.start, event.end);
        let clipped_start = start.max(grid.year_start);
        let clipped_end = end.min(grid.year_end);
        if clipped_start > clipped_end {
            trace!(event = %event.id, "event outside displayed year, skipped");
            continue;
        }

        let start_index = grid.start_offset + day_of_year(clipped_start) - 1;
        let end_index = grid.start_offset + day_of_year(clipped_end) - 1;

        let mut current = start_index;
        while current <= end_index {
            let row = current / grid.columns;
            let row_last = row * grid.columns + grid.columns - 1;
            let piece_end = end_index.min(row_last);

            segments.push(Segment {
                event_id: event.id,
                label: event.label.clone(),
                tone: event.tone,
                day_start: current - grid.start_offset + 1,
                day_end: piece_end - grid.start_offset + 1,
                row,
                col_start: current % grid.columns + 1,
                span: piece_end - current + 1,
                stack: 0,
                created: event.created,
            });

            current = piece_end + 1;
        }
    }

    segments
}
