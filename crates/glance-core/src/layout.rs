use std::collections::BTreeMap;

use tracing::debug;

use crate::event::Event;
use crate::grid::YearGrid;
use crate::segment::{Segment, split_events};
use crate::stack::assign_stacks;

/// Everything the rendering surface needs to paint one year. Treated
/// as immutable once produced; a new trigger replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub grid: YearGrid,
    /// All segments, ordered `(row, col_start, created desc)` by the
    /// stack pass.
    pub segments: Vec<Segment>,
    /// Slots allocated per row; rows without segments are absent.
    pub row_depths: BTreeMap<u32, u32>,
}

/// The whole pipeline as a pure function of its inputs: grid building,
/// segment splitting, stack assignment. No state is carried between
/// calls; identical inputs give identical outputs.
#[tracing::instrument(skip(events), fields(events = events.len()))]
pub fn layout(year: i32, columns: u32, events: &[Event]) -> anyhow::Result<Layout> {
    let grid = YearGrid::build(year, columns)?;
    let mut segments = split_events(&grid, events);
    let row_depths = assign_stacks(&mut segments);
    debug!(
        segments = segments.len(),
        rows = grid.rows,
        "computed layout"
    );
    Ok(Layout {
        grid,
        segments,
        row_depths,
    })
}

impl Layout {
    /// Stack depth of `row`; zero when the row holds no segments.
    #[must_use]
    pub fn depth(&self, row: u32) -> u32 {
        self.row_depths.get(&row).copied().unwrap_or(0)
    }

    pub fn segments_in_row(&self, row: u32) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(move |s| s.row == row)
    }

    /// Ordered multimap from row to its segments, built once per
    /// layout pass for renderers that walk rows.
    #[must_use]
    pub fn by_row(&self) -> BTreeMap<u32, Vec<&Segment>> {
        let mut rows: BTreeMap<u32, Vec<&Segment>> = BTreeMap::new();
        for segment in &self.segments {
            rows.entry(segment.row).or_default().push(segment);
        }
        rows
    }
}
