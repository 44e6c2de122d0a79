use std::collections::BTreeMap;

use tracing::trace;

use crate::segment::Segment;

/// Assigns every segment a vertical stack slot so that segments
/// sharing a row never overlap visually, and returns the number of
/// slots each row ended up needing.
///
/// Segments are processed in `(row asc, col_start asc, created desc)`
/// order. The descending `created` tie-break is deliberate product
/// behavior: of two segments starting in the same column, the newer
/// event claims the topmost free slot.
///
/// Placement is greedy leftmost-fit over per-row slot end columns,
/// the classic interval-partitioning scheme; processed left to right
/// it never allocates more slots than the largest set of mutually
/// overlapping segments in the row.
#[tracing::instrument(skip_all, fields(segments = segments.len()))]
pub fn assign_stacks(segments: &mut [Segment]) -> BTreeMap<u32, u32> {
    segments.sort_by(|a, b| {
        a.row
            .cmp(&b.row)
            .then(a.col_start.cmp(&b.col_start))
            .then(b.created.cmp(&a.created))
    });

    // Per row: the rightmost column currently occupied in each slot.
    let mut slot_ends: BTreeMap<u32, Vec<u32>> = BTreeMap::new();

    for segment in segments.iter_mut() {
        let slots = slot_ends.entry(segment.row).or_default();
        match slots.iter().position(|&end| end < segment.col_start) {
            Some(free) => {
                slots[free] = segment.col_end();
                segment.stack = free as u32;
            }
            None => {
                segment.stack = slots.len() as u32;
                slots.push(segment.col_end());
            }
        }
        trace!(
            event = %segment.event_id,
            row = segment.row,
            col_start = segment.col_start,
            stack = segment.stack,
            "placed segment"
        );
    }

    slot_ends
        .into_iter()
        .map(|(row, slots)| (row, slots.len() as u32))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use glance_shared::Tone;

    use super::assign_stacks;
    use crate::date::parse_date_key;
    use crate::event::Event;
    use crate::grid::YearGrid;
    use crate::segment::{Segment, split_events};

    fn event_at(label: &str, start: &str, end: &str, created_offset_s: i64) -> Event {
        let base = Utc
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("valid base");
        Event::new(
            label.to_string(),
            parse_date_key(start).expect("start"),
            parse_date_key(end).expect("end"),
            Tone::Sunset,
            base + Duration::seconds(created_offset_s),
        )
    }

    fn assert_no_collisions(segments: &[Segment]) {
        for (i, a) in segments.iter().enumerate() {
            for b in &segments[i + 1..] {
                if a.row == b.row && a.stack == b.stack {
                    assert!(
                        a.col_end() < b.col_start || b.col_end() < a.col_start,
                        "segments {} and {} collide in row {} slot {}",
                        a.label,
                        b.label,
                        a.row,
                        a.stack
                    );
                }
            }
        }
    }

    /// Largest set of segments in `row` that all mutually overlap in
    /// columns, measured by sweeping over column positions.
    fn max_clique(segments: &[Segment], row: u32) -> u32 {
        let in_row: Vec<&Segment> = segments.iter().filter(|s| s.row == row).collect();
        let mut best = 0;
        for col in 1..=in_row.iter().map(|s| s.col_end()).max().unwrap_or(0) {
            let live = in_row
                .iter()
                .filter(|s| s.col_start <= col && col <= s.col_end())
                .count() as u32;
            best = best.max(live);
        }
        best
    }

    #[test]
    fn overlapping_events_take_distinct_slots() {
        // The worked example: 2026 at 7 columns. A spans Jan 1-10 and
        // crosses into row 1; B overlaps A's second segment there.
        let grid = YearGrid::build(2026, 7).expect("build grid");
        let a = event_at("A", "2026-01-01", "2026-01-10", 0);
        let b = event_at("B", "2026-01-05", "2026-01-06", 60);
        let mut segments = split_events(&grid, &[a.clone(), b.clone()]);

        let depths = assign_stacks(&mut segments);

        let a_row1 = segments
            .iter()
            .find(|s| s.event_id == a.id && s.row == 1)
            .expect("A row 1 segment");
        let b_row1 = segments
            .iter()
            .find(|s| s.event_id == b.id)
            .expect("B segment");
        assert_eq!(a_row1.stack, 0);
        assert_eq!(b_row1.stack, 1);
        assert_eq!(depths.get(&1).copied(), Some(2));
        assert_no_collisions(&segments);
    }

    #[test]
    fn newer_event_wins_equal_start_columns() {
        let grid = YearGrid::build(2026, 7).expect("build grid");
        let older = event_at("older", "2026-01-05", "2026-01-06", 0);
        let newer = event_at("newer", "2026-01-05", "2026-01-07", 3600);
        let mut segments = split_events(&grid, &[older.clone(), newer.clone()]);

        assign_stacks(&mut segments);

        let older_seg = segments
            .iter()
            .find(|s| s.event_id == older.id)
            .expect("older segment");
        let newer_seg = segments
            .iter()
            .find(|s| s.event_id == newer.id)
            .expect("newer segment");
        assert_eq!(newer_seg.stack, 0);
        assert_eq!(older_seg.stack, 1);
    }

    #[test]
    fn freed_slots_are_reused() {
        // [Jan 4-5] and [Jan 5-6] overlap; [Jan 8-9] starts after both
        // ended and must drop back to slot 0 rather than open slot 2.
        let grid = YearGrid::build(2026, 7).expect("build grid");
        let events = vec![
            event_at("a", "2026-01-04", "2026-01-05", 0),
            event_at("b", "2026-01-05", "2026-01-06", 1),
            event_at("c", "2026-01-08", "2026-01-09", 2),
        ];
        let mut segments = split_events(&grid, &events);

        let depths = assign_stacks(&mut segments);

        let c_seg = segments
            .iter()
            .find(|s| s.label == "c")
            .expect("c segment");
        assert_eq!(c_seg.stack, 0);
        assert_eq!(depths.get(&1).copied(), Some(2));
        assert_no_collisions(&segments);
    }

    #[test]
    fn depth_equals_max_mutual_overlap() {
        let grid = YearGrid::build(2026, 14).expect("build grid");
        let events = vec![
            event_at("w1", "2026-01-04", "2026-01-17", 0),
            event_at("w2", "2026-01-06", "2026-01-08", 1),
            event_at("w3", "2026-01-07", "2026-01-12", 2),
            event_at("w4", "2026-01-13", "2026-01-16", 3),
            event_at("w5", "2026-01-15", "2026-01-15", 4),
        ];
        let mut segments = split_events(&grid, &events);

        let depths = assign_stacks(&mut segments);

        for (&row, &depth) in &depths {
            assert_eq!(
                depth,
                max_clique(&segments, row),
                "row {row} should not waste slots"
            );
        }
        assert_no_collisions(&segments);
    }

    #[test]
    fn rows_without_segments_report_no_depth() {
        let grid = YearGrid::build(2026, 7).expect("build grid");
        let mut segments = split_events(&grid, &[event_at("a", "2026-06-01", "2026-06-02", 0)]);
        let depths = assign_stacks(&mut segments);
        assert_eq!(depths.len(), 1);
    }
}
