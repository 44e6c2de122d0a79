use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use glance_shared::Tone;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Config;
use crate::date::format_date_key;
use crate::event::Event;
use crate::grid::GridCell;
use crate::layout::Layout;

const WEEKDAY_LETTERS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

/// Terminal rendering surface. Paints only what the layout pipeline
/// computed; never recomputes geometry itself.
#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, events))]
    pub fn print_event_table(&mut self, events: &[Event]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "ID".to_string(),
            "Label".to_string(),
            "Start".to_string(),
            "End".to_string(),
            "Days".to_string(),
            "Tone".to_string(),
            "Images".to_string(),
        ];

        let mut rows = Vec::with_capacity(events.len());
        for event in events {
            let id = self.paint(&short_id(event), "33");
            rows.push(vec![
                id,
                event.label.clone(),
                format_date_key(event.start),
                format_date_key(event.end),
                event.span_days().to_string(),
                event.tone.as_str().to_string(),
                event.images.len().to_string(),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    /// Paints the year grid: per row, one lane line per allocated
    /// stack slot, then the day-number line.
    #[tracing::instrument(skip(self, layout))]
    pub fn print_year(&mut self, layout: &Layout, cell_width: u32) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let grid = &layout.grid;
        let cell_width = cell_width.max(2) as usize;

        writeln!(out, "{}", grid.year)?;
        if grid.columns % 7 == 0 {
            writeln!(out, "{}", weekday_header(grid.columns, cell_width))?;
        }

        for row in 0..grid.rows {
            for lane in 0..layout.depth(row) {
                let line = self.lane_line(layout, row, lane, cell_width);
                writeln!(out, "{line}")?;
            }
            let line = self.day_line(grid, row, cell_width);
            writeln!(out, "{line}")?;
        }

        Ok(())
    }

    fn lane_line(&self, layout: &Layout, row: u32, lane: u32, cell_width: usize) -> String {
        let mut line = String::new();
        let mut cursor = 0usize;
        // Segments in a lane are already ordered by col_start and
        // never overlap, so a single left-to-right pass suffices.
        for segment in layout.segments_in_row(row).filter(|s| s.stack == lane) {
            let start = (segment.col_start - 1) as usize;
            line.push_str(&" ".repeat((start - cursor) * cell_width));
            let block = pad_to_width(&segment.label, segment.span as usize * cell_width);
            line.push_str(&self.paint(&block, tone_code(segment.tone)));
            cursor = start + segment.span as usize;
        }
        line
    }

    fn day_line(&self, grid: &crate::grid::YearGrid, row: u32, cell_width: usize) -> String {
        let mut line = String::new();
        for col in 0..grid.columns {
            let idx = (row * grid.columns + col) as usize;
            match grid.cells[idx] {
                GridCell::Blank => line.push_str(&" ".repeat(cell_width)),
                GridCell::Day {
                    day_of_month,
                    month_start,
                    weekend,
                    ..
                } => {
                    let text = format!("{day_of_month:>cell_width$}");
                    let painted = if month_start {
                        self.paint(&text, "1;4")
                    } else if weekend {
                        self.paint(&text, "90")
                    } else {
                        text
                    };
                    line.push_str(&painted);
                }
            }
        }
        line
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// First eight hex digits of the event id, enough to address it from
/// the CLI.
#[must_use]
pub fn short_id(event: &Event) -> String {
    event.id.simple().to_string()[..8].to_string()
}

fn tone_code(tone: Tone) -> &'static str {
    match tone {
        Tone::Sea => "30;46",
        Tone::Sunset => "30;43",
        Tone::Orchid => "30;45",
        Tone::Ink => "37;100",
    }
}

fn weekday_header(columns: u32, cell_width: usize) -> String {
    let mut line = String::new();
    for col in 0..columns {
        let letter = WEEKDAY_LETTERS[(col % 7) as usize];
        line.push_str(&format!("{letter:>cell_width$}"));
    }
    line
}

/// Truncates to at most `width` terminal columns (never splitting a
/// wide character), then pads with spaces to exactly `width`.
fn pad_to_width(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(&" ".repeat(width - used));
    out
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(visible_width(cell));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let padding = widths[idx].saturating_sub(visible_width(cell));
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

/// Terminal width of `s` with ANSI escape sequences excluded.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut escaped = false;
    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }
        if ch == '\x1b' {
            escaped = true;
            continue;
        }
        width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }
    width
}

#[cfg(test)]
mod tests {
    use super::{pad_to_width, visible_width, weekday_header};

    #[test]
    fn pad_truncates_and_pads_to_exact_width() {
        assert_eq!(pad_to_width("Conference", 6), "Confer");
        assert_eq!(pad_to_width("Trip", 8), "Trip    ");
        assert_eq!(pad_to_width("", 3), "   ");
    }

    #[test]
    fn pad_never_splits_a_wide_character() {
        // Each of these CJK characters is two columns wide.
        let padded = pad_to_width("休暇", 3);
        assert_eq!(padded, "休 ");
        assert_eq!(visible_width(&padded), 3);
    }

    #[test]
    fn visible_width_ignores_ansi_escapes() {
        assert_eq!(visible_width("\x1b[30;46mTrip\x1b[0m"), 4);
        assert_eq!(visible_width("plain"), 5);
    }

    #[test]
    fn weekday_header_repeats_per_week() {
        let header = weekday_header(14, 3);
        assert_eq!(header.len(), 14 * 3);
        assert!(header.starts_with(" Su Mo"));
        assert!(header.contains(" Sa Su"));
    }
}
