use anyhow::{Context, bail};
use tracing::debug;

use crate::config::Config;

pub const DAYS_PER_WEEK: u32 = 7;

/// Sizing policy of the rendering surface. Units are whatever the
/// surface measures in (pixels for a browser shell, character cells
/// for the bundled terminal renderer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Minimum width of a single day cell; one week never shrinks
    /// below seven of these.
    pub min_day_width: u32,
    pub cell_min: u32,
    pub cell_max: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            min_day_width: 4,
            cell_min: 3,
            cell_max: 8,
        }
    }
}

/// Column count and cell size derived from an observed width. The
/// column count is always a whole number of weeks so weekday
/// alignment holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnPlan {
    pub week_groups: u32,
    pub columns: u32,
    pub cell_size: u32,
}

impl Viewport {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let min_day_width = read_dimension(cfg, "calendar.min-day-width", defaults.min_day_width)?;
        let cell_min = read_dimension(cfg, "calendar.cell-min", defaults.cell_min)?;
        let cell_max = read_dimension(cfg, "calendar.cell-max", defaults.cell_max)?;
        if cell_max < cell_min {
            bail!("calendar.cell-max ({cell_max}) is below calendar.cell-min ({cell_min})");
        }
        Ok(Self {
            min_day_width,
            cell_min,
            cell_max,
        })
    }

    /// Picks how many week columns fit in `width`. Every change to the
    /// resulting column count invalidates the whole layout pipeline;
    /// callers recompute from scratch rather than patching.
    #[must_use]
    pub fn plan(&self, width: u32) -> ColumnPlan {
        let min_week_width = self.min_day_width.max(1) * DAYS_PER_WEEK;
        let week_groups = (width / min_week_width).max(1);
        let columns = week_groups * DAYS_PER_WEEK;
        let cell_size = (width / columns).clamp(self.cell_min, self.cell_max);
        let plan = ColumnPlan {
            week_groups,
            columns,
            cell_size,
        };
        debug!(width, ?plan, "derived column plan");
        plan
    }
}

fn read_dimension(cfg: &Config, key: &str, default: u32) -> anyhow::Result<u32> {
    let Some(raw) = cfg.get(key) else {
        return Ok(default);
    };
    let value: u32 = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid {key}: {raw}"))?;
    if value == 0 {
        bail!("{key} must be positive");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{ColumnPlan, Viewport};

    #[test]
    fn narrow_width_still_yields_one_week() {
        let plan = Viewport::default().plan(10);
        assert_eq!(
            plan,
            ColumnPlan {
                week_groups: 1,
                columns: 7,
                // 10 / 7 rounds down to 1, clamped up to cell_min.
                cell_size: 3,
            }
        );
    }

    #[test]
    fn columns_are_always_a_multiple_of_seven() {
        let viewport = Viewport::default();
        for width in [1, 27, 28, 55, 56, 112, 113, 640, 4096] {
            let plan = viewport.plan(width);
            assert_eq!(plan.columns % 7, 0);
            assert_eq!(plan.columns, plan.week_groups * 7);
            assert!(plan.cell_size >= viewport.cell_min);
            assert!(plan.cell_size <= viewport.cell_max);
        }
    }

    #[test]
    fn default_terminal_width_gives_four_weeks() {
        let plan = Viewport::default().plan(112);
        assert_eq!(plan.week_groups, 4);
        assert_eq!(plan.columns, 28);
        assert_eq!(plan.cell_size, 4);
    }

    #[test]
    fn wide_surface_clamps_cell_size() {
        let viewport = Viewport {
            min_day_width: 28,
            cell_min: 24,
            cell_max: 96,
        };
        let plan = viewport.plan(500);
        assert_eq!(plan.week_groups, 2);
        assert_eq!(plan.columns, 14);
        // 500 / 14 = 35, inside the clamp bounds.
        assert_eq!(plan.cell_size, 35);

        let tiny = viewport.plan(100);
        assert_eq!(tiny.columns, 7);
        assert_eq!(tiny.cell_size, 24);
    }
}
