use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use glance_shared::{EventCreate, EventDto, EventPatch, Tone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::date::{format_date_key, parse_date_key};

/// A date-ranged calendar entry. Layout treats it as an immutable
/// value; `start <= end` always holds after construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: Uuid,

    pub label: String,

    pub start: NaiveDate,

    pub end: NaiveDate,

    pub tone: Tone,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub description: String,

    /// Creation instant; only used as the stacking tie-break, never
    /// displayed.
    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

/// Returns the range with its endpoints swapped into order if the
/// caller supplied them reversed. Not an error by contract.
#[must_use]
pub fn ordered_range(start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate) {
    if end < start { (end, start) } else { (start, end) }
}

impl Event {
    pub fn new(
        label: String,
        start: NaiveDate,
        end: NaiveDate,
        tone: Tone,
        now: DateTime<Utc>,
    ) -> Self {
        let (start, end) = ordered_range(start, end);
        Self {
            id: Uuid::new_v4(),
            label,
            start,
            end,
            tone,
            images: vec![],
            description: String::new(),
            created: now,
            modified: now,
        }
    }

    /// Number of calendar days the event covers, endpoints inclusive.
    #[must_use]
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Re-orders the date range after an edit touched either endpoint.
    pub fn normalize(&mut self) {
        let (start, end) = ordered_range(self.start, self.end);
        self.start = start;
        self.end = end;
    }

    #[must_use]
    pub fn to_dto(&self) -> EventDto {
        EventDto {
            id: self.id,
            label: self.label.clone(),
            start: format_date_key(self.start),
            end: format_date_key(self.end),
            tone: self.tone,
            images: self.images.clone(),
            description: self.description.clone(),
            created_at_ms: Some(self.created.timestamp_millis()),
        }
    }

    pub fn from_dto(dto: &EventDto, now: DateTime<Utc>) -> anyhow::Result<Self> {
        let start = parse_date_key(&dto.start)
            .with_context(|| format!("event {}: bad start date", dto.id))?;
        let end =
            parse_date_key(&dto.end).with_context(|| format!("event {}: bad end date", dto.id))?;
        let (start, end) = ordered_range(start, end);
        let created = dto
            .created_at_ms
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or(now);
        Ok(Self {
            id: dto.id,
            label: dto.label.clone(),
            start,
            end,
            tone: dto.tone,
            images: dto.images.clone(),
            description: dto.description.clone(),
            created,
            modified: now,
        })
    }

    pub fn from_create(req: &EventCreate, now: DateTime<Utc>) -> anyhow::Result<Self> {
        let start = parse_date_key(&req.start).context("bad start date")?;
        let end = parse_date_key(&req.end).context("bad end date")?;
        let mut event = Self::new(req.label.clone(), start, end, req.tone, now);
        event.images = req.images.clone();
        event.description = req.description.clone().unwrap_or_default();
        Ok(event)
    }

    pub fn apply_patch(&mut self, patch: &EventPatch, now: DateTime<Utc>) -> anyhow::Result<()> {
        if let Some(label) = &patch.label {
            self.label = label.clone();
        }
        if let Some(start) = &patch.start {
            self.start = parse_date_key(start).context("bad start date in patch")?;
        }
        if let Some(end) = &patch.end {
            self.end = parse_date_key(end).context("bad end date in patch")?;
        }
        if let Some(tone) = patch.tone {
            self.tone = tone;
        }
        if let Some(images) = &patch.images {
            self.images = images.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone().unwrap_or_default();
        }
        self.normalize();
        self.modified = now;
        Ok(())
    }
}
