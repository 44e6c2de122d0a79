use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::event::Event;

/// JSONL-backed event storage: one event per line in `events.data`,
/// whole-file snapshots per line in `undo.data`. All writes are
/// atomic replaces.
#[derive(Debug)]
pub struct EventStore {
    pub data_dir: PathBuf,
    pub events_path: PathBuf,
    pub undo_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UndoEntry {
    events: Vec<Event>,
}

impl EventStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let events_path = data_dir.join("events.data");
        let undo_path = data_dir.join("undo.data");

        if !events_path.exists() {
            fs::write(&events_path, "")?;
        }
        if !undo_path.exists() {
            fs::write(&undo_path, "")?;
        }

        info!(
            data_dir = %data_dir.display(),
            events = %events_path.display(),
            "opened event store"
        );

        Ok(Self {
            data_dir,
            events_path,
            undo_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> anyhow::Result<Vec<Event>> {
        load_jsonl(&self.events_path).context("failed to load events.data")
    }

    #[tracing::instrument(skip(self, events))]
    pub fn save(&self, events: &[Event]) -> anyhow::Result<()> {
        let mut ordered = events.to_vec();
        ordered.sort_by_key(|e| (e.created, e.id));
        save_jsonl_atomic(&self.events_path, &ordered).context("failed to save events.data")
    }

    #[tracing::instrument(skip(self, event), fields(id = %event.id, label = %event.label))]
    pub fn add(&self, event: Event) -> anyhow::Result<()> {
        let mut events = self.load()?;
        events.push(event);
        self.save(&events)
    }

    #[tracing::instrument(skip(self, event), fields(id = %event.id))]
    pub fn update(&self, event: Event) -> anyhow::Result<()> {
        let mut events = self.load()?;
        let slot = events
            .iter_mut()
            .find(|e| e.id == event.id)
            .ok_or_else(|| anyhow!("event not found: {}", event.id))?;
        *slot = event;
        self.save(&events)
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn remove(&self, id: Uuid) -> anyhow::Result<Event> {
        let mut events = self.load()?;
        let idx = events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| anyhow!("event not found: {id}"))?;
        let removed = events.remove(idx);
        self.save(&events)?;
        Ok(removed)
    }

    /// Records the current event list so the next `undo` can restore
    /// it. Called before every mutation.
    #[tracing::instrument(skip(self))]
    pub fn push_undo_snapshot(&self) -> anyhow::Result<()> {
        let events = self.load()?;
        let mut entries: Vec<UndoEntry> = load_jsonl(&self.undo_path)?;
        entries.push(UndoEntry { events });
        save_jsonl_atomic(&self.undo_path, &entries)
    }

    #[tracing::instrument(skip(self))]
    pub fn pop_undo_snapshot(&self) -> anyhow::Result<Option<Vec<Event>>> {
        let mut entries: Vec<UndoEntry> = load_jsonl(&self.undo_path)?;
        let Some(entry) = entries.pop() else {
            return Ok(None);
        };
        save_jsonl_atomic(&self.undo_path, &entries)?;
        Ok(Some(entry.events))
    }
}

#[tracing::instrument(skip(path))]
fn load_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: T = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(record);
    }

    debug!(count = out.len(), "loaded jsonl records");
    Ok(out)
}

#[tracing::instrument(skip(path, records))]
fn save_jsonl_atomic<T: Serialize>(path: &Path, records: &[T]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = records.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for record in records {
        let serialized = serde_json::to_string(record)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
