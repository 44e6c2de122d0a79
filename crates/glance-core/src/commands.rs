use std::io::Read;

use anyhow::{Context, anyhow, bail};
use chrono::{DateTime, Datelike, Local, Utc};
use glance_shared::{EventDto, Tone};
use tracing::{debug, info, instrument};

use crate::cli::Invocation;
use crate::config::Config;
use crate::date::parse_date_key;
use crate::event::Event;
use crate::layout::layout;
use crate::render::{Renderer, short_id};
use crate::store::EventStore;
use crate::viewport::Viewport;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add", "modify", "remove", "list", "year", "export", "import", "undo", "version", "help",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, cfg, renderer, inv))]
pub fn dispatch(
    store: &EventStore,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let command = inv.command.as_str();

    debug!(command, args = ?inv.args, "dispatching command");

    match command {
        "add" => cmd_add(store, &inv.args, now),
        "modify" => cmd_modify(store, &inv.args, now),
        "remove" => cmd_remove(store, &inv.args),
        "list" => cmd_list(store, renderer),
        "year" => cmd_year(store, cfg, renderer, &inv.args),
        "export" => cmd_export(store),
        "import" => cmd_import(store, now),
        "undo" => cmd_undo(store),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" => cmd_help(),
        other => Err(anyhow!("unknown command: {other}")),
    }
}

/// Token-level arguments shared by `add` and `modify`: bare words form
/// the label, `key:value` tokens carry everything else.
#[derive(Debug, Default)]
struct EventArgs {
    label_words: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    tone: Option<Tone>,
    images: Vec<String>,
    description: Option<String>,
}

fn parse_event_args(args: &[String]) -> anyhow::Result<EventArgs> {
    let mut parsed = EventArgs::default();

    for token in args {
        if let Some(value) = token.strip_prefix("start:") {
            parsed.start = Some(value.to_string());
        } else if let Some(value) = token.strip_prefix("end:") {
            parsed.end = Some(value.to_string());
        } else if let Some(value) = token.strip_prefix("tone:") {
            let tone = Tone::parse(value).ok_or_else(|| {
                anyhow!(
                    "unknown tone: {value} (expected one of {})",
                    Tone::ALL.map(|t| t.as_str()).join(", ")
                )
            })?;
            parsed.tone = Some(tone);
        } else if let Some(value) = token.strip_prefix("image:") {
            parsed.images.push(value.to_string());
        } else if let Some(value) = token.strip_prefix("desc:") {
            parsed.description = Some(value.to_string());
        } else {
            parsed.label_words.push(token.clone());
        }
    }

    Ok(parsed)
}

fn resolve_event<'a>(events: &'a [Event], token: &str) -> anyhow::Result<&'a Event> {
    let needle = token.trim().to_ascii_lowercase();
    if needle.is_empty() {
        bail!("an event id (or id prefix) is required");
    }

    let mut matches = events
        .iter()
        .filter(|e| e.id.simple().to_string().starts_with(&needle));
    let first = matches
        .next()
        .ok_or_else(|| anyhow!("no event matches id: {token}"))?;
    if matches.next().is_some() {
        bail!("id prefix is ambiguous: {token}");
    }
    Ok(first)
}

#[instrument(skip(store, args, now))]
fn cmd_add(store: &EventStore, args: &[String], now: DateTime<Utc>) -> anyhow::Result<()> {
    let parsed = parse_event_args(args)?;

    let label = parsed.label_words.join(" ");
    if label.trim().is_empty() {
        bail!("a non-empty label is required");
    }

    let start_key = parsed
        .start
        .or_else(|| parsed.end.clone())
        .ok_or_else(|| anyhow!("start:YYYY-MM-DD is required"))?;
    let end_key = parsed.end.unwrap_or_else(|| start_key.clone());

    let start = parse_date_key(&start_key)?;
    let end = parse_date_key(&end_key)?;

    // Event::new swaps a reversed range.
    let mut event = Event::new(label, start, end, parsed.tone.unwrap_or(Tone::Sea), now);
    event.images = parsed.images;
    event.description = parsed.description.unwrap_or_default();

    store.push_undo_snapshot()?;
    let id = short_id(&event);
    let label = event.label.clone();
    store.add(event)?;

    info!(id = %id, "created event");
    println!("Created event {id} '{label}'");
    Ok(())
}

#[instrument(skip(store, args, now))]
fn cmd_modify(store: &EventStore, args: &[String], now: DateTime<Utc>) -> anyhow::Result<()> {
    let Some((id_token, rest)) = args.split_first() else {
        bail!("usage: glance modify <id> [label words] [start:..] [end:..] [tone:..] [image:..]");
    };

    let events = store.load()?;
    let mut event = resolve_event(&events, id_token)?.clone();

    let parsed = parse_event_args(rest)?;
    if !parsed.label_words.is_empty() {
        event.label = parsed.label_words.join(" ");
    }
    if let Some(start) = parsed.start {
        event.start = parse_date_key(&start)?;
    }
    if let Some(end) = parsed.end {
        event.end = parse_date_key(&end)?;
    }
    if let Some(tone) = parsed.tone {
        event.tone = tone;
    }
    if !parsed.images.is_empty() {
        event.images = parsed.images;
    }
    if let Some(description) = parsed.description {
        event.description = description;
    }
    event.normalize();
    event.modified = now;

    store.push_undo_snapshot()?;
    let id = short_id(&event);
    store.update(event)?;

    info!(id = %id, "modified event");
    println!("Modified event {id}");
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_remove(store: &EventStore, args: &[String]) -> anyhow::Result<()> {
    let Some(id_token) = args.first() else {
        bail!("usage: glance remove <id>");
    };

    let events = store.load()?;
    let id = resolve_event(&events, id_token)?.id;

    store.push_undo_snapshot()?;
    let removed = store.remove(id)?;

    info!(id = %removed.id, "removed event");
    println!("Removed event {} '{}'", short_id(&removed), removed.label);
    Ok(())
}

#[instrument(skip(store, renderer))]
fn cmd_list(store: &EventStore, renderer: &mut Renderer) -> anyhow::Result<()> {
    let mut events = store.load()?;
    events.sort_by_key(|e| (e.start, e.end, e.created));
    renderer.print_event_table(&events)?;
    Ok(())
}

#[instrument(skip(store, cfg, renderer, args))]
fn cmd_year(
    store: &EventStore,
    cfg: &Config,
    renderer: &mut Renderer,
    args: &[String],
) -> anyhow::Result<()> {
    let mut year = Local::now().year();
    let mut width: Option<u32> = None;

    for token in args {
        if let Some(value) = token.strip_prefix("width:") {
            width = Some(
                value
                    .parse()
                    .with_context(|| format!("invalid width: {value}"))?,
            );
        } else if token.len() == 4 && token.chars().all(|c| c.is_ascii_digit()) {
            year = token
                .parse()
                .with_context(|| format!("invalid year: {token}"))?;
        } else {
            bail!("unexpected argument: {token} (usage: glance year [YYYY] [width:N])");
        }
    }

    let width = match width {
        Some(value) => value,
        None => {
            let raw = cfg.get("calendar.width").unwrap_or_else(|| "112".to_string());
            raw.trim()
                .parse()
                .with_context(|| format!("invalid calendar.width: {raw}"))?
        }
    };

    let viewport = Viewport::from_config(cfg)?;
    let plan = viewport.plan(width);
    let events = store.load()?;
    let result = layout(year, plan.columns, &events)?;

    debug!(year, width, columns = plan.columns, "rendering year view");
    renderer.print_year(&result, plan.cell_size)?;
    Ok(())
}

#[instrument(skip(store))]
fn cmd_export(store: &EventStore) -> anyhow::Result<()> {
    let events = store.load()?;
    let dtos: Vec<EventDto> = events.iter().map(Event::to_dto).collect();
    let json = serde_json::to_string_pretty(&dtos)?;
    println!("{json}");
    Ok(())
}

#[instrument(skip(store, now))]
fn cmd_import(store: &EventStore, now: DateTime<Utc>) -> anyhow::Result<()> {
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("failed reading stdin")?;

    let dtos: Vec<EventDto> = serde_json::from_str(&raw).context("invalid import payload")?;

    store.push_undo_snapshot()?;
    let mut events = store.load()?;
    let mut created = 0usize;
    let mut updated = 0usize;

    for dto in &dtos {
        let incoming = Event::from_dto(dto, now)?;
        match events.iter_mut().find(|e| e.id == incoming.id) {
            Some(existing) => {
                *existing = incoming;
                updated += 1;
            }
            None => {
                events.push(incoming);
                created += 1;
            }
        }
    }

    store.save(&events)?;
    info!(created, updated, "imported events");
    println!("Imported {created} new, {updated} updated");
    Ok(())
}

#[instrument(skip(store))]
fn cmd_undo(store: &EventStore) -> anyhow::Result<()> {
    match store.pop_undo_snapshot()? {
        Some(events) => {
            store.save(&events)?;
            println!("Restored {} event(s)", events.len());
            Ok(())
        }
        None => {
            println!("Nothing to undo");
            Ok(())
        }
    }
}

fn cmd_help() -> anyhow::Result<()> {
    println!("usage: glance [OPTIONS] <command> [args]");
    println!();
    println!("commands:");
    println!("  add <label..> start:YYYY-MM-DD [end:..] [tone:..] [image:..] [desc:..]");
    println!("  modify <id> [label..] [start:..] [end:..] [tone:..] [image:..] [desc:..]");
    println!("  remove <id>");
    println!("  list                   tabular event listing");
    println!("  year [YYYY] [width:N]  paint the year grid");
    println!("  export / import        JSON event interchange on stdout/stdin");
    println!("  undo                   restore the event list before the last change");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use glance_shared::Tone;

    use super::{expand_command_abbrev, known_command_names, parse_event_args, resolve_event};
    use crate::date::parse_date_key;
    use crate::event::Event;

    #[test]
    fn abbreviations_expand_uniquely() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("li", &known), Some("list"));
        assert_eq!(expand_command_abbrev("add", &known), Some("add"));
        assert_eq!(expand_command_abbrev("y", &known), Some("year"));
        assert_eq!(expand_command_abbrev("x", &known), None);
    }

    #[test]
    fn event_args_split_label_from_modifiers() {
        let args: Vec<String> = [
            "Summer",
            "holiday",
            "start:2026-07-01",
            "end:2026-07-21",
            "tone:sunset",
            "image:https://example.com/beach.jpg",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let parsed = parse_event_args(&args).expect("parse args");
        assert_eq!(parsed.label_words.join(" "), "Summer holiday");
        assert_eq!(parsed.start.as_deref(), Some("2026-07-01"));
        assert_eq!(parsed.end.as_deref(), Some("2026-07-21"));
        assert_eq!(parsed.tone, Some(Tone::Sunset));
        assert_eq!(parsed.images.len(), 1);
    }

    #[test]
    fn unknown_tone_is_rejected() {
        let args = vec!["x".to_string(), "tone:chartreuse".to_string()];
        assert!(parse_event_args(&args).is_err());
    }

    #[test]
    fn id_prefixes_resolve_uniquely() {
        let now = Utc::now();
        let events = vec![
            Event::new(
                "a".to_string(),
                parse_date_key("2026-01-01").expect("date"),
                parse_date_key("2026-01-02").expect("date"),
                Tone::Sea,
                now,
            ),
            Event::new(
                "b".to_string(),
                parse_date_key("2026-02-01").expect("date"),
                parse_date_key("2026-02-02").expect("date"),
                Tone::Ink,
                now,
            ),
        ];

        let prefix = events[0].id.simple().to_string()[..8].to_string();
        let found = resolve_event(&events, &prefix).expect("resolve");
        assert_eq!(found.id, events[0].id);

        assert!(resolve_event(&events, "").is_err());
        assert!(resolve_event(&events, "zzzzzzzz").is_err());
    }
}
