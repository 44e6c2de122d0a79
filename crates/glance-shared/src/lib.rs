//! Wire contract between the glance core and any frontend shell.
//!
//! Dates travel as `YYYY-MM-DD` strings; the core owns parsing and
//! range normalization.

use serde::{
  Deserialize,
  Serialize
};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
  Sea,
  Sunset,
  Orchid,
  Ink
}

impl Tone {
  pub const ALL: [Tone; 4] = [
    Tone::Sea,
    Tone::Sunset,
    Tone::Orchid,
    Tone::Ink,
  ];

  #[must_use]
  pub fn as_str(self) -> &'static str {
    match self {
      | Tone::Sea => "sea",
      | Tone::Sunset => "sunset",
      | Tone::Orchid => "orchid",
      | Tone::Ink => "ink"
    }
  }

  #[must_use]
  pub fn parse(
    token: &str
  ) -> Option<Tone> {
    match token
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "sea" => Some(Tone::Sea),
      | "sunset" => Some(Tone::Sunset),
      | "orchid" => Some(Tone::Orchid),
      | "ink" => Some(Tone::Ink),
      | _ => None
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct EventDto {
  pub id:    Uuid,
  pub label: String,
  pub start: String,
  pub end:   String,
  pub tone:  Tone,
  #[serde(default)]
  pub images: Vec<String>,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub created_at_ms: Option<i64>
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct EventCreate {
  pub label: String,
  pub start: String,
  pub end:   String,
  pub tone:  Tone,
  #[serde(default)]
  pub images: Vec<String>,
  pub description: Option<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
)]
pub struct EventPatch {
  pub label:  Option<String>,
  pub start:  Option<String>,
  pub end:    Option<String>,
  pub tone:   Option<Tone>,
  pub images: Option<Vec<String>>,
  pub description:
    Option<Option<String>>
}
