use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Opaque ID types for type safety
pub type ConnectionId = String;
pub type ParticipantId = String;

/// Duration used when a question arrives without one (or with zero)
pub const DEFAULT_QUESTION_DURATION_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "teacher")]
    Presenter,
    #[serde(alias = "student")]
    Participant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub name: String,
    pub role: Role,
    pub connection_id: ConnectionId,
}

/// A poll question as sent by the presenter.
///
/// Kept exactly as received so `newQuestion` can echo it back; the effective
/// duration is resolved through [`Question::duration_or`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
    /// Countdown in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl Question {
    /// Effective countdown, falling back to `default_ms` when absent or zero
    pub fn duration_or(&self, default_ms: u64) -> Duration {
        match self.duration {
            Some(ms) if ms > 0 => Duration::from_millis(ms),
            _ => Duration::from_millis(default_ms),
        }
    }
}

/// Percentage of the total vote per declared option, in declaration order.
///
/// Serialized as a JSON object `{ "option": percentage }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PercentageResult(Vec<(String, f64)>);

impl PercentageResult {
    pub fn new(entries: Vec<(String, f64)>) -> Self {
        Self(entries)
    }

    pub fn get(&self, option: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(name, _)| name == option)
            .map(|(_, pct)| *pct)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, pct)| (name.as_str(), *pct))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for PercentageResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (option, pct) in &self.0 {
            map.serialize_entry(option, pct)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PercentageResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResultVisitor;

        impl<'de> Visitor<'de> for ResultVisitor {
            type Value = PercentageResult;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of option to percentage")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((option, pct)) = access.next_entry::<String, f64>()? {
                    entries.push((option, pct));
                }
                Ok(PercentageResult(entries))
            }
        }

        deserializer.deserialize_map(ResultVisitor)
    }
}

/// A persisted record of one finished poll
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PollRecord {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub duration_ms: u64,
    pub asked_at: String, // ISO timestamp
    pub closed_at: String,
    /// Final percentages at close
    pub results: PercentageResult,
}

impl PollRecord {
    pub fn from_closed(
        question: &Question,
        duration: Duration,
        asked_at: DateTime<Utc>,
        results: PercentageResult,
    ) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            question: question.text.clone(),
            options: question.options.clone(),
            duration_ms: duration.as_millis() as u64,
            asked_at: asked_at.to_rfc3339(),
            closed_at: Utc::now().to_rfc3339(),
            results,
        }
    }
}
