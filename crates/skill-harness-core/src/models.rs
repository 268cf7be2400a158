//! Core data models shared by the core algorithms and the CLI.
//!
//! Field names serialize in camelCase so that the on-disk index and usage
//! files keep the layout existing tooling already reads:
//!
//! ```text
//! index.json  { lastSync, dimensions: { domain, scenario, level }, skills: [...] }
//! usage.json  { usages: [...], learnedScenarios: { id: [phrase, ...] }, stats: {...} }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of learned scenario phrases kept per skill.
pub const MAX_LEARNED_SCENARIOS: usize = 5;

/// Metadata for one skill document, as produced by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMetadata {
    /// Unique, stable key within one index snapshot.
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub domain: String,
    pub scenario: String,
    pub level: String,
    /// Location of the markdown file, relative to the repository checkout.
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl SkillMetadata {
    /// Value of one categorical dimension.
    pub fn dimension(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Domain => &self.domain,
            Dimension::Scenario => &self.scenario,
            Dimension::Level => &self.level,
        }
    }
}

/// The three categorical dimensions every skill is classified along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Domain,
    Scenario,
    Level,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dimension::Domain => "domain",
            Dimension::Scenario => "scenario",
            Dimension::Level => "level",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Dimension {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "domain" => Ok(Dimension::Domain),
            "scenario" => Ok(Dimension::Scenario),
            "level" => Ok(Dimension::Level),
            other => anyhow::bail!(
                "Unknown dimension: '{}'. Must be domain, scenario, or level.",
                other
            ),
        }
    }
}

/// Known values for each dimension, stored alongside the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub domain: Vec<String>,
    pub scenario: Vec<String>,
    pub level: Vec<String>,
}

impl Default for Dimensions {
    fn default() -> Self {
        fn owned(values: &[&str]) -> Vec<String> {
            values.iter().map(|v| v.to_string()).collect()
        }
        Self {
            domain: owned(&[
                "frontend", "backend", "devops", "data", "mobile", "ai", "general",
            ]),
            scenario: owned(&["development", "debugging", "deployment", "testing", "review"]),
            level: owned(&["beginner", "intermediate", "advanced"]),
        }
    }
}

impl Dimensions {
    pub fn values(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::Domain => &self.domain,
            Dimension::Scenario => &self.scenario,
            Dimension::Level => &self.level,
        }
    }
}

/// Index snapshot written after every sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillIndex {
    #[serde(with = "rfc3339_millis")]
    pub last_sync: DateTime<Utc>,
    #[serde(default)]
    pub dimensions: Dimensions,
    pub skills: Vec<SkillMetadata>,
}

impl SkillIndex {
    pub fn get(&self, id: &str) -> Option<&SkillMetadata> {
        self.skills.iter().find(|s| s.id == id)
    }
}

/// Feedback state of a usage record.
///
/// Persisted as `null` / `true` / `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Usefulness {
    /// Loaded, feedback not given yet.
    #[default]
    Pending,
    Useful,
    NotUseful,
}

impl Usefulness {
    pub fn from_useful(useful: bool) -> Self {
        if useful {
            Usefulness::Useful
        } else {
            Usefulness::NotUseful
        }
    }

    pub fn is_pending(self) -> bool {
        self == Usefulness::Pending
    }
}

impl From<Option<bool>> for Usefulness {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Usefulness::Pending,
            Some(useful) => Usefulness::from_useful(useful),
        }
    }
}

impl From<Usefulness> for Option<bool> {
    fn from(value: Usefulness) -> Self {
        match value {
            Usefulness::Pending => None,
            Usefulness::Useful => Some(true),
            Usefulness::NotUseful => Some(false),
        }
    }
}

/// One load event, optionally resolved by feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub skill_id: String,
    #[serde(default)]
    pub query: String,
    #[serde(with = "rfc3339_millis")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub was_useful: Usefulness,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
}

/// Running counters kept next to the usage log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub total_loads: u64,
    pub useful_count: u64,
    pub not_useful_count: u64,
}

/// Ordered learned phrases for one skill, capped at [`MAX_LEARNED_SCENARIOS`].
///
/// Phrases are distinct. Pushing past the cap evicts the oldest phrase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ScenarioList {
    phrases: Vec<String>,
}

impl ScenarioList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `phrase` unless already present.
    ///
    /// Returns `true` if the phrase was added.
    pub fn push(&mut self, phrase: impl Into<String>) -> bool {
        let phrase = phrase.into();
        if self.contains(&phrase) {
            return false;
        }
        self.phrases.push(phrase);
        while self.phrases.len() > MAX_LEARNED_SCENARIOS {
            self.phrases.remove(0);
        }
        true
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.phrases.iter().any(|p| p == phrase)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.phrases
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.phrases.iter()
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

impl From<Vec<String>> for ScenarioList {
    fn from(values: Vec<String>) -> Self {
        let mut list = ScenarioList::new();
        for value in values {
            list.push(value);
        }
        list
    }
}

impl From<ScenarioList> for Vec<String> {
    fn from(list: ScenarioList) -> Self {
        list.phrases
    }
}

impl<'a> IntoIterator for &'a ScenarioList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Learned phrases keyed by skill id.
pub type LearnedScenarios = BTreeMap<String, ScenarioList>;

/// Everything persisted in the usage file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageData {
    /// Append-only, chronological.
    #[serde(default)]
    pub usages: Vec<UsageRecord>,
    #[serde(default)]
    pub learned_scenarios: LearnedScenarios,
    #[serde(default)]
    pub stats: UsageStats,
}

impl UsageData {
    pub fn pending(&self) -> impl Iterator<Item = &UsageRecord> {
        self.usages.iter().filter(|u| u.was_useful.is_pending())
    }
}

/// RFC 3339 timestamps with millisecond precision and a `Z` suffix.
pub mod rfc3339_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
