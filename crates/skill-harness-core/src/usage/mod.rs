//! Usage learning: load events, feedback, and learned scenario phrases.
//!
//! Every load of a skill appends a pending [`UsageRecord`]. Feedback later
//! resolves the most recent pending record for that skill; when the skill
//! was useful, a short phrase derived from the original query (or supplied
//! by the caller) is remembered for the skill. The pre-filter reads those
//! phrases back as extra searchable text, so confirmed-useful skills rank
//! higher for similar queries.
//!
//! The mutation logic lives in plain functions over [`UsageData`]
//! ([`apply_load`], [`apply_feedback`]). [`UsageLearner`] wraps them in
//! load-mutate-save cycles against a [`UsageBackend`], one cycle at a time.
//!
//! # Concurrency
//!
//! Cycles are serialized within one `UsageLearner`. Two processes sharing
//! one backing file are not coordinated: the last writer wins. Feedback
//! matches the most recent pending record for a skill, which assumes loads
//! and feedback for the same skill arrive in order.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::keywords::extract_keywords;
use crate::models::{LearnedScenarios, UsageData, UsageRecord, Usefulness};

/// Number of query keywords kept in a derived scenario phrase.
pub const SCENARIO_KEYWORDS: usize = 5;

/// Persistence for [`UsageData`].
///
/// `load` should recover from unreadable or malformed data by returning
/// [`UsageData::default`]; `save` must report write failures.
#[async_trait]
pub trait UsageBackend: Send + Sync {
    /// Read the full usage store.
    async fn load(&self) -> Result<UsageData>;

    /// Replace the full usage store.
    async fn save(&self, data: &UsageData) -> Result<()>;
}

/// Result of [`apply_feedback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackOutcome {
    pub skill_id: String,
    pub useful: bool,
    /// True if a pending record was resolved, false if a new record was
    /// appended.
    pub resolved_pending: bool,
    /// Phrase newly added to the skill's learned scenarios.
    pub learned: Option<String>,
}

impl FeedbackOutcome {
    /// Human-readable confirmation.
    pub fn message(&self) -> String {
        match (self.useful, &self.learned) {
            (true, Some(phrase)) => format!(
                "Marked \"{}\" as useful. Learned scenario: \"{}\"",
                self.skill_id, phrase
            ),
            (true, None) => format!("Marked \"{}\" as useful.", self.skill_id),
            (false, _) => format!("Marked \"{}\" as not useful.", self.skill_id),
        }
    }
}

/// Derive a scenario phrase from a query: its first few keywords.
pub fn scenario_from_query(query: &str) -> String {
    extract_keywords(query)
        .into_iter()
        .take(SCENARIO_KEYWORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Record one load of `skill_id` as a pending usage.
pub fn apply_load(data: &mut UsageData, skill_id: &str, query: &str, now: DateTime<Utc>) {
    data.usages.push(UsageRecord {
        skill_id: skill_id.to_string(),
        query: query.to_string(),
        timestamp: now,
        was_useful: Usefulness::Pending,
        scenario: None,
    });
    data.stats.total_loads += 1;
}

/// Resolve feedback for `skill_id`.
///
/// Searches backwards for the most recent pending record of the skill and
/// resolves it; with none pending, appends an already-resolved record with
/// an empty query. A useful outcome learns `scenario` if given, otherwise
/// a phrase derived from the record's query. Empty phrases are never
/// learned.
pub fn apply_feedback(
    data: &mut UsageData,
    skill_id: &str,
    useful: bool,
    scenario: Option<&str>,
    now: DateTime<Utc>,
) -> FeedbackOutcome {
    let scenario = scenario.map(str::trim).filter(|s| !s.is_empty());
    let verdict = Usefulness::from_useful(useful);

    let pending = data
        .usages
        .iter()
        .rposition(|u| u.skill_id == skill_id && u.was_useful.is_pending());

    let index = match pending {
        Some(i) => {
            let record = &mut data.usages[i];
            record.was_useful = verdict;
            if let Some(s) = scenario {
                record.scenario = Some(s.to_string());
            }
            i
        }
        None => {
            data.usages.push(UsageRecord {
                skill_id: skill_id.to_string(),
                query: String::new(),
                timestamp: now,
                was_useful: verdict,
                scenario: scenario.map(str::to_string),
            });
            data.usages.len() - 1
        }
    };

    let mut learned = None;
    if useful {
        data.stats.useful_count += 1;

        let phrase = match scenario {
            Some(s) => s.to_string(),
            None => scenario_from_query(&data.usages[index].query),
        };
        if !phrase.is_empty() {
            let list = data
                .learned_scenarios
                .entry(skill_id.to_string())
                .or_default();
            if list.push(phrase.clone()) {
                learned = Some(phrase);
            }
        }
    } else {
        data.stats.not_useful_count += 1;
    }

    FeedbackOutcome {
        skill_id: skill_id.to_string(),
        useful,
        resolved_pending: pending.is_some(),
        learned,
    }
}

/// Runs usage operations as serialized load-mutate-save cycles.
pub struct UsageLearner<B> {
    backend: B,
    cycle: Mutex<()>,
}

impl<B: UsageBackend> UsageLearner<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cycle: Mutex::new(()),
        }
    }

    /// Append a pending usage for `skill_id` and count the load.
    pub async fn record_load(&self, skill_id: &str, query: &str) -> Result<()> {
        let _guard = self.cycle.lock().await;
        let mut data = self.backend.load().await?;
        apply_load(&mut data, skill_id, query, Utc::now());
        self.backend.save(&data).await?;
        tracing::debug!(skill_id, "recorded pending usage");
        Ok(())
    }

    /// Resolve feedback for `skill_id`. See [`apply_feedback`].
    pub async fn mark_feedback(
        &self,
        skill_id: &str,
        useful: bool,
        scenario: Option<&str>,
    ) -> Result<FeedbackOutcome> {
        let _guard = self.cycle.lock().await;
        let mut data = self.backend.load().await?;
        let outcome = apply_feedback(&mut data, skill_id, useful, scenario, Utc::now());
        self.backend.save(&data).await?;
        if let Some(phrase) = &outcome.learned {
            tracing::info!(skill_id, phrase = phrase.as_str(), "learned scenario");
        }
        Ok(outcome)
    }

    /// Snapshot of all learned scenario phrases.
    pub async fn learned_scenarios(&self) -> Result<LearnedScenarios> {
        Ok(self.snapshot().await?.learned_scenarios)
    }

    /// Snapshot of the whole usage store.
    pub async fn snapshot(&self) -> Result<UsageData> {
        let _guard = self.cycle.lock().await;
        self.backend.load().await
    }
}
