//! JSON-file usage store and the reports built from it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use skill_harness_core::models::{UsageData, UsageRecord, Usefulness};
use skill_harness_core::usage::UsageBackend;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::persist::write_atomic;

const RECENT_ACTIVITY: usize = 10;

/// [`UsageBackend`] over a single `usage.json` file.
///
/// Unreadable or malformed files load as an empty store; the next save
/// replaces them.
#[derive(Debug, Clone)]
pub struct JsonUsageBackend {
    path: PathBuf,
}

impl JsonUsageBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UsageBackend for JsonUsageBackend {
    async fn load(&self) -> Result<UsageData> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(UsageData::default()),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read usage store, starting empty");
                return Ok(UsageData::default());
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(data) => Ok(data),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "malformed usage store, starting empty");
                Ok(UsageData::default())
            }
        }
    }

    async fn save(&self, data: &UsageData) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(data).context("Failed to serialize usage store")?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .context("Usage store writer task failed")?
            .with_context(|| format!("Failed to save usage store: {}", self.path.display()))
    }
}

/// Usage records still waiting for feedback, oldest first.
pub fn pending_usages(data: &UsageData) -> Vec<&UsageRecord> {
    data.pending().collect()
}

fn status_label(usefulness: Usefulness) -> &'static str {
    match usefulness {
        Usefulness::Pending => "⏳ pending",
        Usefulness::Useful => "✅ useful",
        Usefulness::NotUseful => "❌ not useful",
    }
}

/// Markdown usage report.
pub fn render_stats(data: &UsageData) -> String {
    let stats = &data.stats;
    let pending = data.pending().count();
    let rate = if stats.total_loads > 0 {
        format!("{:.1}", stats.useful_count as f64 / stats.total_loads as f64 * 100.0)
    } else {
        "0".to_string()
    };

    let mut out = String::new();
    out.push_str("# Skills Usage Statistics\n\n## Overview\n");
    let _ = writeln!(out, "- **Total Loads:** {}", stats.total_loads);
    let _ = writeln!(out, "- **Useful:** {} ({}%)", stats.useful_count, rate);
    let _ = writeln!(out, "- **Not Useful:** {}", stats.not_useful_count);
    let _ = writeln!(out, "- **Pending Feedback:** {}", pending);

    out.push_str("\n## Learned Scenarios\n");
    if data.learned_scenarios.is_empty() {
        out.push_str(
            "\nNo learned scenarios yet. Use `skills feedback <id> useful` to teach the system.\n",
        );
    } else {
        for (skill_id, phrases) in &data.learned_scenarios {
            let _ = writeln!(out, "\n### {}", skill_id);
            for phrase in phrases {
                let _ = writeln!(out, "- {}", phrase);
            }
        }
    }

    out.push_str("\n## Recent Activity\n");
    if data.usages.is_empty() {
        out.push_str("\nNo recent activity.\n");
    } else {
        for usage in data.usages.iter().rev().take(RECENT_ACTIVITY) {
            let date = usage.timestamp.with_timezone(&Local).format("%Y-%m-%d");
            let _ = writeln!(
                out,
                "- {}: **{}** - {}",
                date,
                usage.skill_id,
                status_label(usage.was_useful)
            );
        }
    }

    out
}
