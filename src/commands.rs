//! Command handlers behind the `skills` binary.
//!
//! Every handler returns the text to print so that the binary stays a thin
//! dispatcher and the handlers can be tested directly.

use anyhow::{Context, Result};
use chrono::Local;
use skill_harness_core::keywords::extract_keywords;
use skill_harness_core::models::{Dimension, SkillIndex, SkillMetadata};
use skill_harness_core::prefilter::{pre_filter, ranked_candidates, PreFilterOptions};
use skill_harness_core::score::score_breakdown;
use skill_harness_core::usage::UsageLearner;
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::config::{save_config, Config};
use crate::index::{build_index, filter_by_dimension, get_skill_by_id, load_index, save_index};
use crate::loader::{format_tags, load_skill_content, load_skills};
use crate::prompt::{
    build_compact_summary, build_match_prompt, format_match_results, parse_match_response,
};
use crate::sync::sync_repository;
use crate::usage_store::{pending_usages, render_stats, JsonUsageBackend};

pub const NO_INDEX: &str = "No skills indexed. Run `skills sync` first.";

/// Parse a `DIMENSION=VALUE` filter such as `domain=frontend`.
pub fn parse_dimension_filter(s: &str) -> Result<(Dimension, String)> {
    let (dimension, value) = s
        .split_once('=')
        .with_context(|| format!("Invalid filter '{}'. Expected DIMENSION=VALUE.", s))?;
    let dimension: Dimension = dimension.trim().parse()?;
    let value = value.trim();
    if value.is_empty() {
        anyhow::bail!("Filter '{}' has an empty value.", s);
    }
    Ok((dimension, value.to_string()))
}

/// Loaded configuration plus where it came from.
pub struct App {
    pub config: Config,
    pub config_path: PathBuf,
    learner: UsageLearner<JsonUsageBackend>,
}

impl App {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        let learner = UsageLearner::new(JsonUsageBackend::new(config.usage_path()));
        Self {
            config,
            config_path,
            learner,
        }
    }

    pub fn learner(&self) -> &UsageLearner<JsonUsageBackend> {
        &self.learner
    }

    /// Current index, syncing first when none exists and auto-sync is on.
    async fn index(&self) -> Result<Option<SkillIndex>> {
        if let Some(index) = load_index(&self.config.index_path()) {
            return Ok(Some(index));
        }
        if self.config.cache.auto_sync && self.config.repo.is_configured() {
            tracing::info!("no index found, running automatic sync");
            let summary = self.sync().await?;
            tracing::info!("{}", summary.replace('\n', " "));
            return Ok(load_index(&self.config.index_path()));
        }
        Ok(None)
    }

    /// Sync the repository and rebuild the index.
    pub async fn sync(&self) -> Result<String> {
        let config = self.config.clone();
        let config_path = self.config_path.clone();
        let (outcome, index) = tokio::task::spawn_blocking(move || -> Result<_> {
            let outcome = sync_repository(&config, &config_path)?;
            let index = build_index(&config.repo_path(), &config.index.exclude_globs)?;
            save_index(&config.index_path(), &index)?;
            Ok((outcome, index))
        })
        .await
        .context("Sync task failed")??;

        Ok(format!(
            "{}\nIndexed {} skills.",
            outcome.message(),
            index.skills.len()
        ))
    }

    /// Skills grouped by domain, in first-seen order, optionally narrowed
    /// to one dimension value.
    pub async fn list(&self, filter: Option<(Dimension, &str)>) -> Result<String> {
        let index = match self.index().await? {
            Some(index) if !index.skills.is_empty() => index,
            _ => return Ok(NO_INDEX.to_string()),
        };

        let skills: Vec<&SkillMetadata> = match filter {
            Some((dimension, value)) => filter_by_dimension(&index, dimension, value),
            None => index.skills.iter().collect(),
        };

        let mut out = String::new();
        match filter {
            Some((dimension, value)) => {
                if skills.is_empty() {
                    let known = index.dimensions.values(dimension).join(", ");
                    return Ok(format!(
                        "No skills with {} \"{}\". Known values: {}",
                        dimension, value, known
                    ));
                }
                let _ = writeln!(
                    out,
                    "# Skills with {} \"{}\" ({} of {} total)\n",
                    dimension,
                    value,
                    skills.len(),
                    index.skills.len()
                );
            }
            None => {
                let _ = writeln!(out, "# Available Skills ({} total)\n", index.skills.len());
            }
        }
        let _ = writeln!(out, "Last synced: {}\n", rfc3339(&index));

        let mut groups: Vec<(&str, Vec<&SkillMetadata>)> = Vec::new();
        for skill in skills {
            let domain = if skill.domain.is_empty() {
                "general"
            } else {
                skill.domain.as_str()
            };
            match groups.iter_mut().find(|(d, _)| *d == domain) {
                Some((_, members)) => members.push(skill),
                None => groups.push((domain, vec![skill])),
            }
        }

        for (domain, members) in groups {
            let _ = writeln!(out, "## {}\n", capitalize(domain));
            for skill in members {
                let _ = writeln!(out, "- **{}** (`{}`)", skill.name, skill.id);
                let _ = writeln!(out, "  {}", skill.description);
                let _ = writeln!(out, "  Tags: {}\n", format_tags(skill));
            }
        }
        Ok(out)
    }

    /// Candidate prompt for the external ranking step. `compact` prints
    /// one line per candidate instead of the full request.
    pub async fn load(&self, query: &str, compact: bool) -> Result<String> {
        let index = match self.index().await? {
            Some(index) if !index.skills.is_empty() => index,
            _ => return Ok(NO_INDEX.to_string()),
        };
        let learned = self.learner.learned_scenarios().await?;
        if compact {
            let options = PreFilterOptions {
                max_results: self.config.retrieval.max_candidates,
                learned: Some(&learned),
            };
            let candidates = pre_filter(query, &index.skills, &options);
            return Ok(format!(
                "# Skill Candidates ({} from {} total)\n\n{}",
                candidates.len(),
                index.skills.len(),
                build_compact_summary(&candidates)
            ));
        }
        let prompt = build_match_prompt(
            query,
            &index,
            Some(&learned),
            self.config.retrieval.max_candidates,
        );
        Ok(format!("# Skills Load Request\n\n{}", prompt))
    }

    /// Raw pre-filter output with scores.
    pub async fn candidates(
        &self,
        query: &str,
        limit: Option<usize>,
        explain: bool,
    ) -> Result<String> {
        let index = match self.index().await? {
            Some(index) if !index.skills.is_empty() => index,
            _ => return Ok(NO_INDEX.to_string()),
        };
        let learned = self.learner.learned_scenarios().await?;
        let options = PreFilterOptions {
            max_results: limit.unwrap_or(self.config.retrieval.max_candidates),
            learned: Some(&learned),
        };
        let ranked = ranked_candidates(query, &index.skills, &options);
        let keywords = extract_keywords(query);

        let mut out = String::new();
        if keywords.is_empty() {
            out.push_str("No keywords extracted; showing skills in index order.\n\n");
        } else {
            let _ = writeln!(out, "Keywords: {}\n", keywords.join(", "));
        }
        for (i, candidate) in ranked.iter().enumerate() {
            let skill = candidate.skill;
            let _ = writeln!(
                out,
                "{:>3}. {:<32} score {:>3}  [{} / {} / {}]",
                i + 1,
                skill.id,
                candidate.score,
                skill.domain,
                skill.scenario,
                skill.level
            );
            if explain && !keywords.is_empty() {
                let breakdown = score_breakdown(&keywords, skill, learned.get(&skill.id));
                for hit in breakdown.hits {
                    let _ = writeln!(out, "       {:<20} {} (+{})", hit.keyword, hit.bucket, hit.weight);
                }
            }
        }
        Ok(out)
    }

    /// Read the assistant's JSON selection and list the skills it picked.
    pub async fn select(&self, response: &str) -> Result<String> {
        let index = match self.index().await? {
            Some(index) => index,
            None => return Ok(NO_INDEX.to_string()),
        };
        let results = parse_match_response(response, &index);
        if results.is_empty() {
            tracing::warn!("selection named no known skills");
            return Ok(format_match_results(&results));
        }
        let ids: Vec<&str> = results.iter().map(|r| r.skill.id.as_str()).collect();
        Ok(format!(
            "{}\n\nLoad with: `skills inject {}`",
            format_match_results(&results),
            ids.join(" ")
        ))
    }

    /// Metadata header and body of one skill.
    pub async fn show(&self, id: &str) -> Result<String> {
        let index = match self.index().await? {
            Some(index) => index,
            None => return Ok(NO_INDEX.to_string()),
        };
        let Some(skill) = get_skill_by_id(&index, id) else {
            return Ok(format!(
                "Skill \"{}\" not found. Run `skills list` to see available skills.",
                id
            ));
        };
        let content = load_skill_content(&self.config.repo_path(), skill);

        Ok(format!(
            "# {}\n\n**ID:** `{}`\n**Domain:** {} | **Scenario:** {} | **Level:** {}\n**Tags:** {}\n**Version:** {}\n\n---\n\n{}",
            skill.name,
            skill.id,
            skill.domain,
            skill.scenario,
            skill.level,
            format_tags(skill),
            skill.version.as_deref().unwrap_or("N/A"),
            content
        ))
    }

    /// Load skills by id, recording a pending usage for each one found.
    pub async fn inject(&self, ids: &[String], query: Option<&str>) -> Result<String> {
        let index = match self.index().await? {
            Some(index) => index,
            None => return Ok(NO_INDEX.to_string()),
        };

        let mut skills: Vec<&SkillMetadata> = Vec::new();
        for id in ids {
            match get_skill_by_id(&index, id) {
                Some(skill) => skills.push(skill),
                None => tracing::warn!(id = id.as_str(), "unknown skill id, ignoring"),
            }
        }
        if skills.is_empty() {
            return Ok("No valid skill IDs provided.".to_string());
        }

        let query = query.unwrap_or("");
        for skill in &skills {
            self.learner.record_load(&skill.id, query).await?;
        }
        Ok(load_skills(&self.config.repo_path(), &skills))
    }

    pub async fn feedback(&self, id: &str, useful: bool, scenario: Option<&str>) -> Result<String> {
        let outcome = self.learner.mark_feedback(id, useful, scenario).await?;
        Ok(outcome.message())
    }

    pub async fn stats(&self) -> Result<String> {
        Ok(render_stats(&self.learner.snapshot().await?))
    }

    /// Loads still waiting for feedback.
    pub async fn pending(&self) -> Result<String> {
        let data = self.learner.snapshot().await?;
        let pending = pending_usages(&data);
        if pending.is_empty() {
            return Ok("No usages awaiting feedback.".to_string());
        }

        let mut out = format!("# Pending Feedback ({})\n\n", pending.len());
        for usage in pending {
            let query = if usage.query.is_empty() {
                "(no query)".to_string()
            } else {
                format!("\"{}\"", usage.query)
            };
            let _ = writeln!(
                out,
                "- {}: **{}** {}",
                usage.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                usage.skill_id,
                query
            );
        }
        out.push_str("\nResolve with `skills feedback <id> useful|notuseful [scenario]`.\n");
        Ok(out)
    }

    /// Show the configuration, or set the repository URL and save it.
    pub fn config(&mut self, url: Option<&str>) -> Result<String> {
        if let Some(url) = url {
            self.config.repo.url = url.trim().to_string();
            save_config(&self.config_path, &self.config)?;
            return Ok(format!("Repository URL updated to: {}", self.config.repo.url));
        }

        let cfg = &self.config;
        Ok(format!(
            "# Current Configuration\n\n\
             - **Config File:** {}\n\
             - **Repository URL:** {}\n\
             - **Branch:** {}\n\
             - **Cache Directory:** {}\n\
             - **Auto Sync:** {}\n\
             - **Max Candidates:** {}\n\n\
             To update, use: `skills config <repo-url>`",
            self.config_path.display(),
            cfg.repo.url,
            cfg.repo.branch.as_deref().unwrap_or("(remote default)"),
            cfg.cache_dir().display(),
            cfg.cache.auto_sync,
            cfg.retrieval.max_candidates,
        ))
    }
}

fn rfc3339(index: &SkillIndex) -> String {
    index
        .last_sync
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
