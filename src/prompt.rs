//! Candidate prompt for the external ranking step.
//!
//! The pre-filter narrows the index to a short candidate list; this module
//! renders that list as a markdown request asking an assistant to pick the
//! best few, confirm with the user, and load them with `skills inject`. It
//! can also read the assistant's JSON selection back.

use serde::Deserialize;
use skill_harness_core::keywords::extract_keywords;
use skill_harness_core::models::{LearnedScenarios, SkillIndex, SkillMetadata};
use skill_harness_core::prefilter::{pre_filter, PreFilterOptions};
use std::fmt::Write as _;

use crate::loader::format_tags;

/// Candidate ids listed inline in the selection step.
const LISTED_IDS: usize = 10;
const SUMMARY_TAGS: usize = 3;
const SUMMARY_DESCRIPTION: usize = 100;

/// Render the matching request for `query`.
pub fn build_match_prompt(
    query: &str,
    index: &SkillIndex,
    learned: Option<&LearnedScenarios>,
    max_candidates: usize,
) -> String {
    let options = PreFilterOptions {
        max_results: max_candidates,
        learned,
    };
    let candidates = pre_filter(query, &index.skills, &options);
    let keywords = extract_keywords(query);

    let mut out = String::new();
    out.push_str("## Skills Matching Request\n\n");
    let _ = writeln!(out, "**User Query:** \"{}\"", query);
    if !keywords.is_empty() {
        let _ = writeln!(out, "**Extracted Keywords:** {}", keywords.join(", "));
    }
    let _ = writeln!(
        out,
        "\n**Pre-filtered Candidates ({} from {} total):**\n",
        candidates.len(),
        index.skills.len()
    );

    let summary: Vec<String> = candidates
        .iter()
        .enumerate()
        .map(|(i, skill)| {
            format!(
                "{}. [{}] {}\n   - domain: {} | scenario: {} | level: {}\n   - tags: {}\n   - {}",
                i + 1,
                skill.id,
                skill.name,
                skill.domain,
                skill.scenario,
                skill.level,
                format_tags(skill),
                skill.description
            )
        })
        .collect();
    out.push_str(&summary.join("\n\n"));

    let mut listed: Vec<&str> = candidates
        .iter()
        .take(LISTED_IDS)
        .map(|s| s.id.as_str())
        .collect();
    if candidates.len() > LISTED_IDS {
        listed.push("...");
    }

    let _ = write!(
        out,
        r#"

---

## Your Task

Analyze the user's query and select the most relevant skills from the pre-filtered candidates above.

### Step 1: Analysis
Think about which skills best match the user's needs based on:
- Direct keyword matches in name, description, and tags
- Domain and scenario relevance
- Level appropriateness

### Step 2: Selection
Select up to 5 most relevant skills. For each selected skill, note:
- The skill ID (must be one of: {ids})
- Relevance score (1-10)
- Brief reason why it's relevant

### Step 3: Present Recommendations
Present your recommendations to the user in this format:

---
**Recommended Skills for "{query}":**

1. **[skill-name]** (`skill-id`) - Relevance: X/10
   Reason: [why this skill is relevant]

2. ...
---

### Step 4: Load Skills
After presenting recommendations, ask the user:
"Would you like me to load these skills? (yes/no/select specific numbers)"

### Step 5: Execute Loading
- If confirmed: run the command below with ALL recommended skill IDs
- If the user selects specific numbers: run it with only those skill IDs
- If "no": acknowledge and end

**Command to load skills:**
```bash
skills inject --query "{query}" <skill-id-1> <skill-id-2> ...
```

After loading, use the skill content to help the user with their original task. Once done, report back with `skills feedback <skill-id> useful|notuseful`.
"#,
        ids = listed.join(", "),
        query = query.replace('"', "\\\""),
    );

    out
}

/// One skill per line: id, name, up to three tags, shortened description.
pub fn build_compact_summary(skills: &[&SkillMetadata]) -> String {
    skills
        .iter()
        .enumerate()
        .map(|(i, skill)| {
            let tags = if skill.tags.is_empty() {
                String::new()
            } else {
                let shown: Vec<&str> = skill
                    .tags
                    .iter()
                    .take(SUMMARY_TAGS)
                    .map(String::as_str)
                    .collect();
                format!(" [{}]", shown.join(", "))
            };
            let description: String = skill.description.chars().take(SUMMARY_DESCRIPTION).collect();
            format!("{}. {}: {}{} - {}", i + 1, skill.id, skill.name, tags, description)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Deserialize)]
struct Selection {
    id: String,
    #[serde(default)]
    relevance: f64,
    #[serde(default)]
    reason: String,
}

/// A skill picked by the ranking step.
#[derive(Debug, Clone)]
pub struct MatchResult<'a> {
    pub skill: &'a SkillMetadata,
    pub relevance: f64,
    pub reason: String,
}

/// Read a JSON array of `{id, relevance, reason}` out of a free-text
/// response. Unknown ids are dropped; results are sorted by relevance.
/// Anything unparsable yields an empty list.
pub fn parse_match_response<'a>(response: &str, index: &'a SkillIndex) -> Vec<MatchResult<'a>> {
    let (Some(start), Some(end)) = (response.find('['), response.rfind(']')) else {
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }

    let selections: Vec<Selection> = match serde_json::from_str(&response[start..=end]) {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(error = %e, "unparsable match response");
            return Vec::new();
        }
    };

    let mut results: Vec<MatchResult<'a>> = selections
        .into_iter()
        .filter_map(|sel| {
            index.get(&sel.id).map(|skill| MatchResult {
                skill,
                relevance: sel.relevance,
                reason: sel.reason,
            })
        })
        .collect();
    results.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
    results
}

/// Numbered markdown list of match results.
pub fn format_match_results(results: &[MatchResult<'_>]) -> String {
    if results.is_empty() {
        return "No matching skills found.".to_string();
    }
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. **{}** ({})\n   - Domain: {} | Scenario: {} | Level: {}\n   - {}\n   - Relevance: {}/10 - {}",
                i + 1,
                r.skill.name,
                r.skill.id,
                r.skill.domain,
                r.skill.scenario,
                r.skill.level,
                r.skill.description,
                r.relevance,
                r.reason
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
