//! Local keyword pre-filter that narrows the full skill set to a bounded
//! candidate list before an external ranking step.
//!
//! # Algorithm
//!
//! 1. Extract keywords from the query. With no keywords, return the first
//!    `max_results` skills in collection order.
//! 2. Score every skill, using its learned scenarios when present.
//! 3. Keep skills scoring above zero, sorted by score descending. The sort
//!    is stable, so ties keep collection order.
//! 4. If fewer than [`LOW_RECALL_THRESHOLD`] skills scored, append
//!    zero-score skills in collection order so the caller still gets
//!    candidates.
//! 5. Truncate to `max_results`.

use crate::keywords::extract_keywords;
use crate::models::{LearnedScenarios, SkillMetadata};
use crate::score::score;

/// Below this many scored skills, zero-score skills pad the result.
pub const LOW_RECALL_THRESHOLD: usize = 5;

/// Default bound on the candidate list.
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Pre-filter tuning, decoupled from application config.
#[derive(Debug, Clone, Copy)]
pub struct PreFilterOptions<'a> {
    /// Maximum candidates returned. Values below 1 are treated as 1.
    pub max_results: usize,
    /// Learned scenario phrases per skill id.
    pub learned: Option<&'a LearnedScenarios>,
}

impl Default for PreFilterOptions<'_> {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            learned: None,
        }
    }
}

/// A skill selected by the pre-filter together with its score.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub skill: &'a SkillMetadata,
    pub score: u32,
}

/// Rank `skills` against `query` and return at most `max_results`
/// candidates, most relevant first.
pub fn pre_filter<'a>(
    query: &str,
    skills: &'a [SkillMetadata],
    options: &PreFilterOptions<'_>,
) -> Vec<&'a SkillMetadata> {
    ranked_candidates(query, skills, options)
        .into_iter()
        .map(|c| c.skill)
        .collect()
}

/// Same as [`pre_filter`] but keeps each candidate's score.
pub fn ranked_candidates<'a>(
    query: &str,
    skills: &'a [SkillMetadata],
    options: &PreFilterOptions<'_>,
) -> Vec<Candidate<'a>> {
    let max_results = options.max_results.max(1);
    let keywords = extract_keywords(query);

    if keywords.is_empty() {
        return skills
            .iter()
            .take(max_results)
            .map(|skill| Candidate { skill, score: 0 })
            .collect();
    }

    let scores: Vec<u32> = skills
        .iter()
        .map(|skill| {
            let learned = options.learned.and_then(|l| l.get(&skill.id));
            score(&keywords, skill, learned)
        })
        .collect();

    let mut ranked: Vec<Candidate<'a>> = skills
        .iter()
        .zip(&scores)
        .filter(|&(_, &s)| s > 0)
        .map(|(skill, &score)| Candidate { skill, score })
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    if ranked.len() < LOW_RECALL_THRESHOLD {
        let padding = skills
            .iter()
            .zip(&scores)
            .filter(|&(_, &s)| s == 0)
            .map(|(skill, _)| Candidate { skill, score: 0 })
            .take(max_results.saturating_sub(ranked.len()));
        ranked.extend(padding);
    }

    ranked.truncate(max_results);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScenarioList;

    fn make_skill(id: &str, description: &str) -> SkillMetadata {
        SkillMetadata {
            id: id.to_string(),
            name: id.replace('-', " "),
            description: description.to_string(),
            tags: Vec::new(),
            domain: "general".to_string(),
            scenario: "development".to_string(),
            level: "intermediate".to_string(),
            file: format!("skills/{}.md", id),
            version: None,
        }
    }

    fn numbered(n: usize) -> Vec<SkillMetadata> {
        (0..n)
            .map(|i| make_skill(&format!("skill-{:03}", i), "generic notes"))
            .collect()
    }

    fn ids<'a>(skills: &[&'a SkillMetadata]) -> Vec<&'a str> {
        skills.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_no_keywords_returns_prefix() {
        let skills = numbered(100);
        let opts = PreFilterOptions::default();
        for query in ["", "   ", "the and of", "?!", "a b c"] {
            let result = pre_filter(query, &skills, &opts);
            assert_eq!(result.len(), 20);
            let expected: Vec<&str> = skills[..20].iter().map(|s| s.id.as_str()).collect();
            assert_eq!(ids(&result), expected);
        }
    }

    #[test]
    fn test_dash_only_query_returns_prefix() {
        let skills: Vec<SkillMetadata> = (0..30)
            .map(|i| make_skill(&format!("a--b{}", i), "generic notes"))
            .collect();
        let ranked = ranked_candidates("-- __ !!-- ??", &skills, &PreFilterOptions::default());
        assert_eq!(ranked.len(), 20);
        assert!(ranked.iter().all(|c| c.score == 0));
        assert_eq!(ranked[0].skill.id, "a--b0");
        assert_eq!(ranked[19].skill.id, "a--b19");
    }

    #[test]
    fn test_low_recall_pads_with_zero_score() {
        let mut skills = numbered(50);
        skills[30].description = "kubernetes deployment notes".to_string();
        skills[10].tags = vec!["kubernetes".to_string()];

        let result = pre_filter("kubernetes", &skills, &PreFilterOptions::default());
        assert_eq!(result.len(), 20);
        // Tag hit (8) beats description hit (5).
        assert_eq!(result[0].id, "skill-010");
        assert_eq!(result[1].id, "skill-030");
        let rest: Vec<&str> = ids(&result[2..]);
        let expected: Vec<&str> = skills
            .iter()
            .filter(|s| s.id != "skill-010" && s.id != "skill-030")
            .take(18)
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(rest, expected);
    }

    #[test]
    fn test_low_recall_small_collection_returns_all() {
        let mut skills = numbered(7);
        skills[4].description = "terraform modules".to_string();
        let result = pre_filter("terraform", &skills, &PreFilterOptions::default());
        assert_eq!(result.len(), 7);
        assert_eq!(result[0].id, "skill-004");
    }

    #[test]
    fn test_enough_matches_drops_zero_scores() {
        let mut skills = numbered(30);
        for i in [3, 7, 11, 19, 25, 29] {
            skills[i].description = "docker compose".to_string();
        }
        let result = pre_filter("docker", &skills, &PreFilterOptions::default());
        assert_eq!(
            ids(&result),
            vec!["skill-003", "skill-007", "skill-011", "skill-019", "skill-025", "skill-029"]
        );
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let mut skills = numbered(10);
        skills[2].description = "rust async".to_string(); // 5 + 5
        skills[5].description = "rust".to_string(); // 5
        skills[6].id = "rust-async-guide".to_string(); // 10 + 10
        skills[8].description = "async".to_string(); // 5
        skills[9].description = "rust".to_string(); // 5
        let opts = PreFilterOptions {
            max_results: 5,
            learned: None,
        };
        let result = pre_filter("rust async", &skills, &opts);
        assert_eq!(
            ids(&result),
            vec!["rust-async-guide", "skill-002", "skill-005", "skill-008", "skill-009"]
        );
    }

    #[test]
    fn test_truncates_scored_results() {
        let mut skills = numbered(40);
        for s in skills.iter_mut().take(30) {
            s.description = "python".to_string();
        }
        let opts = PreFilterOptions {
            max_results: 12,
            learned: None,
        };
        assert_eq!(pre_filter("python", &skills, &opts).len(), 12);
    }

    #[test]
    fn test_low_recall_still_respects_max_results() {
        let mut skills = numbered(10);
        for i in [1, 2, 3] {
            skills[i].description = "graphql".to_string();
        }
        let opts = PreFilterOptions {
            max_results: 2,
            learned: None,
        };
        let result = pre_filter("graphql", &skills, &opts);
        assert_eq!(ids(&result), vec!["skill-001", "skill-002"]);
    }

    #[test]
    fn test_zero_max_results_treated_as_one() {
        let skills = numbered(5);
        let opts = PreFilterOptions {
            max_results: 0,
            learned: None,
        };
        assert_eq!(pre_filter("", &skills, &opts).len(), 1);
    }

    #[test]
    fn test_learned_scenarios_lift_skill() {
        let skills = numbered(20);
        let mut learned = LearnedScenarios::new();
        let mut phrases = ScenarioList::new();
        phrases.push("oauth login flow");
        learned.insert("skill-017".to_string(), phrases);

        let without = pre_filter("oauth", &skills, &PreFilterOptions::default());
        assert_eq!(without[0].id, "skill-000");

        let opts = PreFilterOptions {
            max_results: 20,
            learned: Some(&learned),
        };
        let with = pre_filter("oauth", &skills, &opts);
        assert_eq!(with[0].id, "skill-017");
        assert_eq!(with.len(), 20);
    }

    #[test]
    fn test_ranked_candidates_report_scores() {
        let mut skills = numbered(3);
        skills[1].tags = vec!["redis".to_string()];
        let ranked = ranked_candidates("redis", &skills, &PreFilterOptions::default());
        assert_eq!(ranked[0].skill.id, "skill-001");
        assert_eq!(ranked[0].score, 8);
        assert!(ranked[1..].iter().all(|c| c.score == 0));
    }

    #[test]
    fn test_empty_collection() {
        let skills: Vec<SkillMetadata> = Vec::new();
        assert!(pre_filter("anything", &skills, &PreFilterOptions::default()).is_empty());
        assert!(pre_filter("", &skills, &PreFilterOptions::default()).is_empty());
    }
}
