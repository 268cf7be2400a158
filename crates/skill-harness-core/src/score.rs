//! Weighted field-hit scoring of a skill against a keyword set.
//!
//! Each keyword lands in exactly one [`MatchBucket`], checked in the order
//! below; the first field that contains the keyword (case-insensitive
//! substring) decides the weight. Weights are summed across keywords.
//!
//! | Bucket | Fields | Weight |
//! |--------|--------|--------|
//! | [`IdOrName`](MatchBucket::IdOrName) | id, name | 10 |
//! | [`Tag`](MatchBucket::Tag) | any tag | 8 |
//! | [`LearnedScenario`](MatchBucket::LearnedScenario) | any learned phrase | 6 |
//! | [`Description`](MatchBucket::Description) | description | 5 |
//! | [`Category`](MatchBucket::Category) | domain, scenario | 4 |
//! | [`Anywhere`](MatchBucket::Anywhere) | all of the above joined | 2 |
//!
//! `level` and `version` are not searchable.

use crate::models::{ScenarioList, SkillMetadata};

/// Which field group a keyword matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchBucket {
    IdOrName,
    Tag,
    LearnedScenario,
    Description,
    Category,
    Anywhere,
    NoMatch,
}

impl MatchBucket {
    pub fn weight(self) -> u32 {
        match self {
            MatchBucket::IdOrName => 10,
            MatchBucket::Tag => 8,
            MatchBucket::LearnedScenario => 6,
            MatchBucket::Description => 5,
            MatchBucket::Category => 4,
            MatchBucket::Anywhere => 2,
            MatchBucket::NoMatch => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchBucket::IdOrName => "id/name",
            MatchBucket::Tag => "tag",
            MatchBucket::LearnedScenario => "learned scenario",
            MatchBucket::Description => "description",
            MatchBucket::Category => "domain/scenario",
            MatchBucket::Anywhere => "anywhere",
            MatchBucket::NoMatch => "no match",
        }
    }
}

impl std::fmt::Display for MatchBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-cased searchable fields of one skill.
struct SearchFields {
    id: String,
    name: String,
    tags: Vec<String>,
    learned: Vec<String>,
    description: String,
    domain: String,
    scenario: String,
    combined: String,
}

impl SearchFields {
    fn new(skill: &SkillMetadata, learned: Option<&ScenarioList>) -> Self {
        let learned: Vec<String> = learned
            .map(|l| l.iter().map(|s| s.to_lowercase()).collect())
            .unwrap_or_default();
        let tags: Vec<String> = skill.tags.iter().map(|t| t.to_lowercase()).collect();

        let mut parts: Vec<&str> = vec![
            skill.id.as_str(),
            skill.name.as_str(),
            skill.description.as_str(),
        ];
        parts.extend(skill.tags.iter().map(String::as_str));
        parts.push(&skill.domain);
        parts.push(&skill.scenario);
        parts.extend(learned.iter().map(String::as_str));
        let combined = parts.join(" ").to_lowercase();

        Self {
            id: skill.id.to_lowercase(),
            name: skill.name.to_lowercase(),
            tags,
            learned,
            description: skill.description.to_lowercase(),
            domain: skill.domain.to_lowercase(),
            scenario: skill.scenario.to_lowercase(),
            combined,
        }
    }

    fn classify(&self, keyword: &str) -> MatchBucket {
        if self.id.contains(keyword) || self.name.contains(keyword) {
            MatchBucket::IdOrName
        } else if self.tags.iter().any(|t| t.contains(keyword)) {
            MatchBucket::Tag
        } else if self.learned.iter().any(|s| s.contains(keyword)) {
            MatchBucket::LearnedScenario
        } else if self.description.contains(keyword) {
            MatchBucket::Description
        } else if self.domain.contains(keyword) || self.scenario.contains(keyword) {
            MatchBucket::Category
        } else if self.combined.contains(keyword) {
            MatchBucket::Anywhere
        } else {
            MatchBucket::NoMatch
        }
    }
}

/// Per-keyword scoring detail.
#[derive(Debug, Clone)]
pub struct KeywordHit {
    pub keyword: String,
    pub bucket: MatchBucket,
    pub weight: u32,
}

/// Score plus the bucket each keyword landed in.
#[derive(Debug, Clone)]
pub struct ScoreBreakdown {
    pub total: u32,
    pub hits: Vec<KeywordHit>,
}

/// Score `skill` against `keywords`, explaining every keyword's bucket.
///
/// Keywords are expected to be lower-case, as produced by
/// [`extract_keywords`](crate::keywords::extract_keywords).
pub fn score_breakdown(
    keywords: &[String],
    skill: &SkillMetadata,
    learned: Option<&ScenarioList>,
) -> ScoreBreakdown {
    let fields = SearchFields::new(skill, learned);
    let hits: Vec<KeywordHit> = keywords
        .iter()
        .map(|keyword| {
            let bucket = fields.classify(keyword);
            KeywordHit {
                keyword: keyword.clone(),
                bucket,
                weight: bucket.weight(),
            }
        })
        .collect();
    let total = hits.iter().map(|h| h.weight).sum();
    ScoreBreakdown { total, hits }
}

/// Relevance of `skill` for `keywords`. Zero means no keyword occurs in any
/// searchable field.
pub fn score(keywords: &[String], skill: &SkillMetadata, learned: Option<&ScenarioList>) -> u32 {
    let fields = SearchFields::new(skill, learned);
    keywords
        .iter()
        .map(|keyword| fields.classify(keyword).weight())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::extract_keywords;

    fn skill() -> SkillMetadata {
        SkillMetadata {
            id: "react-best-practices".to_string(),
            name: "React Best Practices".to_string(),
            description: "Patterns for building maintainable component trees".to_string(),
            tags: vec!["react".to_string(), "hooks".to_string()],
            domain: "frontend".to_string(),
            scenario: "development".to_string(),
            level: "intermediate".to_string(),
            file: "skills/react-best-practices.md".to_string(),
            version: Some("1.0".to_string()),
        }
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_reference_query() {
        let keywords = extract_keywords("react hooks development");
        assert_eq!(keywords, vec!["react", "hooks", "development"]);
        assert_eq!(score(&keywords, &skill(), None), 10 + 8 + 4);
    }

    #[test]
    fn test_buckets_do_not_stack() {
        let mut s = skill();
        s.description = "react react react".to_string();
        s.tags.push("react-native".to_string());
        assert_eq!(score(&kw(&["react"]), &s, None), 10);
    }

    #[test]
    fn test_each_bucket_weight() {
        let s = skill();
        assert_eq!(score(&kw(&["practices"]), &s, None), 10);
        assert_eq!(score(&kw(&["hook"]), &s, None), 8);
        assert_eq!(score(&kw(&["component"]), &s, None), 5);
        assert_eq!(score(&kw(&["frontend"]), &s, None), 4);
        assert_eq!(score(&kw(&["devel"]), &s, None), 4);
        assert_eq!(score(&kw(&["kubernetes"]), &s, None), 0);
    }

    #[test]
    fn test_learned_scenario_bucket() {
        let s = skill();
        let mut learned = ScenarioList::new();
        learned.push("Form Validation state");
        assert_eq!(score(&kw(&["validation"]), &s, Some(&learned)), 6);
        assert_eq!(score(&kw(&["validation"]), &s, None), 0);
    }

    #[test]
    fn test_learned_scenario_beats_description() {
        let s = skill();
        let mut learned = ScenarioList::new();
        learned.push("component library");
        assert_eq!(score(&kw(&["component"]), &s, Some(&learned)), 6);
    }

    #[test]
    fn test_substring_matching() {
        // "act" is inside "react".
        assert_eq!(score(&kw(&["act"]), &skill(), None), 10);
    }

    #[test]
    fn test_level_and_version_not_searched() {
        let s = skill();
        assert_eq!(score(&kw(&["intermediate"]), &s, None), 0);
        assert_eq!(score(&kw(&["1.0"]), &s, None), 0);
    }

    #[test]
    fn test_empty_keywords_score_zero() {
        assert_eq!(score(&[], &skill(), None), 0);
    }

    #[test]
    fn test_breakdown_matches_score() {
        let keywords = kw(&["react", "hooks", "frontend", "zig"]);
        let s = skill();
        let breakdown = score_breakdown(&keywords, &s, None);
        assert_eq!(breakdown.total, score(&keywords, &s, None));
        let buckets: Vec<MatchBucket> = breakdown.hits.iter().map(|h| h.bucket).collect();
        assert_eq!(
            buckets,
            vec![
                MatchBucket::IdOrName,
                MatchBucket::Tag,
                MatchBucket::Category,
                MatchBucket::NoMatch
            ]
        );
    }

    #[test]
    fn test_zero_iff_no_occurrence() {
        let s = skill();
        let mut learned = ScenarioList::new();
        learned.push("state machines");
        for word in ["react", "trees", "machines", "front", "nothing", "xyz"] {
            let keywords = kw(&[word]);
            let total = score(&keywords, &s, Some(&learned));
            let haystack = format!(
                "{} {} {} {} {} {} {}",
                s.id,
                s.name,
                s.description,
                s.tags.join(" "),
                s.domain,
                s.scenario,
                "state machines"
            )
            .to_lowercase();
            assert_eq!(total == 0, !haystack.contains(word), "keyword {}", word);
        }
    }
}
