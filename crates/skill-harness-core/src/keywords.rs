//! Keyword extraction for mixed English / Chinese queries.
//!
//! # Algorithm
//!
//! 1. Lower-case the input.
//! 2. Replace every character that is not an ASCII word character
//!    (`[a-z0-9_]`), a CJK ideograph (`U+4E00..=U+9FA5`), whitespace, or a
//!    hyphen with a space.
//! 3. Split on whitespace.
//! 4. Drop tokens of one character or less, tokens made only of `-` and
//!    `_`, and stop words.
//! 5. Deduplicate, keeping first-occurrence order.
//!
//! No stemming or segmentation is attempted: a run of CJK characters is a
//! single token.
//!
//! # Example
//!
//! ```rust
//! use skill_harness_core::keywords::extract_keywords;
//!
//! assert_eq!(extract_keywords("React react HOOKS!"), vec!["react", "hooks"]);
//! ```

use std::collections::HashSet;
use std::sync::OnceLock;

const STOP_WORDS: &[&str] = &[
    // English
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being",
    "have", "has", "had", "do", "does", "did", "will", "would", "could", "should",
    "may", "might", "must", "shall", "can", "need", "dare", "ought", "used",
    "to", "of", "in", "for", "on", "with", "at", "by", "from", "as", "into",
    "through", "during", "before", "after", "above", "below", "between",
    "and", "but", "or", "nor", "so", "yet", "both", "either", "neither",
    "not", "only", "own", "same", "than", "too", "very", "just",
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves",
    "you", "your", "yours", "yourself", "yourselves",
    "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves",
    "what", "which", "who", "whom", "this", "that", "these", "those",
    "am", "if", "then", "else", "when", "where", "why", "how", "all", "each",
    "every", "any", "some", "no", "more", "most", "other", "such",
    // Chinese
    "的", "了", "是", "在", "我", "有", "和", "就", "不", "人", "都", "一", "一个",
    "上", "也", "很", "到", "说", "要", "去", "你", "会", "着", "没有", "看", "好",
    "自己", "这", "那", "什么", "怎么", "如何", "可以", "能", "想", "请", "帮",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

pub fn is_stop_word(word: &str) -> bool {
    stop_words().contains(word)
}

/// Characters that survive normalization.
fn is_kept(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == '_'
        || c == '-'
        || c.is_whitespace()
        || ('\u{4E00}'..='\u{9FA5}').contains(&c)
}

/// A token needs at least one ASCII letter or digit, or one CJK ideograph.
fn has_word_content(token: &str) -> bool {
    token
        .chars()
        .any(|c| c.is_ascii_alphanumeric() || ('\u{4E00}'..='\u{9FA5}').contains(&c))
}

/// Extract the ordered, deduplicated keyword set from free text.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if is_kept(c) { c } else { ' ' })
        .collect();

    let mut seen = HashSet::new();
    let mut keywords = Vec::new();
    for word in normalized.split_whitespace() {
        let word = word.trim();
        if word.chars().count() <= 1 || !has_word_content(word) || is_stop_word(word) {
            continue;
        }
        if seen.insert(word) {
            keywords.push(word.to_string());
        }
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_preserves_first_occurrence() {
        assert_eq!(extract_keywords("react react hooks"), vec!["react", "hooks"]);
        assert_eq!(
            extract_keywords("hooks react Hooks REACT"),
            vec!["hooks", "react"]
        );
    }

    #[test]
    fn test_stop_words_and_short_tokens_removed() {
        assert_eq!(
            extract_keywords("How do I write a React hook and test it?"),
            vec!["write", "react", "hook", "test"]
        );
        assert!(extract_keywords("a b c x y").is_empty());
    }

    #[test]
    fn test_no_word_content_is_empty() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("   \t\n ").is_empty());
        assert!(extract_keywords("!!! ??? ... ,,, ()[]{}").is_empty());
        assert!(extract_keywords("— … «» ¿¡").is_empty());
        assert!(extract_keywords("--").is_empty());
        assert!(extract_keywords("__").is_empty());
        assert!(extract_keywords("-- ---").is_empty());
        assert!(extract_keywords("!!-- ??").is_empty());
        assert_eq!(extract_keywords("-- k8s __"), vec!["k8s"]);
    }

    #[test]
    fn test_punctuation_splits_tokens() {
        assert_eq!(
            extract_keywords("docker/compose,kubernetes.yaml"),
            vec!["docker", "compose", "kubernetes", "yaml"]
        );
    }

    #[test]
    fn test_hyphens_and_underscores_kept() {
        assert_eq!(
            extract_keywords("react-best-practices snake_case"),
            vec!["react-best-practices", "snake_case"]
        );
    }

    #[test]
    fn test_cjk_runs_are_tokens() {
        assert_eq!(
            extract_keywords("React hooks 开发"),
            vec!["react", "hooks", "开发"]
        );
        // Single ideographs and stop words are dropped.
        assert_eq!(extract_keywords("我 想 学习 的 前端"), vec!["学习", "前端"]);
        assert_eq!(extract_keywords("如何，部署？"), vec!["部署"]);
    }

    #[test]
    fn test_non_ascii_letters_are_separators() {
        assert_eq!(extract_keywords("café naïve"), vec!["caf", "na", "ve"]);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "React Hooks & state-management for the frontend!!",
            "我想学习 React 组件开发 and testing",
            "deploy deploy DEPLOY k8s--cluster",
        ];
        for input in inputs {
            let once = extract_keywords(input);
            let twice = extract_keywords(&once.join(" "));
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }
}
