//! Loading skill bodies from the checkout and rendering them for injection.

use skill_harness_core::models::SkillMetadata;
use std::path::Path;

use crate::parser::strip_frontmatter;

/// Markdown body of `skill`, without frontmatter.
///
/// A file that cannot be read yields an inline error text so that one
/// broken skill does not abort a multi-skill load.
pub fn load_skill_content(repo_path: &Path, skill: &SkillMetadata) -> String {
    let path = repo_path.join(&skill.file);
    match std::fs::read_to_string(&path) {
        Ok(raw) => strip_frontmatter(&raw).to_string(),
        Err(e) => {
            tracing::warn!(id = skill.id.as_str(), path = %path.display(), error = %e, "failed to load skill");
            format!("Error loading skill: {}: {}", path.display(), e)
        }
    }
}

/// Comma-separated tags, or `none`.
pub fn format_tags(skill: &SkillMetadata) -> String {
    if skill.tags.is_empty() {
        "none".to_string()
    } else {
        skill.tags.join(", ")
    }
}

/// One skill rendered as a delimited markdown block.
pub fn format_skill_block(skill: &SkillMetadata, content: &str) -> String {
    format!(
        "\n---\n## Skill: {name}\n**ID:** {id}\n**Domain:** {domain} | **Scenario:** {scenario} | **Level:** {level}\n**Tags:** {tags}\n\n{content}\n---\n",
        name = skill.name,
        id = skill.id,
        domain = skill.domain,
        scenario = skill.scenario,
        level = skill.level,
        tags = format_tags(skill),
        content = content,
    )
}

/// Load and render several skills, in the order given.
pub fn load_skills(repo_path: &Path, skills: &[&SkillMetadata]) -> String {
    skills
        .iter()
        .map(|skill| format_skill_block(skill, &load_skill_content(repo_path, skill)))
        .collect::<Vec<_>>()
        .join("\n")
}
