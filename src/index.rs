//! Skill index: discovery, building, and the persisted snapshot.
//!
//! # Discovery
//!
//! The scan root is `<repo>/skills` when that directory exists, otherwise
//! the repository root. The walk is sorted by file name and:
//!
//! 1. skips hidden directories (`.git`, `.github`, ...);
//! 2. takes `SKILL.md` as the only file of a directory that contains one,
//!    without descending further;
//! 3. otherwise collects every `*.md` file except `README.md` and
//!    `CONTRIBUTING.md`;
//! 4. drops paths matching an exclude glob (relative to the scan root).
//!
//! Every discovered file is parsed; failures are logged and skipped, and a
//! repeated id keeps the first skill seen.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use skill_harness_core::models::{Dimension, Dimensions, SkillIndex, SkillMetadata};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::parser::parse_skill_file;
use crate::persist::write_json_atomic;

const SKILL_FILE: &str = "SKILL.md";
const IGNORED_FILES: [&str; 2] = ["README.md", "CONTRIBUTING.md"];
const DEFAULT_EXCLUDES: [&str; 2] = ["**/node_modules/**", "**/.git/**"];

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in DEFAULT_EXCLUDES.iter().copied().chain(patterns.iter().map(String::as_str)) {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid exclude glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

fn relative_str(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Directory that holds the skills inside a checkout.
pub fn scan_root(repo_path: &Path) -> PathBuf {
    let skills_dir = repo_path.join("skills");
    if skills_dir.is_dir() {
        skills_dir
    } else {
        repo_path.to_path_buf()
    }
}

/// Discover skill files under `root` in walk order.
pub fn find_skill_files(root: &Path, exclude_globs: &[String]) -> Result<Vec<PathBuf>> {
    let excludes = build_globset(exclude_globs)?;
    let mut files = Vec::new();

    let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable path");
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy();

        if entry.file_type().is_dir() {
            if entry.depth() == 0 {
                continue;
            }
            if is_hidden(&name) {
                walker.skip_current_dir();
                continue;
            }
            let skill_md = entry.path().join(SKILL_FILE);
            if skill_md.is_file() {
                if !excludes.is_match(relative_str(&skill_md, root)) {
                    files.push(skill_md);
                }
                walker.skip_current_dir();
            }
            continue;
        }

        if !entry.file_type().is_file()
            || !name.ends_with(".md")
            || IGNORED_FILES.contains(&&*name)
        {
            continue;
        }
        if excludes.is_match(relative_str(entry.path(), root)) {
            continue;
        }
        files.push(entry.into_path());
    }

    Ok(files)
}

/// Scan a repository checkout and build a fresh index snapshot.
///
/// Each skill's `file` is stored relative to `repo_path`.
pub fn build_index(repo_path: &Path, exclude_globs: &[String]) -> Result<SkillIndex> {
    let root = scan_root(repo_path);
    let files = find_skill_files(&root, exclude_globs)?;

    let mut seen = HashSet::new();
    let mut skills = Vec::with_capacity(files.len());

    for path in files {
        let mut skill = match parse_skill_file(&path) {
            Ok(skill) => skill,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %format!("{:#}", e), "skipping skill file");
                continue;
            }
        };
        if !seen.insert(skill.id.clone()) {
            tracing::warn!(id = skill.id.as_str(), path = %path.display(), "duplicate skill id, keeping the first");
            continue;
        }
        skill.file = relative_str(&path, repo_path);
        skills.push(skill);
    }

    tracing::info!(count = skills.len(), root = %root.display(), "built skill index");

    Ok(SkillIndex {
        last_sync: Utc::now(),
        dimensions: Dimensions::default(),
        skills,
    })
}

/// Persist the index snapshot atomically.
pub fn save_index(path: &Path, index: &SkillIndex) -> Result<()> {
    write_json_atomic(path, index)
        .with_context(|| format!("Failed to save index: {}", path.display()))
}

/// Index envelope with skills kept as raw JSON so bad entries can be
/// dropped individually.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIndex {
    #[serde(with = "skill_harness_core::models::rfc3339_millis")]
    last_sync: DateTime<Utc>,
    #[serde(default)]
    dimensions: Option<Dimensions>,
    #[serde(default)]
    skills: Vec<serde_json::Value>,
}

/// Load the persisted index. `None` if it is missing or unreadable.
pub fn load_index(path: &Path) -> Option<SkillIndex> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read index");
            return None;
        }
    };

    let raw: RawIndex = match serde_json::from_str(&content) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "malformed index");
            return None;
        }
    };

    let mut skills = Vec::with_capacity(raw.skills.len());
    for (i, value) in raw.skills.into_iter().enumerate() {
        match serde_json::from_value::<SkillMetadata>(value) {
            Ok(skill) => skills.push(skill),
            Err(e) => tracing::warn!(entry = i, error = %e, "skipping malformed index entry"),
        }
    }

    Some(SkillIndex {
        last_sync: raw.last_sync,
        dimensions: raw.dimensions.unwrap_or_default(),
        skills,
    })
}

pub fn get_skill_by_id<'a>(index: &'a SkillIndex, id: &str) -> Option<&'a SkillMetadata> {
    index.get(id)
}

/// Skills whose `dimension` equals `value` exactly.
pub fn filter_by_dimension<'a>(
    index: &'a SkillIndex,
    dimension: Dimension,
    value: &str,
) -> Vec<&'a SkillMetadata> {
    index
        .skills
        .iter()
        .filter(|s| s.dimension(dimension) == value)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn rel_names(files: &[PathBuf], root: &Path) -> Vec<String> {
        files.iter().map(|f| relative_str(f, root)).collect()
    }

    #[test]
    fn test_discovery_rules() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "alpha.md", "# Alpha");
        write(root, "README.md", "# Readme");
        write(root, "CONTRIBUTING.md", "# Contributing");
        write(root, "notes.txt", "not markdown");
        write(root, "bundle/SKILL.md", "# Bundle");
        write(root, "bundle/extra.md", "# Ignored sibling");
        write(root, "bundle/nested/deep.md", "# Ignored nested");
        write(root, "group/beta.md", "# Beta");
        write(root, "group/inner/SKILL.md", "# Inner");
        write(root, ".hidden/secret.md", "# Hidden");
        write(root, "node_modules/pkg/readme.md", "# Vendored");

        let files = find_skill_files(root, &[]).unwrap();
        assert_eq!(
            rel_names(&files, root),
            vec!["alpha.md", "bundle/SKILL.md", "group/beta.md", "group/inner/SKILL.md"]
        );
    }

    #[test]
    fn test_exclude_globs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "keep.md", "# Keep");
        write(root, "drafts/wip.md", "# WIP");
        let files = find_skill_files(root, &["drafts/**".to_string()]).unwrap();
        assert_eq!(rel_names(&files, root), vec!["keep.md"]);
    }

    #[test]
    fn test_invalid_glob_rejected() {
        let tmp = TempDir::new().unwrap();
        assert!(find_skill_files(tmp.path(), &["[unclosed".to_string()]).is_err());
    }

    #[test]
    fn test_build_prefers_skills_dir() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path();
        write(repo, "top-level.md", "# Outside skills dir");
        write(
            repo,
            "skills/react-hooks.md",
            "---\ntags: [react]\ndomain: frontend\n---\nHooks guide.\n",
        );
        write(repo, "skills/canary/SKILL.md", "---\nname: Canary\n---\nRollouts.\n");

        let index = build_index(repo, &[]).unwrap();
        let ids: Vec<&str> = index.skills.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["canary", "react-hooks"]);
        assert_eq!(index.skills[0].file, "skills/canary/SKILL.md");
        assert_eq!(index.skills[1].file, "skills/react-hooks.md");
        assert_eq!(index.dimensions, Dimensions::default());
    }

    #[test]
    fn test_build_falls_back_to_repo_root() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "docker/SKILL.md", "Containers.\n");
        let index = build_index(tmp.path(), &[]).unwrap();
        assert_eq!(index.skills.len(), 1);
        assert_eq!(index.skills[0].file, "docker/SKILL.md");
    }

    #[test]
    fn test_build_skips_bad_files_and_duplicates() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path();
        write(repo, "skills/a.md", "---\nid: shared\n---\nFirst.\n");
        write(repo, "skills/b.md", "---\nid: shared\n---\nSecond.\n");
        write(repo, "skills/c.md", "---\nid: broken\n");
        write(repo, "skills/d.md", "Fine.\n");

        let index = build_index(repo, &[]).unwrap();
        let ids: Vec<&str> = index.skills.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["shared", "d"]);
        assert_eq!(index.skills[0].description, "First.");
    }

    #[test]
    fn test_save_and_load_index() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "repo/skills/x.md", "---\ndomain: data\n---\nPandas.\n");
        let index = build_index(&tmp.path().join("repo"), &[]).unwrap();
        let path = tmp.path().join("cache/index.json");
        save_index(&path, &index).unwrap();

        let loaded = load_index(&path).unwrap();
        assert_eq!(loaded.skills, index.skills);
        assert_eq!(
            loaded.last_sync.timestamp_millis(),
            index.last_sync.timestamp_millis()
        );
    }

    #[test]
    fn test_load_missing_or_malformed_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(load_index(&tmp.path().join("none.json")).is_none());
        let bad = tmp.path().join("bad.json");
        std::fs::write(&bad, "{ broken").unwrap();
        assert!(load_index(&bad).is_none());
    }

    #[test]
    fn test_load_skips_bad_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.json");
        std::fs::write(
            &path,
            r#"{
              "lastSync": "2024-05-01T10:00:00.000Z",
              "skills": [
                {"id": "ok", "name": "Ok", "description": "", "tags": [],
                 "domain": "general", "scenario": "development",
                 "level": "intermediate", "file": "skills/ok.md"},
                {"id": 42}
              ]
            }"#,
        )
        .unwrap();
        let index = load_index(&path).unwrap();
        assert_eq!(index.skills.len(), 1);
        assert_eq!(index.skills[0].id, "ok");
        assert_eq!(index.dimensions, Dimensions::default());
    }

    #[test]
    fn test_lookup_helpers() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "skills/a.md", "---\ndomain: data\n---\nA.\n");
        write(tmp.path(), "skills/b.md", "---\ndomain: devops\n---\nB.\n");
        write(tmp.path(), "skills/c.md", "---\ndomain: data\nlevel: advanced\n---\nC.\n");
        let index = build_index(tmp.path(), &[]).unwrap();

        assert_eq!(get_skill_by_id(&index, "b").map(|s| s.domain.as_str()), Some("devops"));
        assert!(get_skill_by_id(&index, "zzz").is_none());

        let data: Vec<&str> = filter_by_dimension(&index, Dimension::Domain, "data")
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(data, vec!["a", "c"]);
        assert_eq!(filter_by_dimension(&index, Dimension::Level, "advanced").len(), 1);
        assert!(filter_by_dimension(&index, Dimension::Scenario, "Development").is_empty());
    }
}
