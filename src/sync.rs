//! Repository sync into `<cache>/repo`.
//!
//! Two kinds of source are supported:
//!
//! - **Local directories** (`/abs/path`, `./rel/path`, `file:///abs/path`):
//!   the checkout is deleted and the tree copied fresh.
//! - **Git remotes** (anything else): cloned on first sync, then updated.
//!   With a configured branch the update is `fetch` + `reset --hard
//!   origin/<branch>`; without one it is a plain `pull`.
//!
//! Git is driven through the `git` executable, so it must be on `PATH`.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;
use walkdir::WalkDir;

use crate::config::Config;

/// What a sync did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    LocalCopied,
    Updated,
    Cloned,
}

impl SyncOutcome {
    pub fn message(self) -> &'static str {
        match self {
            SyncOutcome::LocalCopied => "Local directory synced successfully",
            SyncOutcome::Updated => "Repository updated successfully",
            SyncOutcome::Cloned => "Repository cloned successfully",
        }
    }
}

/// Local source directory named by `url`, if it is one.
fn local_source(url: &str) -> Option<&str> {
    if let Some(path) = url.strip_prefix("file://") {
        return Some(path);
    }
    if url.starts_with('/') || url.starts_with("./") {
        return Some(url);
    }
    None
}

/// Bring `<cache>/repo` up to date with the configured repository.
///
/// `config_path` is only used to point the user at the file to edit when
/// no repository is configured.
pub fn sync_repository(config: &Config, config_path: &Path) -> Result<SyncOutcome> {
    if !config.repo.is_configured() {
        bail!(
            "Repository URL not configured. Please set it in {} (or run `skills config <url>`)",
            config_path.display()
        );
    }

    let cache_dir = config.cache_dir();
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;

    let repo_path = config.repo_path();
    let url = config.repo.url.trim();

    if let Some(source) = local_source(url) {
        copy_local(Path::new(source), &repo_path).context("Local sync failed")?;
        return Ok(SyncOutcome::LocalCopied);
    }

    if repo_path.join(".git").exists() {
        let updated = match &config.repo.branch {
            Some(branch) => git_fetch_reset(&repo_path, branch),
            None => git_pull(&repo_path),
        };
        updated.context("Sync failed")?;
        Ok(SyncOutcome::Updated)
    } else {
        if repo_path.exists() {
            std::fs::remove_dir_all(&repo_path).with_context(|| {
                format!("Failed to clear stale checkout: {}", repo_path.display())
            })?;
        }
        git_clone(url, config.repo.branch.as_deref(), config.repo.shallow, &repo_path)
            .context("Sync failed")?;
        Ok(SyncOutcome::Cloned)
    }
}

fn copy_local(source: &Path, dest: &Path) -> Result<()> {
    if !source.is_dir() {
        bail!("Source directory does not exist: {}", source.display());
    }
    if dest.exists() {
        std::fs::remove_dir_all(dest)
            .with_context(|| format!("Failed to remove {}", dest.display()))?;
    }

    let mut copied = 0usize;
    for entry in WalkDir::new(source) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy {}", entry.path().display())
            })?;
            copied += 1;
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping non-regular file");
        }
    }

    tracing::info!(files = copied, source = %source.display(), "copied local skills directory");
    Ok(())
}

fn git() -> Command {
    let mut cmd = Command::new("git");
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd
}

fn run(cmd: &mut Command, what: &str) -> Result<()> {
    let output = cmd
        .output()
        .with_context(|| format!("Failed to execute '{}'. Is git installed?", what))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{} failed: {}", what, stderr.trim());
    }
    Ok(())
}

fn git_clone(url: &str, branch: Option<&str>, shallow: bool, dest: &Path) -> Result<()> {
    let mut cmd = git();
    cmd.arg("clone");
    if let Some(branch) = branch {
        cmd.args(["--branch", branch, "--single-branch"]);
    }
    if shallow {
        cmd.args(["--depth", "1"]);
    }
    cmd.arg(url).arg(dest);

    tracing::info!(url, dest = %dest.display(), "cloning skills repository");
    run(&mut cmd, "git clone")
}

fn git_fetch_reset(repo_dir: &Path, branch: &str) -> Result<()> {
    run(
        git().args(["fetch", "origin", branch]).current_dir(repo_dir),
        "git fetch",
    )?;

    let remote_ref = format!("origin/{}", branch);
    run(
        git().args(["reset", "--hard", &remote_ref]).current_dir(repo_dir),
        "git reset",
    )
}

fn git_pull(repo_dir: &Path) -> Result<()> {
    run(git().arg("pull").current_dir(repo_dir), "git pull")
}
