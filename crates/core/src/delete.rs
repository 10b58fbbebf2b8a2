use std::fs;
use std::io;
use std::path::{Component as PathComponent, Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::model::{BackingFile, Candidate, DeletionResult};

pub const BACKUP_STAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

#[derive(Debug, Clone)]
pub struct Deleter {
    root: PathBuf,
    backup_enabled: bool,
    backup_path: String,
}

impl Deleter {
    pub fn new(root: &Path, backup_enabled: bool, backup_path: impl Into<String>) -> Self {
        Self {
            root: root.to_path_buf(),
            backup_enabled,
            backup_path: backup_path.into(),
        }
    }

    pub fn with_backup(mut self, enabled: bool) -> Self {
        self.backup_enabled = enabled;
        self
    }

    pub fn backup_enabled(&self) -> bool {
        self.backup_enabled
    }

    pub fn backup_root(&self) -> PathBuf {
        self.root.join(&self.backup_path)
    }

    pub fn delete<C: Candidate>(&self, candidates: &[C], dry_run: bool) -> DeletionResult {
        let stamp = Utc::now().format(BACKUP_STAMP_FORMAT).to_string();
        let backup_dir = self.backup_root().join(&stamp);
        let mut result = DeletionResult::default();

        for candidate in candidates {
            let files = candidate.existing_files();
            if files.is_empty() {
                result
                    .failed
                    .push(format!("{} ({})", candidate.identifier(), C::MISSING_REASON));
                continue;
            }
            if let Some(file) = files.iter().find(|file| !is_contained(&file.relative_path)) {
                warn!("refusing to delete path outside project: {}", file.relative_path);
                result
                    .failed
                    .push(format!("{} (path outside project)", candidate.identifier()));
                continue;
            }

            if dry_run {
                result.deleted += 1;
                result.total_size += candidate.size();
                continue;
            }

            if self.backup_enabled {
                match self.back_up(&files, &backup_dir) {
                    Ok(count) => result.backed_up += count,
                    Err(err) => {
                        warn!("backup failed for {}: {}", candidate.identifier(), err);
                        result
                            .failed
                            .push(format!("{} (backup failed: {err})", candidate.identifier()));
                        continue;
                    }
                }
            }

            match self.remove_files(&files) {
                Ok(()) => {
                    result.deleted += 1;
                    result.total_size += candidate.size();
                }
                Err(err) => {
                    warn!("delete failed for {}: {}", candidate.identifier(), err);
                    result
                        .failed
                        .push(format!("{} ({err})", candidate.identifier()));
                }
            }
        }

        info!(
            "deleted {} {} (dry_run={}, backed_up={}, failed={})",
            result.deleted,
            C::KIND.plural(),
            dry_run,
            result.backed_up,
            result.failed.len()
        );
        result
    }

    fn back_up(&self, files: &[BackingFile], backup_dir: &Path) -> io::Result<u64> {
        let mut copied = 0;
        for file in files {
            let target = backup_dir.join(&file.relative_path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&file.path, &target)?;
            copied += 1;
        }
        Ok(copied)
    }

    fn remove_files(&self, files: &[BackingFile]) -> io::Result<()> {
        for file in files {
            fs::remove_file(&file.path)?;
            self.prune_empty_parents(&file.path);
        }
        Ok(())
    }

    /// Removes now-empty directories above `path`, stopping at the first
    /// non-empty one and never touching top-level directories of the root.
    fn prune_empty_parents(&self, path: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            let Ok(relative) = dir.strip_prefix(&self.root) else {
                break;
            };
            if relative.components().count() < 2 || !is_empty_dir(dir) {
                break;
            }
            if let Err(err) = fs::remove_dir(dir) {
                debug!("could not prune {}: {}", dir.display(), err);
                break;
            }
            debug!("pruned empty directory {}", dir.display());
            current = dir.parent();
        }
    }
}

fn is_empty_dir(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

fn is_contained(relative: &str) -> bool {
    !relative.is_empty()
        && Path::new(relative)
            .components()
            .all(|part| matches!(part, PathComponent::Normal(_) | PathComponent::CurDir))
}
