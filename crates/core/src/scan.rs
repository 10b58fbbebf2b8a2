use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::AssetConfig;
use crate::error::CleanerError;
use crate::glob::PatternSet;
use crate::model::{Candidate, ImageAsset};
use crate::naming::relative_to;

pub trait CandidateScanner {
    type Candidate: Candidate;

    fn scan(&self) -> Vec<Self::Candidate>;

    fn is_protected(&self, candidate: &Self::Candidate) -> bool;
}

#[derive(Debug, Clone)]
pub struct AssetScanner {
    root: PathBuf,
    scan_paths: Vec<String>,
    image_extensions: Vec<String>,
    excludes: PatternSet,
    protected: PatternSet,
}

impl AssetScanner {
    pub fn new(root: &Path, config: &AssetConfig) -> Result<Self, CleanerError> {
        Ok(Self {
            root: root.to_path_buf(),
            scan_paths: config.scan_paths.clone(),
            image_extensions: config
                .image_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            excludes: PatternSet::new(&config.exclude_patterns)?,
            protected: PatternSet::new(&config.protected_patterns)?,
        })
    }

    fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.image_extensions.contains(&ext))
    }
}

impl CandidateScanner for AssetScanner {
    type Candidate = ImageAsset;

    fn scan(&self) -> Vec<ImageAsset> {
        let mut assets = Vec::new();
        for scan_path in &self.scan_paths {
            let dir = self.root.join(scan_path);
            if !dir.is_dir() {
                debug!("asset scan root missing: {}", dir.display());
                continue;
            }

            for path in walk_files(&dir) {
                if !self.is_image(&path) {
                    continue;
                }
                if self.excludes.is_match(&relative_to(&path, &self.root)) {
                    continue;
                }
                assets.push(ImageAsset::from_path(&path, &self.root));
            }
        }

        info!("asset scan found {} image(s)", assets.len());
        assets
    }

    fn is_protected(&self, asset: &ImageAsset) -> bool {
        self.protected.is_match(&asset.relative_path)
    }
}

/// Regular files under `dir`, in file-name order. Symlinks are not followed,
/// so the walk cannot cycle; unreadable entries are skipped.
pub(crate) fn walk_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for item in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                debug!("walk error under {}: {}", dir.display(), err);
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files
}
