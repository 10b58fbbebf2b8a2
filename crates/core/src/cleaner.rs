use std::path::Path;

use tracing::{info, warn};

use crate::component_scan::ComponentScanner;
use crate::config::{AssetConfig, ComponentConfig};
use crate::delete::Deleter;
use crate::error::CleanerError;
use crate::manifest::ManifestManager;
use crate::model::{Candidate, CleanAllResult, DeletionResult, Manifest, Statistics};
use crate::scan::{AssetScanner, CandidateScanner};
use crate::search::{
    AssetPatterns, AssetReferenceSearcher, ComponentPatterns, ComponentReferenceSearcher,
    ReferenceSearcher, SearchPatterns,
};

pub struct Cleaner<S: CandidateScanner, P> {
    scanner: S,
    searcher: ReferenceSearcher<P>,
    manifest: ManifestManager<S::Candidate>,
    deleter: Deleter,
}

pub type AssetCleaner = Cleaner<AssetScanner, AssetPatterns>;
pub type BladeCleaner = Cleaner<ComponentScanner, ComponentPatterns>;

impl<S, P> Cleaner<S, P>
where
    S: CandidateScanner,
    P: SearchPatterns<Candidate = S::Candidate>,
{
    pub fn new(
        scanner: S,
        searcher: ReferenceSearcher<P>,
        manifest: ManifestManager<S::Candidate>,
        deleter: Deleter,
    ) -> Self {
        Self {
            scanner,
            searcher,
            manifest,
            deleter,
        }
    }

    pub fn without_backup(mut self) -> Self {
        self.deleter = self.deleter.with_backup(false);
        self
    }

    pub fn scanner(&self) -> &S {
        &self.scanner
    }

    pub fn searcher(&self) -> &ReferenceSearcher<P> {
        &self.searcher
    }

    pub fn manifest(&self) -> &ManifestManager<S::Candidate> {
        &self.manifest
    }

    pub fn deleter(&self) -> &Deleter {
        &self.deleter
    }

    pub fn scan(&self) -> Vec<S::Candidate> {
        self.scanner.scan()
    }

    pub fn find_unused(&self) -> Vec<S::Candidate> {
        let candidates = self.scan();
        self.unused_among(&candidates)
    }

    fn unused_among(&self, candidates: &[S::Candidate]) -> Vec<S::Candidate> {
        self.searcher
            .find_unused(candidates)
            .into_iter()
            .filter(|candidate| !self.scanner.is_protected(candidate))
            .collect()
    }

    pub fn generate_manifest(&self) -> Result<Manifest, CleanerError> {
        let candidates = self.scan();
        let unused = self.unused_among(&candidates);
        self.manifest.generate(&unused, candidates.len() as u64)
    }

    pub fn clean_from_manifest(&self, dry_run: bool) -> Result<DeletionResult, CleanerError> {
        let manifest = self.manifest.try_load()?;
        let Some(candidates) = self.manifest.listed(manifest) else {
            warn!(
                "manifest {} lists no {}; leaving it in place",
                self.manifest.full_path().display(),
                <S::Candidate as Candidate>::KIND.plural()
            );
            return Ok(DeletionResult::default());
        };
        let listed_nothing = candidates.is_empty();
        let result = self.deleter.delete(&candidates, dry_run);

        let finished = !dry_run && result.failed.is_empty();
        if (listed_nothing || finished) && self.manifest.delete()? {
            info!("removed manifest {}", self.manifest.full_path().display());
        }
        Ok(result)
    }

    pub fn clean_all(&self, dry_run: bool) -> CleanAllResult {
        let candidates = self.scan();
        let unused = self.unused_among(&candidates);
        CleanAllResult {
            scanned: candidates.len() as u64,
            deletion: self.deleter.delete(&unused, dry_run),
        }
    }

    pub fn find_references(&self, candidate: &S::Candidate) -> Vec<String> {
        self.searcher.find_references(candidate)
    }

    pub fn find_candidate(&self, identifier: &str) -> Option<S::Candidate> {
        let wanted = identifier.replace('\\', "/");
        self.scan()
            .into_iter()
            .find(|candidate| candidate.identifier() == wanted)
    }

    pub fn statistics(&self) -> Statistics {
        let candidates = self.scan();
        let unused = self.unused_among(&candidates);
        let total_size = candidates.iter().map(Candidate::size).sum();
        let unused_size = unused.iter().map(Candidate::size).sum();
        Statistics {
            total: candidates.len() as u64,
            unused: unused.len() as u64,
            used: (candidates.len() - unused.len()) as u64,
            total_size,
            unused_size,
        }
    }
}

impl AssetCleaner {
    pub fn from_config(root: &Path, config: &AssetConfig) -> Result<Self, CleanerError> {
        Ok(Self::new(
            AssetScanner::new(root, config)?,
            AssetReferenceSearcher::for_assets(root, config)?,
            ManifestManager::new(root, config.manifest_path.clone()),
            Deleter::new(root, config.backup_before_delete, config.backup_path.clone()),
        ))
    }
}

impl BladeCleaner {
    pub fn from_config(root: &Path, config: &ComponentConfig) -> Result<Self, CleanerError> {
        Ok(Self::new(
            ComponentScanner::new(root, config)?,
            ComponentReferenceSearcher::for_components(root, config)?,
            ManifestManager::new(root, config.manifest_path.clone()),
            Deleter::new(root, config.backup_before_delete, config.backup_path.clone()),
        ))
    }
}
