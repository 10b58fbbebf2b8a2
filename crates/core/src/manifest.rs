use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crate::error::CleanerError;
use crate::model::{human_size, Candidate, Manifest};

#[derive(Debug, Clone)]
pub struct ManifestManager<C> {
    root: PathBuf,
    manifest_path: String,
    kind: PhantomData<fn() -> C>,
}

impl<C: Candidate> ManifestManager<C> {
    pub fn new(root: &Path, manifest_path: impl Into<String>) -> Self {
        Self {
            root: root.to_path_buf(),
            manifest_path: manifest_path.into(),
            kind: PhantomData,
        }
    }

    pub fn manifest_path(&self) -> &str {
        &self.manifest_path
    }

    pub fn full_path(&self) -> PathBuf {
        self.root.join(&self.manifest_path)
    }

    pub fn exists(&self) -> bool {
        self.full_path().is_file()
    }

    pub fn generate(&self, unused: &[C], total_scanned: u64) -> Result<Manifest, CleanerError> {
        let total_size = unused.iter().map(Candidate::size).sum::<u64>();
        let manifest = Manifest {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            total_scanned,
            total_unused: unused.len() as u64,
            total_size,
            total_size_human: human_size(total_size),
            instructions: C::KIND.instructions(),
            entries: C::wrap_records(unused.iter().map(Candidate::to_record).collect()),
        };

        let payload = serde_json::to_string_pretty(&manifest).map_err(CleanerError::Serialize)?;
        let path = self.full_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| CleanerError::io(parent, err))?;
        }
        fs::write(&path, payload).map_err(|err| CleanerError::io(&path, err))?;

        info!(
            "wrote manifest {} with {} unused {}",
            path.display(),
            manifest.total_unused,
            C::KIND.plural()
        );
        Ok(manifest)
    }

    /// Loads the manifest, telling a missing file apart from a malformed one.
    pub fn try_load(&self) -> Result<Manifest, CleanerError> {
        let path = self.full_path();
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(CleanerError::ManifestNotFound(path))
            }
            Err(err) => return Err(CleanerError::io(path, err)),
        };
        serde_json::from_str(&data).map_err(|source| CleanerError::ManifestInvalid { path, source })
    }

    pub fn load(&self) -> Option<Manifest> {
        match self.try_load() {
            Ok(manifest) => Some(manifest),
            Err(CleanerError::ManifestNotFound(_)) => None,
            Err(err) => {
                warn!("ignoring unreadable manifest: {}", err);
                None
            }
        }
    }

    pub fn listed(&self, manifest: Manifest) -> Option<Vec<C>> {
        let records = C::unwrap_records(manifest.entries)?;
        Some(
            records
                .into_iter()
                .map(|record| C::from_record(record, &self.root))
                .collect(),
        )
    }

    pub fn candidates_from(&self, manifest: Manifest) -> Vec<C> {
        self.listed(manifest).unwrap_or_default()
    }

    pub fn candidates(&self) -> Vec<C> {
        self.load()
            .map(|manifest| self.candidates_from(manifest))
            .unwrap_or_default()
    }

    pub fn delete(&self) -> Result<bool, CleanerError> {
        let path = self.full_path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(CleanerError::io(path, err)),
        }
    }
}
