use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::naming::{file_stem, relative_to};

pub const MODIFIED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Asset,
    Component,
}

impl CandidateKind {
    pub fn plural(self) -> &'static str {
        match self {
            CandidateKind::Asset => "assets",
            CandidateKind::Component => "components",
        }
    }

    pub fn instructions(self) -> ManifestInstructions {
        match self {
            CandidateKind::Asset => ManifestInstructions {
                review: "Review the assets below and remove any that are actually used.".to_string(),
                delete_entry: "Remove the entry from the \"assets\" array to keep the file."
                    .to_string(),
                clean: "Run `asset-cleaner assets clean` to delete remaining assets.".to_string(),
            },
            CandidateKind::Component => ManifestInstructions {
                review: "Review the components below and remove any that are actually used."
                    .to_string(),
                delete_entry:
                    "Remove the entry from the \"components\" array to keep the component."
                        .to_string(),
                clean: "Run `asset-cleaner components clean` to delete remaining components."
                    .to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackingFile {
    pub path: PathBuf,
    pub relative_path: String,
}

pub trait Candidate: Clone {
    type Record: Serialize + Clone;

    const KIND: CandidateKind;

    const MISSING_REASON: &'static str;

    fn identifier(&self) -> &str;

    fn size(&self) -> u64;

    fn existing_files(&self) -> Vec<BackingFile>;

    fn to_record(&self) -> Self::Record;

    fn from_record(record: Self::Record, root: &Path) -> Self;

    fn wrap_records(records: Vec<Self::Record>) -> ManifestEntries;

    fn unwrap_records(entries: ManifestEntries) -> Option<Vec<Self::Record>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub path: PathBuf,
    pub relative_path: String,
    pub filename: String,
    pub extension: String,
    pub size: u64,
    pub modified_at: Option<i64>,
}

impl ImageAsset {
    pub fn from_path(path: &Path, root: &Path) -> Self {
        let metadata = fs::metadata(path).ok();
        Self {
            path: path.to_path_buf(),
            relative_path: relative_to(path, root),
            filename: path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default(),
            extension: lowercase_extension(path),
            size: metadata.as_ref().map_or(0, Metadata::len),
            modified_at: metadata.as_ref().and_then(modified_timestamp),
        }
    }

    pub fn stem(&self) -> &str {
        file_stem(&self.filename)
    }

    pub fn human_size(&self) -> String {
        human_size(self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub path: String,
    pub filename: String,
    #[serde(default)]
    pub extension: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub size_human: String,
    #[serde(default)]
    pub modified_at: Option<String>,
}

impl Candidate for ImageAsset {
    type Record = AssetRecord;

    const KIND: CandidateKind = CandidateKind::Asset;
    const MISSING_REASON: &'static str = "file not found";

    fn identifier(&self) -> &str {
        &self.relative_path
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn existing_files(&self) -> Vec<BackingFile> {
        if self.path.is_file() {
            vec![BackingFile {
                path: self.path.clone(),
                relative_path: self.relative_path.clone(),
            }]
        } else {
            Vec::new()
        }
    }

    fn to_record(&self) -> AssetRecord {
        AssetRecord {
            path: self.relative_path.clone(),
            filename: self.filename.clone(),
            extension: self.extension.clone(),
            size: self.size,
            size_human: self.human_size(),
            modified_at: self.modified_at.and_then(format_timestamp),
        }
    }

    fn from_record(record: AssetRecord, root: &Path) -> Self {
        Self {
            path: root.join(&record.path),
            relative_path: record.path,
            filename: record.filename,
            extension: record.extension,
            size: record.size,
            modified_at: record.modified_at.as_deref().and_then(parse_timestamp),
        }
    }

    fn wrap_records(records: Vec<AssetRecord>) -> ManifestEntries {
        ManifestEntries::Assets { assets: records }
    }

    fn unwrap_records(entries: ManifestEntries) -> Option<Vec<AssetRecord>> {
        match entries {
            ManifestEntries::Assets { assets } => Some(assets),
            ManifestEntries::Components { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub view_path: Option<PathBuf>,
    pub view_relative_path: Option<String>,
    pub is_class_based: bool,
    pub class_path: Option<PathBuf>,
    pub class_relative_path: Option<String>,
    pub class_name: Option<String>,
    pub total_size: u64,
    pub modified_at: Option<i64>,
}

impl Component {
    pub fn anonymous(name: impl Into<String>, view_path: &Path, root: &Path) -> Self {
        let metadata = fs::metadata(view_path).ok();
        Self {
            name: name.into(),
            view_path: Some(view_path.to_path_buf()),
            view_relative_path: Some(relative_to(view_path, root)),
            is_class_based: false,
            class_path: None,
            class_relative_path: None,
            class_name: None,
            total_size: metadata.as_ref().map_or(0, Metadata::len),
            modified_at: metadata.as_ref().and_then(modified_timestamp),
        }
    }

    pub fn class_based(
        name: impl Into<String>,
        class_path: &Path,
        class_name: impl Into<String>,
        root: &Path,
        view_path: Option<&Path>,
    ) -> Self {
        let class_metadata = fs::metadata(class_path).ok();
        let view_metadata = view_path.and_then(|path| fs::metadata(path).ok());

        let total_size = class_metadata.as_ref().map_or(0, Metadata::len)
            + view_metadata.as_ref().map_or(0, Metadata::len);
        let modified_at = class_metadata
            .as_ref()
            .and_then(modified_timestamp)
            .max(view_metadata.as_ref().and_then(modified_timestamp));

        Self {
            name: name.into(),
            view_path: view_path.map(Path::to_path_buf),
            view_relative_path: view_path.map(|path| relative_to(path, root)),
            is_class_based: true,
            class_path: Some(class_path.to_path_buf()),
            class_relative_path: Some(relative_to(class_path, root)),
            class_name: Some(class_name.into()),
            total_size,
            modified_at,
        }
    }

    pub fn tag_name(&self) -> String {
        format!("x-{}", self.name)
    }

    pub fn view_name(&self) -> String {
        format!("components.{}", self.name)
    }

    pub fn is_inline(&self) -> bool {
        self.is_class_based && self.view_path.is_none()
    }

    pub fn human_size(&self) -> String {
        human_size(self.total_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    #[serde(default)]
    pub view_path: Option<String>,
    #[serde(default)]
    pub is_class_based: bool,
    #[serde(default)]
    pub class_path: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub size_human: String,
    #[serde(default)]
    pub modified_at: Option<String>,
}

impl Candidate for Component {
    type Record = ComponentRecord;

    const KIND: CandidateKind = CandidateKind::Component;
    const MISSING_REASON: &'static str = "no files found";

    fn identifier(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.total_size
    }

    fn existing_files(&self) -> Vec<BackingFile> {
        let mut files = Vec::new();
        if let (Some(path), Some(relative)) = (&self.view_path, &self.view_relative_path) {
            if path.is_file() {
                files.push(BackingFile {
                    path: path.clone(),
                    relative_path: relative.clone(),
                });
            }
        }
        if self.is_class_based {
            if let (Some(path), Some(relative)) = (&self.class_path, &self.class_relative_path) {
                if path.is_file() {
                    files.push(BackingFile {
                        path: path.clone(),
                        relative_path: relative.clone(),
                    });
                }
            }
        }
        files
    }

    fn to_record(&self) -> ComponentRecord {
        ComponentRecord {
            name: self.name.clone(),
            view_path: self.view_relative_path.clone(),
            is_class_based: self.is_class_based,
            class_path: self.class_relative_path.clone(),
            class_name: self.class_name.clone(),
            size: self.total_size,
            size_human: self.human_size(),
            modified_at: self.modified_at.and_then(format_timestamp),
        }
    }

    fn from_record(record: ComponentRecord, root: &Path) -> Self {
        Self {
            name: record.name,
            view_path: record.view_path.as_ref().map(|path| root.join(path)),
            view_relative_path: record.view_path,
            is_class_based: record.is_class_based,
            class_path: record.class_path.as_ref().map(|path| root.join(path)),
            class_relative_path: record.class_path,
            class_name: record.class_name,
            total_size: record.size,
            modified_at: record.modified_at.as_deref().and_then(parse_timestamp),
        }
    }

    fn wrap_records(records: Vec<ComponentRecord>) -> ManifestEntries {
        ManifestEntries::Components {
            components: records,
        }
    }

    fn unwrap_records(entries: ManifestEntries) -> Option<Vec<ComponentRecord>> {
        match entries {
            ManifestEntries::Components { components } => Some(components),
            ManifestEntries::Assets { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ManifestInstructions {
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub delete_entry: String,
    #[serde(default)]
    pub clean: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestEntries {
    Assets { assets: Vec<AssetRecord> },
    Components { components: Vec<ComponentRecord> },
}

impl ManifestEntries {
    pub fn len(&self) -> usize {
        match self {
            ManifestEntries::Assets { assets } => assets.len(),
            ManifestEntries::Components { components } => components.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub total_scanned: u64,
    #[serde(default)]
    pub total_unused: u64,
    #[serde(default)]
    pub total_size: u64,
    #[serde(default)]
    pub total_size_human: String,
    #[serde(default)]
    pub instructions: ManifestInstructions,
    #[serde(flatten)]
    pub entries: ManifestEntries,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionResult {
    pub deleted: u64,
    pub backed_up: u64,
    pub failed: Vec<String>,
    pub total_size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanAllResult {
    pub scanned: u64,
    #[serde(flatten)]
    pub deletion: DeletionResult,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total: u64,
    pub unused: u64,
    pub used: u64,
    pub total_size: u64,
    pub unused_size: u64,
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    let rounded = (size * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

pub fn format_timestamp(timestamp: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|time| time.format(MODIFIED_AT_FORMAT).to_string())
}

pub fn parse_timestamp(text: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(text, MODIFIED_AT_FORMAT)
        .ok()
        .map(|time| time.and_utc().timestamp())
}

pub(crate) fn modified_timestamp(metadata: &Metadata) -> Option<i64> {
    metadata
        .modified()
        .ok()
        .map(|time| DateTime::<Utc>::from(time).timestamp())
}

fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
