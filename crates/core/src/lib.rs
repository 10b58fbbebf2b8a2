pub mod cleaner;
pub mod component_scan;
pub mod config;
pub mod delete;
pub mod error;
pub mod glob;
pub mod manifest;
pub mod model;
pub mod naming;
pub mod patterns;
pub mod scan;
pub mod search;

pub use cleaner::{AssetCleaner, BladeCleaner, Cleaner};
pub use component_scan::{ComponentScanner, PhpClass};
pub use config::{
    AssetConfig, CleanerConfig, ComponentConfig, GeneratorMode, GeneratorSetting,
    CONFIG_FILE_NAME,
};
pub use delete::{Deleter, BACKUP_STAMP_FORMAT};
pub use error::CleanerError;
pub use glob::{GlobPattern, PatternSet};
pub use manifest::ManifestManager;
pub use model::{
    human_size, AssetRecord, BackingFile, Candidate, CandidateKind, CleanAllResult, Component,
    ComponentRecord, DeletionResult, ImageAsset, Manifest, ManifestEntries, ManifestInstructions,
    Statistics, MODIFIED_AT_FORMAT,
};
pub use patterns::{builtin_generators, resolve_generators, BladeIconsGenerator, PatternGenerator};
pub use scan::{AssetScanner, CandidateScanner};
pub use search::{
    AssetPatterns, AssetReferenceSearcher, ComponentPatterns, ComponentReferenceSearcher,
    ReferenceSearcher, SearchPatterns, SearchScope,
};
