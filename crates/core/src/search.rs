use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{AssetConfig, ComponentConfig};
use crate::error::CleanerError;
use crate::glob::PatternSet;
use crate::model::{Candidate, Component, ImageAsset};
use crate::naming::{raw_url_encode, relative_to};
use crate::patterns::{resolve_generators, PatternGenerator};
use crate::scan::walk_files;

pub trait SearchPatterns {
    type Candidate: Candidate;

    fn patterns(&self, candidate: &Self::Candidate) -> Vec<String>;
}

pub struct AssetPatterns {
    generators: Vec<Box<dyn PatternGenerator>>,
}

impl AssetPatterns {
    pub fn new(generators: Vec<Box<dyn PatternGenerator>>) -> Self {
        Self { generators }
    }
}

impl SearchPatterns for AssetPatterns {
    type Candidate = ImageAsset;

    fn patterns(&self, asset: &ImageAsset) -> Vec<String> {
        let relative = asset.relative_path.replace('\\', "/");
        let mut patterns = vec![relative.clone()];
        if let Some(public) = relative.strip_prefix("public/") {
            patterns.push(public.to_string());
        }
        patterns.push(asset.filename.clone());
        patterns.push(asset.stem().to_string());
        patterns.push(raw_url_encode(&asset.filename));

        for generator in &self.generators {
            if generator.supports(asset) {
                patterns.extend(generator.generate(asset));
            }
        }
        dedupe(patterns)
    }
}

pub struct ComponentPatterns {
    views_path: String,
    view_suffix: String,
}

impl ComponentPatterns {
    pub fn new(views_path: &str, view_suffix: &str) -> Self {
        Self {
            views_path: views_path.trim_end_matches('/').to_string(),
            view_suffix: view_suffix.to_string(),
        }
    }

    fn resolved_view_name(&self, component: &Component) -> Option<String> {
        let relative = component.view_relative_path.as_deref()?;
        let inside_views = relative
            .strip_prefix(&self.views_path)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(relative);
        let without_suffix = inside_views
            .strip_suffix(&self.view_suffix)
            .unwrap_or(inside_views);
        Some(without_suffix.replace('/', "."))
    }
}

impl SearchPatterns for ComponentPatterns {
    type Candidate = Component;

    fn patterns(&self, component: &Component) -> Vec<String> {
        let name = &component.name;
        let view_name = component.view_name();

        let mut patterns = vec![
            format!("<{}", component.tag_name()),
            format!("component=\"{name}\""),
            format!("component='{name}'"),
            format!(":component=\"'{name}'\""),
            format!(":component='\"{name}\"'"),
            format!("@component('{view_name}'"),
            format!("@component(\"{view_name}\""),
            format!("@component('{name}'"),
            format!("@component(\"{name}\""),
        ];

        if component.is_class_based {
            if let Some(class_name) = &component.class_name {
                let class_name = class_name.trim_start_matches('\\');
                patterns.push(format!("{class_name}::class"));
                if let Some((_, short)) = class_name.rsplit_once('\\') {
                    patterns.push(format!("{short}::class"));
                }
            }
        }

        patterns.push(format!("view('{view_name}'"));
        patterns.push(format!("view(\"{view_name}\""));
        patterns.push(format!("@include('{view_name}'"));
        patterns.push(format!("@include(\"{view_name}\""));

        if let Some(resolved) = self.resolved_view_name(component) {
            if resolved != view_name {
                patterns.push(format!("view('{resolved}'"));
                patterns.push(format!("view(\"{resolved}\""));
            }
        }
        dedupe(patterns)
    }
}

#[derive(Debug, Clone)]
pub struct SearchScope {
    root: PathBuf,
    search_paths: Vec<String>,
    extensions: Vec<String>,
    excludes: PatternSet,
    root_files: Vec<String>,
}

impl SearchScope {
    pub fn new(
        root: &Path,
        search_paths: &[String],
        extensions: &[String],
        exclude_patterns: &[String],
        root_files: &[String],
    ) -> Result<Self, CleanerError> {
        Ok(Self {
            root: root.to_path_buf(),
            search_paths: search_paths.to_vec(),
            extensions: extensions
                .iter()
                .map(|ext| format!(".{}", ext.trim_start_matches('.').to_lowercase()))
                .collect(),
            excludes: PatternSet::new(exclude_patterns)?,
            root_files: root_files.to_vec(),
        })
    }

    fn is_searchable(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    pub fn files(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for search_path in &self.search_paths {
            let dir = self.root.join(search_path);
            if !dir.is_dir() {
                debug!("search root missing: {}", dir.display());
                continue;
            }
            for path in walk_files(&dir) {
                if !self.is_searchable(&path)
                    || self.excludes.is_match(&relative_to(&path, &self.root))
                {
                    continue;
                }
                if seen.insert(path.clone()) {
                    files.push(path);
                }
            }
        }

        for root_file in &self.root_files {
            let path = self.root.join(root_file);
            if path.is_file() && seen.insert(path.clone()) {
                files.push(path);
            }
        }
        files
    }

    pub fn relative(&self, path: &Path) -> String {
        relative_to(path, &self.root)
    }
}

fn read_lowercase(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).to_lowercase()),
        Err(err) => {
            debug!("unreadable search file skipped: {}: {}", path.display(), err);
            None
        }
    }
}

pub struct ReferenceSearcher<P> {
    scope: SearchScope,
    patterns: P,
}

pub type AssetReferenceSearcher = ReferenceSearcher<AssetPatterns>;
pub type ComponentReferenceSearcher = ReferenceSearcher<ComponentPatterns>;

impl<P: SearchPatterns> ReferenceSearcher<P> {
    pub fn new(scope: SearchScope, patterns: P) -> Self {
        Self { scope, patterns }
    }

    pub fn scope(&self) -> &SearchScope {
        &self.scope
    }

    pub fn patterns_for(&self, candidate: &P::Candidate) -> Vec<String> {
        self.patterns.patterns(candidate)
    }

    pub fn find_unused(&self, candidates: &[P::Candidate]) -> Vec<P::Candidate> {
        let files = self.scope.files();
        let corpus = files
            .iter()
            .filter_map(|path| read_lowercase(path))
            .collect::<Vec<_>>()
            .join("\n");
        info!(
            "searching {} file(s) for {} {}",
            files.len(),
            candidates.len(),
            <P::Candidate as Candidate>::KIND.plural()
        );

        candidates
            .iter()
            .filter(|candidate| !contains_any(&corpus, &self.lowered_patterns(candidate)))
            .cloned()
            .collect()
    }

    pub fn find_references(&self, candidate: &P::Candidate) -> Vec<String> {
        let patterns = self.lowered_patterns(candidate);
        self.scope
            .files()
            .into_iter()
            .filter(|path| {
                read_lowercase(path).is_some_and(|contents| contains_any(&contents, &patterns))
            })
            .map(|path| self.scope.relative(&path))
            .collect()
    }

    fn lowered_patterns(&self, candidate: &P::Candidate) -> Vec<String> {
        self.patterns
            .patterns(candidate)
            .into_iter()
            .map(|pattern| pattern.to_lowercase())
            .collect()
    }
}

impl AssetReferenceSearcher {
    pub fn for_assets(root: &Path, config: &AssetConfig) -> Result<Self, CleanerError> {
        let scope = SearchScope::new(
            root,
            &config.search_paths,
            &config.search_extensions,
            &config.exclude_patterns,
            &config.root_files,
        )?;
        let generators = resolve_generators(&config.pattern_generators, root);
        Ok(Self::new(scope, AssetPatterns::new(generators)))
    }
}

impl ComponentReferenceSearcher {
    pub fn for_components(root: &Path, config: &ComponentConfig) -> Result<Self, CleanerError> {
        let scope = SearchScope::new(
            root,
            &config.search_paths,
            &config.search_extensions,
            &config.exclude_patterns,
            &[],
        )?;
        Ok(Self::new(
            scope,
            ComponentPatterns::new(&config.views_path, &config.view_suffix),
        ))
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle.as_str()))
}

fn dedupe(patterns: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    patterns
        .into_iter()
        .filter(|pattern| !pattern.is_empty() && seen.insert(pattern.clone()))
        .collect()
}
