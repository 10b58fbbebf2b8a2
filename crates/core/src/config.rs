use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CleanerError;

pub const CONFIG_FILE_NAME: &str = "asset-cleaner.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    pub assets: AssetConfig,
    pub components: ComponentConfig,
}

impl CleanerConfig {
    pub fn load(path: &Path) -> Result<Self, CleanerError> {
        let data = fs::read_to_string(path).map_err(|err| CleanerError::io(path, err))?;
        serde_json::from_str(&data).map_err(|source| CleanerError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_or_default(root: &Path) -> Result<Self, CleanerError> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneratorSetting {
    Enabled(bool),
    Mode(GeneratorMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorMode {
    Auto,
}

impl Default for GeneratorSetting {
    fn default() -> Self {
        Self::Mode(GeneratorMode::Auto)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub scan_paths: Vec<String>,
    pub image_extensions: Vec<String>,
    pub search_paths: Vec<String>,
    pub search_extensions: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub protected_patterns: Vec<String>,
    pub manifest_path: String,
    pub backup_before_delete: bool,
    pub backup_path: String,
    pub root_files: Vec<String>,
    pub pattern_generators: BTreeMap<String, GeneratorSetting>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            scan_paths: strings(&["public", "resources"]),
            image_extensions: strings(&[
                "jpg", "jpeg", "png", "gif", "svg", "webp", "ico", "bmp", "tiff", "tif", "avif",
            ]),
            search_paths: strings(&["app", "resources", "routes", "config", "database"]),
            search_extensions: strings(&[
                "php", "blade.php", "js", "jsx", "ts", "tsx", "vue", "svelte", "css", "scss",
                "sass", "less", "styl", "json", "yaml", "yml", "md", "mdx",
            ]),
            exclude_patterns: strings(&[
                "**/node_modules/**",
                "**/vendor/**",
                "**/.git/**",
                "**/cache/**",
                "**/storage/framework/**",
                "**/public/build/**",
            ]),
            protected_patterns: strings(&[
                "**/favicon.ico",
                "**/favicon.png",
                "**/apple-touch-icon*.png",
                "**/logo.*",
            ]),
            manifest_path: "unused-assets.json".to_string(),
            backup_before_delete: true,
            backup_path: ".asset-cleaner-backup".to_string(),
            root_files: Vec::new(),
            pattern_generators: BTreeMap::from([(
                "blade_icons".to_string(),
                GeneratorSetting::default(),
            )]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    pub anonymous_paths: Vec<String>,
    pub class_paths: Vec<String>,
    pub search_paths: Vec<String>,
    pub search_extensions: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub protected_patterns: Vec<String>,
    pub manifest_path: String,
    pub backup_before_delete: bool,
    pub backup_path: String,
    pub class_namespace: String,
    pub views_path: String,
    pub view_suffix: String,
    pub component_base_classes: Vec<String>,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            anonymous_paths: strings(&["resources/views/components"]),
            class_paths: strings(&["app/View/Components"]),
            search_paths: strings(&["resources/views", "app", "routes", "config"]),
            search_extensions: strings(&["blade.php", "php"]),
            exclude_patterns: strings(&["**/vendor/**", "**/node_modules/**"]),
            protected_patterns: strings(&["layout", "layouts.*", "app-layout"]),
            manifest_path: "unused-components.json".to_string(),
            backup_before_delete: true,
            backup_path: ".blade-cleaner-backup".to_string(),
            class_namespace: "App\\View\\Components\\".to_string(),
            views_path: "resources/views".to_string(),
            view_suffix: ".blade.php".to_string(),
            component_base_classes: strings(&["Illuminate\\View\\Component"]),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{CleanerConfig, GeneratorMode, GeneratorSetting, CONFIG_FILE_NAME};

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config: CleanerConfig = serde_json::from_str(
            r#"{
                "assets": { "scan_paths": ["static"], "backup_before_delete": false },
                "components": { "protected_patterns": ["shell"] }
            }"#,
        )
        .expect("config parses");

        assert_eq!(config.assets.scan_paths, vec!["static".to_string()]);
        assert!(!config.assets.backup_before_delete);
        assert_eq!(config.assets.manifest_path, "unused-assets.json");
        assert_eq!(config.components.protected_patterns, vec!["shell".to_string()]);
        assert_eq!(config.components.views_path, "resources/views");
    }

    #[test]
    fn generator_settings_accept_bool_and_auto() {
        let config: CleanerConfig = serde_json::from_str(
            r#"{ "assets": { "pattern_generators": { "blade_icons": true, "other": "auto", "off": false } } }"#,
        )
        .expect("config parses");
        let generators = &config.assets.pattern_generators;
        assert_eq!(generators["blade_icons"], GeneratorSetting::Enabled(true));
        assert_eq!(generators["other"], GeneratorSetting::Mode(GeneratorMode::Auto));
        assert_eq!(generators["off"], GeneratorSetting::Enabled(false));
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let config = CleanerConfig::load_or_default(dir.path()).expect("defaults");
        assert_eq!(config, CleanerConfig::default());
    }

    #[test]
    fn malformed_config_file_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{ nope").expect("write");
        let err = CleanerConfig::load_or_default(dir.path()).expect_err("must fail");
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
