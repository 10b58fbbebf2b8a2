use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::GeneratorSetting;
use crate::model::ImageAsset;
use crate::naming::stem_to_kebab;

pub trait PatternGenerator: Send + Sync {
    fn key(&self) -> &'static str;

    fn is_available(&self, root: &Path) -> bool;

    fn supports(&self, asset: &ImageAsset) -> bool;

    fn generate(&self, asset: &ImageAsset) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BladeIconsGenerator;

const BLADE_ICONS_PACKAGE: &str = "blade-ui-kit/blade-icons";

impl PatternGenerator for BladeIconsGenerator {
    fn key(&self) -> &'static str {
        "blade_icons"
    }

    fn is_available(&self, root: &Path) -> bool {
        if root.join("vendor").join(BLADE_ICONS_PACKAGE).is_dir() {
            return true;
        }
        fs::read_to_string(root.join("composer.json"))
            .map(|composer| composer.contains(&format!("\"{BLADE_ICONS_PACKAGE}\"")))
            .unwrap_or(false)
    }

    fn supports(&self, asset: &ImageAsset) -> bool {
        asset.extension == "svg"
    }

    fn generate(&self, asset: &ImageAsset) -> Vec<String> {
        let stem = asset.stem();
        let kebab = stem_to_kebab(stem);
        if kebab.is_empty() || kebab == stem || kebab == stem.to_lowercase() {
            Vec::new()
        } else {
            vec![kebab]
        }
    }
}

pub fn builtin_generators() -> Vec<Box<dyn PatternGenerator>> {
    vec![Box::new(BladeIconsGenerator)]
}

pub fn resolve_generators(
    settings: &BTreeMap<String, GeneratorSetting>,
    root: &Path,
) -> Vec<Box<dyn PatternGenerator>> {
    builtin_generators()
        .into_iter()
        .filter(|generator| {
            let enabled = match settings.get(generator.key()).copied().unwrap_or_default() {
                GeneratorSetting::Enabled(enabled) => enabled,
                GeneratorSetting::Mode(_) => generator.is_available(root),
            };
            debug!("pattern generator {} enabled={}", generator.key(), enabled);
            enabled
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::{resolve_generators, BladeIconsGenerator, PatternGenerator};
    use crate::config::GeneratorSetting;
    use crate::model::ImageAsset;

    fn asset(filename: &str) -> ImageAsset {
        let path = Path::new("/project/resources/svg").join(filename);
        ImageAsset::from_path(&path, Path::new("/project"))
    }

    #[test]
    fn blade_icons_emits_kebab_names_for_svgs() {
        let generator = BladeIconsGenerator;
        assert_eq!(generator.generate(&asset("ArrowRight.svg")), vec!["arrow-right"]);
        assert_eq!(generator.generate(&asset("arrow_right.svg")), vec!["arrow-right"]);
        assert!(generator.generate(&asset("arrow-right.svg")).is_empty());
        assert!(generator.generate(&asset("Logo.svg")).is_empty());
        assert!(!generator.supports(&asset("ArrowRight.png")));
        assert!(generator.supports(&asset("ArrowRight.SVG")));
    }

    #[test]
    fn availability_follows_vendor_dir_or_composer() {
        let dir = TempDir::new().expect("tempdir");
        let generator = BladeIconsGenerator;
        assert!(!generator.is_available(dir.path()));

        fs::write(
            dir.path().join("composer.json"),
            r#"{ "require": { "blade-ui-kit/blade-icons": "^1.5" } }"#,
        )
        .expect("write");
        assert!(generator.is_available(dir.path()));

        let other = TempDir::new().expect("tempdir");
        fs::create_dir_all(other.path().join("vendor/blade-ui-kit/blade-icons")).expect("mkdir");
        assert!(generator.is_available(other.path()));
    }

    #[test]
    fn explicit_settings_override_detection() {
        let dir = TempDir::new().expect("tempdir");
        let mut settings = BTreeMap::new();
        assert!(resolve_generators(&settings, dir.path()).is_empty());

        settings.insert("blade_icons".to_string(), GeneratorSetting::Enabled(true));
        assert_eq!(resolve_generators(&settings, dir.path()).len(), 1);

        fs::create_dir_all(dir.path().join("vendor/blade-ui-kit/blade-icons")).expect("mkdir");
        settings.insert("blade_icons".to_string(), GeneratorSetting::Enabled(false));
        assert!(resolve_generators(&settings, dir.path()).is_empty());
    }
}
