use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::config::ComponentConfig;
use crate::error::CleanerError;
use crate::glob::PatternSet;
use crate::model::Component;
use crate::naming::{class_segment_to_kebab, relative_to};
use crate::scan::{walk_files, CandidateScanner};

static NAMESPACE_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*namespace\s+([\w\\]+)\s*[;{]").expect("valid regex"));
static USE_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*use\s+\\?([\w\\]+)(?:\s+as\s+(\w+))?\s*;").expect("valid regex")
});
static CLASS_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[\s;{}])((?:(?:abstract|final|readonly)\s+)*)class\s+(\w+)(?:\s+extends\s+(\\?[\w\\]+))?")
        .expect("valid regex")
});
static RENDER_VIEW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"return\s+view\s*\(\s*['"]([^'"]+)['"]"#).expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhpClass {
    pub namespace: Option<String>,
    pub name: String,
    pub parent: Option<String>,
    pub is_abstract: bool,
    /// Alias -> fully-qualified name from `use` statements.
    pub imports: HashMap<String, String>,
}

impl PhpClass {
    pub fn parse(source: &str) -> Option<Self> {
        let declarations = CLASS_DECL
            .captures_iter(source)
            .filter(|caps| !matches!(&caps[2], "extends" | "implements"))
            .collect::<Vec<_>>();
        let declaration = declarations
            .iter()
            .find(|caps| caps.get(3).is_some())
            .or_else(|| declarations.first())?;

        let namespace = NAMESPACE_DECL
            .captures(source)
            .map(|caps| caps[1].trim_matches('\\').to_string());
        let imports = USE_DECL
            .captures_iter(source)
            .map(|caps| {
                let full = caps[1].to_string();
                let alias = caps
                    .get(2)
                    .map(|alias| alias.as_str().to_string())
                    .unwrap_or_else(|| short_name(&full).to_string());
                (alias, full)
            })
            .collect();

        Some(Self {
            namespace,
            name: declaration[2].to_string(),
            parent: declaration.get(3).map(|parent| parent.as_str().to_string()),
            is_abstract: declaration[1].contains("abstract"),
            imports,
        })
    }

    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}\\{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn resolved_parent(&self) -> Option<String> {
        let parent = self.parent.as_deref()?;
        if let Some(absolute) = parent.strip_prefix('\\') {
            return Some(absolute.to_string());
        }

        let (head, rest) = match parent.split_once('\\') {
            Some((head, rest)) => (head, Some(rest)),
            None => (parent, None),
        };
        if let Some(imported) = self.imports.get(head) {
            return Some(match rest {
                Some(rest) => format!("{imported}\\{rest}"),
                None => imported.clone(),
            });
        }

        Some(match &self.namespace {
            Some(namespace) => format!("{namespace}\\{parent}"),
            None => parent.to_string(),
        })
    }

    fn parent_is_imported(&self) -> bool {
        self.parent.as_deref().is_some_and(|parent| {
            parent.starts_with('\\')
                || self
                    .imports
                    .contains_key(parent.split('\\').next().unwrap_or(parent))
        })
    }
}

struct ParsedClass {
    path: PathBuf,
    class: PhpClass,
    source: String,
}

#[derive(Debug, Clone)]
pub struct ComponentScanner {
    root: PathBuf,
    anonymous_paths: Vec<String>,
    class_paths: Vec<String>,
    excludes: PatternSet,
    protected: PatternSet,
    class_namespace: String,
    views_path: String,
    view_suffix: String,
    base_classes: HashSet<String>,
}

impl ComponentScanner {
    pub fn new(root: &Path, config: &ComponentConfig) -> Result<Self, CleanerError> {
        Ok(Self {
            root: root.to_path_buf(),
            anonymous_paths: config.anonymous_paths.clone(),
            class_paths: config.class_paths.clone(),
            excludes: PatternSet::new(&config.exclude_patterns)?,
            protected: PatternSet::new(&config.protected_patterns)?,
            class_namespace: config.class_namespace.trim_start_matches('\\').to_string(),
            views_path: config.views_path.trim_end_matches('/').to_string(),
            view_suffix: config.view_suffix.clone(),
            base_classes: config
                .component_base_classes
                .iter()
                .map(|class| class.trim_start_matches('\\').to_string())
                .collect(),
        })
    }

    pub fn class_component_name(&self, class_name: &str) -> String {
        let trimmed = class_name.trim_start_matches('\\');
        let local = trimmed.strip_prefix(&self.class_namespace).unwrap_or(trimmed);
        local
            .split('\\')
            .filter(|segment| !segment.is_empty())
            .map(class_segment_to_kebab)
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn anonymous_component_name(&self, path: &Path, anonymous_root: &Path) -> String {
        let relative = relative_to(path, anonymous_root);
        let without_suffix = relative
            .strip_suffix(&self.view_suffix)
            .unwrap_or(&relative);
        let name = without_suffix.replace('/', ".");
        match name.strip_suffix(".index") {
            Some(stripped) => stripped.to_string(),
            None => name,
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.excludes.is_match(&relative_to(path, &self.root))
    }

    fn scan_class_based(&self) -> Vec<Component> {
        let mut parsed = Vec::new();
        for class_path in &self.class_paths {
            let dir = self.root.join(class_path);
            if !dir.is_dir() {
                debug!("class component root missing: {}", dir.display());
                continue;
            }
            for path in walk_files(&dir) {
                if !path.to_string_lossy().ends_with(".php") || self.is_excluded(&path) {
                    continue;
                }
                let Ok(source) = fs::read_to_string(&path) else {
                    debug!("unreadable class file skipped: {}", path.display());
                    continue;
                };
                if let Some(class) = PhpClass::parse(&source) {
                    parsed.push(ParsedClass {
                        path,
                        class,
                        source,
                    });
                }
            }
        }

        let hierarchy = parsed
            .iter()
            .map(|item| (item.class.qualified_name(), &item.class))
            .collect::<HashMap<_, _>>();

        parsed
            .iter()
            .filter(|item| !item.class.is_abstract)
            .filter(|item| self.is_component_class(&item.class, &hierarchy))
            .map(|item| {
                let class_name = item.class.qualified_name();
                let name = self.class_component_name(&class_name);
                let view = self.find_view(&name, &item.source);
                Component::class_based(name, &item.path, class_name, &self.root, view.as_deref())
            })
            .collect()
    }

    fn is_component_class(&self, class: &PhpClass, hierarchy: &HashMap<String, &PhpClass>) -> bool {
        let mut current = class;
        let mut visited = HashSet::new();
        loop {
            let Some(parent) = current.resolved_parent() else {
                return false;
            };
            if self.base_classes.contains(&parent) {
                return true;
            }
            if let Some(&next) = hierarchy.get(&parent) {
                if !visited.insert(parent) {
                    return false;
                }
                current = next;
                continue;
            }
            if !current.parent_is_imported() {
                let short = current.parent.as_deref().map(short_name).unwrap_or_default();
                return self
                    .base_classes
                    .iter()
                    .any(|base| short_name(base) == short);
            }
            return false;
        }
    }

    fn find_view(&self, component_name: &str, class_source: &str) -> Option<PathBuf> {
        let views = self.root.join(&self.views_path);

        if let Some(caps) = RENDER_VIEW.captures(class_source) {
            let custom = views.join(format!("{}{}", caps[1].replace('.', "/"), self.view_suffix));
            if custom.is_file() {
                return Some(custom);
            }
        }

        let conventional_dir = format!("components/{}", component_name.replace('.', "/"));
        let conventional = views.join(format!("{conventional_dir}{}", self.view_suffix));
        if conventional.is_file() {
            return Some(conventional);
        }

        let index = views.join(format!("{conventional_dir}/index{}", self.view_suffix));
        if index.is_file() {
            return Some(index);
        }

        None
    }

    fn scan_anonymous(&self, claimed_views: &HashSet<String>) -> Vec<Component> {
        let mut components = Vec::new();
        for anonymous_path in &self.anonymous_paths {
            let dir = self.root.join(anonymous_path);
            if !dir.is_dir() {
                debug!("anonymous component root missing: {}", dir.display());
                continue;
            }
            for path in walk_files(&dir) {
                if !path.to_string_lossy().ends_with(&self.view_suffix) || self.is_excluded(&path) {
                    continue;
                }
                if claimed_views.contains(&relative_to(&path, &self.root)) {
                    continue;
                }
                let name = self.anonymous_component_name(&path, &dir);
                components.push(Component::anonymous(name, &path, &self.root));
            }
        }
        components
    }
}

impl CandidateScanner for ComponentScanner {
    type Candidate = Component;

    fn scan(&self) -> Vec<Component> {
        let mut components = self.scan_class_based();
        let claimed_views = components
            .iter()
            .filter_map(|component| component.view_relative_path.clone())
            .collect::<HashSet<_>>();
        let class_count = components.len();
        components.extend(self.scan_anonymous(&claimed_views));

        info!(
            "component scan found {} class-based and {} anonymous component(s)",
            class_count,
            components.len() - class_count
        );
        components
    }

    fn is_protected(&self, component: &Component) -> bool {
        self.protected.is_match(&component.name)
    }
}

fn short_name(class_name: &str) -> &str {
    class_name.rsplit('\\').next().unwrap_or(class_name)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{ComponentScanner, PhpClass};
    use crate::config::ComponentConfig;

    fn scanner() -> ComponentScanner {
        ComponentScanner::new(Path::new("/project"), &ComponentConfig::default())
            .expect("scanner")
    }

    #[test]
    fn parses_namespace_imports_and_parent() {
        let class = PhpClass::parse(
            r"<?php

namespace App\View\Components\Forms;

use Illuminate\View\Component as BaseComponent;
use Illuminate\Contracts\View\View;

final class TextInput extends BaseComponent
{
    public function render(): View
    {
        return view('components.forms.text-input');
    }
}
",
        )
        .expect("class found");

        assert_eq!(class.qualified_name(), r"App\View\Components\Forms\TextInput");
        assert_eq!(class.resolved_parent().as_deref(), Some(r"Illuminate\View\Component"));
        assert!(!class.is_abstract);
    }

    #[test]
    fn unimported_parent_resolves_inside_namespace() {
        let class = PhpClass::parse(
            "<?php\nnamespace App\\View\\Components;\nclass Primary extends Button {}\n",
        )
        .expect("class found");
        assert_eq!(
            class.resolved_parent().as_deref(),
            Some(r"App\View\Components\Button")
        );
    }

    #[test]
    fn single_line_declaration_is_found() {
        let class = PhpClass::parse("<?php class Alert extends Component {}").expect("class found");
        assert_eq!(class.name, "Alert");
        assert_eq!(class.parent.as_deref(), Some("Component"));
        assert_eq!(class.namespace, None);
    }

    #[test]
    fn comments_mentioning_class_do_not_win_over_declaration() {
        let class = PhpClass::parse(
            "<?php\n// this class renders\nabstract class Base extends \\Illuminate\\View\\Component {}\n",
        )
        .expect("class found");
        assert_eq!(class.name, "Base");
        assert!(class.is_abstract);
        assert_eq!(class.resolved_parent().as_deref(), Some(r"Illuminate\View\Component"));
    }

    #[test]
    fn files_without_classes_are_ignored() {
        assert!(PhpClass::parse("<?php\nreturn ['key' => Foo::class];\n").is_none());
    }

    #[test]
    fn class_names_map_to_dotted_kebab_names() {
        let scanner = scanner();
        assert_eq!(
            scanner.class_component_name(r"App\View\Components\Forms\TextInput"),
            "forms.text-input"
        );
        assert_eq!(scanner.class_component_name("Alert"), "alert");
        assert_eq!(scanner.class_component_name(r"Vendor\UiKit\Modal"), "vendor.ui-kit.modal");
    }

    #[test]
    fn anonymous_names_collapse_index_templates() {
        let scanner = scanner();
        let root = Path::new("/project/resources/views/components");
        assert_eq!(
            scanner.anonymous_component_name(&root.join("forms/input.blade.php"), root),
            "forms.input"
        );
        assert_eq!(
            scanner.anonymous_component_name(&root.join("card/index.blade.php"), root),
            "card"
        );
        assert_eq!(
            scanner.anonymous_component_name(&root.join("index.blade.php"), root),
            "index"
        );
    }
}
