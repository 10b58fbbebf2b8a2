use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use asset_cleaner_core::{AssetCleaner, AssetConfig, CleanerError, GeneratorSetting};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) -> Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

fn sample_project() -> Result<TempDir> {
    let project = TempDir::new()?;
    let root = project.path();
    write(root, "public/favicon.ico", "icon")?;
    write(root, "public/images/used-banner.png", "banner-bytes")?;
    write(root, "public/images/orphan-photo.jpg", "orphan-bytes")?;
    write(root, "public/images/stale-chart.png", "chart")?;
    write(
        root,
        "resources/views/home.blade.php",
        "<img src=\"{{ asset('images/used-banner.png') }}\">",
    )?;
    write(root, "routes/web.php", "<?php Route::view('/', 'home');")?;
    Ok(project)
}

fn unused_paths(cleaner: &AssetCleaner) -> Vec<String> {
    cleaner
        .find_unused()
        .into_iter()
        .map(|asset| asset.relative_path)
        .collect()
}

#[test]
fn scan_finds_every_image_under_the_scan_roots() -> Result<()> {
    let project = TempDir::new()?;
    write(project.path(), "public/images/logo.png", "png")?;
    write(project.path(), "public/images/hero.jpg", "jpg")?;
    write(project.path(), "resources/images/icon.svg", "<svg/>")?;
    write(project.path(), "resources/images/readme.txt", "not an image")?;

    let config = AssetConfig {
        scan_paths: vec!["public".to_string(), "resources".to_string()],
        image_extensions: vec!["png".to_string(), "jpg".to_string(), "svg".to_string()],
        ..AssetConfig::default()
    };
    let cleaner = AssetCleaner::from_config(project.path(), &config)?;
    assert_eq!(cleaner.scan().len(), 3);
    Ok(())
}

#[test]
fn referenced_and_protected_assets_are_not_reported() -> Result<()> {
    let project = sample_project()?;
    let cleaner = AssetCleaner::from_config(project.path(), &AssetConfig::default())?;

    assert_eq!(
        unused_paths(&cleaner),
        vec!["public/images/orphan-photo.jpg", "public/images/stale-chart.png"]
    );
    Ok(())
}

#[test]
fn repeated_searches_agree() -> Result<()> {
    let project = sample_project()?;
    let cleaner = AssetCleaner::from_config(project.path(), &AssetConfig::default())?;
    assert_eq!(cleaner.find_unused(), cleaner.find_unused());
    Ok(())
}

#[test]
fn reviewed_manifest_drives_deletion_with_backup() -> Result<()> {
    let project = sample_project()?;
    let root = project.path();
    let cleaner = AssetCleaner::from_config(root, &AssetConfig::default())?;

    let manifest = cleaner.generate_manifest()?;
    assert_eq!(manifest.total_scanned, 4);
    assert_eq!(manifest.total_unused, 2);
    assert_eq!(manifest.total_size, 12 + 5);

    // Keep the chart by removing its entry, as a reviewer would.
    let manifest_path = cleaner.manifest().full_path();
    let mut json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&manifest_path)?)?;
    let entries = json["assets"]
        .as_array_mut()
        .ok_or_else(|| anyhow::anyhow!("assets array missing"))?;
    entries.retain(|entry| entry["filename"] != "stale-chart.png");
    fs::write(&manifest_path, serde_json::to_string_pretty(&json)?)?;

    let result = cleaner.clean_from_manifest(false)?;
    assert_eq!(result.deleted, 1);
    assert_eq!(result.backed_up, 1);
    assert_eq!(result.total_size, 12);
    assert!(result.failed.is_empty());

    assert!(!root.join("public/images/orphan-photo.jpg").exists());
    assert!(root.join("public/images/stale-chart.png").exists());
    assert!(!cleaner.manifest().exists());

    let backup_root = cleaner.deleter().backup_root();
    let runs = fs::read_dir(&backup_root)?.collect::<Result<Vec<_>, _>>()?;
    assert_eq!(runs.len(), 1);
    let copy = runs[0].path().join("public/images/orphan-photo.jpg");
    assert_eq!(fs::read_to_string(copy)?, "orphan-bytes");
    Ok(())
}

#[test]
fn missing_files_keep_the_manifest_for_another_pass() -> Result<()> {
    let project = sample_project()?;
    let root = project.path();
    let cleaner = AssetCleaner::from_config(root, &AssetConfig::default())?.without_backup();
    cleaner.generate_manifest()?;

    fs::remove_file(root.join("public/images/stale-chart.png"))?;
    let result = cleaner.clean_from_manifest(false)?;
    assert_eq!(result.deleted, 1);
    assert_eq!(
        result.failed,
        vec!["public/images/stale-chart.png (file not found)"]
    );
    assert!(cleaner.manifest().exists());
    assert!(!cleaner.deleter().backup_root().exists());
    Ok(())
}

#[test]
fn clean_requires_a_manifest() -> Result<()> {
    let project = sample_project()?;
    let cleaner = AssetCleaner::from_config(project.path(), &AssetConfig::default())?;
    let err = cleaner
        .clean_from_manifest(true)
        .expect_err("no manifest was generated");
    assert!(matches!(err, CleanerError::ManifestNotFound(_)));
    Ok(())
}

#[test]
fn dry_run_matches_live_run_without_touching_disk() -> Result<()> {
    let project = sample_project()?;
    let root = project.path();
    let cleaner = AssetCleaner::from_config(root, &AssetConfig::default())?;

    let preview = cleaner.clean_all(true);
    assert_eq!(preview.scanned, 4);
    assert_eq!(preview.deletion.deleted, 2);
    assert_eq!(preview.deletion.backed_up, 0);
    assert!(root.join("public/images/orphan-photo.jpg").exists());
    assert!(root.join("public/images/stale-chart.png").exists());
    assert!(!cleaner.deleter().backup_root().exists());
    assert!(!cleaner.manifest().exists());

    let live = cleaner.clean_all(false);
    assert_eq!(live.deletion.deleted, preview.deletion.deleted);
    assert_eq!(live.deletion.total_size, preview.deletion.total_size);
    assert_eq!(live.deletion.backed_up, 2);
    assert!(!root.join("public/images/orphan-photo.jpg").exists());
    assert!(root.join("public/images/used-banner.png").exists());
    assert!(root.join("public/favicon.ico").exists());
    Ok(())
}

#[test]
fn statistics_split_used_and_unused() -> Result<()> {
    let project = sample_project()?;
    let cleaner = AssetCleaner::from_config(project.path(), &AssetConfig::default())?;
    let stats = cleaner.statistics();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.unused, 2);
    assert_eq!(stats.used, 2);
    assert_eq!(stats.total_size, 4 + 12 + 12 + 5);
    assert_eq!(stats.unused_size, 12 + 5);
    Ok(())
}

#[test]
fn references_are_listed_per_file() -> Result<()> {
    let project = sample_project()?;
    write(
        project.path(),
        "resources/css/app.css",
        ".hero { background: url('/images/used-banner.png'); }",
    )?;
    let cleaner = AssetCleaner::from_config(project.path(), &AssetConfig::default())?;

    let banner = cleaner
        .find_candidate("public/images/used-banner.png")
        .ok_or_else(|| anyhow::anyhow!("banner not scanned"))?;
    let mut references = cleaner.find_references(&banner);
    references.sort();
    assert_eq!(
        references,
        vec!["resources/css/app.css", "resources/views/home.blade.php"]
    );
    Ok(())
}

#[test]
fn root_files_join_the_search_corpus() -> Result<()> {
    let project = TempDir::new()?;
    let root = project.path();
    write(root, "public/patterns/dots-grid.svg", "<svg/>")?;
    write(
        root,
        "tailwind.config.js",
        "backgroundImage: { dots: \"url('/patterns/dots-grid.svg')\" }",
    )?;

    let without = AssetCleaner::from_config(root, &AssetConfig::default())?;
    assert_eq!(without.find_unused().len(), 1);

    let config = AssetConfig {
        root_files: vec!["tailwind.config.js".to_string()],
        ..AssetConfig::default()
    };
    let with = AssetCleaner::from_config(root, &config)?;
    assert!(with.find_unused().is_empty());
    Ok(())
}

#[test]
fn blade_icon_names_count_as_references_when_package_is_present() -> Result<()> {
    let project = TempDir::new()?;
    let root = project.path();
    write(root, "resources/svg/ArrowRight.svg", "<svg/>")?;
    write(root, "resources/views/nav.blade.php", "<x-icon-arrow-right class=\"w-4\"/>")?;

    let auto = AssetCleaner::from_config(root, &AssetConfig::default())?;
    assert_eq!(auto.find_unused().len(), 1);

    fs::create_dir_all(root.join("vendor/blade-ui-kit/blade-icons"))?;
    let detected = AssetCleaner::from_config(root, &AssetConfig::default())?;
    assert!(detected.find_unused().is_empty());

    let config = AssetConfig {
        pattern_generators: BTreeMap::from([(
            "blade_icons".to_string(),
            GeneratorSetting::Enabled(false),
        )]),
        ..AssetConfig::default()
    };
    let disabled = AssetCleaner::from_config(root, &config)?;
    assert_eq!(disabled.find_unused().len(), 1);
    Ok(())
}
