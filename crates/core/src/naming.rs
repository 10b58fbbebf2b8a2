use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

static LOWER_UPPER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([A-Z])").expect("valid regex"));
static ACRONYM_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("valid regex"));
static REPEATED_HYPHENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid regex"));

pub fn class_segment_to_kebab(segment: &str) -> String {
    let split = LOWER_UPPER.replace_all(segment, "$1-$2");
    let split = ACRONYM_BOUNDARY.replace_all(&split, "$1-$2");
    collapse_hyphens(&split.replace('_', "-").to_lowercase())
}

pub fn stem_to_kebab(stem: &str) -> String {
    let replaced = stem.replace(['_', ' '], "-");
    let split = LOWER_UPPER.replace_all(&replaced, "$1-$2");
    collapse_hyphens(&split.to_lowercase())
}

fn collapse_hyphens(value: &str) -> String {
    REPEATED_HYPHENS
        .replace_all(value, "-")
        .trim_matches('-')
        .to_string()
}

pub fn raw_url_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

pub fn relative_to(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

pub fn file_stem(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => filename,
    }
}
