//! Content snapshot loading.
//!
//! Builds the [`InMemorySource`] the retrieval pipeline reads from, out of
//! a JSON export of content items and/or a directory of text files.
//!
//! # Directory Scanning
//!
//! Walks `root` recursively and keeps files whose root-relative path
//! matches one of `include_globs` and none of `exclude_globs`. `.git`,
//! `target` and `node_modules` are always excluded. Each file becomes a
//! published item:
//!
//! | Field | Value |
//! |-------|-------|
//! | `id` | sequential in sorted path order, after the highest JSON id |
//! | `type` | `content_type` from config |
//! | `title` | first `# ` heading, else the file stem |
//! | `body` | file contents |
//! | `permalink` | `file://` + absolute path |
//!
//! Files that cannot be read as UTF-8 text are skipped with a warning and
//! take no id.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use assistant_gateway_core::source::PUBLISHED;
use assistant_gateway_core::{ContentItem, InMemorySource};

use crate::config::{ContentConfig, DirectoryContentConfig};

/// Load the configured content snapshot. With no source configured the
/// snapshot is empty.
pub fn load_content_source(config: &ContentConfig) -> Result<InMemorySource> {
    let mut items = match &config.json {
        Some(path) => load_json_items(path)?,
        None => Vec::new(),
    };

    if let Some(dir) = &config.directory {
        let next_id = items.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        items.extend(scan_directory(dir, next_id)?);
    }

    info!(items = items.len(), "content snapshot loaded");
    Ok(InMemorySource::new(items))
}

/// Read a JSON array of content items.
pub fn load_json_items(path: &Path) -> Result<Vec<ContentItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read content file: {}", path.display()))?;
    let items: Vec<ContentItem> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse content file: {}", path.display()))?;
    Ok(items)
}

/// Scan a directory into published items, numbering from `first_id`.
pub fn scan_directory(config: &DirectoryContentConfig, first_id: u64) -> Result<Vec<ContentItem>> {
    let root = &config.root;
    if !root.exists() {
        bail!("Content directory does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut paths: Vec<(String, PathBuf)> = Vec::new();

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        paths.push((rel_str, path.to_path_buf()));
    }

    paths.sort_by(|a, b| a.0.cmp(&b.0));

    let items = paths
        .into_iter()
        .filter_map(|(rel, path)| match std::fs::read_to_string(&path) {
            Ok(body) => Some((path, body)),
            Err(e) => {
                warn!(file = %rel, error = %e, "skipping unreadable content file");
                None
            }
        })
        .zip(first_id..)
        .map(|((path, body), id)| file_to_item(&path, body, id, &config.content_type))
        .collect();

    Ok(items)
}

fn file_to_item(path: &Path, body: String, id: u64, content_type: &str) -> ContentItem {
    let title = first_heading(&body).unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    });

    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    ContentItem {
        id,
        content_type: content_type.to_string(),
        status: PUBLISHED.to_string(),
        title,
        body,
        excerpt: String::new(),
        permalink: format!("file://{}", absolute.display()),
    }
}

fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .find_map(|line| line.trim_start().strip_prefix("# "))
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assistant_gateway_core::ContentSource;
    use std::fs;
    use tempfile::TempDir;

    fn dir_config(root: &Path) -> DirectoryContentConfig {
        DirectoryContentConfig {
            root: root.to_path_buf(),
            include_globs: vec!["**/*.md".to_string(), "**/*.txt".to_string()],
            exclude_globs: vec!["drafts/**".to_string()],
            content_type: "doc".to_string(),
            follow_symlinks: false,
        }
    }

    #[test]
    fn test_scan_directory() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.md"), "# Shipping Guide\n\nWe ship worldwide.").unwrap();
        fs::write(tmp.path().join("a.txt"), "Plain notes without a heading.").unwrap();
        fs::write(tmp.path().join("skip.rs"), "fn main() {}").unwrap();
        fs::create_dir(tmp.path().join("drafts")).unwrap();
        fs::write(tmp.path().join("drafts/wip.md"), "# WIP").unwrap();

        let items = scan_directory(&dir_config(tmp.path()), 10).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].id, 10);
        assert_eq!(items[0].title, "a");
        assert_eq!(items[1].id, 11);
        assert_eq!(items[1].title, "Shipping Guide");
        assert_eq!(items[1].content_type, "doc");
        assert_eq!(items[1].status, "publish");
        assert!(items[1].permalink.starts_with("file://"));
        assert!(items[1].permalink.ends_with("b.md"));
    }

    #[test]
    fn test_non_utf8_file_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.md"), [0xff, 0xfe, 0x00, 0x41]).unwrap();
        fs::write(tmp.path().join("b.md"), "# Returns

Returns are free.").unwrap();

        let items = scan_directory(&dir_config(tmp.path()), 1).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 1);
        assert_eq!(items[0].title, "Returns");

        let config = ContentConfig {
            json: None,
            directory: Some(dir_config(tmp.path())),
        };
        assert_eq!(load_content_source(&config).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_root() {
        let err = scan_directory(&dir_config(Path::new("/nonexistent/docs")), 1).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_json_then_directory_ids() {
        let tmp = TempDir::new().unwrap();
        let json_path = tmp.path().join("content.json");
        fs::write(
            &json_path,
            r#"[{"id": 41, "type": "post", "status": "publish", "title": "Hello", "body": "World"}]"#,
        )
        .unwrap();
        let docs = tmp.path().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("faq.md"), "# FAQ\nAnswers.").unwrap();

        let config = ContentConfig {
            json: Some(json_path),
            directory: Some(dir_config(&docs)),
        };
        let source = load_content_source(&config).unwrap();
        assert_eq!(source.len(), 2);
        let faq = source.get(42).unwrap();
        assert_eq!(faq.title, "FAQ");
        assert_eq!(source.get(41).unwrap().excerpt, "");
    }

    #[test]
    fn test_bad_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("content.json");
        fs::write(&path, "{not json").unwrap();
        let err = load_json_items(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse content file"));
    }

    #[test]
    fn test_first_heading() {
        assert_eq!(first_heading("intro\n# Title \nbody").as_deref(), Some("Title"));
        assert_eq!(first_heading("## Sub\ntext"), None);
        assert_eq!(first_heading("# \n"), None);
    }

    #[test]
    fn test_empty_config() {
        let source = load_content_source(&ContentConfig::default()).unwrap();
        assert!(source.is_empty());
    }
}
