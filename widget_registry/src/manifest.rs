//! Best-effort discovery of widget types from per-type directories.
//!
//! A widget type can exist on disk without being declared in the registry
//! document (hand-installed widgets, or a registry that was wiped). Each
//! type directory carries a `manifest.json`; any directory with a parseable
//! manifest counts as a discoverable type.

use std::path::Path;

use types::{WidgetManifest, WidgetType};

use crate::StorageError;

/// Scan the immediate subdirectories of the widgets directory for
/// manifests. Failures are per-directory: a broken manifest is logged and
/// skipped, never propagated.
pub async fn scan_widget_dirs(widgets_dir: &Path) -> Vec<WidgetType> {
    let mut discovered = Vec::new();

    let mut entries = match tokio::fs::read_dir(widgets_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(
                "failed to read widgets directory {}: {e}",
                widgets_dir.display()
            );
            return discovered;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("failed to read widgets directory entry: {e}");
                break;
            }
        };

        let is_dir = entry
            .file_type()
            .await
            .map(|ft| ft.is_dir())
            .unwrap_or(false);
        if !is_dir {
            continue;
        }

        let type_id = entry.file_name().to_string_lossy().to_string();
        match read_manifest(widgets_dir, &type_id).await {
            Ok(Some(manifest)) => discovered.push(WidgetType {
                id: manifest.id,
                name: manifest.name,
                description: manifest.description,
            }),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("error loading manifest for {type_id}: {e}");
            }
        }
    }

    discovered
}

/// Read the manifest for one widget type. A missing manifest is `None`;
/// an unreadable or malformed one is an error so callers can decide
/// whether to surface or skip it.
///
/// # Errors
///
/// Returns a `StorageError` if the manifest exists but cannot be read or
/// parsed.
pub async fn read_manifest(
    widgets_dir: &Path,
    type_id: &str,
) -> Result<Option<WidgetManifest>, StorageError> {
    let path = widgets_dir.join(type_id).join("manifest.json");

    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    Ok(Some(serde_json::from_str(&raw)?))
}

/// Merge registry-declared types with directory-discovered ones.
///
/// Pure: registry entries keep their order and win on id clashes;
/// discovered types are appended only when their id is new.
#[must_use]
pub fn merge_widget_types(
    registry: Vec<WidgetType>,
    discovered: Vec<WidgetType>,
) -> Vec<WidgetType> {
    let mut merged = registry;

    for candidate in discovered {
        if merged.iter().any(|wt| wt.id == candidate.id) {
            continue;
        }
        merged.push(candidate);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget_type(id: &str, name: &str) -> WidgetType {
        WidgetType {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_merge_registry_entries_win() {
        let registry = vec![widget_type("clock", "Clock")];
        let discovered = vec![widget_type("clock", "Disk Clock")];

        let merged = merge_widget_types(registry, discovered);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "Clock");
    }

    #[test]
    fn test_merge_appends_new_discoveries_after_registry() {
        let registry = vec![widget_type("clock", "Clock")];
        let discovered = vec![widget_type("xkcd", "XKCD"), widget_type("clock", "Dup")];

        let merged = merge_widget_types(registry, discovered);

        let ids: Vec<&str> = merged.iter().map(|wt| wt.id.as_str()).collect();
        assert_eq!(ids, vec!["clock", "xkcd"]);
    }

    #[test]
    fn test_merge_empty_registry() {
        let discovered = vec![widget_type("xkcd", "XKCD")];
        let merged = merge_widget_types(Vec::new(), discovered.clone());
        assert_eq!(merged, discovered);
    }

    #[tokio::test]
    async fn test_scan_skips_broken_manifests_and_plain_files() {
        let dir = tempfile::tempdir().unwrap();
        let widgets_dir = dir.path();

        // valid type directory
        let clock_dir = widgets_dir.join("clock");
        tokio::fs::create_dir_all(&clock_dir).await.unwrap();
        tokio::fs::write(
            clock_dir.join("manifest.json"),
            r#"{"id": "clock", "name": "Clock"}"#,
        )
        .await
        .unwrap();

        // directory with a malformed manifest
        let broken_dir = widgets_dir.join("broken");
        tokio::fs::create_dir_all(&broken_dir).await.unwrap();
        tokio::fs::write(broken_dir.join("manifest.json"), "{nope")
            .await
            .unwrap();

        // directory without any manifest
        tokio::fs::create_dir_all(widgets_dir.join("empty"))
            .await
            .unwrap();

        // a stray file next to the type directories
        tokio::fs::write(widgets_dir.join("registry.json"), "{}")
            .await
            .unwrap();

        let discovered = scan_widget_dirs(widgets_dir).await;

        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].id, "clock");
        assert_eq!(discovered[0].description, "");
    }

    #[tokio::test]
    async fn test_scan_missing_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let discovered = scan_widget_dirs(&dir.path().join("nonexistent")).await;
        assert!(discovered.is_empty());
    }

    #[tokio::test]
    async fn test_read_manifest_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = read_manifest(dir.path(), "ghost").await.unwrap();
        assert!(manifest.is_none());
    }

    #[tokio::test]
    async fn test_read_manifest_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let type_dir = dir.path().join("bad");
        tokio::fs::create_dir_all(&type_dir).await.unwrap();
        tokio::fs::write(type_dir.join("manifest.json"), "not json")
            .await
            .unwrap();

        assert!(read_manifest(dir.path(), "bad").await.is_err());
    }
}
