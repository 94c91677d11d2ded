//! Flat-file store for the widget registry.
//!
//! The whole registry lives in one JSON document (`registry.json`) inside
//! the widgets directory. Every mutating operation is a full
//! read-modify-write of that document. There is no locking and no
//! transaction: two concurrent writers can each read the pre-mutation
//! state and overwrite each other's change (last writer wins). That is an
//! accepted limitation of the design, not something this crate papers
//! over.

use std::path::{Path, PathBuf};

use thiserror::Error;
use types::{Position, Registry, WidgetInstance, WidgetType, WidgetTypeDetails};

pub mod manifest;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to access the registry file: {0}")]
    Io(#[from] std::io::Error),
    #[error("registry document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Handle to the registry document and the widgets directory around it.
///
/// Cheap to clone; holds no open file handles between operations.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    widgets_dir: PathBuf,
    registry_path: PathBuf,
}

impl RegistryStore {
    pub fn new(widgets_dir: impl Into<PathBuf>) -> Self {
        let widgets_dir = widgets_dir.into();
        let registry_path = widgets_dir.join("registry.json");

        Self {
            widgets_dir,
            registry_path,
        }
    }

    #[must_use]
    pub fn widgets_dir(&self) -> &Path {
        &self.widgets_dir
    }

    #[must_use]
    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    /// Create the widgets directory and an empty registry document if none
    /// exists yet. An existing document is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the directory or file cannot be created.
    #[tracing::instrument(skip(self))]
    pub async fn ensure_initialized(&self) -> Result<(), StorageError> {
        if tokio::fs::try_exists(&self.registry_path).await? {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.widgets_dir).await?;
        tracing::info!(
            "initializing empty registry at {}",
            self.registry_path.display()
        );
        self.save(&Registry::default()).await
    }

    /// Read and parse the registry document.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the file is missing, unreadable, or not
    /// valid JSON. Callers are expected to have run `ensure_initialized`
    /// before first use.
    pub async fn load(&self) -> Result<Registry, StorageError> {
        let raw = tokio::fs::read_to_string(&self.registry_path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Serialize the registry and overwrite the document.
    ///
    /// There is no partial-write protection: a crash mid-write can leave a
    /// truncated document behind.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the file cannot be written.
    pub async fn save(&self, registry: &Registry) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(registry)?;
        tokio::fs::write(&self.registry_path, raw).await?;
        Ok(())
    }

    /// Replace the entire document, used for bulk client-side sync.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the file cannot be written.
    pub async fn replace_all(&self, registry: &Registry) -> Result<(), StorageError> {
        self.save(registry).await
    }

    /// Linear scan of the instances for the first one with a matching id.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the document cannot be read.
    pub async fn find_widget(&self, id: &str) -> Result<Option<WidgetInstance>, StorageError> {
        let registry = self.load().await?;
        Ok(registry.widgets.into_iter().find(|w| w.id == id))
    }

    /// Append an instance to the registry. No duplicate-id check is made;
    /// keeping instance ids unique is the caller's discipline.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the document cannot be read or written.
    #[tracing::instrument(skip(self, widget), fields(id = %widget.id))]
    pub async fn append_widget(&self, widget: WidgetInstance) -> Result<(), StorageError> {
        let mut registry = self.load().await?;
        registry.widgets.push(widget);
        self.save(&registry).await
    }

    /// Remove every instance with the given id. Returns whether anything
    /// was removed; the document is only rewritten when something was.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the document cannot be read or written.
    #[tracing::instrument(skip(self))]
    pub async fn remove_widget(&self, id: &str) -> Result<bool, StorageError> {
        let mut registry = self.load().await?;
        let before = registry.widgets.len();
        registry.widgets.retain(|w| w.id != id);

        if registry.widgets.len() == before {
            return Ok(false);
        }

        self.save(&registry).await?;
        Ok(true)
    }

    /// Set the position of the instance with the given id. Returns whether
    /// the instance was found; an absent id leaves the document untouched.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the document cannot be read or written.
    #[tracing::instrument(skip(self, position))]
    pub async fn upsert_widget_position(
        &self,
        id: &str,
        position: Position,
    ) -> Result<bool, StorageError> {
        let mut registry = self.load().await?;

        let Some(widget) = registry.widgets.iter_mut().find(|w| w.id == id) else {
            return Ok(false);
        };

        widget.position = Some(position);
        self.save(&registry).await?;
        Ok(true)
    }

    /// Append a widget type to the registry and persist it.
    ///
    /// The store does not check for id collisions; the caller layer is
    /// responsible for rejecting duplicates before calling this.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the document cannot be read or written.
    #[tracing::instrument(skip(self, widget_type), fields(id = %widget_type.id))]
    pub async fn register_widget_type(&self, widget_type: WidgetType) -> Result<(), StorageError> {
        let mut registry = self.load().await?;
        registry.widget_types.push(widget_type);
        self.save(&registry).await
    }

    /// Registry-declared types merged with any discoverable from widget
    /// directories on disk. Registry entries win on id clashes; the
    /// directory scan is best-effort and never fails the call.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the registry document cannot be read.
    pub async fn list_widget_types(&self) -> Result<Vec<WidgetType>, StorageError> {
        let registry = self.load().await?;
        let discovered = manifest::scan_widget_dirs(&self.widgets_dir).await;
        Ok(manifest::merge_widget_types(registry.widget_types, discovered))
    }

    /// Look up a widget type: the registry entry if one exists, otherwise
    /// the contents of the type's on-disk manifest.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the registry document or an existing
    /// manifest file cannot be read.
    pub async fn get_widget_type(
        &self,
        id: &str,
    ) -> Result<Option<WidgetTypeDetails>, StorageError> {
        let registry = self.load().await?;

        if let Some(widget_type) = registry.widget_types.into_iter().find(|wt| wt.id == id) {
            return Ok(Some(WidgetTypeDetails::Registered(widget_type)));
        }

        let fallback = manifest::read_manifest(&self.widgets_dir, id).await?;
        Ok(fallback.map(WidgetTypeDetails::Manifest))
    }
}
