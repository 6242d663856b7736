//! Catalog store: owns the in-memory catalog and persists it after every mutation

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};
use parking_lot::Mutex;
use thiserror::Error;

use crate::catalog::{Catalog, CommandGroup, CommandItem};
use crate::document::{self, FormatError};

/// Errors that can occur while reading or mutating the catalog
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("Group not found: {0}")]
    GroupNotFound(String),
    #[error("Command not found: {command_id} (group: {group_id})")]
    CommandNotFound {
        group_id: String,
        command_id: String,
    },
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("Unable to {action} catalog file {path}: {source}")]
    Persistence {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the catalog lives between runs
pub trait CatalogBackend: Send {
    /// Load the stored catalog, or an empty one if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Persistence` if storage cannot be read, or
    /// `StoreError::Format` if the stored document is malformed.
    fn load(&self) -> Result<Catalog, StoreError>;

    /// Replace the stored catalog.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Persistence` if storage cannot be written.
    fn save(&self, catalog: &Catalog) -> Result<(), StoreError>;

    /// Human readable location, used in status messages
    fn describe(&self) -> String;
}

/// Stores the catalog as a JSON document on disk
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn persistence_error(&self, action: &'static str, source: std::io::Error) -> StoreError {
        StoreError::Persistence {
            action,
            path: self.path.clone(),
            source,
        }
    }
}

impl CatalogBackend for JsonFileBackend {
    fn load(&self) -> Result<Catalog, StoreError> {
        if !self.path.exists() {
            debug!(
                "No catalog file at {}, starting empty",
                self.path.display()
            );
            return Ok(Catalog::default());
        }
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| self.persistence_error("read", e))?;
        let catalog = document::from_document(&contents)?;
        info!(
            "Loaded {} groups from {}",
            catalog.groups.len(),
            self.path.display()
        );
        Ok(catalog)
    }

    fn save(&self, catalog: &Catalog) -> Result<(), StoreError> {
        let contents = document::to_document(catalog)?;
        write_atomic(&self.path, &contents).map_err(|e| self.persistence_error("write", e))?;
        debug!("Saved catalog to {}", self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps the last saved catalog in memory only
#[derive(Debug, Default)]
pub struct MemoryBackend {
    saved: Mutex<Catalog>,
}

impl CatalogBackend for MemoryBackend {
    fn load(&self) -> Result<Catalog, StoreError> {
        Ok(self.saved.lock().clone())
    }

    fn save(&self, catalog: &Catalog) -> Result<(), StoreError> {
        *self.saved.lock() = catalog.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Write `contents` to `path` through a temporary file in the same directory, so a
/// reader never observes a half-written document.
///
/// # Errors
///
/// Returns the underlying IO error if the directory cannot be created or the
/// temporary file cannot be written or renamed.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    // temp files start owner-only; keep the target's mode or fall back to 0644
    match std::fs::metadata(path) {
        Ok(existing) => tmp.as_file().set_permissions(existing.permissions())?,
        Err(_) => set_default_permissions(tmp.as_file())?,
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn set_default_permissions(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

/// How an imported document combines with the current catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// The document becomes the catalog
    #[default]
    Replace,
    /// Groups with a known id are replaced in place, the rest are appended
    Merge,
}

/// Owns the catalog and its backend. Every mutation is saved before it is committed.
pub struct CatalogStore {
    catalog: Catalog,
    backend: Box<dyn CatalogBackend>,
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("groups", &self.catalog.groups.len())
            .field("backend", &self.backend.describe())
            .finish()
    }
}

fn require_non_empty(value: &str, what: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{what} must not be empty")));
    }
    Ok(())
}

impl CatalogStore {
    /// Open a store, loading whatever the backend currently holds.
    ///
    /// # Errors
    ///
    /// Returns the backend's load error.
    pub fn open(backend: impl CatalogBackend + 'static) -> Result<Self, StoreError> {
        let catalog = backend.load()?;
        Ok(Self {
            catalog,
            backend: Box::new(backend),
        })
    }

    /// Open a JSON file backed store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file exists but cannot be read or parsed.
    pub fn open_file(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open(JsonFileBackend::new(path))
    }

    /// A store that never touches the filesystem.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            catalog: Catalog::default(),
            backend: Box::new(MemoryBackend::default()),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn location(&self) -> String {
        self.backend.describe()
    }

    /// Apply `change` to a working copy, save it, and only then make it current.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut Catalog) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut next = self.catalog.clone();
        let value = change(&mut next)?;
        self.backend.save(&next)?;
        self.catalog = next;
        Ok(value)
    }

    /// Append a new empty group and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the trimmed name is empty, or
    /// `StoreError::Persistence` if the catalog cannot be saved.
    pub fn create_group(&mut self, name: &str) -> Result<String, StoreError> {
        require_non_empty(name, "Group name")?;
        let group = CommandGroup::new(name.trim());
        let id = group.id.clone();
        self.commit(|catalog| {
            catalog.groups.push(group);
            Ok(())
        })?;
        info!("Created group '{}' ({id})", name.trim());
        Ok(id)
    }

    /// Look up a group by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::GroupNotFound` if no group has this id.
    pub fn group(&self, group_id: &str) -> Result<&CommandGroup, StoreError> {
        self.catalog
            .group(group_id)
            .ok_or_else(|| StoreError::GroupNotFound(group_id.to_string()))
    }

    /// Look up a command within a group.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::GroupNotFound` or `StoreError::CommandNotFound`.
    pub fn command(&self, group_id: &str, command_id: &str) -> Result<&CommandItem, StoreError> {
        self.group(group_id)?
            .command(command_id)
            .ok_or_else(|| StoreError::CommandNotFound {
                group_id: group_id.to_string(),
                command_id: command_id.to_string(),
            })
    }

    /// Remove a group together with all of its commands.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::GroupNotFound` if the id is unknown, or
    /// `StoreError::Persistence` if the catalog cannot be saved.
    pub fn delete_group(&mut self, group_id: &str) -> Result<(), StoreError> {
        let removed = self.commit(|catalog| {
            let index = catalog
                .groups
                .iter()
                .position(|g| g.id == group_id)
                .ok_or_else(|| StoreError::GroupNotFound(group_id.to_string()))?;
            Ok(catalog.groups.remove(index))
        })?;
        info!(
            "Deleted group '{}' with {} commands",
            removed.name,
            removed.commands.len()
        );
        Ok(())
    }

    /// Append a command to a group and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for an empty name or command,
    /// `StoreError::GroupNotFound` if the group is unknown, or
    /// `StoreError::Persistence` if the catalog cannot be saved.
    pub fn add_command(
        &mut self,
        group_id: &str,
        name: &str,
        command: &str,
        is_detached: bool,
    ) -> Result<String, StoreError> {
        require_non_empty(name, "Command name")?;
        require_non_empty(command, "Command")?;
        let item = CommandItem::new(name.trim(), command, is_detached);
        let id = item.id.clone();
        self.commit(|catalog| {
            catalog
                .group_mut(group_id)
                .ok_or_else(|| StoreError::GroupNotFound(group_id.to_string()))?
                .commands
                .push(item);
            Ok(())
        })?;
        info!("Added command '{}' ({id}) to group {group_id}", name.trim());
        Ok(id)
    }

    /// Remove a single command from a group.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::GroupNotFound` or `StoreError::CommandNotFound` if either id
    /// is unknown, or `StoreError::Persistence` if the catalog cannot be saved.
    pub fn delete_command(&mut self, group_id: &str, command_id: &str) -> Result<(), StoreError> {
        self.commit(|catalog| {
            let group = catalog
                .group_mut(group_id)
                .ok_or_else(|| StoreError::GroupNotFound(group_id.to_string()))?;
            let index = group
                .commands
                .iter()
                .position(|c| c.id == command_id)
                .ok_or_else(|| StoreError::CommandNotFound {
                    group_id: group_id.to_string(),
                    command_id: command_id.to_string(),
                })?;
            group.commands.remove(index);
            Ok(())
        })?;
        info!("Deleted command {command_id} from group {group_id}");
        Ok(())
    }

    /// Serialize the current catalog.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Format` if serialization fails.
    pub fn export_catalog(&self) -> Result<String, StoreError> {
        Ok(document::to_document(&self.catalog)?)
    }

    /// Replace or merge the catalog from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Format` if the document is malformed or the merged result
    /// breaks id uniqueness, or `StoreError::Persistence` if it cannot be saved. The
    /// current catalog is left untouched on any error.
    pub fn import_catalog(&mut self, text: &str, mode: ImportMode) -> Result<usize, StoreError> {
        let incoming = document::from_document(text)?;
        let count = incoming.groups.len();
        self.commit(|catalog| {
            match mode {
                ImportMode::Replace => *catalog = incoming,
                ImportMode::Merge => {
                    for group in incoming.groups {
                        match catalog.group_mut(&group.id) {
                            Some(existing) => *existing = group,
                            None => catalog.groups.push(group),
                        }
                    }
                    document::validate(catalog)?;
                }
            }
            Ok(())
        })?;
        info!("Imported {count} groups ({mode:?})");
        Ok(count)
    }
}
