//! Request/response surface over the catalog store and the command runner.
//!
//! Every operation is a method on [`Bridge`], and the same set is available as a
//! serde-tagged [`Request`] for callers that speak JSON. Errors from the store and
//! runner are folded into a [`BridgeError`] carrying one of a few stable [`ErrorKind`]s.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::runner::{GroupRunEntry, RunError, Runner};
use crate::store::{self, CatalogStore, ImportMode, StoreError};

/// Failure categories visible to callers of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Execution,
    Launch,
    Format,
    Persistence,
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct BridgeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<StoreError> for BridgeError {
    fn from(err: StoreError) -> Self {
        let kind = match err {
            StoreError::Validation(_) => ErrorKind::Validation,
            StoreError::GroupNotFound(_) | StoreError::CommandNotFound { .. } => {
                ErrorKind::NotFound
            }
            StoreError::Format(_) => ErrorKind::Format,
            StoreError::Persistence { .. } => ErrorKind::Persistence,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<RunError> for BridgeError {
    fn from(err: RunError) -> Self {
        let kind = match err {
            RunError::Execution { .. } => ErrorKind::Execution,
            RunError::Launch(_) => ErrorKind::Launch,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Result of an export: a status line plus the document itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportResult {
    pub message: String,
    pub document: String,
}

/// Owns the catalog store and the runner; one call at a time.
#[derive(Debug)]
pub struct Bridge {
    store: CatalogStore,
    runner: Runner,
}

impl Bridge {
    #[must_use]
    pub fn new(store: CatalogStore, runner: Runner) -> Self {
        Self { store, runner }
    }

    #[must_use]
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// # Errors
    ///
    /// `validation` for an empty name, `persistence` if the catalog cannot be saved.
    pub fn create_group(&mut self, name: &str) -> Result<String, BridgeError> {
        Ok(self.store.create_group(name)?)
    }

    #[must_use]
    pub fn get_groups(&self) -> Catalog {
        self.store.catalog().clone()
    }

    /// # Errors
    ///
    /// `not_found` for an unknown group, `persistence` if the catalog cannot be saved.
    pub fn delete_group(&mut self, group_id: &str) -> Result<(), BridgeError> {
        Ok(self.store.delete_group(group_id)?)
    }

    /// # Errors
    ///
    /// `validation` for empty input, `not_found` for an unknown group, `persistence` if
    /// the catalog cannot be saved.
    pub fn add_command_to_group(
        &mut self,
        group_id: &str,
        name: &str,
        command: &str,
        is_detached: bool,
    ) -> Result<String, BridgeError> {
        Ok(self
            .store
            .add_command(group_id, name, command, is_detached)?)
    }

    /// # Errors
    ///
    /// `not_found` if either id is unknown, `persistence` if the catalog cannot be saved.
    pub fn delete_command_from_group(
        &mut self,
        group_id: &str,
        command_id: &str,
    ) -> Result<(), BridgeError> {
        Ok(self.store.delete_command(group_id, command_id)?)
    }

    /// # Errors
    ///
    /// `execution` on a non-zero exit (message carries the output), `launch` if the
    /// shell cannot start.
    pub fn execute_command(&self, command: &str) -> Result<String, BridgeError> {
        Ok(self.runner.execute(command)?.combined())
    }

    /// # Errors
    ///
    /// `launch` if the process cannot be spawned.
    pub fn execute_command_detached(&self, command: &str) -> Result<String, BridgeError> {
        Ok(self.runner.execute_detached(command)?)
    }

    /// Run one stored command, honouring its detached flag.
    ///
    /// # Errors
    ///
    /// `not_found` for unknown ids, otherwise as [`Bridge::execute_command`] or
    /// [`Bridge::execute_command_detached`].
    pub fn execute_stored_command(
        &self,
        group_id: &str,
        command_id: &str,
    ) -> Result<String, BridgeError> {
        let cmd = self.store.command(group_id, command_id)?;
        if cmd.is_detached {
            self.execute_command_detached(&cmd.command)
        } else {
            self.execute_command(&cmd.command)
        }
    }

    /// # Errors
    ///
    /// `not_found` for an unknown group. Failures of individual commands are reported
    /// in their entries.
    pub fn execute_group_commands(
        &self,
        group_id: &str,
    ) -> Result<Vec<GroupRunEntry>, BridgeError> {
        let group = self.store.group(group_id)?;
        Ok(self.runner.execute_group(group))
    }

    /// Serialize the catalog, optionally writing the document to `target`.
    ///
    /// # Errors
    ///
    /// `format` if serialization fails, `persistence` if `target` cannot be written.
    pub fn export_data(&self, target: Option<&Path>) -> Result<ExportResult, BridgeError> {
        let document = self.store.export_catalog()?;
        let message = match target {
            Some(path) => {
                store::write_atomic(path, &document).map_err(|e| {
                    BridgeError::from(StoreError::Persistence {
                        action: "export",
                        path: path.to_path_buf(),
                        source: e,
                    })
                })?;
                info!("Exported catalog to {}", path.display());
                format!("Data exported to: {}", path.display())
            }
            None => format!("Data saved to: {}", self.store.location()),
        };
        Ok(ExportResult { message, document })
    }

    /// # Errors
    ///
    /// `format` for a malformed document, `persistence` if it cannot be saved. The
    /// catalog is unchanged on error.
    pub fn import_data(&mut self, data: &str, merge: bool) -> Result<String, BridgeError> {
        let mode = if merge {
            ImportMode::Merge
        } else {
            ImportMode::Replace
        };
        let count = self.store.import_catalog(data, mode)?;
        Ok(match mode {
            ImportMode::Replace => format!("Data imported successfully ({count} groups)"),
            ImportMode::Merge => format!("Data merged successfully ({count} groups)"),
        })
    }

    /// Handle one serialized request.
    pub fn dispatch(&mut self, request: Request) -> Response {
        debug!("Dispatching {request:?}");
        let result = match request {
            Request::CreateGroup { name } => self.create_group(&name).and_then(to_value),
            Request::GetGroups => to_value(self.get_groups()),
            Request::DeleteGroup { group_id } => {
                self.delete_group(&group_id).map(|()| serde_json::Value::Null)
            }
            Request::AddCommandToGroup {
                group_id,
                name,
                command,
                is_detached,
            } => self
                .add_command_to_group(&group_id, &name, &command, is_detached)
                .and_then(to_value),
            Request::DeleteCommandFromGroup {
                group_id,
                command_id,
            } => self
                .delete_command_from_group(&group_id, &command_id)
                .map(|()| serde_json::Value::Null),
            Request::ExecuteCommand { command } => {
                self.execute_command(&command).and_then(to_value)
            }
            Request::ExecuteCommandDetached { command } => {
                self.execute_command_detached(&command).and_then(to_value)
            }
            Request::ExecuteStoredCommand {
                group_id,
                command_id,
            } => self
                .execute_stored_command(&group_id, &command_id)
                .and_then(to_value),
            Request::ExecuteGroupCommands { group_id } => {
                self.execute_group_commands(&group_id).and_then(|entries| {
                    to_value(
                        entries
                            .into_iter()
                            .map(|e| (e.name, e.output))
                            .collect::<Vec<_>>(),
                    )
                })
            }
            Request::ExportData { path } => {
                self.export_data(path.as_deref()).and_then(to_value)
            }
            Request::ImportData { data, merge } => {
                self.import_data(&data, merge).and_then(to_value)
            }
        };
        match result {
            Ok(value) => Response::Ok(value),
            Err(err) => Response::Error(err),
        }
    }
}

fn to_value(value: impl Serialize) -> Result<serde_json::Value, BridgeError> {
    serde_json::to_value(value).map_err(|e| BridgeError {
        kind: ErrorKind::Format,
        message: format!("Unable to serialize response: {e}"),
    })
}

/// One bridge call, tagged by operation name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateGroup {
        name: String,
    },
    GetGroups,
    DeleteGroup {
        #[serde(alias = "groupId")]
        group_id: String,
    },
    AddCommandToGroup {
        #[serde(alias = "groupId")]
        group_id: String,
        name: String,
        command: String,
        #[serde(default, alias = "isDetached")]
        is_detached: bool,
    },
    DeleteCommandFromGroup {
        #[serde(alias = "groupId")]
        group_id: String,
        #[serde(alias = "commandId")]
        command_id: String,
    },
    ExecuteCommand {
        command: String,
    },
    ExecuteCommandDetached {
        command: String,
    },
    ExecuteStoredCommand {
        #[serde(alias = "groupId")]
        group_id: String,
        #[serde(alias = "commandId")]
        command_id: String,
    },
    ExecuteGroupCommands {
        #[serde(alias = "groupId")]
        group_id: String,
    },
    ExportData {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    ImportData {
        data: String,
        #[serde(default)]
        merge: bool,
    },
}

/// Reply to a [`Request`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Ok(serde_json::Value),
    Error(BridgeError),
}
