//! Core implementation of cmdgroup
//!
//! cmdgroup keeps a catalog of named shell commands organized into groups, persists it
//! as a JSON document, and runs commands on demand, either blocking with captured
//! output or detached in the background. All access goes through a [`bridge::Bridge`],
//! which owns the catalog store and the runner.

use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::bridge::Bridge;
use crate::config_file::{ConfigError, Settings};
use crate::store::{CatalogStore, StoreError};

pub mod bridge;
pub mod catalog;
pub mod config_file;
pub mod document;
pub mod logger;
pub mod mcp;
pub mod runner;
pub mod serve;
pub mod store;

/// Errors that can occur while starting up
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Load settings and open the catalog, returning a ready bridge and the data file path.
///
/// # Errors
///
/// Returns `StartupError::Config` if the settings cannot be loaded or no data file can
/// be resolved, or `StartupError::Store` if an existing data file cannot be read or parsed.
pub fn open_bridge(
    config_file: Option<&Path>,
    data_file: Option<&Path>,
) -> Result<(Bridge, PathBuf), StartupError> {
    let settings = Settings::load(config_file)?;
    let data_path = settings.data_file(data_file)?;
    debug!("Opening catalog at {}", data_path.display());
    let store = CatalogStore::open_file(&data_path)?;
    Ok((Bridge::new(store, settings.runner()), data_path))
}
