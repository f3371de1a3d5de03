//! Input discovery for batch conversion
//!
//! Expands the command-line inputs into RDB files. Each input may be a file,
//! a directory (its direct children with an RDB extension) or a glob pattern.

use crate::constants::RDB_FILE_EXTENSIONS;
use crate::error::{RdbError, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Resolves inputs into a sorted, de-duplicated file list
#[derive(Debug)]
pub struct InputDiscovery {
    inputs: Vec<String>,
}

impl InputDiscovery {
    pub fn new(inputs: Vec<String>) -> Self {
        Self { inputs }
    }

    /// Discover all input files.
    ///
    /// Fails with [`RdbError::NoInputFiles`] when an input matches nothing.
    pub async fn discover_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = BTreeSet::new();

        for input in &self.inputs {
            let found = self.expand_input(input).await?;
            if found.is_empty() {
                return Err(RdbError::NoInputFiles {
                    pattern: input.clone(),
                });
            }
            debug!("Input '{}' expanded to {} files", input, found.len());
            files.extend(found);
        }

        Ok(files.into_iter().collect())
    }

    async fn expand_input(&self, input: &str) -> Result<Vec<PathBuf>> {
        let path = Path::new(input);

        if path.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }
        if path.is_dir() {
            return discover_directory_files(path).await;
        }

        let entries = glob::glob(input).map_err(|e| RdbError::Configuration {
            message: format!("invalid glob pattern '{}': {}", input, e),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            match entry {
                Ok(file) if file.is_file() => files.push(file),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable glob match: {}", e),
            }
        }
        Ok(files)
    }
}

/// RDB files directly inside a directory
async fn discover_directory_files(dir_path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut dir = fs::read_dir(dir_path).await?;

    while let Some(entry) = dir.next_entry().await? {
        let file_path = entry.path();
        if entry.file_type().await?.is_file() && is_rdb_file(&file_path) {
            files.push(file_path);
        }
    }

    Ok(files)
}

/// Check if a path has one of the recognised RDB extensions
fn is_rdb_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| RDB_FILE_EXTENSIONS.contains(&ext))
}
