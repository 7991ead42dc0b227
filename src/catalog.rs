//! Resource catalog.
//!
//! The ordered list of request targets pushed on every trigger. Built once at
//! start-up from a directory listing and shared read-only afterwards.

use pushcast_common::paths::{has_suffix, mount_path, mount_target};
use pushcast_common::{Error, Result};
use std::path::Path;
use walkdir::WalkDir;

/// Ordered, immutable list of pushable resource identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceCatalog {
    mount_path: String,
    identifiers: Vec<String>,
}

impl ResourceCatalog {
    /// Scan `directory` and collect `/<mount>/<file name>` for every regular
    /// file whose name ends with `suffix`.
    ///
    /// Entries are ordered by file name. Symlinks are classified by their
    /// target, so a link to a segment file is listed and a link to a directory
    /// is not. Subdirectories are not descended into. A directory with no
    /// matching files yields an empty catalog; a
    /// missing or unreadable directory is an error.
    pub fn build(directory: &Path, mount: &str, suffix: &str) -> Result<Self> {
        // The root is not yielded with min_depth(1); a missing directory would
        // otherwise surface as an empty catalog.
        std::fs::read_dir(directory).map_err(|e| Error::catalog_build(directory, e))?;

        let mut identifiers = Vec::new();
        let walker = WalkDir::new(directory)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory loop"));
                Error::catalog_build(directory, source)
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str() else {
                tracing::warn!("Skipping non UTF-8 file name: {:?}", entry.path());
                continue;
            };

            if has_suffix(name, suffix) {
                identifiers.push(mount_target(mount, name));
            }
        }

        tracing::debug!(
            "Catalog built from {:?}: {} resources",
            directory,
            identifiers.len()
        );

        Ok(Self {
            mount_path: mount_path(mount),
            identifiers,
        })
    }

    /// Build a catalog from already known identifiers.
    pub fn from_identifiers<I, S>(mount: &str, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mount_path: mount_path(mount),
            identifiers: identifiers.into_iter().map(Into::into).collect(),
        }
    }

    /// Route prefix the resources are served under, e.g. `/public`.
    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.identifiers.iter().map(String::as_str)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.identifiers.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}
