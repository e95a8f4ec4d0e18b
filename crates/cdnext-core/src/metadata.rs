// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Installed package metadata.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CdnError, Result};

/// What the coordinator needs to know about an installed package.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageMetadata {
    /// Installed version
    pub version: String,
    /// Declared peer dependencies (name -> range)
    pub peer_dependencies: BTreeMap<String, String>,
}

impl PackageMetadata {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            peer_dependencies: BTreeMap::new(),
        }
    }

    pub fn with_peer(mut self, name: impl Into<String>, range: impl Into<String>) -> Self {
        self.peer_dependencies.insert(name.into(), range.into());
        self
    }
}

/// Source of installed package metadata.
pub trait MetadataSource {
    /// Look up `package` as seen from `context`.
    fn lookup(&self, package: &str, context: &Path) -> Result<PackageMetadata>;
}

impl<T: MetadataSource + ?Sized> MetadataSource for &T {
    fn lookup(&self, package: &str, context: &Path) -> Result<PackageMetadata> {
        (**self).lookup(package, context)
    }
}

impl<T: MetadataSource + ?Sized> MetadataSource for Box<T> {
    fn lookup(&self, package: &str, context: &Path) -> Result<PackageMetadata> {
        (**self).lookup(package, context)
    }
}

/// The subset of package.json read here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    version: Option<String>,
    #[serde(default)]
    peer_dependencies: Option<BTreeMap<String, String>>,
}

/// Reads `node_modules/<package>/package.json`, walking up from the context
/// directory the way Node's module resolution does.
#[derive(Debug, Clone, Default)]
pub struct NodeModulesMetadata;

impl NodeModulesMetadata {
    pub fn new() -> Self {
        Self
    }

    /// Locate the package.json for `package` starting at `context`.
    pub fn find_package_json(&self, package: &str, context: &Path) -> Option<PathBuf> {
        let mut current = Some(context);
        while let Some(dir) = current {
            let candidate = dir.join("node_modules").join(package).join("package.json");
            if candidate.is_file() {
                return Some(candidate);
            }
            current = dir.parent();
        }
        None
    }

    fn read(&self, path: &Path) -> Result<PackageMetadata> {
        let content = std::fs::read_to_string(path)?;
        let parsed: PackageJson =
            serde_json::from_str(&content).map_err(|e| CdnError::InvalidPackageJson {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let version = parsed.version.ok_or_else(|| CdnError::InvalidPackageJson {
            path: path.to_path_buf(),
            reason: "missing 'version'".into(),
        })?;

        Ok(PackageMetadata {
            version,
            peer_dependencies: parsed.peer_dependencies.unwrap_or_default(),
        })
    }
}

impl MetadataSource for NodeModulesMetadata {
    fn lookup(&self, package: &str, context: &Path) -> Result<PackageMetadata> {
        let path = self
            .find_package_json(package, context)
            .ok_or_else(|| CdnError::PackageNotFound {
                name: package.to_string(),
                context: context.to_path_buf(),
            })?;
        debug!("Reading {} metadata from {}", package, path.display());
        self.read(&path)
    }
}

/// In-memory metadata, independent of the context path.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    packages: HashMap<String, PackageMetadata>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(mut self, name: impl Into<String>, metadata: PackageMetadata) -> Self {
        self.insert(name, metadata);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, metadata: PackageMetadata) {
        self.packages.insert(name.into(), metadata);
    }
}

impl MetadataSource for StaticMetadata {
    fn lookup(&self, package: &str, context: &Path) -> Result<PackageMetadata> {
        self.packages
            .get(package)
            .cloned()
            .ok_or_else(|| CdnError::PackageNotFound {
                name: package.to_string(),
                context: context.to_path_buf(),
            })
    }
}
