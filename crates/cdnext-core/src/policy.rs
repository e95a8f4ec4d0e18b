// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resolution policy: which modules have a CDN build, and where.
//!
//! A [`CdnResolver`] maps `(module, version, environment)` to a
//! [`SubstitutionDescriptor`] or nothing. [`ModuleTable`] is the table-driven
//! implementation; [`ResolverChain`] tries several resolvers in order and
//! takes the first hit, which is how projects extend the built-in table
//! without editing it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::environment::Environment;
use crate::error::{CdnError, Result};
use crate::range;

/// Placeholder replaced by the requested version in table URLs.
pub const VERSION_PLACEHOLDER: &str = "[version]";

/// What kind of asset a CDN build is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModuleKind {
    /// Script exposing a global variable
    #[default]
    Js,
    /// Stylesheet
    Css,
}

impl ModuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Js => "js",
            ModuleKind::Css => "css",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleKind {
    type Err = CdnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "js" | "javascript" => Ok(ModuleKind::Js),
            "css" | "stylesheet" => Ok(ModuleKind::Css),
            other => Err(CdnError::InvalidTable(format!("unknown module type '{}'", other))),
        }
    }
}

impl TryFrom<String> for ModuleKind {
    type Error = CdnError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ModuleKind> for String {
    fn from(kind: ModuleKind) -> Self {
        kind.as_str().to_string()
    }
}

/// The decision to serve one module from a CDN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionDescriptor {
    /// Module name as looked up in the resolver (full request path)
    pub name: String,
    /// Global variable the CDN build assigns
    pub exported_identifier: String,
    /// Environment-specific URL, never empty
    pub url: String,
    /// Installed version the URL was built for
    pub version: String,
    /// Script or stylesheet
    pub kind: ModuleKind,
}

/// A strategy that may know a CDN build for a module.
pub trait CdnResolver: Send + Sync {
    /// Resolve a module at a version for an environment.
    ///
    /// `Ok(None)` means "not known here"; errors are reserved for contract
    /// violations such as empty arguments.
    fn resolve(
        &self,
        module: &str,
        version: &str,
        env: Environment,
    ) -> Result<Option<SubstitutionDescriptor>>;

    /// Label used in logs.
    fn label(&self) -> &str {
        "custom"
    }

    /// Module names this resolver can answer for, if it can enumerate them.
    fn known_modules(&self) -> Vec<String> {
        Vec::new()
    }
}

fn check_arguments(module: &str, version: &str) -> Result<()> {
    if module.trim().is_empty() {
        return Err(CdnError::InvalidArgument(
            "expected 'module' to be a non-empty string".into(),
        ));
    }
    if version.trim().is_empty() {
        return Err(CdnError::InvalidArgument(
            "expected 'version' to be a non-empty string".into(),
        ));
    }
    Ok(())
}

/// URLs for one version range of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionUrls {
    /// npm range, e.g. `*` or `>=16.8.0`
    pub range: String,
    /// Development build URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub development: Option<String>,
    /// Production build URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production: Option<String>,
}

impl VersionUrls {
    pub fn new(range: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            development: None,
            production: None,
        }
    }

    pub fn development(mut self, url: impl Into<String>) -> Self {
        self.development = Some(url.into());
        self
    }

    pub fn production(mut self, url: impl Into<String>) -> Self {
        self.production = Some(url.into());
        self
    }

    /// URL template for an environment; empty templates count as absent.
    pub fn url_for(&self, env: Environment) -> Option<&str> {
        let url = match env {
            Environment::Development => self.development.as_deref(),
            Environment::Production => self.production.as_deref(),
        };
        url.filter(|u| !u.trim().is_empty())
    }
}

/// One module known to a [`ModuleTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    /// Request path this entry answers for (`antd`, `antd/dist/antd.css`)
    pub name: String,
    /// Global variable name exposed by the build
    pub var: String,
    /// Asset kind, scripts when omitted
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ModuleKind>,
    /// Version ranges, tried in declaration order
    #[serde(default)]
    pub versions: Vec<VersionUrls>,
}

impl ModuleEntry {
    pub fn new(name: impl Into<String>, var: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            var: var.into(),
            kind: None,
            versions: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: ModuleKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn range(mut self, urls: VersionUrls) -> Self {
        self.versions.push(urls);
        self
    }

    /// First declared range the version satisfies.
    pub fn matching_range(&self, version: &str) -> Option<&VersionUrls> {
        self.versions
            .iter()
            .find(|urls| range::satisfies(version, &urls.range))
    }
}

/// Table-driven resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTable {
    #[serde(skip)]
    label: Option<String>,
    /// Known modules
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
}

impl ModuleTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label shown in logs.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add a module; a later entry with the same name replaces the earlier one.
    pub fn with_module(mut self, entry: ModuleEntry) -> Self {
        self.insert(entry);
        self
    }

    /// Insert or replace a module.
    pub fn insert(&mut self, entry: ModuleEntry) {
        match self.modules.iter_mut().find(|m| m.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.modules.push(entry),
        }
    }

    /// Look up a module entry by name.
    pub fn get(&self, name: &str) -> Option<&ModuleEntry> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Parse a table from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: ModuleTable = toml::from_str(content)?;
        table.validate()?;
        Ok(table)
    }

    /// Parse a table from JSON.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let table: ModuleTable = serde_json::from_str(content)?;
        table.validate()?;
        Ok(table)
    }

    /// Parse a table, choosing the format from the file extension.
    pub fn parse_for_path(path: &Path, content: &str) -> Result<Self> {
        let table = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(content)?,
            Some("toml") => Self::from_toml_str(content)?,
            _ => {
                return Err(CdnError::InvalidTable(format!(
                    "{}: expected a .toml or .json file",
                    path.display()
                )));
            }
        };
        Ok(table.labeled(path.display().to_string()))
    }

    /// Read and parse a table file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse_for_path(path.as_ref(), &content)
    }

    /// Check that every entry is usable.
    pub fn validate(&self) -> Result<()> {
        for entry in &self.modules {
            if entry.name.trim().is_empty() {
                return Err(CdnError::InvalidTable("module with an empty name".into()));
            }
            if entry.var.trim().is_empty() {
                return Err(CdnError::InvalidTable(format!(
                    "module '{}' has an empty 'var'",
                    entry.name
                )));
            }
            if entry.versions.is_empty() {
                return Err(CdnError::InvalidTable(format!(
                    "module '{}' declares no versions",
                    entry.name
                )));
            }
            for urls in &entry.versions {
                range::parse_range(&urls.range).map_err(|e| {
                    CdnError::InvalidTable(format!(
                        "module '{}' has invalid range '{}': {}",
                        entry.name, urls.range, e
                    ))
                })?;
            }
        }
        Ok(())
    }
}

impl CdnResolver for ModuleTable {
    fn resolve(
        &self,
        module: &str,
        version: &str,
        env: Environment,
    ) -> Result<Option<SubstitutionDescriptor>> {
        check_arguments(module, version)?;

        let Some(entry) = self.get(module) else {
            return Ok(None);
        };

        let Some(urls) = entry.matching_range(version) else {
            debug!("{}@{} matches no range in {}", module, version, self.label());
            return Ok(None);
        };

        let Some(template) = urls.url_for(env) else {
            debug!("{}@{} has no {} url in {}", module, version, env, self.label());
            return Ok(None);
        };

        Ok(Some(SubstitutionDescriptor {
            name: module.to_string(),
            exported_identifier: entry.var.clone(),
            url: template.replace(VERSION_PLACEHOLDER, version),
            version: version.to_string(),
            kind: entry.kind.unwrap_or_default(),
        }))
    }

    fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("module table")
    }

    fn known_modules(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.name.clone()).collect()
    }
}

/// Adapter for plain functions and closures.
pub struct FnResolver<F> {
    label: String,
    f: F,
}

impl<F> FnResolver<F>
where
    F: Fn(&str, &str, Environment) -> Option<SubstitutionDescriptor> + Send + Sync,
{
    pub fn new(label: impl Into<String>, f: F) -> Self {
        Self {
            label: label.into(),
            f,
        }
    }
}

impl<F> CdnResolver for FnResolver<F>
where
    F: Fn(&str, &str, Environment) -> Option<SubstitutionDescriptor> + Send + Sync,
{
    fn resolve(
        &self,
        module: &str,
        version: &str,
        env: Environment,
    ) -> Result<Option<SubstitutionDescriptor>> {
        check_arguments(module, version)?;
        Ok((self.f)(module, version, env).filter(|d| !d.url.trim().is_empty()))
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Ordered list of resolvers; the first hit wins.
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn CdnResolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resolver at the end of the chain.
    pub fn push(&mut self, resolver: Box<dyn CdnResolver>) {
        self.resolvers.push(resolver);
    }

    pub fn with(mut self, resolver: impl CdnResolver + 'static) -> Self {
        self.push(Box::new(resolver));
        self
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl CdnResolver for ResolverChain {
    fn resolve(
        &self,
        module: &str,
        version: &str,
        env: Environment,
    ) -> Result<Option<SubstitutionDescriptor>> {
        for resolver in &self.resolvers {
            if let Some(descriptor) = resolver.resolve(module, version, env)? {
                debug!("{} resolved by {}", module, resolver.label());
                return Ok(Some(descriptor));
            }
        }
        Ok(None)
    }

    fn label(&self) -> &str {
        "resolver chain"
    }

    fn known_modules(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for resolver in &self.resolvers {
            for name in resolver.known_modules() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.resolvers.iter().map(|r| r.label()))
            .finish()
    }
}
