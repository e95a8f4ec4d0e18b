// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Configuration for cdnext.
//!
//! Options are layered: defaults, then the user config file, then the
//! project's `cdnext.toml`, then `CDNEXT_*` environment variables. The result
//! is validated once and is immutable for the build.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::environment::Environment;
use crate::error::{CdnError, Result, Rejection};

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "cdnext.toml";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "CDNEXT_";

/// Keys accepted by [`PluginOptions::set`].
pub const OPTION_KEYS: &[&str] = &[
    "disable",
    "env",
    "exclude",
    "only",
    "verbose",
    "check-peer-ranges",
    "tables",
];

/// Construction-time options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PluginOptions {
    /// Turn substitution off entirely
    pub disable: bool,

    /// Fixed environment; derived from the build mode when absent
    pub env: Option<Environment>,

    /// Modules never substituted
    pub exclude: Vec<String>,

    /// If set and non-empty, the only modules that may be substituted
    pub only: Option<Vec<String>>,

    /// Log accepted substitutions
    pub verbose: bool,

    /// Require resolved peers to satisfy the declared peer ranges
    pub check_peer_ranges: bool,

    /// Extra resolver tables, consulted after the built-in one
    pub tables: Vec<PathBuf>,
}

/// A config file layer; absent keys leave the lower layer untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
struct OptionsLayer {
    disable: Option<bool>,
    env: Option<Environment>,
    exclude: Option<Vec<String>>,
    only: Option<Vec<String>>,
    verbose: Option<bool>,
    check_peer_ranges: Option<bool>,
    tables: Option<Vec<PathBuf>>,
}

impl PluginOptions {
    /// Load options for a project directory from all layers.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let mut options = PluginOptions::default();

        if let Some(user_config) = user_config_path() {
            if user_config.is_file() {
                options.merge_from_file(&user_config)?;
            }
        }

        let project_config = project_dir.join(PROJECT_CONFIG_FILE);
        if project_config.is_file() {
            options.merge_from_file(&project_config)?;
        }

        options.load_from_env()?;
        options.validate()?;

        Ok(options)
    }

    /// Merge a TOML config file over the current values.
    ///
    /// Relative table paths are taken relative to the file's directory.
    pub fn merge_from_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let base = path.parent().unwrap_or(Path::new("."));
        self.merge_from_str(&content, base)
    }

    /// Merge TOML config text over the current values.
    pub fn merge_from_str(&mut self, content: &str, base: &Path) -> Result<()> {
        let layer: OptionsLayer = toml::from_str(content)?;

        if let Some(disable) = layer.disable {
            self.disable = disable;
        }
        if let Some(env) = layer.env {
            self.env = Some(env);
        }
        if let Some(exclude) = layer.exclude {
            self.exclude = exclude;
        }
        if let Some(only) = layer.only {
            // `only = []` clears a lower layer's list
            self.only = Some(only).filter(|names| !names.is_empty());
        }
        if let Some(verbose) = layer.verbose {
            self.verbose = verbose;
        }
        if let Some(check) = layer.check_peer_ranges {
            self.check_peer_ranges = check;
        }
        if let Some(tables) = layer.tables {
            self.tables = tables
                .into_iter()
                .map(|t| if t.is_relative() { base.join(t) } else { t })
                .collect();
        }

        Ok(())
    }

    /// Apply `CDNEXT_*` variables from the process environment.
    fn load_from_env(&mut self) -> Result<()> {
        self.apply_env(std::env::vars())
    }

    /// Apply `CDNEXT_*` variables from an iterator of key/value pairs.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                let config_key = config_key.to_lowercase().replace('_', "-");
                if !OPTION_KEYS.contains(&config_key.as_str()) {
                    debug!("Ignoring {}: not a cdnext option", key);
                    continue;
                }
                self.set(&config_key, &value)?;
            }
        }
        Ok(())
    }

    /// Set an option from its string form. Lists are comma-separated.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "disable" => self.disable = parse_bool(key, value)?,
            "env" => self.env = Some(value.parse()?),
            "exclude" => self.exclude = parse_list(value),
            "only" => self.only = Some(parse_list(value)).filter(|names| !names.is_empty()),
            "verbose" => self.verbose = parse_bool(key, value)?,
            "check-peer-ranges" => self.check_peer_ranges = parse_bool(key, value)?,
            "tables" => {
                self.tables = parse_list(value).into_iter().map(PathBuf::from).collect();
            }
            _ => return Err(CdnError::Config(format!("unknown option '{}'", key))),
        }
        Ok(())
    }

    /// The `only` list, treating an empty list as unset.
    pub fn only_list(&self) -> Option<&[String]> {
        self.only.as_deref().filter(|names| !names.is_empty())
    }

    /// Reject contradictory options.
    pub fn validate(&self) -> Result<()> {
        if !self.exclude.is_empty() && self.only_list().is_some() {
            return Err(CdnError::Config(
                "'exclude' and 'only' cannot be used at the same time".into(),
            ));
        }
        Ok(())
    }

    /// Environment for a build running in `build_mode`.
    pub fn environment(&self, build_mode: &str) -> Environment {
        self.env
            .unwrap_or_else(|| Environment::from_build_mode(build_mode))
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(CdnError::Config(format!(
            "'{}' expects a boolean, got '{}'",
            key, other
        ))),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Get the user config path.
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cdnext").join("config.toml"))
}

/// Which modules may be substituted.
#[derive(Debug, Clone, Default)]
pub struct InclusionPolicy {
    exclude: HashSet<String>,
    only: Option<HashSet<String>>,
}

impl InclusionPolicy {
    /// Build the policy; `exclude` and a non-empty `only` are mutually
    /// exclusive.
    pub fn new(exclude: &[String], only: Option<&[String]>) -> Result<Self> {
        let only = only.filter(|names| !names.is_empty());
        if !exclude.is_empty() && only.is_some() {
            return Err(CdnError::Config(
                "'exclude' and 'only' cannot be used at the same time".into(),
            ));
        }
        Ok(Self {
            exclude: exclude.iter().cloned().collect(),
            only: only.map(|names| names.iter().cloned().collect()),
        })
    }

    pub fn from_options(options: &PluginOptions) -> Result<Self> {
        Self::new(&options.exclude, options.only_list())
    }

    /// Check a request; either its package name or its full path may be
    /// listed.
    pub fn check(&self, package: &str, request: &str) -> std::result::Result<(), Rejection> {
        if self.exclude.contains(package) || self.exclude.contains(request) {
            return Err(Rejection::Excluded(request.to_string()));
        }
        if let Some(only) = &self.only {
            if !only.contains(package) && !only.contains(request) {
                return Err(Rejection::NotInOnlyList(request.to_string()));
            }
        }
        Ok(())
    }
}
