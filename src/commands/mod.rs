// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Command implementations for cdnext.

pub mod modules;
pub mod plan;
pub mod resolve;

use cdnext_core::{Coordinator, NodeModulesMetadata, PluginOptions, Result};
use std::path::Path;
use tracing::debug;

use crate::cli::Cli;

/// Common context for command execution.
pub struct CommandContext {
    pub options: PluginOptions,
}

impl CommandContext {
    /// Load options from config files and the environment, then apply CLI
    /// overrides.
    pub async fn new(cli: &Cli) -> Result<Self> {
        let mut options = match &cli.config {
            Some(path) => {
                let content = tokio::fs::read_to_string(path).await?;
                let mut options = PluginOptions::default();
                options.merge_from_str(&content, path.parent().unwrap_or(Path::new(".")))?;
                options.apply_env(std::env::vars())?;
                options
            }
            None => PluginOptions::load(&cli.project)?,
        };

        // Override config with CLI options
        options.tables.extend(cli.tables.iter().cloned());
        if let Some(ref env) = cli.env {
            options.env = Some(env.parse()?);
        }
        if cli.verbose {
            options.verbose = true;
        }
        options.validate()?;

        debug!("Options: {:?}", options);
        Ok(Self { options })
    }

    /// Create a coordinator for one build in `mode`.
    pub fn coordinator(&self, mode: &str) -> Result<Coordinator> {
        Coordinator::builder(self.options.clone())
            .build_mode(mode)
            .metadata(NodeModulesMetadata::new())
            .build()
    }
}
