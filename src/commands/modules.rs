// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Modules command implementation.

use cdnext_core::{CdnResolver, Result};
use owo_colors::OwoColorize;

use crate::cli::Cli;
use crate::commands::CommandContext;

/// Run the modules command.
pub async fn run(cli: &Cli) -> Result<()> {
    let ctx = CommandContext::new(cli).await?;
    let coordinator = ctx.coordinator("production")?;
    let modules = coordinator.resolver().known_modules();

    println!("{}", format!("{} known modules", modules.len()).yellow());
    for name in modules {
        println!("  {}", name);
    }

    Ok(())
}
