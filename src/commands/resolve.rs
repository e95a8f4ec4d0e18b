// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resolve command implementation.

use cdnext_core::{CdnResolver, Result};
use owo_colors::OwoColorize;

use crate::cli::{Cli, ResolveArgs};
use crate::commands::CommandContext;

/// Run the resolve command.
pub async fn run(args: &ResolveArgs, cli: &Cli) -> Result<()> {
    let ctx = CommandContext::new(cli).await?;
    let coordinator = ctx.coordinator("production")?;
    let env = coordinator.environment();

    let descriptor = coordinator
        .resolver()
        .resolve(&args.module, &args.version, env)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
        return Ok(());
    }

    match descriptor {
        Some(descriptor) => {
            println!(
                "{} {}",
                format!("{}@{}", descriptor.name, descriptor.version).cyan().bold(),
                format!("({})", env).dimmed()
            );
            println!("{}: {}", "global".dimmed(), descriptor.exported_identifier);
            println!("{}: {}", "type".dimmed(), descriptor.kind);
            println!("{}: {}", "url".dimmed(), descriptor.url.green());
        }
        None => {
            println!(
                "{} no CDN build for {} ({})",
                "✗".red(),
                format!("{}@{}", args.module, args.version).cyan(),
                env
            );
        }
    }

    Ok(())
}
