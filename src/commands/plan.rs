// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Plan command implementation.
//!
//! Feeds each request through the coordinator the way a bundler would, then
//! prints the decisions and the resulting document tags.

use cdnext_core::{AssetTags, Decision, FactorizeOutcome, ModuleRequest, Result};
use owo_colors::OwoColorize;
use serde_json::json;
use tracing::info;

use crate::cli::{Cli, PlanArgs};
use crate::commands::CommandContext;

/// Run the plan command.
pub async fn run(args: &PlanArgs, cli: &Cli) -> Result<()> {
    let ctx = CommandContext::new(cli).await?;
    let mut coordinator = ctx.coordinator(&args.mode)?;
    let context = args.context.clone().unwrap_or_else(|| cli.project.clone());

    let decisions: Vec<Decision> = args
        .requests
        .iter()
        .map(|request| coordinator.decide(&ModuleRequest::new(&context, request)))
        .collect();
    let tags = coordinator.alter_asset_tags(AssetTags::default());

    if let Some(ref template) = args.template {
        let html = tokio::fs::read_to_string(template).await?;
        let document = tags.inject_into(&html);
        match args.out {
            Some(ref out) => {
                tokio::fs::write(out, document).await?;
                info!("Wrote {}", out.display());
            }
            None => println!("{}", document),
        }
        return Ok(());
    }

    if args.json {
        let decisions: Vec<_> = decisions.iter().map(decision_json).collect();
        let report = json!({
            "environment": coordinator.environment(),
            "decisions": decisions,
            "tags": tags,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("Planning {} request(s) ({})", decisions.len(), coordinator.environment())
            .yellow()
    );
    for decision in &decisions {
        print_decision(decision);
    }

    if coordinator.registry().len() > args.requests.len() {
        println!(
            "{}",
            format!(
                "{} module(s) substituted including peers",
                coordinator.registry().len()
            )
            .dimmed()
        );
    }

    if !tags.is_empty() {
        println!();
        println!("{}", tags.to_html());
    }

    Ok(())
}

fn print_decision(decision: &Decision) {
    match (&decision.outcome, &decision.substitution) {
        (FactorizeOutcome::External(reference), Ok(descriptor)) => println!(
            "  {} {} -> {} {}",
            "✓".green(),
            decision.request.cyan(),
            reference.identifier.bold(),
            descriptor.url.dimmed()
        ),
        (FactorizeOutcome::Default, Ok(descriptor)) => println!(
            "  {} {} {} {}",
            "✓".green(),
            decision.request.cyan(),
            format!("({})", descriptor.kind).dimmed(),
            descriptor.url.dimmed()
        ),
        (_, Err(rejection)) => println!(
            "  {} {} {} {}",
            "✗".red(),
            decision.request.cyan(),
            format!("[{}]", rejection.code()).yellow(),
            rejection.dimmed()
        ),
    }
}

fn decision_json(decision: &Decision) -> serde_json::Value {
    match &decision.substitution {
        Ok(descriptor) => json!({
            "request": decision.request,
            "external": decision.outcome.is_external(),
            "substitution": descriptor,
        }),
        Err(rejection) => json!({
            "request": decision.request,
            "external": false,
            "rejected": rejection.code(),
            "reason": rejection.to_string(),
        }),
    }
}
