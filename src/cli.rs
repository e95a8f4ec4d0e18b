// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CLI argument parsing for cdnext.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// cdnext - serve npm modules from a CDN instead of bundling them
#[derive(Parser, Debug)]
#[command(name = "cdnext")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log accepted substitutions and rejection reasons
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory (where cdnext.toml and node_modules live)
    #[arg(short = 'C', long, global = true, default_value = ".")]
    pub project: PathBuf,

    /// Config file to use instead of the user and project config
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Extra module table (.toml or .json), consulted after the built-in one
    #[arg(long = "table", global = true, value_name = "FILE")]
    pub tables: Vec<PathBuf>,

    /// Environment override (development or production)
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Look up the CDN build for one module version
    Resolve(ResolveArgs),

    /// Decide a list of module requests and print the generated tags
    #[command(alias = "p")]
    Plan(PlanArgs),

    /// List modules known to the resolver chain
    #[command(alias = "ls")]
    Modules,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Module name or request path (e.g. antd/dist/antd.variable.css)
    pub module: String,

    /// Installed version
    pub version: String,

    /// Print the descriptor as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Module requests, as written in imports
    #[arg(value_name = "REQUEST", required = true)]
    pub requests: Vec<String>,

    /// Directory the requests are issued from (defaults to the project)
    #[arg(long)]
    pub context: Option<PathBuf>,

    /// Bundler mode used to pick the environment
    #[arg(short, long, default_value = "production")]
    pub mode: String,

    /// Print decisions and tags as JSON
    #[arg(long)]
    pub json: bool,

    /// HTML document to inject the tags into
    #[arg(long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Where to write the injected document (stdout when omitted)
    #[arg(short, long, value_name = "FILE", requires = "template")]
    pub out: Option<PathBuf>,
}
