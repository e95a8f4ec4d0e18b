// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # cdnext-core
//!
//! Decide, per module request in a bundler build, whether the module can be
//! served from a CDN instead of being bundled, and produce the script and
//! stylesheet tags that load the substituted modules.
//!
//! - [`policy`]: resolvers mapping `(module, version, environment)` to a CDN URL
//! - [`coordinator`]: per-build state, peer-dependency closure, host hooks
//! - [`markup`]: document tags generated from the registry
//! - [`metadata`]: installed package metadata (`node_modules` or in-memory)
//! - [`config`]: layered options and the inclusion policy
//!
//! ## Example
//!
//! ```no_run
//! use cdnext_core::{Coordinator, FactorizeOutcome, PluginOptions};
//! use std::path::Path;
//!
//! let mut coordinator = Coordinator::builder(PluginOptions::default())
//!     .build_mode("production")
//!     .build()?;
//!
//! match coordinator.handle_module_request(Path::new("/app/src"), "react") {
//!     FactorizeOutcome::External(reference) => println!("react -> {}", reference.identifier),
//!     FactorizeOutcome::Default => println!("react is bundled"),
//! }
//!
//! let tags = coordinator.alter_asset_tags(Default::default());
//! println!("{}", tags.to_html());
//! # Ok::<(), cdnext_core::CdnError>(())
//! ```

pub mod builtin;
pub mod config;
pub mod coordinator;
pub mod environment;
pub mod error;
pub mod markup;
pub mod metadata;
pub mod policy;
pub mod range;
pub mod registry;
pub mod request;

pub use builtin::builtin_table;
pub use config::{InclusionPolicy, PluginOptions};
pub use coordinator::{
    Coordinator, CoordinatorBuilder, Decision, ExternalReference, FactorizeOutcome,
};
pub use environment::Environment;
pub use error::{CdnError, Rejection, Result};
pub use markup::{emit_markup, AssetTags, HtmlTag};
pub use metadata::{MetadataSource, NodeModulesMetadata, PackageMetadata, StaticMetadata};
pub use policy::{
    CdnResolver, FnResolver, ModuleEntry, ModuleKind, ModuleTable, ResolverChain,
    SubstitutionDescriptor, VersionUrls,
};
pub use registry::SubstitutionRegistry;
pub use request::ModuleRequest;
