// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Substitution coordinator.
//!
//! Sits between the host's module factory and document generator for one
//! build run. Each bare package request is checked against the inclusion
//! policy, looked up in installed metadata, resolved through the resolver
//! chain and, if its whole peer-dependency closure can also be served from the
//! CDN, recorded in the registry. The registry is later projected into script
//! and stylesheet tags.

use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::builtin::builtin_table;
use crate::config::{InclusionPolicy, PluginOptions};
use crate::environment::Environment;
use crate::error::{Rejection, Result};
use crate::markup::{emit_markup, AssetTags};
use crate::metadata::{MetadataSource, NodeModulesMetadata, PackageMetadata};
use crate::policy::{CdnResolver, ModuleKind, ModuleTable, ResolverChain, SubstitutionDescriptor};
use crate::range;
use crate::registry::SubstitutionRegistry;
use crate::request::{self, ModuleRequest};

/// Reference the host should build instead of bundling the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalReference {
    /// Global variable holding the module at runtime
    pub identifier: String,
    /// Original request
    pub request: String,
}

/// Answer to the host's module factory hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactorizeOutcome {
    /// Proceed with normal resolution
    Default,
    /// Replace the module with a global variable reference
    External(ExternalReference),
}

impl FactorizeOutcome {
    pub fn is_external(&self) -> bool {
        matches!(self, FactorizeOutcome::External(_))
    }
}

/// Outcome of one request together with why it came out that way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub request: String,
    pub outcome: FactorizeOutcome,
    pub substitution: std::result::Result<SubstitutionDescriptor, Rejection>,
}

/// Builder for [`Coordinator`].
pub struct CoordinatorBuilder {
    options: PluginOptions,
    build_mode: String,
    metadata: Option<Box<dyn MetadataSource>>,
    resolvers: Vec<Box<dyn CdnResolver>>,
    builtin: bool,
}

impl CoordinatorBuilder {
    pub fn new(options: PluginOptions) -> Self {
        Self {
            options,
            build_mode: "production".to_string(),
            metadata: None,
            resolvers: Vec::new(),
            builtin: true,
        }
    }

    /// Bundler mode used to pick the environment when `env` is not set.
    pub fn build_mode(mut self, mode: impl Into<String>) -> Self {
        self.build_mode = mode.into();
        self
    }

    /// Metadata source; `node_modules` lookup when not set.
    pub fn metadata(mut self, source: impl MetadataSource + 'static) -> Self {
        self.metadata = Some(Box::new(source));
        self
    }

    /// Append a resolver after the built-in table and configured tables.
    pub fn resolver(mut self, resolver: impl CdnResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Leave the built-in table out of the chain.
    pub fn without_builtin(mut self) -> Self {
        self.builtin = false;
        self
    }

    /// Validate options, load configured tables and assemble the chain.
    pub fn build(self) -> Result<Coordinator> {
        self.options.validate()?;
        let inclusion = InclusionPolicy::from_options(&self.options)?;
        let env = self.options.environment(&self.build_mode);

        let mut chain = ResolverChain::new();
        if self.builtin {
            chain.push(Box::new(builtin_table()));
        }
        for path in &self.options.tables {
            let table = ModuleTable::load(path)?;
            debug!("Loaded {} modules from {}", table.len(), path.display());
            chain.push(Box::new(table));
        }
        for resolver in self.resolvers {
            chain.push(resolver);
        }

        Ok(Coordinator {
            disabled: self.options.disable,
            env,
            verbose: self.options.verbose,
            check_peer_ranges: self.options.check_peer_ranges,
            inclusion,
            resolver: chain,
            metadata: self
                .metadata
                .unwrap_or_else(|| Box::new(NodeModulesMetadata::new())),
            registry: SubstitutionRegistry::new(),
        })
    }
}

/// Per-build substitution state.
pub struct Coordinator {
    disabled: bool,
    env: Environment,
    verbose: bool,
    check_peer_ranges: bool,
    inclusion: InclusionPolicy,
    resolver: ResolverChain,
    metadata: Box<dyn MetadataSource>,
    registry: SubstitutionRegistry,
}

impl Coordinator {
    pub fn builder(options: PluginOptions) -> CoordinatorBuilder {
        CoordinatorBuilder::new(options)
    }

    pub fn environment(&self) -> Environment {
        self.env
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn resolver(&self) -> &ResolverChain {
        &self.resolver
    }

    pub fn registry(&self) -> &SubstitutionRegistry {
        &self.registry
    }

    /// Module factory hook: decide how the host should treat a request.
    pub fn handle_module_request(&mut self, context: &Path, request: &str) -> FactorizeOutcome {
        self.decide(&ModuleRequest::new(context, request)).outcome
    }

    /// Like [`handle_module_request`](Self::handle_module_request), keeping
    /// the descriptor or rejection reason.
    pub fn decide(&mut self, module: &ModuleRequest) -> Decision {
        let substitution = if self.disabled {
            Err(Rejection::Disabled)
        } else if !request::is_package_request(&module.request) {
            Err(Rejection::NotAPackageRequest(module.request.clone()))
        } else {
            self.add_module(module.context(), &module.request)
        };

        let outcome = match &substitution {
            Ok(descriptor) if descriptor.kind == ModuleKind::Js => {
                FactorizeOutcome::External(ExternalReference {
                    identifier: descriptor.exported_identifier.clone(),
                    request: module.request.clone(),
                })
            }
            // Stylesheets stay in the bundle graph; they only contribute tags
            _ => FactorizeOutcome::Default,
        };

        Decision {
            request: module.request.clone(),
            outcome,
            substitution,
        }
    }

    /// Try to substitute `module_path` and its peer-dependency closure.
    ///
    /// Never fails the build: every failure is a [`Rejection`]. On rejection
    /// nothing recorded during this call is kept.
    pub fn add_module(
        &mut self,
        context: &Path,
        module_path: &str,
    ) -> std::result::Result<SubstitutionDescriptor, Rejection> {
        if self.disabled {
            return Err(Rejection::Disabled);
        }

        let mark = self.registry.len();
        let mut resolving = HashSet::new();
        let result = self.resolve_closure(context, module_path, &mut resolving);

        match &result {
            Ok(_) => {
                if self.verbose {
                    for accepted in self.registry.iter().skip(mark) {
                        info!("'{}' will be served by {}", accepted.name, accepted.url);
                    }
                }
            }
            Err(rejection) => {
                self.registry.truncate(mark);
                debug!(
                    "'{}' left to the bundler [{}]: {}",
                    module_path,
                    rejection.code(),
                    rejection
                );
            }
        }

        result
    }

    fn resolve_closure(
        &mut self,
        context: &Path,
        module_path: &str,
        resolving: &mut HashSet<String>,
    ) -> std::result::Result<SubstitutionDescriptor, Rejection> {
        let package = request::package_name(module_path)
            .ok_or_else(|| Rejection::NotAPackageRequest(module_path.to_string()))?;

        self.inclusion.check(package, module_path)?;

        let metadata = self.metadata.lookup(package, context).map_err(|e| {
            Rejection::MetadataUnavailable {
                name: package.to_string(),
                reason: e.to_string(),
            }
        })?;

        if let Some(existing) = self.registry.get(module_path) {
            return reuse_registered(module_path, existing, &metadata.version);
        }

        let descriptor = match self.resolver.resolve(module_path, &metadata.version, self.env) {
            Ok(Some(descriptor)) => descriptor,
            Ok(None) => {
                return Err(Rejection::NoCdnMatch {
                    name: module_path.to_string(),
                    version: metadata.version,
                });
            }
            Err(e) => {
                return Err(Rejection::ResolverFailed {
                    name: module_path.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        if !metadata.peer_dependencies.is_empty() {
            resolving.insert(module_path.to_string());
            let peers = self.resolve_peers(context, &metadata, resolving);
            resolving.remove(module_path);
            peers?;
        }

        if !self.registry.insert(module_path, descriptor.clone()) {
            if let Some(existing) = self.registry.get(module_path) {
                return reuse_registered(module_path, existing, &metadata.version);
            }
        }
        Ok(descriptor)
    }

    fn resolve_peers(
        &mut self,
        context: &Path,
        metadata: &PackageMetadata,
        resolving: &mut HashSet<String>,
    ) -> std::result::Result<(), Rejection> {
        for (peer, peer_range) in &metadata.peer_dependencies {
            if resolving.contains(peer) {
                return Err(Rejection::PeerCycle(peer.clone()));
            }

            let resolved = self
                .resolve_closure(context, peer, resolving)
                .map_err(|cause| Rejection::PeerRejected {
                    peer: peer.clone(),
                    cause: Box::new(cause),
                })?;

            if self.check_peer_ranges && !range::satisfies(&resolved.version, peer_range) {
                return Err(Rejection::PeerRangeMismatch {
                    peer: peer.clone(),
                    version: resolved.version,
                    range: peer_range.clone(),
                });
            }
        }
        Ok(())
    }

    /// Document tag hook: put the CDN tags in front of the host's tags.
    pub fn alter_asset_tags(&self, host: AssetTags) -> AssetTags {
        if self.disabled {
            return host;
        }
        self.markup().prepend_to(host)
    }

    /// Tags for everything substituted so far.
    pub fn markup(&self) -> AssetTags {
        emit_markup(&self.registry)
    }
}

/// Outcome for a key that is already registered: the cached descriptor when
/// the installed version matches, a conflict otherwise.
fn reuse_registered(
    key: &str,
    existing: &SubstitutionDescriptor,
    installed: &str,
) -> std::result::Result<SubstitutionDescriptor, Rejection> {
    if existing.version == installed {
        return Ok(existing.clone());
    }
    Err(Rejection::VersionConflict {
        name: key.to_string(),
        registered: existing.version.clone(),
        requested: installed.to_string(),
    })
}
