// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for cdnext.
//!
//! [`CdnError`] is for failures that are allowed to reach the caller
//! (configuration, I/O, malformed tables). Per-request outcomes that only
//! downgrade a module to normal bundling are [`Rejection`]s instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for cdnext operations.
pub type Result<T> = std::result::Result<T, CdnError>;

/// Main error type for cdnext.
#[derive(Error, Debug)]
pub enum CdnError {
    /// Invalid or contradictory options
    #[error("Configuration error: {0}")]
    Config(String),

    /// Argument that violates a contract (empty module name, empty version)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Package could not be located from the given context
    #[error("Cannot find package '{name}' from {}", context.display())]
    PackageNotFound { name: String, context: PathBuf },

    /// Invalid package.json
    #[error("Invalid package.json at {}: {reason}", path.display())]
    InvalidPackageJson { path: PathBuf, reason: String },

    /// Resolver table that cannot be used
    #[error("Invalid module table: {0}")]
    InvalidTable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Semver parsing error
    #[error("Invalid version: {0}")]
    Semver(#[from] semver::Error),
}

/// Why a module request was left to normal bundling.
///
/// Every branch of the substitution routine that gives up maps to exactly one
/// of these, so callers can tell "excluded by policy" apart from "metadata
/// missing" or "no CDN build".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The coordinator was constructed with `disable = true`
    #[error("substitution is disabled")]
    Disabled,

    /// Relative/absolute path or otherwise not a bare package specifier
    #[error("'{0}' is not a package request")]
    NotAPackageRequest(String),

    /// Listed in `exclude`
    #[error("'{0}' is excluded")]
    Excluded(String),

    /// `only` is set and does not list the module
    #[error("'{0}' is not in the only-list")]
    NotInOnlyList(String),

    /// package.json could not be located or read
    #[error("metadata unavailable for '{name}': {reason}")]
    MetadataUnavailable { name: String, reason: String },

    /// Already substituted with a different version in this build
    #[error("'{name}' is already served at {registered}, refusing {requested}")]
    VersionConflict {
        name: String,
        registered: String,
        requested: String,
    },

    /// No resolver in the chain knows this module/version/environment
    #[error("no CDN build for '{name}@{version}'")]
    NoCdnMatch { name: String, version: String },

    /// A resolver returned an error
    #[error("resolver failed for '{name}': {reason}")]
    ResolverFailed { name: String, reason: String },

    /// A peer dependency could not be substituted
    #[error("peer dependency '{peer}' rejected: {cause}")]
    PeerRejected { peer: String, cause: Box<Rejection> },

    /// A peer dependency is already being resolved further up the chain
    #[error("peer dependency cycle through '{0}'")]
    PeerCycle(String),

    /// Peer resolved, but its version is outside the declared range
    #[error("peer dependency '{peer}@{version}' does not satisfy '{range}'")]
    PeerRangeMismatch {
        peer: String,
        version: String,
        range: String,
    },
}

impl Rejection {
    /// Short, stable reason code for logs and machine output.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::Disabled => "disabled",
            Rejection::NotAPackageRequest(_) => "not-a-package",
            Rejection::Excluded(_) => "excluded",
            Rejection::NotInOnlyList(_) => "not-in-only",
            Rejection::MetadataUnavailable { .. } => "metadata-missing",
            Rejection::VersionConflict { .. } => "version-conflict",
            Rejection::NoCdnMatch { .. } => "no-cdn-match",
            Rejection::ResolverFailed { .. } => "resolver-failed",
            Rejection::PeerRejected { .. } => "peer-rejected",
            Rejection::PeerCycle(_) => "peer-cycle",
            Rejection::PeerRangeMismatch { .. } => "peer-range-mismatch",
        }
    }

    /// Innermost cause, following `PeerRejected` links.
    pub fn root_cause(&self) -> &Rejection {
        match self {
            Rejection::PeerRejected { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_follows_peer_chain() {
        let rejection = Rejection::PeerRejected {
            peer: "react-dom".into(),
            cause: Box::new(Rejection::PeerRejected {
                peer: "react".into(),
                cause: Box::new(Rejection::Excluded("react".into())),
            }),
        };

        assert_eq!(rejection.code(), "peer-rejected");
        assert_eq!(rejection.root_cause(), &Rejection::Excluded("react".into()));
    }

    #[test]
    fn test_config_error_message() {
        let err = CdnError::Config("bad".into());
        assert_eq!(err.to_string(), "Configuration error: bad");
    }
}
