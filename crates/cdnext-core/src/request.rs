// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module request parsing.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// npm package name at the start of a bare specifier, optionally scoped.
static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:@[a-z0-9][\w\-.]+/)?[a-z0-9][\w\-.]*)").expect("package name pattern")
});

/// Extract the package name from a request such as `@babel/core/lib/index`.
///
/// Returns `None` for relative or absolute paths and anything else that is
/// not a bare package specifier.
pub fn package_name(request: &str) -> Option<&str> {
    PACKAGE_NAME
        .captures(request)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Check whether a request is a bare package specifier.
pub fn is_package_request(request: &str) -> bool {
    PACKAGE_NAME.is_match(request)
}

/// A module request surfaced by the host build pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    /// Directory the request was issued from
    pub context: PathBuf,
    /// Specifier as written in the import
    pub request: String,
}

impl ModuleRequest {
    pub fn new(context: impl Into<PathBuf>, request: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            request: request.into(),
        }
    }

    pub fn context(&self) -> &Path {
        &self.context
    }

    /// Package name segment of the request, if it is a package request.
    pub fn package_name(&self) -> Option<&str> {
        package_name(&self.request)
    }
}
