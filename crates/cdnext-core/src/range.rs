// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! npm-style version range matching on top of `semver`.
//!
//! The `semver` crate speaks Cargo's range dialect. npm ranges differ in a few
//! places that show up in module tables and `peerDependencies`:
//!
//! - a bare version (`1.2.3`) is exact, not caret; a bare partial (`1.2`)
//!   is an X-range
//! - a `v` prefix is allowed, also after an operator (`>=v1.0.0`)
//! - `1.x` / `1.X` wildcards
//! - comparators are separated by whitespace rather than commas
//! - `a || b` alternatives
//! - hyphen ranges (`1.0.0 - 2.0.0`)
//!
//! These are normalised here before handing off to [`VersionReq`].

use semver::{Version, VersionReq};

use crate::error::{CdnError, Result};

/// Check whether `version` satisfies the npm range `range`.
///
/// Unparseable versions or ranges never match.
pub fn satisfies(version: &str, range: &str) -> bool {
    let version = match parse_version(version) {
        Ok(v) => v,
        Err(_) => return false,
    };

    match parse_range(range) {
        Ok(alternatives) => alternatives.iter().any(|req| req.matches(&version)),
        Err(_) => false,
    }
}

/// Parse a concrete version, tolerating a leading `v` and an `=`.
pub fn parse_version(version: &str) -> Result<Version> {
    let version = version.trim();
    let version = version.strip_prefix('=').unwrap_or(version);
    let version = version.strip_prefix('v').unwrap_or(version);
    Version::parse(version).map_err(CdnError::Semver)
}

/// Parse an npm range into its `||` alternatives.
pub fn parse_range(range: &str) -> Result<Vec<VersionReq>> {
    range
        .split("||")
        .map(|alternative| parse_comparator_set(alternative.trim()))
        .collect()
}

/// Parse one comparator set (no `||`).
fn parse_comparator_set(set: &str) -> Result<VersionReq> {
    if set.is_empty() || set == "latest" || set == "x" || set == "X" {
        return Ok(VersionReq::STAR);
    }

    // Hyphen range: "1.2.3 - 2.3.4"
    if let Some((low, high)) = set.split_once(" - ") {
        let req = format!(">={}, <={}", strip_v(low.trim()), strip_v(high.trim()));
        return VersionReq::parse(&req).map_err(CdnError::Semver);
    }

    let comparators: Vec<String> = split_comparators(set)
        .into_iter()
        .map(|c| normalize_comparator(&c))
        .collect();

    VersionReq::parse(&comparators.join(", ")).map_err(CdnError::Semver)
}

/// Split on whitespace and commas, gluing a dangling operator to the version
/// that follows it (`>= 1.0.0` is one comparator).
fn split_comparators(set: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut pending_op: Option<String> = None;

    for token in set.split(|c: char| c.is_whitespace() || c == ',') {
        if token.is_empty() {
            continue;
        }
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '~' | '^')) {
            pending_op = Some(token.to_string());
            continue;
        }
        match pending_op.take() {
            Some(op) => out.push(format!("{}{}", op, token)),
            None => out.push(token.to_string()),
        }
    }

    out
}

fn normalize_comparator(comparator: &str) -> String {
    let operator_len = comparator
        .find(|c: char| !matches!(c, '<' | '>' | '=' | '~' | '^'))
        .unwrap_or(comparator.len());
    let (operator, version) = comparator.split_at(operator_len);
    let version = strip_v(version);

    // Bare versions are exact in npm, caret in Cargo. Cargo's `=` on a
    // partial version (`=1.2`) already means `1.2.x`.
    if operator.is_empty() && (is_partial_version(version) || Version::parse(version).is_ok()) {
        return format!("={}", version);
    }

    format!("{}{}", operator, version)
        .replace(".x", ".*")
        .replace(".X", ".*")
}

fn strip_v(version: &str) -> &str {
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

/// `1` or `1.2`: digits separated by single dots, fewer than three parts.
fn is_partial_version(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() < 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}
