// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Per-build record of accepted substitutions.

use std::collections::HashMap;

use crate::policy::{ModuleKind, SubstitutionDescriptor};

/// Accepted substitutions in first-seen order.
///
/// Keyed by the request path that produced each descriptor, independent of
/// the name a resolver reports. Holds at most one descriptor per key. Lives
/// for one build run and is only read once document generation starts.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionRegistry {
    keys: Vec<String>,
    entries: Vec<SubstitutionDescriptor>,
    index: HashMap<String, usize>,
}

impl SubstitutionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&SubstitutionDescriptor> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Record a descriptor under `key`. Returns `false` and leaves the
    /// registry untouched if the key is already present.
    pub fn insert(&mut self, key: impl Into<String>, descriptor: SubstitutionDescriptor) -> bool {
        let key = key.into();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.keys.push(key);
        self.entries.push(descriptor);
        true
    }

    /// Drop every entry recorded after the first `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        let start = len.min(self.entries.len());
        for removed in self.keys.drain(start..) {
            self.index.remove(&removed);
        }
        self.entries.truncate(start);
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All descriptors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SubstitutionDescriptor> {
        self.entries.iter()
    }

    /// Descriptors of one kind in insertion order.
    pub fn of_kind(&self, kind: ModuleKind) -> impl Iterator<Item = &SubstitutionDescriptor> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }
}

impl<'a> IntoIterator for &'a SubstitutionRegistry {
    type Item = &'a SubstitutionDescriptor;
    type IntoIter = std::slice::Iter<'a, SubstitutionDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
