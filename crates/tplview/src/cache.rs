//! Composed-template cache.
//!
//! Maps a content name to the [`ComposedTemplate`] built for it. Readers
//! share the lock; the exclusive lock only ever wraps a map insert or
//! clear, never loading or parsing, so a slow disk read on one page does
//! not hold up renders of another.
//!
//! A disabled cache behaves like one with zero capacity: `get` always
//! misses and `put` drops the value.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::composer::ComposedTemplate;

#[derive(Debug)]
pub struct TemplateCache {
    enabled: bool,
    entries: RwLock<HashMap<String, Arc<ComposedTemplate>>>,
}

impl TemplateCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Looks up the namespace composed for `name`.
    pub fn get(&self, name: &str) -> Option<Arc<ComposedTemplate>> {
        if !self.enabled {
            return None;
        }
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Stores a fully composed namespace, replacing any previous entry.
    pub fn put(&self, name: &str, composed: Arc<ComposedTemplate>) {
        if !self.enabled {
            return;
        }
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), composed);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.enabled
            && self
                .entries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. The next render of each name recomposes it.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
