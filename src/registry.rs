//! `HandleRegistry`: name→info and handle-sorted-vector→info lookup for one
//! kind of interface (subscription, publication, endpoint, or filter).
//!
//! Infos are owned by a [`tinymap::TinyMap`] arena keyed by an internal dense
//! slot, never by the federate-assigned `Handle` itself (handles can be
//! sparse within one kind, since they are usually drawn from a counter
//! shared across all four kinds). Both the name map and the handle-sorted
//! vector hold that slot, not a pointer — the re-architecture spec §9
//! recommends in place of the raw-pointer design the original `FederateState`
//! used.

use std::collections::HashMap;

use crate::error::FederateError;
use crate::handle::Handle;

tinymap::key_type!(
    /// Dense arena slot, internal to a `HandleRegistry`; never exposed.
    Slot
);

/// Anything storable in a `HandleRegistry` must expose its own handle and
/// registered name so the registry can index it.
pub trait Named {
    fn handle(&self) -> Handle;
    fn name(&self) -> &str;
}

pub struct HandleRegistry<I> {
    kind: &'static str,
    arena: tinymap::TinyMap<Slot, I>,
    by_name: HashMap<String, Slot>,
    /// Kept sorted by `Handle` for binary-search lookup (spec §4.1). Appended
    /// in O(1) when the new handle sorts after the current last element;
    /// otherwise appended then re-sorted.
    by_handle: Vec<(Handle, Slot)>,
}

impl<I> Default for HandleRegistry<I> {
    fn default() -> Self {
        HandleRegistry {
            kind: "interface",
            arena: tinymap::TinyMap::new(),
            by_name: HashMap::new(),
            by_handle: Vec::new(),
        }
    }
}

impl<I: Named> HandleRegistry<I> {
    pub fn new(kind: &'static str) -> Self {
        HandleRegistry {
            kind,
            ..Self::default()
        }
    }

    /// Register `info` under its own `handle()`/`name()`. Errors if the name
    /// is already taken by another entry of this kind (spec §4.1).
    pub fn insert(&mut self, info: I) -> Result<Handle, FederateError> {
        let handle = info.handle();
        let name = info.name().to_owned();
        if !name.is_empty() && self.by_name.contains_key(&name) {
            return Err(FederateError::DuplicateName {
                kind: self.kind,
                name,
            });
        }

        let slot = self.arena.insert(info);

        if !name.is_empty() {
            self.by_name.insert(name, slot);
        }

        if self.by_handle.last().is_some_and(|(last, _)| *last < handle) {
            self.by_handle.push((handle, slot));
        } else {
            self.by_handle.push((handle, slot));
            self.by_handle.sort_unstable_by_key(|(h, _)| *h);
        }

        Ok(handle)
    }

    pub fn by_name(&self, name: &str) -> Option<&I> {
        self.by_name.get(name).and_then(|s| self.arena.get(*s))
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut I> {
        let slot = *self.by_name.get(name)?;
        self.arena.get_mut(slot)
    }

    /// Binary-search lookup by handle. Checks the search result is actually
    /// present before indexing — the original C++ dereferenced a
    /// `lower_bound` iterator without checking it reached a match, which is
    /// UB on an empty vector or a handle past the end (spec §9); we don't
    /// mirror that.
    pub fn by_handle(&self, handle: Handle) -> Option<&I> {
        let idx = self
            .by_handle
            .binary_search_by_key(&handle, |(h, _)| *h)
            .ok()?;
        self.arena.get(self.by_handle[idx].1)
    }

    pub fn by_handle_mut(&mut self, handle: Handle) -> Option<&mut I> {
        let idx = self
            .by_handle
            .binary_search_by_key(&handle, |(h, _)| *h)
            .ok()?;
        let slot = self.by_handle[idx].1;
        self.arena.get_mut(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &I> {
        self.arena.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut I> {
        self.arena.values_mut()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}
