//! Location hierarchy.
//!
//! Locations live in an arena and point at their parent by index, so the
//! tree never owns cycles. NPC lists flow upward: after [`LocationTree::propagate_npcs`]
//! a location lists its own NPCs plus everyone in any of its sub-locations.

use crate::items::ItemId;
use crate::world::{truncate_chars, NpcId};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Handle to a location in a [`LocationTree`]. Only the tree hands these out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(usize);

impl LocationId {
    /// Position in insertion order.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Errors from restructuring the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("a location named '{0}' already exists")]
    DuplicateName(String),

    #[error("'{0}' cannot be its own parent")]
    SelfParent(String),

    #[error("making '{parent}' the parent of '{child}' would create a cycle")]
    Cycle { child: String, parent: String },

    #[error("no location with index {0} in this tree")]
    UnknownId(usize),
}

/// A place in the campaign world.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub description: String,
    pub region: Option<String>,
    pub tags: Vec<String>,
    pub loot: Vec<ItemId>,
    assigned_npcs: Vec<NpcId>,
    npcs: Vec<NpcId>,
    parent: Option<LocationId>,
}

/// Short listing form of a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationSummary {
    pub name: String,
    pub region: String,
    pub npc_count: usize,
    pub tags: Vec<String>,
}

impl Location {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            region: None,
            tags: Vec::new(),
            loot: Vec::new(),
            assigned_npcs: Vec::new(),
            npcs: Vec::new(),
            parent: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// NPCs placed here directly.
    pub fn assigned_npcs(&self) -> &[NpcId] {
        &self.assigned_npcs
    }

    /// NPCs here or in any sub-location, as of the last propagation.
    pub fn npcs(&self) -> &[NpcId] {
        &self.npcs
    }

    pub fn parent(&self) -> Option<LocationId> {
        self.parent
    }

    pub fn short_description(&self, max_chars: usize) -> String {
        truncate_chars(self.description.trim(), max_chars)
    }

    pub fn summary(&self) -> LocationSummary {
        LocationSummary {
            name: self.name.clone(),
            region: self.region.clone().unwrap_or_default(),
            npc_count: self.npcs.len(),
            tags: self.tags.clone(),
        }
    }
}

/// Arena of locations indexed by [`LocationId`].
#[derive(Debug, Clone, Default)]
pub struct LocationTree {
    locations: Vec<Location>,
    by_name: HashMap<String, LocationId>,
}

impl LocationTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parentless location.
    pub fn insert(&mut self, mut location: Location) -> Result<LocationId, LocationError> {
        if self.by_name.contains_key(&location.name) {
            return Err(LocationError::DuplicateName(location.name));
        }
        let id = LocationId(self.locations.len());
        location.parent = None;
        location.npcs = location.assigned_npcs.clone();
        self.by_name.insert(location.name.clone(), id);
        self.locations.push(location);
        Ok(id)
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(id.0)
    }

    fn get_mut(&mut self, id: LocationId) -> Option<&mut Location> {
        self.locations.get_mut(id.0)
    }

    pub fn find(&self, name: &str) -> Option<LocationId> {
        self.by_name.get(name).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&Location> {
        self.find(name).and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// All locations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (LocationId, &Location)> {
        self.locations
            .iter()
            .enumerate()
            .map(|(i, loc)| (LocationId(i), loc))
    }

    /// Direct children of a location.
    pub fn children(&self, id: LocationId) -> Vec<LocationId> {
        self.iter()
            .filter(|(_, loc)| loc.parent == Some(id))
            .map(|(child, _)| child)
            .collect()
    }

    /// Children, grandchildren and so on, depth first.
    pub fn descendants(&self, id: LocationId) -> Vec<LocationId> {
        let mut out = Vec::new();
        for child in self.children(id) {
            out.push(child);
            out.extend(self.descendants(child));
        }
        out
    }

    /// Parent, grandparent and so on up to the root.
    pub fn ancestors(&self, id: LocationId) -> Vec<LocationId> {
        let mut out = Vec::new();
        let mut current = self.get(id).and_then(|loc| loc.parent);
        while let Some(parent) = current {
            out.push(parent);
            current = self.get(parent).and_then(|loc| loc.parent);
        }
        out
    }

    /// Locations without a parent.
    pub fn top_level(&self) -> Vec<LocationId> {
        self.iter()
            .filter(|(_, loc)| loc.parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Locations without children.
    pub fn leaves(&self) -> Vec<LocationId> {
        let mut has_children = vec![false; self.locations.len()];
        for loc in &self.locations {
            if let Some(parent) = loc.parent {
                has_children[parent.0] = true;
            }
        }
        (0..self.locations.len())
            .filter(|&i| !has_children[i])
            .map(LocationId)
            .collect()
    }

    /// Set or clear a location's parent. Refuses anything that would close a cycle.
    ///
    /// Does not re-run propagation.
    pub fn set_parent(
        &mut self,
        id: LocationId,
        parent: Option<LocationId>,
    ) -> Result<(), LocationError> {
        let child_name = self
            .get(id)
            .map(|loc| loc.name.clone())
            .ok_or(LocationError::UnknownId(id.0))?;
        if let Some(parent) = parent {
            let parent_name = self
                .get(parent)
                .map(|loc| loc.name.clone())
                .ok_or(LocationError::UnknownId(parent.0))?;
            if parent == id {
                return Err(LocationError::SelfParent(child_name));
            }
            if self.ancestors(parent).contains(&id) {
                return Err(LocationError::Cycle {
                    child: child_name,
                    parent: parent_name,
                });
            }
        }
        if let Some(loc) = self.get_mut(id) {
            loc.parent = parent;
        }
        Ok(())
    }

    /// Place an NPC here directly. Returns false if already assigned or the
    /// location is not in this tree.
    pub fn assign_npc(&mut self, id: LocationId, npc: NpcId) -> bool {
        let Some(loc) = self.get_mut(id) else {
            return false;
        };
        if loc.assigned_npcs.contains(&npc) {
            return false;
        }
        loc.assigned_npcs.push(npc);
        if !loc.npcs.contains(&npc) {
            loc.npcs.push(npc);
        }
        true
    }

    /// Remove a direct assignment. Returns false if the NPC was not assigned here.
    ///
    /// The effective list is only corrected by the next propagation.
    pub fn unassign_npc(&mut self, id: LocationId, npc: NpcId) -> bool {
        let Some(loc) = self.get_mut(id) else {
            return false;
        };
        let before = loc.assigned_npcs.len();
        loc.assigned_npcs.retain(|n| *n != npc);
        before != loc.assigned_npcs.len()
    }

    /// Returns false if the item is already there or the location is unknown.
    pub fn add_loot(&mut self, id: LocationId, item: ItemId) -> bool {
        match self.get_mut(id) {
            Some(loc) if !loc.loot.contains(&item) => {
                loc.loot.push(item);
                true
            }
            _ => false,
        }
    }

    /// Rebuild every effective NPC list from the direct assignments.
    ///
    /// Each leaf pushes its list up the parent chain; every ancestor appends
    /// NPCs it does not list yet, so nobody appears twice.
    pub fn propagate_npcs(&mut self) {
        for loc in &mut self.locations {
            loc.npcs = loc.assigned_npcs.clone();
        }
        for leaf in self.leaves() {
            let mut current = leaf;
            while let Some(parent) = self.locations[current.0].parent {
                let incoming = self.locations[current.0].npcs.clone();
                let target = &mut self.locations[parent.0].npcs;
                for npc in incoming {
                    if !target.contains(&npc) {
                        target.push(npc);
                    }
                }
                current = parent;
            }
        }
    }

    /// Union of this location's direct NPCs and all descendants' direct NPCs,
    /// computed without touching the stored lists.
    pub fn npcs_with_inheritance(&self, id: LocationId) -> Vec<NpcId> {
        let mut out: Vec<NpcId> = Vec::new();
        let scope = std::iter::once(id).chain(self.descendants(id));
        for loc_id in scope {
            let Some(loc) = self.get(loc_id) else {
                continue;
            };
            for npc in &loc.assigned_npcs {
                if !out.contains(npc) {
                    out.push(*npc);
                }
            }
        }
        out
    }
}
