//! Session memory store and thematic connections.
//!
//! Memories live only for the session. The store hands out sequential ids,
//! assigns a position to memories planted without one, and bumps a revision
//! counter on every change so renderers know when to re-derive the trees.

use crate::memory::{GroundPosition, Memory, MemoryDraft, MemoryError, MemoryId};
use chrono::Utc;
use glam::Vec3;
use rand::{Rng, RngCore};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Half-width of the square new memories are scattered in.
pub const PLANTING_HALF_EXTENT: f32 = 10.0;

/// Height connection lines are drawn at.
pub const CONNECTION_HEIGHT: f32 = 2.0;

/// Placeholder weight of every connection.
pub const CONNECTION_STRENGTH: f32 = 0.5;

/// All memories of the session, in planting order.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    memories: Vec<Memory>,
    next_id: u64,
    revision: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            memories: Vec::new(),
            next_id: 1,
            revision: 0,
        }
    }

    /// Validate a draft and plant it.
    ///
    /// Drafts without a location are scattered uniformly over
    /// `[-10, 10) x [-10, 10)`.
    pub fn add(&mut self, draft: MemoryDraft, rng: &mut dyn RngCore) -> Result<MemoryId, MemoryError> {
        let id = MemoryId::new(self.next_id);
        let mut memory = draft.into_memory(id, Utc::now())?;

        if memory.position.is_none() {
            memory.position = Some(GroundPosition::new(
                rng.gen_range(-PLANTING_HALF_EXTENT..PLANTING_HALF_EXTENT),
                rng.gen_range(-PLANTING_HALF_EXTENT..PLANTING_HALF_EXTENT),
            ));
        }

        info!(id = %id, emotion = %memory.emotion, "planted memory");
        self.next_id += 1;
        self.memories.push(memory);
        self.revision += 1;
        Ok(id)
    }

    pub fn get(&self, id: MemoryId) -> Option<&Memory> {
        self.memories.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: MemoryId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Memory> {
        self.memories.iter()
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    /// Changes whenever a memory is added or moved.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Move a memory's tree. This is the only mutation a memory receives.
    pub fn set_position(&mut self, id: MemoryId, position: GroundPosition) -> Result<(), MemoryError> {
        let memory = self
            .memories
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(MemoryError::UnknownMemory(id))?;
        memory.position = Some(position);
        self.revision += 1;
        Ok(())
    }

    /// Where a memory's tree stands, including the fallback for unplaced ones.
    pub fn position_of(&self, id: MemoryId) -> Option<GroundPosition> {
        self.get(id).map(|m| {
            m.position
                .unwrap_or_else(|| crate::scene::tree::fallback_position(m))
        })
    }
}

/// A drawable link between two trees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionSegment {
    pub from: MemoryId,
    pub to: MemoryId,
    pub start: Vec3,
    pub end: Vec3,
    pub strength: f32,
}

/// Directed relation from a memory to the memories it relates to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Connections {
    edges: BTreeMap<MemoryId, BTreeSet<MemoryId>>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `related` into the links of `from`.
    ///
    /// Self-links and ids the store does not know are dropped. Returns how
    /// many new links were added.
    pub fn link(
        &mut self,
        from: MemoryId,
        related: impl IntoIterator<Item = MemoryId>,
        store: &MemoryStore,
    ) -> usize {
        if !store.contains(from) {
            return 0;
        }
        let targets = self.edges.entry(from).or_default();
        let before = targets.len();
        targets.extend(
            related
                .into_iter()
                .filter(|id| *id != from && store.contains(*id)),
        );
        let added = targets.len() - before;
        if targets.is_empty() {
            self.edges.remove(&from);
        }
        added
    }

    pub fn related(&self, from: MemoryId) -> impl Iterator<Item = MemoryId> + '_ {
        self.edges.get(&from).into_iter().flatten().copied()
    }

    /// Number of directed links.
    pub fn len(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }

    /// Line segments between connected trees at their current positions.
    pub fn segments(&self, store: &MemoryStore) -> Vec<ConnectionSegment> {
        self.edges
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (*from, *to)))
            .filter_map(|(from, to)| {
                let start = store.position_of(from)?.to_vec3(CONNECTION_HEIGHT);
                let end = store.position_of(to)?.to_vec3(CONNECTION_HEIGHT);
                Some(ConnectionSegment {
                    from,
                    to,
                    start,
                    end,
                    strength: CONNECTION_STRENGTH,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn store_with(n: usize) -> (MemoryStore, Vec<MemoryId>) {
        let mut rng = StdRng::seed_from_u64(1);
        let mut store = MemoryStore::new();
        let ids = (0..n)
            .map(|i| {
                store
                    .add(MemoryDraft::new(format!("m{i}"), "text"), &mut rng)
                    .unwrap()
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn test_ids_are_sequential_and_unique() {
        let (store, ids) = store_with(3);
        assert_eq!(ids, vec![MemoryId::new(1), MemoryId::new(2), MemoryId::new(3)]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.revision(), 3);
    }

    #[test]
    fn test_rejected_draft_leaves_store_untouched() {
        let (mut store, _) = store_with(1);
        let err = store
            .add(MemoryDraft::new("", "text"), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(err, MemoryError::MissingField("title"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.revision(), 1);
        let next = store
            .add(MemoryDraft::new("ok", "text"), &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(next, MemoryId::new(2));
    }

    #[test]
    fn test_new_memories_get_a_position_in_the_planting_square() {
        let (store, _) = store_with(50);
        for memory in store.iter() {
            let p = memory.position.unwrap();
            assert!((-10.0..10.0).contains(&p.x));
            assert!((-10.0..10.0).contains(&p.z));
        }
    }

    #[test]
    fn test_explicit_location_is_kept() {
        let mut store = MemoryStore::new();
        let id = store
            .add(
                MemoryDraft::new("a", "b").with_location(Vec3::new(40.0, 1.0, 2.0)),
                &mut StdRng::seed_from_u64(0),
            )
            .unwrap();
        assert_eq!(store.get(id).unwrap().position, Some(GroundPosition::new(40.0, 2.0)));
    }

    #[test]
    fn test_set_position() {
        let (mut store, ids) = store_with(1);
        store.set_position(ids[0], GroundPosition::new(1.0, 2.0)).unwrap();
        assert_eq!(store.position_of(ids[0]), Some(GroundPosition::new(1.0, 2.0)));
        assert_eq!(store.revision(), 2);
        assert_eq!(
            store.set_position(MemoryId::new(99), GroundPosition::new(0.0, 0.0)),
            Err(MemoryError::UnknownMemory(MemoryId::new(99)))
        );
    }

    #[test]
    fn test_link_filters_self_and_unknown() {
        let (store, ids) = store_with(3);
        let mut connections = Connections::new();
        let added = connections.link(ids[0], [ids[0], ids[1], MemoryId::new(77), ids[2]], &store);
        assert_eq!(added, 2);
        assert_eq!(connections.related(ids[0]).collect::<Vec<_>>(), vec![ids[1], ids[2]]);

        // Merging is idempotent
        assert_eq!(connections.link(ids[0], [ids[1]], &store), 0);
        assert_eq!(connections.len(), 2);

        assert_eq!(connections.link(ids[1], [ids[1]], &store), 0);
        assert_eq!(connections.related(ids[1]).count(), 0);
    }

    #[test]
    fn test_segments_follow_tree_positions() {
        let (mut store, ids) = store_with(2);
        store.set_position(ids[0], GroundPosition::new(1.0, 1.0)).unwrap();
        store.set_position(ids[1], GroundPosition::new(-3.0, 4.0)).unwrap();

        let mut connections = Connections::new();
        connections.link(ids[0], [ids[1]], &store);
        let segments = connections.segments(&store);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, Vec3::new(1.0, 2.0, 1.0));
        assert_eq!(segments[0].end, Vec3::new(-3.0, 2.0, 4.0));
        assert_eq!(segments[0].strength, CONNECTION_STRENGTH);

        connections.clear();
        assert!(connections.segments(&store).is_empty());
    }
}
