//! Per-tick spatial index: a thing blockmap (mirrors the static line
//! blockmap in `world::geometry::Blockmap` but rebuilt as things move) and a
//! sector/thing touch-node arena.
//!
//! Both used to chain entries with raw back-pointers à la vanilla's
//! intrusive linked lists. Here they're plain arenas indexed by a generation
//! -free handle: unlinking is an O(1) swap-remove from a `Vec`-backed free
//! list instead of four-pointer surgery, and there's nothing to get wrong
//! when an entity dies mid-iteration.

use std::collections::HashMap;

use glam::Vec2;
use hecs::Entity;
use smallvec::SmallVec;

use crate::world::geometry::BLOCK_SIZE;
use crate::world::SectorId;

/// Dynamic (per-tick) thing spatial hash, parallel to the static line
/// blockmap. Rebuilt incrementally as things move via [`ThingGrid::relocate`].
#[derive(Debug, Default)]
pub struct ThingGrid {
    origin: Vec2,
    width: i32,
    height: i32,
    cells: HashMap<(i32, i32), SmallVec<[Entity; 8]>>,
}

impl ThingGrid {
    pub fn new(origin: Vec2, width: i32, height: i32) -> Self {
        Self {
            origin,
            width,
            height,
            cells: HashMap::new(),
        }
    }

    #[inline]
    fn cell_of(&self, p: Vec2) -> (i32, i32) {
        (
            ((p.x - self.origin.x) / BLOCK_SIZE).floor() as i32,
            ((p.y - self.origin.y) / BLOCK_SIZE).floor() as i32,
        )
    }

    pub fn insert(&mut self, pos: Vec2, ent: Entity) {
        self.cells.entry(self.cell_of(pos)).or_default().push(ent);
    }

    pub fn remove(&mut self, pos: Vec2, ent: Entity) {
        if let Some(v) = self.cells.get_mut(&self.cell_of(pos)) {
            v.retain(|&e| e != ent);
        }
    }

    pub fn relocate(&mut self, old: Vec2, new: Vec2, ent: Entity) {
        let (a, b) = (self.cell_of(old), self.cell_of(new));
        if a == b {
            return;
        }
        self.remove(old, ent);
        self.insert(new, ent);
    }

    /// Every thing whose cell overlaps `bbox` (inflated by nothing — caller
    /// is expected to pad by the querying thing's radius).
    pub fn query(&self, min: Vec2, max: Vec2, mut visit: impl FnMut(Entity)) {
        let (bx1, by1) = self.cell_of(min);
        let (bx2, by2) = self.cell_of(max);
        for by in by1..=by2 {
            for bx in bx1..=bx2 {
                if let Some(v) = self.cells.get(&(bx, by)) {
                    for &e in v {
                        visit(e);
                    }
                }
            }
        }
    }
}

/// Handle into a [`TouchArena`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TouchNodeId(u32);

struct TouchNode {
    entity: Entity,
    sector: SectorId,
    next_on_sector: Option<TouchNodeId>,
    next_on_thing: Option<TouchNodeId>,
}

/// Tracks which mobjs currently overlap which sectors — needed so a
/// `PlaneMover` raising a floor can crush everything standing in that
/// sector, and so a monster submerged in a 3D-floor liquid slab can be
/// found without scanning every entity.
#[derive(Default)]
pub struct TouchArena {
    nodes: Vec<Option<TouchNode>>,
    free: Vec<TouchNodeId>,
    sector_heads: HashMap<SectorId, TouchNodeId>,
    thing_heads: HashMap<Entity, TouchNodeId>,
}

impl TouchArena {
    pub fn link(&mut self, entity: Entity, sector: SectorId) -> TouchNodeId {
        let node = TouchNode {
            entity,
            sector,
            next_on_sector: self.sector_heads.get(&sector).copied(),
            next_on_thing: self.thing_heads.get(&entity).copied(),
        };
        let id = if let Some(id) = self.free.pop() {
            self.nodes[id.0 as usize] = Some(node);
            id
        } else {
            self.nodes.push(Some(node));
            TouchNodeId((self.nodes.len() - 1) as u32)
        };
        self.sector_heads.insert(sector, id);
        self.thing_heads.insert(entity, id);
        id
    }

    /// Drop every touch node belonging to `entity` (called when it dies or
    /// is about to move to a new set of sectors; the caller re-links fresh
    /// membership afterwards).
    pub fn unlink_thing(&mut self, entity: Entity) {
        let Some(mut cur) = self.thing_heads.remove(&entity) else {
            return;
        };
        loop {
            let next = self.nodes[cur.0 as usize].as_ref().and_then(|n| n.next_on_thing);
            self.remove_from_sector_chain(cur);
            self.nodes[cur.0 as usize] = None;
            self.free.push(cur);
            match next {
                Some(n) => cur = n,
                None => break,
            }
        }
    }

    fn remove_from_sector_chain(&mut self, id: TouchNodeId) {
        let Some(node) = &self.nodes[id.0 as usize] else {
            return;
        };
        let sector = node.sector;
        let next_on_sector = node.next_on_sector;

        // Find predecessor (or head) in the sector chain and splice `id` out.
        let mut cur = self.sector_heads.get(&sector).copied();
        let mut prev: Option<TouchNodeId> = None;
        while let Some(c) = cur {
            if c == id {
                match prev {
                    Some(p) => {
                        if let Some(pn) = &mut self.nodes[p.0 as usize] {
                            pn.next_on_sector = next_on_sector;
                        }
                    }
                    None => match next_on_sector {
                        Some(n) => {
                            self.sector_heads.insert(sector, n);
                        }
                        None => {
                            self.sector_heads.remove(&sector);
                        }
                    },
                }
                return;
            }
            prev = Some(c);
            cur = self.nodes[c.0 as usize].as_ref().and_then(|n| n.next_on_sector);
        }
    }

    /// Every entity currently touching `sector`.
    pub fn things_in_sector(&self, sector: SectorId) -> Vec<Entity> {
        let mut out = Vec::new();
        let mut cur = self.sector_heads.get(&sector).copied();
        while let Some(id) = cur {
            let Some(node) = &self.nodes[id.0 as usize] else {
                break;
            };
            out.push(node.entity);
            cur = node.next_on_sector;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ent(id: u32) -> Entity {
        // hecs::Entity has no public constructor outside a World; build one
        // the only supported way, through a World, for test fixtures.
        let mut w = hecs::World::new();
        for _ in 0..id {
            w.spawn(());
        }
        w.spawn(())
    }

    #[test]
    fn thing_grid_relocate_moves_cells() {
        let mut grid = ThingGrid::new(Vec2::ZERO, 4, 4);
        let e = ent(0);
        grid.insert(Vec2::new(10.0, 10.0), e);
        grid.relocate(Vec2::new(10.0, 10.0), Vec2::new(500.0, 500.0), e);

        let mut seen_near = 0;
        grid.query(Vec2::new(0.0, 0.0), Vec2::new(20.0, 20.0), |_| seen_near += 1);
        assert_eq!(seen_near, 0);

        let mut seen_far = 0;
        grid.query(Vec2::new(490.0, 490.0), Vec2::new(510.0, 510.0), |_| seen_far += 1);
        assert_eq!(seen_far, 1);
    }

    #[test]
    fn touch_arena_links_and_unlinks() {
        let mut arena = TouchArena::default();
        let e1 = ent(0);
        let e2 = ent(1);
        arena.link(e1, SectorId(0));
        arena.link(e2, SectorId(0));
        assert_eq!(arena.things_in_sector(SectorId(0)).len(), 2);

        arena.unlink_thing(e1);
        let remaining = arena.things_in_sector(SectorId(0));
        assert_eq!(remaining, vec![e2]);
    }
}
