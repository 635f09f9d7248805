//! The per-tic driver: owns the mutable world (ECS + spatial indices +
//! mover list) and steps them all in vanilla's `P_Ticker` order.
//!
//! Grounded on `examples/original_source/source_files/edge/p_tick.cc`'s
//! `P_Ticker` (movers before thinkers before thing removal).

use hecs::{Entity, World};

use super::components::{Animation, Position};
use super::mobj::{self, spawn_mobj};
use super::movement::run_movement;
use super::movers::{Crush, MoverKind, PlaneMover, PlaneTarget};
use super::player::player_think;
use super::rng::Rng;
use super::spatial::{ThingGrid, TouchArena};
use super::specials::{cross_special_lines, tick_movers, SpawnedMover};
use crate::defs::MobjInfo;
use crate::world::geometry::Level;

/// Simulation rate vanilla's tic loop runs at.
pub const SIM_FPS: u32 = 35;

/// Owns everything that exists only at runtime: the live ECS `World`, the
/// dynamic thing-blockmap/touch-node arenas, active movers, and the
/// gameplay RNG stream. `Level` itself stays owned here too — its sector
/// heights/light levels are mutated in place by movers each tic, so this
/// is the one place that needs `&mut Level` (see DESIGN.md's note on why
/// that doesn't fight `world::geometry`'s "immutable after load" framing).
pub struct TicRunner {
    pub level: Level,
    pub world: World,
    pub grid: ThingGrid,
    pub touch: TouchArena,
    pub rng: Rng,
    movers: Vec<SpawnedMover>,
    tic: u64,
}

impl TicRunner {
    pub fn new(level: Level) -> Self {
        let bm = &level.blockmap;
        let grid = ThingGrid::new(bm.origin, bm.width.max(1), bm.height.max(1));
        Self {
            level,
            world: World::new(),
            grid,
            touch: TouchArena::default(),
            rng: Rng::default(),
            movers: Vec::new(),
            tic: 0,
        }
    }

    pub fn spawn_mobj(&mut self, info: &'static MobjInfo, x: f32, y: f32, angle: f32) -> Entity {
        spawn_mobj(&mut self.world, &mut self.grid, &mut self.touch, &self.level, info, x, y, angle)
    }

    /// Manually queue a plane/door mover (e.g. a level-start "perpetual"
    /// special, rather than one triggered by a line crossing).
    pub fn add_mover(&mut self, mover: SpawnedMover) {
        self.movers.push(mover);
    }

    pub fn mobjs(&self) -> hecs::QueryBorrow<'_, (&Position, &Animation)> {
        self.world.query::<(&Position, &Animation)>()
    }

    pub fn tic_count(&self) -> u64 {
        self.tic
    }

    /// Advance the simulation exactly one tic, in vanilla's ordering:
    /// active planes/doors first (so a thing standing on a rising floor
    /// gets its height-clip recomputed against the *new* height before it
    /// thinks), then player input, then every mobj's movement/animation,
    /// then newly-crossed specials, then deferred state transitions and
    /// thing removal.
    pub fn tick(&mut self) {
        tick_movers(&mut self.level, &self.touch, &mut self.world, &mut self.movers);

        player_think(&mut self.world, &self.level, self.tic);

        let crossings = run_movement(&mut self.world, &self.level, &mut self.grid);

        for mover in cross_special_lines(&mut self.level, &crossings) {
            self.movers.push(mover);
        }

        tick_animations(&mut self.world);

        mobj::run_deferred_states(&mut self.world);
        mobj::reap_removed(&mut self.world, &mut self.grid, &mut self.touch);

        self.tic += 1;
    }

    /// Convenience used by the demo binary to pump a fixed number of tics
    /// headlessly (no wall-clock pacing — a render/record loop, not an
    /// interactive session).
    pub fn pump(&mut self, tics: u64) {
        for _ in 0..tics {
            self.tick();
        }
    }
}

/// Count each animation frame's `tics` down and advance to `next_state`
/// once it hits zero — vanilla's `P_SetMobjState` fallthrough, run from
/// the outside instead of recursively so a chain of zero-tic frames still
/// only costs one state-entry action dispatch per *nonzero* frame landed
/// on.
fn tick_animations(world: &mut World) {
    let due: Vec<Entity> = world
        .query_mut::<&mut Animation>()
        .into_iter()
        .filter_map(|(e, anim)| {
            if anim.tics > 0 {
                anim.tics -= 1;
            }
            (anim.tics == 0).then_some(e)
        })
        .collect();

    for entity in due {
        let next = world.get::<&Animation>(entity).map(|a| a.state.next()).ok();
        if let Some(next_state) = next {
            if !mobj::set_state(world, entity, next_state) {
                mobj::mark_removed(world, entity);
            }
        }
    }
}

/// Helper for `doomcore-demo`: a perpetual crusher or a start-open lift
/// some maps define without a triggering line (vanilla's "perpetual"
/// special sectors, tagged but never walked over).
pub fn perpetual_crusher(level: &Level, sector: crate::world::SectorId) -> PlaneMover {
    let s = &level.sectors[sector.index()];
    PlaneMover::new(
        sector,
        PlaneTarget::Ceiling,
        s.ceiling_height,
        s.floor_height + 8.0,
        4.0,
        Crush::Damage(10),
        MoverKind::Continuous,
        8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::MobjType;
    use crate::world::geometry::{
        Aabb, Blockmap, Linedef, LinedefFlags, Node, Sector, Seg, Sidedef, SlopeType, Subsector as SubsectorRec,
        Vertex, NF_SUBSECTOR,
    };
    use crate::world::ids::{LinedefId, NONE_ID, SectorId, SegmentId, SidedefId, SubsectorId, VertexId};
    use crate::world::texture::NO_TEXTURE;
    use glam::Vec2;

    fn tiny_level() -> Level {
        let verts = vec![
            Vertex { pos: Vec2::new(0.0, 0.0) },
            Vertex { pos: Vec2::new(256.0, 0.0) },
            Vertex { pos: Vec2::new(256.0, 256.0) },
            Vertex { pos: Vec2::new(0.0, 256.0) },
        ];
        let sidedef = Sidedef {
            base_offset: Default::default(),
            upper: NO_TEXTURE,
            lower: NO_TEXTURE,
            middle: NO_TEXTURE,
            sector: SectorId(0),
            translucency: 255,
            light_override: None,
        };
        let line = Linedef {
            v1: VertexId(0),
            v2: VertexId(1),
            delta: Vec2::ZERO,
            slope_type: SlopeType::Horizontal,
            flags: LinedefFlags::IMPASSABLE,
            special: 0,
            tag: 0,
            right_sidedef: Some(SidedefId(0)),
            left_sidedef: None,
            slider: None,
        };
        let seg = Seg {
            v1: VertexId(0),
            v2: VertexId(1),
            linedef: Some(LinedefId(0)),
            dir: 0,
            offset: 0.0,
            front_subsector: SubsectorId(0),
            back_subsector: None,
        };
        let sector = Sector {
            floor_height: 0.0,
            ceiling_height: 128.0,
            floor_tex: NO_TEXTURE,
            ceil_tex: NO_TEXTURE,
            light: 200,
            special: 0,
            tag: 0,
            lines: vec![],
            subsectors: vec![],
            controls: vec![],
        };
        let node = Node {
            x: 0.0,
            y: 0.0,
            dx: 1.0,
            dy: 0.0,
            bbox: [
                Aabb { min: Vec2::ZERO, max: Vec2::new(256.0, 256.0) },
                Aabb { min: Vec2::ZERO, max: Vec2::new(256.0, 256.0) },
            ],
            child: [0 | NF_SUBSECTOR, NONE_ID],
        };
        let mut level = Level {
            name: "TEST".into(),
            things: vec![],
            linedefs: vec![line],
            sidedefs: vec![sidedef],
            vertices: verts,
            segs: vec![seg],
            subsectors: vec![SubsectorRec { seg_count: 1, first_seg: SegmentId(0) }],
            nodes: vec![node],
            sectors: vec![sector],
            extrafloors: vec![],
            blockmap: Blockmap { origin: Vec2::ZERO, width: 1, height: 1, lines: vec![vec![]] },
            sector_of_subsector: vec![],
        };
        level.finalise();
        level
    }

    #[test]
    fn pumping_tics_advances_counter_and_settles_gravity() {
        let level = tiny_level();
        let mut runner = TicRunner::new(level);
        let ent = runner.spawn_mobj(MobjType::Trooper.info(), 50.0, 50.0, 0.0);

        runner.pump(100);

        assert_eq!(runner.tic_count(), 100);
        let pos = runner.world.get::<&Position>(ent).unwrap();
        assert_eq!(pos.z, 0.0);
    }
}
