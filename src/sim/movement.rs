//! Per-tick mobj physics: `P_ZMovement`/`P_XYMovement` rolled into one
//! system that drives every mobj through [`super::collision`] and commits
//! the result back into the ECS + spatial index.
//!
//! Grounded on `examples/original_source/source_files/edge/p_map.cc`'s
//! `P_XYMovement`/`P_ZMovement` pair for the friction/gravity/slide
//! ordering.

use glam::{Vec2, Vec3};
use hecs::{Entity, World};

use super::collision::{self, MAX_MOVE};
use super::components::{ActorFlags, Animation, Class, Position, Subsector, Velocity};
use super::mobj;
use super::spatial::ThingGrid;
use crate::defs::flags::MobjFlags;
use crate::defs::state::State;
use crate::world::{Level, LinedefId};

/// Map-units/tic² downward acceleration (vanilla: 1 * FRACUNIT).
pub const GRAVITY: f32 = 1.0;
/// Vanilla's `FRACUNIT/8` ground-friction cutoff below which a mobj just
/// stops rather than asymptotically crawling to zero.
const STOP_SPEED: f32 = 0.0625;
/// Vanilla's `0xE800` fixed-point friction factor.
const FRICTION: f32 = 0.90625;

/// A special line a moving mobj's footprint crossed this tic, handed to
/// `sim::specials` for `P_CrossSpecialLine` triggering.
pub struct LineCrossing {
    pub entity: Entity,
    pub line: LinedefId,
}

/// Drive XY + Z movement for every non-player mobj with nonzero velocity or
/// above its floor. Players run through [`super::player::player_think`]
/// first, which writes `Velocity` from the tic command; this system then
/// resolves that velocity against the world exactly the same way for player
/// and monster alike.
pub fn run_movement(world: &mut World, level: &Level, grid: &mut ThingGrid) -> Vec<LineCrossing> {
    let mut crossings = Vec::new();

    let entities: Vec<Entity> = world
        .query_mut::<&Position>()
        .into_iter()
        .map(|(e, _)| e)
        .collect();

    for entity in entities {
        z_movement(world, entity, level);
        xy_movement(world, entity, level, grid, &mut crossings);
    }

    crossings
}

fn z_movement(world: &mut World, entity: Entity, level: &Level) {
    let Ok((no_gravity, subsector)) = world
        .query_one_mut::<(&ActorFlags, &Subsector)>(entity)
        .map(|(flags, ss)| (flags.0.contains(MobjFlags::NOGRAVITY), ss.0))
    else {
        return;
    };

    let sector = &level.sectors[level.sector_of(subsector).index()];
    let floor_z = sector.floor_height;
    let ceiling_z = sector.ceiling_height;

    let Ok((pos, vel)) = world.query_one_mut::<(&mut Position, &mut Velocity)>(entity) else {
        return;
    };

    pos.z += vel.0.z;

    if !no_gravity {
        if pos.z > floor_z {
            vel.0.z -= GRAVITY;
        } else {
            pos.z = floor_z;
            vel.0.z = 0.0;
        }
    }

    if pos.z > ceiling_z {
        pos.z = ceiling_z;
        if vel.0.z > 0.0 {
            vel.0.z = 0.0;
        }
    }
}

/// Snapshot of the component state `xy_movement` needs, taken up front so
/// the collision queries below (which themselves borrow `Position`/`Class`/
/// `ActorFlags` on every other entity in the grid) never overlap a live
/// mutable borrow on `entity`'s own components — hecs's runtime borrow
/// check is per archetype column, not per entity, so holding a `&mut
/// Position` across a call that queries `&Position` on a sibling panics
/// even though the two never touch the same row.
struct MoveState {
    pos: Vec2,
    z: f32,
    vel: Vec3,
    flags: MobjFlags,
    subsector: crate::world::SubsectorId,
    anim_state: State,
    is_player: bool,
}

#[allow(clippy::too_many_arguments)]
fn xy_movement(
    world: &mut World,
    entity: Entity,
    level: &Level,
    grid: &mut ThingGrid,
    crossings: &mut Vec<LineCrossing>,
) {
    let Ok(mut st) = world
        .query_one_mut::<(&Position, &Velocity, &ActorFlags, &Class, &Subsector, &Animation)>(entity)
        .map(|(pos, vel, flags, class, subsector, anim)| MoveState {
            pos: pos.xy,
            z: pos.z,
            vel: vel.0,
            flags: flags.0,
            subsector: subsector.0,
            anim_state: anim.state,
            is_player: class.0.id == "PLAYER",
        })
    else {
        return;
    };

    if st.vel.x == 0.0 && st.vel.y == 0.0 {
        if st.flags.contains(MobjFlags::SKULLFLY) {
            if let Ok((flags, vel)) = world.query_one_mut::<(&mut ActorFlags, &mut Velocity)>(entity) {
                flags.0.remove(MobjFlags::SKULLFLY);
                vel.0 = Vec3::ZERO;
            }
        }
        return;
    }

    let class = Class(world.get::<&Class>(entity).unwrap().0);
    let is_player = st.is_player;
    st.vel.x = st.vel.x.clamp(-MAX_MOVE, MAX_MOVE);
    st.vel.y = st.vel.y.clamp(-MAX_MOVE, MAX_MOVE);

    // Vanilla splits a move into <= MAX_MOVE/2 slices so a fast-moving thing
    // can't tunnel past a one-cell-thin wall between blockmap samples.
    let mut xmove = st.vel.x;
    let mut ymove = st.vel.y;
    let mut exploded = false;

    while (xmove != 0.0 || ymove != 0.0) && !exploded {
        let mut step = Vec2::new(xmove, ymove);
        if step.x.abs() > MAX_MOVE * 0.5 || step.y.abs() > MAX_MOVE * 0.5 {
            step *= 0.5;
        }
        xmove -= step.x;
        ymove -= step.y;

        let dest = st.pos + step;
        let outcome = collision::try_move(level, grid, world, entity, st.z, &class, is_player, dest);

        if outcome.moved {
            grid.relocate(st.pos, dest, entity);
            st.pos = dest;
            st.z = st.z.max(outcome.check.floor_z).min(outcome.check.ceiling_z - class.0.height);
            st.subsector = outcome.check.subsector;
            for line in outcome.check.touched_specials {
                crossings.push(LineCrossing { entity, line });
            }
        } else if is_player {
            let slid = collision::slide_move(level, grid, world, entity, st.pos, st.z, step, &class, is_player);
            if slid.pos != st.pos {
                grid.relocate(st.pos, slid.pos, entity);
                st.pos = slid.pos;
                st.subsector = slid.subsector;
            }
            if slid.hit_wall {
                break;
            }
        } else if st.flags.contains(MobjFlags::MISSILE) {
            exploded = true;
        } else {
            st.vel.x = 0.0;
            st.vel.y = 0.0;
            break;
        }
    }

    let on_floor = st.z <= level.sectors[level.sector_of(st.subsector).index()].floor_height;
    let mut revert_to_stand = false;
    if !exploded && !st.flags.intersects(MobjFlags::MISSILE | MobjFlags::SKULLFLY) && on_floor {
        if st.vel.x.abs() < STOP_SPEED && st.vel.y.abs() < STOP_SPEED {
            st.vel.x = 0.0;
            st.vel.y = 0.0;
            if is_player
                && st.anim_state as u32 >= State::PLAY_RUN1 as u32
                && st.anim_state as u32 <= State::PLAY_RUN4 as u32
            {
                revert_to_stand = true;
            }
        } else {
            st.vel.x *= FRICTION;
            st.vel.y *= FRICTION;
        }
    }

    if let Ok((pos, vel, subsector)) = world.query_one_mut::<(&mut Position, &mut Velocity, &mut Subsector)>(entity) {
        pos.xy = st.pos;
        pos.z = st.z;
        vel.0.x = st.vel.x;
        vel.0.y = st.vel.y;
        subsector.0 = st.subsector;
    }

    if revert_to_stand {
        mobj::set_state_deferred(world, entity, State::PLAY);
    }

    if exploded {
        let death_state = class.0.deathstate;
        mobj::set_state_deferred(world, entity, death_state);
        if let Ok((vel, flags)) = world.query_one_mut::<(&mut Velocity, &mut ActorFlags)>(entity) {
            vel.0 = Vec3::ZERO;
            flags.0.remove(MobjFlags::MISSILE);
            flags.0.insert(MobjFlags::NOGRAVITY);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::MobjType;
    use crate::sim::mobj::spawn_mobj;
    use crate::sim::spatial::TouchArena;
    use crate::world::geometry::{
        Aabb, Blockmap, Linedef, LinedefFlags, Node, Sector, Seg, Sidedef, SlopeType,
        Subsector as SubsectorRec, Vertex, NF_SUBSECTOR,
    };
    use crate::world::ids::{LinedefId as LId, SectorId, SegmentId, SidedefId, SubsectorId, VertexId, NONE_ID};
    use crate::world::texture::NO_TEXTURE;

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
            linedef: Some(LId(0)),
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
    fn gravity_settles_a_falling_mobj_on_the_floor() {
        let level = tiny_level();
        let mut world = World::new();
        let mut grid = ThingGrid::new(Vec2::ZERO, 1, 1);
        let mut touch = TouchArena::default();
        let ent = spawn_mobj(&mut world, &mut grid, &mut touch, &level, MobjType::Trooper.info(), 50.0, 50.0, 0.0);
        {
            let mut pos = world.get::<&mut Position>(ent).unwrap();
            pos.z = 50.0;
        }

        for _ in 0..200 {
            z_movement(&mut world, ent, &level);
        }

        let pos = world.get::<&Position>(ent).unwrap();
        assert_eq!(pos.z, 0.0);
    }

    #[test]
    fn friction_stops_a_slow_mobj() {
        let level = tiny_level();
        let mut world = World::new();
        let mut grid = ThingGrid::new(Vec2::ZERO, 1, 1);
        let mut touch = TouchArena::default();
        let ent = spawn_mobj(&mut world, &mut grid, &mut touch, &level, MobjType::Trooper.info(), 50.0, 50.0, 0.0);
        {
            let mut vel = world.get::<&mut Velocity>(ent).unwrap();
            vel.0 = Vec3::new(0.01, 0.0, 0.0);
        }
        let mut crossings = Vec::new();
        xy_movement(&mut world, ent, &level, &mut grid, &mut crossings);
        let vel = world.get::<&Velocity>(ent).unwrap();
        assert_eq!(vel.0.x, 0.0);
    }
}
