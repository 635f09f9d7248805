//! Line/sector specials: the dispatch table `sim::tic` calls with the
//! lines a mobj's footprint crossed this tic, plus the ambient per-sector
//! thinkers (scrollers, pushers, glow/flicker lights) that run every tic
//! regardless of who's standing where.
//!
//! Grounded on `examples/original_source/source_files/edge/p_spec.cc`
//! (`P_CrossSpecialLine`/`P_ShootSpecialLine` dispatch), `p_forces.cc`
//! (wind/current pushers) and `p_lights.cc` (glow/flicker thinkers) — a
//! curated subset of the Boom/MBF21 special numbers rather than the full
//! roster, matching the representative-archetype approach `defs::mobjinfo`
//! already takes in lieu of a shipped `info.c`.

use hecs::{Entity, World};

use super::components::{ActorFlags, Class, Position, Velocity};
use super::movement::LineCrossing;
use super::movers::{Crush, DoorMover, DoorState, MoverKind, PlaneMover, PlaneTarget, SlidingDoorMover};
use super::rng::Rng;
use super::spatial::TouchArena;
use crate::defs::flags::MobjFlags;
use crate::world::geometry::Level;
use crate::world::SectorId;

const DOOR_SPEED: f32 = 8.0;
const DOOR_WAIT_TICS: i32 = 150; // 4.3s at 35 tics/sec
const LIFT_SPEED: f32 = 8.0;
const LIFT_WAIT_TICS: i32 = 105; // 3s, vanilla PLATWAIT
const CRUSHER_SPEED: f32 = 4.0;
const CRUSHER_WAIT_TICS: i32 = 8;
const SLIDER_SPEED: f32 = 8.0;
const SLIDER_WAIT_TICS: i32 = 105;
/// EDGE's default slider `distance_` — how much of the line's length the
/// midtex actually travels before it's considered fully open.
const SLIDER_DISTANCE_FRACTION: f32 = 1.0;

/// One line special this tick resolved into a runnable mover, handed back
/// to the caller to own for its lifetime (vanilla keeps these as detached
/// thinkers in the same linked list as mobjs; this crate keeps them in
/// `TicRunner`'s own `Vec`s instead, same rationale as `sim::spatial`'s
/// arena-over-pointers approach).
pub enum SpawnedMover {
    Plane(PlaneMover),
    Door(DoorMover),
    Slider(SlidingDoorMover),
}

/// Resolve every line a mobj crossed this tic into a (de-duplicated)
/// sequence of movers to spawn. Only the entity that triggers a
/// use/walkover special the *first* time this tic matters; crossing the
/// same line twice in one pass (possible after a slide-move retry) must
/// not double-trigger it, so callers should dedupe by `LinedefId` before
/// calling if more than one crossing naturally collapses to one line.
pub fn cross_special_lines(level: &mut Level, crossings: &[LineCrossing]) -> Vec<SpawnedMover> {
    let mut movers = Vec::new();
    let mut triggered = std::collections::HashSet::new();

    for crossing in crossings {
        if !triggered.insert(crossing.line) {
            continue;
        }
        let special = level.linedefs[crossing.line.index()].special;
        if special == 0 {
            continue;
        }

        if matches!(special, 120 | 121) {
            // A slider already running on this line only accepts a player
            // closing it early while waiting; see DESIGN.md for why that
            // retrigger path isn't wired up yet.
            if level.linedefs[crossing.line.index()].slider.is_none() {
                if let Some(mover) = spawn_slider(level, crossing.line, special) {
                    level.linedefs[crossing.line.index()].slider = Some(1);
                    movers.push(mover);
                }
            }
            continue;
        }

        let line = &level.linedefs[crossing.line.index()];
        let Some(sidedef) = line.right_sidedef else { continue };
        let sector = level.sidedefs[sidedef.index()].sector;
        if let Some(mover) = dispatch_special(level, special, sector) {
            movers.push(mover);
        }
    }

    movers
}

fn dispatch_special(level: &Level, special: u16, sector: SectorId) -> Option<SpawnedMover> {
    let s = &level.sectors[sector.index()];
    match special {
        // Open door, stay open.
        1 | 31 => Some(SpawnedMover::Door(DoorMover::new(
            sector,
            s.floor_height,
            s.ceiling_height,
            DOOR_SPEED,
            i32::MAX,
        ))),
        // Open-wait-close door.
        26 | 27 | 28 => Some(SpawnedMover::Door(DoorMover::new(
            sector,
            s.floor_height,
            s.ceiling_height,
            DOOR_SPEED,
            DOOR_WAIT_TICS,
        ))),
        // Lift: lower to the sunken floor, wait, rise back (the
        // move-wait-return cycle `PlaneMover` now actually carries).
        62 | 63 | 88 => Some(SpawnedMover::Plane(PlaneMover::new(
            sector,
            PlaneTarget::Floor,
            s.floor_height,
            s.floor_height - 64.0,
            LIFT_SPEED,
            Crush::Stop,
            MoverKind::Platform,
            LIFT_WAIT_TICS,
        ))),
        // Crusher ceiling: repeats between its resting height and
        // floor+8 for as long as the sector exists.
        6 | 25 => Some(SpawnedMover::Plane(PlaneMover::new(
            sector,
            PlaneTarget::Ceiling,
            s.ceiling_height,
            s.floor_height + 8.0,
            CRUSHER_SPEED,
            Crush::Damage(10),
            MoverKind::Continuous,
            CRUSHER_WAIT_TICS,
        ))),
        _ => None,
    }
}

/// Curated horizontal-slider specials: 120 opens and stays open, 121
/// opens, waits, then closes (the same open-only/open-wait-close split
/// vanilla's vertical doors use between 1/31 and 26/27/28).
fn spawn_slider(level: &Level, line_id: crate::world::LinedefId, special: u16) -> Option<SpawnedMover> {
    let line = &level.linedefs[line_id.index()];
    if !line.two_sided() {
        return None;
    }
    let line_length = line.delta.length();
    let final_open = special == 120;
    Some(SpawnedMover::Slider(SlidingDoorMover::new(
        line_id,
        line_length,
        SLIDER_DISTANCE_FRACTION,
        SLIDER_SPEED,
        SLIDER_WAIT_TICS,
        final_open,
    )))
}

/// Advance every mover one tic, dropping the ones that finished. Door
/// movers stay alive until they've fully cycled back closed (or forever,
/// for a stay-open door — callers never see `true` from those).
pub fn tick_movers(level: &mut Level, touch: &TouchArena, world: &mut World, movers: &mut Vec<SpawnedMover>) {
    movers.retain_mut(|mover| match mover {
        SpawnedMover::Plane(m) => !m.tick(level, touch, world),
        SpawnedMover::Door(d) => {
            let closed = d.tick(level, touch, &*world);
            !(closed && d.state == DoorState::Closing)
        }
        SpawnedMover::Slider(s) => {
            let done = s.tick(level, touch, world);
            if done {
                level.linedefs[s.line.index()].slider = None;
            }
            !done
        }
    });
}

/// A constant directional push applied to every thing resting in a
/// tagged sector — vanilla's wind/current specials (`p_forces.cc`).
pub struct Force {
    pub sector: SectorId,
    pub accel: glam::Vec2,
}

impl Force {
    pub fn apply(&self, touch: &TouchArena, world: &mut World) {
        for entity in touch.things_in_sector(self.sector) {
            if let Ok((vel, flags)) = world.query_one_mut::<(&mut Velocity, &ActorFlags)>(entity) {
                if !flags.0.contains(MobjFlags::NOGRAVITY) {
                    vel.0.x += self.accel.x;
                    vel.0.y += self.accel.y;
                }
            }
        }
    }
}

/// Per-sector ambient light animation — Boom's glow (smooth sine-ish
/// ramp between min/max) and flicker (random on/off) thinkers.
pub enum LightThinker {
    Glow { sector: SectorId, min: u8, max: u8, rising: bool },
    Flicker { sector: SectorId, min: u8, max: u8 },
}

impl LightThinker {
    pub fn tick(&mut self, level: &mut Level, rng: &mut Rng) {
        match self {
            LightThinker::Glow { sector, min, max, rising } => {
                let light = &mut level.sectors[sector.index()].light;
                if *rising {
                    *light = light.saturating_add(1).min(*max);
                    if *light >= *max {
                        *rising = false;
                    }
                } else {
                    *light = light.saturating_sub(1).max(*min);
                    if *light <= *min {
                        *rising = true;
                    }
                }
            }
            LightThinker::Flicker { sector, min, max } => {
                let light = &mut level.sectors[sector.index()].light;
                *light = if rng.chance(64) { *max } else { *min };
            }
        }
    }
}

/// Resolved per-tic effect of a sector's `special` field on anything
/// standing in it — vanilla's small table of numbered sector specials
/// (`P_PlayerInSpecialSector`), curated down to the handful this crate's
/// player think cares about. `20` is this crate's own curated extension
/// for an airless sector, the same "borrow an unused vanilla slot"
/// approach `cross_special_lines` already takes for sliders 120/121.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SectorEffect {
    pub damage: Option<i32>,
    pub airless: bool,
    pub secret: bool,
}

pub fn sector_effect(special: u16) -> SectorEffect {
    match special {
        5 => SectorEffect { damage: Some(10), ..Default::default() },
        7 => SectorEffect { damage: Some(5), ..Default::default() },
        16 => SectorEffect { damage: Some(20), ..Default::default() },
        9 => SectorEffect { secret: true, ..Default::default() },
        20 => SectorEffect { airless: true, ..Default::default() },
        _ => SectorEffect::default(),
    }
}

/// Candidates currently eligible for pickup (reported by `CheckPosition`
/// regardless of whether the move itself was blocked) — resolves to a
/// despawn-and-apply-effect for `SPECIAL` things. Health/ammo/armour
/// effects are out of scope (no item-type roster ships with this crate),
/// so this just removes the pickup and reports it.
pub fn resolve_pickups(world: &mut World, toucher: Entity, pickups: &[Entity]) -> Vec<Entity> {
    let mut taken = Vec::new();
    for &item in pickups {
        if item == toucher {
            continue;
        }
        if world
            .get::<&ActorFlags>(item)
            .map(|f| f.0.contains(MobjFlags::SPECIAL))
            .unwrap_or(false)
        {
            taken.push(item);
        }
    }
    taken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::LinedefId;
    use crate::world::geometry::{
        Aabb, Blockmap, Linedef, LinedefFlags, Node, Sector, Seg, Sidedef, SlopeType, Subsector as SubsectorRec,
        Vertex, NF_SUBSECTOR,
    };
    use crate::world::ids::{NONE_ID, SegmentId, SidedefId, SubsectorId, VertexId};
    use crate::world::texture::NO_TEXTURE;
    use glam::Vec2;

    fn level_with_door_line() -> Level {
        let verts = vec![
            Vertex { pos: Vec2::new(0.0, 0.0) },
            Vertex { pos: Vec2::new(256.0, 0.0) },
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
            special: 1,
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
            ceiling_height: 64.0,
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
    fn crossing_a_door_line_spawns_one_door_mover() {
        let mut level = level_with_door_line();
        let ent = {
            let mut w = World::new();
            w.spawn(())
        };
        let crossings = vec![
            LineCrossing { entity: ent, line: LinedefId(0) },
            LineCrossing { entity: ent, line: LinedefId(0) },
        ];
        let movers = cross_special_lines(&mut level, &crossings);
        assert_eq!(movers.len(), 1);
        assert!(matches!(movers[0], SpawnedMover::Door(_)));
    }

    #[test]
    fn sector_effect_table_matches_curated_numbers() {
        assert_eq!(sector_effect(5).damage, Some(10));
        assert_eq!(sector_effect(7).damage, Some(5));
        assert_eq!(sector_effect(16).damage, Some(20));
        assert!(sector_effect(9).secret);
        assert!(sector_effect(20).airless);
        assert_eq!(sector_effect(0), SectorEffect::default());
    }
}
