//! `TryMove` / `CheckPosition` / `SlideMove` / `TeleportMove` / height-clip —
//! the collision resolver every mover in `sim` goes through before it
//! commits a position change.
//!
//! Grounded on the two half-finished teacher prototypes this replaces
//! (`collision.rs`'s vanilla solid-line test, `xy_movement.rs`'s richer
//! `P_CheckPosition`/`PIT_CheckLine` split), merged into one complete pass
//! against the new static [`Level`] + dynamic [`ThingGrid`] split.

use glam::Vec2;
use hecs::Entity;
use smallvec::SmallVec;

use crate::sim::components::{ActorFlags, Class, Position};
use crate::sim::spatial::ThingGrid;
use crate::defs::flags::MobjFlags;
use crate::world::geometry::{Aabb, Level, Linedef, LinedefFlags};
use crate::world::{LinedefId, SubsectorId};

pub const MAX_STEP_HEIGHT: f32 = 24.0;
pub const MAX_MOVE: f32 = 32.0;

/// Everything a tentative move needs to know about the spot it lands on.
pub struct CheckPosition {
    pub blocked: bool,
    pub floor_z: f32,
    pub ceiling_z: f32,
    pub dropoff_z: f32,
    pub subsector: SubsectorId,
    pub ceiling_line: Option<LinedefId>,
    /// Lines with a nonzero `special` whose bbox the move crossed — the
    /// caller (`sim::specials`) decides whether the move actually crosses
    /// them and triggers the effect.
    pub touched_specials: SmallVec<[LinedefId; 4]>,
    /// Other entities overlapping the tentative footprint, tagged SPECIAL —
    /// candidates for pickup, reported regardless of `blocked`.
    pub touched_pickups: SmallVec<[Entity; 4]>,
}

struct LineCtx {
    bbox: Aabb,
    floor_z: f32,
    ceiling_z: f32,
    dropoff_z: f32,
    ceiling_line: Option<LinedefId>,
    is_missile: bool,
    is_player: bool,
    touched_specials: SmallVec<[LinedefId; 4]>,
}

fn box_on_line_side(b: &Aabb, v1: Vec2, v2: Vec2) -> i32 {
    let dx = v2.x - v1.x;
    let dy = v2.y - v1.y;
    let (mut front, mut back) = (false, false);
    for &x in &[b.min.x, b.max.x] {
        for &y in &[b.min.y, b.max.y] {
            let cross = dx * (y - v1.y) - (x - v1.x) * dy;
            if cross >= 0.0 {
                front = true;
            } else {
                back = true;
            }
            if front && back {
                return -1;
            }
        }
    }
    if front { 0 } else { 1 }
}

/// Vertical opening between the two sectors a two-sided line separates, and
/// the lower of the two floors (used for drop-off avoidance).
fn line_opening(level: &Level, line: &Linedef) -> (f32, f32, f32) {
    let (Some(front_sd), Some(back_sd)) = (line.right_sidedef, line.left_sidedef) else {
        return (0.0, 0.0, 0.0);
    };
    let front_sec = &level.sectors[level.sidedefs[front_sd.index()].sector.index()];
    let back_sec = &level.sectors[level.sidedefs[back_sd.index()].sector.index()];

    let open_top = front_sec.ceiling_height.min(back_sec.ceiling_height);
    let (open_bottom, low_floor) = if front_sec.floor_height > back_sec.floor_height {
        (front_sec.floor_height, back_sec.floor_height)
    } else {
        (back_sec.floor_height, front_sec.floor_height)
    };
    (open_top, open_bottom, low_floor)
}

/// `false` only for a genuinely solid, impassable line — everything else
/// (including specials) still narrows the opening and is recorded.
fn pit_check_line(level: &Level, line: &Linedef, line_id: LinedefId, ctx: &mut LineCtx) -> bool {
    let v1 = level.vertices[line.v1.index()].pos;
    let v2 = level.vertices[line.v2.index()].pos;

    let line_bbox = Aabb {
        min: v1.min(v2),
        max: v1.max(v2),
    };
    if !ctx.bbox.intersects(&line_bbox) {
        return true;
    }
    if box_on_line_side(&ctx.bbox, v1, v2) != -1 {
        return true;
    }

    if !line.flags.contains(LinedefFlags::TWO_SIDED) {
        return false;
    }
    if !ctx.is_missile {
        if line.flags.contains(LinedefFlags::IMPASSABLE) {
            return false;
        }
        if !ctx.is_player && line.flags.contains(LinedefFlags::BLOCK_MONSTERS) {
            return false;
        }
    }

    let (open_top, open_bottom, low_floor) = line_opening(level, line);
    if open_top < ctx.ceiling_z {
        ctx.ceiling_z = open_top;
        ctx.ceiling_line = Some(line_id);
    }
    if open_bottom > ctx.floor_z {
        ctx.floor_z = open_bottom;
    }
    if low_floor < ctx.dropoff_z {
        ctx.dropoff_z = low_floor;
    }

    if line.special != 0 {
        ctx.touched_specials.push(line_id);
    }
    true
}

/// Full collision query at `dest`, without committing anything. Used by both
/// `try_move` and by height-clip recomputation after a plane mover changes a
/// sector's floor/ceiling under a resting thing.
pub fn check_position(
    level: &Level,
    grid: &ThingGrid,
    world: &hecs::World,
    self_entity: Entity,
    class: &Class,
    is_player: bool,
    dest: Vec2,
) -> CheckPosition {
    let radius = class.0.radius;
    let subsector = level.locate_subsector(dest);
    let sector = &level.sectors[level.sector_of(subsector).index()];

    let bbox = Aabb {
        min: dest - Vec2::splat(radius),
        max: dest + Vec2::splat(radius),
    };

    let mut ctx = LineCtx {
        bbox,
        floor_z: sector.floor_height,
        ceiling_z: sector.ceiling_height,
        dropoff_z: sector.floor_height,
        ceiling_line: None,
        is_missile: class.0.flags.contains(MobjFlags::MISSILE),
        is_player,
        touched_specials: SmallVec::new(),
    };

    let mut line_blocked = false;
    level.block_lines_iter(bbox, |line, id| {
        if !pit_check_line(level, line, id, &mut ctx) {
            line_blocked = true;
        }
        true
    });

    let mut thing_blocked = false;
    let mut touched_pickups: SmallVec<[Entity; 4]> = SmallVec::new();
    grid.query(bbox.min, bbox.max, |other| {
        if other == self_entity {
            return;
        }
        let Ok(mut q) = world.query_one::<(&Position, &Class, &ActorFlags)>(other) else {
            return;
        };
        let Some((opos, oclass, oflags)) = q.get() else {
            return;
        };
        let block_dist = oclass.0.radius + radius;
        if (opos.xy.x - dest.x).abs() >= block_dist || (opos.xy.y - dest.y).abs() >= block_dist {
            return;
        }
        if oflags.0.contains(MobjFlags::SPECIAL) {
            touched_pickups.push(other);
            if !oflags.0.contains(MobjFlags::SOLID) {
                return;
            }
        }
        if oflags.0.intersects(MobjFlags::SOLID | MobjFlags::SHOOTABLE) {
            thing_blocked = true;
        }
    });

    CheckPosition {
        blocked: line_blocked || thing_blocked,
        floor_z: ctx.floor_z,
        ceiling_z: ctx.ceiling_z,
        dropoff_z: ctx.dropoff_z,
        subsector,
        ceiling_line: ctx.ceiling_line,
        touched_specials: ctx.touched_specials,
        touched_pickups,
    }
}

pub struct MoveOutcome {
    pub moved: bool,
    pub check: CheckPosition,
}

/// One stepped move attempt — vanilla's `P_TryMove`. Does not mutate
/// anything; the caller commits `pos`/`subsector` on `moved == true`.
pub fn try_move(
    level: &Level,
    grid: &ThingGrid,
    world: &hecs::World,
    entity: Entity,
    current_z: f32,
    class: &Class,
    is_player: bool,
    dest: Vec2,
) -> MoveOutcome {
    let check = check_position(level, grid, world, entity, class, is_player, dest);

    let blocked = check.blocked
        || check.ceiling_z - check.floor_z < class.0.height
        || check.floor_z - current_z > MAX_STEP_HEIGHT
        || check.floor_z - check.dropoff_z > MAX_STEP_HEIGHT;

    MoveOutcome {
        moved: !blocked,
        check,
    }
}

/// A teleporter destination ignores step height and dropoff — only the
/// ceiling/floor gap and solid blockers matter.
pub fn teleport_move(
    level: &Level,
    grid: &ThingGrid,
    world: &hecs::World,
    entity: Entity,
    class: &Class,
    is_player: bool,
    dest: Vec2,
) -> MoveOutcome {
    let check = check_position(level, grid, world, entity, class, is_player, dest);
    let blocked = check.blocked || check.ceiling_z - check.floor_z < class.0.height;
    MoveOutcome {
        moved: !blocked,
        check,
    }
}

/// Recompute floor/ceiling for a thing that hasn't moved in XY but whose
/// sector just had its height changed by a plane mover.
pub fn height_clip(
    level: &Level,
    grid: &ThingGrid,
    world: &hecs::World,
    entity: Entity,
    class: &Class,
    is_player: bool,
    pos: Vec2,
) -> CheckPosition {
    check_position(level, grid, world, entity, class, is_player, pos)
}

/// Result of a slide-move attempt: the portion of the move that could be
/// completed, projected along whichever wall it struck.
pub struct SlideResult {
    pub pos: Vec2,
    pub subsector: SubsectorId,
    pub hit_wall: bool,
}

/// Vanilla's `P_SlideMove`: split the tic's displacement into quarter
/// slices, and on hitting a solid seg, project the remaining displacement
/// onto the wall's tangent instead of stopping dead.
#[allow(clippy::too_many_arguments)]
pub fn slide_move(
    level: &Level,
    grid: &ThingGrid,
    world: &hecs::World,
    entity: Entity,
    mut pos: Vec2,
    current_z: f32,
    delta: Vec2,
    class: &Class,
    is_player: bool,
) -> SlideResult {
    const SLICES: i32 = 4;
    let mut remaining = delta;
    let mut subsector = level.locate_subsector(pos);
    let mut touched = false;

    for _ in 0..SLICES {
        let slice = remaining / SLICES as f32;
        let target = pos + slice;
        let outcome = try_move(level, grid, world, entity, current_z, class, is_player, target);

        if outcome.moved {
            pos = target;
            subsector = outcome.check.subsector;
            continue;
        }

        touched = true;
        let Some(line_id) = find_blocking_wall(level, pos, target, class.0.radius) else {
            remaining = Vec2::ZERO;
            break;
        };
        let line = &level.linedefs[line_id.index()];
        let edge = line.v2_pos(level) - line.v1_pos(level);
        let tangent = edge.normalize_or_zero();
        let projected = tangent * slice.dot(tangent);

        let retried = try_move(
            level,
            grid,
            world,
            entity,
            current_z,
            class,
            is_player,
            pos + projected,
        );
        if retried.moved {
            pos += projected;
            subsector = retried.check.subsector;
        }
        remaining -= slice;
    }

    SlideResult {
        pos,
        subsector,
        hit_wall: touched,
    }
}

fn find_blocking_wall(level: &Level, from: Vec2, to: Vec2, radius: f32) -> Option<LinedefId> {
    let bbox = Aabb {
        min: from.min(to) - Vec2::splat(radius),
        max: from.max(to) + Vec2::splat(radius),
    };
    let mut closest: Option<(LinedefId, f32)> = None;
    level.block_lines_iter(bbox, |line, id| {
        if !line.flags.contains(LinedefFlags::TWO_SIDED) {
            let v1 = level.vertices[line.v1.index()].pos;
            let d = (to - v1).length_squared();
            if closest.map_or(true, |(_, best)| d < best) {
                closest = Some((id, d));
            }
        }
        true
    });
    closest.map(|(id, _)| id)
}

impl Linedef {
    fn v1_pos(&self, level: &Level) -> Vec2 {
        level.vertices[self.v1.index()].pos
    }
    fn v2_pos(&self, level: &Level) -> Vec2 {
        level.vertices[self.v2.index()].pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::geometry::{
        Blockmap, Linedef, Node, Sector, Seg, Sidedef, Subsector as SubsectorRec, Vertex,
    };
    use crate::world::ids::{NONE_ID, SidedefId, SectorId as Sid, VertexId};
    use crate::world::texture::NO_TEXTURE;
    use hecs::World;

    fn tiny_level() -> Level {
        // one 256x256 room, walls fully solid (one-sided)
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
            sector: Sid(0),
            translucency: 255,
            light_override: None,
        };
        let mk_line = |v1: u16, v2: u16| Linedef {
            v1: VertexId(v1),
            v2: VertexId(v2),
            delta: Vec2::ZERO,
            slope_type: crate::world::geometry::SlopeType::Horizontal,
            flags: LinedefFlags::IMPASSABLE,
            special: 0,
            tag: 0,
            right_sidedef: Some(SidedefId(0)),
            left_sidedef: None,
            slider: None,
        };
        let linedefs = vec![mk_line(0, 1), mk_line(1, 2), mk_line(2, 3), mk_line(3, 0)];
        let segs = linedefs
            .iter()
            .enumerate()
            .map(|(i, _)| Seg {
                v1: VertexId(i as u16),
                v2: VertexId(((i + 1) % 4) as u16),
                linedef: Some(LinedefId(i as u16)),
                dir: 0,
                offset: 0.0,
                front_subsector: SubsectorId(0),
                back_subsector: None,
            })
            .collect();
        let subsectors = vec![SubsectorRec {
            seg_count: 4,
            first_seg: SegmentId(0),
        }];
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
            child: [0 | crate::world::geometry::NF_SUBSECTOR, NONE_ID],
        };
        let mut level = Level {
            name: "TEST".into(),
            things: vec![],
            linedefs,
            sidedefs: vec![sidedef],
            vertices: verts,
            segs,
            subsectors,
            nodes: vec![node],
            sectors: vec![sector],
            extrafloors: vec![],
            blockmap: Blockmap {
                origin: Vec2::ZERO,
                width: 2,
                height: 2,
                lines: vec![vec![], vec![], vec![], vec![]],
            },
            sector_of_subsector: vec![Sid(0)],
        };
        // every line is visible from every cell for this tiny fixture
        for cell in level.blockmap.lines.iter_mut() {
            *cell = (0..4u16).map(LinedefId).collect();
        }
        level.finalise();
        level
    }

    use crate::world::{LinedefId, SegmentId, SubsectorId};

    #[test]
    fn try_move_into_open_space_succeeds() {
        let level = tiny_level();
        let grid = ThingGrid::new(Vec2::ZERO, 2, 2);
        let world = World::new();
        let class = Class(crate::defs::MobjType::Trooper.info());
        let ent = {
            let mut w = World::new();
            w.spawn(())
        };
        let outcome = try_move(&level, &grid, &world, ent, 0.0, &class, false, Vec2::new(128.0, 128.0));
        assert!(outcome.moved);
    }

    #[test]
    fn try_move_through_solid_wall_blocked() {
        let level = tiny_level();
        let grid = ThingGrid::new(Vec2::ZERO, 2, 2);
        let world = World::new();
        let class = Class(crate::defs::MobjType::Trooper.info());
        let ent = {
            let mut w = World::new();
            w.spawn(())
        };
        let outcome = try_move(&level, &grid, &world, ent, 0.0, &class, false, Vec2::new(300.0, 128.0));
        assert!(!outcome.moved);
    }
}
