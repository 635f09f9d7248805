//! Path traversal: the DDA-style blockmap stepper vanilla calls
//! `P_PathTraverse`, specialised into hitscan (line attacks) and line-of-
//! sight (`P_CheckSight`) queries.
//!
//! Grounded on `examples/original_source/source_files/edge/p_sight.cc` and
//! the `p_maputl.c`/`p_map.cc` traversal helpers it builds on: walk the
//! blockmap cells a ray crosses in order, narrowing an "open" top/bottom
//! slope range at every two-sided line and failing the moment a one-sided
//! line (or a too-narrow opening) blocks the ray outright.

use glam::Vec2;
use hecs::{Entity, World};

use super::components::{ActorFlags, Class, Position};
use crate::defs::flags::MobjFlags;
use crate::world::geometry::{Aabb, Level, Linedef};
use crate::world::LinedefId;

/// Outcome of a hitscan: either nothing in range, a wall, or a thing.
pub enum PathHit {
    Line { line: LinedefId, point: Vec2 },
    Thing { entity: Entity, point: Vec2 },
}

/// Every linedef whose segment the ray `from -> to` actually crosses,
/// ordered by distance along the ray. Candidate lines come from the
/// blockmap (bbox-filtered, not yet segment-tested), matching vanilla's
/// two-pass "gather candidates, then sort by intercept" traversal.
fn crossed_lines(level: &Level, from: Vec2, to: Vec2) -> Vec<(f32, LinedefId)> {
    let bbox = Aabb {
        min: from.min(to),
        max: from.max(to),
    };
    let ray = to - from;
    let ray_len2 = ray.length_squared();
    let mut hits = Vec::new();

    level.block_lines_iter(bbox, |line, id| {
        if let Some(t) = segment_intersection(level, line, from, ray, ray_len2) {
            hits.push((t, id));
        }
        true
    });

    hits.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    hits
}

fn segment_intersection(level: &Level, line: &Linedef, from: Vec2, ray: Vec2, ray_len2: f32) -> Option<f32> {
    if ray_len2 <= 0.0 {
        return None;
    }
    let v1 = level.vertices[line.v1.index()].pos;
    let v2 = level.vertices[line.v2.index()].pos;
    let edge = v2 - v1;

    let denom = ray.x * edge.y - ray.y * edge.x;
    if denom.abs() < 1e-6 {
        return None;
    }
    let diff = v1 - from;
    let t = (diff.x * edge.y - diff.y * edge.x) / denom;
    let u = (diff.x * ray.y - diff.y * ray.x) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}

/// Vanilla's `P_CheckSight`, collapsed to a 2D occlusion test over the
/// sequence of two-sided lines the ray crosses: a one-sided line blocks
/// outright, and each two-sided crossing narrows the vertical opening the
/// eye-to-target slope has to fit through.
pub fn aim_line_of_sight(level: &Level, from: Vec2, from_z: f32, to: Vec2, to_z: f32) -> bool {
    let dist = (to - from).length();
    if dist < 1e-3 {
        return true;
    }
    let target_slope = (to_z - from_z) / dist;

    let mut open_top = f32::INFINITY;
    let mut open_bottom = f32::NEG_INFINITY;

    for (t, id) in crossed_lines(level, from, to) {
        let line = &level.linedefs[id.index()];
        if !line.two_sided() {
            return false;
        }
        let front = &level.sectors[level.sidedefs[line.right_sidedef.unwrap().index()].sector.index()];
        let back = &level.sectors[level.sidedefs[line.left_sidedef.unwrap().index()].sector.index()];

        let top = front.ceiling_height.min(back.ceiling_height);
        let bottom = front.floor_height.max(back.floor_height);
        if top <= bottom {
            return false;
        }

        let here_dist = t * dist;
        let top_slope = (top - from_z) / here_dist.max(1.0);
        let bottom_slope = (bottom - from_z) / here_dist.max(1.0);
        open_top = open_top.min(top_slope);
        open_bottom = open_bottom.max(bottom_slope);
        if open_top <= open_bottom {
            return false;
        }
    }

    target_slope <= open_top && target_slope >= open_bottom
}

/// Vanilla's `P_LineAttack` / `AimLineAttack` fused into one pass: walk the
/// blockmap ray, return the first solid wall or shootable thing it meets.
/// `radius` widens the hit test against things the way vanilla fattens the
/// trace by the shooter's melee range for autoaim.
pub fn hitscan(
    level: &Level,
    world: &World,
    shooter: Entity,
    from: Vec2,
    from_z: f32,
    to: Vec2,
    to_z: f32,
) -> Option<PathHit> {
    let dist = (to - from).length();
    if dist < 1e-3 {
        return None;
    }
    let slope = (to_z - from_z) / dist;

    for (t, id) in crossed_lines(level, from, to) {
        let line = &level.linedefs[id.index()];
        let point = from + (to - from) * t;

        if !line.two_sided() {
            return Some(PathHit::Line { line: id, point });
        }
        let front = &level.sectors[level.sidedefs[line.right_sidedef.unwrap().index()].sector.index()];
        let back = &level.sectors[level.sidedefs[line.left_sidedef.unwrap().index()].sector.index()];
        let top = front.ceiling_height.min(back.ceiling_height);
        let bottom = front.floor_height.max(back.floor_height);
        let here_z = from_z + slope * (t * dist);
        if here_z < bottom || here_z > top {
            return Some(PathHit::Line { line: id, point });
        }

        if let Some(hit) = thing_along_ray(world, shooter, from, to, t, here_z) {
            return Some(hit);
        }
    }

    thing_along_ray(world, shooter, from, to, 1.0, to_z)
}

fn thing_along_ray(world: &World, shooter: Entity, from: Vec2, to: Vec2, max_t: f32, at_z: f32) -> Option<PathHit> {
    let ray = to - from;
    let mut best: Option<(f32, Entity, Vec2)> = None;

    for (entity, (pos, flags, class)) in world.query::<(&Position, &ActorFlags, &Class)>().iter() {
        if entity == shooter || !flags.0.intersects(MobjFlags::SHOOTABLE) {
            continue;
        }
        if at_z < pos.z || at_z > pos.z + class.0.height {
            continue;
        }
        let to_thing = pos.xy - from;
        let ray_len2 = ray.length_squared();
        if ray_len2 <= 0.0 {
            continue;
        }
        let t = to_thing.dot(ray) / ray_len2;
        if !(0.0..=max_t).contains(&t) {
            continue;
        }
        let closest = from + ray * t;
        if (closest - pos.xy).length() > class.0.radius {
            continue;
        }
        if best.map_or(true, |(bt, ..)| t < bt) {
            best = Some((t, entity, closest));
        }
    }

    best.map(|(_, entity, point)| PathHit::Thing { entity, point })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::geometry::{
        Blockmap, LinedefFlags, Node, Sector, Seg, Sidedef, SlopeType, Subsector as SubsectorRec, Vertex,
        NF_SUBSECTOR,
    };
    use crate::world::ids::{LinedefId as LId, NONE_ID, SectorId, SegmentId, SidedefId, SubsectorId, VertexId};
    use crate::world::texture::NO_TEXTURE;

    fn open_room() -> Level {
        let verts = vec![
            Vertex { pos: Vec2::new(0.0, 0.0) },
            Vertex { pos: Vec2::new(512.0, 0.0) },
            Vertex { pos: Vec2::new(512.0, 512.0) },
            Vertex { pos: Vec2::new(0.0, 512.0) },
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
            ceiling_height: 256.0,
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
                Aabb { min: Vec2::ZERO, max: Vec2::new(512.0, 512.0) },
                Aabb { min: Vec2::ZERO, max: Vec2::new(512.0, 512.0) },
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
    fn sight_is_clear_in_an_open_room() {
        let level = open_room();
        assert!(aim_line_of_sight(&level, Vec2::new(50.0, 50.0), 40.0, Vec2::new(400.0, 400.0), 40.0));
    }

    #[test]
    fn hitscan_through_open_room_finds_nothing() {
        let level = open_room();
        let world = World::new();
        let shooter = {
            let mut w = World::new();
            w.spawn(())
        };
        let hit = hitscan(
            &level,
            &world,
            shooter,
            Vec2::new(50.0, 50.0),
            40.0,
            Vec2::new(400.0, 400.0),
            40.0,
        );
        assert!(hit.is_none());
    }
}
