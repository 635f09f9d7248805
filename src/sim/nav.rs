//! A* bot navigation over the BSP subsector graph.
//!
//! Grounded on `examples/original_source/source_files/edge/bot_nav.cc`
//! (edge weighting, lift/door waypoint handling) and `p_navigate.cc` (node
//! classification). Nodes are subsectors rather than vanilla's separate
//! nav-mesh, since this crate already has a subsector adjacency graph for
//! free once segs are walked once at load time.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use glam::Vec2;

use crate::world::geometry::Level;
use crate::world::SubsectorId;

/// A bot's assumed running speed, map-units/second — the denominator of
/// every edge's base travel-time term.
const RUNNING_SPEED: f32 = 450.0;
/// Flat time penalty for a door edge: walking up, waiting for it to swing,
/// walking through.
const DOOR_PENALTY: f32 = 2.0;
/// Flat time penalty for a lift edge: waiting for the platform to arrive
/// and ride it down/up.
const LIFT_PENALTY: f32 = 10.0;
/// Flat time penalty for a teleporter hop (near-instant travel, but a bot
/// still has to orient itself on arrival).
const TELEPORT_PENALTY: f32 = 1.0;
/// A mover can climb onto anything at most this tall without a lift/door.
const MAX_STEP_UP: f32 = 24.0;
/// Minimum vertical clearance a bot (56 map-units tall) needs to pass.
const MIN_CLEARANCE: f32 = 56.0;
/// Drops taller than this add a fall-time term (free-fall under gravity).
const FALL_THRESHOLD: f32 = 100.0;

/// What kind of traversal a subsector boundary needs beyond plain walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavNodeKind {
    Normal,
    Door,
    Lift,
    Teleport,
}

struct Edge {
    to: SubsectorId,
    cost: f32,
    kind: NavNodeKind,
    /// Midpoint of the seg actually crossed for this transition.
    waypoint: Vec2,
}

/// Precomputed adjacency over every subsector pair connected by a
/// passable (non-`IMPASSABLE`, non-blocked) two-sided line. Costs are
/// directional: stepping up into a sector costs differently than
/// stepping down out of it, so `edges[a]` and `edges[b]` for the same
/// seg pair don't necessarily mirror each other.
pub struct NavGraph {
    centers: Vec<Vec2>,
    edges: Vec<Vec<Edge>>,
}

impl NavGraph {
    /// Build the graph once after level load. Two subsectors are linked
    /// when a two-sided seg directly borders them; door/lift/teleport
    /// lines get their special-traversal `NavNodeKind` from the line's
    /// `special`. A direction whose step/clearance/teleport requirements
    /// aren't met is simply never added as an edge (spec's "impossible"
    /// cost collapses to "no edge" rather than a sentinel value).
    pub fn build(level: &Level) -> Self {
        let n = level.subsectors.len();
        let mut centers = vec![Vec2::ZERO; n];
        for (i, ss) in level.subsectors.iter().enumerate() {
            let mut sum = Vec2::ZERO;
            let mut count = 0.0;
            for seg_id in level.segs_of_subsector(SubsectorId(i as u16)) {
                let seg = &level.segs[seg_id.index()];
                sum += level.vertices[seg.v1.index()].pos;
                count += 1.0;
            }
            centers[i] = if count > 0.0 { sum / count } else { Vec2::ZERO };
        }

        let mut edges: Vec<Vec<Edge>> = vec![Vec::new(); n];
        for seg in &level.segs {
            let Some(back) = seg.back_subsector else { continue };
            let front = seg.front_subsector;
            if front == back {
                continue;
            }
            let kind = seg
                .linedef
                .map(|ld_id| nav_kind(&level.linedefs[ld_id.index()]))
                .unwrap_or(NavNodeKind::Normal);

            let waypoint = (level.vertices[seg.v1.index()].pos + level.vertices[seg.v2.index()].pos) * 0.5;
            let length = centers[front.index()].distance(centers[back.index()]);

            let front_sector = &level.sectors[level.sector_of(front).index()];
            let back_sector = &level.sectors[level.sector_of(back).index()];

            if let Some(cost) = edge_time(length, front_sector, back_sector, kind) {
                edges[front.index()].push(Edge { to: back, cost, kind, waypoint });
            }
            if let Some(cost) = edge_time(length, back_sector, front_sector, kind) {
                edges[back.index()].push(Edge { to: front, cost, kind, waypoint });
            }
        }

        Self { centers, edges }
    }

    /// A*, heuristic = 1.25x the straight-line travel time to the target
    /// (vanilla's over-admissible bias toward preferring fewer, longer
    /// hops over many short ones through doors/lifts). Returns a sequence
    /// of waypoints, not subsector ids — see [`reconstruct`].
    pub fn find_path(&self, from: SubsectorId, to: SubsectorId) -> Option<Vec<Vec2>> {
        if from == to {
            return Some(Vec::new());
        }

        #[derive(PartialEq)]
        struct Frontier {
            priority: f32,
            node: SubsectorId,
        }
        impl Eq for Frontier {}
        impl Ord for Frontier {
            fn cmp(&self, other: &Self) -> Ordering {
                other.priority.partial_cmp(&self.priority).unwrap_or(Ordering::Equal)
            }
        }
        impl PartialOrd for Frontier {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        let heuristic =
            |n: SubsectorId| self.centers[n.index()].distance(self.centers[to.index()]) / RUNNING_SPEED * 1.25;

        let mut open = BinaryHeap::new();
        open.push(Frontier { priority: heuristic(from), node: from });
        let mut came_from: HashMap<SubsectorId, (SubsectorId, Vec2, NavNodeKind)> = HashMap::new();
        let mut g_score: HashMap<SubsectorId, f32> = HashMap::from([(from, 0.0)]);

        while let Some(Frontier { node, .. }) = open.pop() {
            if node == to {
                return Some(self.reconstruct(&came_from, to, from));
            }
            let current_g = g_score[&node];
            for edge in &self.edges[node.index()] {
                let tentative = current_g + edge.cost;
                if tentative < *g_score.get(&edge.to).unwrap_or(&f32::INFINITY) {
                    came_from.insert(edge.to, (node, edge.waypoint, edge.kind));
                    g_score.insert(edge.to, tentative);
                    open.push(Frontier {
                        priority: tentative + heuristic(edge.to),
                        node: edge.to,
                    });
                }
            }
        }
        None
    }

    /// Closest subsector (by accumulated travel time) hosting a searched-
    /// for thing kind — A* with the heuristic flattened to a constant
    /// (degenerates to Dijkstra per spec §4.6), fanning out from `from`
    /// and never exploring past `max_cost` seconds of travel time.
    pub fn find_nearest(
        &self,
        from: SubsectorId,
        max_cost: f32,
        mut is_target: impl FnMut(SubsectorId) -> bool,
    ) -> Option<SubsectorId> {
        #[derive(PartialEq)]
        struct Frontier {
            cost: f32,
            node: SubsectorId,
        }
        impl Eq for Frontier {}
        impl Ord for Frontier {
            fn cmp(&self, other: &Self) -> Ordering {
                other.cost.partial_cmp(&self.cost).unwrap_or(Ordering::Equal)
            }
        }
        impl PartialOrd for Frontier {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        let mut g_score: HashMap<SubsectorId, f32> = HashMap::from([(from, 0.0)]);
        let mut open = BinaryHeap::new();
        open.push(Frontier { cost: 0.0, node: from });

        while let Some(Frontier { cost, node }) = open.pop() {
            if cost > *g_score.get(&node).unwrap_or(&f32::INFINITY) {
                continue; // stale heap entry, a shorter path already won
            }
            if is_target(node) {
                return Some(node);
            }
            for edge in &self.edges[node.index()] {
                let tentative = cost + edge.cost;
                if tentative > max_cost {
                    continue;
                }
                if tentative < *g_score.get(&edge.to).unwrap_or(&f32::INFINITY) {
                    g_score.insert(edge.to, tentative);
                    open.push(Frontier { cost: tentative, node: edge.to });
                }
            }
        }
        None
    }

    /// Walk `came_from` from `to` back to `from`, collecting each
    /// transition's seg-crossing midpoint in source-to-destination order.
    /// A door transition contributes its midpoint twice (once to cross
    /// it, once to mark the wait while it swings open); a lift transition
    /// additionally contributes the destination subsector's own midpoint,
    /// so the returned path tells the bot to stand on the platform rather
    /// than just at the doorway leading to it.
    fn reconstruct(
        &self,
        came_from: &HashMap<SubsectorId, (SubsectorId, Vec2, NavNodeKind)>,
        to: SubsectorId,
        from: SubsectorId,
    ) -> Vec<Vec2> {
        let mut legs = Vec::new();
        let mut cur = to;
        while cur != from {
            let (prev, waypoint, kind) = came_from[&cur];
            legs.push((waypoint, kind, cur));
            cur = prev;
        }
        legs.reverse();

        let mut path = Vec::new();
        for (waypoint, kind, dest) in legs {
            path.push(waypoint);
            match kind {
                NavNodeKind::Door => path.push(waypoint),
                NavNodeKind::Lift => path.push(self.centers[dest.index()]),
                NavNodeKind::Normal | NavNodeKind::Teleport => {}
            }
        }
        path
    }
}

fn nav_kind(line: &crate::world::geometry::Linedef) -> NavNodeKind {
    match line.special {
        1 | 26 | 27 | 28 | 31 | 120 | 121 => NavNodeKind::Door,
        62 | 63 | 88 => NavNodeKind::Lift,
        39 | 97 => NavNodeKind::Teleport,
        _ => NavNodeKind::Normal,
    }
}

/// Additive travel-time cost for stepping from `from_sector` into
/// `to_sector` across an edge of length `length` (map units) and kind
/// `kind`. `None` means the step is impossible: too tall a step with no
/// door/lift to cover it, too little headroom to fit through, or (for a
/// teleport) too little space isn't checked here (the destination isn't
/// known from a seg alone — teleport edges only pay the flat penalty).
fn edge_time(
    length: f32,
    from_sector: &crate::world::geometry::Sector,
    to_sector: &crate::world::geometry::Sector,
    kind: NavNodeKind,
) -> Option<f32> {
    let opening_bottom = from_sector.floor_height.max(to_sector.floor_height);
    let opening_top = from_sector.ceiling_height.min(to_sector.ceiling_height);
    if opening_top - opening_bottom < MIN_CLEARANCE {
        return None;
    }

    let step_up = to_sector.floor_height - from_sector.floor_height;
    if step_up > MAX_STEP_UP && !matches!(kind, NavNodeKind::Door | NavNodeKind::Lift) {
        return None;
    }

    let mut time = length / RUNNING_SPEED;
    match kind {
        NavNodeKind::Door => time += DOOR_PENALTY,
        NavNodeKind::Lift => time += LIFT_PENALTY,
        NavNodeKind::Teleport => time += TELEPORT_PENALTY,
        NavNodeKind::Normal => {}
    }

    let drop = -step_up;
    if drop > FALL_THRESHOLD {
        let tics = (2.0 * drop / super::movement::GRAVITY).sqrt();
        time += tics / super::tic::SIM_FPS as f32;
    }

    Some(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::geometry::{
        Aabb, Blockmap, Linedef, LinedefFlags, Node, Sector, Seg, Sidedef, SlopeType, Subsector as SubsectorRec,
        Vertex, NF_SUBSECTOR,
    };
    use crate::world::ids::{LinedefId, NONE_ID, SectorId, SegmentId, SidedefId, SubsectorId as SsId, VertexId};
    use crate::world::texture::NO_TEXTURE;

    fn two_room_level(special: u16, front_ceiling: f32, back_ceiling: f32, back_floor: f32) -> Level {
        let verts = vec![
            Vertex { pos: Vec2::new(0.0, 0.0) },
            Vertex { pos: Vec2::new(128.0, 0.0) },
            Vertex { pos: Vec2::new(128.0, 128.0) },
            Vertex { pos: Vec2::new(0.0, 128.0) },
            Vertex { pos: Vec2::new(256.0, 128.0) },
        ];
        let sidedef_a = Sidedef {
            base_offset: Default::default(),
            upper: NO_TEXTURE,
            lower: NO_TEXTURE,
            middle: NO_TEXTURE,
            sector: SectorId(0),
            translucency: 255,
            light_override: None,
        };
        let sidedef_b = Sidedef {
            base_offset: Default::default(),
            upper: NO_TEXTURE,
            lower: NO_TEXTURE,
            middle: NO_TEXTURE,
            sector: SectorId(1),
            translucency: 255,
            light_override: None,
        };
        let shared_line = Linedef {
            v1: VertexId(1),
            v2: VertexId(2),
            delta: Vec2::ZERO,
            slope_type: SlopeType::Vertical,
            flags: LinedefFlags::TWO_SIDED,
            special,
            tag: 0,
            right_sidedef: Some(SidedefId(0)),
            left_sidedef: Some(SidedefId(1)),
            slider: None,
        };
        let segs = vec![
            Seg {
                v1: VertexId(1),
                v2: VertexId(2),
                linedef: Some(LinedefId(0)),
                dir: 0,
                offset: 0.0,
                front_subsector: SsId(0),
                back_subsector: Some(SsId(1)),
            },
            Seg {
                v1: VertexId(2),
                v2: VertexId(1),
                linedef: Some(LinedefId(0)),
                dir: 1,
                offset: 0.0,
                front_subsector: SsId(1),
                back_subsector: Some(SsId(0)),
            },
        ];
        let sector_a = Sector {
            floor_height: 0.0,
            ceiling_height: front_ceiling,
            floor_tex: NO_TEXTURE,
            ceil_tex: NO_TEXTURE,
            light: 200,
            special: 0,
            tag: 0,
            lines: vec![],
            subsectors: vec![],
            controls: vec![],
        };
        let sector_b = Sector {
            floor_height: back_floor,
            ceiling_height: back_ceiling,
            ..sector_a.clone()
        };
        let node = Node {
            x: 128.0,
            y: 0.0,
            dx: 0.0,
            dy: 1.0,
            bbox: [
                Aabb { min: Vec2::ZERO, max: Vec2::new(128.0, 128.0) },
                Aabb { min: Vec2::new(128.0, 0.0), max: Vec2::new(256.0, 128.0) },
            ],
            child: [0 | NF_SUBSECTOR, 1 | NF_SUBSECTOR],
        };
        let mut level = Level {
            name: "TEST".into(),
            things: vec![],
            linedefs: vec![shared_line],
            sidedefs: vec![sidedef_a, sidedef_b],
            vertices: verts,
            segs,
            subsectors: vec![
                SubsectorRec { seg_count: 1, first_seg: SegmentId(0) },
                SubsectorRec { seg_count: 1, first_seg: SegmentId(1) },
            ],
            nodes: vec![node],
            sectors: vec![sector_a, sector_b],
            extrafloors: vec![],
            blockmap: Blockmap { origin: Vec2::ZERO, width: 2, height: 1, lines: vec![vec![], vec![]] },
            sector_of_subsector: vec![],
        };
        level.finalise();
        level
    }

    #[test]
    fn finds_path_across_shared_seg() {
        let level = two_room_level(0, 128.0, 128.0, 0.0);
        let graph = NavGraph::build(&level);
        let path = graph.find_path(SsId(0), SsId(1)).expect("path should exist");
        assert_eq!(path.len(), 1);
        assert_eq!(path[0], Vec2::new(128.0, 64.0));
    }

    #[test]
    fn find_nearest_locates_target_predicate() {
        let level = two_room_level(0, 128.0, 128.0, 0.0);
        let graph = NavGraph::build(&level);
        let found = graph.find_nearest(SsId(0), 1000.0, |n| n == SsId(1));
        assert_eq!(found, Some(SsId(1)));
    }

    /// Scenario #4: a manual door (back ceiling 72, front ceiling 128,
    /// back floor 0) costs length/450 + 2s and its path carries two
    /// waypoints, both on the door's midpoint.
    #[test]
    fn path_through_a_door_matches_spec_scenario() {
        let level = two_room_level(1, 128.0, 72.0, 0.0);
        let graph = NavGraph::build(&level);
        let path = graph.find_path(SsId(0), SsId(1)).expect("path should exist");

        let expected_cost = 128.0 / RUNNING_SPEED + DOOR_PENALTY;

        assert_eq!(path.len(), 2);
        assert_eq!(path[0], path[1]);
        assert_eq!(path[0], Vec2::new(128.0, 64.0));

        // Cross-check the cost directly against the edge model.
        let front = &level.sectors[0];
        let back = &level.sectors[1];
        let cost = edge_time(128.0, front, back, NavNodeKind::Door).unwrap();
        assert!((cost - expected_cost).abs() < 1e-4);
    }

    #[test]
    fn a_too_tall_step_with_no_door_or_lift_is_impossible() {
        let level = two_room_level(0, 128.0, 128.0, 40.0);
        let front = &level.sectors[0];
        let back = &level.sectors[1];
        assert!(edge_time(128.0, front, back, NavNodeKind::Normal).is_none());
    }
}
