//! Static, immutable-after-load map model.
//!
//! Everything that changes tick-to-tick (current sector heights, light
//! level, scroll accumulators, which mobjs are touching which sector) lives
//! in `sim::spatial` instead, keyed by the ids defined here. Keeping the
//! load-time geometry immutable means a `Level` can be shared (`Arc`) across
//! worker threads or cloned cheaply for save-state snapshots without also
//! cloning the simulation.

use bitflags::bitflags;
use glam::Vec2;

use super::ids::{ExtrafloorId, LinedefId, SectorId, SegmentId, SidedefId, SubsectorId, VertexId};
use super::texture::TextureId;

/// One parsed map, ready for `sim` to spawn mobjs into.
#[derive(Debug)]
pub struct Level {
    pub name: String,
    pub things: Vec<Thing>,
    pub linedefs: Vec<Linedef>,
    pub sidedefs: Vec<Sidedef>,
    pub vertices: Vec<Vertex>,
    pub segs: Vec<Seg>,
    pub subsectors: Vec<Subsector>,
    pub nodes: Vec<Node>,
    pub sectors: Vec<Sector>,
    pub extrafloors: Vec<Extrafloor>,
    pub blockmap: Blockmap,
    /// `sector_of_subsector[i]` — filled by [`Level::finalise`].
    pub sector_of_subsector: Vec<SectorId>,
}

/*------------------------- game objects -----------------------------*/

/// A map-editor spawn point: monster, pickup, player start, decoration…
/// Consumed once at level-load time by `sim::mobj::spawn_things`; not
/// touched again afterwards.
#[derive(Clone, Debug)]
pub struct Thing {
    pub pos: Vec2,
    pub angle: f32,    // radians
    pub type_id: u16,  // mobjtype_t index, resolved against defs::mobjinfo
    pub min_skill: u8, // 1 easy .. 5 nightmare
    pub is_deaf: bool, // MF_AMBUSH — doesn't react to sound
    pub multiplayer: bool,
    pub flags: ThingFlags,
}

bitflags! {
    /// MBF21-style extra thing-spawn flags (friend/not-in-coop/…).
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ThingFlags: u16 {
        const NOT_SINGLE   = 0x0001;
        const NOT_DM       = 0x0002;
        const NOT_COOP     = 0x0004;
        const FRIEND       = 0x0008;
    }
}

/*--------------------------- linedefs -------------------------------*/

bitflags! {
    #[derive(Debug, Clone, Copy)]
    pub struct LinedefFlags: u16 {
        const IMPASSABLE      = 0x0001;
        const BLOCK_MONSTERS  = 0x0002;
        const TWO_SIDED       = 0x0004;
        const UPPER_UNPEGGED  = 0x0010;
        const LOWER_UNPEGGED  = 0x0020;
        const SECRET          = 0x0040;
        const BLOCK_SOUND     = 0x0080;
        const NOT_ON_MAP      = 0x0200;
        const ALREADY_ON_MAP  = 0x1000; // editor flag
        // MBF21 generalized bits
        const BLOCK_LAND_MONSTERS = 0x2000;
        const BLOCK_PLAYERS       = 0x4000;
    }
}

/// A line's non-vertical "slope" classification, used to fast-path the
/// blockmap iterator (vertical/horizontal lines need no division).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlopeType {
    Horizontal,
    Vertical,
    Positive,
    Negative,
}

impl SlopeType {
    pub fn classify(delta: Vec2) -> Self {
        if delta.x == 0.0 {
            SlopeType::Vertical
        } else if delta.y == 0.0 {
            SlopeType::Horizontal
        } else if delta.y / delta.x > 0.0 {
            SlopeType::Positive
        } else {
            SlopeType::Negative
        }
    }
}

#[derive(Clone, Debug)]
pub struct Linedef {
    pub v1: VertexId,
    pub v2: VertexId,
    pub delta: Vec2,
    pub slope_type: SlopeType,
    pub flags: LinedefFlags,
    pub special: u16,
    pub tag: u16,
    pub right_sidedef: Option<SidedefId>,
    pub left_sidedef: Option<SidedefId>,
    /// Sliding-door state machine id, set only on lines whose special opens
    /// a "sliding door" rather than a vertical one (Boom generalized doors).
    pub slider: Option<u16>,
}

impl Linedef {
    pub fn two_sided(&self) -> bool {
        self.right_sidedef.is_some() && self.left_sidedef.is_some()
    }
}

/*--------------------------- sidedefs -------------------------------*/

/// Base (load-time) scroll offsets for one side's textures. Runtime
/// accumulation (old/current/delta for interpolated rendering, plus
/// Boom-style scroller specials) lives in `sim::specials::ScrollState`,
/// indexed by `SidedefId`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScrollOffset {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug)]
pub struct Sidedef {
    pub base_offset: ScrollOffset,
    pub upper: TextureId,
    pub lower: TextureId,
    pub middle: TextureId,
    pub sector: SectorId,
    /// Boom "translucent line" alpha override, 0 = opaque.
    pub translucency: u8,
    /// Per-side light override (255 = use sector light, else absolute).
    pub light_override: Option<u8>,
}

/*----------------------- simple primitives --------------------------*/

#[derive(Clone, Copy, Debug)]
pub struct Vertex {
    pub pos: Vec2,
}

#[derive(Clone, Debug)]
pub struct Seg {
    pub v1: VertexId,
    pub v2: VertexId,
    /// `None` for a BSP "miniseg" (partition-only, no wall to draw/collide).
    pub linedef: Option<LinedefId>,
    pub dir: u16,
    pub offset: f32,
    pub front_subsector: SubsectorId,
    pub back_subsector: Option<SubsectorId>,
}

#[derive(Clone, Debug)]
pub struct Subsector {
    pub seg_count: u16,
    pub first_seg: SegmentId,
}

/// Axis-aligned bounding box (map units).
#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub bbox: [Aabb; 2],
    /// Child indices — bit 15 set ⇒ child is a subsector (vanilla encoding,
    /// kept so the WAD loader doesn't need to rewrite the NODES lump).
    pub child: [u16; 2],
}

pub const NF_SUBSECTOR: u16 = 0x8000;
pub const NF_CHILD_MASK: u16 = 0x7FFF;

impl Node {
    /// 0 = *front* of splitter, 1 = *back*.
    #[inline(always)]
    pub fn point_side(&self, p: Vec2) -> usize {
        if self.dx == 0.0 {
            return if p.x <= self.x {
                (self.dy > 0.0) as usize
            } else {
                (self.dy < 0.0) as usize
            };
        }
        if self.dy == 0.0 {
            return if p.y <= self.y {
                (self.dx < 0.0) as usize
            } else {
                (self.dx > 0.0) as usize
            };
        }
        let d = (p.x - self.x) * self.dy - (p.y - self.y) * self.dx;
        (d < 0.0) as usize
    }
}

/// A 3D-floor slab: the region between `bottom_height` and `top_height` of
/// `control_sector`'s current heights, hosted inside `host_sector`. Doors a
/// thing can stand on top of, or swim/crawl beneath, without a "gap" proper.
#[derive(Clone, Debug)]
pub struct Extrafloor {
    pub host_sector: SectorId,
    pub control_sector: SectorId,
    pub top_tex: TextureId,
    pub bottom_tex: TextureId,
    pub flags: ExtrafloorFlags,
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ExtrafloorFlags: u8 {
        const SOLID     = 0x01; // things stand on top
        const SWIMMABLE = 0x02; // liquid, things can submerge into it
        const TRANSLUCENT = 0x04;
    }
}

#[derive(Clone, Debug)]
pub struct Sector {
    pub floor_height: f32,
    pub ceiling_height: f32,
    pub floor_tex: TextureId,
    pub ceil_tex: TextureId,
    pub light: u8,
    pub special: u16,
    pub tag: u16,
    /// Linedefs bordering this sector (either side), cached at `finalise`.
    pub lines: Vec<LinedefId>,
    /// Subsectors that carve up this sector's floor area.
    pub subsectors: Vec<SubsectorId>,
    /// Extrafloors whose control sector is *this* sector (i.e. this sector
    /// defines the slab, it doesn't host it).
    pub controls: Vec<ExtrafloorId>,
}

/*--------------------------- blockmap --------------------------------*/

/// Size of one spatial hash cell, in map units (vanilla: 128).
pub const BLOCK_SIZE: f32 = 128.0;

/// Load-time line spatial index. The parallel "which things are in this
/// cell" grid is rebuilt every tick by `sim::spatial` since mobjs move;
/// only the static line grid belongs here.
#[derive(Debug, Default)]
pub struct Blockmap {
    pub origin: Vec2,
    pub width: i32,
    pub height: i32,
    pub lines: Vec<Vec<LinedefId>>,
}

impl Blockmap {
    #[inline]
    pub fn cell_of(&self, p: Vec2) -> (i32, i32) {
        (
            ((p.x - self.origin.x) / BLOCK_SIZE).floor() as i32,
            ((p.y - self.origin.y) / BLOCK_SIZE).floor() as i32,
        )
    }

    #[inline]
    pub fn in_bounds(&self, bx: i32, by: i32) -> bool {
        bx >= 0 && by >= 0 && bx < self.width && by < self.height
    }

    pub fn cell(&self, bx: i32, by: i32) -> &[LinedefId] {
        if !self.in_bounds(bx, by) {
            return &[];
        }
        &self.lines[(by * self.width + bx) as usize]
    }
}

/*====================================================================*/
/*                       BSP / query helpers                          */
/*====================================================================*/

impl Level {
    /// Index of the BSP root (`nodes.len()-1` in vanilla node trees).
    #[inline(always)]
    pub fn bsp_root(&self) -> u16 {
        assert!(!self.nodes.is_empty(), "level has no BSP nodes");
        (self.nodes.len() - 1) as u16
    }

    /// Walk the BSP and return the subsector containing `p`.
    pub fn locate_subsector(&self, p: Vec2) -> SubsectorId {
        let mut idx = self.bsp_root();
        loop {
            let node = &self.nodes[idx as usize];
            let child = node.child[node.point_side(p)];
            if child & NF_SUBSECTOR != 0 {
                return SubsectorId(child & NF_CHILD_MASK);
            }
            idx = child;
        }
    }

    /// Populate `sector_of_subsector`, each sector's `subsectors`/`lines`
    /// back-references, and each linedef's `delta`/`slope_type`. Call once
    /// after the raw lumps are converted into this struct.
    pub fn finalise(&mut self) {
        for ld in &mut self.linedefs {
            let delta = self.vertices[ld.v2.index()].pos - self.vertices[ld.v1.index()].pos;
            ld.delta = delta;
            ld.slope_type = SlopeType::classify(delta);
        }

        self.sector_of_subsector = vec![SectorId(0); self.subsectors.len()];
        for (i, ss) in self.subsectors.iter().enumerate() {
            let seg = &self.segs[ss.first_seg.index()];
            let sector = seg
                .linedef
                .and_then(|ld_id| {
                    let ld = &self.linedefs[ld_id.index()];
                    let side = if seg.dir == 0 {
                        ld.right_sidedef
                    } else {
                        ld.left_sidedef
                    };
                    side.map(|s| self.sidedefs[s.index()].sector)
                })
                .unwrap_or(SectorId(0));
            self.sector_of_subsector[i] = sector;
            self.sectors[sector.index()].subsectors.push(SubsectorId(i as u16));
        }

        for (i, ld) in self.linedefs.iter().enumerate() {
            for side in [ld.right_sidedef, ld.left_sidedef].into_iter().flatten() {
                let sector = self.sidedefs[side.index()].sector;
                self.sectors[sector.index()].lines.push(LinedefId(i as u16));
            }
        }

        for (i, ef) in self.extrafloors.iter().enumerate() {
            self.sectors[ef.control_sector.index()]
                .controls
                .push(ExtrafloorId(i as u16));
        }
    }

    /// Sector a subsector belongs to (valid only after [`Level::finalise`]).
    pub fn sector_of(&self, ss: SubsectorId) -> SectorId {
        self.sector_of_subsector[ss.index()]
    }

    /// Iterate the seg indices forming subsector `ss`.
    pub fn segs_of_subsector(&self, ss: SubsectorId) -> impl Iterator<Item = SegmentId> + '_ {
        let s = &self.subsectors[ss.index()];
        let start = s.first_seg.index();
        let end = start + s.seg_count as usize;
        (start..end).map(|i| SegmentId(i as u16))
    }

    /// Every unique linedef whose blockmap cells overlap `bbox`, vanilla's
    /// `P_BlockLinesIterator` restricted to an AABB rather than one cell.
    /// Stops early (returns `false`) the moment `func` does.
    pub fn block_lines_iter<F>(&self, bbox: Aabb, mut func: F) -> bool
    where
        F: FnMut(&Linedef, LinedefId) -> bool,
    {
        let bm = &self.blockmap;
        if bm.width <= 0 || bm.height <= 0 {
            return true;
        }
        let (bx1, by1) = bm.cell_of(bbox.min);
        let (bx2, by2) = bm.cell_of(bbox.max);
        let bx1 = bx1.clamp(0, bm.width - 1);
        let bx2 = bx2.clamp(0, bm.width - 1);
        let by1 = by1.clamp(0, bm.height - 1);
        let by2 = by2.clamp(0, bm.height - 1);

        let mut visited = vec![false; self.linedefs.len()];
        for by in by1..=by2 {
            for bx in bx1..=bx2 {
                for &id in bm.cell(bx, by) {
                    if visited[id.index()] {
                        continue;
                    }
                    visited[id.index()] = true;
                    if !func(&self.linedefs[id.index()], id) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_level() -> Level {
        // A single 256x256 square sector, no internal splits: one subsector,
        // one (degenerate) leaf node tree isn't realistic, so we build a
        // two-node tree splitting the square down the middle (x=128).
        let vertices = vec![
            Vertex { pos: Vec2::new(0.0, 0.0) },
            Vertex { pos: Vec2::new(256.0, 0.0) },
            Vertex { pos: Vec2::new(256.0, 256.0) },
            Vertex { pos: Vec2::new(0.0, 256.0) },
        ];
        let sectors = vec![Sector {
            floor_height: 0.0,
            ceiling_height: 128.0,
            floor_tex: 0,
            ceil_tex: 0,
            light: 200,
            special: 0,
            tag: 0,
            lines: Vec::new(),
            subsectors: Vec::new(),
            controls: Vec::new(),
        }];
        let sidedefs = vec![Sidedef {
            base_offset: ScrollOffset::default(),
            upper: 0,
            lower: 0,
            middle: 0,
            sector: SectorId(0),
            translucency: 0,
            light_override: None,
        }];
        let linedefs = vec![Linedef {
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
        }];
        let segs = vec![
            Seg {
                v1: VertexId(0),
                v2: VertexId(1),
                linedef: Some(LinedefId(0)),
                dir: 0,
                offset: 0.0,
                front_subsector: SubsectorId(0),
                back_subsector: None,
            },
            Seg {
                v1: VertexId(0),
                v2: VertexId(1),
                linedef: Some(LinedefId(0)),
                dir: 0,
                offset: 0.0,
                front_subsector: SubsectorId(1),
                back_subsector: None,
            },
        ];
        let subsectors = vec![
            Subsector { seg_count: 1, first_seg: SegmentId(0) },
            Subsector { seg_count: 1, first_seg: SegmentId(1) },
        ];
        // Node splits at x=128: front (side 0) is x<=128 -> subsector 0,
        // back (side 1) is x>128 -> subsector 1.
        let nodes = vec![Node {
            x: 128.0,
            y: 0.0,
            dx: 0.0,
            dy: 1.0,
            bbox: [
                Aabb { min: Vec2::new(0.0, 0.0), max: Vec2::new(128.0, 256.0) },
                Aabb { min: Vec2::new(128.0, 0.0), max: Vec2::new(256.0, 256.0) },
            ],
            child: [0 | NF_SUBSECTOR, 1 | NF_SUBSECTOR],
        }];

        let mut blockmap = Blockmap {
            origin: Vec2::ZERO,
            width: 2,
            height: 2,
            lines: vec![Vec::new(); 4],
        };
        blockmap.lines[0].push(LinedefId(0));

        let mut lvl = Level {
            name: "TEST".into(),
            things: Vec::new(),
            linedefs,
            sidedefs,
            vertices,
            segs,
            subsectors,
            nodes,
            sectors,
            extrafloors: Vec::new(),
            blockmap,
            sector_of_subsector: Vec::new(),
        };
        lvl.finalise();
        lvl
    }

    #[test]
    fn locate_subsector_respects_split() {
        let lvl = square_level();
        assert_eq!(lvl.locate_subsector(Vec2::new(10.0, 10.0)), SubsectorId(0));
        assert_eq!(lvl.locate_subsector(Vec2::new(200.0, 10.0)), SubsectorId(1));
    }

    #[test]
    fn finalise_links_sector_back_references() {
        let lvl = square_level();
        assert_eq!(lvl.sector_of(SubsectorId(0)), SectorId(0));
        assert_eq!(lvl.sectors[0].subsectors.len(), 2);
        assert_eq!(lvl.sectors[0].lines.len(), 1);
    }

    #[test]
    fn block_lines_iter_visits_each_line_once() {
        let lvl = square_level();
        let mut seen = Vec::new();
        lvl.block_lines_iter(
            Aabb { min: Vec2::new(0.0, 0.0), max: Vec2::new(256.0, 256.0) },
            |_line, id| {
                seen.push(id);
                true
            },
        );
        assert_eq!(seen, vec![LinedefId(0)]);
    }
}
