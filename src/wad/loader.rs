//! Bridges the raw, wad-space lump records in [`crate::wad::level`] into the
//! runtime [`world::geometry::Level`](crate::world::Level), interning
//! texture/flat names through a [`TextureBank`] and building the line
//! blockmap (vanilla ships a precomputed `BLOCKMAP` lump; we rebuild the
//! same spatial hash from the linedefs instead of parsing that lump, which
//! avoids one more binary format for an index we can derive directly).

use glam::vec2;
use thiserror::Error;

use crate::wad::level::{self as raw, LevelError};
use crate::wad::wad::{Wad, WadError};
use crate::world::geometry::{self as geo, BLOCK_SIZE};
use crate::world::ids::NONE_ID;
use crate::world::texture::TextureBank;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Wad(#[from] WadError),
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// Parse the map at `marker` and convert it into a ready-to-simulate
/// [`geo::Level`], interning every texture/flat name it references into
/// `bank`.
pub fn load_level(wad: &Wad, marker: usize, bank: &mut TextureBank) -> Result<geo::Level, LoadError> {
    let raw = wad.parse_level(marker)?;
    let name = Wad::lump_name(&wad.lumps[marker].name).to_string();

    let vertices: Vec<geo::Vertex> = raw
        .vertices
        .iter()
        .map(|v| geo::Vertex {
            pos: vec2(v.x as f32, v.y as f32),
        })
        .collect();

    let things: Vec<geo::Thing> = raw.things.iter().map(thing_from_raw).collect();

    let sidedefs: Vec<geo::Sidedef> = raw
        .sidedefs
        .iter()
        .map(|s| geo::Sidedef {
            base_offset: geo::ScrollOffset {
                x: s.x_off as f32,
                y: s.y_off as f32,
            },
            upper: bank.intern(Wad::lump_name(&s.upper)),
            lower: bank.intern(Wad::lump_name(&s.lower)),
            middle: bank.intern(Wad::lump_name(&s.middle)),
            sector: geo::SectorId(s.sector),
            translucency: 0,
            light_override: None,
        })
        .collect();

    let linedefs: Vec<geo::Linedef> = raw
        .linedefs
        .iter()
        .map(|l| geo::Linedef {
            v1: geo::VertexId(l.v1),
            v2: geo::VertexId(l.v2),
            delta: vec2(0.0, 0.0), // filled in by `finalise`
            slope_type: geo::SlopeType::Horizontal,
            flags: geo::LinedefFlags::from_bits_truncate(l.flags),
            special: l.special,
            tag: l.tag,
            right_sidedef: (l.right != NONE_ID).then_some(geo::SidedefId(l.right)),
            left_sidedef: (l.left != NONE_ID).then_some(geo::SidedefId(l.left)),
            slider: None,
        })
        .collect();

    let segs: Vec<geo::Seg> = raw
        .segs
        .iter()
        .map(|s| geo::Seg {
            v1: geo::VertexId(s.v1),
            v2: geo::VertexId(s.v2),
            linedef: Some(geo::LinedefId(s.linedef)),
            dir: s.dir,
            offset: s.offset as f32,
            front_subsector: geo::SubsectorId(0), // segs don't carry this in vanilla lumps
            back_subsector: None,
        })
        .collect();

    let subsectors: Vec<geo::Subsector> = raw
        .subsectors
        .iter()
        .map(|s| geo::Subsector {
            seg_count: s.seg_count,
            first_seg: geo::SegmentId(s.first_seg),
        })
        .collect();

    let nodes: Vec<geo::Node> = raw
        .nodes
        .iter()
        .map(|n| geo::Node {
            x: n.x as f32,
            y: n.y as f32,
            dx: n.dx as f32,
            dy: n.dy as f32,
            bbox: [raw_bbox(&n.bbox[0]), raw_bbox(&n.bbox[1])],
            child: n.child,
        })
        .collect();

    let sectors: Vec<geo::Sector> = raw
        .sectors
        .iter()
        .map(|s| geo::Sector {
            floor_height: s.floor as f32,
            ceiling_height: s.ceil as f32,
            floor_tex: bank.intern(Wad::lump_name(&s.floor_tex)),
            ceil_tex: bank.intern(Wad::lump_name(&s.ceil_tex)),
            light: (s.light.clamp(0, 255)) as u8,
            special: s.special as u16,
            tag: s.tag as u16,
            lines: Vec::new(),
            subsectors: Vec::new(),
            controls: Vec::new(),
        })
        .collect();

    let blockmap = build_blockmap(&vertices, &linedefs);

    let mut level = geo::Level {
        name,
        things,
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
    level.finalise();
    Ok(level)
}

fn raw_bbox(b: &[i16; 4]) -> geo::Aabb {
    // vanilla order: [top, bottom, left, right] = [ymax, ymin, xmin, xmax]
    geo::Aabb {
        min: vec2(b[2] as f32, b[1] as f32),
        max: vec2(b[3] as f32, b[0] as f32),
    }
}

fn thing_from_raw(t: &raw::Thing) -> geo::Thing {
    let min_skill = match t.flags & 0x0007 {
        0x0001 => 1,
        0x0002 => 2,
        0x0004 => 3,
        _ => 1,
    };
    geo::Thing {
        pos: vec2(t.x as f32, t.y as f32),
        angle: (t.angle as f32).to_radians(),
        type_id: t.type_,
        min_skill,
        is_deaf: t.flags & 0x0008 != 0,
        multiplayer: t.flags & 0x0010 != 0,
        flags: geo::ThingFlags::from_bits_truncate(t.flags >> 5),
    }
}

/// Rebuilds a blockmap (line-only) from scratch by rasterising each
/// linedef's bounding box into the `BLOCK_SIZE` grid, vanilla's own
/// `P_CreateBlockMap` algorithm minus the on-disk lump format.
fn build_blockmap(vertices: &[geo::Vertex], linedefs: &[geo::Linedef]) -> geo::Blockmap {
    if vertices.is_empty() {
        return geo::Blockmap::default();
    }
    let mut min = vertices[0].pos;
    let mut max = vertices[0].pos;
    for v in vertices {
        min = min.min(v.pos);
        max = max.max(v.pos);
    }
    let width = (((max.x - min.x) / BLOCK_SIZE).floor() as i32 + 1).max(1);
    let height = (((max.y - min.y) / BLOCK_SIZE).floor() as i32 + 1).max(1);

    let mut bm = geo::Blockmap {
        origin: min,
        width,
        height,
        lines: vec![Vec::new(); (width * height) as usize],
    };

    for (i, ld) in linedefs.iter().enumerate() {
        let p1 = vertices[ld.v1.index()].pos;
        let p2 = vertices[ld.v2.index()].pos;
        let lo = p1.min(p2);
        let hi = p1.max(p2);
        let (bx1, by1) = bm.cell_of(lo);
        let (bx2, by2) = bm.cell_of(hi);
        for by in by1.clamp(0, height - 1)..=by2.clamp(0, height - 1) {
            for bx in bx1.clamp(0, width - 1)..=bx2.clamp(0, width - 1) {
                bm.lines[(by * width + bx) as usize].push(geo::LinedefId(i as u16));
            }
        }
    }
    bm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_blockmap_covers_full_extent() {
        let vertices = vec![
            geo::Vertex { pos: vec2(0.0, 0.0) },
            geo::Vertex { pos: vec2(300.0, 300.0) },
        ];
        let linedefs = vec![geo::Linedef {
            v1: geo::VertexId(0),
            v2: geo::VertexId(1),
            delta: vec2(300.0, 300.0),
            slope_type: geo::SlopeType::Positive,
            flags: geo::LinedefFlags::IMPASSABLE,
            special: 0,
            tag: 0,
            right_sidedef: None,
            left_sidedef: None,
            slider: None,
        }];
        let bm = build_blockmap(&vertices, &linedefs);
        assert!(bm.width >= 3 && bm.height >= 3);
        assert!(bm.cell(0, 0).contains(&geo::LinedefId(0)));
        assert!(bm.cell(bm.width - 1, bm.height - 1).contains(&geo::LinedefId(0)));
    }

    #[test]
    fn empty_level_yields_default_blockmap() {
        let bm = build_blockmap(&[], &[]);
        assert_eq!(bm.width, 0);
    }
}
