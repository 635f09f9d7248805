//! Doom **map-lump parser** — builds on [`crate::wad::Wad`].
//!
//! Classic Doom stores each playable map as **eight mandatory lumps**
//! following a *zero-length marker* (`E1M1`, `MAP01`, …):
//!
//! ```text
//! [marker] THINGS LINEDEFS SIDEDEFS VERTEXES SEGS SSECTORS NODES SECTORS
//! ```
//!
//! This module adds two helpers to `Wad`:
//!
//! * `level_indices()` — discover all marker lumps.
//! * `parse_level()`   — decode a single map into strongly-typed Rust
//!   structures.

use crate::wad::Wad;
use byteorder::{LittleEndian as LE, ReadBytesExt};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Cursor, Read};

/// An in-world object: monster, pickup, player start, etc.
#[derive(Clone, Debug)]
pub struct Thing {
    pub x: i16,
    pub y: i16,
    pub angle: u16,
    pub type_: u16,
    pub flags: u16,
}

/// A map edge.
#[derive(Clone, Debug)]
pub struct Linedef {
    pub v1: u16,
    pub v2: u16,
    pub flags: u16,
    pub special: u16,
    pub tag: u16,
    pub right: u16,
    pub left: u16,
}

/// Texture information for one side of a linedef.
#[derive(Clone, Debug)]
pub struct Sidedef {
    pub x_off: i16,
    pub y_off: i16,
    pub upper: [u8; 8],
    pub lower: [u8; 8],
    pub middle: [u8; 8],
    pub sector: u16,
}

/// A vertex in map space.
#[derive(Clone, Debug)]
pub struct Vertex {
    pub x: i16,
    pub y: i16,
}

/// Segment (part of a linedef inside a subsector).
#[derive(Clone, Debug)]
pub struct Seg {
    pub v1: u16,
    pub v2: u16,
    pub angle: i16,
    pub linedef: u16,
    pub dir: u16,
    pub offset: i16,
}

/// BSP leaf.
#[derive(Clone, Debug)]
pub struct Subsector {
    pub seg_count: u16,
    pub first_seg: u16,
}

/// One BSP node that splits space.
#[derive(Clone, Debug)]
pub struct Node {
    pub x: i16,
    pub y: i16,
    pub dx: i16,
    pub dy: i16,
    /// [front: top, bottom, left, right] then [back: …]
    pub bbox: [[i16; 4]; 2],
    /// Child indices — bit 15 set ⇒ child is a subsector.
    pub child: [u16; 2],
}

/// A convex sector region (floor/ceiling/light).
#[derive(Clone, Debug)]
pub struct Sector {
    pub floor: i16,
    pub ceil: i16,
    pub floor_tex: [u8; 8],
    pub ceil_tex: [u8; 8],
    pub light: i16,
    pub special: i16,
    pub tag: i16,
}

/// High-level representation of a playable map.
#[derive(Clone, Debug)]
pub struct Level {
    pub things: Vec<Thing>,
    pub linedefs: Vec<Linedef>,
    pub sidedefs: Vec<Sidedef>,
    pub vertices: Vec<Vertex>,
    pub segs: Vec<Seg>,
    pub subsectors: Vec<Subsector>,
    pub nodes: Vec<Node>,
    pub sectors: Vec<Sector>,
}

/// Things that can go wrong while decoding.
#[derive(thiserror::Error, Debug)]
pub enum LevelError {
    #[error("level marker idx {0} out of range")]
    MarkerOob(usize),
    #[error("required lump {0} missing between markers")]
    Missing(&'static str),
    #[error("truncated lump {0}")]
    Truncated(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/*=======================================================================*/
/*                     Convenience helpers on `Wad`                      */
/*=======================================================================*/
impl Wad {
    /// Return directory indices of every map marker (`E#M#`, `MAP##`).
    pub fn level_indices(&self) -> Vec<usize> {
        static RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^(E[1-4]M[1-9]|MAP[0-3][0-9])$").unwrap());

        self.lumps
            .iter()
            .enumerate()
            .filter(|(_, l)| l.size == 0 && RE.is_match(Wad::lump_name(&l.name)))
            .map(|(i, _)| i)
            .collect()
    }

    /// Deserialize the eight mandatory lumps that form one map.
    pub fn parse_level(&self, marker_idx: usize) -> Result<Level, LevelError> {
        if marker_idx >= self.lumps.len() {
            return Err(LevelError::MarkerOob(marker_idx));
        }

        // ---- work out the map span (up to next zero-length lump) ----------
        let mut span_end = self.lumps.len();
        for i in marker_idx + 1..self.lumps.len() {
            if self.lumps[i].size == 0 {
                span_end = i;
                break;
            }
        }

        // locate lump name inside span → directory index
        let find = |name: &str| -> Option<usize> {
            self.lumps[marker_idx + 1..span_end]
                .iter()
                .position(|l| Wad::lump_name(&l.name) == name)
                .map(|rel| rel + marker_idx + 1)
        };

        // verify mandatory lumps
        const NEED: &[&str] = &[
            "THINGS", "LINEDEFS", "SIDEDEFS", "VERTEXES", "SEGS", "SSECTORS", "NODES", "SECTORS",
        ];
        for &n in NEED {
            if find(n).is_none() {
                return Err(LevelError::Missing(n));
            }
        }

        // helper macro: parse repetitive arrays
        macro_rules! parse_vec {
            ($buf:expr, $size:expr, $body:expr) => {{
                if $buf.len() % $size != 0 {
                    return Err(LevelError::Truncated(stringify!($body)));
                }
                let mut cur = Cursor::new($buf);
                let mut v = Vec::with_capacity($buf.len() / $size);
                while (cur.position() as usize) < $buf.len() {
                    v.push($body(&mut cur)?);
                }
                v
            }};
        }

        // ------------------------------------------------------------------
        // 1. THINGS (10 bytes)
        // ------------------------------------------------------------------
        let things = {
            let buf = self.lump_bytes(find("THINGS").unwrap());
            parse_vec!(buf, 10, |c: &mut Cursor<&[u8]>| -> std::io::Result<Thing> {
                Ok(Thing {
                    x: c.read_i16::<LE>()?,
                    y: c.read_i16::<LE>()?,
                    angle: c.read_u16::<LE>()?,
                    type_: c.read_u16::<LE>()?,
                    flags: c.read_u16::<LE>()?,
                })
            })
        };

        // 2. LINEDEFS (14 bytes)
        let linedefs = {
            let buf = self.lump_bytes(find("LINEDEFS").unwrap());
            parse_vec!(
                buf,
                14,
                |c: &mut Cursor<&[u8]>| -> std::io::Result<Linedef> {
                    Ok(Linedef {
                        v1: c.read_u16::<LE>()?,
                        v2: c.read_u16::<LE>()?,
                        flags: c.read_u16::<LE>()?,
                        special: c.read_u16::<LE>()?,
                        tag: c.read_u16::<LE>()?,
                        right: c.read_u16::<LE>()?,
                        left: c.read_u16::<LE>()?,
                    })
                }
            )
        };

        // 3. SIDEDEFS (30 bytes)
        let sidedefs = {
            let buf = self.lump_bytes(find("SIDEDEFS").unwrap());
            let read_tex = |c: &mut Cursor<&[u8]>| -> std::io::Result<[u8; 8]> {
                let mut t = [0u8; 8];
                c.read_exact(&mut t)?;
                Ok(t)
            };
            parse_vec!(
                buf,
                30,
                |c: &mut Cursor<&[u8]>| -> std::io::Result<Sidedef> {
                    Ok(Sidedef {
                        x_off: c.read_i16::<LE>()?,
                        y_off: c.read_i16::<LE>()?,
                        upper: read_tex(c)?,
                        lower: read_tex(c)?,
                        middle: read_tex(c)?,
                        sector: c.read_u16::<LE>()?,
                    })
                }
            )
        };

        // 4. VERTEXES (4 bytes)
        let vertices = {
            let buf = self.lump_bytes(find("VERTEXES").unwrap());
            parse_vec!(buf, 4, |c: &mut Cursor<&[u8]>| -> std::io::Result<Vertex> {
                Ok(Vertex {
                    x: c.read_i16::<LE>()?,
                    y: c.read_i16::<LE>()?,
                })
            })
        };

        // 5. SEGS (12 bytes)
        let segs = {
            let buf = self.lump_bytes(find("SEGS").unwrap());
            parse_vec!(buf, 12, |c: &mut Cursor<&[u8]>| -> std::io::Result<Seg> {
                Ok(Seg {
                    v1: c.read_u16::<LE>()?,
                    v2: c.read_u16::<LE>()?,
                    angle: c.read_i16::<LE>()?,
                    linedef: c.read_u16::<LE>()?,
                    dir: c.read_u16::<LE>()?,
                    offset: c.read_i16::<LE>()?,
                })
            })
        };

        // 6. SSECTORS (4 bytes)
        let subsectors = {
            let buf = self.lump_bytes(find("SSECTORS").unwrap());
            parse_vec!(
                buf,
                4,
                |c: &mut Cursor<&[u8]>| -> std::io::Result<Subsector> {
                    Ok(Subsector {
                        seg_count: c.read_u16::<LE>()?,
                        first_seg: c.read_u16::<LE>()?,
                    })
                }
            )
        };

        // 7. NODES (28 bytes)
        let nodes = {
            let buf = self.lump_bytes(find("NODES").unwrap());
            parse_vec!(buf, 28, |c: &mut Cursor<&[u8]>| -> std::io::Result<Node> {
                Ok(Node {
                    x: c.read_i16::<LE>()?,
                    y: c.read_i16::<LE>()?,
                    dx: c.read_i16::<LE>()?,
                    dy: c.read_i16::<LE>()?,
                    bbox: [
                        [
                            c.read_i16::<LE>()?,
                            c.read_i16::<LE>()?,
                            c.read_i16::<LE>()?,
                            c.read_i16::<LE>()?,
                        ],
                        [
                            c.read_i16::<LE>()?,
                            c.read_i16::<LE>()?,
                            c.read_i16::<LE>()?,
                            c.read_i16::<LE>()?,
                        ],
                    ],
                    child: [c.read_u16::<LE>()?, c.read_u16::<LE>()?],
                })
            })
        };

        // 8. SECTORS (26 bytes)
        let sectors = {
            let buf = self.lump_bytes(find("SECTORS").unwrap());
            let read_tex = |c: &mut Cursor<&[u8]>| -> std::io::Result<[u8; 8]> {
                let mut t = [0u8; 8];
                c.read_exact(&mut t)?;
                Ok(t)
            };
            parse_vec!(
                buf,
                26,
                |c: &mut Cursor<&[u8]>| -> std::io::Result<Sector> {
                    Ok(Sector {
                        floor: c.read_i16::<LE>()?,
                        ceil: c.read_i16::<LE>()?,
                        floor_tex: read_tex(c)?,
                        ceil_tex: read_tex(c)?,
                        light: c.read_i16::<LE>()?,
                        special: c.read_i16::<LE>()?,
                        tag: c.read_i16::<LE>()?,
                    })
                }
            )
        };

        Ok(Level {
            things,
            linedefs,
            sidedefs,
            vertices,
            segs,
            subsectors,
            nodes,
            sectors,
        })
    }
}

/*=======================================================================*/
/*                                Tests                                  */
/*=======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-assembles a one-room `MAP01` (4 vertices, 4 linedefs, 1 sector,
    /// 1 subsector covering all 4 segs, no internal BSP split) as raw lump
    /// bytes, so tests don't depend on a shipped IWAD.
    fn build_test_wad() -> tempfile::NamedTempFile {
        fn le16(v: i16) -> [u8; 2] {
            v.to_le_bytes()
        }
        fn leu16(v: u16) -> [u8; 2] {
            v.to_le_bytes()
        }
        fn name8(s: &str) -> [u8; 8] {
            let mut n = [0u8; 8];
            let b = s.as_bytes();
            n[..b.len()].copy_from_slice(b);
            n
        }

        let mut things = Vec::new();
        things.extend(le16(64)); // x
        things.extend(le16(64)); // y
        things.extend(leu16(0)); // angle
        things.extend(leu16(1)); // type: player 1 start
        things.extend(leu16(7)); // flags: all-skill, not MP

        let mut linedefs = Vec::new();
        let verts = [(0i16, 0i16), (256, 0), (256, 256), (0, 256)];
        for i in 0..4u16 {
            let v1 = i;
            let v2 = (i + 1) % 4;
            linedefs.extend(leu16(v1));
            linedefs.extend(leu16(v2));
            linedefs.extend(leu16(0x0001)); // IMPASSABLE
            linedefs.extend(leu16(0)); // special
            linedefs.extend(leu16(0)); // tag
            linedefs.extend(leu16(0)); // right sidedef
            linedefs.extend(leu16(0xFFFF)); // left sidedef (none)
        }

        let mut sidedefs = Vec::new();
        for _ in 0..4 {
            sidedefs.extend(le16(0)); // x_off
            sidedefs.extend(le16(0)); // y_off
            sidedefs.extend(name8("-"));
            sidedefs.extend(name8("-"));
            sidedefs.extend(name8("STARTAN3"));
            sidedefs.extend(leu16(0)); // sector
        }

        let mut vertices = Vec::new();
        for (x, y) in verts {
            vertices.extend(le16(x));
            vertices.extend(le16(y));
        }

        let mut segs = Vec::new();
        for i in 0..4u16 {
            let v1 = i;
            let v2 = (i + 1) % 4;
            segs.extend(leu16(v1));
            segs.extend(leu16(v2));
            segs.extend(le16(0)); // angle
            segs.extend(leu16(i)); // linedef
            segs.extend(leu16(0)); // dir
            segs.extend(le16(0)); // offset
        }

        let mut ssectors = Vec::new();
        ssectors.extend(leu16(4)); // seg_count
        ssectors.extend(leu16(0)); // first_seg

        let mut nodes = Vec::new();
        // A single root node is still required by `Level::bsp_root`, even
        // though with one subsector it's never actually descended for this
        // fixture's purposes beyond existing.
        nodes.extend(le16(128));
        nodes.extend(le16(0));
        nodes.extend(le16(0));
        nodes.extend(le16(1));
        for _ in 0..2 {
            nodes.extend(le16(0));
            nodes.extend(le16(256));
            nodes.extend(le16(0));
            nodes.extend(le16(256));
        }
        nodes.extend(leu16(0 | 0x8000));
        nodes.extend(leu16(0 | 0x8000));

        let mut sectors = Vec::new();
        sectors.extend(le16(0)); // floor
        sectors.extend(le16(128)); // ceiling
        sectors.extend(name8("FLOOR4_8"));
        sectors.extend(name8("CEIL3_5"));
        sectors.extend(le16(200)); // light
        sectors.extend(le16(0)); // special
        sectors.extend(le16(0)); // tag

        let lumps: Vec<(&str, &[u8])> = vec![
            ("MAP01", &[]),
            ("THINGS", &things),
            ("LINEDEFS", &linedefs),
            ("SIDEDEFS", &sidedefs),
            ("VERTEXES", &vertices),
            ("SEGS", &segs),
            ("SSECTORS", &ssectors),
            ("NODES", &nodes),
            ("SECTORS", &sectors),
        ];

        const HEADER_LEN: u32 = 12;
        let mut offsets = Vec::with_capacity(lumps.len());
        let mut data = Vec::new();
        for (_, bytes) in &lumps {
            offsets.push(data.len() as u32);
            data.extend_from_slice(bytes);
        }
        let dir_offset = HEADER_LEN + data.len() as u32;

        let mut out = Vec::new();
        out.extend_from_slice(b"IWAD");
        out.extend((lumps.len() as u32).to_le_bytes());
        out.extend(dir_offset.to_le_bytes());
        out.extend_from_slice(&data);
        for ((name, bytes), off) in lumps.iter().zip(&offsets) {
            out.extend((HEADER_LEN + off).to_le_bytes());
            out.extend((bytes.len() as u32).to_le_bytes());
            out.extend(name8(name));
        }

        let f = tempfile::NamedTempFile::new().expect("tempfile");
        std::fs::write(f.path(), &out).unwrap();
        f
    }

    #[test]
    fn first_map_parses() {
        let tmp = build_test_wad();
        let wad = Wad::from_file(tmp.path()).expect("parse wad");
        let first_marker = wad
            .level_indices()
            .first()
            .copied()
            .expect("no map markers found");
        let level = wad.parse_level(first_marker).expect("parse level");
        assert_eq!(level.vertices.len(), 4);
        assert_eq!(level.linedefs.len(), 4);
        assert_eq!(level.things[0].type_, 1, "player 1 start missing?");
    }
}
