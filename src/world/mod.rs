//! Static level model: geometry, BSP, blockmap, texture-name registry.
//!
//! Everything in here is built once (by `wad::load`) and never mutated
//! again; `sim` layers mutable per-tick state on top, keyed by the ids
//! exported from [`ids`].

pub mod geometry;
pub mod ids;
pub mod texture;

pub use geometry::{
    Aabb, Blockmap, Extrafloor, ExtrafloorFlags, Level, Linedef, LinedefFlags, Node, ScrollOffset,
    Sector, Seg, Sidedef, SlopeType, Subsector, Thing, ThingFlags, Vertex, BLOCK_SIZE,
    NF_CHILD_MASK, NF_SUBSECTOR,
};
pub use ids::{
    ExtrafloorId, LinedefId, NodeId, SectorId, SegmentId, SidedefId, SubsectorId, ThingId,
    VertexId, NONE_ID,
};
pub use texture::{TextureBank, TextureId, NO_TEXTURE};
