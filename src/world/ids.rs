//! Strongly-typed handles into the arrays owned by [`super::Level`].
//!
//! Vanilla Doom indexes everything with bare `u16`s (or `i16`s once the
//! high bit is borrowed as a leaf marker). We keep the same storage width
//! — levels never exceed 65536 of any one kind of record — but wrap each
//! index family in its own type so `sector[line.id]` typos turn into
//! compile errors instead of three-in-the-morning crashes.

use std::fmt;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub u16);

        impl $name {
            #[inline]
            pub const fn new(v: u16) -> Self {
                Self(v)
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<u16> for $name {
            fn from(v: u16) -> Self {
                Self(v)
            }
        }

        impl From<$name> for usize {
            fn from(v: $name) -> usize {
                v.0 as usize
            }
        }
    };
}

id_type!(VertexId);
id_type!(SectorId);
id_type!(SidedefId);
id_type!(LinedefId);
id_type!(SegmentId);
id_type!(SubsectorId);
id_type!(NodeId);
id_type!(ThingId);
id_type!(ExtrafloorId);

/// Sentinel meaning "no sector"/"no side", mirroring vanilla's `-1` convention
/// on a `u16` field (Doom reserves `0xFFFF` for "none" in most such slots).
pub const NONE_ID: u16 = u16::MAX;
