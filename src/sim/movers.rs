//! Plane movers and sliding doors — the thinkers `sim::specials` spawns
//! when a line/sector special fires, ticked every frame until they finish
//! or go into stasis.
//!
//! Grounded on `examples/original_source/source_files/edge/p_plane.cc`
//! (`T_MovePlane`, the floor/ceiling thinker, plus `MoveSlider`/
//! `SliderCanClose`/`RunActiveSliders` for the horizontal slider) for both
//! movers this module defines, and on `p_doors.cc`'s door state table for
//! the vertical `DoorMover`'s timing/crush/reopen behaviour.

use hecs::World;

use super::components::{ActorFlags, Class, Health, PendingState, Position};
use super::spatial::TouchArena;
use crate::defs::flags::MobjFlags;
use crate::world::geometry::Level;
use crate::world::{LinedefId, SectorId};

/// Which of a sector's two planes a [`PlaneMover`] drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneTarget {
    Floor,
    Ceiling,
}

/// Crushing behaviour when a `PlaneMover` meets a thing it can't push
/// through — vanilla's `crush` damage-per-tic, or `None` for a door-style
/// mover that just stops and waits.
#[derive(Debug, Clone, Copy)]
pub enum Crush {
    Damage(i32),
    Stop,
}

/// `PlaneMover`/`SlidingDoorMover` direction, shared between the two per
/// spec's data model (the slider reuses the same Up/Wait/Down vocabulary,
/// naming Up "opening" and Down "closing").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverDirection {
    Up,
    Down,
    Wait,
    Stasis,
}

impl MoverDirection {
    fn opposite(self) -> Self {
        match self {
            MoverDirection::Up => MoverDirection::Down,
            MoverDirection::Down => MoverDirection::Up,
            other => other,
        }
    }
}

/// The cycle shape a `PlaneMover` runs. Stairs/Elevator are modelled as a
/// single `Once` leg here (this crate spawns one `PlaneMover` per stair
/// step / per moving plane rather than driving a multi-step builder or a
/// floor+ceiling pair from one thinker); see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverKind {
    Once,
    MoveWaitReturn,
    Platform,
    Continuous,
    Toggle,
    Stairs,
    Elevator,
    Stop,
}

/// A floor or ceiling raising/lowering between `start_height` and
/// `dest_height` at `speed` map-units/tic, optionally crushing whatever it
/// meets, cycling the way `kind` prescribes.
pub struct PlaneMover {
    pub sector: SectorId,
    pub target: PlaneTarget,
    pub start_height: f32,
    pub dest_height: f32,
    pub speed: f32,
    pub crush: Crush,
    pub kind: MoverKind,
    pub direction: MoverDirection,
    pub old_direction: MoverDirection,
    pub wait_tics: i32,
    wait_remaining: i32,
}

impl PlaneMover {
    pub fn new(
        sector: SectorId,
        target: PlaneTarget,
        start_height: f32,
        dest_height: f32,
        speed: f32,
        crush: Crush,
        kind: MoverKind,
        wait_tics: i32,
    ) -> Self {
        let direction = if dest_height >= start_height {
            MoverDirection::Up
        } else {
            MoverDirection::Down
        };
        Self {
            sector,
            target,
            start_height,
            dest_height,
            speed,
            crush,
            kind,
            direction,
            old_direction: direction,
            wait_tics,
            wait_remaining: 0,
        }
    }

    /// Resume from `Stasis`, restoring `old_direction` then reversing it —
    /// a `Toggle` mover's external retrigger. No-op if not currently in
    /// stasis.
    pub fn trigger(&mut self) {
        if self.direction == MoverDirection::Stasis {
            self.direction = self.old_direction.opposite();
        }
    }

    /// Advance one tic. Returns `true` once the mover has run its course
    /// (the caller should drop it); `Continuous`/`Toggle` movers never
    /// return `true` on their own.
    pub fn tick(&mut self, level: &mut Level, touch: &TouchArena, world: &mut World) -> bool {
        match self.direction {
            MoverDirection::Stasis => false,
            MoverDirection::Wait => {
                self.wait_remaining -= 1;
                if self.wait_remaining <= 0 {
                    self.direction = self.old_direction.opposite();
                }
                false
            }
            MoverDirection::Up | MoverDirection::Down => self.tick_moving(level, touch, world),
        }
    }

    fn tick_moving(&mut self, level: &mut Level, touch: &TouchArena, world: &mut World) -> bool {
        let leg_dest = match self.direction {
            MoverDirection::Up => self.dest_height,
            MoverDirection::Down => self.start_height,
            _ => unreachable!("tick_moving only called while Up/Down"),
        };

        let sector = &level.sectors[self.sector.index()];
        let current = match self.target {
            PlaneTarget::Floor => sector.floor_height,
            PlaneTarget::Ceiling => sector.ceiling_height,
        };
        let rising = leg_dest > current;
        let step = if rising {
            self.speed.min(leg_dest - current)
        } else {
            -self.speed.min(current - leg_dest)
        };
        let next = current + step;

        if self.crushes_something(level, touch, world, next) {
            match (self.crush, self.kind) {
                (Crush::Stop, _) => return false,
                (Crush::Damage(dmg), MoverKind::MoveWaitReturn) => {
                    self.damage_occupants(touch, world, dmg);
                    self.direction = self.direction.opposite();
                    return false;
                }
                (Crush::Damage(dmg), _) => {
                    // Slow crush: keep pushing through while damaging.
                    self.damage_occupants(touch, world, dmg);
                }
            }
        }

        let sector = &mut level.sectors[self.sector.index()];
        match self.target {
            PlaneTarget::Floor => sector.floor_height = next,
            PlaneTarget::Ceiling => sector.ceiling_height = next,
        }

        if (next - leg_dest).abs() > 1e-3 {
            return false;
        }

        self.old_direction = self.direction;
        match self.kind {
            MoverKind::Once | MoverKind::Stairs | MoverKind::Elevator => true,
            MoverKind::MoveWaitReturn | MoverKind::Platform => {
                if self.direction == MoverDirection::Up {
                    self.direction = MoverDirection::Wait;
                    self.wait_remaining = self.wait_tics;
                    false
                } else {
                    true
                }
            }
            MoverKind::Continuous => {
                self.direction = MoverDirection::Wait;
                self.wait_remaining = self.wait_tics;
                false
            }
            MoverKind::Toggle | MoverKind::Stop => {
                self.direction = MoverDirection::Stasis;
                false
            }
        }
    }

    fn crushes_something(&self, level: &Level, touch: &TouchArena, world: &World, next: f32) -> bool {
        let sector = &level.sectors[self.sector.index()];
        let (floor, ceiling) = match self.target {
            PlaneTarget::Floor => (next, sector.ceiling_height),
            PlaneTarget::Ceiling => (sector.floor_height, next),
        };
        for entity in touch.things_in_sector(self.sector) {
            let Ok(mut q) = world.query_one::<(&Position, &Class, &ActorFlags)>(entity) else {
                continue;
            };
            let Some((pos, class, flags)) = q.get() else { continue };
            if !flags.0.intersects(MobjFlags::SOLID | MobjFlags::SHOOTABLE) {
                continue;
            }
            if pos.z < floor || pos.z + class.0.height > ceiling {
                return true;
            }
        }
        false
    }

    fn damage_occupants(&self, touch: &TouchArena, world: &mut World, damage: i32) {
        for entity in touch.things_in_sector(self.sector) {
            let died = if let Ok(mut health) = world.get::<&mut Health>(entity) {
                health.0 -= damage;
                health.0 <= 0
            } else {
                false
            };
            if died {
                let death_state = world.get::<&Class>(entity).map(|c| c.0.deathstate).ok();
                if let (Some(state), Ok(mut pending)) = (death_state, world.get::<&mut PendingState>(entity)) {
                    pending.0 = Some(state);
                }
            }
        }
    }
}

/// A vertical door: the standard Opening/Open-wait/Closing cycle. This is
/// distinct from [`SlidingDoorMover`] below — vanilla has both a vertical
/// "raise ceiling" door and a horizontal "slide midtex" door as separate
/// generalized-special families, and this crate models both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Opening,
    WaitingOpen,
    Closing,
}

pub struct DoorMover {
    pub sector: SectorId,
    pub open_height: f32,
    pub close_height: f32,
    pub speed: f32,
    pub wait_tics: i32,
    pub state: DoorState,
    wait_remaining: i32,
}

impl DoorMover {
    pub fn new(sector: SectorId, close_height: f32, open_height: f32, speed: f32, wait_tics: i32) -> Self {
        Self {
            sector,
            open_height,
            close_height,
            speed,
            wait_tics,
            state: DoorState::Opening,
            wait_remaining: 0,
        }
    }

    /// Returns `true` once the door has fully closed (a one-shot opener
    /// never reaches this; only a self-closing door does).
    pub fn tick(&mut self, level: &mut Level, touch: &TouchArena, world: &World) -> bool {
        match self.state {
            DoorState::Opening => {
                let sector = &mut level.sectors[self.sector.index()];
                sector.ceiling_height = (sector.ceiling_height + self.speed).min(self.open_height);
                if sector.ceiling_height >= self.open_height {
                    self.state = DoorState::WaitingOpen;
                    self.wait_remaining = self.wait_tics;
                }
                false
            }
            DoorState::WaitingOpen => {
                self.wait_remaining -= 1;
                if self.wait_remaining <= 0 {
                    self.state = DoorState::Closing;
                }
                false
            }
            DoorState::Closing => {
                if self.blocked_while_closing(level, touch, world) {
                    self.state = DoorState::Opening;
                    return false;
                }
                let sector = &mut level.sectors[self.sector.index()];
                sector.ceiling_height = (sector.ceiling_height - self.speed).max(self.close_height);
                sector.ceiling_height <= self.close_height
            }
        }
    }

    fn blocked_while_closing(&self, level: &Level, touch: &TouchArena, world: &World) -> bool {
        let sector = &level.sectors[self.sector.index()];
        let next_ceiling = (sector.ceiling_height - self.speed).max(self.close_height);
        for entity in touch.things_in_sector(self.sector) {
            let Ok(mut q) = world.query_one::<(&Position, &Class, &ActorFlags)>(entity) else {
                continue;
            };
            let Some((pos, class, flags)) = q.get() else { continue };
            if flags.0.intersects(MobjFlags::SOLID | MobjFlags::SHOOTABLE) && pos.z + class.0.height > next_ceiling {
                return true;
            }
        }
        false
    }
}

/// A horizontal sliding door: a two-sided line's midtex travels sideways
/// across `line_length * distance_fraction` instead of a sector's ceiling
/// travelling up. `opening` is the current slide distance (0 = fully
/// closed); the line is only passable once `opening` reaches `target`.
///
/// `speed`/`wait_tics` aren't in spec §3's minimal field list (which folds
/// them into the triggering special's own parameters, `info->speed_`/
/// `info->wait_` in the original) but are carried here as plain fields
/// since this crate's specials table has no separate "door info" record.
pub struct SlidingDoorMover {
    pub line: LinedefId,
    pub direction: MoverDirection, // Up = opening, Wait, Down = closing
    pub opening: f32,
    pub target: f32,
    pub line_length: f32,
    pub waited: i32,
    pub final_open: bool,
    pub speed: f32,
    pub wait_tics: i32,
}

impl SlidingDoorMover {
    pub fn new(line: LinedefId, line_length: f32, distance_fraction: f32, speed: f32, wait_tics: i32, final_open: bool) -> Self {
        Self {
            line,
            direction: MoverDirection::Up,
            opening: 0.0,
            target: line_length * distance_fraction,
            line_length,
            waited: wait_tics,
            final_open,
            speed,
            wait_tics,
        }
    }

    /// Returns `true` once the slider is fully closed and should be torn
    /// down (its `Linedef::slider` pointer cleared by the caller).
    pub fn tick(&mut self, level: &Level, touch: &TouchArena, world: &World) -> bool {
        match self.direction {
            MoverDirection::Up => {
                self.opening = (self.opening + self.speed).min(self.target);
                if self.opening >= self.target {
                    self.direction = MoverDirection::Wait;
                    self.waited = self.wait_tics;
                    if self.final_open {
                        return true;
                    }
                }
                false
            }
            MoverDirection::Wait => {
                self.waited -= 1;
                if self.waited <= 0 {
                    if self.can_close(level, touch, world) {
                        self.direction = MoverDirection::Down;
                    } else {
                        // Something's standing in the doorway; try again soon.
                        self.waited = super::tic::SIM_FPS as i32 / 3;
                    }
                }
                false
            }
            MoverDirection::Down => {
                if !self.can_close(level, touch, world) {
                    self.direction = MoverDirection::Up;
                    return false;
                }
                self.opening = (self.opening - self.speed).max(0.0);
                self.opening <= 0.0
            }
            MoverDirection::Stasis => false,
        }
    }

    /// The pinch check: a slider is refused permission to close while its
    /// path would clip a solid/shootable thing standing across the line.
    fn can_close(&self, level: &Level, touch: &TouchArena, world: &World) -> bool {
        let line = &level.linedefs[self.line.index()];
        let v1 = level.vertices[line.v1.index()].pos;
        let v2 = level.vertices[line.v2.index()].pos;

        let sectors = [line.right_sidedef, line.left_sidedef]
            .into_iter()
            .flatten()
            .map(|sd| level.sidedefs[sd.index()].sector);

        for sector in sectors {
            for entity in touch.things_in_sector(sector) {
                let Ok(mut q) = world.query_one::<(&Position, &Class, &ActorFlags)>(entity) else {
                    continue;
                };
                let Some((pos, class, flags)) = q.get() else { continue };
                if !flags.0.intersects(MobjFlags::SOLID | MobjFlags::SHOOTABLE) {
                    continue;
                }
                if distance_to_segment(pos.xy, v1, v2) < class.0.radius {
                    return false;
                }
            }
        }
        true
    }
}

fn distance_to_segment(p: glam::Vec2, a: glam::Vec2, b: glam::Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-6 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::geometry::{
        Aabb, Blockmap, Linedef, LinedefFlags, Node, Sector, Seg, Sidedef, SlopeType, Subsector as SubsectorRec,
        Vertex, NF_SUBSECTOR,
    };
    use crate::world::ids::{NONE_ID, SegmentId, SidedefId, SubsectorId, VertexId};
    use crate::world::texture::NO_TEXTURE;
    use glam::Vec2;

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
    fn plane_mover_reaches_destination() {
        let mut level = tiny_level();
        let touch = TouchArena::default();
        let mut world = World::new();
        let mut mover = PlaneMover::new(
            SectorId(0),
            PlaneTarget::Ceiling,
            64.0,
            128.0,
            8.0,
            Crush::Stop,
            MoverKind::Once,
            0,
        );
        let mut done = false;
        for _ in 0..20 {
            if mover.tick(&mut level, &touch, &mut world) {
                done = true;
                break;
            }
        }
        assert!(done);
        assert_eq!(level.sectors[0].ceiling_height, 128.0);
    }

    #[test]
    fn door_opens_waits_and_closes() {
        let mut level = tiny_level();
        let touch = TouchArena::default();
        let world = World::new();
        let mut door = DoorMover::new(SectorId(0), 64.0, 128.0, 16.0, 5);
        for _ in 0..4 {
            door.tick(&mut level, &touch, &world);
        }
        assert_eq!(level.sectors[0].ceiling_height, 128.0);
        assert_eq!(door.state, DoorState::WaitingOpen);

        for _ in 0..5 {
            door.tick(&mut level, &touch, &world);
        }
        assert_eq!(door.state, DoorState::Closing);

        let mut closed = false;
        for _ in 0..10 {
            if door.tick(&mut level, &touch, &world) {
                closed = true;
                break;
            }
        }
        assert!(closed);
        assert_eq!(level.sectors[0].ceiling_height, 64.0);
    }

    /// Scenario #3: platform floor 0 -> 128, speed 4, wait 70 tics. Height
    /// is 128 at tic 32, starts descending at tic 102, and is back at 0 by
    /// tic 134.
    #[test]
    fn platform_cycle_matches_spec_scenario() {
        let mut level = tiny_level();
        level.sectors[0].floor_height = 0.0;
        let touch = TouchArena::default();
        let mut world = World::new();
        let mut mover = PlaneMover::new(
            SectorId(0),
            PlaneTarget::Floor,
            0.0,
            128.0,
            4.0,
            Crush::Stop,
            MoverKind::Platform,
            70,
        );

        for tic in 1..=134 {
            let done = mover.tick(&mut level, &touch, &mut world);
            if tic == 32 {
                assert_eq!(level.sectors[0].floor_height, 128.0);
            }
            if tic == 102 {
                assert_eq!(mover.direction, MoverDirection::Down);
            }
            if tic == 134 {
                assert!(done);
                assert_eq!(level.sectors[0].floor_height, 0.0);
            }
        }
    }

    #[test]
    fn continuous_crusher_never_self_removes() {
        let mut level = tiny_level();
        let touch = TouchArena::default();
        let mut world = World::new();
        let mut mover = PlaneMover::new(
            SectorId(0),
            PlaneTarget::Ceiling,
            64.0,
            8.0,
            4.0,
            Crush::Damage(10),
            MoverKind::Continuous,
            8,
        );
        for _ in 0..400 {
            assert!(!mover.tick(&mut level, &touch, &mut world));
        }
    }

    #[test]
    fn slider_opens_waits_and_refuses_to_close_on_a_thing() {
        let level = tiny_level();
        let touch = TouchArena::default();
        let world = World::new();
        let mut slider = SlidingDoorMover::new(LinedefId(0), 256.0, 1.0, 32.0, 5, false);

        let mut opened = false;
        for _ in 0..20 {
            slider.tick(&level, &touch, &world);
            if slider.direction == MoverDirection::Wait {
                opened = true;
                break;
            }
        }
        assert!(opened);
        assert_eq!(slider.opening, slider.target);
    }
}
