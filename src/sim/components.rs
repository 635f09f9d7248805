//! hecs components making up a mobj. Spawned as a tuple via
//! [`super::mobj::spawn_mobj`]; no `#[derive(Component)]` needed, `hecs`
//! accepts any `'static` type.

use glam::{Vec2, Vec3};
use hecs::Entity;

use crate::defs::{MobjFlags, MobjInfo, State};
use crate::world::{SectorId, SubsectorId};

/// World-space position. `z` is tracked separately from `xy`, matching the
/// engine's 2.5-D maths (floor/ceiling clip happens on `z` alone).
#[derive(Debug, Clone, Copy)]
pub struct Position {
    pub xy: Vec2,
    pub z: f32,
}

impl Position {
    pub fn new(xy: Vec2, z: f32) -> Self {
        Self { xy, z }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Velocity(pub Vec3);

impl Velocity {
    #[inline]
    pub fn zero_xy(&mut self) {
        self.0.x = 0.0;
        self.0.y = 0.0;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Angle(pub f32);

/// Cached BSP location, refreshed every tick by `sim::spatial`.
#[derive(Debug, Clone, Copy)]
pub struct Subsector(pub SubsectorId);

#[derive(Debug, Copy, Clone)]
pub struct Class(pub &'static MobjInfo);

#[derive(Debug, Clone, Copy)]
pub struct Animation {
    pub state: State,
    pub tics: i32,
}

#[derive(Clone, Copy, Debug)]
pub struct ActorFlags(pub MobjFlags);

#[derive(Debug, Clone, Copy)]
pub struct Health(pub i32);

/// Current melee/missile/sight target, set by AI think, cleared on death.
#[derive(Debug, Clone, Copy, Default)]
pub struct Target(pub Option<Entity>);

/// Vanilla's `reactiontime`/reaction counter — ticks down before a spawned
/// monster starts acting, and is reset whenever it loses its target.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reaction(pub i32);

/// Marks the player-controlled entity; carries the per-tic input command
/// consumed by `sim::player`.
#[derive(Debug, Clone, Copy)]
pub struct PlayerTag {
    pub cmd: InputCmd,
    pub view_height: f32,
    pub standard_view_height: f32,
    pub jumping: bool,
    pub crouching: bool,
    /// Current standing-height fraction, 1.0 upright down to 0.5 fully
    /// crouched; eases toward the commanded posture a step at a time
    /// rather than snapping, vanilla's gradual `mo->height_` shrink.
    pub posture: f32,
    /// Ticks remaining until the player may act on a jump again, vanilla's
    /// `jump_wait_`.
    pub jump_wait: i32,
    /// Ticks spent awaiting respawn once dead; `-1` means alive.
    pub respawn_wait: i32,
}

impl Default for PlayerTag {
    fn default() -> Self {
        Self {
            cmd: InputCmd::default(),
            view_height: 0.0,
            standard_view_height: 0.0,
            jumping: false,
            crouching: false,
            posture: 1.0,
            jump_wait: 0,
            respawn_wait: -1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct InputCmd {
    pub forward: f32,       // -1 ..= 1
    pub strafe: f32,        // -1 ..= 1 (left / right)
    pub up: f32,            // -1 ..= 1, swim/fly/ladder vertical move
    pub turn: f32,          // -1 ..= 1 (right / left)
    pub mouselook: f32,     // -1 ..= 1, vertical look delta this tic
    pub run: bool,          // Shift
    pub fire: bool,         // Ctrl
    pub use_act: bool,      // Space
    pub jump: bool,
    pub crouch: bool,
    pub zoom: bool,
    pub weapon: Option<u8>, // 1-7 if pressed this tic
}

/// Mouselook pitch, radians, positive looking up. Separate from [`Angle`]
/// (yaw) since only swim/fly/ladder movement needs it for its direction
/// vector; a renderer would consume it directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pitch(pub f32);

/// Countdown timers for the handful of powerups that change player think
/// behaviour, vanilla's `powers_[]` array narrowed to what `sim::player`
/// actually branches on. Values count down in tics; `-1` (mapped here as
/// `i32::MAX` as "lasts whole level") is not modelled since this crate has
/// no level-transition concept to key it off of (see DESIGN.md).
#[derive(Debug, Clone, Copy, Default)]
pub struct Powerups {
    pub invuln: i32,
    pub infrared: i32,
    pub night_vision: i32,
    pub berserk: i32,
    pub jetpack: i32,
    pub partial_invis: i32,
}

/// Breath remaining while submerged in an airless sector, vanilla's
/// `air_in_lungs_`. Counts down to zero then starts inflicting drowning
/// damage.
#[derive(Debug, Clone, Copy)]
pub struct AirSupply(pub i32);

impl Default for AirSupply {
    fn default() -> Self {
        AirSupply(i32::MAX)
    }
}

/// Armour absorption, vanilla's `armour_points_`/`armour_type_`. Class 1
/// (green) absorbs a third of incoming damage, class 2 (blue) half.
#[derive(Debug, Clone, Copy, Default)]
pub struct Armour {
    pub points: f32,
    pub class: u8,
}

/// Who most recently hurt this player, used by death-think to rotate the
/// corpse's view toward the killer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Attacker(pub Option<Entity>);

/// Secret-sector credit count, plus the sector last credited so crossing
/// back and forth over the same secret doesn't double-count it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretsFound {
    pub count: u32,
    pub last_credited: Option<SectorId>,
}

/// Sampled acoustic environment around the player, refreshed by the 8-ray
/// room-size probe. `room_size` is the averaged ray distance in map units;
/// `outdoor` is true when the probe found open sky overhead; `class` is
/// `room_size` bucketed against the 350/700 thresholds so a synth consumer
/// can pick a reverb preset without re-deriving it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverbZone {
    pub room_size: f32,
    pub outdoor: bool,
    pub class: ReverbSize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReverbSize {
    #[default]
    Small,
    Medium,
    Large,
}

/// On-death deferred gib/respawn bookkeeping, matching the engine's pattern
/// of queuing a state-chain transition rather than mutating animation state
/// mid-collision-resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingState(pub Option<State>);
