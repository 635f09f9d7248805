//! The map runtime: static level data lives in `world`, everything that
//! changes tick to tick lives here — spatial indices, the collision
//! resolver, momentum/state thinkers, movers, specials, navigation, and
//! player input.

mod collision;
mod components;
mod mobj;
mod movement;
mod movers;
mod nav;
mod path;
mod player;
mod rng;
mod spatial;
mod specials;
mod tic;

pub use collision::{
    check_position, height_clip, teleport_move, try_move, CheckPosition, MoveOutcome,
    SlideResult, MAX_MOVE, MAX_STEP_HEIGHT,
};
pub use collision::slide_move;
pub use components::{
    ActorFlags, AirSupply, Angle, Animation, Armour, Attacker, Class, Health, InputCmd,
    PendingState, Pitch, PlayerTag, Position, Powerups, Reaction, ReverbSize, ReverbZone,
    SecretsFound, Subsector, Target, Velocity,
};
pub use mobj::{mark_removed, reap_removed, run_deferred_states, set_state, set_state_deferred, spawn_mobj, Removed};
pub use movement::{run_movement, LineCrossing, GRAVITY};
pub use movers::{Crush, DoorMover, DoorState, MoverDirection, MoverKind, PlaneMover, PlaneTarget, SlidingDoorMover};
pub use nav::{NavGraph, NavNodeKind};
pub use path::{aim_line_of_sight, hitscan, PathHit};
pub use player::player_think;
pub use rng::{CosmeticRng, Rng};
pub use spatial::{ThingGrid, TouchArena, TouchNodeId};
pub use specials::{
    cross_special_lines, resolve_pickups, sector_effect, tick_movers, Force, LightThinker,
    SectorEffect, SpawnedMover,
};
pub use tic::{perpetual_crusher, TicRunner, SIM_FPS};
