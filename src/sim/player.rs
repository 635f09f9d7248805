//! Player think: turns the per-tic [`InputCmd`] into velocity/facing for
//! `sim::movement`, then layers on the rest of what vanilla's
//! `P_PlayerThink` does to a player entity each tic — crouch, mouselook,
//! sector specials, powerup countdown, death, and the reverb probe.
//!
//! Grounded on `examples/original_source/source_files/edge/p_user.cc`'s
//! `MovePlayer`/`CalcHeight`/`UpdatePowerups`/`DeathThink` and its
//! `P_RoomPath` room-size probe. No weapon/HUD model ships with this crate
//! (see spec Non-goals on full gameplay scripting), but everything else
//! `p_user.cc` does to the player mobj each tic is Core-A simulation and
//! is implemented below, not skipped.

use glam::Vec2;
use hecs::{Entity, World};

use super::components::{
    AirSupply, Angle, Armour, Attacker, Class, Health, InputCmd, Pitch, PlayerTag, Position,
    Powerups, ReverbSize, ReverbZone, SecretsFound, Subsector, Velocity,
};
use super::specials::sector_effect;
use crate::world::geometry::{Aabb, ExtrafloorFlags, Level, Linedef, LinedefFlags};
use crate::world::SectorId;

/// Forward/strafe speed at `InputCmd` magnitude 1.0, in map-units/tic —
/// vanilla's `forwardmove`/`sidemove` run-speed table, run entry.
const RUN_SPEED: f32 = 16.0;
const WALK_SPEED: f32 = 8.0;
const TURN_SPEED: f32 = 0.12; // radians/tic at full turn input
const JUMP_SPEED: f32 = 8.0;
/// Vanilla clamps mouselook pitch to +/-75 degrees.
const MAX_LOOK_PITCH: f32 = 75f32.to_radians();
/// EDGE's `kCrouchSlowdown`.
const CROUCH_SLOWDOWN: f32 = 0.5;
/// Posture eased this much toward its target per tic.
const CROUCH_STEP: f32 = 0.05;
const CROUCH_POSTURE: f32 = 0.5;
/// Ticks a fresh jump blocks another one, vanilla's per-call `jump_wait_`.
const JUMP_COOLDOWN: i32 = 18;
/// Breath lost per tic while submerged in an airless sector.
const DROWN_AIR_LOSS: i32 = 1;
/// How often (in tics) drowning actually applies damage once air runs out.
const DROWN_DAMAGE_PERIOD: u64 = 35;
const DROWN_DAMAGE: i32 = 2;
/// Fraction of incoming damage an armour class absorbs (index by class).
const ARMOUR_SAVE: [f32; 3] = [0.0, 1.0 / 3.0, 0.5];
const REVERB_MAX_RANGE: f32 = 1024.0;
const REVERB_RAY_COUNT: usize = 8;
/// Empirical room-size thresholds separating small/medium/large reverb.
const REVERB_SMALL: f32 = 350.0;
const REVERB_LARGE: f32 = 700.0;

/// Drive every `PlayerTag` entity's heading/velocity/status from its
/// queued `InputCmd`. Call before [`super::movement::run_movement`] each
/// tick.
pub fn player_think(world: &mut World, level: &Level, tic: u64) {
    let players: Vec<Entity> = world
        .query_mut::<&PlayerTag>()
        .into_iter()
        .map(|(e, _)| e)
        .collect();

    for entity in players {
        let dead = world.get::<&Health>(entity).map(|h| h.0 <= 0).unwrap_or(false);
        if dead {
            death_think(world, entity);
        } else {
            think_one(world, level, entity, tic);
        }
        update_powerups(world, entity, dead);
        probe_reverb(world, level, entity);
    }
}

fn think_one(world: &mut World, level: &Level, entity: Entity, tic: u64) {
    // --- read phase: gather everything needed as plain copies ---
    let Ok(cmd) = world.get::<&PlayerTag>(entity).map(|t| t.cmd) else {
        return;
    };
    let Ok(posture) = world.get::<&PlayerTag>(entity).map(|t| t.posture) else {
        return;
    };
    let Ok(jump_wait) = world.get::<&PlayerTag>(entity).map(|t| t.jump_wait) else {
        return;
    };
    let Ok(yaw) = world.get::<&Angle>(entity).map(|a| a.0) else {
        return;
    };
    let Ok(standing_height) = world.get::<&Class>(entity).map(|c| c.0.height) else {
        return;
    };
    let Ok(pos) = world.get::<&Position>(entity).map(|p| *p) else {
        return;
    };
    let Ok(sector) = world.get::<&Subsector>(entity).map(|s| level.sector_of(s.0)) else {
        return;
    };
    let pitch = world.get::<&Pitch>(entity).map(|p| p.0).unwrap_or(0.0);
    let jetpack = world.get::<&Powerups>(entity).map(|p| p.jetpack).unwrap_or(0);

    let s = &level.sectors[sector.index()];
    let onground = pos.z <= s.floor_height + 0.01;
    let swimming = is_swimming(level, sector, pos.z);
    let flying = jetpack > 0 && !swimming;
    // No ladder special is modelled in this crate yet.
    let onladder = false;

    // --- crouch: ease posture toward the commanded target, but refuse to
    // stand back up if the ceiling won't clear a full-height player ---
    let target_posture = if cmd.crouch { CROUCH_POSTURE } else { 1.0 };
    let mut next_posture = if posture < target_posture {
        (posture + CROUCH_STEP).min(target_posture)
    } else {
        (posture - CROUCH_STEP).max(target_posture)
    };
    if next_posture > posture && s.ceiling_height - pos.z < standing_height {
        next_posture = posture;
    }
    let crouching = next_posture < 0.99;

    // --- jump ---
    let next_jump_wait = (jump_wait - 1).max(0);
    let jump_now = cmd.jump && next_jump_wait == 0 && onground && !crouching;
    let jump_wait_after = if jump_now { JUMP_COOLDOWN } else { next_jump_wait };

    // --- zoom divides turn rate, mouselook clamps to +/-75 degrees ---
    let turn_div = if cmd.zoom { 4.0 } else { 1.0 };
    let new_yaw = (yaw + cmd.turn * TURN_SPEED / turn_div).rem_euclid(std::f32::consts::TAU);
    let new_pitch = clamp_pitch(pitch + cmd.mouselook * TURN_SPEED / turn_div);

    // --- movement vector: forward*F + side*S + up*U, F/S/U rotated by yaw
    // and pitch when swimming/flying/on a ladder ---
    let mut base_xy = if cmd.run { RUN_SPEED } else { WALK_SPEED };
    if crouching {
        base_xy *= CROUCH_SLOWDOWN;
    }
    if !(onground || onladder || swimming || flying) {
        base_xy /= 16.0;
    }
    let mut base_z = base_xy * 0.5;
    if !(onladder || swimming || flying) {
        base_z /= 16.0;
    }

    let (eh, ev) = if swimming || flying || onladder {
        let slope = new_pitch.tan();
        let hyp = (1.0 + slope * slope).sqrt();
        (1.0 / hyp, slope / hyp)
    } else {
        (1.0, 0.0)
    };
    let dx = new_yaw.cos();
    let dy = new_yaw.sin();

    let forward = Vec2::new(eh * dx, eh * dy) * (cmd.forward * base_xy);
    let strafe = Vec2::new(dy, -dx) * (cmd.strafe * base_xy);
    let up_xy = Vec2::new(-ev * dx, -ev * dy) * (cmd.up * base_xy);
    let ground_move = forward + strafe + up_xy;
    let vertical_move = if swimming || flying || onladder {
        ev * base_z * cmd.forward + eh * base_z * cmd.up
    } else {
        0.0
    };

    // --- sector specials: airless drains breath, damage sectors hurt,
    // secret sectors credit the player once ---
    let effect = sector_effect(s.special);

    // --- write phase ---
    if let Ok(mut tag) = world.get::<&mut PlayerTag>(entity) {
        tag.posture = next_posture;
        tag.crouching = crouching;
        tag.jumping = jump_wait_after > 0;
        tag.jump_wait = jump_wait_after;
        tag.standard_view_height = standing_height * next_posture * 0.75;
        if tag.view_height < tag.standard_view_height {
            tag.view_height = (tag.view_height + 1.0).min(tag.standard_view_height);
        } else {
            tag.view_height = (tag.view_height - 1.0).max(tag.standard_view_height);
        }
    }
    if let Ok(mut angle) = world.get::<&mut Angle>(entity) {
        angle.0 = new_yaw;
    }
    if let Ok(mut p) = world.get::<&mut Pitch>(entity) {
        p.0 = new_pitch;
    }
    if let Ok(mut vel) = world.get::<&mut Velocity>(entity) {
        vel.0.x = ground_move.x;
        vel.0.y = ground_move.y;
        if jump_now {
            vel.0.z = JUMP_SPEED;
        } else if swimming || flying || onladder {
            vel.0.z = vertical_move;
        }
    }

    if effect.airless {
        let mouth_z = pos.z + world.get::<&PlayerTag>(entity).map(|t| t.view_height).unwrap_or(0.0);
        let submerged = mouth_z >= s.floor_height && mouth_z <= s.ceiling_height;
        if submerged {
            if let Ok(mut air) = world.get::<&mut AirSupply>(entity) {
                air.0 = (air.0 - DROWN_AIR_LOSS).max(0);
                if air.0 == 0 && tic % DROWN_DAMAGE_PERIOD == 0 {
                    apply_damage(world, entity, DROWN_DAMAGE);
                }
            }
        }
    }
    if let Some(damage) = effect.damage {
        if tic % DROWN_DAMAGE_PERIOD == 0 {
            apply_damage(world, entity, damage);
        }
    }
    if effect.secret {
        if let Ok(mut secrets) = world.get::<&mut SecretsFound>(entity) {
            if secrets.last_credited != Some(sector) {
                secrets.count += 1;
                secrets.last_credited = Some(sector);
            }
        }
    }
}

/// Apply `amount` damage to `entity`, reduced by its armour class (if any)
/// before armour itself is worn down — vanilla's `PlayerDamageArmour`.
fn apply_damage(world: &mut World, entity: Entity, amount: i32) {
    let mut remaining = amount;
    if let Ok(mut armour) = world.get::<&mut Armour>(entity) {
        if armour.points > 0.0 {
            let save = ARMOUR_SAVE[(armour.class as usize).min(2)];
            let absorbed = (amount as f32 * save).min(armour.points);
            armour.points -= absorbed;
            remaining = (amount as f32 - absorbed).round() as i32;
        }
    }
    if let Ok(mut health) = world.get::<&mut Health>(entity) {
        health.0 -= remaining.max(0);
    }
}

/// Death-think: fall the view height to the floor, rotate the corpse's
/// facing toward its attacker, and sit in `AwaitingRespawn` once the
/// player presses use. Vanilla's `DeathThink`.
fn death_think(world: &mut World, entity: Entity) {
    let Ok(view_height) = world.get::<&PlayerTag>(entity).map(|t| t.view_height) else {
        return;
    };
    let Ok(standard_view_height) = world.get::<&PlayerTag>(entity).map(|t| t.standard_view_height) else {
        return;
    };
    let Ok(use_pressed) = world.get::<&PlayerTag>(entity).map(|t| t.cmd.use_act) else {
        return;
    };
    let attacker = world.get::<&Attacker>(entity).ok().and_then(|a| a.0);
    let my_pos = world.get::<&Position>(entity).ok().map(|p| *p);
    let my_yaw = world.get::<&Angle>(entity).map(|a| a.0).unwrap_or(0.0);

    let new_view_height = if view_height > standard_view_height {
        (view_height - 1.0).max(standard_view_height)
    } else {
        standard_view_height
    };

    let new_yaw = if let (Some(att), Some(me)) = (attacker, my_pos) {
        if let Ok(att_pos) = world.get::<&Position>(att) {
            if att != entity {
                let to_attacker = att_pos.xy - me.xy;
                if to_attacker.length_squared() > 1e-3 {
                    let target = to_attacker.y.atan2(to_attacker.x);
                    let mut delta = (target - my_yaw + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU)
                        - std::f32::consts::PI;
                    delta /= 5.0;
                    my_yaw + delta
                } else {
                    my_yaw
                }
            } else {
                my_yaw
            }
        } else {
            my_yaw
        }
    } else {
        my_yaw
    };

    if let Ok(mut tag) = world.get::<&mut PlayerTag>(entity) {
        tag.view_height = new_view_height;
        if use_pressed {
            tag.respawn_wait = tag.respawn_wait.max(0) + 1;
        }
    }
    if let Ok(mut angle) = world.get::<&mut Angle>(entity) {
        angle.0 = new_yaw.rem_euclid(std::f32::consts::TAU);
    }
    if let Ok(mut vel) = world.get::<&mut Velocity>(entity) {
        vel.0.x = 0.0;
        vel.0.y = 0.0;
    }
}

/// Count every powerup down by one tic (clamped at the dead-player limit
/// of 1 so effects fade fast on death), vanilla's `UpdatePowerups`.
fn update_powerups(world: &mut World, entity: Entity, dead: bool) {
    let Ok(mut powers) = world.get::<&mut Powerups>(entity) else {
        return;
    };
    let limit = if dead { 1 } else { i32::MAX };
    for field in [
        &mut powers.invuln,
        &mut powers.infrared,
        &mut powers.night_vision,
        &mut powers.berserk,
        &mut powers.jetpack,
        &mut powers.partial_invis,
    ] {
        if *field < 0 {
            continue;
        }
        if *field > limit {
            *field = limit;
        } else if *field > 0 {
            *field -= 1;
        }
    }
}

/// A thing overlapping a `SWIMMABLE` extrafloor at `z` counts as swimming
/// — this crate's liquid model stands in for the original's per-sector
/// `SECSP_Swimming` DDF flag.
fn is_swimming(level: &Level, sector: SectorId, z: f32) -> bool {
    level.extrafloors.iter().any(|ef| {
        ef.host_sector == sector && ef.flags.contains(ExtrafloorFlags::SWIMMABLE) && {
            let control = &level.sectors[ef.control_sector.index()];
            z >= control.floor_height && z <= control.ceiling_height
        }
    })
}

fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-MAX_LOOK_PITCH, MAX_LOOK_PITCH)
}

/// Sample room size by casting 8 cardinal rays out from the player to the
/// nearest blocking line, vanilla's `P_RoomPath`. Indoor/outdoor is read
/// straight off the player's own sector rather than hunting for a sky
/// boundary along each ray — a deliberate simplification, see DESIGN.md.
fn probe_reverb(world: &mut World, level: &Level, entity: Entity) {
    let Ok(origin) = world.get::<&Position>(entity).map(|p| p.xy) else {
        return;
    };
    let Ok(sector) = world.get::<&Subsector>(entity).map(|s| level.sector_of(s.0)) else {
        return;
    };
    if world.get::<&ReverbZone>(entity).is_err() {
        return;
    }

    let mut total = 0.0;
    for i in 0..REVERB_RAY_COUNT {
        let angle = (i as f32) * std::f32::consts::TAU / REVERB_RAY_COUNT as f32;
        let dir = Vec2::new(angle.cos(), angle.sin());
        let to = origin + dir * REVERB_MAX_RANGE;
        total += nearest_blocker_distance(level, origin, to);
    }
    let room_size = total / REVERB_RAY_COUNT as f32;
    let outdoor = level.sectors[sector.index()].ceil_tex == crate::world::texture::NO_TEXTURE;
    let class = if room_size < REVERB_SMALL {
        ReverbSize::Small
    } else if room_size < REVERB_LARGE {
        ReverbSize::Medium
    } else {
        ReverbSize::Large
    };

    if let Ok(mut rz) = world.get::<&mut ReverbZone>(entity) {
        rz.room_size = room_size;
        rz.outdoor = outdoor;
        rz.class = class;
    }
}

fn nearest_blocker_distance(level: &Level, from: Vec2, to: Vec2) -> f32 {
    let bbox = Aabb { min: from.min(to), max: from.max(to) };
    let mut best = REVERB_MAX_RANGE;
    level.block_lines_iter(bbox, |line: &Linedef, _id| {
        if line.left_sidedef.is_some() && !line.flags.contains(LinedefFlags::IMPASSABLE) {
            return true;
        }
        if let Some(t) = ray_segment_t(level, line, from, to) {
            let dist = t * REVERB_MAX_RANGE;
            if dist < best {
                best = dist;
            }
        }
        true
    });
    best
}

fn ray_segment_t(level: &Level, line: &Linedef, from: Vec2, to: Vec2) -> Option<f32> {
    let v1 = level.vertices[line.v1.index()].pos;
    let v2 = level.vertices[line.v2.index()].pos;
    let ray = to - from;
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
