//! Mobj lifecycle: spawn, state transitions, and deferred removal.
//!
//! Grounded on `p_mobj.cc`'s `P_SpawnMobj`/`P_SetMobjState`/`P_RemoveMobj`
//! trio (see `examples/original_source/_INDEX.md`'s `p_local.h`/`p_map.cc`
//! family) and on `p_enemy.cc` for the action dispatch table. State
//! transitions can themselves call back into movement code (a `Fall`
//! action freeing a corpse from `SOLID`, say), which is why `set_state` is
//! split into an immediate form and a deferred queue drained once per tick
//! once per tick.

use glam::{Vec2, Vec3};
use hecs::{Entity, World};

use super::components::{
    ActorFlags, Angle, Animation, Class, Health, PendingState, Position, Reaction, Subsector,
    Target, Velocity,
};
use super::spatial::{ThingGrid, TouchArena};
use crate::defs::{Action, MobjFlags, MobjInfo, State};
use crate::world::Level;

/// Spawn a new mobj from its archetype at `(x, y)`, placing it on the floor
/// (or hanging from the ceiling for `SPAWNCEILING` things) of whatever
/// subsector contains that point, and linking it into the spatial index.
pub fn spawn_mobj(
    world: &mut World,
    grid: &mut ThingGrid,
    touch: &mut TouchArena,
    level: &Level,
    info: &'static MobjInfo,
    x: f32,
    y: f32,
    angle: f32,
) -> Entity {
    let xy = Vec2::new(x, y);
    let subsector = level.locate_subsector(xy);
    let sector = &level.sectors[level.sector_of(subsector).index()];

    let z = if info.flags.contains(MobjFlags::SPAWNCEILING) {
        sector.ceiling_height - info.height
    } else {
        sector.floor_height
    };

    let ent = world.spawn((
        ActorFlags(info.flags),
        Position::new(xy, z),
        Velocity::default(),
        Angle(angle),
        Subsector(subsector),
        Animation {
            state: info.spawnstate,
            tics: info.spawnstate.tics(),
        },
        Class(info),
        Health(info.spawnhealth),
        Target::default(),
        Reaction::default(),
        PendingState::default(),
    ));

    if !info.flags.contains(MobjFlags::NOBLOCKMAP) {
        grid.insert(xy, ent);
    }
    if !info.flags.contains(MobjFlags::NOSECTOR) {
        touch.link(ent, level.sector_of(subsector));
    }

    ent
}

/// Immediate state set — vanilla's `P_SetMobjState`. Follows the `next_state`
/// chain through any zero-tic states in one call (a state with `tics == 0`
/// falls straight through, matching how e.g. death-frame chains collapse
/// instantly into the corpse's resting frame). Returns `false` if the chain
/// ran into `State::NULL`, meaning the caller should remove the mobj.
pub fn set_state(world: &mut World, entity: Entity, mut state: State) -> bool {
    loop {
        if state == State::NULL {
            return false;
        }
        let info = state.info();
        {
            let Ok(mut anim) = world.get::<&mut Animation>(entity) else {
                return false;
            };
            anim.state = state;
            anim.tics = info.tics;
        }
        run_action(world, entity, info.action);
        if info.tics != 0 {
            return true;
        }
        state = info.next_state;
    }
}

/// Queue a state change for the end-of-tick drain instead of applying it
/// immediately — used from inside collision/movement code, which may be
/// mid-iteration over the same component the state change would touch.
pub fn set_state_deferred(world: &World, entity: Entity, state: State) {
    if let Ok(mut pending) = world.get::<&mut PendingState>(entity) {
        pending.0 = Some(state);
    }
}

/// Drain every queued deferred state change. Called once per tick, after
/// every thinker has run, in mover-before-thinker order.
pub fn run_deferred_states(world: &mut World) {
    let pending: Vec<(Entity, State)> = world
        .query_mut::<&mut PendingState>()
        .into_iter()
        .filter_map(|(e, p)| p.0.take().map(|s| (e, s)))
        .collect();
    for (entity, state) in pending {
        set_state(world, entity, state);
    }
}

/// Dispatch table for state-entry actions — vanilla's `A_Whatever` pointers,
/// collapsed to an enum since this crate carries a representative roster
/// rather than a full `info.c`. Unhandled actions are a deliberate no-op:
/// most of the roster (`Look`, `Chase`, `FaceTarget`, …) belongs to the AI
/// layer this crate doesn't implement (spec's Non-goals exclude full gameplay
/// scripting); only the actions load-bearing for the modules this crate
/// *does* implement (movement, damage, sound) are real.
fn run_action(world: &mut World, entity: Entity, action: Action) {
    match action {
        Action::None | Action::Look | Action::Chase | Action::FaceTarget | Action::Tracer => {}
        Action::Fall => {
            if let Ok(mut flags) = world.get::<&mut ActorFlags>(entity) {
                flags.0.remove(MobjFlags::SOLID);
            }
        }
        Action::Pain | Action::Scream | Action::PosAttack | Action::FireMissile
        | Action::SpawnPuff | Action::SpawnBlood | Action::Explode => {
            // Sound emission and damage/puff spawning are driven by the
            // caller that triggered the state transition (line attack,
            // `DamageMapObject`), which already has the context (attacker,
            // position) this enum variant alone doesn't carry.
        }
    }
}

/// Pending-removal marker. A mobj tagged with this stays linked through the
/// remainder of the current think pass (other thinkers may still legally
/// reference it, e.g. as a `target`) and is unlinked/freed by
/// [`reap_removed`] at the end of the tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct Removed;

pub fn mark_removed(world: &mut World, entity: Entity) {
    let _ = world.insert_one(entity, Removed);
}

/// Unlink every `Removed` mobj from the spatial index, scrub outstanding
/// references to it, and despawn it. Called once per tick, after
/// [`run_deferred_states`].
pub fn reap_removed(world: &mut World, grid: &mut ThingGrid, touch: &mut TouchArena) {
    let dead: Vec<Entity> = world.query_mut::<&Removed>().into_iter().map(|(e, _)| e).collect();
    if dead.is_empty() {
        return;
    }

    // Scrub outstanding `Target` references before despawning — a lingering
    // `Entity` handle into a freed slot would be a dangling reference once
    // hecs recycles the index.
    for (_, target) in world.query_mut::<&mut Target>() {
        if let Some(t) = target.0 {
            if dead.contains(&t) {
                target.0 = None;
            }
        }
    }

    for entity in dead {
        if let Ok(pos) = world.get::<&Position>(entity) {
            grid.remove(pos.xy, entity);
        }
        touch.unlink_thing(entity);
        let _ = world.despawn(entity);
    }
}
