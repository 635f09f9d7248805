//! Think/attack callbacks a state can invoke when it's entered.
//!
//! Normally generated from `info.c`'s `A_Whatever` references by
//! `tools/gen_mobjinfo`; hand-written here since no `info.c` ships with this
//! crate. `sim::mobj::run_action` dispatches on this enum.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Action {
    None,
    Look,
    Chase,
    FaceTarget,
    PosAttack,
    Scream,
    Fall,
    Pain,
    Explode,
    FireMissile,
    SpawnPuff,
    SpawnBlood,
    Tracer,
}
