//! Frame data table — index `i` here must describe `State` variant `i`.
//!
//! Hand-written counterpart to `tools/gen_mobjinfo`'s generated output (see
//! [`super::state`] for why).

use crate::defs::action::Action;
use crate::defs::state::State;

#[derive(Debug, Copy, Clone)]
pub struct StateInfo {
    pub state: State,
    pub sprite: &'static str,
    pub frame: u8,
    /// Duration in tics; `-1` holds forever (no self-advance).
    pub tics: i32,
    pub action: Action,
    pub next_state: State,
    pub misc1: i32,
    pub misc2: i32,
}

macro_rules! s {
    ($state:ident, $sprite:expr, $frame:expr, $tics:expr, $action:expr, $next:ident) => {
        StateInfo {
            state: State::$state,
            sprite: $sprite,
            frame: $frame,
            tics: $tics,
            action: $action,
            next_state: State::$next,
            misc1: 0,
            misc2: 0,
        }
    };
}

pub const STATES: &[StateInfo] = &[
    s!(NULL, "----", 0, -1, Action::None, NULL),
    // ---- player ----------------------------------------------------
    s!(PLAY, "PLAY", 0, -1, Action::None, PLAY),
    s!(PLAY_RUN1, "PLAY", 0, 4, Action::Chase, PLAY_RUN2),
    s!(PLAY_RUN2, "PLAY", 1, 4, Action::Chase, PLAY_RUN3),
    s!(PLAY_RUN3, "PLAY", 2, 4, Action::Chase, PLAY_RUN4),
    s!(PLAY_RUN4, "PLAY", 3, 4, Action::Chase, PLAY_RUN1),
    s!(PLAY_ATK1, "PLAY", 4, 6, Action::FaceTarget, PLAY_ATK2),
    s!(PLAY_ATK2, "PLAY", 5, 6, Action::FireMissile, PLAY),
    s!(PLAY_PAIN, "PLAY", 6, 4, Action::Pain, PLAY_PAIN2),
    s!(PLAY_PAIN2, "PLAY", 6, 4, Action::None, PLAY),
    s!(PLAY_DIE1, "PLAY", 7, 10, Action::Scream, PLAY_DIE2),
    s!(PLAY_DIE2, "PLAY", 8, 10, Action::Fall, PLAY_DIE3),
    s!(PLAY_DIE3, "PLAY", 9, 10, Action::None, PLAY_DIE4),
    s!(PLAY_DIE4, "PLAY", 10, 10, Action::None, PLAY_DIE5),
    s!(PLAY_DIE5, "PLAY", 11, 10, Action::None, PLAY_DIE6),
    s!(PLAY_DIE6, "PLAY", 12, 10, Action::None, PLAY_DIE7),
    s!(PLAY_DIE7, "PLAY", 13, -1, Action::None, PLAY_DIE7),
    s!(PLAY_XDIE1, "PLAY", 14, 5, Action::Scream, PLAY_XDIE2),
    s!(PLAY_XDIE2, "PLAY", 15, 5, Action::Fall, PLAY_XDIE3),
    s!(PLAY_XDIE3, "PLAY", 16, 5, Action::None, PLAY_XDIE4),
    s!(PLAY_XDIE4, "PLAY", 17, 5, Action::None, PLAY_XDIE5),
    s!(PLAY_XDIE5, "PLAY", 18, 5, Action::None, PLAY_XDIE6),
    s!(PLAY_XDIE6, "PLAY", 19, 5, Action::None, PLAY_XDIE7),
    s!(PLAY_XDIE7, "PLAY", 20, 5, Action::None, PLAY_XDIE8),
    s!(PLAY_XDIE8, "PLAY", 21, 5, Action::None, PLAY_XDIE9),
    s!(PLAY_XDIE9, "PLAY", 22, -1, Action::None, PLAY_XDIE9),
    // ---- zombieman grunt --------------------------------------------
    s!(POSS_STND, "POSS", 0, 10, Action::Look, POSS_STND2),
    s!(POSS_STND2, "POSS", 1, 10, Action::Look, POSS_STND),
    s!(POSS_RUN1, "POSS", 0, 4, Action::Chase, POSS_RUN2),
    s!(POSS_RUN2, "POSS", 0, 4, Action::Chase, POSS_RUN3),
    s!(POSS_RUN3, "POSS", 1, 4, Action::Chase, POSS_RUN4),
    s!(POSS_RUN4, "POSS", 1, 4, Action::Chase, POSS_RUN5),
    s!(POSS_RUN5, "POSS", 2, 4, Action::Chase, POSS_RUN6),
    s!(POSS_RUN6, "POSS", 2, 4, Action::Chase, POSS_RUN7),
    s!(POSS_RUN7, "POSS", 3, 4, Action::Chase, POSS_RUN8),
    s!(POSS_RUN8, "POSS", 3, 4, Action::Chase, POSS_RUN1),
    s!(POSS_ATK1, "POSS", 4, 10, Action::FaceTarget, POSS_ATK2),
    s!(POSS_ATK2, "POSS", 5, 8, Action::PosAttack, POSS_ATK3),
    s!(POSS_ATK3, "POSS", 4, 8, Action::None, POSS_RUN1),
    s!(POSS_PAIN, "POSS", 6, 3, Action::Pain, POSS_PAIN2),
    s!(POSS_PAIN2, "POSS", 6, 3, Action::None, POSS_RUN1),
    s!(POSS_DIE1, "POSS", 7, 5, Action::Scream, POSS_DIE2),
    s!(POSS_DIE2, "POSS", 8, 5, Action::Fall, POSS_DIE3),
    s!(POSS_DIE3, "POSS", 9, 5, Action::None, POSS_DIE4),
    s!(POSS_DIE4, "POSS", 10, 5, Action::None, POSS_DIE5),
    s!(POSS_DIE5, "POSS", 11, -1, Action::None, POSS_DIE5),
    s!(POSS_XDIE1, "POSS", 12, 5, Action::Scream, POSS_XDIE2),
    s!(POSS_XDIE2, "POSS", 13, 5, Action::Fall, POSS_XDIE3),
    s!(POSS_XDIE3, "POSS", 14, 5, Action::None, POSS_XDIE4),
    s!(POSS_XDIE4, "POSS", 15, 5, Action::None, POSS_XDIE5),
    s!(POSS_XDIE5, "POSS", 16, 5, Action::None, POSS_XDIE6),
    s!(POSS_XDIE6, "POSS", 17, 5, Action::None, POSS_XDIE7),
    s!(POSS_XDIE7, "POSS", 18, 5, Action::None, POSS_XDIE8),
    s!(POSS_XDIE8, "POSS", 19, 5, Action::None, POSS_XDIE9),
    s!(POSS_XDIE9, "POSS", 20, -1, Action::None, POSS_XDIE9),
    s!(POSS_RAISE1, "POSS", 10, 5, Action::None, POSS_RAISE2),
    s!(POSS_RAISE2, "POSS", 9, 5, Action::None, POSS_RAISE3),
    s!(POSS_RAISE3, "POSS", 8, 5, Action::None, POSS_RAISE4),
    s!(POSS_RAISE4, "POSS", 7, 5, Action::None, POSS_RUN1),
    // ---- rocket projectile -------------------------------------------
    s!(MISL, "MISL", 0, 4, Action::Tracer, MISL),
    s!(MISL_FLASH1, "MISL", 1, 8, Action::Explode, MISL_FLASH2),
    s!(MISL_FLASH2, "MISL", 2, 6, Action::None, MISL_FLASH3),
    s!(MISL_FLASH3, "MISL", 3, 4, Action::None, NULL),
    // ---- stationary item -----------------------------------------------
    s!(MEDI, "MEDI", 0, -1, Action::None, MEDI),
    // ---- decorations -----------------------------------------------
    s!(BLOOD1, "BLUD", 0, 8, Action::None, BLOOD2),
    s!(BLOOD2, "BLUD", 1, 8, Action::None, BLOOD3),
    s!(BLOOD3, "BLUD", 2, 8, Action::None, NULL),
    s!(PUFF1, "PUFF", 0, 4, Action::None, PUFF2),
    s!(PUFF2, "PUFF", 1, 4, Action::None, PUFF3),
    s!(PUFF3, "PUFF", 2, 4, Action::SpawnPuff, PUFF4),
    s!(PUFF4, "PUFF", 3, 4, Action::None, NULL),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_enum_discriminants() {
        for (i, info) in STATES.iter().enumerate() {
            assert_eq!(info.state as usize, i, "STATES[{i}] describes {:?}", info.state);
        }
    }

    #[test]
    fn chase_loops_are_cyclic() {
        let mut s = State::POSS_RUN1;
        for _ in 0..8 {
            s = s.next();
        }
        assert_eq!(s, State::POSS_RUN1);
    }
}
