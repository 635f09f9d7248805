//! Frame/state identifiers indexing into [`super::states::STATES`].
//!
//! Normally emitted by `tools/gen_mobjinfo` from `info.c`'s `state_t states[]`
//! array; hand-written here with a representative subset (player, a grunt
//! monster, a projectile, a stationary item, and the generic blood/puff
//! decorations) since no `info.c` ships with this crate.

#[repr(usize)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum State {
    NULL = 0,

    PLAY,
    PLAY_RUN1,
    PLAY_RUN2,
    PLAY_RUN3,
    PLAY_RUN4,
    PLAY_ATK1,
    PLAY_ATK2,
    PLAY_PAIN,
    PLAY_PAIN2,
    PLAY_DIE1,
    PLAY_DIE2,
    PLAY_DIE3,
    PLAY_DIE4,
    PLAY_DIE5,
    PLAY_DIE6,
    PLAY_DIE7,
    PLAY_XDIE1,
    PLAY_XDIE2,
    PLAY_XDIE3,
    PLAY_XDIE4,
    PLAY_XDIE5,
    PLAY_XDIE6,
    PLAY_XDIE7,
    PLAY_XDIE8,
    PLAY_XDIE9,

    POSS_STND,
    POSS_STND2,
    POSS_RUN1,
    POSS_RUN2,
    POSS_RUN3,
    POSS_RUN4,
    POSS_RUN5,
    POSS_RUN6,
    POSS_RUN7,
    POSS_RUN8,
    POSS_ATK1,
    POSS_ATK2,
    POSS_ATK3,
    POSS_PAIN,
    POSS_PAIN2,
    POSS_DIE1,
    POSS_DIE2,
    POSS_DIE3,
    POSS_DIE4,
    POSS_DIE5,
    POSS_XDIE1,
    POSS_XDIE2,
    POSS_XDIE3,
    POSS_XDIE4,
    POSS_XDIE5,
    POSS_XDIE6,
    POSS_XDIE7,
    POSS_XDIE8,
    POSS_XDIE9,
    POSS_RAISE1,
    POSS_RAISE2,
    POSS_RAISE3,
    POSS_RAISE4,

    MISL,
    MISL_FLASH1,
    MISL_FLASH2,
    MISL_FLASH3,

    MEDI,

    BLOOD1,
    BLOOD2,
    BLOOD3,

    PUFF1,
    PUFF2,
    PUFF3,
    PUFF4,
}

impl State {
    #[inline(always)]
    pub fn info(self) -> &'static super::states::StateInfo {
        &super::states::STATES[self as usize]
    }
    #[inline(always)]
    pub fn tics(self) -> i32 {
        self.info().tics
    }
    #[inline(always)]
    pub fn next(self) -> State {
        self.info().next_state
    }
    #[inline(always)]
    pub fn sprite(self) -> &'static str {
        self.info().sprite
    }
    #[inline(always)]
    pub fn frame(self) -> u8 {
        self.info().frame
    }
}
