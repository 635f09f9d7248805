//! The mobj archetype table — index `i` describes [`MobjType`] variant `i`,
//! same convention as [`super::states::STATES`].
//!
//! Hand-written counterpart to `tools/gen_mobjinfo`'s generated output: a
//! representative archetype per category (player, grunt monster, projectile,
//! stationary item, two ephemeral decorations) rather than the full vanilla
//! roster, since no `info.c` ships with this crate.

use crate::defs::flags::MobjFlags as MF;
use crate::defs::sound::Sound;
use crate::defs::state::State;

#[repr(usize)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum MobjType {
    Player,
    Trooper,
    Rocket,
    Medikit,
    Blood,
    Puff,
}

#[derive(Debug, Clone)]
pub struct MobjInfo {
    pub id: &'static str,
    pub doomednum: i32,
    /* state chain */
    pub spawnstate: State,
    pub spawnhealth: i32,
    pub seestate: State,
    pub seesound: Sound,
    pub reactiontime: i32,
    pub attacksound: Sound,
    pub painstate: State,
    pub painchance: i32,
    pub painsound: Sound,
    pub meleestate: State,
    pub missilestate: State,
    pub deathstate: State,
    pub xdeathstate: State,
    pub deathsound: Sound,
    /* physics & damage */
    pub speed: i32,
    pub radius: f32,
    pub height: f32,
    pub mass: i32,
    pub damage: i32,
    /* ambience & behaviour */
    pub activesound: Sound,
    pub flags: MF,
    pub raisestate: State,
}

pub const MOBJINFO: &[MobjInfo] = &[
    // Player
    MobjInfo {
        id: "PLAYER",
        doomednum: 1,
        spawnstate: State::PLAY,
        spawnhealth: 100,
        seestate: State::NULL,
        seesound: Sound::None,
        reactiontime: 0,
        attacksound: Sound::None,
        painstate: State::PLAY_PAIN,
        painchance: 255,
        painsound: Sound::Pain,
        meleestate: State::NULL,
        missilestate: State::PLAY_ATK1,
        deathstate: State::PLAY_DIE1,
        xdeathstate: State::PLAY_XDIE1,
        deathsound: Sound::Death,
        speed: 0,
        radius: 16.0,
        height: 56.0,
        mass: 100,
        damage: 0,
        activesound: Sound::None,
        flags: MF::from_bits_truncate(MF::SOLID.bits() | MF::SHOOTABLE.bits() | MF::PICKUP.bits()),
        raisestate: State::NULL,
    },
    // Trooper (zombieman)
    MobjInfo {
        id: "TROOPER",
        doomednum: 3004,
        spawnstate: State::POSS_STND,
        spawnhealth: 20,
        seestate: State::POSS_RUN1,
        seesound: Sound::Posit1,
        reactiontime: 8,
        attacksound: Sound::Pistol,
        painstate: State::POSS_PAIN,
        painchance: 200,
        painsound: Sound::Popain,
        meleestate: State::NULL,
        missilestate: State::POSS_ATK1,
        deathstate: State::POSS_DIE1,
        xdeathstate: State::POSS_XDIE1,
        deathsound: Sound::Podth1,
        speed: 8,
        radius: 20.0,
        height: 56.0,
        mass: 100,
        damage: 0,
        activesound: Sound::Posact,
        flags: MF::from_bits_truncate(
            MF::SOLID.bits() | MF::SHOOTABLE.bits() | MF::COUNTKILL.bits(),
        ),
        raisestate: State::POSS_RAISE1,
    },
    // Rocket projectile
    MobjInfo {
        id: "ROCKET",
        doomednum: -1,
        spawnstate: State::MISL,
        spawnhealth: 1000,
        seestate: State::NULL,
        seesound: Sound::None,
        reactiontime: 0,
        attacksound: Sound::None,
        painstate: State::NULL,
        painchance: 0,
        painsound: Sound::None,
        meleestate: State::NULL,
        missilestate: State::NULL,
        deathstate: State::MISL_FLASH1,
        xdeathstate: State::MISL_FLASH1,
        deathsound: Sound::Explode,
        speed: 20,
        radius: 11.0,
        height: 8.0,
        mass: 100,
        damage: 20,
        activesound: Sound::None,
        flags: MF::from_bits_truncate(
            MF::MISSILE.bits() | MF::NOBLOCKMAP.bits() | MF::NOGRAVITY.bits() | MF::DROPOFF.bits(),
        ),
        raisestate: State::NULL,
    },
    // Medikit (stationary pickup)
    MobjInfo {
        id: "MEDIKIT",
        doomednum: 2012,
        spawnstate: State::MEDI,
        spawnhealth: 1000,
        seestate: State::NULL,
        seesound: Sound::None,
        reactiontime: 0,
        attacksound: Sound::None,
        painstate: State::NULL,
        painchance: 0,
        painsound: Sound::None,
        meleestate: State::NULL,
        missilestate: State::NULL,
        deathstate: State::NULL,
        xdeathstate: State::NULL,
        deathsound: Sound::None,
        speed: 0,
        radius: 20.0,
        height: 16.0,
        mass: 100,
        damage: 0,
        activesound: Sound::None,
        flags: MF::from_bits_truncate(MF::SPECIAL.bits()),
        raisestate: State::NULL,
    },
    // Blood decoration
    MobjInfo {
        id: "BLOOD",
        doomednum: -1,
        spawnstate: State::BLOOD1,
        spawnhealth: 1000,
        seestate: State::NULL,
        seesound: Sound::None,
        reactiontime: 0,
        attacksound: Sound::None,
        painstate: State::NULL,
        painchance: 0,
        painsound: Sound::None,
        meleestate: State::NULL,
        missilestate: State::NULL,
        deathstate: State::NULL,
        xdeathstate: State::NULL,
        deathsound: Sound::None,
        speed: 0,
        radius: 20.0,
        height: 16.0,
        mass: 100,
        damage: 0,
        activesound: Sound::None,
        flags: MF::from_bits_truncate(MF::NOBLOCKMAP.bits() | MF::NOGRAVITY.bits()),
        raisestate: State::NULL,
    },
    // Bullet puff decoration
    MobjInfo {
        id: "PUFF",
        doomednum: -1,
        spawnstate: State::PUFF1,
        spawnhealth: 1000,
        seestate: State::NULL,
        seesound: Sound::None,
        reactiontime: 0,
        attacksound: Sound::None,
        painstate: State::NULL,
        painchance: 0,
        painsound: Sound::None,
        meleestate: State::NULL,
        missilestate: State::NULL,
        deathstate: State::NULL,
        xdeathstate: State::NULL,
        deathsound: Sound::None,
        speed: 0,
        radius: 20.0,
        height: 16.0,
        mass: 100,
        damage: 0,
        activesound: Sound::None,
        flags: MF::from_bits_truncate(MF::NOBLOCKMAP.bits() | MF::NOGRAVITY.bits()),
        raisestate: State::NULL,
    },
];

impl MobjType {
    pub fn info(self) -> &'static MobjInfo {
        &MOBJINFO[self as usize]
    }

    /// Resolve a map-editor `doomednum` (as stored in a `Thing` lump) to its
    /// archetype. Archetypes spawned only at runtime (projectiles, fx) use
    /// `-1` and are never matched here.
    pub fn by_doomednum(doomednum: u16) -> Option<MobjType> {
        MOBJINFO
            .iter()
            .position(|m| m.doomednum == doomednum as i32)
            .map(|i| match i {
                0 => MobjType::Player,
                1 => MobjType::Trooper,
                2 => MobjType::Rocket,
                3 => MobjType::Medikit,
                4 => MobjType::Blood,
                5 => MobjType::Puff,
                _ => unreachable!(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_enum_discriminants() {
        assert_eq!(MobjType::Player as usize, 0);
        assert_eq!(MOBJINFO[MobjType::Rocket as usize].id, "ROCKET");
    }

    #[test]
    fn doomednum_lookup_finds_placed_archetypes() {
        assert_eq!(MobjType::by_doomednum(3004), Some(MobjType::Trooper));
        assert_eq!(MobjType::by_doomednum(9999), None);
    }

    #[test]
    fn runtime_only_archetypes_have_no_doomednum() {
        assert_eq!(MobjType::Rocket.info().doomednum, -1);
    }
}
