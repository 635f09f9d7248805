//! Logical sound-effect ids referenced from [`super::mobjinfo`] and
//! actions. Resolving a `Sound` to an actual SF2 note/instrument is the
//! demo binary's job (`sim` only ever produces these ids); a full engine
//! would map them to DSDHACKED/`DSxxxx` PC-speaker-era lump names.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Sound {
    None,
    Pistol,
    Shotgun,
    Pain,
    Death,
    Slop,
    Punch,
    Explode,
    Oof,
    Swish,
    Itemup,
    Posit1,
    Posit2,
    Posit3,
    Podth1,
    Popain,
    Posact,
}
