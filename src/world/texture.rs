//! Name → handle registry for wall/flat textures.
//!
//! Pixel decoding is out of scope for this crate (no renderer); all the
//! simulation and specials code needs is a stable, cheap-to-copy id it can
//! compare and hash. `TextureBank` is that registry.

use std::collections::HashMap;

/// Runtime handle for a texture name.
///
/// *Guaranteed* to remain stable for the lifetime of the bank.
pub type TextureId = u16;

/// `TextureId` meaning "no texture" (the `"-"` placeholder name in Doom
/// sidedefs, or an unresolved reference). Always 0 — `TextureBank::new()`
/// reserves it first.
pub const NO_TEXTURE: TextureId = 0;

/// A palette-agnostic, pixel-agnostic cache mapping 8-byte WAD texture/flat
/// names to a dense `TextureId` space.
///
/// * Does **not** know about WADs or pixel formats — that's the loader's job.
/// * Stores exactly one id per unique name.
/// * ID **0** is always `"-"`, the "missing/none" placeholder.
#[derive(Debug, Default)]
pub struct TextureBank {
    by_name: HashMap<String, TextureId>,
    names: Vec<String>,
}

impl TextureBank {
    /// Create a bank with id 0 reserved for `"-"`.
    pub fn new() -> Self {
        let mut bank = Self {
            by_name: HashMap::new(),
            names: Vec::new(),
        };
        bank.names.push("-".to_string());
        bank.by_name.insert("-".to_string(), NO_TEXTURE);
        bank
    }

    /// Number of distinct names registered (including `"-"`).
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.len() <= 1
    }

    /// Obtain the id for `name`, interning it if this is the first time
    /// it's been seen. Names are compared case-insensitively and stored
    /// upper-cased, matching vanilla's lump-name conventions.
    pub fn intern(&mut self, name: &str) -> TextureId {
        let name = name.trim_end_matches('\0').to_ascii_uppercase();
        if name.is_empty() || name == "-" {
            return NO_TEXTURE;
        }
        if let Some(&id) = self.by_name.get(&name) {
            return id;
        }
        let id = self.names.len() as TextureId;
        self.names.push(name.clone());
        self.by_name.insert(name, id);
        id
    }

    /// Look up an id without interning; `None` if never registered.
    pub fn id(&self, name: &str) -> Option<TextureId> {
        self.by_name.get(&name.to_ascii_uppercase()).copied()
    }

    /// Name backing an id, if in range.
    pub fn name(&self, id: TextureId) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_resolves_to_no_texture() {
        let mut bank = TextureBank::new();
        assert_eq!(bank.intern("-"), NO_TEXTURE);
        assert_eq!(bank.intern(""), NO_TEXTURE);
    }

    #[test]
    fn repeated_names_share_an_id() {
        let mut bank = TextureBank::new();
        let a = bank.intern("STARTAN3");
        let b = bank.intern("startan3\0\0");
        assert_eq!(a, b);
        assert_eq!(bank.name(a), Some("STARTAN3"));
    }

    #[test]
    fn distinct_names_get_distinct_ids() {
        let mut bank = TextureBank::new();
        let a = bank.intern("WOOD1");
        let b = bank.intern("WOOD2");
        assert_ne!(a, b);
        assert_eq!(bank.len(), 3); // "-" + WOOD1 + WOOD2
    }
}
