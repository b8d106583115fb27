//! The font's canonical glyph order
//!
//! The glyph order is the bidirectional map between numeric glyph indices
//! and canonical names. It is populated once while a font is loaded and
//! treated as read-only by every consolidation pass that follows; it
//! provides no interior locking, so population must be single-threaded (or
//! externally synchronized), after which it may be shared freely.

use std::collections::HashMap;

use crate::glyph_id::GlyphId;
use crate::handle::Handle;

/// Where a glyph-order entry's name came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameOrigin {
    /// Proposed alongside a numeric index, e.g. from `post` or CFF charset
    /// data.
    ByIndex,
    /// Proposed from a textual glyph listing.
    ByName,
    /// Synthesized after the proposed name collided with an existing one.
    Synthetic,
}

#[derive(Clone, Debug)]
struct Entry {
    gid: GlyphId,
    name: String,
    origin: NameOrigin,
}

/// Bidirectional map between glyph indices and canonical names.
///
/// Insertion is atomic per call: an entry is either present in both maps
/// with matching data, or in neither. Names are unique; on collision a
/// synthetic `$$gid<index>` name is substituted.
#[derive(Clone, Debug, Default)]
pub struct GlyphOrder {
    by_gid: HashMap<GlyphId, Entry>,
    by_name: HashMap<String, Entry>,
}

impl GlyphOrder {
    /// Create a new, empty glyph order.
    pub fn new() -> Self {
        GlyphOrder::default()
    }

    /// The number of registered glyphs.
    pub fn len(&self) -> usize {
        self.by_gid.len()
    }

    /// `true` if no glyph is registered.
    pub fn is_empty(&self) -> bool {
        self.by_gid.is_empty()
    }

    /// Register a name proposal for `gid`, returning the accepted name.
    ///
    /// The first registration for a given index wins; later proposals are
    /// rejected and the established name is returned unchanged. If the
    /// proposed name is already in use by another glyph, a synthetic
    /// `$$gid<index>` name is substituted.
    pub fn register_by_index(&mut self, gid: GlyphId, proposed: impl Into<String>) -> String {
        if let Some(existing) = self.by_gid.get(&gid) {
            return existing.name.clone();
        }
        let mut name = proposed.into();
        let mut origin = NameOrigin::ByIndex;
        if self.by_name.contains_key(&name) {
            log::warn!(
                "glyph name {name:?} already in use, renaming gid {} to $$gid{0}",
                gid.to_u16()
            );
            name = format!("$$gid{}", gid.to_u16());
            origin = NameOrigin::Synthetic;
        }
        self.insert(Entry {
            gid,
            name: name.clone(),
            origin,
        });
        name
    }

    /// Register a name→index mapping, returning `false` (with no mutation)
    /// if `name` is already registered.
    ///
    /// Unlike [`register_by_index`](Self::register_by_index), no check is
    /// made for `gid` already being registered under a different name; in
    /// that case the index map is left pointing at the newest entry.
    pub fn register_by_name(&mut self, name: impl Into<String>, gid: GlyphId) -> bool {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return false;
        }
        self.insert(Entry {
            gid,
            name,
            origin: NameOrigin::ByName,
        });
        true
    }

    /// Resolve `handle` into its canonical consolidated form.
    ///
    /// An already-consolidated handle is re-resolved, trying its name
    /// before its index: once a reference has gone through naming, the name
    /// is treated as more authoritative than a possibly stale index.
    /// Name-only handles resolve by name, index-only handles by index.
    ///
    /// Returns `false` if the handle cannot be resolved (including the
    /// empty state); the handle's value is unspecified in that case.
    pub fn consolidate(&self, handle: &mut Handle) -> bool {
        let entry = match &*handle {
            Handle::Consolidated { index, name } => self
                .by_name
                .get(name)
                .or_else(|| self.by_gid.get(&GlyphId::new(*index))),
            Handle::Name(name) => self.by_name.get(name),
            Handle::Index(index) => self.by_gid.get(&GlyphId::new(*index)),
            Handle::Empty => None,
        };
        match entry {
            Some(entry) => {
                *handle = Handle::consolidated(entry.gid.to_u16(), entry.name.clone());
                true
            }
            None => false,
        }
    }

    /// The canonical name of `gid`, if registered.
    pub fn name_of(&self, gid: GlyphId) -> Option<&str> {
        self.by_gid.get(&gid).map(|entry| entry.name.as_str())
    }

    /// The index registered for `name`, if any.
    pub fn gid_of(&self, name: &str) -> Option<GlyphId> {
        self.by_name.get(name).map(|entry| entry.gid)
    }

    /// `true` if `name` is registered.
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// How the name registered for `gid` was arrived at.
    pub fn origin_of(&self, gid: GlyphId) -> Option<NameOrigin> {
        self.by_gid.get(&gid).map(|entry| entry.origin)
    }

    fn insert(&mut self, entry: Entry) {
        self.by_name.insert(entry.name.clone(), entry.clone());
        self.by_gid.insert(entry.gid, entry);
    }
}
