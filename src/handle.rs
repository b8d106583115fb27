//! References to glyphs, font dicts, lookups and variation axes
//!
//! A table parsed from binary refers to things by numeric index; one parsed
//! from text refers to them by name. Both forms carry a [`Handle`] that is
//! later resolved against the font's canonical order (see
//! [`GlyphOrder`][crate::GlyphOrder]), after which it holds both the index
//! and the name.

/// A reference to a font-internal object, in one of four states.
///
/// Handles must not be compared for table-building purposes until
/// consolidated; only then is the index meaningful as a sort/dedup key (see
/// [`index`](Handle::index)). The only legal transition out of the `Index`
/// and `Name` states is consolidation through a
/// [`GlyphOrder`][crate::GlyphOrder].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Handle {
    /// No reference.
    #[default]
    Empty,
    /// Only the numeric index is known (parsed from binary).
    Index(u16),
    /// Only the symbolic name is known (parsed from text).
    Name(String),
    /// Index and name both known, consistent with the glyph order at the
    /// time of consolidation.
    Consolidated {
        /// The canonical index.
        index: u16,
        /// The canonical name.
        name: String,
    },
}

impl Handle {
    /// A handle referring to an object by numeric index only.
    pub fn from_index(index: u16) -> Self {
        Handle::Index(index)
    }

    /// A handle referring to an object by name only.
    ///
    /// An empty name produces an [`Empty`](Handle::Empty) handle, which can
    /// never consolidate; this is how non-conforming textual entries end up
    /// silently omitted.
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.is_empty() {
            Handle::Empty
        } else {
            Handle::Name(name)
        }
    }

    /// A handle built directly in the consolidated state.
    pub fn consolidated(index: u16, name: impl Into<String>) -> Self {
        Handle::Consolidated {
            index,
            name: name.into(),
        }
    }

    /// The numeric index, if known.
    pub fn index(&self) -> Option<u16> {
        match self {
            Handle::Index(index) | Handle::Consolidated { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// The symbolic name, if known.
    pub fn name(&self) -> Option<&str> {
        match self {
            Handle::Name(name) | Handle::Consolidated { name, .. } => Some(name),
            _ => None,
        }
    }

    /// `true` if both index and name are known.
    pub fn is_consolidated(&self) -> bool {
        matches!(self, Handle::Consolidated { .. })
    }

    /// `true` if this handle refers to nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Handle::Empty)
    }

    /// Return the handle to the empty state.
    pub fn reset(&mut self) {
        *self = Handle::Empty;
    }
}

/// A macro to define a domain-specific newtype over [`Handle`].
///
/// The four reference domains (glyph, font dict, lookup, axis) share one
/// representation but are never interchangeable; distinct types enforce
/// that at compile time.
macro_rules! handle_newtype {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Default, PartialEq, Eq)]
        pub struct $name(Handle);

        impl $name {
            /// A reference by numeric index only.
            pub fn from_index(index: u16) -> Self {
                $name(Handle::from_index(index))
            }

            /// A reference by name only; empty names yield an empty handle.
            pub fn from_name(name: impl Into<String>) -> Self {
                $name(Handle::from_name(name))
            }

            /// A reference built directly in the consolidated state.
            pub fn consolidated(index: u16, name: impl Into<String>) -> Self {
                $name(Handle::consolidated(index, name))
            }
        }

        impl std::ops::Deref for $name {
            type Target = Handle;
            fn deref(&self) -> &Handle {
                &self.0
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Handle {
                &mut self.0
            }
        }

        impl From<Handle> for $name {
            fn from(handle: Handle) -> Self {
                $name(handle)
            }
        }
    };
}

handle_newtype!(GlyphHandle, "A reference to a glyph.");
handle_newtype!(FdHandle, "A reference to a CFF font dict.");
handle_newtype!(LookupHandle, "A reference to a layout lookup.");
handle_newtype!(AxisHandle, "A reference to a variation axis.");

impl GlyphHandle {
    /// A reference to the glyph with this id.
    pub fn from_gid(gid: crate::GlyphId) -> Self {
        GlyphHandle::from_index(gid.to_u16())
    }

    /// The referenced glyph id, if the index is known.
    pub fn gid(&self) -> Option<crate::GlyphId> {
        self.index().map(crate::GlyphId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_accessors() {
        let empty = Handle::Empty;
        assert_eq!(empty.index(), None);
        assert_eq!(empty.name(), None);

        let by_index = Handle::from_index(12);
        assert_eq!(by_index.index(), Some(12));
        assert_eq!(by_index.name(), None);

        let by_name = Handle::from_name("acutecomb");
        assert_eq!(by_name.index(), None);
        assert_eq!(by_name.name(), Some("acutecomb"));
        assert!(!by_name.is_consolidated());

        let both = Handle::consolidated(12, "acutecomb");
        assert_eq!(both.index(), Some(12));
        assert_eq!(both.name(), Some("acutecomb"));
        assert!(both.is_consolidated());
    }

    #[test]
    fn empty_name_is_empty_state() {
        assert!(Handle::from_name("").is_empty());
        assert!(GlyphHandle::from_name(String::new()).is_empty());
    }

    #[test]
    fn reset_clears_state() {
        let mut handle = LookupHandle::consolidated(3, "liga-lookup-3");
        handle.reset();
        assert!(handle.is_empty());
    }

    #[test]
    fn glyph_handle_speaks_glyph_id() {
        let handle = GlyphHandle::from_gid(crate::GlyphId::new(41));
        assert_eq!(handle.gid(), Some(crate::GlyphId::new(41)));
    }
}
