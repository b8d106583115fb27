//! The Class Definition table
//!
//! A ClassDef maps glyphs to small integer class numbers, grouping glyphs
//! for rule application. Format 1 assigns one class per consecutive glyph
//! starting at some id; format 2 assigns a class to each of a list of glyph
//! ranges. Glyphs absent from the table take the implicit class 0.

use std::collections::{BTreeMap, HashSet};

use crate::buffer::Buffer;
use crate::coverage::Coverage;
use crate::error::DecodeError;
use crate::glyph_id::GlyphId;
use crate::glyph_order::GlyphOrder;
use crate::handle::GlyphHandle;

const TABLE: &str = "ClassDef";

/// A mapping from glyphs to integer classes.
///
/// Entries are kept in first-occurrence order until
/// [`consolidate`](ClassDef::consolidate) sorts and deduplicates them by
/// index. Duplicate raw indices are suppressed at parse time, first range
/// winning on overlap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassDef {
    /// The (glyph, class) assignments.
    pub entries: Vec<(GlyphHandle, u16)>,
    /// The largest class value observed.
    pub max_class: u16,
}

impl ClassDef {
    /// Decode a class definition table at the buffer's cursor.
    pub fn decode(buf: &mut Buffer) -> Result<Self, DecodeError> {
        let start = buf.pos();
        buf.check_from(start, TABLE, "format", 4)?;
        let format = buf.read16u()?;
        let mut def = ClassDef::default();
        match format {
            1 => {
                buf.check_from(start, TABLE, "start glyph and count", 6)?;
                let start_gid = buf.read16u()?;
                let count = buf.read16u()? as usize;
                buf.check_from(start, TABLE, "class value array", 6 + count * 2)?;
                def.entries.reserve(count);
                for i in 0..count {
                    let class = buf.read16u()?;
                    // consecutive ids are unique by construction, no dedup
                    def.push(GlyphHandle::from_index(start_gid.wrapping_add(i as u16)), class);
                }
            }
            2 => {
                let range_count = buf.read16u()? as usize;
                buf.check_from(start, TABLE, "class range records", 4 + range_count * 6)?;
                let mut seen = HashSet::new();
                for _ in 0..range_count {
                    let range_start = buf.read16u()?;
                    let range_end = buf.read16u()?;
                    let class = buf.read16u()?;
                    for gid in range_start..=range_end {
                        // ranges may overlap; the first one wins
                        if seen.insert(gid) {
                            def.push(GlyphHandle::from_index(gid), class);
                        }
                    }
                }
            }
            other => {
                return Err(DecodeError::UnknownFormat {
                    table: TABLE,
                    format: other,
                })
            }
        }
        Ok(def)
    }

    /// Assign class 0 to every glyph of `coverage` not already present.
    ///
    /// This completes the class map over a known glyph set before encoding;
    /// presence is judged by raw index, so references that do not carry an
    /// index yet are skipped.
    pub fn extend(&mut self, coverage: &Coverage) {
        let present: HashSet<u16> = self
            .entries
            .iter()
            .filter_map(|(glyph, _)| glyph.index())
            .collect();
        for glyph in coverage.iter() {
            match glyph.index() {
                Some(gid) if !present.contains(&gid) => self.entries.push((glyph.clone(), 0)),
                _ => (),
            }
        }
    }

    /// Resolve every glyph against `order`, then sort and deduplicate by
    /// index.
    ///
    /// Unresolvable references are dropped, not errors.
    pub fn consolidate(&mut self, order: &GlyphOrder) {
        self.entries.retain_mut(|(glyph, _)| {
            let resolved = order.consolidate(glyph);
            if !resolved {
                log::warn!("class definition drops unresolvable glyph reference {glyph:?}");
            }
            resolved
        });
        self.entries.sort_by_key(|(glyph, _)| glyph.index());
        self.entries.dedup_by_key(|(glyph, _)| glyph.index());
    }

    /// The class of `gid`; glyphs not in the map take class 0.
    pub fn class_of(&self, gid: GlyphId) -> u16 {
        self.entries
            .iter()
            .find(|(glyph, _)| glyph.index() == Some(gid.to_u16()))
            .map(|(_, class)| *class)
            .unwrap_or(0)
    }

    /// Encode as format 2, the only format emitted.
    ///
    /// Class-0 entries are elided (format 2 need not represent the implicit
    /// default); remaining entries are run-length encoded over consecutive
    /// indices sharing a class. The class definition must be consolidated.
    pub fn encode(&self) -> Buffer {
        let mut nonzero: Vec<(u16, u16)> = self
            .entries
            .iter()
            .filter(|(_, class)| *class != 0)
            .filter_map(|(glyph, class)| glyph.index().map(|gid| (gid, *class)))
            .collect();
        nonzero.sort_unstable_by_key(|&(gid, _)| gid);

        let mut buf = Buffer::new();
        buf.write16(2);
        let Some((&(first, first_class), rest)) = nonzero.split_first() else {
            buf.write16(0);
            return buf;
        };
        let mut ranges: Vec<(u16, u16, u16)> = Vec::new();
        let mut run = (first, first, first_class);
        for &(gid, class) in rest {
            if gid == run.1.wrapping_add(1) && class == run.2 {
                run.1 = gid;
            } else {
                ranges.push(run);
                run = (gid, gid, class);
            }
        }
        ranges.push(run);
        buf.write16(ranges.len() as u16);
        for (range_start, range_end, class) in ranges {
            buf.write16(range_start);
            buf.write16(range_end);
            buf.write16(class);
        }
        buf
    }

    /// The number of class assignments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if no glyph is assigned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate the (glyph, class) assignments.
    pub fn iter(&self) -> impl Iterator<Item = (&GlyphHandle, u16)> {
        self.entries.iter().map(|(glyph, class)| (glyph, *class))
    }

    /// The assignments as a name→class map.
    ///
    /// References that do not carry a name yet are omitted.
    pub fn class_by_name_map(&self) -> BTreeMap<&str, u16> {
        self.entries
            .iter()
            .filter_map(|(glyph, class)| glyph.name().map(|name| (name, *class)))
            .collect()
    }

    /// Build a class definition from (name, class) pairs; empty names are
    /// dropped.
    pub fn from_named_classes<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u16)>,
        S: Into<String>,
    {
        let mut def = ClassDef::default();
        for (name, class) in pairs {
            let glyph = GlyphHandle::from_name(name);
            if !glyph.is_empty() {
                def.push(glyph, class);
            }
        }
        def
    }

    fn push(&mut self, glyph: GlyphHandle, class: u16) {
        self.max_class = self.max_class.max(class);
        self.entries.push((glyph, class));
    }
}

impl<S: Into<String>> FromIterator<(S, u16)> for ClassDef {
    fn from_iter<T: IntoIterator<Item = (S, u16)>>(iter: T) -> Self {
        ClassDef::from_named_classes(iter)
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::*;
    use serde::de::{IgnoredAny, MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeClass {
        Class(u16),
        Other(IgnoredAny),
    }

    impl Serialize for ClassDef {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(None)?;
            for (glyph, class) in &self.entries {
                if let Some(name) = glyph.name() {
                    map.serialize_entry(name, class)?;
                }
            }
            map.end()
        }
    }

    impl<'de> Deserialize<'de> for ClassDef {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            struct ClassDefVisitor;

            impl<'de> Visitor<'de> for ClassDefVisitor {
                type Value = ClassDef;

                fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    f.write_str("a map from glyph name to class")
                }

                fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ClassDef, A::Error> {
                    let mut def = ClassDef::default();
                    while let Some((name, class)) = access.next_entry::<String, MaybeClass>()? {
                        if let MaybeClass::Class(class) = class {
                            let glyph = GlyphHandle::from_name(name);
                            if !glyph.is_empty() {
                                def.push(glyph, class);
                            }
                        }
                    }
                    Ok(def)
                }
            }

            deserializer.deserialize_map(ClassDefVisitor)
        }
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn to_json_is_name_to_class_map() {
        let def: ClassDef = [("A", 1u16), ("B", 2)].into_iter().collect();
        assert_eq!(serde_json::to_string(&def).unwrap(), r#"{"A":1,"B":2}"#);
    }

    #[test]
    fn from_json_omits_non_integer_classes() {
        let def: ClassDef = serde_json::from_str(r#"{"A":1,"B":"x","C":2}"#).unwrap();
        let map = def.class_by_name_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("A"), Some(&1));
        assert_eq!(map.get("C"), Some(&2));
    }
}
