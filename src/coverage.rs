//! The Coverage table
//!
//! A Coverage table enumerates the set of glyphs a layout rule applies to.
//! It has two wire formats: format 1 is a literal glyph index list, format 2
//! a list of (start, end, startCoverageIndex) ranges.

use std::collections::HashSet;

use crate::buffer::Buffer;
use crate::error::DecodeError;
use crate::glyph_order::GlyphOrder;
use crate::handle::GlyphHandle;

const TABLE: &str = "Coverage";

/// An ordered set of glyphs a layout rule applies to.
///
/// Freshly decoded coverage holds index-only references in first-occurrence
/// order, with duplicate indices suppressed at parse time.
/// [`consolidate`](Coverage::consolidate) resolves every reference against
/// the glyph order, drops the unresolvable ones, and leaves the set sorted
/// by index and deduplicated, which is what the encoders expect.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Coverage {
    /// The covered glyphs.
    pub glyphs: Vec<GlyphHandle>,
}

impl Coverage {
    /// Decode a coverage table at the buffer's cursor.
    pub fn decode(buf: &mut Buffer) -> Result<Self, DecodeError> {
        let start = buf.pos();
        buf.check_from(start, TABLE, "format and count", 4)?;
        let format = buf.read16u()?;
        let count = buf.read16u()? as usize;
        let mut seen = HashSet::new();
        let mut glyphs = Vec::new();
        match format {
            1 => {
                buf.check_from(start, TABLE, "glyph array", 4 + count * 2)?;
                glyphs.reserve(count);
                for _ in 0..count {
                    let gid = buf.read16u()?;
                    if seen.insert(gid) {
                        glyphs.push(GlyphHandle::from_index(gid));
                    }
                }
            }
            2 => {
                buf.check_from(start, TABLE, "range records", 4 + count * 6)?;
                for _ in 0..count {
                    let range_start = buf.read16u()?;
                    let range_end = buf.read16u()?;
                    // startCoverageIndex is recomputed when re-encoding
                    let _start_coverage_index = buf.read16u()?;
                    for gid in range_start..=range_end {
                        if seen.insert(gid) {
                            glyphs.push(GlyphHandle::from_index(gid));
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
        Ok(Coverage { glyphs })
    }

    /// Resolve every glyph against `order`, then sort and deduplicate by
    /// index.
    ///
    /// Unresolvable references are dropped, not errors: dangling references
    /// in malformed upstream input are tolerated.
    pub fn consolidate(&mut self, order: &GlyphOrder) {
        self.glyphs.retain_mut(|glyph| {
            let resolved = order.consolidate(glyph);
            if !resolved {
                log::warn!("coverage drops unresolvable glyph reference {glyph:?}");
            }
            resolved
        });
        self.glyphs.sort_by_key(|glyph| glyph.index());
        self.glyphs.dedup_by_key(|glyph| glyph.index());
    }

    /// Encode, choosing whichever wire format is smaller.
    ///
    /// The coverage must be consolidated. Ties go to format 1.
    pub fn encode(&self) -> Buffer {
        if self.glyphs.is_empty() {
            return self.encode_format1();
        }
        let format1 = self.encode_format1();
        let format2 = self.encode_format2();
        if format2.len() < format1.len() {
            format2
        } else {
            format1
        }
    }

    /// Encode as format 1, the literal glyph index list.
    ///
    /// The coverage must be consolidated.
    pub fn encode_format1(&self) -> Buffer {
        let gids = self.indices();
        let mut buf = Buffer::new();
        buf.write16(1);
        buf.write16(gids.len() as u16);
        for gid in gids {
            buf.write16(gid);
        }
        buf
    }

    /// Encode as format 2, consolidated ranges.
    ///
    /// The coverage must be consolidated and non-empty.
    pub fn encode_format2(&self) -> Buffer {
        debug_assert!(!self.glyphs.is_empty(), "cannot encode an empty coverage");
        let gids = self.indices();
        let mut ranges: Vec<(u16, u16, u16)> = Vec::new();
        // glyphs covered before the current range began
        let mut covered = 0u16;
        if let Some((&first, rest)) = gids.split_first() {
            let mut run = (first, first);
            for &gid in rest {
                if gid == run.1.wrapping_add(1) {
                    run.1 = gid;
                } else {
                    ranges.push((run.0, run.1, covered));
                    covered = covered.wrapping_add((run.1 - run.0).wrapping_add(1));
                    run = (gid, gid);
                }
            }
            ranges.push((run.0, run.1, covered));
        }
        let mut buf = Buffer::new();
        buf.write16(2);
        buf.write16(ranges.len() as u16);
        for (range_start, range_end, start_coverage_index) in ranges {
            buf.write16(range_start);
            buf.write16(range_end);
            buf.write16(start_coverage_index);
        }
        buf
    }

    /// Add a glyph, keeping a consolidated coverage sorted and unique.
    ///
    /// Returns the glyph's coverage index; if it is already covered, the
    /// existing index.
    pub fn add(&mut self, glyph: GlyphHandle) -> u16 {
        match self
            .glyphs
            .binary_search_by_key(&glyph.index(), |g| g.index())
        {
            Ok(ix) => ix as u16,
            Err(ix) => {
                self.glyphs.insert(ix, glyph);
                ix as u16
            }
        }
    }

    /// The number of covered glyphs.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// `true` if no glyph is covered.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Iterate the covered glyphs.
    pub fn iter(&self) -> impl Iterator<Item = &GlyphHandle> {
        self.glyphs.iter()
    }

    /// The glyph names, in coverage order.
    ///
    /// References that do not carry a name yet are omitted.
    pub fn glyph_names(&self) -> Vec<&str> {
        self.glyphs.iter().filter_map(|glyph| glyph.name()).collect()
    }

    /// Build a coverage from glyph names; empty names are dropped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Coverage {
            glyphs: names
                .into_iter()
                .map(GlyphHandle::from_name)
                .filter(|glyph| !glyph.is_empty())
                .collect(),
        }
    }

    fn indices(&self) -> Vec<u16> {
        self.glyphs.iter().filter_map(|glyph| glyph.index()).collect()
    }
}

impl FromIterator<GlyphHandle> for Coverage {
    fn from_iter<T: IntoIterator<Item = GlyphHandle>>(iter: T) -> Self {
        Coverage {
            glyphs: iter.into_iter().collect(),
        }
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::*;
    use serde::de::IgnoredAny;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeName {
        Name(String),
        Other(IgnoredAny),
    }

    impl Serialize for Coverage {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let names = self.glyph_names();
            let mut seq = serializer.serialize_seq(Some(names.len()))?;
            for name in names {
                seq.serialize_element(name)?;
            }
            seq.end()
        }
    }

    impl<'de> Deserialize<'de> for Coverage {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let entries = Vec::<MaybeName>::deserialize(deserializer)?;
            Ok(Coverage::from_names(entries.into_iter().filter_map(
                |entry| match entry {
                    MaybeName::Name(name) => Some(name),
                    MaybeName::Other(_) => None,
                },
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph_id::GlyphId;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn decode(bytes: Vec<u8>) -> Result<Coverage, DecodeError> {
        Coverage::decode(&mut Buffer::from(bytes))
    }

    fn indices(cov: &Coverage) -> Vec<u16> {
        cov.glyphs.iter().filter_map(|g| g.index()).collect()
    }

    fn consolidated(gids: &[u16]) -> Coverage {
        gids.iter()
            .map(|&gid| GlyphHandle::consolidated(gid, format!("g{gid}")))
            .collect()
    }

    #[test]
    fn decode_format1_dedups_keeping_first() {
        let cov = decode(vec![0, 1, 0, 3, 0, 5, 0, 5, 0, 6]).unwrap();
        assert_eq!(indices(&cov), [5, 6]);
    }

    #[test]
    fn decode_format2_overlapping_ranges() {
        // 4..=6 and 5..=8; overlap keeps first occurrence
        let cov = decode(vec![
            0, 2, 0, 2, //
            0, 4, 0, 6, 0, 0, //
            0, 5, 0, 8, 0, 3,
        ])
        .unwrap();
        assert_eq!(indices(&cov), [4, 5, 6, 7, 8]);
    }

    #[test]
    fn decode_too_short() {
        let mut bytes = vec![0, 1, 0, 100];
        bytes.extend([0u8; 6]);
        assert_eq!(
            decode(bytes).unwrap_err(),
            DecodeError::TooShort {
                table: "Coverage",
                reading: "glyph array",
                expected: 4 + 100 * 2,
                actual: 10,
            }
        );
    }

    #[test]
    fn decode_truncated_header() {
        assert!(matches!(
            decode(vec![0, 1]).unwrap_err(),
            DecodeError::TooShort { expected: 4, .. }
        ));
    }

    #[rstest]
    #[case::format_0(0)]
    #[case::format_3(3)]
    fn decode_unknown_format(#[case] format: u16) {
        let [hi, lo] = format.to_be_bytes();
        assert_eq!(
            decode(vec![hi, lo, 0, 0]).unwrap_err(),
            DecodeError::UnknownFormat {
                table: "Coverage",
                format,
            }
        );
    }

    #[test]
    fn consolidate_resolves_sorts_and_drops() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut order = GlyphOrder::new();
        order.register_by_index(GlyphId::new(4), "A");
        order.register_by_index(GlyphId::new(9), "B");

        let mut cov = decode(vec![0, 1, 0, 3, 0, 9, 0, 4, 0, 77]).unwrap();
        cov.consolidate(&order);
        assert_eq!(indices(&cov), [4, 9]);
        assert_eq!(cov.glyph_names(), ["A", "B"]);
        assert!(cov.glyphs.iter().all(|g| g.is_consolidated()));
    }

    #[test]
    fn encode_format1_round_trip() {
        let cov = consolidated(&[2, 5, 6, 9]);
        let encoded = cov.encode_format1();
        assert_eq!(encoded.as_slice(), &[0, 1, 0, 4, 0, 2, 0, 5, 0, 6, 0, 9]);
        let back = decode(encoded.into_bytes()).unwrap();
        assert_eq!(indices(&back), [2, 5, 6, 9]);
    }

    #[test]
    fn encode_format2_round_trip() {
        let cov = consolidated(&[2, 5, 6, 9]);
        let encoded = cov.encode_format2();
        assert_eq!(
            encoded.as_slice(),
            &[
                0, 2, 0, 3, //
                0, 2, 0, 2, 0, 0, //
                0, 5, 0, 6, 0, 1, //
                0, 9, 0, 9, 0, 3,
            ]
        );
        let back = decode(encoded.into_bytes()).unwrap();
        assert_eq!(indices(&back), [2, 5, 6, 9]);
    }

    #[test]
    fn encode_flushes_final_open_run() {
        let cov = consolidated(&[10, 11, 12]);
        assert_eq!(cov.encode_format2().as_slice(), &[0, 2, 0, 1, 0, 10, 0, 12, 0, 0]);
    }

    #[test]
    fn auto_format_never_larger_than_either() {
        let sparse = consolidated(&[1, 40, 90, 1000]);
        let dense = consolidated(&(100..180).collect::<Vec<_>>());
        for cov in [sparse, dense, consolidated(&[7])] {
            let auto = cov.encode();
            assert!(auto.len() <= cov.encode_format1().len());
            assert!(auto.len() <= cov.encode_format2().len());
        }
    }

    #[test]
    fn auto_format_prefers_ranges_for_dense_sets() {
        let dense = consolidated(&(100..180).collect::<Vec<_>>());
        let encoded = dense.encode();
        assert_eq!(encoded.as_slice()[..2], [0, 2]);
        assert_eq!(encoded.len(), 4 + 6);
    }

    #[test]
    fn empty_coverage_encodes_as_format1() {
        assert_eq!(Coverage::default().encode().as_slice(), &[0, 1, 0, 0]);
    }

    #[test]
    fn add_keeps_sorted_unique() {
        let mut cov = consolidated(&[3, 7]);
        assert_eq!(cov.add(GlyphHandle::consolidated(5, "g5")), 1);
        assert_eq!(cov.add(GlyphHandle::consolidated(7, "g7")), 2);
        assert_eq!(indices(&cov), [3, 5, 7]);
    }

    #[test]
    fn from_names_drops_empty() {
        let cov = Coverage::from_names(["A", "", "B"]);
        assert_eq!(cov.glyph_names(), ["A", "B"]);
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn to_json_is_name_list() {
        let cov: Coverage = [(1, "A"), (2, "B")]
            .into_iter()
            .map(|(gid, name)| GlyphHandle::consolidated(gid, name))
            .collect();
        assert_eq!(serde_json::to_string(&cov).unwrap(), r#"["A","B"]"#);
    }

    #[test]
    fn from_json_omits_non_strings() {
        let cov: Coverage = serde_json::from_str(r#"["A", 5, "B", null]"#).unwrap();
        assert_eq!(cov.glyph_names(), ["A", "B"]);
    }
}
