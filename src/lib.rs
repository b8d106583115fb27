//! Shared structures of OpenType layout tables
//!
//! This crate is the binary codec core of a font compiler: it converts the
//! Coverage and Class Definition structures that every GSUB/GPOS subtable
//! is composed from between their wire form and an in-memory model, and
//! provides the machinery those codecs (and the rule-subtable codecs built
//! on top of them) share:
//!
//! - [`Buffer`], a cursor-based byte buffer with big-endian primitives and
//!   the ping/pong offset-patch protocol for nested subtables;
//! - [`Handle`] and its domain newtypes, symbolic/numeric references that
//!   are resolved ("consolidated") against the font's [`GlyphOrder`];
//! - [`Coverage`] and [`ClassDef`], including their range compression and
//!   size-minimizing format selection.
//!
//! Decoding is strict and all-or-nothing (see [`DecodeError`]), while
//! consolidation is deliberately lenient: references that cannot be
//! resolved are dropped with a warning rather than failing the table.
//!
//! # Example
//!
//! ```
//! use otl_common::{Buffer, Coverage, GlyphId, GlyphOrder};
//!
//! // the font's canonical glyph order, built once at load time
//! let mut order = GlyphOrder::new();
//! order.register_by_index(GlyphId::new(0), ".notdef");
//! order.register_by_index(GlyphId::new(4), "A");
//! order.register_by_index(GlyphId::new(5), "B");
//!
//! // decode a format-1 coverage listing glyphs 5 and 4
//! let mut data = Buffer::from(vec![0u8, 1, 0, 2, 0, 5, 0, 4]);
//! let mut coverage = Coverage::decode(&mut data)?;
//! coverage.consolidate(&order);
//! assert_eq!(coverage.glyph_names(), ["A", "B"]);
//!
//! // re-encode, letting the codec pick the smaller format
//! let encoded = coverage.encode();
//! assert_eq!(encoded.as_slice(), [0u8, 1, 0, 2, 0, 4, 0, 5]);
//! # Ok::<(), otl_common::DecodeError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

mod buffer;
mod class_def;
mod coverage;
mod error;
mod glyph_id;
mod glyph_order;
mod handle;

pub use buffer::{Buffer, OffsetRun};
pub use class_def::ClassDef;
pub use coverage::Coverage;
pub use error::DecodeError;
pub use glyph_id::GlyphId;
pub use glyph_order::{GlyphOrder, NameOrigin};
pub use handle::{AxisHandle, FdHandle, GlyphHandle, Handle, LookupHandle};
