#![allow(clippy::option_if_let_else)]

//! Shared primitives for the Javelin analysis core.
//!
//! Everything here is plain data: byte spans and their conversion to
//! line/column positions, Maven-style package coordinates, symbol kinds and
//! visibilities, and the wildcard symbol descriptor used by structured
//! queries. No component logic lives in this crate.

pub mod names;
pub mod package;
pub mod span;
pub mod symbols;

pub use package::{PackageId, PackageIdError};
pub use span::{offset_to_position, position_to_offset, span_to_range, Span};
pub use symbols::{SymbolDescriptor, SymbolFacts, SymbolKind, Visibility};
