#![allow(clippy::option_if_let_else)]

//! # Javelin analysis core
//!
//! Session-wide code intelligence over an immutable snapshot of a
//! multi-module repository: a memoizing [`CompilationCache`] with
//! exactly-once analysis semantics, transitive package listing, symbol
//! resolution from cursor position to cross-file definition, and a
//! cross-module search engine with scope pruning, ranking, streaming and
//! cooperative cancellation.
//!
//! [`Session`] is the facade the request-dispatch layer talks to; every
//! operation it exposes maps to one language-protocol endpoint.

pub mod cache;
pub mod cancel;
pub mod listing;
pub mod resolver;
pub mod search;
pub mod session;
pub mod streaming;

pub use cache::{AnalyzeResult, CompilationCache, ParseResult};
pub use cancel::{CancellationFlag, RequestContext};
pub use listing::{transitive_package_members, PackageMember};
pub use resolver::{HoverData, ResolveOutcome, SymbolResolver};
pub use search::{
    DocumentSymbol, ReferenceQuery, SearchEngine, SymbolHit, SymbolQuery, DEFAULT_REFERENCE_LIMIT,
};
pub use session::{DependencyReference, PackageInformation, ReferencesOptions, Session};
pub use streaming::{PartialResultPatch, PartialResultStream};
