#![allow(clippy::option_if_let_else)]

//! # Javelin front-end boundary
//!
//! The analysis core does not parse or type-check source text itself; a
//! per-module *resolving compiler* does, behind the [`ResolvingCompiler`]
//! trait. This crate defines that boundary: immutable source units, syntax
//! trees with position-addressable nodes, and the resolved symbols and
//! occurrences a full semantic analysis produces.
//!
//! A resolving compiler is stateful and not internally thread-safe; the
//! owning module serializes access to it.

pub mod compiler;
pub mod symbols;
pub mod tree;

pub use compiler::{FrontendError, ResolvingCompiler, SourceUnit};
pub use symbols::{Analysis, Occurrence, ResolvedSymbol, SymbolId, UnitAnalysis};
pub use tree::{NodeId, NodeKind, SyntaxNode, SyntaxTree};
