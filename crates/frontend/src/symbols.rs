use std::sync::Arc;

use javelin_common::{names, SymbolKind, Span, Visibility};
use lsp_types::Url;
use serde::{Deserialize, Serialize};

use crate::compiler::SourceUnit;
use crate::tree::SyntaxTree;

/// Identity of a resolved symbol, comparable across modules.
///
/// Qualified names follow JVM binary-name conventions (see
/// [`javelin_common::names`]); member names keep their parameter list so
/// overloads stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolId {
    pub qualified_name: String,
    pub kind: SymbolKind,
}

impl SymbolId {
    pub fn new(qualified_name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            kind,
        }
    }

    pub fn simple_name(&self) -> &str {
        names::simple_name(&self.qualified_name)
    }

    pub fn package_name(&self) -> &str {
        names::package_of(&self.qualified_name)
    }
}

/// A declared symbol produced by semantic analysis.
#[derive(Debug, Clone)]
pub struct ResolvedSymbol {
    pub id: SymbolId,
    pub name: String,
    pub visibility: Visibility,
    /// Unit whose analysis declares this symbol.
    pub declaring_unit: Url,
    /// Span of the declared name token.
    pub name_span: Span,
    /// Span of the whole declaration.
    pub full_span: Span,
    /// Display form of the static type (field/variable type, method
    /// signature, or the type's own qualified name).
    pub type_signature: String,
}

impl ResolvedSymbol {
    /// Top-level declared types are indexed by qualified name.
    pub fn is_top_level_type(&self) -> bool {
        self.id.kind.is_type()
            && !self.id.qualified_name.contains('$')
            && !self.id.qualified_name.contains('#')
    }

    pub fn enclosing_top_level(&self) -> &str {
        names::top_level_type(&self.id.qualified_name)
    }
}

/// A resolved identifier use site inside one unit.
#[derive(Debug, Clone)]
pub struct Occurrence {
    pub span: Span,
    pub target: SymbolId,
    /// Static type observed at the use site.
    pub target_type: String,
}

/// Everything analysis produced for a single unit.
#[derive(Debug, Clone)]
pub struct UnitAnalysis {
    pub unit: SourceUnit,
    pub tree: Arc<SyntaxTree>,
    pub symbols: Vec<ResolvedSymbol>,
    pub occurrences: Vec<Occurrence>,
}

/// Multi-unit output of [`crate::ResolvingCompiler::analyze`]: the requested
/// unit plus every unit transitively reached while analyzing it.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub units: Vec<UnitAnalysis>,
}
