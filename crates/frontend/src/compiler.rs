use std::sync::Arc;

use lsp_types::Url;
use thiserror::Error;

use crate::symbols::Analysis;
use crate::tree::SyntaxTree;

/// One immutable source file. Created on first access by its owning module
/// and never mutated or invalidated within a session.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub uri: Url,
    pub text: Arc<str>,
}

impl SourceUnit {
    pub fn new(uri: Url, text: impl Into<Arc<str>>) -> Self {
        Self {
            uri,
            text: text.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("parse failed for {uri}: {message}")]
    Parse { uri: Url, message: String },

    #[error("analysis failed for {uri}: {message}")]
    Analyze { uri: Url, message: String },

    #[error("source unit {0} is not on this compiler's source path")]
    UnknownUnit(Url),
}

/// Per-module resolving front-end.
///
/// Stateful and not internally thread-safe: callers must hold the owning
/// module's compiler lock across a call. `analyze` has non-local effects —
/// resolving one unit may pull in and analyze further units of the same
/// module, all of which appear in the returned [`Analysis`].
pub trait ResolvingCompiler: Send {
    fn parse(&mut self, unit: &SourceUnit) -> Result<SyntaxTree, FrontendError>;

    fn analyze(&mut self, tree: &SyntaxTree) -> Result<Analysis, FrontendError>;
}
