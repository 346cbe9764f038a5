use serde::{Deserialize, Serialize};

use crate::package::PackageId;

/// Kind of a declared or referenced symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Package,
    Class,
    Interface,
    Enum,
    Method,
    Constructor,
    Field,
    Variable,
}

impl SymbolKind {
    /// Type-shaped kinds: the ones that can be declared at the top level of
    /// a compilation unit and indexed by qualified name.
    pub const fn is_type(self) -> bool {
        matches!(self, Self::Class | Self::Interface | Self::Enum)
    }

    pub fn to_lsp(self) -> lsp_types::SymbolKind {
        match self {
            Self::Package => lsp_types::SymbolKind::PACKAGE,
            Self::Class => lsp_types::SymbolKind::CLASS,
            Self::Interface => lsp_types::SymbolKind::INTERFACE,
            Self::Enum => lsp_types::SymbolKind::ENUM,
            Self::Method => lsp_types::SymbolKind::METHOD,
            Self::Constructor => lsp_types::SymbolKind::CONSTRUCTOR,
            Self::Field => lsp_types::SymbolKind::FIELD,
            Self::Variable => lsp_types::SymbolKind::VARIABLE,
        }
    }
}

/// Declared visibility, used to prune reference-search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    PackagePrivate,
    Private,
}

/// Candidate fields a [`SymbolDescriptor`] is matched against.
#[derive(Debug, Clone, Copy)]
pub struct SymbolFacts<'a> {
    pub name: &'a str,
    pub qualified_name: &'a str,
    pub container_name: Option<&'a str>,
    pub package_name: &'a str,
    pub kind: SymbolKind,
    pub module: Option<&'a PackageId>,
}

/// Structured symbol query. Unset fields act as wildcards: the descriptor
/// matches a candidate when every *set* field equals the candidate's field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolDescriptor {
    pub name: Option<String>,
    pub qualified_name: Option<String>,
    pub container_name: Option<String>,
    pub package_name: Option<String>,
    pub kind: Option<SymbolKind>,
    pub module: Option<PackageId>,
}

impl SymbolDescriptor {
    pub fn matches(&self, facts: &SymbolFacts<'_>) -> bool {
        if let Some(name) = &self.name {
            if name != facts.name {
                return false;
            }
        }
        if let Some(qualified) = &self.qualified_name {
            if qualified != facts.qualified_name {
                return false;
            }
        }
        if let Some(container) = &self.container_name {
            if facts.container_name != Some(container.as_str()) {
                return false;
            }
        }
        if let Some(package) = &self.package_name {
            if package != facts.package_name {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if kind != facts.kind {
                return false;
            }
        }
        if let Some(module) = &self.module {
            if facts.module != Some(module) {
                return false;
            }
        }
        true
    }

    /// A descriptor with simple name, outer container and kind all set: the
    /// shape eligible for the filename-based fast path and the smallest
    /// result budget.
    pub fn is_fully_structured(&self) -> bool {
        self.name.is_some() && self.container_name.is_some() && self.kind.is_some()
    }

    /// Strip the module field, keeping the symbol-shaped fields. Used after
    /// a module pre-filter has already consumed the module part.
    pub fn without_module(&self) -> Self {
        Self {
            module: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts<'a>() -> SymbolFacts<'a> {
        SymbolFacts {
            name: "run",
            qualified_name: "a.b.Foo#run()",
            container_name: Some("a.b.Foo"),
            package_name: "a.b",
            kind: SymbolKind::Method,
            module: None,
        }
    }

    #[test]
    fn test_empty_descriptor_matches_anything() {
        assert!(SymbolDescriptor::default().matches(&facts()));
    }

    #[test]
    fn test_set_fields_must_equal() {
        let mut query = SymbolDescriptor {
            name: Some("run".into()),
            kind: Some(SymbolKind::Method),
            ..Default::default()
        };
        assert!(query.matches(&facts()));

        query.kind = Some(SymbolKind::Field);
        assert!(!query.matches(&facts()));
    }

    #[test]
    fn test_module_field_mismatches_unknown_candidate() {
        let query = SymbolDescriptor {
            module: Some(PackageId::new("com.acme", "core", "1.0")),
            ..Default::default()
        };
        assert!(!query.matches(&facts()));
        assert!(query.without_module().matches(&facts()));
    }
}
