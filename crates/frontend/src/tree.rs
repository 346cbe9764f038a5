use javelin_common::{SymbolKind, Span};
use lsp_types::Url;

/// Index of a node inside its tree's arena.
pub type NodeId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    CompilationUnit,
    Package,
    Import,
    Class,
    Interface,
    Enum,
    Method,
    Constructor,
    Field,
    Block,
    Identifier,
}

impl NodeKind {
    /// Nodes that declare a named symbol.
    pub const fn is_declaration(self) -> bool {
        matches!(
            self,
            Self::Class
                | Self::Interface
                | Self::Enum
                | Self::Method
                | Self::Constructor
                | Self::Field
        )
    }

    pub const fn symbol_kind(self) -> Option<SymbolKind> {
        match self {
            Self::Class => Some(SymbolKind::Class),
            Self::Interface => Some(SymbolKind::Interface),
            Self::Enum => Some(SymbolKind::Enum),
            Self::Method => Some(SymbolKind::Method),
            Self::Constructor => Some(SymbolKind::Constructor),
            Self::Field => Some(SymbolKind::Field),
            Self::Package => Some(SymbolKind::Package),
            _ => None,
        }
    }
}

/// One node in the flat tree arena. Declaration and identifier nodes carry
/// their name in `text` and span their name token; structural nodes span
/// their full extent with empty `text`.
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub text: String,
    pub span: Span,
    pub parent: Option<NodeId>,
}

/// Syntax tree for one source unit, stored as a flat arena in document
/// order. Node 0 is the compilation unit root.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    pub uri: Url,
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    pub fn new(uri: Url, nodes: Vec<SyntaxNode>) -> Self {
        Self { uri, nodes }
    }

    pub fn nodes(&self) -> &[SyntaxNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id as usize]
    }

    /// The declared package of this unit, or `""` for the default package.
    pub fn package(&self) -> &str {
        self.nodes
            .iter()
            .find(|n| n.kind == NodeKind::Package)
            .map(|n| n.text.as_str())
            .unwrap_or("")
    }

    /// The smallest node whose span contains `offset`.
    pub fn node_at(&self, offset: usize) -> Option<NodeId> {
        let mut best: Option<(NodeId, usize)> = None;
        for (id, node) in self.nodes.iter().enumerate() {
            if !node.span.contains(offset) {
                continue;
            }
            let size = node.span.len();
            match best {
                Some((_, best_size)) if best_size <= size => {}
                _ => best = Some((id as NodeId, size)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Cheap containment pre-check: does any named node carry `name`?
    ///
    /// Operates on the parsed, not yet analyzed, tree; references hidden
    /// behind aliasing forms the parser does not surface produce false
    /// negatives here, which is an accepted tradeoff.
    pub fn mentions_identifier(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| {
            (n.kind == NodeKind::Identifier || n.kind.is_declaration()) && n.text == name
        })
    }

    /// All declaration nodes, in document order.
    pub fn declarations(&self) -> impl Iterator<Item = (NodeId, &SyntaxNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind.is_declaration())
            .map(|(id, n)| (id as NodeId, n))
    }

    /// The nearest enclosing declaration of a node, if any.
    pub fn enclosing_declaration(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.node(id).parent;
        while let Some(parent_id) = current {
            if self.node(parent_id).kind.is_declaration() {
                return Some(parent_id);
            }
            current = self.node(parent_id).parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> SyntaxTree {
        let uri = Url::parse("file:///tmp/Foo.java").unwrap();
        SyntaxTree::new(
            uri,
            vec![
                SyntaxNode {
                    kind: NodeKind::CompilationUnit,
                    text: String::new(),
                    span: Span::new(0, 100),
                    parent: None,
                },
                SyntaxNode {
                    kind: NodeKind::Class,
                    text: "Foo".into(),
                    span: Span::new(6, 9),
                    parent: Some(0),
                },
                SyntaxNode {
                    kind: NodeKind::Identifier,
                    text: "bar".into(),
                    span: Span::new(20, 23),
                    parent: Some(1),
                },
            ],
        )
    }

    #[test]
    fn test_node_at_prefers_smallest() {
        let t = tree();
        assert_eq!(t.node_at(21), Some(2));
        assert_eq!(t.node_at(7), Some(1));
        assert_eq!(t.node_at(50), Some(0));
        assert_eq!(t.node_at(500), None);
    }

    #[test]
    fn test_mentions_identifier() {
        let t = tree();
        assert!(t.mentions_identifier("bar"));
        assert!(t.mentions_identifier("Foo"));
        assert!(!t.mentions_identifier("baz"));
    }

    #[test]
    fn test_enclosing_declaration() {
        let t = tree();
        assert_eq!(t.enclosing_declaration(2), Some(1));
        assert_eq!(t.enclosing_declaration(1), None);
    }
}
