use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use javelin_common::{SymbolKind, Span, Visibility};
use javelin_frontend::{
    Analysis, FrontendError, NodeId, NodeKind, Occurrence, ResolvedSymbol, ResolvingCompiler,
    SourceUnit, SymbolId, SyntaxNode, SyntaxTree, UnitAnalysis,
};
use javelin_project::{CompilerFactory, ModuleDescriptor};
use lsp_types::Url;

/// Invocation counters shared between tests and the compilers a factory
/// hands out.
#[derive(Debug, Default)]
pub struct FixtureStats {
    parse_calls: Mutex<HashMap<Url, usize>>,
    analyze_calls: Mutex<HashMap<Url, usize>>,
}

impl FixtureStats {
    pub fn parse_count(&self, uri: &Url) -> usize {
        self.parse_calls
            .lock()
            .unwrap()
            .get(uri)
            .copied()
            .unwrap_or(0)
    }

    pub fn analyze_count(&self, uri: &Url) -> usize {
        self.analyze_calls
            .lock()
            .unwrap()
            .get(uri)
            .copied()
            .unwrap_or(0)
    }

    fn note_parse(&self, uri: &Url) {
        *self
            .parse_calls
            .lock()
            .unwrap()
            .entry(uri.clone())
            .or_insert(0) += 1;
    }

    fn note_analyze(&self, uri: &Url) {
        *self
            .analyze_calls
            .lock()
            .unwrap()
            .entry(uri.clone())
            .or_insert(0) += 1;
    }
}

/// Factory handing out one [`FixtureCompiler`] per module, all sharing one
/// stats instance.
#[derive(Debug, Default)]
pub struct FixtureCompilerFactory {
    stats: Arc<FixtureStats>,
}

impl FixtureCompilerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> Arc<FixtureStats> {
        Arc::clone(&self.stats)
    }
}

impl CompilerFactory for FixtureCompilerFactory {
    fn create_compiler(
        &self,
        _descriptor: &ModuleDescriptor,
        units: &[SourceUnit],
    ) -> Box<dyn ResolvingCompiler> {
        Box::new(FixtureCompiler::new(units.to_vec(), Arc::clone(&self.stats)))
    }
}

// ---------------------------------------------------------------------------
// Lexing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Ident,
    Punct(char),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    text: String,
    span: Span,
}

fn tokenize(text: &str) -> Vec<Token> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if c == '/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if c == '/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            i += 2;
            while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
            continue;
        }
        if c == '"' {
            i += 1;
            while i < bytes.len() && bytes[i] != b'"' {
                if bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(bytes.len());
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < bytes.len()
                && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
            {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident,
                text: text[start..i].to_string(),
                span: Span::new(start, i),
            });
            continue;
        }
        if c.is_ascii_digit() {
            while i < bytes.len() && (bytes[i] as char).is_ascii_alphanumeric() {
                i += 1;
            }
            continue;
        }
        tokens.push(Token {
            kind: TokenKind::Punct(c),
            text: String::new(),
            span: Span::new(i, i + 1),
        });
        i += 1;
    }
    tokens
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Decl {
    kind: SymbolKind,
    name: String,
    qualified: String,
    visibility: Visibility,
    type_signature: String,
    name_span: Span,
    full_span: Span,
}

#[derive(Debug, Clone)]
struct IdentRef {
    text: String,
    span: Span,
    after_dot: bool,
    enclosing_type: Option<String>,
}

#[derive(Debug)]
struct ParsedUnit {
    unit: SourceUnit,
    tree: Arc<SyntaxTree>,
    package: String,
    imports: HashMap<String, String>,
    decls: Vec<Decl>,
    idents: Vec<IdentRef>,
}

struct TypeFrame {
    name: String,
    qualified: String,
    decl_index: usize,
    node: NodeId,
    body_depth: Option<usize>,
}

enum PendingOpen {
    Type,
    Method { decl_index: usize, node: NodeId },
}

fn visibility_of(modifier: Option<&str>) -> Visibility {
    match modifier {
        Some("public") => Visibility::Public,
        Some("protected") => Visibility::Protected,
        Some("private") => Visibility::Private,
        _ => Visibility::PackagePrivate,
    }
}

#[allow(clippy::too_many_lines)]
fn parse_unit(unit: &SourceUnit) -> ParsedUnit {
    let text = unit.text.as_ref();
    let tokens = tokenize(text);

    let mut nodes: Vec<SyntaxNode> = vec![SyntaxNode {
        kind: NodeKind::CompilationUnit,
        text: String::new(),
        span: Span::new(0, text.len()),
        parent: None,
    }];
    let mut decls: Vec<Decl> = Vec::new();
    let mut idents: Vec<IdentRef> = Vec::new();
    let mut package = String::new();
    let mut imports: HashMap<String, String> = HashMap::new();

    let mut type_stack: Vec<TypeFrame> = Vec::new();
    let mut method_stack: Vec<(usize, usize)> = Vec::new(); // (decl index, body depth)
    let mut depth: usize = 0;
    let mut pending_visibility: Option<&str> = None;
    let mut pending_open: Option<PendingOpen> = None;

    // Collect a dotted name starting at `start`, returning (name, span, next index).
    let collect_dotted = |start: usize| -> Option<(String, Span, usize)> {
        let mut parts: Vec<&str> = Vec::new();
        let mut j = start;
        let first_span = tokens.get(j)?.span;
        let mut last_span = first_span;
        loop {
            let token = tokens.get(j)?;
            if token.kind != TokenKind::Ident {
                return None;
            }
            parts.push(&token.text);
            last_span = token.span;
            j += 1;
            match tokens.get(j) {
                Some(t) if t.kind == TokenKind::Punct('.') => j += 1,
                _ => break,
            }
        }
        Some((
            parts.join("."),
            Span::new(first_span.start, last_span.end),
            j,
        ))
    };

    let parent_node = |type_stack: &[TypeFrame]| -> NodeId {
        type_stack.last().map(|f| f.node).unwrap_or(0)
    };

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].clone();
        match token.kind {
            TokenKind::Punct('{') => {
                depth += 1;
                match pending_open.take() {
                    Some(PendingOpen::Type) => {
                        if let Some(frame) = type_stack.last_mut() {
                            frame.body_depth = Some(depth);
                        }
                    }
                    Some(PendingOpen::Method { decl_index, .. }) => {
                        method_stack.push((decl_index, depth));
                    }
                    None => {}
                }
                i += 1;
            }
            TokenKind::Punct('}') => {
                if method_stack.last().map(|(_, d)| *d) == Some(depth) {
                    let (decl_index, _) = method_stack.pop().unwrap();
                    decls[decl_index].full_span.end = token.span.end;
                } else if type_stack.last().and_then(|f| f.body_depth) == Some(depth) {
                    let frame = type_stack.pop().unwrap();
                    decls[frame.decl_index].full_span.end = token.span.end;
                }
                depth = depth.saturating_sub(1);
                i += 1;
            }
            TokenKind::Ident => match token.text.as_str() {
                "package" if depth == 0 => {
                    if let Some((name, span, next)) = collect_dotted(i + 1) {
                        package = name.clone();
                        nodes.push(SyntaxNode {
                            kind: NodeKind::Package,
                            text: name,
                            span,
                            parent: Some(0),
                        });
                        i = next;
                    } else {
                        i += 1;
                    }
                }
                "import" if depth == 0 => {
                    if let Some((name, span, next)) = collect_dotted(i + 1) {
                        if let Some(simple) = name.rsplit('.').next() {
                            imports.insert(simple.to_string(), name.clone());
                        }
                        nodes.push(SyntaxNode {
                            kind: NodeKind::Import,
                            text: name,
                            span,
                            parent: Some(0),
                        });
                        i = next;
                    } else {
                        i += 1;
                    }
                }
                "public" | "protected" | "private" => {
                    pending_visibility = Some(match token.text.as_str() {
                        "public" => "public",
                        "protected" => "protected",
                        _ => "private",
                    });
                    i += 1;
                }
                "static" | "final" | "abstract" => {
                    i += 1;
                }
                "class" | "interface" | "enum" => {
                    let kind = match token.text.as_str() {
                        "class" => SymbolKind::Class,
                        "interface" => SymbolKind::Interface,
                        _ => SymbolKind::Enum,
                    };
                    let node_kind = match kind {
                        SymbolKind::Class => NodeKind::Class,
                        SymbolKind::Interface => NodeKind::Interface,
                        _ => NodeKind::Enum,
                    };
                    if let Some(name_token) = tokens.get(i + 1).filter(|t| t.kind == TokenKind::Ident)
                    {
                        let name = name_token.text.clone();
                        let mut qualified = String::new();
                        if let Some(outer) = type_stack.last() {
                            qualified.push_str(&outer.qualified);
                            qualified.push('$');
                        } else if !package.is_empty() {
                            qualified.push_str(&package);
                            qualified.push('.');
                        }
                        qualified.push_str(&name);

                        let parent = parent_node(&type_stack);
                        nodes.push(SyntaxNode {
                            kind: node_kind,
                            text: name.clone(),
                            span: name_token.span,
                            parent: Some(parent),
                        });
                        let node = (nodes.len() - 1) as NodeId;
                        decls.push(Decl {
                            kind,
                            name: name.clone(),
                            qualified: qualified.clone(),
                            visibility: visibility_of(pending_visibility.take()),
                            type_signature: qualified.clone(),
                            name_span: name_token.span,
                            full_span: name_token.span,
                        });
                        type_stack.push(TypeFrame {
                            name,
                            qualified,
                            decl_index: decls.len() - 1,
                            node,
                            body_depth: None,
                        });
                        pending_open = Some(PendingOpen::Type);
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                _ => {
                    let at_member_level = type_stack
                        .last()
                        .and_then(|f| f.body_depth)
                        == Some(depth)
                        && method_stack.last().map(|(_, d)| *d) != Some(depth);

                    if at_member_level {
                        i = parse_member(
                            &tokens,
                            i,
                            &mut nodes,
                            &mut decls,
                            &mut idents,
                            &type_stack,
                            &mut pending_visibility,
                            &mut pending_open,
                        );
                    } else {
                        let after_dot = i > 0 && tokens[i - 1].kind == TokenKind::Punct('.');
                        let parent = parent_node(&type_stack);
                        nodes.push(SyntaxNode {
                            kind: NodeKind::Identifier,
                            text: token.text.clone(),
                            span: token.span,
                            parent: Some(parent),
                        });
                        idents.push(IdentRef {
                            text: token.text.clone(),
                            span: token.span,
                            after_dot,
                            enclosing_type: type_stack.last().map(|f| f.qualified.clone()),
                        });
                        pending_visibility = None;
                        i += 1;
                    }
                }
            },
            TokenKind::Punct(_) => {
                i += 1;
            }
        }
    }

    ParsedUnit {
        unit: unit.clone(),
        tree: Arc::new(SyntaxTree::new(unit.uri.clone(), nodes)),
        package,
        imports,
        decls,
        idents,
    }
}

/// Parse one member declaration (method, constructor or field) starting at
/// token `i`, or fall back to recording a plain identifier reference.
/// Returns the index to continue from.
#[allow(clippy::too_many_arguments)]
fn parse_member(
    tokens: &[Token],
    i: usize,
    nodes: &mut Vec<SyntaxNode>,
    decls: &mut Vec<Decl>,
    idents: &mut Vec<IdentRef>,
    type_stack: &[TypeFrame],
    pending_visibility: &mut Option<&str>,
    pending_open: &mut Option<PendingOpen>,
) -> usize {
    let frame = type_stack.last().expect("member outside a type");
    let first = &tokens[i];
    let second = tokens.get(i + 1);
    let third = tokens.get(i + 2);

    let push_type_reference = |nodes: &mut Vec<SyntaxNode>, idents: &mut Vec<IdentRef>, token: &Token| {
        nodes.push(SyntaxNode {
            kind: NodeKind::Identifier,
            text: token.text.clone(),
            span: token.span,
            parent: Some(frame.node),
        });
        idents.push(IdentRef {
            text: token.text.clone(),
            span: token.span,
            after_dot: false,
            enclosing_type: Some(frame.qualified.clone()),
        });
    };

    // Constructor: `TypeName (`
    if first.text == frame.name && second.map(|t| t.kind) == Some(TokenKind::Punct('(')) {
        let visibility = visibility_of(pending_visibility.take());
        let (param_types, next) = parse_params(tokens, i + 1, nodes, idents, frame);
        nodes.push(SyntaxNode {
            kind: NodeKind::Constructor,
            text: first.text.clone(),
            span: first.span,
            parent: Some(frame.node),
        });
        let node = (nodes.len() - 1) as NodeId;
        decls.push(Decl {
            kind: SymbolKind::Constructor,
            name: first.text.clone(),
            qualified: format!("{}#{}", frame.qualified, first.text),
            visibility,
            type_signature: format!("({})", param_types.join(",")),
            name_span: first.span,
            full_span: first.span,
        });
        if tokens.get(next).map(|t| t.kind) == Some(TokenKind::Punct(';')) {
            return next + 1;
        }
        *pending_open = Some(PendingOpen::Method {
            decl_index: decls.len() - 1,
            node,
        });
        return next;
    }

    // Method: `ReturnType name (` — field: `FieldType name ;` or `FieldType name =`
    if let (Some(second), Some(third)) = (second, third) {
        if second.kind == TokenKind::Ident {
            if third.kind == TokenKind::Punct('(') {
                let visibility = visibility_of(pending_visibility.take());
                push_type_reference(nodes, idents, first);
                let (param_types, next) = parse_params(tokens, i + 2, nodes, idents, frame);
                nodes.push(SyntaxNode {
                    kind: NodeKind::Method,
                    text: second.text.clone(),
                    span: second.span,
                    parent: Some(frame.node),
                });
                let node = (nodes.len() - 1) as NodeId;
                decls.push(Decl {
                    kind: SymbolKind::Method,
                    name: second.text.clone(),
                    qualified: format!("{}#{}", frame.qualified, second.text),
                    visibility,
                    type_signature: format!("{}({})", first.text, param_types.join(",")),
                    name_span: second.span,
                    full_span: second.span,
                });
                if tokens.get(next).map(|t| t.kind) == Some(TokenKind::Punct(';')) {
                    return next + 1;
                }
                *pending_open = Some(PendingOpen::Method {
                    decl_index: decls.len() - 1,
                    node,
                });
                return next;
            }
            if third.kind == TokenKind::Punct(';') || third.kind == TokenKind::Punct('=') {
                let visibility = visibility_of(pending_visibility.take());
                push_type_reference(nodes, idents, first);
                nodes.push(SyntaxNode {
                    kind: NodeKind::Field,
                    text: second.text.clone(),
                    span: second.span,
                    parent: Some(frame.node),
                });
                decls.push(Decl {
                    kind: SymbolKind::Field,
                    name: second.text.clone(),
                    qualified: format!("{}#{}", frame.qualified, second.text),
                    visibility,
                    type_signature: first.text.clone(),
                    name_span: second.span,
                    full_span: second.span,
                });
                // Continue after the name; initializers flow through the
                // ordinary reference path.
                return i + 2;
            }
        }
    }

    // Anything else at member level is a plain reference.
    push_type_reference(nodes, idents, first);
    *pending_visibility = None;
    i + 1
}

/// Parse a parameter list starting at the `(` token. Parameter *types*
/// become identifier references; parameter names do not. Returns the
/// collected parameter type names and the index just past `)`.
fn parse_params(
    tokens: &[Token],
    open: usize,
    nodes: &mut Vec<SyntaxNode>,
    idents: &mut Vec<IdentRef>,
    frame: &TypeFrame,
) -> (Vec<String>, usize) {
    let mut param_types = Vec::new();
    let mut j = open + 1;
    let mut expecting_type = true;

    while j < tokens.len() {
        let token = &tokens[j];
        match token.kind {
            TokenKind::Punct(')') => {
                return (param_types, j + 1);
            }
            TokenKind::Punct(',') => {
                expecting_type = true;
                j += 1;
            }
            TokenKind::Ident => {
                if expecting_type {
                    param_types.push(token.text.clone());
                    nodes.push(SyntaxNode {
                        kind: NodeKind::Identifier,
                        text: token.text.clone(),
                        span: token.span,
                        parent: Some(frame.node),
                    });
                    idents.push(IdentRef {
                        text: token.text.clone(),
                        span: token.span,
                        after_dot: false,
                        enclosing_type: Some(frame.qualified.clone()),
                    });
                    expecting_type = false;
                }
                j += 1;
            }
            TokenKind::Punct(_) => {
                j += 1;
            }
        }
    }
    (param_types, j)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct MemberInfo {
    qualified: String,
    kind: SymbolKind,
    type_signature: String,
    unit: Url,
}

#[derive(Debug, Default)]
struct ModuleIndex {
    /// qualified type name -> (declaring unit, kind)
    types: HashMap<String, (Url, SymbolKind)>,
    /// qualified type name -> member name -> overloads
    members: HashMap<String, HashMap<String, Vec<MemberInfo>>>,
}

/// Deterministic fixture front-end for one module.
///
/// Resolution order for an identifier: enclosing-type member, same-package
/// type, imported type. Member access after `.` resolves only against the
/// enclosing type's own members; chain resolution belongs to a real
/// front-end. Imported types not declared in this module resolve to bare
/// symbol identities — the analysis core routes those through its own
/// indexes.
pub struct FixtureCompiler {
    units: HashMap<Url, SourceUnit>,
    parsed: HashMap<Url, Arc<ParsedUnit>>,
    index: Option<Arc<ModuleIndex>>,
    stats: Arc<FixtureStats>,
}

impl FixtureCompiler {
    pub fn new(units: Vec<SourceUnit>, stats: Arc<FixtureStats>) -> Self {
        Self {
            units: units
                .into_iter()
                .map(|unit| (unit.uri.clone(), unit))
                .collect(),
            parsed: HashMap::new(),
            index: None,
            stats,
        }
    }

    fn parsed_unit(&mut self, uri: &Url) -> Result<Arc<ParsedUnit>, FrontendError> {
        if let Some(parsed) = self.parsed.get(uri) {
            return Ok(Arc::clone(parsed));
        }
        let unit = self
            .units
            .get(uri)
            .cloned()
            .ok_or_else(|| FrontendError::UnknownUnit(uri.clone()))?;
        let parsed = Arc::new(parse_unit(&unit));
        self.parsed.insert(uri.clone(), Arc::clone(&parsed));
        Ok(parsed)
    }

    fn ensure_index(&mut self) -> Result<Arc<ModuleIndex>, FrontendError> {
        if let Some(index) = &self.index {
            return Ok(Arc::clone(index));
        }
        let uris: Vec<Url> = self.units.keys().cloned().collect();
        let mut index = ModuleIndex::default();
        for uri in uris {
            let parsed = self.parsed_unit(&uri)?;
            for decl in &parsed.decls {
                if decl.kind.is_type() {
                    index
                        .types
                        .entry(decl.qualified.clone())
                        .or_insert_with(|| (uri.clone(), decl.kind));
                } else if let Some((type_qualified, _)) = decl.qualified.split_once('#') {
                    index
                        .members
                        .entry(type_qualified.to_string())
                        .or_default()
                        .entry(decl.name.clone())
                        .or_default()
                        .push(MemberInfo {
                            qualified: decl.qualified.clone(),
                            kind: decl.kind,
                            type_signature: decl.type_signature.clone(),
                            unit: uri.clone(),
                        });
                }
            }
        }
        let index = Arc::new(index);
        self.index = Some(Arc::clone(&index));
        Ok(index)
    }

    fn resolve_ident(
        index: &ModuleIndex,
        parsed: &ParsedUnit,
        ident: &IdentRef,
    ) -> Option<(SymbolId, String, Option<Url>)> {
        // Member of the enclosing type, qualified (`x.member`) or not.
        if let Some(enclosing) = &ident.enclosing_type {
            if let Some(member) = index
                .members
                .get(enclosing)
                .and_then(|members| members.get(&ident.text))
                .and_then(|overloads| overloads.first())
            {
                return Some((
                    SymbolId::new(member.qualified.clone(), member.kind),
                    member.type_signature.clone(),
                    Some(member.unit.clone()),
                ));
            }
        }
        if ident.after_dot {
            // Unknown member of something else; a real front-end would
            // chase the receiver's type.
            return None;
        }

        // Type declared in the same package of this module.
        let same_package = if parsed.package.is_empty() {
            ident.text.clone()
        } else {
            format!("{}.{}", parsed.package, ident.text)
        };
        if let Some((unit, kind)) = index.types.get(&same_package) {
            return Some((
                SymbolId::new(same_package.clone(), *kind),
                same_package,
                Some(unit.clone()),
            ));
        }

        // Imported type: in-module if declared here, external otherwise.
        if let Some(qualified) = parsed.imports.get(&ident.text) {
            if let Some((unit, kind)) = index.types.get(qualified) {
                return Some((
                    SymbolId::new(qualified.clone(), *kind),
                    qualified.clone(),
                    Some(unit.clone()),
                ));
            }
            return Some((
                SymbolId::new(qualified.clone(), SymbolKind::Class),
                qualified.clone(),
                None,
            ));
        }

        None
    }

    fn resolve_unit(
        index: &ModuleIndex,
        parsed: &ParsedUnit,
    ) -> (UnitAnalysis, HashSet<Url>) {
        let mut symbols = Vec::new();
        let mut occurrences = Vec::new();

        for decl in &parsed.decls {
            let id = SymbolId::new(decl.qualified.clone(), decl.kind);
            symbols.push(ResolvedSymbol {
                id: id.clone(),
                name: decl.name.clone(),
                visibility: decl.visibility,
                declaring_unit: parsed.unit.uri.clone(),
                name_span: decl.name_span,
                full_span: decl.full_span,
                type_signature: decl.type_signature.clone(),
            });
            // Declaration sites are occurrences too, so reference search
            // can include or exclude them by comparing locations.
            occurrences.push(Occurrence {
                span: decl.name_span,
                target: id,
                target_type: decl.type_signature.clone(),
            });
        }

        let mut reached = HashSet::new();
        for ident in &parsed.idents {
            if let Some((target, target_type, declared_in)) =
                Self::resolve_ident(index, parsed, ident)
            {
                occurrences.push(Occurrence {
                    span: ident.span,
                    target,
                    target_type,
                });
                if let Some(unit) = declared_in {
                    if unit != parsed.unit.uri {
                        reached.insert(unit);
                    }
                }
            }
        }

        (
            UnitAnalysis {
                unit: parsed.unit.clone(),
                tree: Arc::clone(&parsed.tree),
                symbols,
                occurrences,
            },
            reached,
        )
    }
}

impl ResolvingCompiler for FixtureCompiler {
    fn parse(&mut self, unit: &SourceUnit) -> Result<SyntaxTree, FrontendError> {
        self.stats.note_parse(&unit.uri);
        let parsed = self.parsed_unit(&unit.uri)?;
        Ok((*parsed.tree).clone())
    }

    fn analyze(&mut self, tree: &SyntaxTree) -> Result<Analysis, FrontendError> {
        let uri = tree.uri.clone();
        self.stats.note_analyze(&uri);
        if !self.units.contains_key(&uri) {
            return Err(FrontendError::UnknownUnit(uri));
        }
        let index = self.ensure_index()?;

        // Analyzing one unit transitively analyzes every unit it reaches
        // within this module.
        let mut queue: VecDeque<Url> = VecDeque::new();
        let mut seen: HashSet<Url> = HashSet::new();
        let mut units = Vec::new();
        queue.push_back(uri);

        while let Some(next) = queue.pop_front() {
            if !seen.insert(next.clone()) {
                continue;
            }
            let parsed = self.parsed_unit(&next)?;
            let (analysis, reached) = Self::resolve_unit(&index, &parsed);
            units.push(analysis);
            for unit in reached {
                if !seen.contains(&unit) {
                    queue.push_back(unit);
                }
            }
        }

        Ok(Analysis { units })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(uri: &str, text: &str) -> SourceUnit {
        SourceUnit::new(Url::parse(uri).unwrap(), text)
    }

    fn compiler(units: Vec<SourceUnit>) -> FixtureCompiler {
        FixtureCompiler::new(units, Arc::new(FixtureStats::default()))
    }

    #[test]
    fn test_parse_collects_package_imports_and_decls() {
        let source = unit(
            "file:///m/src/main/java/a/Foo.java",
            r#"
package a;
import b.Helper;

public class Foo {
    private Helper helper;

    public Helper run(Helper input) {
        return helper;
    }
}
"#,
        );
        let parsed = parse_unit(&source);
        assert_eq!(parsed.package, "a");
        assert_eq!(parsed.imports.get("Helper"), Some(&"b.Helper".to_string()));

        let names: Vec<&str> = parsed.decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Foo", "helper", "run"]);
        assert_eq!(parsed.decls[0].qualified, "a.Foo");
        assert_eq!(parsed.decls[0].visibility, Visibility::Public);
        assert_eq!(parsed.decls[1].qualified, "a.Foo#helper");
        assert_eq!(parsed.decls[1].visibility, Visibility::Private);
        assert_eq!(parsed.decls[2].qualified, "a.Foo#run");
        assert_eq!(parsed.decls[2].type_signature, "Helper(Helper)");
    }

    #[test]
    fn test_nested_type_qualified_with_dollar() {
        let source = unit(
            "file:///m/src/main/java/a/Outer.java",
            r#"
package a;
public class Outer {
    class Inner {
    }
}
"#,
        );
        let parsed = parse_unit(&source);
        let qualified: Vec<&str> = parsed.decls.iter().map(|d| d.qualified.as_str()).collect();
        assert_eq!(qualified, vec!["a.Outer", "a.Outer$Inner"]);
    }

    #[test]
    fn test_analyze_resolves_same_package_type() {
        let foo = unit(
            "file:///m/src/main/java/a/Foo.java",
            "package a;\npublic class Foo {\n    Bar bar;\n}\n",
        );
        let bar = unit(
            "file:///m/src/main/java/a/Bar.java",
            "package a;\npublic class Bar {\n}\n",
        );
        let mut compiler = compiler(vec![foo.clone(), bar.clone()]);

        let tree = compiler.parse(&foo).unwrap();
        let analysis = compiler.analyze(&tree).unwrap();

        // Foo references Bar, so Bar's unit is analyzed transitively.
        let uris: HashSet<&str> = analysis.units.iter().map(|u| u.unit.uri.as_str()).collect();
        assert!(uris.contains("file:///m/src/main/java/a/Foo.java"));
        assert!(uris.contains("file:///m/src/main/java/a/Bar.java"));

        let foo_unit = analysis
            .units
            .iter()
            .find(|u| u.unit.uri == foo.uri)
            .unwrap();
        assert!(foo_unit
            .occurrences
            .iter()
            .any(|o| o.target.qualified_name == "a.Bar"));
    }

    #[test]
    fn test_analyze_keeps_imported_externals_unresolved() {
        let app = unit(
            "file:///m/src/main/java/b/App.java",
            "package b;\nimport a.B;\npublic class App {\n    B field;\n}\n",
        );
        let mut compiler = compiler(vec![app.clone()]);
        let tree = compiler.parse(&app).unwrap();
        let analysis = compiler.analyze(&tree).unwrap();

        assert_eq!(analysis.units.len(), 1);
        let occurrence = analysis.units[0]
            .occurrences
            .iter()
            .find(|o| o.target.qualified_name == "a.B")
            .expect("imported type should resolve to its qualified name");
        assert_eq!(occurrence.target.kind, SymbolKind::Class);
    }

    #[test]
    fn test_member_access_resolves_own_members_only() {
        let source = unit(
            "file:///m/src/main/java/a/Foo.java",
            r#"
package a;
public class Foo {
    Foo self;

    void touch() {
        self.touch();
    }
}
"#,
        );
        let mut c = compiler(vec![source.clone()]);
        let tree = c.parse(&source).unwrap();
        let analysis = c.analyze(&tree).unwrap();
        let own = &analysis.units[0];

        let touch_refs: Vec<_> = own
            .occurrences
            .iter()
            .filter(|o| o.target.qualified_name == "a.Foo#touch")
            .collect();
        // Declaration site plus the call site.
        assert!(touch_refs.len() >= 2);
    }
}
