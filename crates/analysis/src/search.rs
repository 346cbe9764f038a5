use std::cmp::Ordering;
use std::sync::Arc;

use itertools::Itertools;
use javelin_common::{
    names, span_to_range, PackageId, SymbolDescriptor, SymbolFacts, SymbolKind, Visibility,
};
use javelin_frontend::{NodeId, NodeKind, SymbolId, SyntaxTree};
use javelin_project::{Module, ModuleRegistry};
use lsp_types::{Location, Url};
use tracing::debug;

use crate::cache::CompilationCache;
use crate::cancel::RequestContext;
use crate::streaming::PartialResultStream;

/// Default cap on reference results per request.
pub const DEFAULT_REFERENCE_LIMIT: usize = 200;

/// A fully-resolved reference-search request.
#[derive(Debug, Clone)]
pub struct ReferenceQuery {
    pub symbol: SymbolId,
    /// Declaration site, when resolution found one. Used to exclude the
    /// declaration from results and to prune file-private searches.
    pub definition: Option<Location>,
    pub visibility: Visibility,
    pub declaring_module: Option<PackageId>,
    pub include_declaration: bool,
    pub limit: usize,
}

/// Free-text or structured symbol search.
#[derive(Debug, Clone)]
pub enum SymbolQuery {
    Text(String),
    Descriptor(SymbolDescriptor),
}

/// One ranked workspace-symbol result.
#[derive(Debug, Clone)]
pub struct SymbolHit {
    pub name: String,
    pub kind: SymbolKind,
    pub location: Location,
    pub container_name: Option<String>,
    pub score: f64,
}

/// One entry of a document-symbol listing, in document order.
#[derive(Debug, Clone)]
pub struct DocumentSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub location: Location,
    pub container_name: Option<String>,
}

/// Cross-module reference and symbol search with scope pruning, streaming
/// and cooperative cancellation.
pub struct SearchEngine<'a> {
    registry: &'a ModuleRegistry,
    cache: &'a CompilationCache,
}

impl<'a> SearchEngine<'a> {
    pub fn new(registry: &'a ModuleRegistry, cache: &'a CompilationCache) -> Self {
        Self { registry, cache }
    }

    /// Find references to one symbol.
    ///
    /// Per module, per file: a cheap containment pre-check on the *parsed*
    /// tree rejects files that cannot mention the symbol's simple name,
    /// full analysis runs only on hits, and the definition's visibility
    /// prunes the candidate set (file-private → same file, package-private
    /// → same package). Results accumulate up to `query.limit`.
    ///
    /// With a stream attached, results are appended incrementally and the
    /// returned vector is empty (ordering is impossible mid-stream and the
    /// final response of a streamed request carries nothing). Without one,
    /// results are sorted by (uri, start line, start col, end line,
    /// end col) for determinism. Cancellation is polled between modules and
    /// files; once observed, the result is empty in both modes.
    pub fn references(
        &self,
        query: &ReferenceQuery,
        stream: Option<&PartialResultStream>,
        ctx: &RequestContext,
    ) -> Vec<Location> {
        let simple = query.symbol.simple_name().to_string();
        let package = query.symbol.package_name().to_string();
        let mut results: Vec<Location> = Vec::new();

        'modules: for module in self.candidate_modules(query) {
            if ctx.cancelled() {
                return Vec::new();
            }
            for uri in self.candidate_files(&module, query, &package) {
                if ctx.cancelled() {
                    return Vec::new();
                }
                if results.len() >= query.limit {
                    break 'modules;
                }

                let Some(parsed) = self.cache.parse(&uri, &module) else {
                    continue;
                };
                if !parsed.tree.mentions_identifier(&simple) {
                    continue;
                }
                let Some(analyzed) = self.cache.analyze(&uri, &module, ctx) else {
                    continue;
                };

                for occurrence in &analyzed.occurrences {
                    if occurrence.target != query.symbol {
                        continue;
                    }
                    let location = Location {
                        uri: uri.clone(),
                        range: span_to_range(analyzed.text(), occurrence.span),
                    };
                    if !query.include_declaration {
                        if let Some(definition) = &query.definition {
                            if *definition == location {
                                continue;
                            }
                        }
                    }
                    if let Some(stream) = stream {
                        stream.emit_location(&location);
                    }
                    results.push(location);
                    if results.len() >= query.limit {
                        break;
                    }
                }
            }
        }

        if ctx.cancelled() {
            return Vec::new();
        }
        if stream.is_some() {
            return Vec::new();
        }
        sort_locations(&mut results);
        results
    }

    /// References across every module of the repository, scoped to symbols
    /// of one dependency package.
    ///
    /// Modules whose declared dependency set does not include `package` are
    /// skipped up front. That is an optimization, not a correctness filter:
    /// it may under-search when dependency metadata is incomplete, which is
    /// an accepted tradeoff.
    pub fn cross_repository_references(
        &self,
        descriptor: &SymbolDescriptor,
        package: &PackageId,
        limit: usize,
        stream: Option<&PartialResultStream>,
        ctx: &RequestContext,
    ) -> Vec<Location> {
        // The module pre-filter consumes the coordinates; an occurrence
        // does not know its target's declaring module.
        let query = descriptor.without_module();
        let simple = query
            .name
            .clone()
            .or_else(|| {
                query
                    .qualified_name
                    .as_deref()
                    .map(|q| names::simple_name(q).to_string())
            });

        let mut results: Vec<Location> = Vec::new();

        'modules: for module in self.registry.modules() {
            if ctx.cancelled() {
                return Vec::new();
            }
            if module.id() != package && !module.dependencies().contains(package) {
                continue;
            }
            for uri in module.source_uris() {
                if ctx.cancelled() {
                    return Vec::new();
                }
                if results.len() >= limit {
                    break 'modules;
                }

                let Some(parsed) = self.cache.parse(uri, module) else {
                    continue;
                };
                if let Some(simple) = &simple {
                    if !parsed.tree.mentions_identifier(simple) {
                        continue;
                    }
                }
                let Some(analyzed) = self.cache.analyze(uri, module, ctx) else {
                    continue;
                };

                for occurrence in &analyzed.occurrences {
                    if !query.matches(&occurrence_facts(&occurrence.target)) {
                        continue;
                    }
                    let location = Location {
                        uri: uri.clone(),
                        range: span_to_range(analyzed.text(), occurrence.span),
                    };
                    if let Some(stream) = stream {
                        stream.emit_location(&location);
                    }
                    results.push(location);
                    if results.len() >= limit {
                        break;
                    }
                }
            }
        }

        if ctx.cancelled() {
            return Vec::new();
        }
        if stream.is_some() {
            return Vec::new();
        }
        sort_locations(&mut results);
        results
    }

    /// Ranked workspace-symbol search over parse-level declarations.
    ///
    /// Structured queries carrying an outer-container name are first
    /// satisfied by scanning only files whose basename matches that
    /// container; only when that yields nothing does the full scan run.
    pub fn workspace_symbols(&self, query: &SymbolQuery, ctx: &RequestContext) -> Vec<SymbolHit> {
        let budget = result_budget(query);

        if let SymbolQuery::Descriptor(descriptor) = query {
            if let Some(container) = &descriptor.container_name {
                let stem = names::simple_name(container).to_string();
                let hits = self.scan_symbols(Some(&stem), query, budget, ctx);
                if !hits.is_empty() {
                    return hits;
                }
                debug!(
                    "container fast path for {} found nothing, falling back to full scan",
                    stem
                );
            }
        }
        self.scan_symbols(None, query, budget, ctx)
    }

    /// Declarations of one document, in document order.
    pub fn document_symbols(&self, uri: &Url, ctx: &RequestContext) -> Vec<DocumentSymbol> {
        if ctx.cancelled() {
            return Vec::new();
        }
        let Some(module) = self.registry.module_for_uri(uri) else {
            return Vec::new();
        };
        let Some(parsed) = self.cache.parse(uri, &module) else {
            return Vec::new();
        };

        let package = parsed.tree.package().to_string();
        let mut symbols = Vec::new();
        for (id, node) in parsed.tree.declarations() {
            let Some(kind) = node.kind.symbol_kind() else {
                continue;
            };
            symbols.push(DocumentSymbol {
                name: node.text.clone(),
                kind,
                location: Location {
                    uri: uri.clone(),
                    range: span_to_range(parsed.text(), node.span),
                },
                container_name: container_of_node(&parsed.tree, id, &package),
            });
        }
        symbols
    }

    fn scan_symbols(
        &self,
        stem_filter: Option<&str>,
        query: &SymbolQuery,
        budget: usize,
        ctx: &RequestContext,
    ) -> Vec<SymbolHit> {
        let mut candidates: Vec<SymbolHit> = Vec::new();

        for module in self.registry.modules() {
            if ctx.cancelled() {
                return Vec::new();
            }
            for uri in module.source_uris() {
                if ctx.cancelled() {
                    return Vec::new();
                }
                if let Some(stem) = stem_filter {
                    if file_stem(uri) != Some(stem) {
                        continue;
                    }
                }
                let Some(parsed) = self.cache.parse(uri, module) else {
                    continue;
                };
                let package = parsed.tree.package().to_string();

                for (id, node) in parsed.tree.declarations() {
                    let Some(kind) = node.kind.symbol_kind() else {
                        continue;
                    };
                    let qualified = parse_level_qualified(&parsed.tree, id, &package);
                    let container = container_of_node(&parsed.tree, id, &package);
                    let scored = score_candidate(
                        query,
                        &node.text,
                        &qualified,
                        container.as_deref(),
                        &package,
                        kind,
                        module.id(),
                        uri,
                    );
                    let Some(score) = scored else {
                        continue;
                    };
                    candidates.push(SymbolHit {
                        name: node.text.clone(),
                        kind,
                        location: Location {
                            uri: uri.clone(),
                            range: span_to_range(parsed.text(), node.span),
                        },
                        container_name: container,
                        score,
                    });
                }
            }
        }

        candidates
            .into_iter()
            .sorted_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| compare_locations(&a.location, &b.location))
            })
            .take(budget)
            .collect()
    }

    fn candidate_modules(&self, query: &ReferenceQuery) -> Vec<Arc<Module>> {
        match query.visibility {
            Visibility::Private | Visibility::PackagePrivate => query
                .declaring_module
                .as_ref()
                .and_then(|id| self.registry.get(id).cloned())
                .map(|module| vec![module])
                .unwrap_or_else(|| self.registry.modules().to_vec()),
            Visibility::Public | Visibility::Protected => self.registry.modules().to_vec(),
        }
    }

    fn candidate_files(&self, module: &Module, query: &ReferenceQuery, package: &str) -> Vec<Url> {
        match query.visibility {
            Visibility::Private => query
                .definition
                .as_ref()
                .map(|definition| vec![definition.uri.clone()])
                .unwrap_or_else(|| module.source_uris().to_vec()),
            Visibility::PackagePrivate => module.files_in_package(package).to_vec(),
            Visibility::Public | Visibility::Protected => module.source_uris().to_vec(),
        }
    }
}

/// Score one candidate name against a query. Exact matches dominate,
/// case-insensitive and prefix matches follow, shorter names and shorter
/// paths break ties, and type-shaped symbols get a flat bonus.
pub fn score_symbol(query: &str, candidate: &str, kind: SymbolKind, uri: &Url) -> f64 {
    let mut score = 0.0;
    if !query.is_empty() && !candidate.is_empty() {
        if candidate == query {
            score += 1000.0;
        } else if candidate.eq_ignore_ascii_case(query) {
            score += 900.0;
        } else if candidate
            .to_lowercase()
            .starts_with(&query.to_lowercase())
        {
            score += 50.0;
        }
        score += 10.0 * query.len() as f64 / candidate.len() as f64;
    }
    score += 10.0 / uri.as_str().len().max(1) as f64;
    if matches!(
        kind,
        SymbolKind::Class | SymbolKind::Interface | SymbolKind::Enum | SymbolKind::Package
    ) {
        score += 200.0;
    }
    score
}

/// Result budget by query shape: 3 for a fully structured query, 10 for
/// free text longer than 4 characters, 5 otherwise.
fn result_budget(query: &SymbolQuery) -> usize {
    match query {
        SymbolQuery::Descriptor(descriptor) if descriptor.is_fully_structured() => 3,
        SymbolQuery::Text(text) if text.len() > 4 => 10,
        _ => 5,
    }
}

#[allow(clippy::too_many_arguments)]
fn score_candidate(
    query: &SymbolQuery,
    name: &str,
    qualified: &str,
    container: Option<&str>,
    package: &str,
    kind: SymbolKind,
    module: &PackageId,
    uri: &Url,
) -> Option<f64> {
    match query {
        SymbolQuery::Text(text) => {
            if !name.to_lowercase().contains(&text.to_lowercase()) {
                return None;
            }
            Some(score_symbol(text, name, kind, uri))
        }
        SymbolQuery::Descriptor(descriptor) => {
            let facts = SymbolFacts {
                name,
                qualified_name: qualified,
                container_name: container,
                package_name: package,
                kind,
                module: Some(module),
            };
            if !descriptor.matches(&facts) {
                return None;
            }
            let text = descriptor
                .name
                .as_deref()
                .or_else(|| descriptor.qualified_name.as_deref().map(names::simple_name))
                .unwrap_or("");
            Some(score_symbol(text, name, kind, uri))
        }
    }
}

fn occurrence_facts(target: &SymbolId) -> SymbolFacts<'_> {
    SymbolFacts {
        name: target.simple_name(),
        qualified_name: &target.qualified_name,
        container_name: names::container_of(&target.qualified_name),
        package_name: target.package_name(),
        kind: target.kind,
        module: None,
    }
}

/// Qualified name a declaration node would carry after analysis, minus
/// member parameter lists (this is the parse-level approximation used for
/// symbol search).
fn parse_level_qualified(tree: &SyntaxTree, id: NodeId, package: &str) -> String {
    let node = tree.node(id);
    let mut chain: Vec<&str> = Vec::new();
    let mut current = tree.enclosing_declaration(id);
    while let Some(ancestor_id) = current {
        let ancestor = tree.node(ancestor_id);
        if ancestor.kind.symbol_kind().map(SymbolKind::is_type) == Some(true) {
            chain.push(&ancestor.text);
        }
        current = tree.enclosing_declaration(ancestor_id);
    }
    chain.reverse();

    let mut qualified = String::new();
    if !package.is_empty() {
        qualified.push_str(package);
        qualified.push('.');
    }
    let is_member = matches!(
        node.kind,
        NodeKind::Method | NodeKind::Constructor | NodeKind::Field
    );
    if is_member && !chain.is_empty() {
        qualified.push_str(&chain.join("$"));
        qualified.push('#');
        qualified.push_str(&node.text);
    } else {
        chain.push(&node.text);
        qualified.push_str(&chain.join("$"));
    }
    qualified
}

fn container_of_node(tree: &SyntaxTree, id: NodeId, package: &str) -> Option<String> {
    let parent = tree.enclosing_declaration(id)?;
    Some(parse_level_qualified(tree, parent, package))
}

fn compare_locations(a: &Location, b: &Location) -> Ordering {
    a.uri
        .as_str()
        .cmp(b.uri.as_str())
        .then(a.range.start.line.cmp(&b.range.start.line))
        .then(a.range.start.character.cmp(&b.range.start.character))
        .then(a.range.end.line.cmp(&b.range.end.line))
        .then(a.range.end.character.cmp(&b.range.end.character))
}

fn sort_locations(locations: &mut [Location]) {
    locations.sort_by(compare_locations);
}

fn file_stem(uri: &Url) -> Option<&str> {
    let segment = uri.path_segments()?.last()?;
    segment
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .or(Some(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri() -> Url {
        Url::parse("file:///repo/core/src/main/java/a/Foo.java").unwrap()
    }

    #[test]
    fn test_exact_match_beats_prefix_beats_substring() {
        let exact = score_symbol("Foo", "Foo", SymbolKind::Class, &uri());
        let prefix = score_symbol("Foo", "FooBar", SymbolKind::Class, &uri());
        let substring = score_symbol("Foo", "Xfoo", SymbolKind::Class, &uri());
        assert!(exact > prefix);
        assert!(prefix > substring);
    }

    #[test]
    fn test_case_insensitive_exact_outranks_prefix() {
        let ci_exact = score_symbol("foo", "Foo", SymbolKind::Class, &uri());
        let prefix = score_symbol("Foo", "FooBar", SymbolKind::Class, &uri());
        assert!(ci_exact > prefix);
    }

    #[test]
    fn test_type_kinds_get_bonus() {
        let class = score_symbol("Foo", "Foo", SymbolKind::Class, &uri());
        let method = score_symbol("Foo", "Foo", SymbolKind::Method, &uri());
        assert!(class > method);
        assert!((class - method - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shorter_uri_favored() {
        let short = Url::parse("file:///r/Foo.java").unwrap();
        let a = score_symbol("Foo", "Foo", SymbolKind::Class, &short);
        let b = score_symbol("Foo", "Foo", SymbolKind::Class, &uri());
        assert!(a > b);
    }

    #[test]
    fn test_budget_by_query_shape() {
        let structured = SymbolQuery::Descriptor(SymbolDescriptor {
            name: Some("run".into()),
            container_name: Some("a.Foo".into()),
            kind: Some(SymbolKind::Method),
            ..Default::default()
        });
        assert_eq!(result_budget(&structured), 3);
        assert_eq!(result_budget(&SymbolQuery::Text("query".into())), 10);
        assert_eq!(result_budget(&SymbolQuery::Text("Foo".into())), 5);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(&uri()), Some("Foo"));
        let bare = Url::parse("file:///repo/README").unwrap();
        assert_eq!(file_stem(&bare), Some("README"));
    }
}
