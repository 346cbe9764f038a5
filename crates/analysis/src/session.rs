use std::sync::Arc;

use javelin_common::{span_to_range, PackageId, SymbolDescriptor, Visibility};
use javelin_project::{ModuleRegistry, PlatformLibraries};
use lsp_types::{Location, Position, Url};
use serde::Serialize;

use crate::cache::CompilationCache;
use crate::cancel::RequestContext;
use crate::resolver::{HoverData, SymbolResolver};
use crate::search::{
    DocumentSymbol, ReferenceQuery, SearchEngine, SymbolHit, SymbolQuery, DEFAULT_REFERENCE_LIMIT,
};
use crate::streaming::PartialResultStream;

/// Options for a references request.
#[derive(Debug, Default)]
pub struct ReferencesOptions {
    pub include_declaration: bool,
    pub limit: Option<usize>,
    /// Attaching a stream switches the request to incremental delivery;
    /// the synchronous return value is then empty.
    pub stream: Option<PartialResultStream>,
}

/// Metadata for one module: the package it provides and what it depends on.
#[derive(Debug, Clone, Serialize)]
pub struct PackageInformation {
    pub package: PackageId,
    pub dependencies: Vec<PackageId>,
}

/// One declared dependency edge of the repository.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyReference {
    pub dependency: PackageId,
    pub declaring_module: PackageId,
}

/// The analysis core's facade: one instance per session, shared by every
/// request task. Holds the module registry built at session start, the
/// session-wide compilation cache, and the platform-library configuration.
///
/// Every method maps to one request endpoint. None of them return errors:
/// routing misses, front-end failures and unresolvable symbols all
/// degrade to empty results (logged where they happen).
pub struct Session {
    registry: Arc<ModuleRegistry>,
    cache: CompilationCache,
    platform: PlatformLibraries,
}

impl Session {
    pub fn new(registry: Arc<ModuleRegistry>, platform: PlatformLibraries) -> Self {
        Self {
            registry,
            cache: CompilationCache::new(),
            platform,
        }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &CompilationCache {
        &self.cache
    }

    fn resolver(&self) -> SymbolResolver<'_> {
        SymbolResolver::new(&self.registry, &self.cache, &self.platform)
    }

    fn engine(&self) -> SearchEngine<'_> {
        SearchEngine::new(&self.registry, &self.cache)
    }

    /// The resolved symbol under the cursor.
    pub fn hover(&self, uri: &Url, position: Position, ctx: &RequestContext) -> Option<HoverData> {
        self.resolver().hover(uri, position, ctx)
    }

    /// The definition site of the symbol under the cursor, which may be in
    /// a different file than the cursor.
    pub fn definition(
        &self,
        uri: &Url,
        position: Position,
        ctx: &RequestContext,
    ) -> Option<Location> {
        self.xdefinition(uri, position, ctx).map(|(location, _)| location)
    }

    /// Definition plus the cross-repository descriptor identifying the
    /// symbol to other repositories.
    pub fn xdefinition(
        &self,
        uri: &Url,
        position: Position,
        ctx: &RequestContext,
    ) -> Option<(Location, SymbolDescriptor)> {
        let resolver = self.resolver();
        let hover = resolver.hover(uri, position, ctx)?;
        let module = self.registry.module_for_uri(uri)?;
        resolver
            .resolve_definition(&hover, &module, ctx)
            .found()
            .map(|data| (data.location, data.descriptor))
    }

    /// References to the symbol under the cursor, across all modules.
    pub fn references(
        &self,
        uri: &Url,
        position: Position,
        options: &ReferencesOptions,
        ctx: &RequestContext,
    ) -> Vec<Location> {
        let resolver = self.resolver();
        let Some(hover) = resolver.hover(uri, position, ctx) else {
            return Vec::new();
        };
        let Some(module) = self.registry.module_for_uri(uri) else {
            return Vec::new();
        };

        // The definition (when resolvable) supplies the visibility used
        // for scope pruning and the declaration site to exclude.
        let declaration = resolver.resolve_declaration(&hover, &module, ctx);
        let (definition, visibility, declaring_module) = match &declaration {
            Some((owning, symbol)) => (
                Some(Location {
                    uri: symbol.declaring_unit.clone(),
                    range: span_to_range(owning.text(), symbol.name_span),
                }),
                symbol.visibility,
                self.registry
                    .module_for_uri(&symbol.declaring_unit)
                    .map(|m| m.id().clone()),
            ),
            None => (None, Visibility::Public, None),
        };

        let query = ReferenceQuery {
            symbol: hover.symbol.clone(),
            definition,
            visibility,
            declaring_module,
            include_declaration: options.include_declaration,
            limit: options.limit.unwrap_or(DEFAULT_REFERENCE_LIMIT),
        };
        self.engine().references(&query, options.stream.as_ref(), ctx)
    }

    /// Ranked workspace-wide symbol search.
    pub fn workspace_symbol(&self, query: &SymbolQuery, ctx: &RequestContext) -> Vec<SymbolHit> {
        self.engine().workspace_symbols(query, ctx)
    }

    /// Declarations of one document, in document order.
    pub fn document_symbol(&self, uri: &Url, ctx: &RequestContext) -> Vec<DocumentSymbol> {
        self.engine().document_symbols(uri, ctx)
    }

    /// Cross-repository references: occurrences matching `descriptor`,
    /// searched in modules that declare a dependency on `package`.
    pub fn x_references(
        &self,
        descriptor: &SymbolDescriptor,
        package: &PackageId,
        options: &ReferencesOptions,
        ctx: &RequestContext,
    ) -> Vec<Location> {
        self.engine().cross_repository_references(
            descriptor,
            package,
            options.limit.unwrap_or(DEFAULT_REFERENCE_LIMIT),
            options.stream.as_ref(),
            ctx,
        )
    }

    /// The packages this repository provides, with their direct
    /// dependencies.
    pub fn x_packages(&self) -> Vec<PackageInformation> {
        self.registry
            .modules()
            .iter()
            .map(|module| PackageInformation {
                package: module.id().clone(),
                dependencies: module.dependencies().to_vec(),
            })
            .collect()
    }

    /// Every dependency edge declared by any module of the repository.
    pub fn x_dependencies(&self) -> Vec<DependencyReference> {
        let mut edges: Vec<DependencyReference> = self
            .registry
            .modules()
            .iter()
            .flat_map(|module| {
                module.dependencies().iter().map(|dependency| DependencyReference {
                    dependency: dependency.clone(),
                    declaring_module: module.id().clone(),
                })
            })
            .collect();
        edges.sort_by(|a, b| {
            (&a.declaring_module, &a.dependency).cmp(&(&b.declaring_module, &b.dependency))
        });
        edges
    }
}
