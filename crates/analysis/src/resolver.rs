use std::sync::Arc;

use javelin_common::{names, position_to_offset, span_to_range, PackageId, SymbolDescriptor, SymbolKind};
use javelin_frontend::{ResolvedSymbol, SymbolId};
use javelin_project::{Module, ModuleRegistry, PlatformLibraries};
use lsp_types::{Location, Position, Url};
use tracing::debug;

use crate::cache::{AnalyzeResult, CompilationCache};
use crate::cancel::RequestContext;
use crate::listing::{transitive_package_members, PackageMember};

/// Everything known about the symbol under a cursor: its identity, static
/// type, source location, and the two signature forms — one for internal
/// cross-referencing, one for cross-repository identification.
///
/// Transient: constructed per request, never cached.
#[derive(Debug, Clone)]
pub struct HoverData {
    pub symbol: SymbolId,
    pub name: String,
    pub type_signature: String,
    pub location: Location,
    pub internal_signature: String,
    pub descriptor: SymbolDescriptor,
}

/// Outcome of definition resolution. `NotFound` is a normal result for
/// local, anonymous, platform-owned or otherwise container-less symbols,
/// not an error.
#[derive(Debug, Clone)]
pub enum ResolveOutcome {
    Found(HoverData),
    NotFound,
}

impl ResolveOutcome {
    pub fn found(self) -> Option<HoverData> {
        match self {
            Self::Found(data) => Some(data),
            Self::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Turns cursor positions into resolved symbols and resolved symbols into
/// true, possibly cross-file, definitions.
pub struct SymbolResolver<'a> {
    registry: &'a ModuleRegistry,
    cache: &'a CompilationCache,
    platform: &'a PlatformLibraries,
}

impl<'a> SymbolResolver<'a> {
    pub fn new(
        registry: &'a ModuleRegistry,
        cache: &'a CompilationCache,
        platform: &'a PlatformLibraries,
    ) -> Self {
        Self {
            registry,
            cache,
            platform,
        }
    }

    /// The resolved symbol at `position`, read from the smallest analyzed
    /// span containing it.
    pub fn hover(&self, uri: &Url, position: Position, ctx: &RequestContext) -> Option<HoverData> {
        let module = self.registry.module_for_uri(uri)?;
        let analyzed = self.cache.analyze(uri, &module, ctx)?;
        let offset = position_to_offset(analyzed.text(), position);

        let occurrence = analyzed
            .occurrences
            .iter()
            .filter(|o| o.span.contains(offset))
            .min_by_key(|o| o.span.len());

        if let Some(occurrence) = occurrence {
            let location = Location {
                uri: uri.clone(),
                range: span_to_range(analyzed.text(), occurrence.span),
            };
            return Some(self.hover_data(
                occurrence.target.clone(),
                occurrence.target.simple_name().to_string(),
                occurrence.target_type.clone(),
                location,
                &module,
            ));
        }

        let declaration = analyzed
            .symbols
            .iter()
            .filter(|s| s.name_span.contains(offset))
            .min_by_key(|s| s.name_span.len())?;
        let location = Location {
            uri: uri.clone(),
            range: span_to_range(analyzed.text(), declaration.name_span),
        };
        Some(self.hover_data(
            declaration.id.clone(),
            declaration.name.clone(),
            declaration.type_signature.clone(),
            location,
            &module,
        ))
    }

    /// Resolve a hovered symbol to its true definition site.
    ///
    /// Fast path: the enclosing top-level type is already indexed by
    /// qualified name. Otherwise the owning source unit is located through
    /// the transitive package listing and analyzed — the cross-file case.
    /// Same-named members are disambiguated by static type.
    pub fn resolve_definition(
        &self,
        hover: &HoverData,
        module: &Arc<Module>,
        ctx: &RequestContext,
    ) -> ResolveOutcome {
        match self.resolve_declaration(hover, module, ctx) {
            Some((owning, symbol)) => {
                let location = Location {
                    uri: symbol.declaring_unit.clone(),
                    range: span_to_range(owning.text(), symbol.name_span),
                };
                let data = self.hover_data(
                    symbol.id.clone(),
                    symbol.name.clone(),
                    symbol.type_signature.clone(),
                    location,
                    module,
                );
                ResolveOutcome::Found(data)
            }
            None => ResolveOutcome::NotFound,
        }
    }

    /// The declaration behind a hover, with the analysis that owns it.
    pub(crate) fn resolve_declaration(
        &self,
        hover: &HoverData,
        module: &Arc<Module>,
        ctx: &RequestContext,
    ) -> Option<(Arc<AnalyzeResult>, ResolvedSymbol)> {
        let qualified = &hover.symbol.qualified_name;
        if hover.symbol.kind == SymbolKind::Variable {
            // Locals have no addressable container.
            return None;
        }
        let top_level = names::top_level_type(qualified);
        if top_level.is_empty() {
            debug!("no enclosing type derivable for {}", qualified);
            return None;
        }
        let package = names::package_of(qualified);
        if self.platform.owns(package) {
            debug!("{} is platform-owned, no in-repository definition", qualified);
            return None;
        }

        let owning = match self.cache.declared_type(top_level) {
            Some(indexed) => indexed,
            None => self.locate_owning_unit(top_level, package, module, ctx)?,
        };

        let candidates: Vec<&ResolvedSymbol> = owning
            .symbols
            .iter()
            .filter(|s| s.id.qualified_name == *qualified)
            .collect();
        let symbol = match candidates.len() {
            0 => return None,
            1 => candidates[0],
            _ => candidates
                .iter()
                .copied()
                .find(|s| s.type_signature == hover.type_signature)
                .unwrap_or(candidates[0]),
        };
        Some((Arc::clone(&owning), symbol.clone()))
    }

    /// Find and analyze the source unit declaring `top_level`, preferring
    /// files named after the type, searching the module's own sources and
    /// its internal dependencies' sources.
    fn locate_owning_unit(
        &self,
        top_level: &str,
        package: &str,
        module: &Arc<Module>,
        ctx: &RequestContext,
    ) -> Option<Arc<AnalyzeResult>> {
        let simple = names::simple_name(top_level);

        let mut sources: Vec<(PackageId, Url)> = transitive_package_members(module, package, self.registry)
            .into_iter()
            .filter_map(|member| match member {
                PackageMember::Source { module, uri } => Some((module, uri)),
                PackageMember::Archive { .. } => None,
            })
            .collect();
        sources.sort_by_key(|(_, uri)| file_stem(uri) != Some(simple));

        for (module_id, uri) in sources {
            if ctx.cancelled() {
                return None;
            }
            let Some(owner) = self.registry.get(&module_id) else {
                continue;
            };
            let Some(analyzed) = self.cache.analyze(&uri, owner, ctx) else {
                continue;
            };
            if analyzed.declared_type(top_level).is_some() {
                return Some(analyzed);
            }
        }
        None
    }

    fn hover_data(
        &self,
        symbol: SymbolId,
        name: String,
        type_signature: String,
        location: Location,
        module: &Module,
    ) -> HoverData {
        let descriptor = self.descriptor_for(&symbol, module);
        let internal_signature = if type_signature.is_empty() {
            symbol.qualified_name.clone()
        } else {
            format!("{}: {}", symbol.qualified_name, type_signature)
        };
        HoverData {
            symbol,
            name,
            type_signature,
            location,
            internal_signature,
            descriptor,
        }
    }

    /// Cross-repository descriptor for a symbol: its name parts plus the
    /// coordinates of the artifact providing it, when derivable.
    fn descriptor_for(&self, symbol: &SymbolId, module: &Module) -> SymbolDescriptor {
        let qualified = &symbol.qualified_name;
        let top_level = names::top_level_type(qualified);
        let package = names::package_of(qualified);
        SymbolDescriptor {
            name: Some(names::simple_name(qualified).to_string()),
            qualified_name: Some(qualified.clone()),
            container_name: names::container_of(qualified).map(str::to_string),
            package_name: Some(package.to_string()),
            kind: Some(symbol.kind),
            module: self.providing_module(top_level, package, module),
        }
    }

    fn providing_module(
        &self,
        top_level: &str,
        package: &str,
        module: &Module,
    ) -> Option<PackageId> {
        if let Some(indexed) = self.cache.declared_type(top_level) {
            if let Some(owner) = self.registry.module_for_uri(indexed.uri()) {
                return Some(owner.id().clone());
            }
        }
        let classes = module.archive_classes_in_package(package);
        classes
            .iter()
            .find(|class| class.qualified_name == top_level)
            .map(|class| class.coordinates.clone())
    }
}

fn file_stem(uri: &Url) -> Option<&str> {
    let segment = uri.path_segments()?.last()?;
    segment.rsplit_once('.').map(|(stem, _)| stem).or(Some(segment))
}
