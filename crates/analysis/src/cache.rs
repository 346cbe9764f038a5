use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use javelin_frontend::{Analysis, Occurrence, ResolvedSymbol, SourceUnit, SyntaxTree};
use javelin_project::Module;
use lsp_types::Url;
use tracing::{debug, warn};

use crate::cancel::RequestContext;

/// Parse-level cache entry: one syntax tree per unit identity, immutable
/// after creation.
#[derive(Debug)]
pub struct ParseResult {
    pub unit: SourceUnit,
    pub tree: Arc<SyntaxTree>,
}

impl ParseResult {
    pub fn uri(&self) -> &Url {
        &self.unit.uri
    }

    pub fn text(&self) -> &str {
        &self.unit.text
    }
}

/// Analyze-level cache entry: the parse result plus the symbols and
/// resolved occurrences full semantic analysis produced for this unit.
#[derive(Debug)]
pub struct AnalyzeResult {
    pub parse: Arc<ParseResult>,
    pub symbols: Vec<ResolvedSymbol>,
    pub occurrences: Vec<Occurrence>,
}

impl AnalyzeResult {
    pub fn uri(&self) -> &Url {
        self.parse.uri()
    }

    pub fn text(&self) -> &str {
        self.parse.text()
    }

    /// The declared type with this qualified name, if this unit declares it.
    pub fn declared_type(&self, qualified_name: &str) -> Option<&ResolvedSymbol> {
        self.symbols
            .iter()
            .find(|s| s.id.kind.is_type() && s.id.qualified_name == qualified_name)
    }
}

/// Session-wide memoizing compilation cache.
///
/// Parsing is pure memoization: concurrent first misses may both invoke the
/// front-end, but only one insert wins and parse has no side effects worth
/// deduplicating. Analysis is different — one call populates many cache
/// entries — so admission is serialized by a coarse lock over the whole
/// analyzed table; per-key locks could circular-wait between units that
/// reference each other. Readers asking "is this unit analyzed" go through
/// the lock-free map and only ever observe fully-formed entries.
///
/// All three tables are append-only for the life of the session: no
/// eviction, no invalidation.
pub struct CompilationCache {
    parsed: DashMap<Url, Arc<ParseResult>>,
    analyzed: DashMap<Url, Arc<AnalyzeResult>>,
    declared_types: DashMap<String, Arc<AnalyzeResult>>,
    analysis_gate: Mutex<()>,
}

impl CompilationCache {
    pub fn new() -> Self {
        Self {
            parsed: DashMap::new(),
            analyzed: DashMap::new(),
            declared_types: DashMap::new(),
            analysis_gate: Mutex::new(()),
        }
    }

    /// Parse `uri`, memoized. Returns `None` when the module cannot supply
    /// the unit or the front-end rejects it outright (logged, not
    /// propagated).
    pub fn parse(&self, uri: &Url, module: &Module) -> Option<Arc<ParseResult>> {
        if let Some(hit) = self.parsed.get(uri) {
            return Some(hit.clone());
        }

        let unit = module.unit(uri)?;
        let tree = {
            let mut compiler = module
                .compiler()
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match compiler.parse(&unit) {
                Ok(tree) => tree,
                Err(e) => {
                    warn!("parse failed for {}: {}", uri, e);
                    return None;
                }
            }
        };

        let result = Arc::new(ParseResult {
            unit,
            tree: Arc::new(tree),
        });
        let entry = self.parsed.entry(uri.clone()).or_insert(result);
        Some(entry.clone())
    }

    /// Analyze `uri`, memoized with at-most-one execution per unit identity.
    ///
    /// On a miss this parses, runs the front-end's full analysis, and
    /// installs a result for *every* unit the analysis reached. Front-end
    /// failures are logged and swallowed; the method still returns whatever
    /// landed for the requested unit, falling back to a parse-only result
    /// that is itself cached so the front-end is not invoked again.
    pub fn analyze(
        &self,
        uri: &Url,
        module: &Module,
        ctx: &RequestContext,
    ) -> Option<Arc<AnalyzeResult>> {
        if ctx.cancelled() {
            return None;
        }
        if let Some(hit) = self.analyzed.get(uri) {
            return Some(hit.clone());
        }

        let _gate = self
            .analysis_gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Re-check under the gate: another request may have finished this
        // unit while we waited for admission.
        if let Some(hit) = self.analyzed.get(uri) {
            return Some(hit.clone());
        }

        let parse = self.parse(uri, module)?;
        let outcome = {
            let mut compiler = module
                .compiler()
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            compiler.analyze(&parse.tree)
        };

        match outcome {
            Ok(analysis) => {
                debug!(
                    "analysis of {} produced {} unit(s)",
                    uri,
                    analysis.units.len()
                );
                self.install(analysis);
            }
            Err(e) => {
                warn!("analysis failed for {}: {}", uri, e);
            }
        }

        if let Some(hit) = self.analyzed.get(uri) {
            return Some(hit.clone());
        }

        let fallback = Arc::new(AnalyzeResult {
            parse,
            symbols: Vec::new(),
            occurrences: Vec::new(),
        });
        let entry = self.analyzed.entry(uri.clone()).or_insert(fallback);
        Some(entry.clone())
    }

    /// Install every unit an analysis produced. Callers hold the admission
    /// gate.
    fn install(&self, analysis: Analysis) {
        for produced in analysis.units {
            let uri = produced.unit.uri.clone();
            let parse = Arc::new(ParseResult {
                unit: produced.unit,
                tree: produced.tree,
            });
            // The analysis-derived tree supersedes any pre-analysis parse
            // entry, never the reverse.
            self.parsed.insert(uri.clone(), Arc::clone(&parse));

            let result = Arc::new(AnalyzeResult {
                parse,
                symbols: produced.symbols,
                occurrences: produced.occurrences,
            });
            let installed = self.analyzed.entry(uri).or_insert(result).clone();

            for symbol in installed.symbols.iter().filter(|s| s.is_top_level_type()) {
                self.declared_types
                    .entry(symbol.id.qualified_name.clone())
                    .or_insert_with(|| Arc::clone(&installed));
            }
        }
    }

    /// Lookup into the qualified-name index of top-level declared types.
    pub fn declared_type(&self, qualified_name: &str) -> Option<Arc<AnalyzeResult>> {
        self.declared_types
            .get(qualified_name)
            .map(|entry| entry.clone())
    }

    pub fn is_analyzed(&self, uri: &Url) -> bool {
        self.analyzed.contains_key(uri)
    }
}

impl Default for CompilationCache {
    fn default() -> Self {
        Self::new()
    }
}
