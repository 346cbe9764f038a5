use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use javelin_common::PackageId;
use lsp_types::Url;
use tracing::{debug, warn};

use crate::module::Module;

/// Session-wide mapping from package coordinates to modules, built once at
/// session start. Also owns the memo table of internal (intra-repository)
/// transitive dependency closures.
pub struct ModuleRegistry {
    modules: Vec<Arc<Module>>,
    by_id: HashMap<PackageId, Arc<Module>>,
    internal_closure: RwLock<HashMap<PackageId, Arc<Vec<PackageId>>>>,
}

impl ModuleRegistry {
    pub fn new(modules: Vec<Arc<Module>>) -> Self {
        let mut by_id = HashMap::new();
        for module in &modules {
            if by_id
                .insert(module.id().clone(), Arc::clone(module))
                .is_some()
            {
                warn!("duplicate module coordinates {}, keeping the first", module.id());
            }
        }
        Self {
            modules,
            by_id,
            internal_closure: RwLock::new(HashMap::new()),
        }
    }

    pub fn modules(&self) -> &[Arc<Module>] {
        &self.modules
    }

    pub fn get(&self, id: &PackageId) -> Option<&Arc<Module>> {
        self.by_id.get(id)
    }

    /// The module owning `uri`: a linear scan, first match wins.
    /// Overlapping module roots that would change the answer are
    /// unsupported.
    pub fn module_for_uri(&self, uri: &Url) -> Option<Arc<Module>> {
        let found = self
            .modules
            .iter()
            .find(|module| module.contains_uri(uri))
            .cloned();
        if found.is_none() {
            debug!("no module owns {}", uri);
        }
        found
    }

    /// Transitive dependencies of `id` restricted to modules present in
    /// this registry; external coordinates are pruned immediately.
    ///
    /// Computed with an explicit worklist and seen-set so cycles terminate
    /// and stack depth stays bounded. Only the root result is memoized:
    /// results for intermediate modules may be partial under cycles and are
    /// not safe to cache independently.
    pub fn internal_dependencies_of(&self, id: &PackageId) -> Vec<Arc<Module>> {
        let cached = self
            .internal_closure
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned();
        if let Some(cached) = cached {
            return self.materialize(&cached);
        }

        let Some(root) = self.by_id.get(id) else {
            return Vec::new();
        };

        let mut seen: HashSet<PackageId> = HashSet::new();
        seen.insert(id.clone());
        let mut stack: Vec<PackageId> = root
            .dependencies()
            .iter()
            .filter(|dep| self.by_id.contains_key(dep))
            .cloned()
            .collect();

        while let Some(next) = stack.pop() {
            if !seen.insert(next.clone()) {
                continue;
            }
            let Some(module) = self.by_id.get(&next) else {
                continue;
            };
            for dep in module.dependencies() {
                if self.by_id.contains_key(dep) && !seen.contains(dep) {
                    stack.push(dep.clone());
                }
            }
        }

        seen.remove(id);
        let mut closure: Vec<PackageId> = seen.into_iter().collect();
        closure.sort();
        let closure = Arc::new(closure);

        self.internal_closure
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(id.clone())
            .or_insert_with(|| Arc::clone(&closure));

        self.materialize(&closure)
    }

    fn materialize(&self, ids: &[PackageId]) -> Vec<Arc<Module>> {
        ids.iter()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect()
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.modules.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use javelin_frontend::{
        Analysis, FrontendError, ResolvingCompiler, SourceUnit, SyntaxNode, SyntaxTree,
    };

    use super::*;
    use crate::descriptor::ModuleDescriptor;
    use crate::module::CompilerFactory;

    struct NullCompiler;

    impl ResolvingCompiler for NullCompiler {
        fn parse(&mut self, unit: &SourceUnit) -> Result<SyntaxTree, FrontendError> {
            Ok(SyntaxTree::new(unit.uri.clone(), Vec::<SyntaxNode>::new()))
        }

        fn analyze(&mut self, _tree: &SyntaxTree) -> Result<Analysis, FrontendError> {
            Ok(Analysis::default())
        }
    }

    struct NullFactory;

    impl CompilerFactory for NullFactory {
        fn create_compiler(
            &self,
            _descriptor: &ModuleDescriptor,
            _units: &[SourceUnit],
        ) -> Box<dyn ResolvingCompiler> {
            Box::new(NullCompiler)
        }
    }

    fn module(artifact: &str, dependencies: &[&str]) -> Arc<Module> {
        let descriptor: ModuleDescriptor = toml::from_str(&format!(
            r#"
            name = "{artifact}"
            group = "com.test"
            artifact = "{artifact}"
            version = "1.0.0"
            dependencies = [{deps}]
            "#,
            deps = dependencies
                .iter()
                .map(|d| format!("\"com.test:{d}:1.0.0\""))
                .collect::<Vec<_>>()
                .join(", ")
        ))
        .unwrap();
        Arc::new(
            Module::new(
                descriptor,
                PathBuf::from(format!("/repo/{artifact}")),
                Arc::new(NullFactory),
            )
            .unwrap(),
        )
    }

    fn id(artifact: &str) -> PackageId {
        PackageId::new("com.test", artifact, "1.0.0")
    }

    #[test]
    fn test_closure_terminates_on_cycle() {
        // a -> b -> a
        let registry = ModuleRegistry::new(vec![module("a", &["b"]), module("b", &["a"])]);

        let a_deps = registry.internal_dependencies_of(&id("a"));
        assert_eq!(a_deps.len(), 1);
        assert_eq!(a_deps[0].id(), &id("b"));

        let b_deps = registry.internal_dependencies_of(&id("b"));
        assert_eq!(b_deps.len(), 1);
        assert_eq!(b_deps[0].id(), &id("a"));
    }

    #[test]
    fn test_closure_is_transitive_and_prunes_externals() {
        // a -> b -> c, plus an external dependency that is not in the
        // registry and must be pruned immediately.
        let a = module("a", &["b", "external"]);
        let b = module("b", &["c"]);
        let c = module("c", &[]);
        let registry = ModuleRegistry::new(vec![a, b, c]);

        let deps: Vec<_> = registry
            .internal_dependencies_of(&id("a"))
            .iter()
            .map(|m| m.id().clone())
            .collect();
        assert_eq!(deps, vec![id("b"), id("c")]);
        assert!(registry.internal_dependencies_of(&id("c")).is_empty());
    }

    #[test]
    fn test_closure_is_memoized() {
        let registry = ModuleRegistry::new(vec![module("a", &["b"]), module("b", &[])]);
        let first = registry.internal_dependencies_of(&id("a"));
        let second = registry.internal_dependencies_of(&id("a"));
        assert_eq!(first.len(), second.len());
        assert_eq!(
            registry
                .internal_closure
                .read()
                .unwrap()
                .keys()
                .collect::<Vec<_>>(),
            vec![&id("a")]
        );
    }

    #[test]
    fn test_unknown_module_has_empty_closure() {
        let registry = ModuleRegistry::new(vec![module("a", &[])]);
        assert!(registry.internal_dependencies_of(&id("missing")).is_empty());
    }
}
