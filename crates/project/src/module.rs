use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use dashmap::DashMap;
use javelin_common::PackageId;
use javelin_frontend::{ResolvingCompiler, SourceUnit};
use lsp_types::Url;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::descriptor::{ArchiveClass, DescriptorError, ModuleDescriptor, DESCRIPTOR_FILE_NAME};

/// Creates the per-module resolving front-end. The factory is the seam to
/// the external compiler integration; tests plug a fixture front-end in
/// here.
pub trait CompilerFactory: Send + Sync {
    /// Build the front-end for one module. `units` is the module's full
    /// source set; analysis may reach any of them.
    fn create_compiler(
        &self,
        descriptor: &ModuleDescriptor,
        units: &[SourceUnit],
    ) -> Box<dyn ResolvingCompiler>;
}

/// One compilable unit of the repository: a source set, direct dependency
/// coordinates, resolved archives, and exactly one resolving compiler.
///
/// The source-uri set and the derived package indexes are computed lazily on
/// first use and are append-only for the rest of the session. The compiler
/// is a critical section: at most one parse/analyze call against it may be
/// in flight at a time.
pub struct Module {
    descriptor: ModuleDescriptor,
    id: PackageId,
    root: PathBuf,
    dependencies: Vec<PackageId>,
    archive_classes: Vec<ArchiveClass>,
    factory: Arc<dyn CompilerFactory>,
    sources: OnceLock<Vec<Url>>,
    units: DashMap<Url, SourceUnit>,
    compiler: OnceLock<Mutex<Box<dyn ResolvingCompiler>>>,
    package_files: OnceLock<HashMap<String, Vec<Url>>>,
    package_archive_classes: DashMap<String, Arc<Vec<ArchiveClass>>>,
}

impl Module {
    pub fn new(
        descriptor: ModuleDescriptor,
        root: PathBuf,
        factory: Arc<dyn CompilerFactory>,
    ) -> Result<Self, DescriptorError> {
        let descriptor_path = root.join(DESCRIPTOR_FILE_NAME);
        let coordinates_error = |source| DescriptorError::Coordinates {
            path: descriptor_path.clone(),
            source,
        };

        let dependencies = descriptor
            .dependencies
            .iter()
            .map(|raw| raw.parse::<PackageId>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(coordinates_error)?;

        let mut archive_classes = Vec::new();
        for archive in &descriptor.archives {
            let coordinates = archive
                .coordinates
                .parse::<PackageId>()
                .map_err(coordinates_error)?;
            for class in &archive.classes {
                archive_classes.push(ArchiveClass {
                    qualified_name: class.clone(),
                    archive: archive.path.clone(),
                    coordinates: coordinates.clone(),
                });
            }
        }

        let id = descriptor.coordinates();
        Ok(Self {
            descriptor,
            id,
            root,
            dependencies,
            archive_classes,
            factory,
            sources: OnceLock::new(),
            units: DashMap::new(),
            compiler: OnceLock::new(),
            package_files: OnceLock::new(),
            package_archive_classes: DashMap::new(),
        })
    }

    pub fn id(&self) -> &PackageId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    /// Direct dependency coordinates, internal and external alike.
    pub fn dependencies(&self) -> &[PackageId] {
        &self.dependencies
    }

    /// The module's source uris, scanned from its source and test
    /// directories on first use.
    pub fn source_uris(&self) -> &[Url] {
        self.sources.get_or_init(|| {
            let mut files = Vec::new();
            for dir in self
                .descriptor
                .source_dirs
                .iter()
                .chain(self.descriptor.test_dirs.iter())
            {
                let dir = self.root.join(dir);
                if !dir.is_dir() {
                    continue;
                }
                for entry in WalkDir::new(&dir).follow_links(false) {
                    let entry = match entry {
                        Ok(entry) => entry,
                        Err(e) => {
                            debug!("skipping unreadable entry under {}: {}", dir.display(), e);
                            continue;
                        }
                    };
                    let path = entry.path();
                    if path.extension().and_then(|s| s.to_str()) == Some("java") {
                        if let Ok(uri) = Url::from_file_path(path) {
                            files.push(uri);
                        }
                    }
                }
            }
            files.sort();
            files.dedup();
            debug!("module {} resolved {} source files", self.id, files.len());
            files
        })
    }

    /// Does this module own `uri`? Path-prefix check against the module
    /// root first, then membership in the resolved source set.
    pub fn contains_uri(&self, uri: &Url) -> bool {
        let Ok(path) = uri.to_file_path() else {
            return false;
        };
        if !path.starts_with(&self.root) {
            return false;
        }
        self.source_uris().contains(uri)
    }

    /// The source unit for `uri`, created on first access. Returns `None`
    /// for uris outside the module or files that cannot be read.
    pub fn unit(&self, uri: &Url) -> Option<SourceUnit> {
        if let Some(unit) = self.units.get(uri) {
            return Some(unit.clone());
        }
        if !self.source_uris().contains(uri) {
            return None;
        }
        let path = uri.to_file_path().ok()?;
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!("failed to read {}: {}", path.display(), e);
                return None;
            }
        };
        let unit = self
            .units
            .entry(uri.clone())
            .or_insert_with(|| SourceUnit::new(uri.clone(), text))
            .clone();
        Some(unit)
    }

    /// Every unit of the module, loaded. Used to seed the compiler.
    pub fn all_units(&self) -> Vec<SourceUnit> {
        self.source_uris()
            .iter()
            .filter_map(|uri| self.unit(uri))
            .collect()
    }

    /// The module's resolving compiler, created on first use. Callers must
    /// hold the returned lock across any parse/analyze call.
    pub fn compiler(&self) -> &Mutex<Box<dyn ResolvingCompiler>> {
        self.compiler.get_or_init(|| {
            let units = self.all_units();
            debug!(
                "creating compiler for module {} over {} units",
                self.id,
                units.len()
            );
            Mutex::new(self.factory.create_compiler(&self.descriptor, &units))
        })
    }

    /// Source files belonging to `package`, derived from the directory
    /// layout under the module's source dirs.
    pub fn files_in_package(&self, package: &str) -> &[Url] {
        let index = self.package_files.get_or_init(|| {
            let mut index: HashMap<String, Vec<Url>> = HashMap::new();
            for uri in self.source_uris() {
                if let Some(pkg) = self.package_of_uri(uri) {
                    index.entry(pkg).or_default().push(uri.clone());
                }
            }
            for files in index.values_mut() {
                files.sort();
            }
            index
        });
        index.get(package).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Archive-provided classes of `package`, filtered lazily per package
    /// and cached.
    pub fn archive_classes_in_package(&self, package: &str) -> Arc<Vec<ArchiveClass>> {
        if let Some(hit) = self.package_archive_classes.get(package) {
            return Arc::clone(&hit);
        }
        let mut classes: Vec<ArchiveClass> = self
            .archive_classes
            .iter()
            .filter(|class| class.package_name() == package)
            .cloned()
            .collect();
        classes.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
        let classes = Arc::new(classes);
        self.package_archive_classes
            .entry(package.to_string())
            .or_insert_with(|| Arc::clone(&classes))
            .clone()
    }

    /// Package of a source uri, from its directory relative to the source
    /// dir that contains it.
    fn package_of_uri(&self, uri: &Url) -> Option<String> {
        let path = uri.to_file_path().ok()?;
        for dir in self
            .descriptor
            .source_dirs
            .iter()
            .chain(self.descriptor.test_dirs.iter())
        {
            let dir = self.root.join(dir);
            if let Ok(relative) = path.strip_prefix(&dir) {
                let package = relative
                    .parent()
                    .map(|parent| {
                        parent
                            .components()
                            .map(|c| c.as_os_str().to_string_lossy())
                            .collect::<Vec<_>>()
                            .join(".")
                    })
                    .unwrap_or_default();
                return Some(package);
            }
        }
        None
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}
