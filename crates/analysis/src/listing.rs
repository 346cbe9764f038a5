use std::sync::Arc;

use javelin_common::PackageId;
use javelin_project::{ArchiveClass, Module, ModuleRegistry};
use lsp_types::Url;
use rayon::prelude::*;
use tracing::debug;

/// One entry of a transitive package listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageMember {
    /// An in-repository source file.
    Source { module: PackageId, uri: Url },
    /// A class provided by a dependency archive.
    Archive {
        module: PackageId,
        class: ArchiveClass,
    },
}

impl PackageMember {
    pub fn is_source(&self) -> bool {
        matches!(self, Self::Source { .. })
    }
}

/// Everything `package` resolves to from `module`'s point of view: the
/// module's own matching sources, its internal dependencies' sources, then
/// the archive-provided classes of both sides.
///
/// Sources are listed strictly before archive classes. When a package is
/// implemented by local source *and* shipped precompiled in a dependency
/// archive, navigation must land in-repository, not inside an archive.
/// The two archive halves are fetched by concurrent tasks and joined before
/// merging.
pub fn transitive_package_members(
    module: &Arc<Module>,
    package: &str,
    registry: &ModuleRegistry,
) -> Vec<PackageMember> {
    let deps = registry.internal_dependencies_of(module.id());

    let mut members: Vec<PackageMember> = Vec::new();

    for uri in module.files_in_package(package) {
        members.push(PackageMember::Source {
            module: module.id().clone(),
            uri: uri.clone(),
        });
    }
    for dep in &deps {
        for uri in dep.files_in_package(package) {
            members.push(PackageMember::Source {
                module: dep.id().clone(),
                uri: uri.clone(),
            });
        }
    }

    let (own_classes, dep_classes) = rayon::join(
        || module.archive_classes_in_package(package),
        || {
            deps.par_iter()
                .map(|dep| (dep.id().clone(), dep.archive_classes_in_package(package)))
                .collect::<Vec<_>>()
        },
    );

    for class in own_classes.iter() {
        members.push(PackageMember::Archive {
            module: module.id().clone(),
            class: class.clone(),
        });
    }
    for (dep_id, classes) in dep_classes {
        for class in classes.iter() {
            members.push(PackageMember::Archive {
                module: dep_id.clone(),
                class: class.clone(),
            });
        }
    }

    debug!(
        "package {} lists {} member(s) from {}",
        package,
        members.len(),
        module.id()
    );
    members
}
