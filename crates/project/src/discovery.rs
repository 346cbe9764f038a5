use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::descriptor::{ModuleDescriptor, DESCRIPTOR_FILE_NAME};
use crate::module::{CompilerFactory, Module};
use crate::registry::ModuleRegistry;

/// Walk `root` for resolved module descriptors and build the session's
/// registry.
///
/// Individual descriptor failures are logged and skipped so one broken
/// module does not take the session down. Modules are ordered by
/// coordinates so routing scans are deterministic.
pub fn discover_modules(
    root: &Path,
    factory: Arc<dyn CompilerFactory>,
) -> Result<ModuleRegistry> {
    let mut modules = Vec::new();

    use ignore::WalkBuilder;
    let walker = WalkBuilder::new(root).follow_links(false).build();

    for entry in walker {
        let entry = entry?;
        let path = entry.path();

        if path.file_name() != Some(std::ffi::OsStr::new(DESCRIPTOR_FILE_NAME)) {
            continue;
        }

        match ModuleDescriptor::from_path(path) {
            Ok(descriptor) => {
                let module_root = path.parent().unwrap_or(root).to_owned();
                match Module::new(descriptor, module_root, Arc::clone(&factory)) {
                    Ok(module) => modules.push(Arc::new(module)),
                    Err(e) => {
                        debug!("failed to load module at {}: {}", path.display(), e);
                    }
                }
            }
            Err(e) => {
                debug!("failed to load descriptor {}: {}", path.display(), e);
            }
        }
    }

    modules.sort_by(|a, b| a.id().cmp(b.id()));
    info!(
        "discovered {} modules under {}",
        modules.len(),
        root.display()
    );
    Ok(ModuleRegistry::new(modules))
}
