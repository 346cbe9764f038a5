use std::path::{Path, PathBuf};

use javelin_common::{names, PackageId};
use serde::Deserialize;
use thiserror::Error;

/// File name of a resolved module descriptor.
pub const DESCRIPTOR_FILE_NAME: &str = "javelin.toml";

/// A *resolved* module descriptor: the output of external build-descriptor
/// resolution, one per module. Dependency versions are already pinned and
/// archive class lists already extracted by the resolver that wrote it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModuleDescriptor {
    pub name: String,
    pub group: String,
    pub artifact: String,
    pub version: String,

    #[serde(default = "default_source_dirs")]
    pub source_dirs: Vec<PathBuf>,

    #[serde(default = "default_test_dirs")]
    pub test_dirs: Vec<PathBuf>,

    /// Direct dependency coordinates, internal and external alike.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Precompiled dependency archives with their class lists.
    #[serde(default)]
    pub archives: Vec<ArchiveDescriptor>,

    #[serde(default)]
    pub compiler: CompilerOptions,
}

fn default_source_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("src/main/java")]
}

fn default_test_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("src/test/java")]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArchiveDescriptor {
    pub coordinates: String,
    pub path: PathBuf,
    /// Qualified names of the classes the archive provides.
    #[serde(default)]
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CompilerOptions {
    pub source_level: Option<String>,
    #[serde(default)]
    pub flags: Vec<String>,
}

/// One class provided by a dependency archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveClass {
    pub qualified_name: String,
    pub archive: PathBuf,
    pub coordinates: PackageId,
}

impl ArchiveClass {
    pub fn package_name(&self) -> &str {
        names::package_of(&self.qualified_name)
    }
}

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{path}: {source}")]
    Coordinates {
        path: PathBuf,
        #[source]
        source: javelin_common::PackageIdError,
    },
}

impl ModuleDescriptor {
    pub fn from_path(path: &Path) -> Result<Self, DescriptorError> {
        let content = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| DescriptorError::Toml {
            path: path.to_owned(),
            source,
        })
    }

    pub fn coordinates(&self) -> PackageId {
        PackageId::new(&self.group, &self.artifact, &self.version)
    }
}
