use std::path::{Path, PathBuf};

use lsp_types::Url;
use tempfile::TempDir;

/// A temporary multi-module repository on disk: module descriptors plus
/// source files, laid out the way discovery expects them.
#[derive(Debug)]
pub struct FixtureRepo {
    temp_dir: TempDir,
}

impl FixtureRepo {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory");
        Self { temp_dir }
    }

    /// Add a file with the given repo-relative path and content, creating
    /// parent directories as needed.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl AsRef<str>) {
        let full_path = self.temp_dir.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&full_path, content.as_ref()).expect("Failed to write file");
    }

    /// Write a resolved module descriptor under `dir`. Coordinates default
    /// to `com.fixture:<artifact>:1.0.0`; dependencies are given as full
    /// coordinate strings.
    pub fn add_module(&self, dir: &str, artifact: &str, dependencies: &[&str]) {
        let dependency_list = dependencies
            .iter()
            .map(|dep| format!("\"{dep}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let content = format!(
            r#"
name = "{artifact}"
group = "com.fixture"
artifact = "{artifact}"
version = "1.0.0"
dependencies = [{dependency_list}]
"#
        );
        self.add_file(format!("{dir}/javelin.toml"), content);
        std::fs::create_dir_all(self.temp_dir.path().join(dir).join("src/main/java"))
            .expect("Failed to create source directory");
    }

    /// Coordinates `add_module` assigns to an artifact.
    pub fn coordinates(artifact: &str) -> String {
        format!("com.fixture:{artifact}:1.0.0")
    }

    pub fn root_path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    pub fn file_url(&self, path: impl AsRef<Path>) -> Url {
        let full_path = self.temp_dir.path().join(path.as_ref());
        Url::from_file_path(full_path).expect("Failed to create URL from file path")
    }
}

impl Default for FixtureRepo {
    fn default() -> Self {
        Self::new()
    }
}
