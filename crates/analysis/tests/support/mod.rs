#![allow(dead_code)]

use std::sync::Arc;

use javelin_analysis::Session;
use javelin_common::offset_to_position;
use javelin_project::{discover_modules, PlatformLibraries};
use javelin_test_utils::{FixtureCompilerFactory, FixtureRepo, FixtureStats};
use lsp_types::Position;

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Assemble a session over a fixture repository.
pub fn session_for(repo: &FixtureRepo) -> (Session, Arc<FixtureStats>) {
    init_tracing();
    let factory = Arc::new(FixtureCompilerFactory::new());
    let stats = factory.stats();
    let registry = discover_modules(&repo.root_path(), factory).expect("discovery failed");
    let session = Session::new(Arc::new(registry), PlatformLibraries::standard());
    (session, stats)
}

/// Position of the `nth` occurrence (0-based) of `needle` in `text`.
pub fn position_of(text: &str, needle: &str, nth: usize) -> Position {
    let offset = text
        .match_indices(needle)
        .nth(nth)
        .map(|(i, _)| i)
        .unwrap_or_else(|| panic!("needle `{needle}` (occurrence {nth}) not found"));
    offset_to_position(text, offset)
}

/// Two modules: `m1` declares `a.B`, `m2` depends on `m1` and uses `B`.
pub fn cross_module_repo() -> (FixtureRepo, String, String) {
    let repo = FixtureRepo::new();

    repo.add_module("m1", "m1", &[]);
    let b_source = "package a;\n\npublic class B {\n}\n";
    repo.add_file("m1/src/main/java/a/B.java", b_source);

    let m1_coordinates = FixtureRepo::coordinates("m1");
    repo.add_module("m2", "m2", &[m1_coordinates.as_str()]);
    let app_source = "package b;\n\nimport a.B;\n\npublic class App {\n    B field;\n}\n";
    repo.add_file("m2/src/main/java/b/App.java", app_source);

    (repo, b_source.to_string(), app_source.to_string())
}
