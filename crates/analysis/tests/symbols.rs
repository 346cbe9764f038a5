//! Workspace/document symbol search, transitive package listing, and
//! module metadata enumeration.

mod support;

use javelin_analysis::{
    transitive_package_members, PackageMember, RequestContext, SymbolQuery,
};
use javelin_common::{SymbolDescriptor, SymbolKind};
use javelin_test_utils::FixtureRepo;

use support::{session_for, position_of};

fn symbol_repo() -> FixtureRepo {
    let repo = FixtureRepo::new();
    repo.add_module("m1", "m1", &[]);
    repo.add_file(
        "m1/src/main/java/a/Foo.java",
        "package a;\n\npublic class Foo {\n    int size;\n\n    int grow(int amount) {\n    }\n}\n",
    );
    repo.add_file(
        "m1/src/main/java/a/FooBar.java",
        "package a;\n\npublic class FooBar {\n}\n",
    );
    repo.add_file(
        "m1/src/main/java/a/Unrelated.java",
        "package a;\n\npublic class Unrelated {\n    int xfoo;\n}\n",
    );
    repo
}

#[test]
fn test_free_text_search_ranks_exact_match_first() {
    let repo = symbol_repo();
    let (session, _) = session_for(&repo);
    let ctx = RequestContext::new();

    let hits = session.workspace_symbol(&SymbolQuery::Text("Foo".into()), &ctx);
    assert!(!hits.is_empty());
    assert_eq!(hits[0].name, "Foo");
    assert_eq!(hits[0].kind, SymbolKind::Class);
    assert!(hits.len() <= 5);

    let foo_score = hits[0].score;
    let foobar = hits.iter().find(|h| h.name == "FooBar").expect("FooBar hit");
    assert!(foo_score > foobar.score);
}

#[test]
fn test_free_text_budget_depends_on_query_length() {
    let repo = symbol_repo();
    let (session, _) = session_for(&repo);
    let ctx = RequestContext::new();

    // Longer than 4 characters: budget 10.
    let hits = session.workspace_symbol(&SymbolQuery::Text("Unrelated".into()), &ctx);
    assert!(hits.len() <= 10);
    assert_eq!(hits[0].name, "Unrelated");
}

#[test]
fn test_structured_query_uses_container_fast_path() {
    let repo = symbol_repo();
    let (session, stats) = session_for(&repo);
    let ctx = RequestContext::new();

    let query = SymbolQuery::Descriptor(SymbolDescriptor {
        name: Some("grow".into()),
        container_name: Some("a.Foo".into()),
        kind: Some(SymbolKind::Method),
        ..Default::default()
    });
    let hits = session.workspace_symbol(&query, &ctx);

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "grow");
    assert_eq!(hits[0].kind, SymbolKind::Method);
    assert_eq!(hits[0].container_name.as_deref(), Some("a.Foo"));

    // The fast path only parses files whose basename matches the
    // container; the unrelated file is never touched.
    let unrelated = repo.file_url("m1/src/main/java/a/Unrelated.java");
    assert_eq!(stats.parse_count(&unrelated), 0);
}

#[test]
fn test_structured_query_falls_back_to_full_scan() {
    let repo = FixtureRepo::new();
    repo.add_module("m1", "m1", &[]);
    // The type lives in a file that does not carry its name, so the
    // filename fast path misses and the full scan must find it.
    repo.add_file(
        "m1/src/main/java/a/Types.java",
        "package a;\n\npublic class Hidden {\n    int marker;\n}\n",
    );

    let (session, _) = session_for(&repo);
    let ctx = RequestContext::new();
    let query = SymbolQuery::Descriptor(SymbolDescriptor {
        name: Some("marker".into()),
        container_name: Some("a.Hidden".into()),
        kind: Some(SymbolKind::Field),
        ..Default::default()
    });

    let hits = session.workspace_symbol(&query, &ctx);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "marker");
}

#[test]
fn test_document_symbols_in_document_order() {
    let repo = symbol_repo();
    let (session, _) = session_for(&repo);
    let ctx = RequestContext::new();
    let uri = repo.file_url("m1/src/main/java/a/Foo.java");

    let symbols = session.document_symbol(&uri, &ctx);
    let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Foo", "size", "grow"]);
    assert_eq!(symbols[0].kind, SymbolKind::Class);
    assert_eq!(symbols[1].kind, SymbolKind::Field);
    assert_eq!(symbols[2].kind, SymbolKind::Method);
    assert_eq!(symbols[1].container_name.as_deref(), Some("a.Foo"));
}

#[test]
fn test_package_listing_ranks_sources_before_archives() {
    let repo = FixtureRepo::new();
    repo.add_file(
        "m1/javelin.toml",
        r#"
name = "m1"
group = "com.fixture"
artifact = "m1"
version = "1.0.0"

[[archives]]
coordinates = "org.dep:dep-lib:2.0.0"
path = "libs/dep-lib-2.0.0.jar"
classes = ["a.Precompiled"]
"#,
    );
    repo.add_file(
        "m1/src/main/java/a/B.java",
        "package a;\n\npublic class B {\n}\n",
    );

    let (session, _) = session_for(&repo);
    let module = session
        .registry()
        .get(&FixtureRepo::coordinates("m1").parse().unwrap())
        .cloned()
        .expect("m1 in registry");

    let members = transitive_package_members(&module, "a", session.registry());
    assert_eq!(members.len(), 2);
    assert!(members[0].is_source());
    match &members[1] {
        PackageMember::Archive { class, .. } => {
            assert_eq!(class.qualified_name, "a.Precompiled");
            assert_eq!(class.coordinates.to_string(), "org.dep:dep-lib:2.0.0");
        }
        other => panic!("expected archive member, got {other:?}"),
    }
}

#[test]
fn test_x_packages_and_dependencies_enumerate_descriptors() {
    let repo = FixtureRepo::new();
    repo.add_module("m1", "m1", &[]);
    repo.add_file("m1/src/main/java/a/B.java", "package a;\npublic class B {}\n");
    let m1_coordinates = FixtureRepo::coordinates("m1");
    repo.add_module(
        "m2",
        "m2",
        &[m1_coordinates.as_str(), "org.ext:ext-lib:3.1.4"],
    );

    let (session, _) = session_for(&repo);

    let packages = session.x_packages();
    assert_eq!(packages.len(), 2);
    assert_eq!(packages[0].package.to_string(), FixtureRepo::coordinates("m1"));
    assert!(packages[0].dependencies.is_empty());
    assert_eq!(packages[1].dependencies.len(), 2);

    let edges = session.x_dependencies();
    assert_eq!(edges.len(), 2);
    assert!(edges
        .iter()
        .all(|e| e.declaring_module.to_string() == FixtureRepo::coordinates("m2")));
    assert!(edges.iter().any(|e| e.dependency.to_string() == "org.ext:ext-lib:3.1.4"));
}

#[test]
fn test_hover_signatures_render_both_forms() {
    let repo = symbol_repo();
    let (session, _) = session_for(&repo);
    let ctx = RequestContext::new();
    let uri = repo.file_url("m1/src/main/java/a/Foo.java");
    let source = std::fs::read_to_string(uri.to_file_path().unwrap()).unwrap();

    let position = position_of(&source, "grow", 0);
    let hover = session.hover(&uri, position, &ctx).expect("hover on method");

    assert_eq!(hover.symbol.qualified_name, "a.Foo#grow");
    assert_eq!(hover.type_signature, "int(int)");
    assert_eq!(hover.internal_signature, "a.Foo#grow: int(int)");
    assert_eq!(hover.descriptor.container_name.as_deref(), Some("a.Foo"));
    assert_eq!(
        hover.descriptor.module.as_ref().map(ToString::to_string),
        Some(FixtureRepo::coordinates("m1"))
    );
}
