mod common;

use holocron::{Engine, SearchOptions};

#[tokio::test]
async fn indexes_rust_python_and_falls_back_on_markdown() {
    let project = common::TestProject::new();
    project.write_file(
        "src/lib.rs",
        "pub fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n",
    );
    project.write_file(
        "app.py",
        "def greet(name):\n    return f\"Hello, {name}!\"\n",
    );
    project.write_file(
        "README.md",
        "# Sample Project\n\nThis is a sample project used for indexing tests.\n",
    );

    let (_db_dir, config) = common::engine_config();
    let engine = Engine::open(&config).unwrap();
    let result = engine.index_directory(project.path()).await.unwrap();
    assert_eq!(result.indexed_files, 3);
    assert!(result.chunks >= 3);

    let rust_hit = engine
        .search("add", SearchOptions::with_max_results(5))
        .await
        .unwrap();
    assert!(rust_hit.iter().any(|r| r.chunk.file_path.ends_with("lib.rs")));

    let python_hit = engine
        .search("greet", SearchOptions::with_max_results(5))
        .await
        .unwrap();
    assert!(python_hit.iter().any(|r| r.chunk.file_path.ends_with("app.py")));
}

#[tokio::test]
async fn directory_option_scopes_search_to_a_subtree() {
    let project = common::TestProject::new();
    project.write_file("src/shared.rs", "fn sharedSymbol() {}\n");
    project.write_file("vendor/shared.rs", "fn sharedSymbol() {}\n");

    let (_db_dir, config) = common::engine_config();
    let engine = Engine::open(&config).unwrap();
    engine.index_directory(project.path()).await.unwrap();

    let all = engine
        .search("sharedSymbol", SearchOptions::with_max_results(5))
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let scoped = engine
        .search(
            "sharedSymbol",
            SearchOptions {
                directory: Some(project.path().join("src")),
                ..SearchOptions::with_max_results(5)
            },
        )
        .await
        .unwrap();
    assert_eq!(scoped.len(), 1);
    assert!(scoped[0].chunk.file_path.ends_with("src/shared.rs"));
}

#[tokio::test]
async fn removing_a_file_drops_its_chunks() {
    let project = common::TestProject::new();
    project.write_file("a.rs", "fn onlyHere() {}\n");

    let (_db_dir, config) = common::engine_config();
    let engine = Engine::open(&config).unwrap();
    engine.index_directory(project.path()).await.unwrap();

    let before = engine
        .search("onlyHere", SearchOptions::with_max_results(5))
        .await
        .unwrap();
    assert_eq!(before.len(), 1);

    let path = project.path().join("a.rs");
    engine.remove_files(&[path]).await.unwrap();

    let after = engine
        .search("onlyHere", SearchOptions::with_max_results(5))
        .await
        .unwrap();
    assert!(after.is_empty());
}
