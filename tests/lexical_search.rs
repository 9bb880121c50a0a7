mod common;

use holocron::{Engine, SearchOptions};

#[tokio::test]
async fn round_trips_a_lexical_only_query() {
    common::init_tracing();
    let project = common::TestProject::new();
    project.write_file(
        "src/auth.ts",
        "function authenticateUser(token: string) { return validate(token); }\n",
    );

    let (_db_dir, config) = common::engine_config();
    let engine = Engine::open(&config).unwrap();

    let result = engine.index_directory(project.path()).await.unwrap();
    assert_eq!(result.indexed_files, 1);

    let results = engine
        .search("authenticateUser", SearchOptions::with_max_results(5))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].chunk.file_path.ends_with("auth.ts"));

    engine.clear_index().await.unwrap();
    let results = engine
        .search("authenticateUser", SearchOptions::with_max_results(5))
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn unmatched_query_returns_no_results() {
    let project = common::TestProject::new();
    project.write_file("src/a.rs", "fn completely_unrelated_symbol() {}\n");

    let (_db_dir, config) = common::engine_config();
    let engine = Engine::open(&config).unwrap();
    engine.index_directory(project.path()).await.unwrap();

    let results = engine
        .search("nothingMatchesThisQueryAtAll", SearchOptions::with_max_results(5))
        .await
        .unwrap();
    assert!(results.is_empty());
}
