mod common;

use holocron::{ContextOptions, Engine, SearchOptions};

#[tokio::test]
async fn formats_search_results_as_xml_context() {
    let project = common::TestProject::new();
    project.write_file(
        "src/widget.ts",
        "function renderWidget() { return widget(); }\nfunction widgetHelper() { return widget(); }\n",
    );

    let (_db_dir, config) = common::engine_config();
    let engine = Engine::open(&config).unwrap();
    engine.index_directory(project.path()).await.unwrap();

    let results = engine
        .search("widget", SearchOptions::with_max_results(5))
        .await
        .unwrap();
    assert!(!results.is_empty());

    let xml = engine.format_context(&results, "widget", &ContextOptions::default());
    assert!(xml.starts_with("<codebase_context"));
    assert!(xml.contains("widget.ts"));
    assert!(xml.ends_with("</codebase_context>"));
}

#[tokio::test]
async fn empty_result_set_formats_to_empty_string() {
    let (_db_dir, config) = common::engine_config();
    let engine = Engine::open(&config).unwrap();
    let xml = engine.format_context(&[], "anything", &ContextOptions::default());
    assert_eq!(xml, "");
}
