//! Config loading against real files: public config merged with secrets.

use std::fs;
use std::sync::Arc;

use ragline::core::config::{AppPaths, ConfigService};

const CONFIG_YML: &str = r#"
use_cloud: false
model: { local: "llama3.2", cloud: "gemini-2.0-flash" }
prompts:
  index_query: { local: "Index query for: {question}", cloud: "Index query for: {question}" }
  search_query: { local: "{question} {previous_query} {missing_info}", cloud: "{question} {previous_query} {missing_info}" }
  context_evaluation: { local: "{question} {context}", cloud: "{question} {context}" }
  summarization: { local: "Summarize: {text}", cloud: "Summarize: {text}" }
  answer: { local: "{question} {context}", cloud: "{question} {context}" }
index:
  database_path: "index.db"
  collection: "knowledge"
  embedding_model: { local: "nomic-embed-text", cloud: "text-embedding-004" }
  top_k: 5
retrieval: { max_attempts: 3 }
search: { result_count: 5, timeout_secs: 10 }
summarization: { text_length_limit: 5000 }
"#;

const SECRETS_YML: &str = r#"
api_keys:
  google_search_api_key: "search-key"
  google_search_engine_id: "engine-id"
"#;

// Single test: the loader reads paths from process-wide env vars.
#[test]
fn loads_merges_and_validates() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.yml"), CONFIG_YML).unwrap();
    fs::write(dir.path().join("secrets.yml"), SECRETS_YML).unwrap();

    std::env::set_var("RAGLINE_DATA_DIR", dir.path());
    std::env::set_var("RAGLINE_CONFIG_PATH", dir.path().join("config.yml"));

    let service = ConfigService::new(Arc::new(AppPaths::new()));
    let settings = service.load().unwrap();

    assert_eq!(settings.model.active(false), "llama3.2");
    assert_eq!(
        settings.api_keys.google_search_api_key.as_deref(),
        Some("search-key")
    );
    assert_eq!(settings.retrieval.max_attempts, 3);

    // Validation runs as part of load: break a range and reload.
    let broken = CONFIG_YML.replace("top_k: 5", "top_k: 0");
    fs::write(dir.path().join("config.yml"), broken).unwrap();
    let err = service.load().unwrap_err();
    assert!(err.to_string().contains("index.top_k"));

    // A template referencing an unknown placeholder is rejected too.
    let broken = CONFIG_YML.replace("Summarize: {text}", "Summarize: {page}");
    fs::write(dir.path().join("config.yml"), broken).unwrap();
    let err = service.load().unwrap_err();
    assert!(err.to_string().contains("page"));
}
