use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::Settings;
use super::validation::validate_settings;
use crate::core::errors::PipelineError;

/// Loads the public config file and the secrets file, merges them
/// (secrets win), and deserializes into the typed [`Settings`] tree.
#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("RAGLINE_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    pub fn load(&self) -> Result<Settings, PipelineError> {
        let config_path = self.config_path();
        if !config_path.exists() {
            return Err(PipelineError::Config(format!(
                "config file not found: {}",
                config_path.display()
            )));
        }

        let public_config = load_yaml_file(&config_path)?;
        // A missing secrets file is fine; a malformed one is not.
        let secrets_config = load_yaml_file(&self.secrets_path())?;

        let merged = deep_merge(&public_config, &secrets_config);
        let settings: Settings = serde_json::from_value(merged)
            .map_err(|err| PipelineError::Config(format!("invalid config: {err}")))?;

        validate_settings(&settings)?;
        Ok(settings)
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, PipelineError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|err| {
        PipelineError::Config(format!("cannot read {}: {err}", path.display()))
    })?;
    let value: Value = serde_yaml::from_str(&contents).map_err(|err| {
        PipelineError::Config(format!("cannot parse {}: {err}", path.display()))
    })?;

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(PipelineError::Config(format!(
            "{} must contain a mapping at the top level",
            path.display()
        ))),
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "a": 1,
            "b": { "c": 2, "d": 3 },
            "arr": [1, 2]
        });
        let override_value = json!({
            "b": { "c": 99 },
            "arr": [3],
            "e": "x"
        });

        let merged = deep_merge(&base, &override_value);

        assert_eq!(
            merged,
            json!({
                "a": 1,
                "b": { "c": 99, "d": 3 },
                "arr": [3],
                "e": "x"
            })
        );
    }

    #[test]
    fn secrets_override_public_api_keys() {
        let public_config = json!({
            "api_keys": { "gemini_api_key": null }
        });
        let secrets = json!({
            "api_keys": { "gemini_api_key": "abc" }
        });

        let merged = deep_merge(&public_config, &secrets);
        assert_eq!(merged["api_keys"]["gemini_api_key"], json!("abc"));
    }

    #[test]
    fn settings_deserialize_from_full_yaml() {
        let yaml = r#"
use_cloud: false
model: { local: "llama3.2", cloud: "gemini-2.0-flash" }
prompts:
  index_query: { local: "Index for {question}", cloud: "Index for {question}" }
  search_query: { local: "{question} {previous_query} {missing_info}", cloud: "{question} {previous_query} {missing_info}" }
  context_evaluation: { local: "{question} {context}", cloud: "{question} {context}" }
  summarization: { local: "Summarize {text}", cloud: "Summarize {text}" }
  answer: { local: "{question} {context}", cloud: "{question} {context}" }
index:
  database_path: "index.db"
  collection: "knowledge"
  embedding_model: { local: "nomic-embed-text", cloud: "text-embedding-004" }
  top_k: 5
retrieval: { max_attempts: 3 }
search: { result_count: 5, timeout_secs: 10 }
summarization: { text_length_limit: 5000 }
api_keys:
  google_search_api_key: "k"
  google_search_engine_id: "cx"
"#;
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        let settings: Settings = serde_json::from_value(value).unwrap();

        assert!(!settings.use_cloud);
        assert_eq!(settings.model.active(false), "llama3.2");
        assert_eq!(settings.index.top_k, 5);
        assert_eq!(settings.retrieval.max_attempts, 3);
        assert_eq!(settings.local.base_url, "http://127.0.0.1:11434");
        assert!(settings.rate_limit.is_none());

        validate_settings(&settings).unwrap();
    }

    #[test]
    fn missing_section_is_a_config_error() {
        let value = json!({ "use_cloud": true });
        let result: Result<Settings, _> = serde_json::from_value(value);
        assert!(result.is_err());
    }
}
