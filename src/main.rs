use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use ragline::core::config::{AppPaths, ConfigService, Settings};
use ragline::core::logging;
use ragline::index::SqliteIndexStore;
use ragline::llm::ModelGateway;
use ragline::pipeline::QuestionPipeline;
use ragline::web::{GoogleSearchConnector, HttpPageExtractor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);

    let questions = read_questions()?;
    if questions.is_empty() {
        eprintln!("Usage: ragline <question>... | ragline --file <questions.txt>");
        std::process::exit(2);
    }

    let config = ConfigService::new(paths.clone());
    let settings = config.load().context("Failed to load configuration")?;

    let gateway = Arc::new(ModelGateway::from_settings(&settings)?);
    let index = Arc::new(
        SqliteIndexStore::open(
            resolve_db_path(&settings, &paths),
            settings.index.collection.clone(),
            gateway.clone(),
        )
        .await
        .context("Failed to open index database")?,
    );
    let search = Arc::new(GoogleSearchConnector::new(
        settings
            .api_keys
            .google_search_api_key
            .clone()
            .unwrap_or_default(),
        settings
            .api_keys
            .google_search_engine_id
            .clone()
            .unwrap_or_default(),
    ));
    let extractor = Arc::new(HttpPageExtractor::new()?);

    let pipeline = QuestionPipeline::new(settings, gateway, index, search, extractor);
    let answers = pipeline.answer_questions(&questions).await;

    for (question, answer) in &answers {
        println!("Q: {question}");
        println!("A: {answer}");
        println!();
    }

    if answers.len() < questions.len() {
        anyhow::bail!(
            "{} of {} questions failed; see logs",
            questions.len() - answers.len(),
            questions.len()
        );
    }

    Ok(())
}

fn read_questions() -> anyhow::Result<Vec<String>> {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.first().map(String::as_str) == Some("--file") {
        let path = args
            .get(1)
            .context("--file requires a path to a questions file")?;
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read questions file {path}"))?;
        return Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect());
    }

    Ok(args
        .into_iter()
        .map(|arg| arg.trim().to_string())
        .filter(|arg| !arg.is_empty())
        .collect())
}

fn resolve_db_path(settings: &Settings, paths: &AppPaths) -> PathBuf {
    let configured = &settings.index.database_path;
    if configured.is_absolute() {
        configured.clone()
    } else {
        paths.user_data_dir.join(configured)
    }
}
