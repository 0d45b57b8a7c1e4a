//! The refinement loop: bounded search-evaluate-summarize cycles per
//! question, with a conditional write-back of newly gathered knowledge.

use std::sync::Arc;
use std::time::Duration;

use super::answer::answer_with_context;
use super::query::make_query;
use super::sufficiency::{evaluate_sufficiency, SufficiencyVerdict};
use super::summarize::summarize_pages;
use crate::core::config::Settings;
use crate::core::errors::PipelineError;
use crate::index::IndexStore;
use crate::llm::TextGenerator;
use crate::web::{PageExtractor, SearchConnector};

pub struct QuestionPipeline {
    settings: Settings,
    generator: Arc<dyn TextGenerator>,
    index: Arc<dyn IndexStore>,
    search: Arc<dyn SearchConnector>,
    extractor: Arc<dyn PageExtractor>,
}

impl QuestionPipeline {
    pub fn new(
        settings: Settings,
        generator: Arc<dyn TextGenerator>,
        index: Arc<dyn IndexStore>,
        search: Arc<dyn SearchConnector>,
        extractor: Arc<dyn PageExtractor>,
    ) -> Self {
        Self {
            settings,
            generator,
            index,
            search,
            extractor,
        }
    }

    /// Answer a batch of questions strictly sequentially, preserving the
    /// input order. A question that fails with a fatal error is logged
    /// and skipped; the batch continues.
    pub async fn answer_questions(&self, questions: &[String]) -> Vec<(String, String)> {
        let mode = if self.settings.use_cloud { "cloud" } else { "local" };
        tracing::info!("Processing {} questions ({} mode)", questions.len(), mode);

        let mut answers = Vec::with_capacity(questions.len());
        for question in questions {
            tracing::info!("Processing question: {}", question);
            match self.answer_question(question).await {
                Ok(answer) => answers.push((question.clone(), answer)),
                Err(err) => {
                    tracing::error!("Failed to answer {:?}: {}", question, err);
                }
            }
        }
        answers
    }

    /// Answer a single question.
    pub async fn answer_question(&self, question: &str) -> Result<String, PipelineError> {
        let use_cloud = self.settings.use_cloud;
        let prompts = &self.settings.prompts;

        tracing::info!("Generating index query");
        let index_query = make_query(
            self.generator.as_ref(),
            prompts.index_query.active(use_cloud),
            &[("question", question)],
        )
        .await?;

        tracing::info!("Retrieving context from index");
        let documents = self
            .index
            .retrieve(&index_query, self.settings.index.top_k)
            .await?;
        let mut context = documents.join("\n\n");

        let max_attempts = self.settings.retrieval.max_attempts;
        // NOTE: could also be seeded from the index query.
        let mut search_query = String::new();
        let mut summaries: Vec<(String, String)> = Vec::new();
        let mut verdict = SufficiencyVerdict {
            sufficient: false,
            missing_info: String::new(),
        };
        let mut final_attempt = 0;

        for attempt in 0..max_attempts {
            tracing::info!("Attempt {}", attempt + 1);
            final_attempt = attempt;

            tracing::info!("Evaluating context sufficiency");
            verdict = evaluate_sufficiency(
                self.generator.as_ref(),
                question,
                &context,
                prompts.context_evaluation.active(use_cloud),
            )
            .await?;

            if verdict.sufficient || attempt == max_attempts - 1 {
                tracing::info!(
                    "Finishing context retrieval with {} context",
                    if verdict.sufficient {
                        "sufficient"
                    } else {
                        "insufficient"
                    }
                );
                break;
            }
            tracing::info!("Context is insufficient; gathering more information");

            search_query = make_query(
                self.generator.as_ref(),
                prompts.search_query.active(use_cloud),
                &[
                    ("question", question),
                    ("previous_query", &search_query),
                    ("missing_info", &verdict.missing_info),
                ],
            )
            .await?;

            tracing::info!("Searching the web for: {}", search_query);
            let urls = self
                .search
                .search(
                    &search_query,
                    self.settings.search.result_count,
                    Duration::from_secs(self.settings.search.timeout_secs),
                )
                .await?;

            tracing::info!("Extracting text from {} urls", urls.len());
            let pages = self.extractor.extract(&urls).await;

            tracing::info!("Summarizing {} pages into new context", pages.len());
            let (new_context, new_summaries) = summarize_pages(
                self.generator.as_ref(),
                &pages,
                prompts.summarization.active(use_cloud),
                self.settings.summarization.text_length_limit,
            )
            .await?;
            context = new_context;
            summaries = new_summaries;
        }

        if !verdict.sufficient {
            tracing::warn!(
                "Proceeding with insufficient context after {} attempts",
                max_attempts
            );
        }

        // Only knowledge gathered through refinement is new; an answer
        // served from the index alone writes nothing back.
        if verdict.sufficient && final_attempt > 0 {
            tracing::info!("Saving {} summaries to index", summaries.len());
            self.index.persist(&summaries).await?;
        }

        tracing::info!("Generating final answer");
        answer_with_context(
            self.generator.as_ref(),
            question,
            &context,
            prompts.answer.active(use_cloud),
        )
        .await
    }
}
