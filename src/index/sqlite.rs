//! SQLite-backed index store.
//!
//! In-process vector store: document text and metadata in SQLite, brute
//! force cosine similarity over little-endian f32 embedding BLOBs.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::IndexStore;
use crate::core::errors::PipelineError;
use crate::llm::Embedder;

pub struct SqliteIndexStore {
    pool: SqlitePool,
    collection: String,
    embedder: Arc<dyn Embedder>,
}

impl SqliteIndexStore {
    pub async fn open(
        db_path: PathBuf,
        collection: String,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, PipelineError> {
        if let Some(parent) = db_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(PipelineError::internal)?;

        let store = Self {
            pool,
            collection,
            embedder,
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), PipelineError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                doc_id TEXT NOT NULL,
                collection TEXT NOT NULL,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (collection, doc_id)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(PipelineError::internal)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)")
            .execute(&self.pool)
            .await
            .map_err(PipelineError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn content_id(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl IndexStore for SqliteIndexStore {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<String>, PipelineError> {
        // Nothing indexed yet: skip the embedding call entirely.
        if self.count().await? == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Upstream("embedder returned no vector".to_string()))?;

        let rows = sqlx::query(
            "SELECT content, embedding FROM documents WHERE collection = ?1",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await
        .map_err(PipelineError::internal)?;

        let mut scored: Vec<(String, f32)> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.try_get("embedding").ok()?;
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::cosine_similarity(&query_embedding, &stored);
                let content: String = row.try_get("content").ok()?;
                Some((content, score))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k.max(1));

        Ok(scored.into_iter().map(|(content, _)| content).collect())
    }

    async fn persist(&self, documents: &[(String, String)]) -> Result<(), PipelineError> {
        if documents.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = documents.iter().map(|(_, text)| text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != documents.len() {
            return Err(PipelineError::Upstream(format!(
                "embedder returned {} vectors for {} documents",
                embeddings.len(),
                documents.len()
            )));
        }

        let mut tx = self.pool.begin().await.map_err(PipelineError::internal)?;

        for ((source, text), embedding) in documents.iter().zip(embeddings.iter()) {
            let doc_id = Self::content_id(text);
            let blob = Self::serialize_embedding(embedding);

            sqlx::query(
                "INSERT OR REPLACE INTO documents (doc_id, collection, content, source, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&doc_id)
            .bind(&self.collection)
            .bind(text)
            .bind(source)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(PipelineError::internal)?;
        }

        tx.commit().await.map_err(PipelineError::internal)?;
        Ok(())
    }

    async fn count(&self) -> Result<usize, PipelineError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?1")
                .bind(&self.collection)
                .fetch_one(&self.pool)
                .await
                .map_err(PipelineError::internal)?;

        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic keyword embedder: two orthogonal axes plus a count of
    /// how often it was invoked.
    struct KeywordEmbedder {
        calls: AtomicUsize,
    }

    impl KeywordEmbedder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn vector_for(text: &str) -> Vec<f32> {
            let lower = text.to_lowercase();
            let paris = if lower.contains("paris") { 1.0 } else { 0.0 };
            let rust = if lower.contains("rust") { 1.0 } else { 0.0 };
            vec![paris, rust, 0.1]
        }
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(inputs.iter().map(|text| Self::vector_for(text)).collect())
        }
    }

    async fn test_store(embedder: Arc<KeywordEmbedder>) -> SqliteIndexStore {
        let db_path = std::env::temp_dir().join(format!(
            "ragline-index-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        SqliteIndexStore::open(db_path, "test".to_string(), embedder)
            .await
            .unwrap()
    }

    fn doc(source: &str, text: &str) -> (String, String) {
        (source.to_string(), text.to_string())
    }

    #[tokio::test]
    async fn empty_index_returns_nothing_without_embedding() {
        let embedder = KeywordEmbedder::new();
        let store = test_store(embedder.clone()).await;

        let results = store.retrieve("anything", 5).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn persist_then_retrieve_round_trip() {
        let embedder = KeywordEmbedder::new();
        let store = test_store(embedder).await;

        store
            .persist(&[
                doc("u1", "Paris is the capital of France."),
                doc("u2", "Rust has a borrow checker."),
            ])
            .await
            .unwrap();

        let results = store.retrieve("capital of paris", 1).await.unwrap();
        assert_eq!(results, vec!["Paris is the capital of France.".to_string()]);

        let results = store.retrieve("rust language", 1).await.unwrap();
        assert_eq!(results, vec!["Rust has a borrow checker.".to_string()]);
    }

    #[tokio::test]
    async fn identical_content_is_stored_once() {
        let embedder = KeywordEmbedder::new();
        let store = test_store(embedder).await;

        store
            .persist(&[doc("u1", "Paris facts"), doc("u2", "Paris facts")])
            .await
            .unwrap();
        store.persist(&[doc("u3", "Paris facts")]).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn retrieve_respects_top_k() {
        let embedder = KeywordEmbedder::new();
        let store = test_store(embedder).await;

        store
            .persist(&[
                doc("u1", "paris one"),
                doc("u2", "paris two"),
                doc("u3", "paris three"),
            ])
            .await
            .unwrap();

        let results = store.retrieve("paris", 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }
}
