//! Ingestion pipeline orchestration

use base64::{engine::general_purpose::STANDARD, Engine as _};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::Chunk;

use super::chunker::TextChunker;
use super::parser::FileParser;

/// Result of a successful ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Source tag of the indexed chunks
    pub filename: String,
    /// Chunks now indexed for the file
    pub chunk_count: usize,
    /// Chunks of the previous generation that were removed
    pub replaced: usize,
}

/// Main ingestion pipeline
///
/// Re-ingesting a filename replaces its chunks in one index transaction,
/// and ingestions of the same filename are serialized.
pub struct IngestPipeline {
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    /// Per-filename locks
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Self {
        tracing::debug!(
            "Chunking at {} chars with {} overlap",
            chunker.chunk_size(),
            chunker.overlap()
        );
        Self {
            chunker,
            embedder,
            store,
            locks: DashMap::new(),
        }
    }

    /// Decode a base64 upload. Line breaks and surrounding whitespace are ignored.
    pub fn decode(content_base64: &str) -> Result<Vec<u8>> {
        let compact: String = content_base64
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        STANDARD.decode(compact).map_err(|_| Error::InvalidEncoding)
    }

    /// Extract and chunk a file, tagging every chunk with its filename
    pub fn prepare(&self, filename: &str, data: &[u8]) -> Result<Vec<Chunk>> {
        Self::prepare_with(&self.chunker, filename, data)
    }

    /// Full ingestion: decode + extract + chunk + embed + replace
    pub async fn ingest(&self, filename: &str, content_base64: &str) -> Result<IngestOutcome> {
        let start = Instant::now();
        let data = Self::decode(content_base64)?;

        tracing::info!("Processing file: {} ({} bytes)", filename, data.len());

        // Extraction is CPU-bound (PDF parsing), keep it off the async workers
        let chunker = self.chunker.clone();
        let name = filename.to_string();
        let chunks = tokio::task::spawn_blocking(move || {
            Self::prepare_with(&chunker, &name, &data)
        })
        .await??;

        // Embed before touching the index so a collaborator failure leaves
        // the previous generation in place
        let (chunks, replaced) = self
            .locked(filename, async {
                let chunks = self.embed_chunks(chunks).await?;
                let replaced = self.store.replace_source(filename, &chunks).await?;
                Ok::<_, Error>((chunks, replaced))
            })
            .await?;

        tracing::info!(
            "Ingested {}: {} chunks ({} replaced) in {}ms",
            filename,
            chunks.len(),
            replaced,
            start.elapsed().as_millis()
        );

        Ok(IngestOutcome {
            filename: filename.to_string(),
            chunk_count: chunks.len(),
            replaced,
        })
    }

    /// Remove every chunk of a file, returning how many were removed
    pub async fn remove(&self, filename: &str) -> Result<usize> {
        let removed = self
            .locked(filename, self.store.delete_by_source(filename))
            .await?;
        tracing::info!("Removed {} chunks of {}", removed, filename);
        Ok(removed)
    }

    /// Run `work` under the filename's lock
    async fn locked<T>(&self, filename: &str, work: impl Future<Output = T>) -> T {
        // Declared first so it drops last, after our clone of the lock
        let _release = LockRelease {
            locks: &self.locks,
            filename,
        };
        let lock = self.locks.entry(filename.to_string()).or_default().clone();
        let _guard = lock.lock().await;
        work.await
    }

    fn prepare_with(chunker: &TextChunker, filename: &str, data: &[u8]) -> Result<Vec<Chunk>> {
        let text = FileParser::extract(filename, data)?;

        Ok(chunker
            .split(&text)
            .into_iter()
            .enumerate()
            .map(|(i, content)| Chunk::new(filename, content, i as u32))
            .collect())
    }

    async fn embed_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<Chunk>> {
        if chunks.is_empty() {
            return Ok(chunks);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} chunks",
                self.embedder.name(),
                embeddings.len(),
                chunks.len()
            )));
        }

        Ok(chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| chunk.with_embedding(embedding))
            .collect())
    }
}

/// Drops a filename's lock entry once no other task holds it
struct LockRelease<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    filename: &'a str,
}

impl Drop for LockRelease<'_> {
    fn drop(&mut self) {
        self.locks
            .remove_if(self.filename, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SqliteVectorStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds text as (length, vowel count); counts calls
    struct CountingEmbedder {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingEmbedder {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::embedding("quota exceeded"));
            }
            let vowels = text.chars().filter(|c| "aeiou".contains(*c)).count();
            Ok(vec![text.len() as f32, vowels as f32 + 1.0])
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn pipeline(embedder: Arc<CountingEmbedder>) -> (IngestPipeline, SqliteVectorStore) {
        let store = SqliteVectorStore::in_memory().unwrap();
        let pipeline = IngestPipeline::new(
            TextChunker::default(),
            embedder,
            Arc::new(store.clone()),
        );
        (pipeline, store)
    }

    #[test]
    fn test_decode() {
        assert_eq!(IngestPipeline::decode("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(IngestPipeline::decode("aGVs\nbG8=\n").unwrap(), b"hello");
        assert!(IngestPipeline::decode("").unwrap().is_empty());
        assert!(matches!(
            IngestPipeline::decode("%%%not-base64%%%"),
            Err(Error::InvalidEncoding)
        ));
    }

    #[test]
    fn test_prepare_tags_chunks() {
        let (pipeline, _) = pipeline(Arc::new(CountingEmbedder::new(false)));
        let text = "word ".repeat(300);
        let chunks = pipeline.prepare("notes.txt", text.as_bytes()).unwrap();

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.source(), "notes.txt");
            assert_eq!(chunk.metadata.chunk_index, i as u32);
        }
    }

    #[tokio::test]
    async fn test_ingest_is_idempotent() {
        let (pipeline, store) = pipeline(Arc::new(CountingEmbedder::new(false)));
        let content = STANDARD.encode("alpha beta gamma ".repeat(100));

        let first = pipeline.ingest("notes.txt", &content).await.unwrap();
        let second = pipeline.ingest("notes.txt", &content).await.unwrap();

        assert_eq!(first.chunk_count, second.chunk_count);
        assert_eq!(first.replaced, 0);
        assert_eq!(second.replaced, first.chunk_count);
        assert_eq!(store.count_by_source_sync("notes.txt").unwrap(), first.chunk_count);
    }

    #[tokio::test]
    async fn test_empty_content_indexes_nothing() {
        let embedder = Arc::new(CountingEmbedder::new(false));
        let (pipeline, store) = pipeline(Arc::clone(&embedder));

        let outcome = pipeline.ingest("empty.txt", "").await.unwrap();
        assert_eq!(outcome.chunk_count, 0);
        assert_eq!(store.len_sync().unwrap(), 0);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_base64_leaves_index_untouched() {
        let (pipeline, store) = pipeline(Arc::new(CountingEmbedder::new(false)));
        pipeline
            .ingest("notes.txt", &STANDARD.encode("kept"))
            .await
            .unwrap();

        let result = pipeline.ingest("notes.txt", "%%%not-base64%%%").await;
        assert!(matches!(result, Err(Error::InvalidEncoding)));
        assert_eq!(store.count_by_source_sync("notes.txt").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_embedding_failure_keeps_previous_generation() {
        let store = SqliteVectorStore::in_memory().unwrap();
        let good = IngestPipeline::new(
            TextChunker::default(),
            Arc::new(CountingEmbedder::new(false)),
            Arc::new(store.clone()),
        );
        good.ingest("notes.txt", &STANDARD.encode("old content"))
            .await
            .unwrap();

        let failing = IngestPipeline::new(
            TextChunker::default(),
            Arc::new(CountingEmbedder::new(true)),
            Arc::new(store.clone()),
        );
        let result = failing
            .ingest("notes.txt", &STANDARD.encode("new content"))
            .await;

        assert!(matches!(result, Err(Error::Embedding(_))));
        let remaining = store.search_sync(&[11.0, 5.0], 4, Some("notes.txt")).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].chunk.content, "old content");
    }

    #[tokio::test]
    async fn test_concurrent_ingestion_of_same_file() {
        let (pipeline, store) = pipeline(Arc::new(CountingEmbedder::new(false)));
        let pipeline = Arc::new(pipeline);
        let content = STANDARD.encode("lorem ipsum dolor ".repeat(80));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pipeline = Arc::clone(&pipeline);
                let content = content.clone();
                tokio::spawn(async move { pipeline.ingest("race.txt", &content).await })
            })
            .collect();

        let mut counts = Vec::new();
        for handle in handles {
            counts.push(handle.await.unwrap().unwrap().chunk_count);
        }

        assert!(counts.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.count_by_source_sync("race.txt").unwrap(), counts[0]);
    }

    #[tokio::test]
    async fn test_remove() {
        let (pipeline, store) = pipeline(Arc::new(CountingEmbedder::new(false)));
        pipeline
            .ingest("notes.txt", &STANDARD.encode("some text"))
            .await
            .unwrap();

        assert_eq!(pipeline.remove("notes.txt").await.unwrap(), 1);
        assert_eq!(pipeline.remove("notes.txt").await.unwrap(), 0);
        assert_eq!(store.len_sync().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_locks_released_after_remove() {
        let (pipeline, _) = pipeline(Arc::new(CountingEmbedder::new(false)));

        for i in 0..1000 {
            let removed = pipeline.remove(&format!("ghost-{}.txt", i)).await.unwrap();
            assert_eq!(removed, 0);
        }
        assert_eq!(pipeline.locks.len(), 0);
    }

    #[tokio::test]
    async fn test_locks_released_after_ingest() {
        let (pipeline, _) = pipeline(Arc::new(CountingEmbedder::new(false)));
        let pipeline = Arc::new(pipeline);
        let content = STANDARD.encode("lorem ipsum dolor ".repeat(80));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pipeline = Arc::clone(&pipeline);
                let content = content.clone();
                let filename = format!("doc-{}.txt", i % 3);
                tokio::spawn(async move { pipeline.ingest(&filename, &content).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(pipeline.locks.len(), 0);

        // Failed ingestions release their entry too
        let failing = IngestPipeline::new(
            TextChunker::default(),
            Arc::new(CountingEmbedder::new(true)),
            Arc::new(SqliteVectorStore::in_memory().unwrap()),
        );
        assert!(failing.ingest("notes.txt", &STANDARD.encode("text")).await.is_err());
        assert_eq!(failing.locks.len(), 0);
    }
}
