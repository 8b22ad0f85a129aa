//! Persistent local vector store on SQLite
//!
//! Embeddings are stored as little-endian `f32` blobs next to the chunk
//! text and searched by brute-force cosine similarity. This is sized for a
//! single organization's knowledge base, not for millions of vectors.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkMetadata, SourceSummary};

use super::vector_store::{VectorSearchResult, VectorStoreProvider};

/// SQLite-backed vector index
#[derive(Clone)]
pub struct SqliteVectorStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVectorStore {
    /// Create or open the index at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::vector_db(format!("Failed to open index: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.migrate()?;
        Ok(store)
    }

    /// Open the index inside the configured persistence directory
    pub fn from_config(config: &VectorDbConfig) -> Result<Self> {
        Self::open(config.index_path())
    }

    /// Create an in-memory index (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::vector_db(format!("Failed to open in-memory index: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.migrate()?;
        Ok(store)
    }

    /// Run schema migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            "#,
        )?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                dimensions INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);
            "#,
        )?;

        Ok(())
    }

    fn insert_all(conn: &Connection, chunks: &[Chunk]) -> Result<()> {
        let now = Utc::now();
        let mut stmt = conn.prepare_cached(
            r#"
            INSERT OR REPLACE INTO chunks
                (id, source, chunk_index, content, embedding, dimensions, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )?;

        for chunk in chunks {
            if chunk.embedding.is_empty() {
                return Err(Error::vector_db(format!(
                    "Chunk {} of '{}' has no embedding",
                    chunk.metadata.chunk_index, chunk.metadata.source
                )));
            }

            stmt.execute(params![
                chunk.id.to_string(),
                chunk.metadata.source,
                chunk.metadata.chunk_index,
                chunk.content,
                encode_embedding(&chunk.embedding),
                chunk.embedding.len() as i64,
                now,
            ])?;
        }

        Ok(())
    }

    /// Insert chunks in one transaction
    pub fn insert_chunks_sync(&self, chunks: &[Chunk]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        Self::insert_all(&tx, chunks)?;
        tx.commit()?;
        Ok(())
    }

    /// Delete every chunk of a source
    pub fn delete_by_source_sync(&self, source: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let deleted = conn.execute("DELETE FROM chunks WHERE source = ?1", params![source])?;
        Ok(deleted)
    }

    /// Delete and re-insert a source's chunks atomically
    pub fn replace_source_sync(&self, source: &str, chunks: &[Chunk]) -> Result<usize> {
        if let Some(stray) = chunks.iter().find(|c| c.metadata.source != source) {
            return Err(Error::vector_db(format!(
                "Chunk tagged '{}' passed while replacing '{}'",
                stray.metadata.source, source
            )));
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let deleted = tx.execute("DELETE FROM chunks WHERE source = ?1", params![source])?;
        Self::insert_all(&tx, chunks)?;
        tx.commit()?;
        Ok(deleted)
    }

    /// Brute-force cosine search
    pub fn search_sync(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        source_filter: Option<&str>,
    ) -> Result<Vec<VectorSearchResult>> {
        if top_k == 0 || query_embedding.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            r#"
            SELECT id, source, chunk_index, content, embedding
            FROM chunks
            WHERE ?1 IS NULL OR source = ?1
            "#,
        )?;

        let rows = stmt.query_map(params![source_filter], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Vec<u8>>(4)?,
            ))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (id, source, chunk_index, content, blob) = row?;
            let embedding = decode_embedding(&blob);

            if embedding.len() != query_embedding.len() {
                tracing::debug!(
                    "Skipping chunk {} of '{}': {} dimensions, query has {}",
                    chunk_index,
                    source,
                    embedding.len(),
                    query_embedding.len()
                );
                continue;
            }

            let similarity = cosine_similarity(query_embedding, &embedding);
            let id = Uuid::parse_str(&id)
                .map_err(|e| Error::vector_db(format!("Corrupt chunk id '{}': {}", id, e)))?;

            results.push(VectorSearchResult {
                chunk: Chunk {
                    id,
                    content,
                    metadata: ChunkMetadata {
                        source,
                        chunk_index,
                    },
                    embedding: Vec::new(),
                },
                similarity,
            });
        }

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.metadata.source.cmp(&b.chunk.metadata.source))
                .then_with(|| a.chunk.metadata.chunk_index.cmp(&b.chunk.metadata.chunk_index))
        });
        results.truncate(top_k);

        Ok(results)
    }

    pub fn count_by_source_sync(&self, source: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE source = ?1",
            params![source],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn list_sources_sync(&self) -> Result<Vec<SourceSummary>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT source, COUNT(*) FROM chunks GROUP BY source ORDER BY source",
        )?;

        let sources = stmt
            .query_map([], |row| {
                Ok(SourceSummary {
                    source: row.get(0)?,
                    chunks: row.get::<_, i64>(1)? as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(sources)
    }

    pub fn len_sync(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl VectorStoreProvider for SqliteVectorStore {
    async fn insert_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        // SQLite calls are blocking, keep them off the async workers
        let store = self.clone();
        let chunks = chunks.to_vec();
        tokio::task::spawn_blocking(move || store.insert_chunks_sync(&chunks)).await?
    }

    async fn delete_by_source(&self, source: &str) -> Result<usize> {
        let store = self.clone();
        let source = source.to_string();
        tokio::task::spawn_blocking(move || store.delete_by_source_sync(&source)).await?
    }

    async fn replace_source(&self, source: &str, chunks: &[Chunk]) -> Result<usize> {
        let store = self.clone();
        let source = source.to_string();
        let chunks = chunks.to_vec();
        tokio::task::spawn_blocking(move || store.replace_source_sync(&source, &chunks)).await?
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        source_filter: Option<&str>,
    ) -> Result<Vec<VectorSearchResult>> {
        let store = self.clone();
        let query = query_embedding.to_vec();
        let filter = source_filter.map(str::to_string);
        tokio::task::spawn_blocking(move || store.search_sync(&query, top_k, filter.as_deref()))
            .await?
    }

    async fn count_by_source(&self, source: &str) -> Result<usize> {
        let store = self.clone();
        let source = source.to_string();
        tokio::task::spawn_blocking(move || store.count_by_source_sync(&source)).await?
    }

    async fn list_sources(&self) -> Result<Vec<SourceSummary>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.list_sources_sync()).await?
    }

    async fn len(&self) -> Result<usize> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.len_sync()).await?
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.len().await.is_ok())
    }

    fn name(&self) -> &str {
        "local-sqlite"
    }
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Cosine similarity; zero vectors score 0
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
