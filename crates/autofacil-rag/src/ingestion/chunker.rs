//! Recursive character text chunking
//!
//! Text is split on the highest-priority separator it contains (paragraph,
//! line, word, then single characters), small pieces are merged back up to
//! the chunk size, and a trailing window of up to `overlap` characters is
//! repeated at the start of the next chunk. All lengths are counted in
//! characters, not bytes.

use std::collections::VecDeque;

use crate::config::ChunkingConfig;
use crate::error::Result;

/// Text chunker with configurable size, overlap and separators
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Separators, highest priority first
    separators: Vec<String>,
}

impl TextChunker {
    /// Create a chunker with the default separators
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        Self::from_config(&ChunkingConfig {
            chunk_size,
            chunk_overlap: overlap,
            ..ChunkingConfig::default()
        })
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
            separators: config.separators.clone(),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into ordered, overlapping chunks
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();

        // First separator present in the text wins; "" always matches
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate.as_str();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let pieces = split_on(text, separator);

        let mut small: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }

            if !small.is_empty() {
                chunks.extend(self.merge(&small, separator));
                small.clear();
            }

            if remaining.is_empty() && separator.is_empty() {
                chunks.extend(trimmed(piece));
            } else if remaining.is_empty() {
                // Separator list without "": fall back to a hard cut
                chunks.extend(self.split_recursive(piece, &[String::new()]));
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge(&small, separator));
        }

        chunks
    }

    /// Greedily merge small pieces into chunks, keeping an overlap window
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let joined_len = |window: &VecDeque<&str>, total: usize| {
                total + len + if window.is_empty() { 0 } else { separator_len }
            };

            if joined_len(&window, total) > self.chunk_size && !window.is_empty() {
                chunks.extend(trimmed(&join(&window, separator)));

                // Drop pieces from the front until only the overlap remains
                // and the next piece fits
                while total > self.overlap
                    || (total > 0 && joined_len(&window, total) > self.chunk_size)
                {
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    total -= char_len(front) + if window.is_empty() { 0 } else { separator_len };
                }
            }

            total += len + if window.is_empty() { 0 } else { separator_len };
            window.push_back(piece);
        }

        if !window.is_empty() {
            chunks.extend(trimmed(&join(&window, separator)));
        }

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        let config = ChunkingConfig::default();
        Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
            separators: config.separators,
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split on a separator, dropping empty pieces; "" splits into characters
fn split_on<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        text.char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect()
    } else {
        text.split(separator).filter(|piece| !piece.is_empty()).collect()
    }
}

fn join(window: &VecDeque<&str>, separator: &str) -> String {
    window.iter().copied().collect::<Vec<_>>().join(separator)
}

fn trimmed(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
