use crate::state::{ChunkIndex, ChunkMap, ChunkStatus};

pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Final translated text built from the completed chunks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssembledText {
    pub text: String,
    /// Number of chunks whose text was used.
    pub contributing: usize,
    /// Chunks that were not completed when the text was assembled.
    pub missing: Vec<ChunkIndex>,
}

/// Concatenate completed chunk texts in ascending index order.
pub fn assemble(chunks: &ChunkMap) -> AssembledText {
    let mut parts = Vec::with_capacity(chunks.len());
    let mut missing = Vec::new();
    for (index, chunk) in chunks {
        match (chunk.status(), chunk.translated_text()) {
            (ChunkStatus::Completed, Some(text)) => parts.push(text),
            _ => missing.push(*index),
        }
    }
    AssembledText {
        text: parts.join(CHUNK_SEPARATOR),
        contributing: parts.len(),
        missing,
    }
}
