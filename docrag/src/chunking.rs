//! Chunking stage: splits enriched page text into overlapping chunks.
//!
//! Chunks accumulate whitespace-delimited tokens until the accumulated
//! character length (token length plus one separator per token) reaches the
//! target size. Consecutive chunks share a proportional token overlap.
//! Chunks never cross page boundaries.

use sha2::{Digest, Sha256};

use docrag_core::Page;

use crate::document::Chunk;

/// Split every page into chunks with `target_size`/`overlap` character
/// budgets. Pages are processed in input order; a page producing zero
/// tokens yields zero chunks. Each chunk's id is a deterministic function
/// of `(document_id, page, sequence, text)`, so identical input produces
/// identical ids.
pub fn chunk_pages(
    pages: &[Page],
    document_id: &str,
    target_size: usize,
    overlap: usize,
) -> Vec<Chunk> {
    pages.iter().flat_map(|page| chunk_page(page, document_id, target_size, overlap)).collect()
}

/// Split one page's text into chunks.
///
/// The overlap carried into the next chunk is proportional, not absolute:
/// `floor(token_count * overlap / target_size)` tokens from the tail of the
/// closing chunk. A computed overlap of zero means the next chunk starts
/// empty. The final partial accumulation is emitted if non-empty.
pub fn chunk_page(page: &Page, document_id: &str, target_size: usize, overlap: usize) -> Vec<Chunk> {
    let tokens: Vec<&str> = page.text.split_whitespace().collect();
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_size = 0usize;

    for token in tokens {
        current.push(token);
        current_size += token.chars().count() + 1; // +1 for the separator

        if current_size >= target_size {
            emit(&mut chunks, &current, page.page_number, document_id);

            let carry = current.len() * overlap / target_size;
            if carry > 0 {
                current.drain(..current.len() - carry);
            } else {
                current.clear();
            }
            current_size = current.iter().map(|t| t.chars().count() + 1).sum();
        }
    }

    if !current.is_empty() {
        emit(&mut chunks, &current, page.page_number, document_id);
    }

    chunks
}

fn emit(chunks: &mut Vec<Chunk>, tokens: &[&str], page_number: u32, document_id: &str) {
    let sequence_index = chunks.len() as u32;
    let text = tokens.join(" ");
    chunks.push(Chunk {
        id: chunk_id(document_id, page_number, sequence_index, &text),
        text,
        embedding: Vec::new(),
        page_number,
        sequence_index,
        document_id: document_id.to_string(),
    });
}

/// Content-derived chunk id: `{document_id}_p{page}_c{seq}_{hash8}`.
fn chunk_id(document_id: &str, page_number: u32, sequence_index: u32, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    format!("{document_id}_p{page_number}_c{sequence_index}_{}", &hash[..8])
}
