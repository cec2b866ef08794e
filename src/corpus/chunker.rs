//! Text chunking for indexing.
//!
//! Splits a document into bounded, overlapping chunks. Chunk boundaries
//! prefer to land on natural breaks (paragraph, line, space) when one is
//! available inside the window; consecutive chunks always share exactly
//! `chunk_overlap` characters so context survives the boundary.

/// A chunk of a source document, measured in characters.
#[derive(Debug, Clone)]
pub struct TextChunk {
    pub text: String,
    /// Source document identifier.
    pub source: String,
    /// Character offset within the source document.
    pub start_offset: usize,
    /// Chunk position within the source.
    pub chunk_index: usize,
}

/// Break preference, largest first.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Split one document into overlapping chunks.
///
/// Invariants: every chunk is at most `chunk_size` characters; each chunk
/// after the first starts exactly `chunk_overlap` characters before the
/// previous chunk's end; a document shorter than `chunk_size` yields one
/// chunk. Callers must uphold `chunk_overlap < chunk_size`.
pub fn split_document(
    text: &str,
    source: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<TextChunk> {
    debug_assert!(chunk_overlap < chunk_size);

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    let mut chunks = Vec::new();
    if total == 0 {
        return chunks;
    }

    let mut start = 0usize;
    let mut chunk_index = 0usize;

    loop {
        let hard_end = (start + chunk_size).min(total);
        let end = if hard_end < total {
            break_point(&chars, start, hard_end, chunk_overlap)
        } else {
            hard_end
        };

        chunks.push(TextChunk {
            text: chars[start..end].iter().collect(),
            source: source.to_string(),
            start_offset: start,
            chunk_index,
        });

        if end >= total {
            break;
        }

        start = end - chunk_overlap;
        chunk_index += 1;
    }

    chunks
}

/// Best cut inside `[start, hard_end)`: the latest separator occurrence
/// whose cut still makes forward progress past the overlap region. Falls
/// back to the hard window end when no separator qualifies.
fn break_point(chars: &[char], start: usize, hard_end: usize, chunk_overlap: usize) -> usize {
    let min_end = start + chunk_overlap + 1;

    for sep in SEPARATORS {
        let sep_chars: Vec<char> = sep.chars().collect();
        let sep_len = sep_chars.len();
        if hard_end - start < sep_len {
            continue;
        }

        // Scan backwards: the first hit is the largest usable cut for
        // this separator; anything earlier can only be smaller.
        let mut pos = hard_end - sep_len;
        loop {
            if chars[pos..pos + sep_len] == sep_chars[..] {
                let cut = pos + sep_len;
                if cut >= min_end {
                    return cut;
                }
                break;
            }
            if pos == start {
                break;
            }
            pos -= 1;
        }
    }

    hard_end
}
