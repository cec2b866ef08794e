//! Corpus loading.
//!
//! Reads every `*.txt` file under the corpus directory, recursively.
//! Anything else is ignored; a corpus with no matching documents is an
//! error, because an empty index would silently answer every question
//! with "not available".

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::errors::EngineError;

/// One source document before chunking.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Path relative to the corpus root, used as the provenance id.
    pub source: String,
    pub content: String,
}

pub fn load_corpus(corpus_dir: &Path) -> Result<Vec<RawDocument>, EngineError> {
    if !corpus_dir.is_dir() {
        return Err(EngineError::EmptyCorpus(corpus_dir.to_path_buf()));
    }

    let mut files = Vec::new();
    collect_txt_files(corpus_dir, &mut files)?;
    // Deterministic ordering so rebuilds from the same corpus are stable.
    files.sort();

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Skipping unreadable document {}: {}", path.display(), err);
                continue;
            }
        };

        let source = path
            .strip_prefix(corpus_dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .to_string();

        documents.push(RawDocument { source, content });
    }

    if documents.is_empty() {
        return Err(EngineError::EmptyCorpus(corpus_dir.to_path_buf()));
    }

    Ok(documents)
}

fn collect_txt_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), EngineError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            collect_txt_files(&path, out)?;
        } else if path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false)
        {
            out.push(path);
        }
    }
    Ok(())
}
