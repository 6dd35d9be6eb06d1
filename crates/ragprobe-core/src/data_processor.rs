use std::fs;
use std::path::{Path, PathBuf};

use crate::chunker::chunk_documents;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document, RagConfig};

const DOCUMENT_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// Questions that fit most reports, papers and articles.
pub const SAMPLE_QUESTIONS: [&str; 5] = [
    "What are the main conclusions or findings?",
    "Summarize the key points in 2-3 sentences.",
    "What methodology or approach is described?",
    "What limitations or challenges are mentioned?",
    "What future work or next steps are suggested?",
];

/// Turns a directory of text files into [`Document`]s and a question file
/// into a question list. Stands in for the upload/extraction step.
#[derive(Debug, Default)]
pub struct DataProcessor;

impl DataProcessor {
    pub fn new() -> Self { Self }

    pub fn load_documents(&self, data_dir: &Path) -> Result<Vec<Document>> {
        self.load_documents_limited(data_dir, usize::MAX)
    }

    pub fn load_documents_limited(&self, data_dir: &Path, limit: usize) -> Result<Vec<Document>> {
        if !data_dir.is_dir() {
            return Err(Error::NotFound(format!("document directory {}", data_dir.display())));
        }
        let mut files = self.list_document_files(data_dir);
        if files.is_empty() {
            tracing::warn!(dir = %data_dir.display(), "no .txt or .md files found");
            return Ok(vec![]);
        }
        if files.len() > limit {
            files.truncate(limit);
            tracing::info!(limit, "limited to first {} files", limit);
        }
        let mut documents = Vec::with_capacity(files.len());
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::debug!(file = %file_path.display(), "loading document {}/{}", file_index + 1, files.len());
            let raw = fs::read(file_path)?;
            let size = raw.len();
            let text = normalize_whitespace(&String::from_utf8_lossy(&raw));
            documents.push(Document {
                id: self.extract_doc_id(data_dir, file_path),
                name: file_path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default(),
                text,
                size,
            });
        }
        tracing::info!(documents = documents.len(), dir = %data_dir.display(), "loaded documents");
        Ok(documents)
    }

    /// One question per non-empty line; lines starting with `#` are comments.
    pub fn load_questions(&self, path: &Path) -> Result<Vec<String>> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::NotFound(format!("question file {}: {}", path.display(), e)))?;
        Ok(parse_questions(&content))
    }

    /// Chunk documents with the sizes a pipeline configuration asks for.
    pub fn chunk(&self, documents: &[Document], config: &RagConfig) -> Vec<Chunk> {
        chunk_documents(documents, config.chunk_size, config.overlap_chars())
    }

    /// Path relative to the scanned directory, `/`-separated, extension kept,
    /// so `a/notes.txt` and `b/notes.md` stay distinct.
    fn extract_doc_id(&self, root: &Path, file_path: &Path) -> String {
        let relative = file_path.strip_prefix(root).unwrap_or(file_path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn list_document_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| {
                p.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
            })
            .collect();
        files.sort();
        files
    }
}

pub fn parse_questions(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
