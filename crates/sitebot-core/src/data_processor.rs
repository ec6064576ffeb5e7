use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::ChunkingSettings;
use crate::types::{Chunk, Page};

/// Separators tried in order: paragraphs, lines, sentences, words, characters.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self { Self::from(&ChunkingSettings::default()) }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(s: &ChunkingSettings) -> Self { Self { chunk_size: s.chunk_size, chunk_overlap: s.chunk_overlap } }
}

/// Reads cleaned pages and splits them into positional chunks.
#[derive(Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_config(chunking_config: ChunkingConfig) -> Self { Self { chunking_config } }

    pub fn process_path(&self, pages_path: &Path) -> Result<Vec<Chunk>> {
        let pages = self.read_pages(pages_path, None)?;
        Ok(self.chunk_pages(&pages))
    }

    pub fn process_path_limited(&self, pages_path: &Path, limit: usize) -> Result<Vec<Chunk>> {
        let pages = self.read_pages(pages_path, Some(limit))?;
        Ok(self.chunk_pages(&pages))
    }

    /// Split every page, numbering chunks `0..n` in emission order.
    pub fn chunk_pages(&self, pages: &[Page]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for page in pages {
            for text in self.split_text(&page.text) {
                chunks.push(Chunk::new(chunks.len() as u64, page.url.clone(), text));
            }
        }
        info!(pages = pages.len(), chunks = chunks.len(), "chunked pages");
        chunks
    }

    /// Recursive character split; every piece is at most `chunk_size` chars
    /// unless a single unbreakable run is longer.
    pub fn split_text(&self, text: &str) -> Vec<String> { self.split_recursive(text, &SEPARATORS) }

    pub fn read_pages(&self, pages_path: &Path, limit: Option<usize>) -> Result<Vec<Page>> {
        let files = if pages_path.is_dir() { self.list_jsonl_files(pages_path) } else { vec![pages_path.to_path_buf()] };
        if files.is_empty() {
            warn!(path = %pages_path.display(), "no .jsonl page files found");
            return Ok(vec![]);
        }
        let mut pages = Vec::new();
        'files: for file_path in &files {
            debug!(file = %file_path.display(), "reading pages");
            let content = fs::read_to_string(file_path).with_context(|| format!("reading {}", file_path.display()))?;
            for (line_no, line) in content.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() { continue; }
                let page: Page = serde_json::from_str(line)
                    .with_context(|| format!("{}:{}: invalid page record", file_path.display(), line_no + 1))?;
                if page.text.trim().is_empty() { continue; }
                pages.push(page);
                if limit.is_some_and(|l| pages.len() >= l) { info!(limit = pages.len(), "page limit reached"); break 'files; }
            }
        }
        info!(files = files.len(), pages = pages.len(), "read pages");
        Ok(pages)
    }

    fn split_recursive(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        let (separator, rest) = pick_separator(text, separators);
        let mut out = Vec::new();
        let mut good: Vec<String> = Vec::new();
        for piece in split_keep_separator(text, separator) {
            if char_len(&piece) < self.chunking_config.chunk_size { good.push(piece); continue; }
            if !good.is_empty() { out.extend(self.merge_splits(&good)); good.clear(); }
            if rest.is_empty() {
                let piece = piece.trim();
                if !piece.is_empty() { out.push(piece.to_string()); }
            } else {
                out.extend(self.split_recursive(&piece, rest));
            }
        }
        if !good.is_empty() { out.extend(self.merge_splits(&good)); }
        out
    }

    fn merge_splits(&self, splits: &[String]) -> Vec<String> {
        let (chunk_size, chunk_overlap) = (self.chunking_config.chunk_size, self.chunking_config.chunk_overlap);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;
        for split in splits {
            let len = char_len(split);
            if total + len > chunk_size && !current.is_empty() {
                push_joined(&mut docs, &current);
                // keep at most `chunk_overlap` chars as the head of the next chunk
                while total > chunk_overlap || (total + len > chunk_size && total > 0) {
                    match current.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }
            current.push_back(split);
            total += len;
        }
        push_joined(&mut docs, &current);
        docs
    }

    fn list_jsonl_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path(); if path.extension().and_then(|s| s.to_str()) == Some("jsonl") { files.push(path.to_path_buf()); }
        }
        files.sort(); files
    }
}

fn pick_separator<'a>(text: &str, separators: &'a [&'static str]) -> (&'static str, &'a [&'static str]) {
    for (i, sep) in separators.iter().enumerate() {
        let sep = *sep;
        if sep.is_empty() { return (sep, &[]); }
        if text.contains(sep) { return (sep, &separators[i + 1..]); }
    }
    ("", &[])
}

/// Split on `sep`, keeping it at the start of every piece after the first.
fn split_keep_separator(text: &str, sep: &str) -> Vec<String> {
    if sep.is_empty() { return text.chars().map(String::from).collect(); }
    let mut parts = text.split(sep);
    let mut out = Vec::new();
    if let Some(first) = parts.next() { if !first.is_empty() { out.push(first.to_string()); } }
    out.extend(parts.map(|p| format!("{sep}{p}")));
    out
}

fn push_joined(docs: &mut Vec<String>, current: &VecDeque<&str>) {
    let joined: String = current.iter().copied().collect();
    let joined = joined.trim();
    if !joined.is_empty() { docs.push(joined.to_string()); }
}

fn char_len(s: &str) -> usize { s.chars().count() }
