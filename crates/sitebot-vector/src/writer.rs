use anyhow::{Result, anyhow};
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray, UInt64Array};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use sitebot_core::traits::Embedder;
use sitebot_core::types::Chunk;
use sitebot_embed::l2_normalize;

use crate::schema::build_chunk_schema;
use crate::table::{open_db, table_exists};

/// Builds the `chunks` table: embeds chunk text in batches and writes rows
/// whose `id` equals their position, so corpus and index stay aligned.
pub struct ChunkIndexWriter { db: Connection, table_name: String, batch_size: usize }

impl ChunkIndexWriter {
	pub fn new(db: Connection, table_name: &str, batch_size: usize) -> Self {
		Self { db, table_name: table_name.to_string(), batch_size: batch_size.max(1) }
	}

	/// Embed and write `chunks`. Returns the number of rows written.
	///
	/// Every batch is embedded before anything is written, and the table is
	/// created by a single call, so a failed build leaves no table behind.
	pub async fn index_chunks(&self, chunks: &[Chunk], embedder: &dyn Embedder) -> Result<usize> {
		if chunks.is_empty() { info!("no chunks to index"); return Ok(0); }
		validate_positions(chunks)?;
		if table_exists(&self.db, &self.table_name).await? {
			return Err(anyhow!("table '{}' already exists; rebuild into a fresh directory", self.table_name));
		}
		let dim = i32::try_from(embedder.dim())?;
		info!(chunks = chunks.len(), table = %self.table_name, dim, "indexing chunks");
		let pb = ProgressBar::new(chunks.len() as u64);
		pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?.progress_chars("#>-"));
		let mut record_batches = Vec::with_capacity(chunks.len().div_ceil(self.batch_size));
		for batch in chunks.chunks(self.batch_size) {
			let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
			let mut vectors = embedder.embed_batch(&texts)?;
			if vectors.len() != batch.len() { return Err(anyhow!("embedder returned {} vectors for {} chunks", vectors.len(), batch.len())); }
			for v in &mut vectors {
				if v.len() != embedder.dim() { return Err(anyhow!("dim mismatch: got {} expected {}", v.len(), embedder.dim())); }
				l2_normalize(v);
			}
			record_batches.push(chunks_to_record_batch(batch, &vectors, dim)?);
			pb.inc(batch.len() as u64);
		}
		pb.finish_with_message("embedded");
		let reader = Box::new(RecordBatchIterator::new(record_batches.into_iter().map(Ok), build_chunk_schema(dim)));
		self.db.create_table(&self.table_name, reader).execute().await?;
		info!(rows = chunks.len(), table = %self.table_name, "chunk index written");
		Ok(chunks.len())
	}
}

/// Build the table in a sibling `<dir>.staging` directory and swap it into
/// `db_dir` only once every row is written. On failure the previous index
/// in `db_dir` is left untouched.
pub async fn rebuild_index_dir(db_dir: &Path, table_name: &str, batch_size: usize, chunks: &[Chunk], embedder: &dyn Embedder) -> Result<usize> {
	let staging = staging_dir(db_dir)?;
	if staging.exists() { std::fs::remove_dir_all(&staging)?; }
	std::fs::create_dir_all(&staging)?;
	let built = async {
		let conn = open_db(staging.to_string_lossy().as_ref()).await?;
		ChunkIndexWriter::new(conn, table_name, batch_size).index_chunks(chunks, embedder).await
	}.await;
	let written = match built {
		Ok(n) => n,
		Err(e) => {
			if let Err(cleanup) = std::fs::remove_dir_all(&staging) { warn!(dir = %staging.display(), error = %cleanup, "could not remove staging index"); }
			return Err(e);
		}
	};
	if db_dir.exists() { std::fs::remove_dir_all(db_dir)?; }
	std::fs::rename(&staging, db_dir)?;
	info!(dir = %db_dir.display(), rows = written, "index directory replaced");
	Ok(written)
}

fn staging_dir(db_dir: &Path) -> Result<PathBuf> {
	let name = db_dir.file_name().ok_or_else(|| anyhow!("index directory {} has no final component", db_dir.display()))?;
	let mut staged = name.to_os_string();
	staged.push(".staging");
	Ok(db_dir.with_file_name(staged))
}

fn validate_positions(chunks: &[Chunk]) -> Result<()> {
	for (position, chunk) in chunks.iter().enumerate() {
		if chunk.id != position as u64 { return Err(anyhow!("chunk id {} at position {}: ids must be 0..n in order", chunk.id, position)); }
		if chunk.text.trim().is_empty() { return Err(anyhow!("chunk {} has empty text", chunk.id)); }
	}
	Ok(())
}

pub fn chunks_to_record_batch(chunks: &[Chunk], vectors: &[Vec<f32>], dim: i32) -> Result<RecordBatch> {
	let ids = UInt64Array::from_iter_values(chunks.iter().map(|c| c.id));
	let urls = StringArray::from_iter_values(chunks.iter().map(|c| c.url.as_str()));
	let texts = StringArray::from_iter_values(chunks.iter().map(|c| c.text.as_str()));
	let vectors = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
		vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>())),
		dim,
	);
	Ok(RecordBatch::try_new(build_chunk_schema(dim), vec![Arc::new(ids), Arc::new(urls), Arc::new(texts), Arc::new(vectors)])?)
}
