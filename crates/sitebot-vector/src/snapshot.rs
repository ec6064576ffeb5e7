//! Load the `chunks` table into memory as a positional corpus plus an exact
//! flat L2 index built from the same rows.

use anyhow::{Result, anyhow};
use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, StringArray, UInt64Array};
use futures::TryStreamExt;
use lancedb::Connection;
use lancedb::query::{ExecutableQuery, QueryBase};
use tracing::info;

use sitebot_core::corpus::InMemoryCorpus;
use sitebot_core::types::Chunk;

use crate::flat::FlatL2Index;
use crate::schema::vector_dim;
use crate::table::open_existing;

pub struct IndexSnapshot {
	pub corpus: InMemoryCorpus,
	pub index: FlatL2Index,
}

pub async fn load_snapshot(conn: &Connection, table_name: &str) -> Result<IndexSnapshot> {
	let table = open_existing(conn, table_name).await?;
	let schema = table.schema().await?;
	let dim = vector_dim(&schema).ok_or_else(|| anyhow!("table '{}' has no fixed-size vector column", table_name))?;
	let total = table.count_rows(None).await?;
	let mut rows: Vec<(Chunk, Vec<f32>)> = Vec::with_capacity(total);
	if total > 0 {
		let mut stream = table.query().limit(total).execute().await?;
		while let Some(batch) = stream.try_next().await? {
			let ids = batch.column_by_name("id").and_then(|c| c.as_any().downcast_ref::<UInt64Array>()).ok_or_else(|| anyhow!("chunks.id column missing"))?;
			let urls = batch.column_by_name("url").and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow!("chunks.url column missing"))?;
			let texts = batch.column_by_name("text").and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow!("chunks.text column missing"))?;
			let vectors = batch.column_by_name("vector").and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>()).ok_or_else(|| anyhow!("chunks.vector column missing"))?;
			for i in 0..batch.num_rows() {
				let list = vectors.value(i);
				let vals = list.as_primitive::<Float32Type>().values().to_vec();
				rows.push((Chunk::new(ids.value(i), urls.value(i), texts.value(i)), vals));
			}
		}
	}
	rows.sort_by_key(|(chunk, _)| chunk.id);
	let mut chunks = Vec::with_capacity(rows.len());
	let mut index = FlatL2Index::new(dim);
	for (position, (chunk, vector)) in rows.into_iter().enumerate() {
		if chunk.id != position as u64 { return Err(anyhow!("table '{}' ids are not contiguous: expected {} found {}", table_name, position, chunk.id)); }
		index.add(&vector)?;
		chunks.push(chunk);
	}
	info!(table = table_name, rows = chunks.len(), dim, "loaded index snapshot");
	Ok(IndexSnapshot { corpus: InMemoryCorpus::new(chunks), index })
}
