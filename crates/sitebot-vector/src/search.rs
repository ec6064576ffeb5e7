use anyhow::{Result, anyhow};
use arrow_array::{Float32Array, UInt64Array};
use futures::TryStreamExt;
use lancedb::{DistanceType, Table};
use lancedb::query::{ExecutableQuery, QueryBase};
use std::path::Path;
use tokio::runtime::Runtime;
use tracing::debug;

use sitebot_core::traits::VectorIndex;
use sitebot_core::types::Neighbor;

use crate::schema::vector_dim;
use crate::table::{open_db, open_existing};

/// Vector index served by LanceDB `vector_search` (L2) on the `chunks` table.
///
/// Owns a runtime and blocks on it, so it must not be called from inside
/// another async runtime.
pub struct LanceVectorIndex { rt: Runtime, table: Table, dim: usize, len: usize }

impl LanceVectorIndex {
	pub fn open(db_path: &Path, table_name: &str) -> Result<Self> {
		let rt = Runtime::new()?;
		let (table, dim, len) = rt.block_on(async {
			let conn = open_db(db_path.to_string_lossy().as_ref()).await?;
			let table = open_existing(&conn, table_name).await?;
			let schema = table.schema().await?;
			let dim = vector_dim(&schema).ok_or_else(|| anyhow!("table '{}' has no fixed-size vector column", table_name))?;
			let len = table.count_rows(None).await?;
			Ok::<_, anyhow::Error>((table, dim, len))
		})?;
		Ok(Self { rt, table, dim, len })
	}
}

impl VectorIndex for LanceVectorIndex {
	fn dim(&self) -> usize { self.dim }
	fn len(&self) -> usize { self.len }

	fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
		if query.len() != self.dim { return Err(anyhow!("query dim {} does not match index dim {}", query.len(), self.dim)); }
		if k == 0 || self.len == 0 { return Ok(vec![]); }
		let mut hits = self.rt.block_on(async {
			let mut stream = self.table.vector_search(query.to_vec())?.distance_type(DistanceType::L2).limit(k).execute().await?;
			let mut hits = Vec::new();
			while let Some(batch) = stream.try_next().await? {
				let ids = batch.column_by_name("id").and_then(|c| c.as_any().downcast_ref::<UInt64Array>()).ok_or_else(|| anyhow!("chunks.id column missing"))?;
				let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>()).ok_or_else(|| anyhow!("_distance column missing"))?;
				for i in 0..batch.num_rows() {
					let position = usize::try_from(ids.value(i))?;
					hits.push(Neighbor { position, distance: distances.value(i) });
				}
			}
			Ok::<_, anyhow::Error>(hits)
		})?;
		hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
		hits.truncate(k);
		debug!(k, hits = hits.len(), "lance vector search");
		Ok(hits)
	}
}
