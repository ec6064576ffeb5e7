use anyhow::{Result, anyhow};

use sitebot_core::traits::VectorIndex;
use sitebot_core::types::Neighbor;

/// Exact nearest-neighbour search by squared L2 distance over vectors held
/// contiguously in memory. Positions are insertion order.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
	dim: usize,
	data: Vec<f32>,
}

impl FlatL2Index {
	pub fn new(dim: usize) -> Self { Self { dim, data: Vec::new() } }

	pub fn from_vectors(dim: usize, vectors: &[Vec<f32>]) -> Result<Self> {
		let mut index = Self::new(dim);
		for v in vectors { index.add(v)?; }
		Ok(index)
	}

	pub fn add(&mut self, vector: &[f32]) -> Result<()> {
		if vector.len() != self.dim { return Err(anyhow!("dim mismatch: got {} expected {}", vector.len(), self.dim)); }
		self.data.extend_from_slice(vector);
		Ok(())
	}
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum() }

impl VectorIndex for FlatL2Index {
	fn dim(&self) -> usize { self.dim }

	fn len(&self) -> usize { if self.dim == 0 { 0 } else { self.data.len() / self.dim } }

	fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
		if query.len() != self.dim { return Err(anyhow!("query dim {} does not match index dim {}", query.len(), self.dim)); }
		if k == 0 || self.dim == 0 { return Ok(vec![]); }
		let mut hits: Vec<Neighbor> = self.data.chunks_exact(self.dim).enumerate()
			.map(|(position, v)| Neighbor { position, distance: squared_l2(query, v) })
			.collect();
		// stable: equal distances keep insertion order
		hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
		hits.truncate(k);
		Ok(hits)
	}
}
