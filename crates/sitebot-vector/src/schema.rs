use arrow_schema::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

pub const VECTOR_COLUMN: &str = "vector";

/// `chunks` table layout: position id, source url, chunk text, embedding.
pub fn build_chunk_schema(dim: i32) -> SchemaRef {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::UInt64, false),
		Field::new("url", DataType::Utf8, false),
		Field::new("text", DataType::Utf8, false),
		Field::new(VECTOR_COLUMN, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}

/// Embedding dimension recorded in a `chunks` schema, if it has a vector column.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
	match schema.field_with_name(VECTOR_COLUMN).ok()?.data_type() {
		DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
		_ => None,
	}
}
