use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const ID_COL: &str = "id";
pub const DOCUMENT_COL: &str = "document";
pub const SOURCE_COL: &str = "source";
pub const METADATA_COL: &str = "metadata";
pub const VECTOR_COL: &str = "vector";

/// One row per chunk. `metadata` holds the full metadata map as JSON; `source`
/// is lifted out so stale-chunk deletes can filter on it.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(ID_COL, DataType::Utf8, false),
		Field::new(DOCUMENT_COL, DataType::Utf8, false),
		Field::new(SOURCE_COL, DataType::Utf8, false),
		Field::new(METADATA_COL, DataType::Utf8, false),
		Field::new(VECTOR_COL, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}

/// Dimension of the vector column, if the schema has one.
pub fn vector_dim(schema: &Schema) -> Option<i32> {
	match schema.field_with_name(VECTOR_COL).ok()?.data_type() {
		DataType::FixedSizeList(_, dim) => Some(*dim),
		_ => None,
	}
}
