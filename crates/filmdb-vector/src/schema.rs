use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const ID_COLUMN: &str = "id";
pub const VECTOR_COLUMN: &str = "vector";

/// `(id u64, vector FixedSizeList<f32; dim>)`, one row per record.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(ID_COLUMN, DataType::UInt64, false),
		Field::new(VECTOR_COLUMN, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
