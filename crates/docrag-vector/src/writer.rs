use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use lancedb::{Connection, Table};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use docrag_core::types::{DistanceMetric, Embedding, Meta, SOURCE_KEY};
use docrag_core::{Error, Result};

use crate::schema::{build_arrow_schema, vector_dim, ID_COL};
use crate::table::{ensure_table, index_err, open_db};

/// LanceDB-backed vector index. Upserts go through `merge_insert` keyed on
/// `id`, so a batch lands as a single table version.
pub struct LanceVectorIndex {
	pub(crate) db: Connection,
	pub(crate) table: Table,
	pub(crate) table_name: String,
	pub(crate) dim: usize,
	pub(crate) metric: DistanceMetric,
}

impl LanceVectorIndex {
	/// Open (creating if needed) `table_name` under `db_path`.
	///
	/// Fails with `Error::Index` if the table exists with a different vector
	/// dimension.
	pub async fn open(db_path: &Path, table_name: &str, dim: usize, metric: DistanceMetric) -> Result<Self> {
		let dim_i32 = i32::try_from(dim).map_err(|_| Error::config(format!("embedding dim {} out of range", dim)))?;
		let db = open_db(db_path.to_string_lossy().as_ref()).await?;
		ensure_table(&db, table_name, build_arrow_schema(dim_i32)).await?;
		let table = db.open_table(table_name).execute().await.map_err(index_err)?;
		let schema = table.schema().await.map_err(index_err)?;
		match vector_dim(&schema) {
			Some(existing) if existing == dim_i32 => {}
			other => {
				return Err(Error::index(format!(
					"table '{}' has vector dim {:?}, embedder produces {}",
					table_name, other, dim
				)))
			}
		}
		info!(path = %db_path.display(), table = table_name, dim, %metric, "opened LanceDB index");
		Ok(Self { db, table, table_name: table_name.to_string(), dim, metric })
	}

	pub fn table_name(&self) -> &str { &self.table_name }

	pub fn connection(&self) -> &Connection { &self.db }

	pub(crate) async fn merge_rows(&self, ids: &[String], vectors: &[Embedding], documents: &[String], metadatas: &[Meta]) -> Result<()> {
		if ids.is_empty() { return Ok(()); }
		let batch = self.to_record_batch(ids, vectors, documents, metadatas)?;
		let schema = batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
		// Upsert behavior via merge_insert: id is unique
		let mut mi = self.table.merge_insert(&[ID_COL]);
		mi.when_matched_update_all(None).when_not_matched_insert_all();
		let _ = mi.execute(reader).await.map_err(index_err)?;
		debug!(table = %self.table_name, rows = ids.len(), "merged rows");
		Ok(())
	}

	fn to_record_batch(&self, ids: &[String], vectors: &[Embedding], documents: &[String], metadatas: &[Meta]) -> Result<RecordBatch> {
		let schema = build_arrow_schema(self.dim as i32);
		let mut sources = Vec::with_capacity(ids.len());
		let mut meta_json = Vec::with_capacity(ids.len());
		let mut vecs: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(ids.len());
		for (vector, meta) in vectors.iter().zip(metadatas) {
			if vector.len() != self.dim {
				return Err(Error::index(format!("dim mismatch: got {} expected {}", vector.len(), self.dim)));
			}
			sources.push(meta.get(SOURCE_KEY).cloned().unwrap_or_default());
			meta_json.push(serde_json::to_string(meta).map_err(index_err)?);
			vecs.push(Some(vector.iter().map(|&x| Some(x)).collect()));
		}
		let record_batch = RecordBatch::try_new(schema, vec![
			Arc::new(StringArray::from(ids.to_vec())),
			Arc::new(StringArray::from(documents.to_vec())),
			Arc::new(StringArray::from(sources)),
			Arc::new(StringArray::from(meta_json)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vecs.into_iter(), self.dim as i32)),
		]).map_err(index_err)?;
		Ok(record_batch)
	}
}
