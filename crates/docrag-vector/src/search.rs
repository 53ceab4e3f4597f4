use arrow_array::{Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::DistanceType;

use docrag_core::types::DistanceMetric;
use docrag_core::{Error, Result};

use crate::schema::{DOCUMENT_COL, ID_COL, SOURCE_COL};
use crate::table::{index_err, quote};
use crate::writer::LanceVectorIndex;

pub(crate) fn distance_type(metric: DistanceMetric) -> DistanceType {
	match metric {
		DistanceMetric::Cosine => DistanceType::Cosine,
		DistanceMetric::L2 => DistanceType::L2,
		DistanceMetric::Dot => DistanceType::Dot,
	}
}

impl LanceVectorIndex {
	/// Documents of the `k` nearest rows, in LanceDB's distance order.
	pub(crate) async fn nearest_documents(&self, vector: &[f32], k: usize) -> Result<Vec<String>> {
		if vector.len() != self.dim {
			return Err(Error::index(format!("query dim mismatch: got {} expected {}", vector.len(), self.dim)));
		}
		if self.table.count_rows(None).await.map_err(index_err)? == 0 { return Ok(Vec::new()); }
		let stream = self.table
			.vector_search(vector.to_vec()).map_err(index_err)?
			.distance_type(distance_type(self.metric))
			.limit(k)
			.execute().await.map_err(index_err)?;
		let batches: Vec<RecordBatch> = stream.try_collect().await.map_err(index_err)?;
		let mut documents = Vec::new();
		for batch in &batches {
			let col = batch
				.column_by_name(DOCUMENT_COL)
				.and_then(|c| c.as_any().downcast_ref::<StringArray>())
				.ok_or_else(|| Error::index("document column missing from search results"))?;
			for i in 0..batch.num_rows() {
				documents.push(col.value(i).to_string());
			}
		}
		documents.truncate(k);
		Ok(documents)
	}

	pub(crate) async fn delete_rows_not_in(&self, source: &str, keep_ids: &[String]) -> Result<usize> {
		let mut predicate = format!("{} = {}", SOURCE_COL, quote(source));
		if !keep_ids.is_empty() {
			let ids_list = keep_ids.iter().map(|id| quote(id)).collect::<Vec<_>>().join(",");
			predicate = format!("{} AND {} NOT IN ({})", predicate, ID_COL, ids_list);
		}
		let stale = self.table.count_rows(Some(predicate.clone())).await.map_err(index_err)?;
		if stale > 0 {
			let _ = self.table.delete(&predicate).await.map_err(index_err)?;
		}
		Ok(stale)
	}

	pub(crate) async fn row_count(&self) -> Result<usize> {
		self.table.count_rows(None).await.map_err(index_err)
	}
}
