//! LanceDB connection and housekeeping helpers.

use arrow_array::RecordBatchIterator;
use lancedb::{connect, Connection};
use std::fmt::Display;
use std::sync::Arc;

use docrag_core::{Error, Result};

pub(crate) fn index_err<E: Display>(e: E) -> Error { Error::index(e) }

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri).execute().await.map_err(index_err)
}

/// Create `name` with zero rows if it does not exist yet.
pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> Result<()> {
    let names = conn.table_names().execute().await.map_err(index_err)?;
    if names.contains(&name.to_string()) {
        return Ok(());
    }
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter)).execute().await.map_err(index_err)?;
    Ok(())
}

/// SQL string literal for filter predicates.
pub(crate) fn quote(s: &str) -> String { format!("'{}'", s.replace('\'', "''")) }
