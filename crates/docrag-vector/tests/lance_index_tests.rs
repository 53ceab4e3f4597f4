use docrag_core::config::{IndexBackend, IndexSettings};
use docrag_core::traits::VectorIndex;
use docrag_core::types::{DistanceMetric, Meta};
use docrag_core::Error;
use docrag_vector::{open_index, LanceVectorIndex};
use tempfile::TempDir;

const DIM: usize = 4;

fn meta(source: &str) -> Meta {
    let mut m = Meta::new();
    m.insert("source".to_string(), source.to_string());
    m
}

fn strings(items: &[&str]) -> Vec<String> { items.iter().map(|s| s.to_string()).collect() }

#[tokio::test]
async fn lance_upsert_query_and_replace() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let index = LanceVectorIndex::open(tmp.path(), "documents_test_tmp", DIM, DistanceMetric::Cosine).await?;

    assert!(index.query(&[1.0, 0.0, 0.0, 0.0], 4).await?.is_empty(), "empty table yields nothing");

    index
        .upsert(
            &strings(&["p.pdf_0", "p.pdf_1"]),
            &[vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.0]],
            &strings(&["returns", "shipping"]),
            &[meta("/pdfs/p.pdf"), meta("/pdfs/p.pdf")],
        )
        .await?;
    assert_eq!(index.count().await?, 2);

    let hits = index.query(&[0.9, 0.1, 0.0, 0.0], 4).await?;
    assert_eq!(hits, strings(&["returns", "shipping"]));

    // Same ids again: replaced, not duplicated.
    index
        .upsert(
            &strings(&["p.pdf_0"]),
            &[vec![1.0, 0.0, 0.0, 0.0]],
            &strings(&["returns v2"]),
            &[meta("/pdfs/p.pdf")],
        )
        .await?;
    assert_eq!(index.count().await?, 2);
    assert_eq!(index.query(&[1.0, 0.0, 0.0, 0.0], 1).await?, strings(&["returns v2"]));
    Ok(())
}

#[tokio::test]
async fn lance_delete_stale_and_reopen() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    {
        let index = LanceVectorIndex::open(tmp.path(), "documents", DIM, DistanceMetric::Cosine).await?;
        index
            .upsert(
                &strings(&["o's.pdf_0", "o's.pdf_1", "other.pdf_0"]),
                &[vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0, 0.0]],
                &strings(&["a", "b", "c"]),
                &[meta("/d/o's.pdf"), meta("/d/o's.pdf"), meta("/d/other.pdf")],
            )
            .await?;
        assert_eq!(index.delete_stale("/d/o's.pdf", &strings(&["o's.pdf_0"])).await?, 1);
    }
    let reopened = LanceVectorIndex::open(tmp.path(), "documents", DIM, DistanceMetric::Cosine).await?;
    assert_eq!(reopened.count().await?, 2);
    Ok(())
}

#[tokio::test]
async fn lance_rejects_dimension_changes() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let index = LanceVectorIndex::open(tmp.path(), "documents", DIM, DistanceMetric::Cosine).await?;
    let err = index
        .upsert(&strings(&["x_0"]), &[vec![1.0, 0.0]], &strings(&["x"]), &[meta("x")])
        .await
        .expect_err("wrong dim");
    assert!(matches!(err, Error::Index(_)), "{err}");
    drop(index);

    let reopened = LanceVectorIndex::open(tmp.path(), "documents", DIM + 1, DistanceMetric::Cosine).await;
    assert!(matches!(reopened, Err(Error::Index(_))));
    Ok(())
}

#[tokio::test]
async fn open_index_resolves_relative_uri_against_base() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let settings = IndexSettings {
        backend: IndexBackend::LanceDb,
        uri: "indexes/lancedb".to_string(),
        table: "documents".to_string(),
        metric: DistanceMetric::Cosine,
    };
    let index = open_index(&settings, DIM, tmp.path()).await?;
    assert_eq!(index.count().await?, 0);
    assert!(tmp.path().join("indexes/lancedb").exists());

    let memory = open_index(&IndexSettings { backend: IndexBackend::Memory, ..settings }, DIM, tmp.path()).await?;
    assert_eq!(memory.count().await?, 0);
    Ok(())
}
