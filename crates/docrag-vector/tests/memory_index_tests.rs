use std::sync::Arc;

use docrag_core::traits::VectorIndex;
use docrag_core::types::{DistanceMetric, Meta};
use docrag_core::Error;
use docrag_vector::MemoryVectorIndex;

fn meta(source: &str) -> Meta {
    let mut m = Meta::new();
    m.insert("source".to_string(), source.to_string());
    m
}

fn strings(items: &[&str]) -> Vec<String> { items.iter().map(|s| s.to_string()).collect() }

#[tokio::test]
async fn empty_index_returns_no_results() {
    let index = MemoryVectorIndex::new(DistanceMetric::Cosine);
    assert!(index.query(&[1.0, 0.0], 4).await.expect("query").is_empty());
    assert_eq!(index.count().await.expect("count"), 0);
}

#[tokio::test]
async fn results_are_capped_by_entries_and_ranked() {
    let index = MemoryVectorIndex::new(DistanceMetric::Cosine);
    index
        .upsert(
            &strings(&["a_0", "a_1"]),
            &[vec![0.0, 1.0], vec![1.0, 0.1]],
            &strings(&["far", "near"]),
            &[meta("a"), meta("a")],
        )
        .await
        .expect("upsert");

    let hits = index.query(&[1.0, 0.0], 4).await.expect("query");
    assert_eq!(hits, strings(&["near", "far"]));
    assert_eq!(index.query(&[1.0, 0.0], 1).await.expect("query"), strings(&["near"]));
}

#[tokio::test]
async fn l2_and_dot_rank_by_their_own_metric() {
    for metric in [DistanceMetric::L2, DistanceMetric::Dot] {
        let index = MemoryVectorIndex::new(metric);
        index
            .upsert(
                &strings(&["x", "y"]),
                &[vec![2.0, 0.0], vec![0.0, 2.0]],
                &strings(&["x-doc", "y-doc"]),
                &[meta("s"), meta("s")],
            )
            .await
            .expect("upsert");
        assert_eq!(index.query(&[0.0, 1.5], 2).await.expect("query")[0], "y-doc", "{metric}");
    }
}

#[tokio::test]
async fn same_id_upsert_replaces_entry() {
    let index = MemoryVectorIndex::new(DistanceMetric::Cosine);
    index.upsert(&strings(&["d_0"]), &[vec![1.0, 0.0]], &strings(&["old"]), &[meta("d")]).await.expect("upsert");
    index.upsert(&strings(&["d_0"]), &[vec![1.0, 0.0]], &strings(&["new"]), &[meta("d")]).await.expect("upsert");
    assert_eq!(index.count().await.expect("count"), 1);
    assert_eq!(index.document("d_0").as_deref(), Some("new"));
}

#[tokio::test]
async fn misaligned_upsert_is_rejected_without_writes() {
    let index = MemoryVectorIndex::new(DistanceMetric::Cosine);
    let err = index
        .upsert(&strings(&["a", "b"]), &[vec![1.0]], &strings(&["x", "y"]), &[meta("s"), meta("s")])
        .await
        .expect_err("misaligned");
    assert!(matches!(err, Error::Index(_)), "{err}");
    assert_eq!(index.count().await.expect("count"), 0);
}

#[tokio::test]
async fn mixed_dimensions_are_rejected() {
    let index = MemoryVectorIndex::new(DistanceMetric::Cosine);
    index.upsert(&strings(&["a"]), &[vec![1.0, 0.0]], &strings(&["x"]), &[meta("s")]).await.expect("upsert");
    let err = index.upsert(&strings(&["b"]), &[vec![1.0, 0.0, 0.0]], &strings(&["y"]), &[meta("s")]).await.expect_err("dim");
    assert!(matches!(err, Error::Index(_)));
    assert!(matches!(index.query(&[1.0], 1).await, Err(Error::Index(_))));
}

#[tokio::test]
async fn delete_stale_only_touches_the_given_source() {
    let index = MemoryVectorIndex::new(DistanceMetric::Cosine);
    index
        .upsert(
            &strings(&["a_0", "a_1", "a_2", "b_0"]),
            &[vec![1.0], vec![1.0], vec![1.0], vec![1.0]],
            &strings(&["a0", "a1", "a2", "b0"]),
            &[meta("a"), meta("a"), meta("a"), meta("b")],
        )
        .await
        .expect("upsert");
    let removed = index.delete_stale("a", &strings(&["a_0"])).await.expect("delete");
    assert_eq!(removed, 2);
    assert_eq!(index.ids(), strings(&["a_0", "b_0"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn readers_never_see_half_a_batch() {
    let index = Arc::new(MemoryVectorIndex::new(DistanceMetric::Cosine));
    let n = 200usize;
    let ids: Vec<String> = (0..n).map(|i| format!("doc_{i}")).collect();
    let vectors: Vec<Vec<f32>> = (0..n).map(|i| vec![1.0, i as f32]).collect();
    let docs: Vec<String> = ids.clone();
    let metas: Vec<Meta> = (0..n).map(|_| meta("doc")).collect();

    let writer = {
        let index = index.clone();
        tokio::spawn(async move { index.upsert(&ids, &vectors, &docs, &metas).await })
    };
    // The writer runs on the other worker while this loop reads.
    let mut reads = 0usize;
    while !writer.is_finished() || reads < 50 {
        let count = index.count().await.expect("count");
        assert!(count == 0 || count == n, "partial batch visible: {count}");
        reads += 1;
    }
    writer.await.expect("join").expect("upsert");
    assert_eq!(index.count().await.expect("count"), n);
}
