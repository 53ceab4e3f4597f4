use std::fs;

use docrag_core::config::{resolve_with_base, Config, EmbeddingBackend, IndexBackend, Settings};
use docrag_core::types::DistanceMetric;
use docrag_core::Error;
use tempfile::TempDir;

#[test]
fn defaults_match_documented_values() {
    let settings = Config::from_toml_str("").settings().expect("settings");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.rag.chunk_size, 500);
    assert_eq!(settings.rag.overlap, 50);
    assert_eq!(settings.rag.batch_size, 16);
    assert_eq!(settings.rag.k, 4);
    assert!(!settings.rag.prune_stale);
    assert_eq!(settings.embedding.backend, EmbeddingBackend::OpenAi);
    assert_eq!(settings.index.backend, IndexBackend::LanceDb);
    assert_eq!(settings.index.metric, DistanceMetric::Cosine);
}

#[test]
fn toml_overrides_merge_over_defaults() {
    let config = Config::from_toml_str(
        r#"
        [rag]
        chunk_size = 800
        k = 6

        [embedding]
        backend = "fake"
        dim = 64

        [index]
        backend = "memory"
        metric = "l2"
        "#,
    );
    let settings = config.settings().expect("settings");
    assert_eq!(settings.rag.chunk_size, 800);
    assert_eq!(settings.rag.overlap, 50, "untouched keys keep defaults");
    assert_eq!(settings.rag.k, 6);
    assert_eq!(settings.embedding.backend, EmbeddingBackend::Fake);
    assert_eq!(settings.embedding.dim, 64);
    assert_eq!(settings.index.backend, IndexBackend::Memory);
    assert_eq!(settings.index.metric, DistanceMetric::L2);

    let k: usize = config.get("rag.k").expect("get");
    assert_eq!(k, 6);
}

#[test]
fn invalid_rag_settings_are_configuration_errors() {
    for toml in [
        "[rag]\noverlap = 500",
        "[rag]\nchunk_size = 0",
        "[rag]\nbatch_size = 0",
        "[rag]\nk = 0",
        "[embedding]\ndim = 0",
    ] {
        let err = Config::from_toml_str(toml).settings().expect_err(toml);
        assert!(matches!(err, Error::Configuration(_)), "{toml}: {err}");
    }
}

#[test]
fn load_in_reads_config_file_from_base() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[index]\ntable = \"policies\"\n").unwrap();
    let settings = Config::load_in(tmp.path()).expect("load").settings().expect("settings");
    assert_eq!(settings.index.table, "policies");
}

#[test]
fn relative_paths_resolve_against_base() {
    let tmp = TempDir::new().unwrap();
    assert_eq!(resolve_with_base(tmp.path(), "data/lancedb"), tmp.path().join("data/lancedb"));
    assert_eq!(resolve_with_base(tmp.path(), "/abs/index"), std::path::PathBuf::from("/abs/index"));
}
