//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_RAG__CHUNK_SIZE=800`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::{Chunker, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use crate::error::{Error, Result};
use crate::types::DistanceMetric;

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Load from the current working directory.
    pub fn load() -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| Error::config(format!("cannot resolve working directory: {}", e)))?;
        Self::load_in(&cwd)
    }

    /// Load `config.toml` and the `RUST_ENV` overlay from `base`.
    pub fn load_in(base: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(base.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    /// Defaults overlaid with an inline TOML document. No files or env vars.
    pub fn from_toml_str(toml: &str) -> Self {
        let figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(toml));
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::config(format!("Failed to get '{}': {}", key, e)))
    }

    /// Typed, validated settings.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::config(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rag: RagSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub generation: GenerationSettings,
    pub data: DataSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.rag.validate()?;
        if self.embedding.dim == 0 {
            return Err(Error::config("embedding.dim must be greater than zero"));
        }
        Ok(())
    }
}

/// Pipeline knobs: `{chunk_size: 500, overlap: 50, batch_size: 16, k: 4}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub chunk_size: usize,
    pub overlap: usize,
    pub batch_size: usize,
    pub k: usize,
    /// Embedding batches allowed in flight at once.
    pub max_concurrent_batches: usize,
    /// Delete a document's trailing chunks left over from a longer earlier version.
    pub prune_stale: bool,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
            batch_size: 16,
            k: 4,
            max_concurrent_batches: 1,
            prune_stale: false,
        }
    }
}

impl RagSettings {
    pub fn validate(&self) -> Result<()> {
        Chunker::new(self.chunk_size, self.overlap)?;
        if self.batch_size == 0 {
            return Err(Error::config("batch_size must be greater than zero"));
        }
        if self.k == 0 {
            return Err(Error::config("k must be greater than zero"));
        }
        if self.max_concurrent_batches == 0 {
            return Err(Error::config("max_concurrent_batches must be greater than zero"));
        }
        Ok(())
    }

    pub fn chunker(&self) -> Result<Chunker> { Chunker::new(self.chunk_size, self.overlap) }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    OpenAi,
    Fake,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub model: String,
    pub base_url: String,
    /// Name of the env var holding the API key.
    pub api_key_env: String,
    pub dim: usize,
    pub timeout_secs: Option<u64>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::OpenAi,
            model: "text-embedding-3-small".to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            dim: 1536,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    #[default]
    LanceDb,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub backend: IndexBackend,
    pub uri: String,
    pub table: String,
    pub metric: DistanceMetric,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            backend: IndexBackend::LanceDb,
            uri: "data/lancedb".to_string(),
            table: "documents".to_string(),
            metric: DistanceMetric::Cosine,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    pub base_url: String,
    pub api_key_env: String,
    pub timeout_secs: Option<u64>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4.1".to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub documents_dir: String,
    /// Lowercase file extensions picked up by directory ingestion.
    pub extensions: Vec<String>,
}

impl Default for DataSettings {
    fn default() -> Self { Self { documents_dir: "pdfs".to_string(), extensions: vec!["pdf".to_string()] } }
}

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Read an API key from the env var named by `var`.
pub fn api_key_from_env(var: &str) -> Result<String> {
    match env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(Error::config(format!("environment variable {} is not set", var))),
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
