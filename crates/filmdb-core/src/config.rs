//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults, `config.toml`, `config.<env>.toml`
//! and `APP_*` env vars (nested keys separated by `__`). Paths expand `~` and
//! `${VAR}` and resolve against the directory of the config file.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::SearchMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub embedding: EmbeddingSettings,
    pub search: SearchSettings,
    pub fusion: FusionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub dataset_path: PathBuf,
    pub lexical_index_dir: PathBuf,
    pub vector_db_dir: PathBuf,
    pub vector_table: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("data/movies.jsonl"),
            lexical_index_dir: PathBuf::from("data/indexes/tantivy"),
            vector_db_dir: PathBuf::from("data/indexes/lancedb"),
            vector_table: "movies".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    Model,
    Hash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub model_dir: PathBuf,
    pub max_len: usize,
    /// Only used by the hashing backend; the model reports its own size.
    pub dimension: usize,
    pub batch_size: usize,
    pub timeout_ms: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Model,
            model_dir: PathBuf::from("models/bge-m3"),
            max_len: 256,
            dimension: 1024,
            batch_size: 32,
            timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub strategy: SearchMode,
    pub lexical_limit: usize,
    pub vector_k: usize,
    pub final_limit: usize,
    pub fuzzy: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { strategy: SearchMode::Fused, lexical_limit: 100, vector_k: 100, final_limit: 20, fuzzy: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionSettings {
    pub k: u32,
    pub lexical_weight: f64,
    pub vector_weight: f64,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self { k: 60, lexical_weight: 1.0, vector_weight: 1.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// Force JSON output even on a terminal.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

impl Settings {
    /// Load `config.toml` + `config.<RUST_ENV>.toml` from the working directory.
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        let base = env::current_dir()?;
        Self::finish(figment, &base)
    }

    /// Load an explicit config file; relative paths resolve against its directory.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Err(Error::InvalidConfig(format!("config file {} not found", path.display())).into());
        }
        let figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path));
        let base = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => env::current_dir()?,
        };
        Self::finish(figment, &base)
    }

    fn finish(figment: Figment, base: &Path) -> anyhow::Result<Self> {
        let mut settings: Settings = figment
            .merge(Env::prefixed("APP_").split("__"))
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.resolve_paths(base);
        settings.validate()?;
        Ok(settings)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let data = &mut self.data;
        data.dataset_path = resolve_with_base(base, data.dataset_path.to_string_lossy());
        data.lexical_index_dir = resolve_with_base(base, data.lexical_index_dir.to_string_lossy());
        data.vector_db_dir = resolve_with_base(base, data.vector_db_dir.to_string_lossy());
        self.embedding.model_dir = resolve_with_base(base, self.embedding.model_dir.to_string_lossy());
    }

    pub fn validate(&self) -> Result<(), Error> {
        let fusion = &self.fusion;
        if fusion.k == 0 {
            return Err(Error::InvalidConfig("fusion.k must be at least 1".into()));
        }
        for (name, w) in [("lexical_weight", fusion.lexical_weight), ("vector_weight", fusion.vector_weight)] {
            if !w.is_finite() || w < 0.0 {
                return Err(Error::InvalidConfig(format!("fusion.{name} must be a finite, non-negative number")));
            }
        }
        let search = &self.search;
        for (name, v) in [("lexical_limit", search.lexical_limit), ("vector_k", search.vector_k), ("final_limit", search.final_limit)] {
            if v == 0 {
                return Err(Error::InvalidConfig(format!("search.{name} must be at least 1")));
            }
        }
        if self.embedding.batch_size == 0 || self.embedding.dimension == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size and embedding.dimension must be at least 1".into()));
        }
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.fusion.k, 60);
        assert_eq!(s.search.strategy, SearchMode::Fused);
    }

    #[test]
    fn file_and_env_layers_merge() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "filmdb.toml",
                r#"
                [search]
                strategy = "bm25"
                final_limit = 5

                [data]
                dataset_path = "movies.jsonl"
                "#,
            )?;
            jail.set_env("APP_FUSION__VECTOR_WEIGHT", "1.5");
            let path = jail.directory().join("filmdb.toml");
            let s = Settings::load_from(&path).map_err(|e| e.to_string())?;
            assert_eq!(s.search.strategy, SearchMode::Lexical);
            assert_eq!(s.search.final_limit, 5);
            assert_eq!(s.search.vector_k, 100);
            assert!((s.fusion.vector_weight - 1.5).abs() < 1e-9);
            assert_eq!(s.data.dataset_path, jail.directory().join("movies.jsonl"));
            Ok(())
        });
    }

    #[test]
    fn rejects_zero_k_and_negative_weights() {
        let mut s = Settings::default();
        s.fusion.k = 0;
        assert!(matches!(s.validate(), Err(Error::InvalidConfig(_))));
        let mut s = Settings::default();
        s.fusion.lexical_weight = -1.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/srv/filmdb");
        assert_eq!(resolve_with_base(base, "idx"), PathBuf::from("/srv/filmdb/idx"));
        assert_eq!(resolve_with_base(base, "/abs/idx"), PathBuf::from("/abs/idx"));
    }
}
