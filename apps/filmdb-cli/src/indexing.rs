use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::info;

use filmdb_core::config::Settings;
use filmdb_core::dataset::DatasetLoader;
use filmdb_core::store::RecordStore;
use filmdb_embed::embedder_from_settings;
use filmdb_text::{LexicalIndexBuilder, LexicalOptions};
use filmdb_vector::{build_flat_index, save_flat_index};

#[derive(Debug, Clone, Copy)]
pub struct IndexTargets {
    pub lexical: bool,
    pub vector: bool,
}

#[derive(Debug, Default)]
pub struct IndexSummary {
    pub records: usize,
    pub lexical: Option<Duration>,
    pub vector: Option<Duration>,
}

impl fmt::Display for IndexSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Indexed {} records", self.records)?;
        if let Some(d) = self.lexical {
            write!(f, "\n  lexical: {:.2}s", d.as_secs_f64())?;
        }
        if let Some(d) = self.vector {
            write!(f, "\n  vector:  {:.2}s", d.as_secs_f64())?;
        }
        Ok(())
    }
}

pub async fn run_index(settings: &Settings, dataset: &Path, targets: IndexTargets, limit: Option<usize>) -> Result<IndexSummary> {
    let loader = match limit {
        Some(n) => DatasetLoader::new().with_limit(n),
        None => DatasetLoader::new(),
    };
    let store = Arc::new(RecordStore::new(loader.load(dataset)?)?);
    let mut summary = IndexSummary { records: store.len(), ..IndexSummary::default() };

    if targets.lexical {
        let started = Instant::now();
        let dir = settings.data.lexical_index_dir.clone();
        let options = LexicalOptions { fuzzy: settings.search.fuzzy };
        let records = store.clone();
        tokio::task::spawn_blocking(move || LexicalIndexBuilder::new().with_options(options).build_in_dir(&records, &dir))
            .await
            .context("lexical build task panicked")??;
        summary.lexical = Some(started.elapsed());
        info!(elapsed_ms = started.elapsed().as_millis() as u64, "lexical index built");
    }

    if targets.vector {
        let started = Instant::now();
        let embedder = embedder_from_settings(&settings.embedding)?;
        let batch_size = settings.embedding.batch_size;
        let records = store.clone();
        let flat = tokio::task::spawn_blocking(move || build_flat_index(&records, embedder.as_ref(), batch_size))
            .await
            .context("vector build task panicked")??;
        save_flat_index(&flat, &settings.data.vector_db_dir, &settings.data.vector_table).await?;
        summary.vector = Some(started.elapsed());
        info!(elapsed_ms = started.elapsed().as_millis() as u64, dim = flat.dim(), "vector index built");
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_only_built_indices() {
        let summary = IndexSummary { records: 3, lexical: Some(Duration::from_millis(1500)), vector: None };
        let text = summary.to_string();
        assert!(text.starts_with("Indexed 3 records"));
        assert!(text.contains("lexical: 1.50s"));
        assert!(!text.contains("vector"));
    }
}
