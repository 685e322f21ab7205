//! Loaded indices plus the per-query pipeline: parse, retrieve, resolve.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{debug, info, warn};

use filmdb_core::config::Settings;
use filmdb_core::dataset::DatasetLoader;
use filmdb_core::query::{RuleParser, SplitQuery};
use filmdb_core::store::RecordStore;
use filmdb_core::types::{ParsedQuery, SearchMode};
use filmdb_embed::embedder_from_settings;
use filmdb_hybrid::{HybridSearchEngine, RetrievalParams};
use filmdb_text::{LexicalIndex, LexicalOptions};
use filmdb_vector::{load_flat_index, VectorIndex};

use crate::output::{ResolvedHit, Timing};

pub struct SearchOutcome {
    pub hits: Vec<ResolvedHit>,
    pub timing: Timing,
}

pub struct SearchSession {
    store: Arc<RecordStore>,
    engine: HybridSearchEngine,
    parser: RuleParser,
    params: RetrievalParams,
}

impl SearchSession {
    /// Open whatever indices `mode` needs. A missing index is logged and left
    /// out; the engine reports it (or degrades) at query time.
    pub async fn load(settings: &Settings, mode: SearchMode) -> Result<Self> {
        let started = Instant::now();
        let records = DatasetLoader::new().load(&settings.data.dataset_path)?;
        let store = Arc::new(RecordStore::new(records)?);
        let mut engine = HybridSearchEngine::from_settings(settings);

        if mode != SearchMode::Vector {
            let options = LexicalOptions { fuzzy: settings.search.fuzzy };
            match LexicalIndex::open(&settings.data.lexical_index_dir, options) {
                Ok(index) => engine = engine.with_lexical(Arc::new(index)),
                Err(e) => warn!(error = %e, "lexical index not loaded"),
            }
        }
        if mode != SearchMode::Lexical {
            match load_vector(settings, &store).await {
                Ok(index) => engine = engine.with_vector(Arc::new(index)),
                Err(e) => warn!(error = %e, "vector index not loaded"),
            }
        }

        info!(
            %mode,
            records = store.len(),
            lexical = engine.has_lexical(),
            vector = engine.has_vector(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search session ready"
        );
        Ok(Self { store, engine, parser: RuleParser::new()?, params: RetrievalParams::from(settings).with_mode(mode) })
    }

    pub fn record_count(&self) -> usize {
        self.store.len()
    }

    /// `external` replaces rule-based parsing for the lexical side; the
    /// vector side always embeds the raw query under the same filters.
    pub async fn search(&self, raw: &str, external: Option<ParsedQuery>, limit: usize) -> Result<SearchOutcome> {
        let started = Instant::now();
        let split = match external {
            Some(lexical) => SplitQuery {
                vector: ParsedQuery::new(raw.trim(), lexical.filters.clone()),
                lexical,
            },
            None => self.parser.split(raw),
        };
        let parse = started.elapsed();
        debug!(term = %split.lexical.search_term, filters = ?split.lexical.filters, "parsed query");

        let params = self.params.with_final_limit(limit);
        let retrieve_started = Instant::now();
        let fused = self.engine.retrieve(&split.lexical, &split.vector, &params).await?;
        let retrieve = retrieve_started.elapsed();

        let hits = fused
            .iter()
            .enumerate()
            .filter_map(|(i, result)| match self.store.get(result.record_id) {
                Some(record) => Some(ResolvedHit::new(i + 1, record, result)),
                None => {
                    warn!(id = result.record_id, "result missing from record store");
                    None
                }
            })
            .collect();

        Ok(SearchOutcome { hits, timing: Timing::new(parse, retrieve, started.elapsed()) })
    }
}

async fn load_vector(settings: &Settings, store: &Arc<RecordStore>) -> Result<VectorIndex> {
    let flat = load_flat_index(&settings.data.vector_db_dir, &settings.data.vector_table).await?;
    let embedder = embedder_from_settings(&settings.embedding)?;
    Ok(VectorIndex::new(flat, store.clone(), embedder)?)
}
